//! Table mappings for every stored entity.

use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::query_builder::Separated;
use sqlx::types::Json;
use sqlx::{Postgres, QueryBuilder, Row};

use letmebuy_auth::{Role, User, UserFilter};
use letmebuy_catalog::{Category, CategoryFilter, Feedback, FeedbackFilter, Product, ProductFilter};
use letmebuy_core::{
    AddressId, CategoryId, CostumerId, FeedbackId, NewEntity, OrderId, PaymentId, ProductId, UserId,
};
use letmebuy_customers::{Address, AddressFilter, AddressInput, Costumer, CostumerFilter, CostumerInput};
use letmebuy_sales::{Order, OrderFilter, OrderItem, OrderStatus, Payment, PaymentFilter, PaymentMethod, PaymentStatus};

use super::PgEntity;

type Values<'q, 'a> = Separated<'q, 'a, Postgres, &'static str>;

fn decode_err(column: &str, msg: impl std::fmt::Display) -> sqlx::Error {
    sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: msg.to_string().into(),
    }
}

fn like_pattern(needle: &str) -> String {
    let escaped = needle
        .trim()
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

impl PgEntity for User {
    const TABLE: &'static str = "users";
    const COLUMNS: &'static [&'static str] =
        &["first_name", "last_name", "email", "password_hash", "roles"];

    fn from_row(row: &PgRow) -> Result<Self, sqlx::Error> {
        let roles: Vec<String> = row.try_get("roles")?;
        Ok(User::new(
            row.try_get::<String, _>("first_name")?,
            row.try_get::<String, _>("last_name")?,
            row.try_get::<String, _>("email")?,
            row.try_get::<String, _>("password_hash")?,
            roles.into_iter().map(Role::new).collect(),
        )
        .with_id(UserId::new(row.try_get("id")?)))
    }

    fn push_values(&self, values: &mut Values<'_, '_>) {
        values
            .push_bind(self.first_name.clone())
            .push_bind(self.last_name.clone())
            .push_bind(self.email.clone())
            .push_bind(self.password_hash.clone())
            .push_bind(self.roles.labels());
    }

    fn push_filter(filter: &UserFilter, query: &mut QueryBuilder<'_, Postgres>) {
        if let Some(email) = &filter.email {
            query.push(" AND email = ").push_bind(email.trim().to_ascii_lowercase());
        }
    }
}

impl PgEntity for Category {
    const TABLE: &'static str = "categories";
    const COLUMNS: &'static [&'static str] = &["name"];

    fn from_row(row: &PgRow) -> Result<Self, sqlx::Error> {
        Ok(Category::new(row.try_get::<String, _>("name")?)
            .with_id(CategoryId::new(row.try_get("id")?)))
    }

    fn push_values(&self, values: &mut Values<'_, '_>) {
        values.push_bind(self.name.clone());
    }

    fn push_filter(filter: &CategoryFilter, query: &mut QueryBuilder<'_, Postgres>) {
        if let Some(name) = &filter.name {
            query.push(" AND name ILIKE ").push_bind(like_pattern(name));
        }
    }
}

impl PgEntity for Product {
    const TABLE: &'static str = "products";
    const COLUMNS: &'static [&'static str] =
        &["name", "description", "price_cents", "img_url", "category_id", "created_at"];

    fn from_row(row: &PgRow) -> Result<Self, sqlx::Error> {
        let mut product = Product::new(
            row.try_get::<String, _>("name")?,
            row.try_get::<String, _>("description")?,
            row.try_get("price_cents")?,
            CategoryId::new(row.try_get("category_id")?),
            row.try_get::<DateTime<Utc>, _>("created_at")?,
        )
        .with_id(ProductId::new(row.try_get("id")?));
        product.img_url = row.try_get("img_url")?;
        Ok(product)
    }

    fn push_values(&self, values: &mut Values<'_, '_>) {
        values
            .push_bind(self.name.clone())
            .push_bind(self.description.clone())
            .push_bind(self.price_cents)
            .push_bind(self.img_url.clone())
            .push_bind(self.category_id.get())
            .push_bind(self.created_at);
    }

    fn push_filter(filter: &ProductFilter, query: &mut QueryBuilder<'_, Postgres>) {
        if let Some(category_id) = filter.category_id {
            query.push(" AND category_id = ").push_bind(category_id.get());
        }
        if let Some(name) = &filter.name {
            query.push(" AND name ILIKE ").push_bind(like_pattern(name));
        }
    }

    fn sort_column(field: &str) -> Option<&'static str> {
        match field {
            "id" => Some("id"),
            "name" => Some("name"),
            "price" => Some("price_cents"),
            "created_at" => Some("created_at"),
            _ => None,
        }
    }
}

impl PgEntity for Feedback {
    const TABLE: &'static str = "feedbacks";
    const COLUMNS: &'static [&'static str] = &["product_id", "user_id", "rating", "comment", "moment"];

    fn from_row(row: &PgRow) -> Result<Self, sqlx::Error> {
        let rating: i16 = row.try_get("rating")?;
        let rating = u8::try_from(rating).map_err(|e| decode_err("rating", e))?;
        Ok(Feedback::new(
            ProductId::new(row.try_get("product_id")?),
            UserId::new(row.try_get("user_id")?),
            rating,
            row.try_get::<String, _>("comment")?,
            row.try_get::<DateTime<Utc>, _>("moment")?,
        )
        .with_id(FeedbackId::new(row.try_get("id")?)))
    }

    fn push_values(&self, values: &mut Values<'_, '_>) {
        values
            .push_bind(self.product_id.get())
            .push_bind(self.user_id.get())
            .push_bind(i16::from(self.rating))
            .push_bind(self.comment.clone())
            .push_bind(self.moment);
    }

    fn push_filter(filter: &FeedbackFilter, query: &mut QueryBuilder<'_, Postgres>) {
        if let Some(product_id) = filter.product_id {
            query.push(" AND product_id = ").push_bind(product_id.get());
        }
    }
}

impl PgEntity for Costumer {
    const TABLE: &'static str = "costumers";
    const COLUMNS: &'static [&'static str] = &["user_id", "name", "cpf", "phone"];

    fn from_row(row: &PgRow) -> Result<Self, sqlx::Error> {
        let user_id: Option<i64> = row.try_get("user_id")?;
        let costumer = CostumerInput {
            user_id: user_id.map(UserId::new),
            name: row.try_get("name")?,
            cpf: row.try_get("cpf")?,
            phone: row.try_get("phone")?,
        }
        .into_entity();
        Ok(costumer.with_id(CostumerId::new(row.try_get("id")?)))
    }

    fn push_values(&self, values: &mut Values<'_, '_>) {
        values
            .push_bind(self.user_id.map(|u| u.get()))
            .push_bind(self.name.clone())
            .push_bind(self.cpf.clone())
            .push_bind(self.phone.clone());
    }

    fn push_filter(filter: &CostumerFilter, query: &mut QueryBuilder<'_, Postgres>) {
        if let Some(user_id) = filter.user_id {
            query.push(" AND user_id = ").push_bind(user_id.get());
        }
    }
}

impl PgEntity for Address {
    const TABLE: &'static str = "addresses";
    const COLUMNS: &'static [&'static str] =
        &["costumer_id", "street", "number", "complement", "district", "city", "state", "cep"];

    fn from_row(row: &PgRow) -> Result<Self, sqlx::Error> {
        let address = AddressInput {
            costumer_id: CostumerId::new(row.try_get("costumer_id")?),
            street: row.try_get("street")?,
            number: row.try_get("number")?,
            complement: row.try_get("complement")?,
            district: row.try_get("district")?,
            city: row.try_get("city")?,
            state: row.try_get("state")?,
            cep: row.try_get("cep")?,
        }
        .into_entity();
        Ok(address.with_id(AddressId::new(row.try_get("id")?)))
    }

    fn push_values(&self, values: &mut Values<'_, '_>) {
        values
            .push_bind(self.costumer_id.get())
            .push_bind(self.street.clone())
            .push_bind(self.number.clone())
            .push_bind(self.complement.clone())
            .push_bind(self.district.clone())
            .push_bind(self.city.clone())
            .push_bind(self.state.clone())
            .push_bind(self.cep.clone());
    }

    fn push_filter(filter: &AddressFilter, query: &mut QueryBuilder<'_, Postgres>) {
        if let Some(costumer_id) = filter.costumer_id {
            query.push(" AND costumer_id = ").push_bind(costumer_id.get());
        }
    }
}

impl PgEntity for Order {
    const TABLE: &'static str = "orders";
    const COLUMNS: &'static [&'static str] = &["costumer_id", "moment", "status", "items"];

    fn from_row(row: &PgRow) -> Result<Self, sqlx::Error> {
        let status: String = row.try_get("status")?;
        let status: OrderStatus = status.parse().map_err(|e| decode_err("status", e))?;
        let Json(items): Json<Vec<OrderItem>> = row.try_get("items")?;

        let mut order = Order::new(
            CostumerId::new(row.try_get("costumer_id")?),
            row.try_get::<DateTime<Utc>, _>("moment")?,
            items,
        )
        .with_id(OrderId::new(row.try_get("id")?));
        order.status = status;
        Ok(order)
    }

    fn push_values(&self, values: &mut Values<'_, '_>) {
        values
            .push_bind(self.costumer_id.get())
            .push_bind(self.moment)
            .push_bind(self.status.as_str())
            .push_bind(Json(self.items.clone()));
    }

    fn push_filter(filter: &OrderFilter, query: &mut QueryBuilder<'_, Postgres>) {
        if let Some(costumer_id) = filter.costumer_id {
            query.push(" AND costumer_id = ").push_bind(costumer_id.get());
        }
        if let Some(status) = filter.status {
            query.push(" AND status = ").push_bind(status.as_str());
        }
    }
}

impl PgEntity for Payment {
    const TABLE: &'static str = "payments";
    const COLUMNS: &'static [&'static str] = &["order_id", "status", "method"];

    fn from_row(row: &PgRow) -> Result<Self, sqlx::Error> {
        let status: String = row.try_get("status")?;
        let status: PaymentStatus = status.parse().map_err(|e| decode_err("status", e))?;
        let Json(method): Json<PaymentMethod> = row.try_get("method")?;
        Ok(Payment::new(OrderId::new(row.try_get("order_id")?), method)
            .with_status(status)
            .with_id(PaymentId::new(row.try_get("id")?)))
    }

    fn push_values(&self, values: &mut Values<'_, '_>) {
        values
            .push_bind(self.order_id.get())
            .push_bind(self.status.as_str())
            .push_bind(Json(self.method.clone()));
    }

    fn push_filter(filter: &PaymentFilter, query: &mut QueryBuilder<'_, Postgres>) {
        if let Some(order_id) = filter.order_id {
            query.push(" AND order_id = ").push_bind(order_id.get());
        }
    }
}
