//! One repository per entity kind, wired to a single backend.

use std::sync::{Arc, Weak};

use sqlx::PgPool;
use tracing::info;

use letmebuy_auth::User;
use letmebuy_catalog::{Category, Feedback, Product};
use letmebuy_core::Entity;
use letmebuy_customers::{Address, Costumer};
use letmebuy_sales::{Order, Payment};

use crate::repository::{schema, GatewayError, InMemoryRepository, PgRepository, Repository};

#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn Repository<User>>,
    pub categories: Arc<dyn Repository<Category>>,
    pub products: Arc<dyn Repository<Product>>,
    pub feedbacks: Arc<dyn Repository<Feedback>>,
    pub costumers: Arc<dyn Repository<Costumer>>,
    pub addresses: Arc<dyn Repository<Address>>,
    pub orders: Arc<dyn Repository<Order>>,
    pub payments: Arc<dyn Repository<Payment>>,
}

impl Repositories {
    /// In-process tables with the same unique and foreign-key rules as the SQL schema.
    pub fn in_memory() -> Self {
        let users = Arc::new(InMemoryRepository::<User>::new().with_unique("email", |u| u.email.clone()));
        let categories = Arc::new(InMemoryRepository::<Category>::new());
        let products = Arc::new(InMemoryRepository::<Product>::new());
        let feedbacks = Arc::new(InMemoryRepository::<Feedback>::new());
        let costumers = Arc::new(InMemoryRepository::<Costumer>::new().with_unique("cpf", |c| c.cpf.clone()));
        let addresses = Arc::new(InMemoryRepository::<Address>::new());
        let orders = Arc::new(InMemoryRepository::<Order>::new());
        let payments = Arc::new(
            InMemoryRepository::<Payment>::new().with_unique("order_id", |p| p.order_id.to_string()),
        );

        link(&categories, &products, |p| Some(p.category_id));
        link(&products, &feedbacks, |f| Some(f.product_id));
        link(&users, &feedbacks, |f| Some(f.user_id));
        link(&users, &costumers, |c| c.user_id);
        link(&costumers, &addresses, |a| Some(a.costumer_id));
        link(&costumers, &orders, |o| Some(o.costumer_id));
        link(&orders, &payments, |p| Some(p.order_id));

        info!("using in-memory repositories");
        Self { users, categories, products, feedbacks, costumers, addresses, orders, payments }
    }

    /// Postgres tables; the schema is created if missing.
    pub async fn postgres(pool: PgPool) -> Result<Self, GatewayError> {
        schema::ensure_schema(&pool).await?;
        let pool = Arc::new(pool);

        info!("using postgres repositories");
        Ok(Self {
            users: Arc::new(PgRepository::<User>::new(pool.clone())),
            categories: Arc::new(PgRepository::<Category>::new(pool.clone())),
            products: Arc::new(PgRepository::<Product>::new(pool.clone())),
            feedbacks: Arc::new(PgRepository::<Feedback>::new(pool.clone())),
            costumers: Arc::new(PgRepository::<Costumer>::new(pool.clone())),
            addresses: Arc::new(PgRepository::<Address>::new(pool.clone())),
            orders: Arc::new(PgRepository::<Order>::new(pool.clone())),
            payments: Arc::new(PgRepository::<Payment>::new(pool)),
        })
    }
}

/// Foreign key from `child` rows to `parent` rows.
///
/// Saving a child that points at a missing parent, or deleting a parent that
/// still has children, is an integrity violation. Handles are weak so the
/// tables do not keep each other alive.
fn link<P: Entity, C: Entity>(
    parent: &Arc<InMemoryRepository<P>>,
    child: &Arc<InMemoryRepository<C>>,
    key: fn(&C) -> Option<P::Id>,
) {
    let parents: Weak<InMemoryRepository<P>> = Arc::downgrade(parent);
    child.add_reference_check(move |row| {
        let (Some(id), Some(parents)) = (key(row), parents.upgrade()) else {
            return Ok(());
        };
        if parents.contains(id)? {
            Ok(())
        } else {
            Err(GatewayError::integrity(format!("{} {id} does not exist", P::KIND)))
        }
    });

    let children: Weak<InMemoryRepository<C>> = Arc::downgrade(child);
    parent.add_dependent_check(move |id| {
        let Some(children) = children.upgrade() else {
            return Ok(());
        };
        if children.any(|row| key(row) == Some(id))? {
            Err(GatewayError::integrity(format!(
                "{} {id} is still referenced by a {}",
                P::KIND,
                C::KIND
            )))
        } else {
            Ok(())
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use letmebuy_auth::RoleSet;
    use letmebuy_catalog::Product;
    use letmebuy_core::{CategoryId, Identifier, ProductId, UserId};

    #[tokio::test]
    async fn product_needs_an_existing_category() {
        let repos = Repositories::in_memory();
        let orphan = Product::new("Phone", "", 100, CategoryId::new(9), Utc::now());
        let err = repos.products.save(orphan).await.unwrap_err();
        assert!(matches!(err, GatewayError::IntegrityViolation(_)));
    }

    #[tokio::test]
    async fn referenced_category_cannot_be_deleted_until_its_products_are_gone() {
        let repos = Repositories::in_memory();
        let books = repos.categories.save(Category::new("Books")).await.unwrap();
        let category_id = books.id().unwrap();
        let product = repos
            .products
            .save(Product::new("Rust book", "", 4_990, category_id, Utc::now()))
            .await
            .unwrap();

        let err = repos.categories.delete_by_id(category_id).await.unwrap_err();
        assert!(matches!(err, GatewayError::IntegrityViolation(_)));

        repos.products.delete_by_id(product.id().unwrap()).await.unwrap();
        repos.categories.delete_by_id(category_id).await.unwrap();
        assert_eq!(repos.products.find_by_id(ProductId::new(1)).await.unwrap(), None);
    }

    #[tokio::test]
    async fn user_emails_are_unique() {
        let repos = Repositories::in_memory();
        let maria = || User::new("Maria", "Green", "maria@gmail.com", "$argon2id$x", RoleSet::new());
        let saved = repos.users.save(maria()).await.unwrap();
        assert_eq!(saved.id().map(Identifier::raw), Some(1));

        let err = repos.users.save(maria()).await.unwrap_err();
        assert!(matches!(err, GatewayError::IntegrityViolation(_)));
        assert!(repos.users.find_by_id(UserId::new(2)).await.unwrap().is_none());
    }
}
