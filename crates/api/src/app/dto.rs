use serde::Deserialize;
use serde_json::{json, Value};

use letmebuy_auth::{NewUser, Role, RoleSet, User, UserFilter, UserUpdate};
use letmebuy_catalog::{
    Category, CategoryFilter, CategoryInput, Feedback, FeedbackFilter, FeedbackSummary, FeedbackUpdate,
    NewFeedback, Product, ProductFilter, ProductInput,
};
use letmebuy_core::{
    CategoryId, CostumerId, DomainError, DomainResult, Entity, Identifier, OrderId, Page,
    PageRequest, ProductId, Sort, UserId,
};
use letmebuy_customers::{Address, AddressFilter, AddressInput, Costumer, CostumerFilter, CostumerInput};
use letmebuy_sales::{
    Order, OrderFilter, OrderInput, OrderItem, OrderStatus, Payment, PaymentFilter, PaymentInput,
    PaymentMethod, PaymentStatus,
};

pub const MIN_PASSWORD_LEN: usize = 6;

// -------------------------
// Paging
// -------------------------

/// `?page=0&size=12&sort=name,desc`
#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<u32>,
    pub size: Option<u32>,
    pub sort: Option<String>,
}

impl PageParams {
    /// Sort fields are checked against what `E` can be ordered by.
    pub fn to_request<E: Entity>(&self) -> DomainResult<PageRequest> {
        let request = PageRequest::new(self.page, self.size);
        match self.sort.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            Some(raw) => Ok(request.with_sort(Sort::parse(raw, E::SORTABLE)?)),
            None => Ok(request),
        }
    }
}

pub fn page_to_json<T>(page: Page<T>, to_json: impl FnMut(T) -> Value) -> Value {
    json!(page.map(to_json))
}

fn raw_id<E: Entity>(entity: &E) -> Option<i64> {
    entity.id().map(Identifier::raw)
}

// -------------------------
// Filters
// -------------------------

#[derive(Debug, Default, Deserialize)]
pub struct UserQuery {
    pub email: Option<String>,
}

impl From<UserQuery> for UserFilter {
    fn from(q: UserQuery) -> Self {
        UserFilter { email: q.email }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct CategoryQuery {
    pub name: Option<String>,
}

impl From<CategoryQuery> for CategoryFilter {
    fn from(q: CategoryQuery) -> Self {
        CategoryFilter { name: q.name }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ProductQuery {
    pub category_id: Option<CategoryId>,
    pub name: Option<String>,
}

impl From<ProductQuery> for ProductFilter {
    fn from(q: ProductQuery) -> Self {
        ProductFilter { category_id: q.category_id, name: q.name }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct FeedbackQuery {
    pub product_id: Option<ProductId>,
}

impl From<FeedbackQuery> for FeedbackFilter {
    fn from(q: FeedbackQuery) -> Self {
        FeedbackFilter { product_id: q.product_id }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct CostumerQuery {
    pub user_id: Option<UserId>,
}

impl From<CostumerQuery> for CostumerFilter {
    fn from(q: CostumerQuery) -> Self {
        CostumerFilter { user_id: q.user_id }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct AddressQuery {
    pub costumer_id: Option<CostumerId>,
}

impl From<AddressQuery> for AddressFilter {
    fn from(q: AddressQuery) -> Self {
        AddressFilter { costumer_id: q.costumer_id }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct OrderQuery {
    pub costumer_id: Option<CostumerId>,
    pub status: Option<OrderStatus>,
}

impl From<OrderQuery> for OrderFilter {
    fn from(q: OrderQuery) -> Self {
        OrderFilter { costumer_id: q.costumer_id, status: q.status }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct PaymentQuery {
    pub order_id: Option<OrderId>,
}

impl From<PaymentQuery> for PaymentFilter {
    fn from(q: PaymentQuery) -> Self {
        PaymentFilter { order_id: q.order_id }
    }
}

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub roles: Vec<String>,
}

impl CreateUserRequest {
    pub fn check_password(&self) -> DomainResult<()> {
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(DomainError::validation(format!(
                "password must have at least {MIN_PASSWORD_LEN} characters"
            )));
        }
        Ok(())
    }

    /// The password is replaced by its hash before anything is stored.
    pub fn into_new_user(self, password_hash: String) -> NewUser {
        NewUser {
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            password_hash,
            roles: role_set(self.roles),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub roles: Option<Vec<String>>,
}

impl UpdateUserRequest {
    /// Role changes are only honoured for administrators.
    pub fn into_update(self, may_change_roles: bool) -> UserUpdate {
        UserUpdate {
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            roles: self.roles.filter(|_| may_change_roles).map(role_set),
        }
    }
}

fn role_set(labels: Vec<String>) -> RoleSet {
    labels
        .into_iter()
        .filter(|l| !l.trim().is_empty())
        .map(Role::new)
        .collect()
}

#[derive(Debug, Deserialize)]
pub struct CategoryRequest {
    pub name: String,
}

impl From<CategoryRequest> for CategoryInput {
    fn from(r: CategoryRequest) -> Self {
        CategoryInput { name: r.name }
    }
}

#[derive(Debug, Deserialize)]
pub struct ProductRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price_cents: i64,
    pub img_url: Option<String>,
    pub category_id: CategoryId,
}

impl From<ProductRequest> for ProductInput {
    fn from(r: ProductRequest) -> Self {
        ProductInput {
            name: r.name,
            description: r.description,
            price_cents: r.price_cents,
            img_url: r.img_url,
            category_id: r.category_id,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateFeedbackRequest {
    pub product_id: ProductId,
    pub rating: u8,
    #[serde(default)]
    pub comment: String,
}

impl CreateFeedbackRequest {
    /// The author is always the caller.
    pub fn into_new_feedback(self, author: UserId) -> NewFeedback {
        NewFeedback {
            product_id: self.product_id,
            user_id: author,
            rating: self.rating,
            comment: self.comment,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateFeedbackRequest {
    pub rating: u8,
    #[serde(default)]
    pub comment: String,
}

impl From<UpdateFeedbackRequest> for FeedbackUpdate {
    fn from(r: UpdateFeedbackRequest) -> Self {
        FeedbackUpdate { rating: r.rating, comment: r.comment }
    }
}

#[derive(Debug, Deserialize)]
pub struct CostumerRequest {
    pub user_id: Option<UserId>,
    pub name: String,
    pub cpf: String,
    pub phone: String,
}

impl From<CostumerRequest> for CostumerInput {
    fn from(r: CostumerRequest) -> Self {
        CostumerInput { user_id: r.user_id, name: r.name, cpf: r.cpf, phone: r.phone }
    }
}

#[derive(Debug, Deserialize)]
pub struct AddressRequest {
    pub costumer_id: CostumerId,
    pub street: String,
    pub number: String,
    pub complement: Option<String>,
    pub district: String,
    pub city: String,
    pub state: String,
    pub cep: String,
}

impl From<AddressRequest> for AddressInput {
    fn from(r: AddressRequest) -> Self {
        AddressInput {
            costumer_id: r.costumer_id,
            street: r.street,
            number: r.number,
            complement: r.complement,
            district: r.district,
            city: r.city,
            state: r.state,
            cep: r.cep,
        }
    }
}

/// Order line as sent by clients; the unit price comes from the product record.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct OrderLineRequest {
    pub product_id: ProductId,
    pub quantity: i64,
}

#[derive(Debug, Deserialize)]
pub struct OrderRequest {
    pub costumer_id: CostumerId,
    pub status: Option<OrderStatus>,
    pub items: Vec<OrderLineRequest>,
}

impl OrderRequest {
    /// `items` are the request lines after pricing.
    pub fn into_input(self, items: Vec<OrderItem>) -> OrderInput {
        OrderInput { costumer_id: self.costumer_id, status: self.status, items }
    }
}

#[derive(Debug, Deserialize)]
pub struct PaymentRequest {
    pub order_id: OrderId,
    pub status: Option<PaymentStatus>,
    pub method: PaymentMethod,
}

impl From<PaymentRequest> for PaymentInput {
    fn from(r: PaymentRequest) -> Self {
        PaymentInput {
            order_id: r.order_id,
            status: r.status.unwrap_or(PaymentStatus::Pending),
            method: r.method,
        }
    }
}

// -------------------------
// Response mapping
// -------------------------

/// Never exposes the password hash.
pub fn user_to_json(u: User) -> Value {
    json!({
        "id": raw_id(&u),
        "first_name": u.first_name,
        "last_name": u.last_name,
        "email": u.email,
        "roles": u.roles.labels(),
    })
}

pub fn category_to_json(c: Category) -> Value {
    json!({
        "id": raw_id(&c),
        "name": c.name,
    })
}

pub fn product_to_json(p: Product) -> Value {
    json!({
        "id": raw_id(&p),
        "name": p.name,
        "description": p.description,
        "price_cents": p.price_cents,
        "img_url": p.img_url,
        "category_id": p.category_id,
        "created_at": p.created_at,
    })
}

/// Catalog view: the product plus a summary of its reviews.
pub fn product_with_feedback_to_json(p: Product, feedback: FeedbackSummary) -> Value {
    let mut value = product_to_json(p);
    value["feedback"] = json!({
        "count": feedback.count,
        "average_rating": feedback.average_rating(),
    });
    value
}

pub fn feedback_to_json(f: Feedback) -> Value {
    json!({
        "id": raw_id(&f),
        "product_id": f.product_id,
        "user_id": f.user_id,
        "rating": f.rating,
        "comment": f.comment,
        "moment": f.moment,
    })
}

pub fn costumer_to_json(c: Costumer) -> Value {
    json!({
        "id": raw_id(&c),
        "user_id": c.user_id,
        "name": c.name,
        "cpf": c.cpf,
        "phone": c.phone,
    })
}

pub fn address_to_json(a: Address) -> Value {
    json!({
        "id": raw_id(&a),
        "costumer_id": a.costumer_id,
        "street": a.street,
        "number": a.number,
        "complement": a.complement,
        "district": a.district,
        "city": a.city,
        "state": a.state,
        "cep": a.cep,
    })
}

pub fn order_to_json(o: Order) -> Value {
    let total_cents = o.total_cents();
    json!({
        "id": raw_id(&o),
        "costumer_id": o.costumer_id,
        "moment": o.moment,
        "status": o.status,
        "items": o.items,
        "total_cents": total_cents,
    })
}

pub fn payment_to_json(p: Payment) -> Value {
    json!({
        "id": raw_id(&p),
        "order_id": p.order_id,
        "status": p.status,
        "method": p.method,
    })
}
