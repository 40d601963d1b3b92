use core::cmp::Ordering;

use chrono::{DateTime, Utc};

use letmebuy_core::validate::{require_max_len, require_non_blank};
use letmebuy_core::{
    CategoryId, DomainError, DomainResult, Entity, EntityPatch, NewEntity, ProductId, ResourceKind,
    Validate,
};

/// Catalog product.
///
/// # Invariants
/// - `price_cents >= 0` (smallest currency unit).
/// - `category_id` references an existing category (enforced by the gateway).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    id: Option<ProductId>,
    pub name: String,
    pub description: String,
    pub price_cents: i64,
    pub img_url: Option<String>,
    pub category_id: CategoryId,
    pub created_at: DateTime<Utc>,
}

impl Product {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        price_cents: i64,
        category_id: CategoryId,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: None,
            name: name.into(),
            description: description.into(),
            price_cents,
            img_url: None,
            category_id,
            created_at,
        }
    }

    pub fn with_id(mut self, id: ProductId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_img_url(mut self, url: impl Into<String>) -> Self {
        self.img_url = Some(url.into());
        self
    }
}

/// Paged query criteria for products.
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    pub category_id: Option<CategoryId>,
    /// Case-insensitive substring of the name.
    pub name: Option<String>,
}

impl Entity for Product {
    type Id = ProductId;
    type Filter = ProductFilter;

    const KIND: ResourceKind = ResourceKind::Product;
    const SORTABLE: &'static [&'static str] = &["id", "name", "price", "created_at"];

    fn id(&self) -> Option<ProductId> {
        self.id
    }

    fn assign_id(&mut self, id: ProductId) {
        self.id = Some(id);
    }

    fn matches(&self, filter: &ProductFilter) -> bool {
        let category_ok = filter.category_id.is_none_or(|c| c == self.category_id);
        let name_ok = filter
            .name
            .as_deref()
            .map(str::trim)
            .is_none_or(|needle| self.name.to_lowercase().contains(&needle.to_lowercase()));
        category_ok && name_ok
    }

    fn compare_by(&self, other: &Self, field: &str) -> Option<Ordering> {
        match field {
            "id" => Some(self.id.cmp(&other.id)),
            "name" => Some(self.name.cmp(&other.name)),
            "price" => Some(self.price_cents.cmp(&other.price_cents)),
            "created_at" => Some(self.created_at.cmp(&other.created_at)),
            _ => None,
        }
    }
}

/// Create/update payload. `created_at` is set once, on creation.
#[derive(Debug, Clone)]
pub struct ProductInput {
    pub name: String,
    pub description: String,
    pub price_cents: i64,
    pub img_url: Option<String>,
    pub category_id: CategoryId,
}

impl NewEntity<Product> for ProductInput {
    fn into_entity(self) -> Product {
        Product {
            id: None,
            name: self.name.trim().to_string(),
            description: self.description,
            price_cents: self.price_cents,
            img_url: self.img_url,
            category_id: self.category_id,
            created_at: Utc::now(),
        }
    }
}

impl EntityPatch<Product> for ProductInput {
    fn apply_to(self, product: &mut Product) {
        product.name = self.name.trim().to_string();
        product.description = self.description;
        product.price_cents = self.price_cents;
        product.img_url = self.img_url;
        product.category_id = self.category_id;
    }
}

impl Validate for ProductInput {
    fn validate(&self) -> DomainResult<()> {
        require_non_blank("name", &self.name)?;
        require_max_len("name", &self.name, 120)?;
        if self.price_cents < 0 {
            return Err(DomainError::validation("price must not be negative"));
        }
        if let Some(url) = &self.img_url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(DomainError::validation("img_url must be an http(s) URL"));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn phone() -> Product {
        Product::new("Smart Phone", "A phone", 90_000, CategoryId::new(2), Utc::now())
    }

    fn input(price_cents: i64) -> ProductInput {
        ProductInput {
            name: "PC Gamer".into(),
            description: "Fast".into(),
            price_cents,
            img_url: Some("https://img.example.com/pc.png".into()),
            category_id: CategoryId::new(3),
        }
    }

    #[test]
    fn filter_combines_category_and_name() {
        let p = phone();
        assert!(p.matches(&ProductFilter::default()));
        assert!(p.matches(&ProductFilter { category_id: Some(CategoryId::new(2)), name: Some("phone".into()) }));
        assert!(!p.matches(&ProductFilter { category_id: Some(CategoryId::new(1)), name: None }));
        assert!(!p.matches(&ProductFilter { category_id: None, name: Some("tablet".into()) }));
    }

    #[test]
    fn update_preserves_id_and_creation_time() {
        let original = phone().with_id(ProductId::new(1));
        let mut updated = original.clone();
        input(5_000).apply_to(&mut updated);

        assert_eq!(updated.id(), Some(ProductId::new(1)));
        assert_eq!(updated.created_at, original.created_at);
        assert_eq!(updated.category_id, CategoryId::new(3));
        assert_eq!(updated.price_cents, 5_000);
    }

    #[test]
    fn validation_rejects_negative_price_and_bad_urls() {
        assert!(input(-1).validate().is_err());
        let mut bad_url = input(10);
        bad_url.img_url = Some("ftp://x".into());
        assert!(bad_url.validate().is_err());
        assert!(input(0).validate().is_ok());
    }

    #[test]
    fn sorting_by_unknown_field_is_none() {
        assert_eq!(phone().compare_by(&phone(), "weight"), None);
    }

    proptest! {
        #[test]
        fn non_negative_prices_validate(price in 0i64..=i64::MAX) {
            prop_assert!(input(price).validate().is_ok());
        }

        #[test]
        fn price_ordering_follows_cents(a in 0i64..1_000_000, b in 0i64..1_000_000) {
            let mut pa = phone();
            pa.price_cents = a;
            let mut pb = phone();
            pb.price_cents = b;
            prop_assert_eq!(pa.compare_by(&pb, "price"), Some(a.cmp(&b)));
        }
    }
}
