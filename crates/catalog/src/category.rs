use core::cmp::Ordering;

use letmebuy_core::validate::{require_max_len, require_non_blank};
use letmebuy_core::{CategoryId, DomainResult, Entity, EntityPatch, NewEntity, ResourceKind, Validate};

/// Product grouping shown in the storefront menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    id: Option<CategoryId>,
    pub name: String,
}

impl Category {
    pub fn new(name: impl Into<String>) -> Self {
        Self { id: None, name: name.into().trim().to_string() }
    }

    pub fn with_id(mut self, id: CategoryId) -> Self {
        self.id = Some(id);
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct CategoryFilter {
    /// Case-insensitive substring of the name.
    pub name: Option<String>,
}

impl Entity for Category {
    type Id = CategoryId;
    type Filter = CategoryFilter;

    const KIND: ResourceKind = ResourceKind::Category;
    const SORTABLE: &'static [&'static str] = &["id", "name"];

    fn id(&self) -> Option<CategoryId> {
        self.id
    }

    fn assign_id(&mut self, id: CategoryId) {
        self.id = Some(id);
    }

    fn matches(&self, filter: &CategoryFilter) -> bool {
        filter
            .name
            .as_deref()
            .is_none_or(|needle| self.name.to_lowercase().contains(&needle.trim().to_lowercase()))
    }

    fn compare_by(&self, other: &Self, field: &str) -> Option<Ordering> {
        match field {
            "id" => Some(self.id.cmp(&other.id)),
            "name" => Some(self.name.cmp(&other.name)),
            _ => None,
        }
    }
}

/// Create/update payload; a category has a single editable field.
#[derive(Debug, Clone)]
pub struct CategoryInput {
    pub name: String,
}

impl NewEntity<Category> for CategoryInput {
    fn into_entity(self) -> Category {
        Category::new(self.name)
    }
}

impl EntityPatch<Category> for CategoryInput {
    fn apply_to(self, category: &mut Category) {
        category.name = self.name.trim().to_string();
    }
}

impl Validate for CategoryInput {
    fn validate(&self) -> DomainResult<()> {
        require_non_blank("name", &self.name)?;
        require_max_len("name", &self.name, 60)
    }
}
