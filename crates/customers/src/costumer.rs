use core::cmp::Ordering;

use letmebuy_core::validate::{require_max_len, require_non_blank};
use letmebuy_core::{
    CostumerId, DomainError, DomainResult, Entity, EntityPatch, NewEntity, ResourceKind, UserId,
    Validate,
};

use crate::document::{is_valid_cpf, normalize_cpf};

/// Buyer profile, optionally linked to a login account.
///
/// # Invariants
/// - `cpf` holds exactly eleven digits with valid verification digits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Costumer {
    id: Option<CostumerId>,
    pub user_id: Option<UserId>,
    pub name: String,
    pub cpf: String,
    pub phone: String,
}

impl Costumer {
    pub fn new(name: impl Into<String>, cpf: &str, phone: impl Into<String>) -> Self {
        Self {
            id: None,
            user_id: None,
            name: name.into(),
            cpf: normalize_cpf(cpf),
            phone: phone.into(),
        }
    }

    pub fn with_id(mut self, id: CostumerId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_user(mut self, user_id: UserId) -> Self {
        self.user_id = Some(user_id);
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct CostumerFilter {
    pub user_id: Option<UserId>,
}

impl Entity for Costumer {
    type Id = CostumerId;
    type Filter = CostumerFilter;

    const KIND: ResourceKind = ResourceKind::Costumer;
    const SORTABLE: &'static [&'static str] = &["id", "name"];

    fn id(&self) -> Option<CostumerId> {
        self.id
    }

    fn assign_id(&mut self, id: CostumerId) {
        self.id = Some(id);
    }

    fn matches(&self, filter: &CostumerFilter) -> bool {
        filter.user_id.is_none_or(|u| self.user_id == Some(u))
    }

    fn compare_by(&self, other: &Self, field: &str) -> Option<Ordering> {
        match field {
            "id" => Some(self.id.cmp(&other.id)),
            "name" => Some(self.name.cmp(&other.name)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CostumerInput {
    pub user_id: Option<UserId>,
    pub name: String,
    pub cpf: String,
    pub phone: String,
}

impl NewEntity<Costumer> for CostumerInput {
    fn into_entity(self) -> Costumer {
        Costumer {
            id: None,
            user_id: self.user_id,
            name: self.name.trim().to_string(),
            cpf: normalize_cpf(&self.cpf),
            phone: self.phone.trim().to_string(),
        }
    }
}

impl EntityPatch<Costumer> for CostumerInput {
    fn apply_to(self, costumer: &mut Costumer) {
        costumer.user_id = self.user_id;
        costumer.name = self.name.trim().to_string();
        costumer.cpf = normalize_cpf(&self.cpf);
        costumer.phone = self.phone.trim().to_string();
    }
}

impl Validate for CostumerInput {
    fn validate(&self) -> DomainResult<()> {
        require_non_blank("name", &self.name)?;
        require_max_len("name", &self.name, 120)?;
        if !is_valid_cpf(&self.cpf) {
            return Err(DomainError::validation("cpf is not a valid CPF"));
        }
        let phone_digits = self.phone.chars().filter(char::is_ascii_digit).count();
        if !(10..=13).contains(&phone_digits) {
            return Err(DomainError::validation("phone must have between 10 and 13 digits"));
        }
        Ok(())
    }
}
