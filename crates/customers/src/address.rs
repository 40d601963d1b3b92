use core::cmp::Ordering;

use letmebuy_core::validate::{require_max_len, require_non_blank};
use letmebuy_core::{
    AddressId, CostumerId, DomainError, DomainResult, Entity, EntityPatch, NewEntity, ResourceKind,
    Validate,
};

use crate::document::normalize_cep;

/// Federative unit abbreviations accepted in `Address::state`.
pub const STATES: [&str; 27] = [
    "AC", "AL", "AM", "AP", "BA", "CE", "DF", "ES", "GO", "MA", "MG", "MS", "MT", "PA", "PB", "PE",
    "PI", "PR", "RJ", "RN", "RO", "RR", "RS", "SC", "SE", "SP", "TO",
];

/// Delivery address belonging to a costumer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Address {
    id: Option<AddressId>,
    pub costumer_id: CostumerId,
    pub street: String,
    pub number: String,
    pub complement: Option<String>,
    pub district: String,
    pub city: String,
    /// Two-letter UF, upper case.
    pub state: String,
    /// Eight digits, no hyphen.
    pub cep: String,
}

impl Address {
    pub fn with_id(mut self, id: AddressId) -> Self {
        self.id = Some(id);
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct AddressFilter {
    pub costumer_id: Option<CostumerId>,
}

impl Entity for Address {
    type Id = AddressId;
    type Filter = AddressFilter;

    const KIND: ResourceKind = ResourceKind::Address;
    const SORTABLE: &'static [&'static str] = &["id", "city", "state"];

    fn id(&self) -> Option<AddressId> {
        self.id
    }

    fn assign_id(&mut self, id: AddressId) {
        self.id = Some(id);
    }

    fn matches(&self, filter: &AddressFilter) -> bool {
        filter.costumer_id.is_none_or(|c| c == self.costumer_id)
    }

    fn compare_by(&self, other: &Self, field: &str) -> Option<Ordering> {
        match field {
            "id" => Some(self.id.cmp(&other.id)),
            "city" => Some(self.city.cmp(&other.city)),
            "state" => Some(self.state.cmp(&other.state)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AddressInput {
    pub costumer_id: CostumerId,
    pub street: String,
    pub number: String,
    pub complement: Option<String>,
    pub district: String,
    pub city: String,
    pub state: String,
    pub cep: String,
}

impl AddressInput {
    fn write_into(self, address: &mut Address) {
        address.costumer_id = self.costumer_id;
        address.street = self.street.trim().to_string();
        address.number = self.number.trim().to_string();
        address.complement = self.complement.map(|c| c.trim().to_string()).filter(|c| !c.is_empty());
        address.district = self.district.trim().to_string();
        address.city = self.city.trim().to_string();
        address.state = self.state.trim().to_ascii_uppercase();
        address.cep = normalize_cep(&self.cep).unwrap_or(self.cep);
    }
}

impl NewEntity<Address> for AddressInput {
    fn into_entity(self) -> Address {
        let mut address = Address {
            id: None,
            costumer_id: self.costumer_id,
            street: String::new(),
            number: String::new(),
            complement: None,
            district: String::new(),
            city: String::new(),
            state: String::new(),
            cep: String::new(),
        };
        self.write_into(&mut address);
        address
    }
}

impl EntityPatch<Address> for AddressInput {
    fn apply_to(self, address: &mut Address) {
        self.write_into(address);
    }
}

impl Validate for AddressInput {
    fn validate(&self) -> DomainResult<()> {
        for (field, value) in [
            ("street", &self.street),
            ("number", &self.number),
            ("district", &self.district),
            ("city", &self.city),
        ] {
            require_non_blank(field, value)?;
            require_max_len(field, value, 120)?;
        }
        if !STATES.contains(&self.state.trim().to_ascii_uppercase().as_str()) {
            return Err(DomainError::validation(format!("unknown state '{}'", self.state)));
        }
        if normalize_cep(&self.cep).is_none() {
            return Err(DomainError::validation("cep must have eight digits"));
        }
        Ok(())
    }
}
