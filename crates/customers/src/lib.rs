//! `letmebuy-customers` — buyer profiles and their delivery addresses.

pub mod address;
pub mod costumer;
pub mod document;

pub use address::{Address, AddressFilter, AddressInput, STATES};
pub use costumer::{Costumer, CostumerFilter, CostumerInput};
pub use document::{is_valid_cpf, normalize_cep, normalize_cpf};
