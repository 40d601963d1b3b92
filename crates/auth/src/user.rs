//! User accounts (the records actors own).

use core::cmp::Ordering;

use letmebuy_core::validate::{require_email, require_max_len, require_non_blank};
use letmebuy_core::{DomainError, DomainResult, Entity, EntityPatch, NewEntity, ResourceKind, UserId, Validate};

use crate::RoleSet;

/// User account.
///
/// # Invariants
/// - `email` is unique across accounts (enforced by the gateway).
/// - `password_hash` is a PHC string, never a plaintext password.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    id: Option<UserId>,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password_hash: String,
    pub roles: RoleSet,
}

impl User {
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        email: impl Into<String>,
        password_hash: impl Into<String>,
        roles: RoleSet,
    ) -> Self {
        Self {
            id: None,
            first_name: first_name.into(),
            last_name: last_name.into(),
            email: normalize_email(&email.into()),
            password_hash: password_hash.into(),
            roles,
        }
    }

    pub fn with_id(mut self, id: UserId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name).trim().to_string()
    }
}

fn normalize_email(raw: &str) -> String {
    raw.trim().to_ascii_lowercase()
}

/// Paged query criteria for users.
#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    /// Exact (case-insensitive) email match.
    pub email: Option<String>,
}

impl Entity for User {
    type Id = UserId;
    type Filter = UserFilter;

    const KIND: ResourceKind = ResourceKind::User;
    const SORTABLE: &'static [&'static str] = &["id", "email", "first_name", "last_name"];

    fn id(&self) -> Option<UserId> {
        self.id
    }

    fn assign_id(&mut self, id: UserId) {
        self.id = Some(id);
    }

    fn matches(&self, filter: &UserFilter) -> bool {
        filter
            .email
            .as_deref()
            .is_none_or(|email| self.email == normalize_email(email))
    }

    fn compare_by(&self, other: &Self, field: &str) -> Option<Ordering> {
        match field {
            "id" => Some(self.id.cmp(&other.id)),
            "email" => Some(self.email.cmp(&other.email)),
            "first_name" => Some(self.first_name.cmp(&other.first_name)),
            "last_name" => Some(self.last_name.cmp(&other.last_name)),
            _ => None,
        }
    }
}

/// Input for registering a user. The password arrives already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password_hash: String,
    pub roles: RoleSet,
}

impl NewEntity<User> for NewUser {
    fn into_entity(self) -> User {
        User::new(self.first_name, self.last_name, self.email, self.password_hash, self.roles)
    }
}

impl Validate for NewUser {
    fn validate(&self) -> DomainResult<()> {
        validate_profile(&self.first_name, &self.email)?;
        if self.password_hash.is_empty() {
            return Err(DomainError::validation("password must not be empty"));
        }
        Ok(())
    }
}

/// Input for updating a user's profile.
///
/// `roles: None` keeps the current roles; only administrators may change them.
#[derive(Debug, Clone)]
pub struct UserUpdate {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub roles: Option<RoleSet>,
}

impl EntityPatch<User> for UserUpdate {
    fn apply_to(self, user: &mut User) {
        user.first_name = self.first_name;
        user.last_name = self.last_name;
        user.email = normalize_email(&self.email);
        if let Some(roles) = self.roles {
            user.roles = roles;
        }
    }
}

impl Validate for UserUpdate {
    fn validate(&self) -> DomainResult<()> {
        validate_profile(&self.first_name, &self.email)
    }
}

fn validate_profile(first_name: &str, email: &str) -> DomainResult<()> {
    require_non_blank("first_name", first_name)?;
    require_max_len("first_name", first_name, 80)?;
    require_email("email", email)
}
