use core::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use letmebuy_core::{
    DomainError, DomainResult, Entity, EntityPatch, NewEntity, OrderId, PaymentId, ResourceKind,
    Validate,
};

pub const MAX_INSTALLMENTS: u8 = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Settled,
    Canceled,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Settled => "settled",
            PaymentStatus::Canceled => "canceled",
        }
    }
}

impl core::str::FromStr for PaymentStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(PaymentStatus::Pending),
            "settled" => Ok(PaymentStatus::Settled),
            "canceled" => Ok(PaymentStatus::Canceled),
            other => Err(DomainError::validation(format!("unknown payment status '{other}'"))),
        }
    }
}

/// How an order is paid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PaymentMethod {
    Card { installments: u8 },
    Slip { due_at: DateTime<Utc>, paid_at: Option<DateTime<Utc>> },
}

/// Payment of a single order.
///
/// # Invariants
/// - At most one payment per order (enforced by the gateway).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payment {
    id: Option<PaymentId>,
    pub order_id: OrderId,
    pub status: PaymentStatus,
    pub method: PaymentMethod,
}

impl Payment {
    pub fn new(order_id: OrderId, method: PaymentMethod) -> Self {
        Self { id: None, order_id, status: PaymentStatus::Pending, method }
    }

    pub fn with_id(mut self, id: PaymentId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_status(mut self, status: PaymentStatus) -> Self {
        self.status = status;
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct PaymentFilter {
    pub order_id: Option<OrderId>,
}

impl Entity for Payment {
    type Id = PaymentId;
    type Filter = PaymentFilter;

    const KIND: ResourceKind = ResourceKind::Payment;
    const SORTABLE: &'static [&'static str] = &["id"];

    fn id(&self) -> Option<PaymentId> {
        self.id
    }

    fn assign_id(&mut self, id: PaymentId) {
        self.id = Some(id);
    }

    fn matches(&self, filter: &PaymentFilter) -> bool {
        filter.order_id.is_none_or(|o| o == self.order_id)
    }

    fn compare_by(&self, other: &Self, field: &str) -> Option<Ordering> {
        match field {
            "id" => Some(self.id.cmp(&other.id)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PaymentInput {
    pub order_id: OrderId,
    pub status: PaymentStatus,
    pub method: PaymentMethod,
}

impl NewEntity<Payment> for PaymentInput {
    fn into_entity(self) -> Payment {
        Payment::new(self.order_id, self.method).with_status(self.status)
    }
}

impl EntityPatch<Payment> for PaymentInput {
    fn apply_to(self, payment: &mut Payment) {
        payment.order_id = self.order_id;
        payment.status = self.status;
        payment.method = self.method;
    }
}

impl Validate for PaymentInput {
    fn validate(&self) -> DomainResult<()> {
        match &self.method {
            PaymentMethod::Card { installments } => {
                if !(1..=MAX_INSTALLMENTS).contains(installments) {
                    return Err(DomainError::validation(format!(
                        "installments must be between 1 and {MAX_INSTALLMENTS}"
                    )));
                }
            }
            PaymentMethod::Slip { paid_at, .. } => {
                if self.status == PaymentStatus::Settled && paid_at.is_none() {
                    return Err(DomainError::validation("a settled slip needs paid_at"));
                }
                if self.status != PaymentStatus::Settled && paid_at.is_some() {
                    return Err(DomainError::validation("only settled slips carry paid_at"));
                }
            }
        }
        Ok(())
    }
}
