use core::cmp::Ordering;
use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use letmebuy_core::validate::require_positive;
use letmebuy_core::{
    CostumerId, DomainError, DomainResult, Entity, EntityPatch, NewEntity, OrderId, ProductId,
    ResourceKind, Validate,
};

/// Order status lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    WaitingPayment,
    Paid,
    Shipped,
    Delivered,
    Canceled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::WaitingPayment => "waiting_payment",
            OrderStatus::Paid => "paid",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Canceled => "canceled",
        }
    }

    pub fn is_final(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Canceled)
    }

    fn step(&self) -> u8 {
        match self {
            OrderStatus::WaitingPayment => 0,
            OrderStatus::Paid => 1,
            OrderStatus::Shipped => 2,
            OrderStatus::Delivered => 3,
            OrderStatus::Canceled => 4,
        }
    }

    /// Status only moves forward, and never once delivered or canceled.
    /// Staying put is always allowed.
    pub fn can_become(&self, next: OrderStatus) -> bool {
        *self == next || (!self.is_final() && next.step() > self.step())
    }

    pub fn check_transition(&self, next: OrderStatus) -> DomainResult<()> {
        if self.can_become(next) {
            Ok(())
        } else {
            Err(DomainError::validation(format!(
                "order status cannot change from {self} to {next}"
            )))
        }
    }
}

impl core::str::FromStr for OrderStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "waiting_payment" => Ok(OrderStatus::WaitingPayment),
            "paid" => Ok(OrderStatus::Paid),
            "shipped" => Ok(OrderStatus::Shipped),
            "delivered" => Ok(OrderStatus::Delivered),
            "canceled" => Ok(OrderStatus::Canceled),
            other => Err(DomainError::validation(format!("unknown order status '{other}'"))),
        }
    }
}

impl core::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Order line: product, quantity, unit price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub product_id: ProductId,
    pub quantity: i64,
    /// Price in smallest currency unit, captured when the order was placed.
    pub unit_price_cents: i64,
}

impl OrderItem {
    pub fn subtotal_cents(&self) -> i64 {
        self.quantity.saturating_mul(self.unit_price_cents)
    }
}

/// A costumer's order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    id: Option<OrderId>,
    pub costumer_id: CostumerId,
    pub moment: DateTime<Utc>,
    pub status: OrderStatus,
    pub items: Vec<OrderItem>,
}

impl Order {
    pub fn new(costumer_id: CostumerId, moment: DateTime<Utc>, items: Vec<OrderItem>) -> Self {
        Self { id: None, costumer_id, moment, status: OrderStatus::WaitingPayment, items }
    }

    pub fn with_id(mut self, id: OrderId) -> Self {
        self.id = Some(id);
        self
    }

    /// Sum of quantity times unit price over every line.
    pub fn total_cents(&self) -> i64 {
        self.items
            .iter()
            .fold(0i64, |acc, item| acc.saturating_add(item.subtotal_cents()))
    }
}

#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
    pub costumer_id: Option<CostumerId>,
    pub status: Option<OrderStatus>,
}

impl Entity for Order {
    type Id = OrderId;
    type Filter = OrderFilter;

    const KIND: ResourceKind = ResourceKind::Order;
    const SORTABLE: &'static [&'static str] = &["id", "moment"];

    fn id(&self) -> Option<OrderId> {
        self.id
    }

    fn assign_id(&mut self, id: OrderId) {
        self.id = Some(id);
    }

    fn matches(&self, filter: &OrderFilter) -> bool {
        filter.costumer_id.is_none_or(|c| c == self.costumer_id)
            && filter.status.is_none_or(|s| s == self.status)
    }

    fn compare_by(&self, other: &Self, field: &str) -> Option<Ordering> {
        match field {
            "id" => Some(self.id.cmp(&other.id)),
            "moment" => Some(self.moment.cmp(&other.moment)),
            _ => None,
        }
    }
}

/// Create/update payload. New orders ignore `status` and start out waiting for payment;
/// updates only apply a status the current one [can become](OrderStatus::can_become).
#[derive(Debug, Clone)]
pub struct OrderInput {
    pub costumer_id: CostumerId,
    pub status: Option<OrderStatus>,
    pub items: Vec<OrderItem>,
}

impl NewEntity<Order> for OrderInput {
    fn into_entity(self) -> Order {
        Order::new(self.costumer_id, Utc::now(), self.items)
    }
}

impl EntityPatch<Order> for OrderInput {
    fn apply_to(self, order: &mut Order) {
        order.costumer_id = self.costumer_id;
        order.items = self.items;
        if let Some(status) = self.status.filter(|s| order.status.can_become(*s)) {
            order.status = status;
        }
    }
}

impl Validate for OrderInput {
    fn validate(&self) -> DomainResult<()> {
        if self.items.is_empty() {
            return Err(DomainError::validation("an order needs at least one item"));
        }
        let mut seen = BTreeSet::new();
        for item in &self.items {
            require_positive("quantity", item.quantity)?;
            if item.unit_price_cents < 0 {
                return Err(DomainError::validation("unit price must not be negative"));
            }
            if !seen.insert(item.product_id) {
                return Err(DomainError::validation(format!(
                    "product {} appears more than once",
                    item.product_id
                )));
            }
        }
        Ok(())
    }
}
