//! `letmebuy-sales` — orders and how they are paid.

pub mod order;
pub mod payment;

pub use order::{Order, OrderFilter, OrderInput, OrderItem, OrderStatus};
pub use payment::{Payment, PaymentFilter, PaymentInput, PaymentMethod, PaymentStatus, MAX_INSTALLMENTS};
