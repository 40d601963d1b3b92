//! `letmebuy-catalog` — what the shop sells: categories, products and their reviews.

pub mod category;
pub mod feedback;
pub mod product;

pub use category::{Category, CategoryFilter, CategoryInput};
pub use feedback::{
    Feedback, FeedbackFilter, FeedbackSummary, FeedbackUpdate, NewFeedback, MAX_RATING, MIN_RATING,
};
pub use product::{Product, ProductFilter, ProductInput};
