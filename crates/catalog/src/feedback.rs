use core::cmp::Ordering;

use chrono::{DateTime, Utc};

use letmebuy_core::validate::require_max_len;
use letmebuy_core::{
    DomainError, DomainResult, Entity, EntityPatch, FeedbackId, NewEntity, ProductId, ResourceKind,
    UserId, Validate,
};

pub const MIN_RATING: u8 = 1;
pub const MAX_RATING: u8 = 5;

/// A customer's review of a product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feedback {
    id: Option<FeedbackId>,
    pub product_id: ProductId,
    pub user_id: UserId,
    pub rating: u8,
    pub comment: String,
    pub moment: DateTime<Utc>,
}

impl Feedback {
    pub fn new(
        product_id: ProductId,
        user_id: UserId,
        rating: u8,
        comment: impl Into<String>,
        moment: DateTime<Utc>,
    ) -> Self {
        Self { id: None, product_id, user_id, rating, comment: comment.into(), moment }
    }

    pub fn with_id(mut self, id: FeedbackId) -> Self {
        self.id = Some(id);
        self
    }
}

/// Review count and mean rating of one product.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeedbackSummary {
    pub count: u64,
    rating_sum: u64,
}

impl FeedbackSummary {
    pub fn add(&mut self, feedback: &Feedback) {
        self.count += 1;
        self.rating_sum += u64::from(feedback.rating);
    }

    /// Rounded to two decimals; `None` without reviews.
    pub fn average_rating(&self) -> Option<f64> {
        (self.count > 0).then(|| {
            let mean = self.rating_sum as f64 / self.count as f64;
            (mean * 100.0).round() / 100.0
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct FeedbackFilter {
    pub product_id: Option<ProductId>,
}

impl Entity for Feedback {
    type Id = FeedbackId;
    type Filter = FeedbackFilter;

    const KIND: ResourceKind = ResourceKind::Feedback;
    const SORTABLE: &'static [&'static str] = &["id", "rating", "moment"];

    fn id(&self) -> Option<FeedbackId> {
        self.id
    }

    fn assign_id(&mut self, id: FeedbackId) {
        self.id = Some(id);
    }

    fn matches(&self, filter: &FeedbackFilter) -> bool {
        filter.product_id.is_none_or(|p| p == self.product_id)
    }

    fn compare_by(&self, other: &Self, field: &str) -> Option<Ordering> {
        match field {
            "id" => Some(self.id.cmp(&other.id)),
            "rating" => Some(self.rating.cmp(&other.rating)),
            "moment" => Some(self.moment.cmp(&other.moment)),
            _ => None,
        }
    }
}

fn validate_review(rating: u8, comment: &str) -> DomainResult<()> {
    if !(MIN_RATING..=MAX_RATING).contains(&rating) {
        return Err(DomainError::validation(format!(
            "rating must be between {MIN_RATING} and {MAX_RATING}"
        )));
    }
    require_max_len("comment", comment, 1000)
}

#[derive(Debug, Clone)]
pub struct NewFeedback {
    pub product_id: ProductId,
    pub user_id: UserId,
    pub rating: u8,
    pub comment: String,
}

impl NewEntity<Feedback> for NewFeedback {
    fn into_entity(self) -> Feedback {
        Feedback::new(self.product_id, self.user_id, self.rating, self.comment, Utc::now())
    }
}

impl Validate for NewFeedback {
    fn validate(&self) -> DomainResult<()> {
        validate_review(self.rating, &self.comment)
    }
}

/// Only the review itself is editable; product, author and moment are fixed.
#[derive(Debug, Clone)]
pub struct FeedbackUpdate {
    pub rating: u8,
    pub comment: String,
}

impl EntityPatch<Feedback> for FeedbackUpdate {
    fn apply_to(self, feedback: &mut Feedback) {
        feedback.rating = self.rating;
        feedback.comment = self.comment;
    }
}

impl Validate for FeedbackUpdate {
    fn validate(&self) -> DomainResult<()> {
        validate_review(self.rating, &self.comment)
    }
}
