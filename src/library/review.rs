//! Reader reviews.

use serde::{Deserialize, Serialize};

/// A published review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    /// Review ID.
    pub id: String,
    /// Reviewed book.
    pub book_id: String,
    /// Author user ID.
    pub user_id: String,
    /// Author display name.
    #[serde(default)]
    pub user_name: String,
    /// Author avatar URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_avatar: Option<String>,
    /// Star rating.
    pub rating: f64,
    /// Review body.
    pub text: String,
    /// Publication time (RFC 3339).
    pub date: String,
    /// Number of "helpful" votes.
    #[serde(default)]
    pub helpful: u32,
}

/// Review fields supplied by the caller; id, date and helpful are assigned
/// by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewReview {
    /// Reviewed book.
    pub book_id: String,
    /// Author user ID.
    pub user_id: String,
    /// Author display name.
    #[serde(default)]
    pub user_name: String,
    /// Author avatar URL.
    #[serde(default)]
    pub user_avatar: Option<String>,
    /// Star rating.
    pub rating: f64,
    /// Review body.
    pub text: String,
}

impl NewReview {
    /// Publish with the given id and date.
    pub fn publish(self, id: String, date: String) -> Review {
        Review {
            id,
            book_id: self.book_id,
            user_id: self.user_id,
            user_name: self.user_name,
            user_avatar: self.user_avatar,
            rating: self.rating,
            text: self.text,
            date,
            helpful: 0,
        }
    }
}
