//! Library entities: books, reviews, moderation records, themes and stats.

pub mod book;
pub mod moderation;
pub mod review;
pub mod stats;
pub mod theme;

pub use book::{Book, BookPatch};
pub use moderation::{ModerationAction, ModerationLog, TermsAcceptance};
pub use review::{NewReview, Review};
pub use stats::ReadingStats;
pub use theme::{Theme, ThemeColors};
