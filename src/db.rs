mod schema;

pub use schema::Database;

use crate::error::Result;
use chrono::{DateTime, SecondsFormat, Utc};
use std::fmt;

/// Named records in local storage.
///
/// Each key holds one full collection; every mutation rewrites the whole
/// value for its key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKey {
    /// Current user record.
    User,
    /// Book catalog.
    Books,
    /// Reviews, newest first.
    Reviews,
    /// Favorite book ids.
    Favorites,
    /// Book id to percent map.
    ReadingProgress,
    /// Recent search terms.
    SearchHistory,
    /// Built-in and user-defined themes.
    CustomThemes,
    /// Active theme id (stored raw, not JSON).
    CurrentTheme,
    /// Terms acceptance records.
    TermsAcceptances,
    /// Moderation audit trail, newest first.
    ModerationLogs,
}

impl StorageKey {
    /// All keys, in load order.
    pub const ALL: [StorageKey; 10] = [
        StorageKey::User,
        StorageKey::Books,
        StorageKey::Reviews,
        StorageKey::Favorites,
        StorageKey::ReadingProgress,
        StorageKey::SearchHistory,
        StorageKey::CustomThemes,
        StorageKey::CurrentTheme,
        StorageKey::TermsAcceptances,
        StorageKey::ModerationLogs,
    ];

    /// Key string as written to storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageKey::User => "user",
            StorageKey::Books => "books",
            StorageKey::Reviews => "reviews",
            StorageKey::Favorites => "favorites",
            StorageKey::ReadingProgress => "readingProgress",
            StorageKey::SearchHistory => "searchHistory",
            StorageKey::CustomThemes => "customThemes",
            StorageKey::CurrentTheme => "currentTheme",
            StorageKey::TermsAcceptances => "termsAcceptances",
            StorageKey::ModerationLogs => "moderationLogs",
        }
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Local key-value persistence used by the store.
pub trait Storage {
    /// Read the raw value for a key.
    fn get(&self, key: StorageKey) -> Result<Option<String>>;

    /// Replace the value for a key.
    fn set(&self, key: StorageKey, value: &str) -> Result<()>;

    /// Remove a key. Removing a missing key is not an error.
    fn remove(&self, key: StorageKey) -> Result<()>;
}

/// Timestamp helper.
pub fn now_timestamp() -> i64 {
    Utc::now().timestamp()
}

/// Current time as an RFC 3339 string with millisecond precision.
pub fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Convert timestamp to DateTime.
pub fn timestamp_to_datetime(ts: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(ts, 0).unwrap_or_else(Utc::now)
}
