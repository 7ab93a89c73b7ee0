//! Moderation audit trail and terms acceptances.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Moderator id recorded for actions taken without a session.
pub const ANONYMOUS_ID: &str = "anonymous";

/// Moderator name recorded for actions taken without a session.
pub const ANONYMOUS_NAME: &str = "Anonymous user";

/// Reason recorded when a book is unblocked.
pub const UNBLOCK_REASON: &str = "Review completed - content approved";

/// Kind of moderation action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModerationAction {
    /// Book hidden from regular users.
    Block,
    /// Book made visible again.
    Unblock,
    /// Book reported for review.
    Flag,
    /// Book reviewed and approved.
    Approve,
}

impl fmt::Display for ModerationAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ModerationAction::Block => "block",
            ModerationAction::Unblock => "unblock",
            ModerationAction::Flag => "flag",
            ModerationAction::Approve => "approve",
        };
        f.write_str(s)
    }
}

/// One entry of the moderation audit trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModerationLog {
    /// Log entry ID.
    pub id: String,
    /// Affected book.
    pub book_id: String,
    /// Acting user ID.
    pub moderator_id: String,
    /// Acting user name.
    #[serde(default)]
    pub moderator_name: String,
    /// Action taken.
    pub action: ModerationAction,
    /// Free-form reason.
    pub reason: String,
    /// When the action was taken (RFC 3339).
    pub timestamp: String,
}

/// Record that a user agreed to a book's terms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TermsAcceptance {
    /// Acceptance ID.
    pub id: String,
    /// Accepting user ID.
    pub user_id: String,
    /// Book whose terms were accepted.
    pub book_id: String,
    /// Acceptance time (RFC 3339).
    pub accepted_at: String,
    /// Client address, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    /// Client identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}
