//! Session and role handling.
//!
//! There is no real authentication: the role is chosen by the client at
//! login and the only credential check is a minimum password length.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Fixed id given to every logged-in user.
pub const SESSION_USER_ID: &str = "1";

/// Minimum accepted password length.
pub const MIN_PASSWORD_LEN: usize = 6;

/// User role.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Standard library access.
    #[default]
    User,
    /// Can block and moderate content.
    Reviewer,
    /// Full access, including role management.
    Admin,
}

impl Role {
    /// Whether this role may block, unblock or approve books.
    pub fn can_moderate(&self) -> bool {
        matches!(self, Role::Reviewer | Role::Admin)
    }

    /// Lowercase role name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Reviewer => "reviewer",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The active user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// User ID.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Login email.
    pub email: String,
    /// Avatar image URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    /// Self-declared role.
    pub role: Role,
}

/// Check login credentials.
pub fn credentials_valid(email: &str, password: &str) -> bool {
    !email.is_empty() && password.chars().count() >= MIN_PASSWORD_LEN
}

/// Display name derived from the local part of an email.
pub fn name_from_email(email: &str) -> String {
    email.split('@').next().unwrap_or_default().to_string()
}

/// Deterministic avatar URL for an email.
pub fn avatar_url(base: &str, email: &str) -> String {
    format!("{}{}", base, urlencoding::encode(email))
}

/// Build the session user for validated credentials.
pub fn session_user(email: &str, role: Role, avatar_base: &str) -> User {
    User {
        id: SESSION_USER_ID.to_string(),
        name: name_from_email(email),
        email: email.to_string(),
        avatar: Some(avatar_url(avatar_base, email)),
        role,
    }
}
