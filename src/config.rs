use crate::auth::Role;
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Local book library with reviews, moderation, reading progress and themes.
#[derive(Parser, Debug, Clone)]
#[command(name = "bookshelf-rs")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to config file.
    #[arg(short, long, env = "BOOKSHELF_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Run as if the platform reported no network connection.
    #[arg(long, global = true, hide = true)]
    pub offline: bool,

    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create default config and seed local storage.
    Init {
        /// Force overwrite existing config.
        #[arg(short, long)]
        force: bool,
    },

    /// Start a session.
    Login {
        /// Email address.
        email: String,
        /// Password (will prompt if not provided).
        #[arg(short, long)]
        password: Option<String>,
        /// Role to act as.
        #[arg(short, long, value_enum, default_value_t = Role::User)]
        role: Role,
    },

    /// End the current session.
    Logout,

    /// Show the current user.
    Whoami,

    /// Change the current user's role (admins only).
    Role {
        /// New role.
        #[arg(value_enum)]
        role: Role,
    },

    /// Book catalog commands.
    Book {
        /// Book subcommand action.
        #[command(subcommand)]
        action: BookCommand,
    },

    /// Moderation commands.
    Moderate {
        /// Moderation subcommand action.
        #[command(subcommand)]
        action: ModerateCommand,
    },

    /// Terms acceptance commands.
    Terms {
        /// Terms subcommand action.
        #[command(subcommand)]
        action: TermsCommand,
    },

    /// Review commands.
    Review {
        /// Review subcommand action.
        #[command(subcommand)]
        action: ReviewCommand,
    },

    /// Favorite commands.
    Fav {
        /// Favorite subcommand action.
        #[command(subcommand)]
        action: FavCommand,
    },

    /// Reading progress commands.
    Progress {
        /// Progress subcommand action.
        #[command(subcommand)]
        action: ProgressCommand,
    },

    /// Search history commands.
    Search {
        /// Search subcommand action.
        #[command(subcommand)]
        action: SearchCommand,
    },

    /// Show reading statistics.
    Stats,

    /// Theme commands.
    Theme {
        /// Theme subcommand action.
        #[command(subcommand)]
        action: ThemeCommand,
    },

    /// Local storage maintenance.
    Storage {
        /// Storage subcommand action.
        #[command(subcommand)]
        action: StorageCommand,
    },
}

/// Book catalog subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum BookCommand {
    /// List books visible to the current user.
    List {
        /// Include blocked books regardless of role.
        #[arg(long)]
        all: bool,
    },

    /// Show one book.
    Show {
        /// Book ID.
        id: String,
    },

    /// Add a book.
    Add {
        /// Book title.
        title: String,
        /// Author name.
        #[arg(short, long)]
        author: String,
        /// Genre.
        #[arg(short, long, default_value = "")]
        genre: String,
        /// Page count.
        #[arg(short, long, default_value_t = 0)]
        pages: u32,
        /// Publication year.
        #[arg(short, long, default_value_t = 0)]
        year: i32,
        /// Rating.
        #[arg(long, default_value_t = 0.0)]
        rating: f64,
        /// Book ID (generated if omitted).
        #[arg(long)]
        id: Option<String>,
        /// Description.
        #[arg(long, default_value = "")]
        description: String,
    },

    /// Import books from a JSON array file.
    Import {
        /// JSON file path.
        file: PathBuf,
    },

    /// Update fields of a book.
    Update {
        /// Book ID.
        id: String,
        /// New title.
        #[arg(long)]
        title: Option<String>,
        /// New author.
        #[arg(long)]
        author: Option<String>,
        /// New genre.
        #[arg(long)]
        genre: Option<String>,
        /// New page count.
        #[arg(long)]
        pages: Option<u32>,
        /// New publication year.
        #[arg(long)]
        year: Option<i32>,
        /// New rating.
        #[arg(long)]
        rating: Option<f64>,
    },

    /// Delete a book.
    Delete {
        /// Book ID.
        id: String,
    },
}

/// Moderation subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum ModerateCommand {
    /// Block a book (reviewers and admins).
    Block {
        /// Book ID.
        id: String,
        /// Reason.
        reason: String,
    },

    /// Unblock a book (reviewers and admins).
    Unblock {
        /// Book ID.
        id: String,
    },

    /// Report a book for review.
    Flag {
        /// Book ID.
        id: String,
        /// Reason.
        reason: String,
    },

    /// Approve a book (reviewers and admins).
    Approve {
        /// Book ID.
        id: String,
        /// Optional note.
        #[arg(default_value = "")]
        reason: String,
    },

    /// Show the moderation log.
    Logs {
        /// Only entries for this book.
        #[arg(short, long)]
        book: Option<String>,
    },

    /// List blocked books.
    Blocked,
}

/// Terms acceptance subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum TermsCommand {
    /// Accept the terms of a book.
    Accept {
        /// Book ID.
        book: String,
    },

    /// Show the current user's acceptance for a book.
    Show {
        /// Book ID.
        book: String,
    },
}

/// Review subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum ReviewCommand {
    /// Publish a review as the current user.
    Add {
        /// Book ID.
        book: String,
        /// Star rating.
        rating: f64,
        /// Review text.
        text: String,
    },

    /// List reviews of a book.
    List {
        /// Book ID.
        book: String,
    },

    /// Mark a review as helpful.
    Helpful {
        /// Review ID.
        id: String,
    },
}

/// Favorite subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum FavCommand {
    /// Add a book to favorites.
    Add {
        /// Book ID.
        id: String,
    },

    /// Remove a book from favorites.
    Remove {
        /// Book ID.
        id: String,
    },

    /// List favorite books.
    List,
}

/// Reading progress subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum ProgressCommand {
    /// Record progress for a book (percent, clamped to 0-100).
    Set {
        /// Book ID.
        book: String,
        /// Percent read.
        #[arg(allow_negative_numbers = true)]
        percent: f64,
    },

    /// Show progress for one or all books.
    Show {
        /// Book ID.
        book: Option<String>,
    },
}

/// Search history subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum SearchCommand {
    /// Record a search term.
    Add {
        /// Search term.
        term: String,
    },

    /// List recent searches.
    List,

    /// Clear search history.
    Clear,
}

/// Theme subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum ThemeCommand {
    /// List themes.
    List,

    /// Create a theme from HSL color values.
    Add {
        /// Theme ID.
        id: String,
        /// Display name.
        name: String,
        /// Primary color.
        #[arg(long)]
        primary: String,
        /// Secondary color.
        #[arg(long)]
        secondary: String,
        /// Accent color.
        #[arg(long)]
        accent: String,
        /// Background color.
        #[arg(long, default_value = "0 0% 100%")]
        background: String,
        /// Foreground color.
        #[arg(long, default_value = "222.2 84% 4.9%")]
        foreground: String,
    },

    /// Activate a theme.
    Use {
        /// Theme ID.
        id: String,
    },

    /// Delete a theme.
    Del {
        /// Theme ID.
        id: String,
    },
}

/// Storage subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum StorageCommand {
    /// List stored keys.
    Keys,

    /// Remove all stored data.
    Reset {
        /// Confirm the reset.
        #[arg(long)]
        force: bool,
    },
}

/// Main configuration from TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Storage configuration.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Session configuration.
    #[serde(default)]
    pub session: SessionConfig,
}

/// Storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Path to SQLite storage file.
    #[serde(default = "default_storage_path")]
    pub path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: default_storage_path(),
        }
    }
}

fn default_storage_path() -> PathBuf {
    PathBuf::from("data/bookshelf.db")
}

/// Session configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Artificial login delay in milliseconds.
    #[serde(default = "default_login_delay_ms")]
    pub login_delay_ms: u64,

    /// Avatar service URL; the email is appended.
    #[serde(default = "default_avatar_url")]
    pub avatar_url: String,

    /// Client identifier recorded with terms acceptances.
    #[serde(default = "default_client_name")]
    pub client_name: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            login_delay_ms: default_login_delay_ms(),
            avatar_url: default_avatar_url(),
            client_name: default_client_name(),
        }
    }
}

fn default_login_delay_ms() -> u64 {
    1000
}

fn default_avatar_url() -> String {
    "https://api.dicebear.com/7.x/avataaars/svg?seed=".to_string()
}

fn default_client_name() -> String {
    concat!("bookshelf-rs/", env!("CARGO_PKG_VERSION")).to_string()
}

impl SessionConfig {
    /// Login delay as a duration.
    pub fn login_delay(&self) -> Duration {
        Duration::from_millis(self.login_delay_ms)
    }
}

impl Config {
    /// Load configuration from file.
    pub fn load(path: &PathBuf) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            crate::error::AppError::Config(format!("Failed to read config file: {}", e))
        })?;

        toml::from_str(&content).map_err(|e| {
            crate::error::AppError::Config(format!("Failed to parse config file: {}", e))
        })
    }

    /// Find config file in default locations.
    pub fn find_config_file() -> Option<PathBuf> {
        let candidates = [
            PathBuf::from("config.toml"),
            PathBuf::from("bookshelf-rs.toml"),
            dirs::config_dir()
                .map(|p| p.join("bookshelf-rs").join("config.toml"))
                .unwrap_or_default(),
            PathBuf::from("/etc/bookshelf-rs/config.toml"),
        ];

        candidates.into_iter().find(|p| p.exists())
    }

    /// Generate default config file content.
    pub fn generate_default() -> String {
        r#"# bookshelf-rs configuration

[storage]
# path = "/var/lib/bookshelf-rs/bookshelf.db"
path = "data/bookshelf.db"

[session]
# Artificial delay before a login resolves, in milliseconds
login_delay_ms = 1000
# Avatar service; the login email is appended
avatar_url = "https://api.dicebear.com/7.x/avataaars/svg?seed="
# client_name = "bookshelf-rs"
"#
        .to_string()
    }
}
