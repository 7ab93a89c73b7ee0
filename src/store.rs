//! The library state store.
//!
//! `LibraryStore` owns every collection of the application, persists each
//! collection to local storage after it changes and queues a notification
//! for every user-facing outcome. Derived views are computed on demand.

use crate::auth::{self, Role, User};
use crate::config::SessionConfig;
use crate::db::{Storage, StorageKey, now_rfc3339};
use crate::error::Result;
use crate::library::moderation::{ANONYMOUS_ID, ANONYMOUS_NAME, UNBLOCK_REASON};
use crate::library::theme::{DEFAULT_THEME_ID, builtin_themes};
use crate::library::{
    Book, BookPatch, ModerationAction, ModerationLog, NewReview, ReadingStats, Review,
    TermsAcceptance, Theme, book, stats,
};
use crate::notify::{Level, Notification, Notifier};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::{BTreeMap, HashSet};

/// Maximum number of remembered search terms.
pub const SEARCH_HISTORY_LIMIT: usize = 10;

/// Every collection held by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct LibraryState {
    /// Logged-in user.
    pub user: Option<User>,
    /// Book catalog.
    pub books: Vec<Book>,
    /// Reviews, newest first.
    pub reviews: Vec<Review>,
    /// Favorite book ids, in insertion order.
    pub favorites: Vec<String>,
    /// Percent read per book id.
    pub reading_progress: BTreeMap<String, f64>,
    /// Recent search terms, newest first.
    pub search_history: Vec<String>,
    /// Available themes.
    pub themes: Vec<Theme>,
    /// Active theme id.
    pub current_theme: String,
    /// Terms acceptances, oldest first.
    pub terms_acceptances: Vec<TermsAcceptance>,
    /// Moderation audit trail, newest first.
    pub moderation_logs: Vec<ModerationLog>,
}

impl Default for LibraryState {
    fn default() -> Self {
        Self {
            user: None,
            books: book::seed_catalog(),
            reviews: Vec::new(),
            favorites: Vec::new(),
            reading_progress: BTreeMap::new(),
            search_history: Vec::new(),
            themes: builtin_themes(),
            current_theme: DEFAULT_THEME_ID.to_string(),
            terms_acceptances: Vec::new(),
            moderation_logs: Vec::new(),
        }
    }
}

/// Decode a JSON collection. Corrupt values are logged and treated as absent.
fn load_json<T: DeserializeOwned>(storage: &impl Storage, key: StorageKey) -> Result<Option<T>> {
    let Some(raw) = storage.get(key)? else {
        return Ok(None);
    };

    match serde_json::from_str(&raw) {
        Ok(value) => Ok(Some(value)),
        Err(e) => {
            tracing::warn!(key = %key, error = %e, "Ignoring corrupt stored value");
            Ok(None)
        }
    }
}

impl LibraryState {
    /// Load every collection from storage, defaulting the missing ones.
    pub fn load(storage: &impl Storage) -> Result<Self> {
        let defaults = Self::default();

        let mut state = Self {
            user: load_json::<Option<User>>(storage, StorageKey::User)?.flatten(),
            books: load_json(storage, StorageKey::Books)?.unwrap_or(defaults.books),
            reviews: load_json(storage, StorageKey::Reviews)?.unwrap_or_default(),
            favorites: load_json(storage, StorageKey::Favorites)?.unwrap_or_default(),
            reading_progress: load_json(storage, StorageKey::ReadingProgress)?.unwrap_or_default(),
            search_history: load_json(storage, StorageKey::SearchHistory)?.unwrap_or_default(),
            themes: load_json(storage, StorageKey::CustomThemes)?.unwrap_or(defaults.themes),
            current_theme: storage
                .get(StorageKey::CurrentTheme)?
                .filter(|id| !id.is_empty())
                .unwrap_or(defaults.current_theme),
            terms_acceptances: load_json(storage, StorageKey::TermsAcceptances)?
                .unwrap_or_default(),
            moderation_logs: load_json(storage, StorageKey::ModerationLogs)?.unwrap_or_default(),
        };

        if !state.themes.iter().any(|t| t.id == DEFAULT_THEME_ID)
            && let Some(default) = builtin_themes().into_iter().find(|t| t.id == DEFAULT_THEME_ID)
        {
            tracing::warn!("Stored themes lack the default theme, restoring it");
            state.themes.insert(0, default);
        }

        if !state.themes.iter().any(|t| t.id == state.current_theme) {
            tracing::warn!(theme = %state.current_theme, "Stored theme no longer exists, using default");
            state.current_theme = DEFAULT_THEME_ID.to_string();
        }

        Ok(state)
    }
}

fn encode<T: Serialize>(value: &T) -> Result<Option<String>> {
    Ok(Some(serde_json::to_string(value)?))
}

fn new_id(prefix: &str) -> String {
    format!("{}-{}", prefix, uuid::Uuid::new_v4())
}

/// Single-user application state with local persistence.
pub struct LibraryStore<S: Storage> {
    storage: S,
    session: SessionConfig,
    state: LibraryState,
    notifier: Notifier,
    online: bool,
}

impl<S: Storage> LibraryStore<S> {
    /// Open a store, loading persisted collections from `storage`.
    pub fn open(storage: S, session: SessionConfig) -> Result<Self> {
        let state = LibraryState::load(&storage)?;

        tracing::debug!(
            books = state.books.len(),
            reviews = state.reviews.len(),
            logged_in = state.user.is_some(),
            "Loaded library state"
        );

        Ok(Self::with_state(storage, session, state))
    }

    /// Build a store around an explicit initial state.
    pub fn with_state(storage: S, session: SessionConfig, state: LibraryState) -> Self {
        Self {
            storage,
            session,
            state,
            notifier: Notifier::default(),
            online: true,
        }
    }

    /// Current in-memory state.
    pub fn state(&self) -> &LibraryState {
        &self.state
    }

    /// Underlying storage backend.
    pub fn storage(&self) -> &S {
        &self.storage
    }

    // ========== PERSISTENCE ==========

    /// Serialized value for a key; `None` means the key should be removed.
    fn encode_key(&self, key: StorageKey) -> Result<Option<String>> {
        match key {
            StorageKey::User => match &self.state.user {
                Some(user) => encode(user),
                None => Ok(None),
            },
            StorageKey::Books => encode(&self.state.books),
            StorageKey::Reviews => encode(&self.state.reviews),
            StorageKey::Favorites => encode(&self.state.favorites),
            StorageKey::ReadingProgress => encode(&self.state.reading_progress),
            StorageKey::SearchHistory => encode(&self.state.search_history),
            StorageKey::CustomThemes => encode(&self.state.themes),
            StorageKey::CurrentTheme => Ok(Some(self.state.current_theme.clone())),
            StorageKey::TermsAcceptances => encode(&self.state.terms_acceptances),
            StorageKey::ModerationLogs => encode(&self.state.moderation_logs),
        }
    }

    fn try_persist(&self, key: StorageKey) -> Result<()> {
        match self.encode_key(key)? {
            Some(value) => self.storage.set(key, &value),
            None => self.storage.remove(key),
        }
    }

    /// Rewrite one collection. Failures are logged; in-memory state stays.
    fn persist(&self, key: StorageKey) {
        if let Err(e) = self.try_persist(key) {
            tracing::warn!(key = %key, error = %e, "Failed to persist collection");
        }
    }

    /// Write every collection to storage.
    pub fn persist_all(&self) -> Result<()> {
        for key in StorageKey::ALL {
            self.try_persist(key)?;
        }
        Ok(())
    }

    // ========== NOTIFICATIONS ==========

    fn notify(&mut self, level: Level, title: &str, description: impl Into<String>) {
        self.notifier.push(level, title, description);
    }

    /// Notifications queued since the last drain.
    pub fn notifications(&self) -> &[Notification] {
        self.notifier.pending()
    }

    /// Remove and return queued notifications.
    pub fn take_notifications(&mut self) -> Vec<Notification> {
        self.notifier.drain()
    }

    // ========== CONNECTIVITY ==========

    /// Whether the platform last reported being online.
    pub fn is_online(&self) -> bool {
        self.online
    }

    /// Record a connectivity change reported by the platform.
    pub fn set_online(&mut self, online: bool) {
        if self.online == online {
            return;
        }
        self.online = online;

        if online {
            self.notify(Level::Success, "Connection restored", "You are back online");
        } else {
            self.notify(Level::Warning, "Offline", "You are working in offline mode");
        }
    }

    // ========== SESSION ==========

    /// Logged-in user.
    pub fn user(&self) -> Option<&User> {
        self.state.user.as_ref()
    }

    /// Whether a user is logged in.
    pub fn is_authenticated(&self) -> bool {
        self.state.user.is_some()
    }

    fn role(&self) -> Option<Role> {
        self.state.user.as_ref().map(|u| u.role)
    }

    fn can_moderate(&self) -> bool {
        self.role().is_some_and(|r| r.can_moderate())
    }

    /// Start a session. Any non-empty email with a long enough password is
    /// accepted; the role is taken as given.
    pub async fn login(&mut self, email: &str, password: &str, role: Role) -> bool {
        let delay = self.session.login_delay();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        if !auth::credentials_valid(email, password) {
            tracing::debug!(email = %email, "Rejected login");
            self.notify(Level::Error, "Login failed", "Invalid credentials");
            return false;
        }

        let user = auth::session_user(email, role, &self.session.avatar_url);
        let welcome = format!("Welcome, {}! Role: {}", user.name, role);
        self.state.user = Some(user);
        self.persist(StorageKey::User);

        self.notify(Level::Success, "Signed in", welcome);
        true
    }

    /// End the session and forget the stored user.
    pub fn logout(&mut self) {
        self.state.user = None;
        self.persist(StorageKey::User);
        self.notify(Level::Info, "Signed out", "You have signed out");
    }

    /// Change the current user's role. Only admins may do this.
    pub fn update_user_role(&mut self, role: Role) -> bool {
        match self.state.user.as_mut() {
            Some(user) if user.role == Role::Admin => {
                user.role = role;
                self.persist(StorageKey::User);
                self.notify(Level::Success, "Role updated", format!("Your role is now: {}", role));
                true
            }
            _ => {
                self.notify(
                    Level::Error,
                    "Permission denied",
                    "Only administrators can change roles",
                );
                false
            }
        }
    }

    // ========== BOOK OPERATIONS ==========

    /// Full catalog, including blocked books.
    pub fn books(&self) -> &[Book] {
        &self.state.books
    }

    /// Look up a book by id.
    pub fn book(&self, id: &str) -> Option<&Book> {
        self.state.books.iter().find(|b| b.id == id)
    }

    /// Append a book to the catalog.
    pub fn add_book(&mut self, book: Book) {
        let description = format!("\"{}\" was added to your library", book.title);
        tracing::info!(id = %book.id, title = %book.title, "Adding book");

        self.state.books.push(book);
        self.persist(StorageKey::Books);
        self.notify(Level::Success, "Book added", description);
    }

    /// Merge `patch` into the book with `id`.
    pub fn update_book(&mut self, id: &str, patch: BookPatch) -> bool {
        let Some(book) = self.state.books.iter_mut().find(|b| b.id == id) else {
            self.notify(Level::Error, "Book not found", format!("No book with id {}", id));
            return false;
        };

        patch.apply(book);
        self.persist(StorageKey::Books);
        self.notify(Level::Success, "Book updated", "Changes saved");
        true
    }

    /// Remove a book from the catalog and from favorites.
    pub fn delete_book(&mut self, id: &str) -> Option<Book> {
        let removed = self
            .state
            .books
            .iter()
            .position(|b| b.id == id)
            .map(|idx| self.state.books.remove(idx));
        self.state.books.retain(|b| b.id != id);

        let before = self.state.favorites.len();
        self.state.favorites.retain(|fav| fav != id);

        self.persist(StorageKey::Books);
        if self.state.favorites.len() != before {
            self.persist(StorageKey::Favorites);
        }

        let description = match &removed {
            Some(book) => format!("\"{}\" was removed from your library", book.title),
            None => "Book removed".to_string(),
        };
        self.notify(Level::Success, "Book deleted", description);
        removed
    }

    /// Add books whose ids are not in the catalog yet. Returns how many were
    /// added.
    pub fn import_books(&mut self, books: Vec<Book>) -> usize {
        let mut known: HashSet<String> = self.state.books.iter().map(|b| b.id.clone()).collect();
        let mut added = 0;

        // Repeated ids inside one import keep the first occurrence.
        for book in books {
            if known.insert(book.id.clone()) {
                self.state.books.push(book);
                added += 1;
            } else {
                tracing::debug!(id = %book.id, "Skipping import of existing book");
            }
        }

        if added > 0 {
            self.persist(StorageKey::Books);
        }
        self.notify(
            Level::Success,
            "Books imported",
            format!("Imported {} new books", added),
        );
        added
    }

    /// Books the current viewer may see: blocked books are hidden unless the
    /// viewer is a reviewer or admin.
    pub fn visible_books(&self) -> Vec<&Book> {
        let privileged = self.can_moderate();
        self.state
            .books
            .iter()
            .filter(|b| privileged || !b.is_blocked)
            .collect()
    }

    // ========== MODERATION ==========

    fn moderator(&self) -> (String, String) {
        match &self.state.user {
            Some(user) => (user.id.clone(), user.name.clone()),
            None => (ANONYMOUS_ID.to_string(), ANONYMOUS_NAME.to_string()),
        }
    }

    fn append_log(&mut self, book_id: &str, action: ModerationAction, reason: &str) {
        let (moderator_id, moderator_name) = self.moderator();
        let log = ModerationLog {
            id: new_id("log"),
            book_id: book_id.to_string(),
            moderator_id,
            moderator_name,
            action,
            reason: reason.to_string(),
            timestamp: now_rfc3339(),
        };

        tracing::info!(book = %book_id, action = %action, moderator = %log.moderator_id, "Moderation action");
        self.state.moderation_logs.insert(0, log);
        self.persist(StorageKey::ModerationLogs);
    }

    /// Reject gated actions for non-moderators. Book ids are not checked;
    /// the log entry is written either way.
    fn check_moderation(&mut self, denied: &str) -> bool {
        if !self.can_moderate() {
            self.notify(Level::Error, "Permission denied", denied);
            return false;
        }
        true
    }

    fn set_blocked(&mut self, book_id: &str, reason: Option<&str>) {
        if let Some(book) = self.state.books.iter_mut().find(|b| b.id == book_id) {
            book.is_blocked = reason.is_some();
            book.block_reason = reason.map(str::to_string);
        }
        self.persist(StorageKey::Books);
    }

    /// Hide a book from regular users.
    pub fn block_book(&mut self, book_id: &str, reason: &str) -> bool {
        if !self.check_moderation("Only reviewers can block books") {
            return false;
        }

        self.set_blocked(book_id, Some(reason));
        self.append_log(book_id, ModerationAction::Block, reason);
        self.notify(
            Level::Success,
            "Book blocked",
            "The book is no longer visible to regular users",
        );
        true
    }

    /// Make a blocked book visible again.
    pub fn unblock_book(&mut self, book_id: &str) -> bool {
        if !self.check_moderation("Only reviewers can unblock books") {
            return false;
        }

        self.set_blocked(book_id, None);
        self.append_log(book_id, ModerationAction::Unblock, UNBLOCK_REASON);
        self.notify(Level::Success, "Book unblocked", "The book is visible to everyone");
        true
    }

    /// Report a book. Open to everyone, including anonymous visitors; the
    /// book itself is not changed.
    pub fn flag_book(&mut self, book_id: &str, reason: &str) -> bool {
        self.append_log(book_id, ModerationAction::Flag, reason);
        self.notify(
            Level::Success,
            "Book reported",
            "A reviewer will evaluate the reported content",
        );
        true
    }

    /// Record that a moderator reviewed and approved a book.
    pub fn approve_book(&mut self, book_id: &str, reason: &str) -> bool {
        if !self.check_moderation("Only reviewers can approve books") {
            return false;
        }

        self.append_log(book_id, ModerationAction::Approve, reason);
        self.notify(Level::Success, "Book approved", "The content was marked as approved");
        true
    }

    /// Moderation log, newest first, optionally for a single book.
    pub fn moderation_logs(&self, book_id: Option<&str>) -> Vec<&ModerationLog> {
        self.state
            .moderation_logs
            .iter()
            .filter(|log| book_id.is_none_or(|id| log.book_id == id))
            .collect()
    }

    /// All blocked books.
    pub fn blocked_books(&self) -> Vec<&Book> {
        self.state.books.iter().filter(|b| b.is_blocked).collect()
    }

    // ========== TERMS ACCEPTANCE ==========

    /// Record that the current user accepted a book's terms. Every call
    /// appends a new record.
    pub fn accept_terms(&mut self, book_id: &str) -> TermsAcceptance {
        let acceptance = TermsAcceptance {
            id: new_id("terms"),
            user_id: self
                .state
                .user
                .as_ref()
                .map_or_else(|| ANONYMOUS_ID.to_string(), |u| u.id.clone()),
            book_id: book_id.to_string(),
            accepted_at: now_rfc3339(),
            ip_address: None,
            user_agent: Some(self.session.client_name.clone()),
        };

        tracing::info!(book = %book_id, user = %acceptance.user_id, "Terms accepted");
        self.state.terms_acceptances.push(acceptance.clone());
        self.persist(StorageKey::TermsAcceptances);
        acceptance
    }

    /// First acceptance of the current user for a book.
    pub fn terms_acceptance(&self, book_id: &str) -> Option<&TermsAcceptance> {
        let user_id = &self.state.user.as_ref()?.id;
        self.state
            .terms_acceptances
            .iter()
            .find(|t| t.book_id == book_id && &t.user_id == user_id)
    }

    /// All terms acceptances.
    pub fn terms_acceptances(&self) -> &[TermsAcceptance] {
        &self.state.terms_acceptances
    }

    // ========== REVIEWS ==========

    /// All reviews, newest first.
    pub fn reviews(&self) -> &[Review] {
        &self.state.reviews
    }

    /// Publish a review; it goes to the front of the list.
    pub fn add_review(&mut self, review: NewReview) -> Review {
        let review = review.publish(new_id("review"), now_rfc3339());
        tracing::info!(id = %review.id, book = %review.book_id, "Review published");

        self.state.reviews.insert(0, review.clone());
        self.persist(StorageKey::Reviews);
        self.notify(Level::Success, "Review published", "Your review was added");
        review
    }

    /// Reviews of one book, newest first.
    pub fn book_reviews(&self, book_id: &str) -> Vec<&Review> {
        self.state
            .reviews
            .iter()
            .filter(|r| r.book_id == book_id)
            .collect()
    }

    /// Add one "helpful" vote to a review.
    pub fn mark_review_helpful(&mut self, review_id: &str) -> bool {
        let Some(review) = self.state.reviews.iter_mut().find(|r| r.id == review_id) else {
            return false;
        };

        review.helpful += 1;
        self.persist(StorageKey::Reviews);
        self.notify(
            Level::Success,
            "Thanks for your feedback",
            "You marked this review as helpful",
        );
        true
    }

    // ========== FAVORITES ==========

    /// Favorite book ids.
    pub fn favorites(&self) -> &[String] {
        &self.state.favorites
    }

    /// Whether a book is a favorite.
    pub fn is_favorite(&self, book_id: &str) -> bool {
        self.state.favorites.iter().any(|id| id == book_id)
    }

    fn title_or(&self, book_id: &str, fallback: &str, describe: impl Fn(&str) -> String) -> String {
        self.book(book_id)
            .map(|b| describe(&b.title))
            .unwrap_or_else(|| fallback.to_string())
    }

    /// Add a book to favorites. Adding twice has no further effect.
    pub fn add_to_favorites(&mut self, book_id: &str) {
        if !self.is_favorite(book_id) {
            self.state.favorites.push(book_id.to_string());
            self.persist(StorageKey::Favorites);
        }

        let description = self.title_or(book_id, "Book added to favorites", |t| {
            format!("\"{}\" is in your favorites", t)
        });
        self.notify(Level::Success, "Added to favorites", description);
    }

    /// Remove a book from favorites.
    pub fn remove_from_favorites(&mut self, book_id: &str) {
        let before = self.state.favorites.len();
        self.state.favorites.retain(|id| id != book_id);
        if self.state.favorites.len() != before {
            self.persist(StorageKey::Favorites);
        }

        let description = self.title_or(book_id, "Book removed from favorites", |t| {
            format!("\"{}\" was removed from favorites", t)
        });
        self.notify(Level::Info, "Removed from favorites", description);
    }

    // ========== READING PROGRESS ==========

    /// Percent read for a book.
    pub fn reading_progress(&self, book_id: &str) -> Option<f64> {
        self.state.reading_progress.get(book_id).copied()
    }

    /// Record progress, clamped to 0-100. Returns the stored value.
    pub fn update_reading_progress(&mut self, book_id: &str, percent: f64) -> f64 {
        let value = if percent.is_nan() {
            0.0
        } else {
            percent.clamp(0.0, 100.0)
        };

        self.state
            .reading_progress
            .insert(book_id.to_string(), value);
        self.persist(StorageKey::ReadingProgress);

        if value == 100.0 {
            self.notify(
                Level::Success,
                "Book completed!",
                "Congratulations on finishing this book",
            );
        }
        value
    }

    // ========== SEARCH HISTORY ==========

    /// Recent search terms, newest first.
    pub fn search_history(&self) -> &[String] {
        &self.state.search_history
    }

    /// Move `term` to the front of the history, keeping at most
    /// `SEARCH_HISTORY_LIMIT` entries.
    pub fn add_to_search_history(&mut self, term: &str) {
        let history = &mut self.state.search_history;
        history.retain(|t| t != term);
        history.insert(0, term.to_string());
        history.truncate(SEARCH_HISTORY_LIMIT);
        self.persist(StorageKey::SearchHistory);
    }

    /// Forget all search terms.
    pub fn clear_search_history(&mut self) {
        self.state.search_history.clear();
        self.persist(StorageKey::SearchHistory);
        self.notify(Level::Info, "History cleared", "Search history was cleared");
    }

    // ========== READING STATS ==========

    /// Statistics over the visible books, relative to today.
    pub fn reading_stats(&self) -> ReadingStats {
        let today = chrono::Local::now().date_naive();
        stats::compute(&self.visible_books(), today)
    }

    // ========== THEMES ==========

    /// Available themes.
    pub fn themes(&self) -> &[Theme] {
        &self.state.themes
    }

    /// Active theme id.
    pub fn current_theme_id(&self) -> &str {
        &self.state.current_theme
    }

    /// Active theme.
    pub fn current_theme(&self) -> Option<&Theme> {
        self.theme(&self.state.current_theme)
    }

    fn theme(&self, id: &str) -> Option<&Theme> {
        self.state.themes.iter().find(|t| t.id == id)
    }

    /// Add a theme. Ids must be unique.
    pub fn add_custom_theme(&mut self, theme: Theme) -> bool {
        if self.theme(&theme.id).is_some() {
            self.notify(
                Level::Error,
                "Theme exists",
                format!("A theme with id \"{}\" already exists", theme.id),
            );
            return false;
        }

        let description = format!("Theme \"{}\" was created", theme.name);
        self.state.themes.push(theme);
        self.persist(StorageKey::CustomThemes);
        self.notify(Level::Success, "Theme created", description);
        true
    }

    /// Switch the active theme. Unknown ids are rejected.
    pub fn set_current_theme(&mut self, id: &str) -> bool {
        // Unknown ids would leave `current_theme()` empty.
        let Some(name) = self.theme(id).map(|t| t.name.clone()) else {
            self.notify(Level::Error, "Theme not found", format!("No theme with id \"{}\"", id));
            return false;
        };

        self.state.current_theme = id.to_string();
        self.persist(StorageKey::CurrentTheme);
        self.notify(Level::Success, "Theme applied", format!("Theme \"{}\" activated", name));
        true
    }

    /// Delete a theme. The default theme is protected; deleting the active
    /// theme switches back to the default.
    pub fn delete_custom_theme(&mut self, id: &str) -> bool {
        if id == DEFAULT_THEME_ID {
            self.notify(
                Level::Error,
                "Cannot delete",
                "The default theme cannot be deleted",
            );
            return false;
        }

        let Some(idx) = self.state.themes.iter().position(|t| t.id == id) else {
            self.notify(Level::Error, "Theme not found", format!("No theme with id \"{}\"", id));
            return false;
        };

        let theme = self.state.themes.remove(idx);
        self.persist(StorageKey::CustomThemes);

        if self.state.current_theme == id {
            self.state.current_theme = DEFAULT_THEME_ID.to_string();
            self.persist(StorageKey::CurrentTheme);
        }

        self.notify(
            Level::Success,
            "Theme deleted",
            format!("Theme \"{}\" deleted", theme.name),
        );
        true
    }
}
