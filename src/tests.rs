use crate::auth::Role;
use crate::config::{Cli, Command, Config, SessionConfig};
use clap::Parser;
use crate::db::{Database, Storage, StorageKey};
use crate::library::moderation::UNBLOCK_REASON;
use crate::library::{Book, BookPatch, ModerationAction, NewReview, Theme, ThemeColors};
use crate::notify::Level;
use crate::store::{LibraryState, LibraryStore};

fn session() -> SessionConfig {
    SessionConfig {
        login_delay_ms: 0,
        ..SessionConfig::default()
    }
}

fn test_store() -> LibraryStore<Database> {
    LibraryStore::open(Database::open_memory().unwrap(), session()).unwrap()
}

fn login_as(store: &mut LibraryStore<Database>, role: Role) {
    assert!(tokio_test::block_on(store.login("reader@example.com", "secret1", role)));
    store.take_notifications();
}

fn book(id: &str, title: &str) -> Book {
    let mut book = Book::new(id, title, "1");
    book.author = "Test Author".to_string();
    book.genre = "Essay".to_string();
    book.pages = 100;
    book.rating = 4.0;
    book
}

fn theme(id: &str, name: &str) -> Theme {
    Theme {
        id: id.to_string(),
        name: name.to_string(),
        colors: ThemeColors {
            primary: "0 0% 0%".to_string(),
            secondary: "0 0% 10%".to_string(),
            accent: "0 0% 20%".to_string(),
            background: "0 0% 100%".to_string(),
            foreground: "0 0% 0%".to_string(),
        },
    }
}

fn stored(store: &LibraryStore<Database>, key: StorageKey) -> Option<String> {
    store.storage().get(key).unwrap()
}

fn last_level(store: &LibraryStore<Database>) -> Option<Level> {
    store.notifications().last().map(|n| n.level)
}

// ========== SESSION ==========

#[tokio::test]
async fn login_accepts_six_char_password() {
    let mut store = test_store();

    assert!(store.login("a@b.com", "123456", Role::default()).await);

    let user = store.user().unwrap();
    assert_eq!(user.id, "1");
    assert_eq!(user.name, "a");
    assert_eq!(user.email, "a@b.com");
    assert_eq!(user.role, Role::User);
    assert!(user.avatar.as_deref().unwrap().ends_with("a%40b.com"));
    assert!(store.is_authenticated());
    assert_eq!(last_level(&store), Some(Level::Success));

    let persisted = stored(&store, StorageKey::User).unwrap();
    assert!(persisted.contains("\"role\":\"user\""));
}

#[tokio::test]
async fn login_rejects_short_password() {
    let mut store = test_store();

    assert!(!store.login("a@b.com", "123", Role::Admin).await);
    assert!(!store.is_authenticated());
    assert_eq!(last_level(&store), Some(Level::Error));
    assert!(stored(&store, StorageKey::User).is_none());
}

#[tokio::test]
async fn login_rejects_empty_email() {
    let mut store = test_store();
    assert!(!store.login("", "123456", Role::User).await);
}

#[test]
fn logout_removes_persisted_user() {
    let mut store = test_store();
    login_as(&mut store, Role::Reviewer);
    assert!(stored(&store, StorageKey::User).is_some());

    store.logout();
    assert!(store.user().is_none());
    assert!(stored(&store, StorageKey::User).is_none());
}

#[test]
fn only_admin_changes_role() {
    let mut store = test_store();
    login_as(&mut store, Role::User);
    assert!(!store.update_user_role(Role::Admin));
    assert_eq!(store.user().unwrap().role, Role::User);

    login_as(&mut store, Role::Admin);
    assert!(store.update_user_role(Role::Reviewer));
    assert_eq!(store.user().unwrap().role, Role::Reviewer);
}

// ========== BOOKS ==========

#[test]
fn fresh_store_uses_seed_catalog() {
    let store = test_store();
    assert_eq!(store.books().len(), 6);
    assert_eq!(store.current_theme_id(), "default");
    assert_eq!(store.themes().len(), 4);
}

#[test]
fn add_then_get_book() {
    let mut store = test_store();
    store.add_book(book("b-1", "Essays"));

    let found = store.book("b-1").unwrap();
    assert_eq!(found.title, "Essays");
    assert_eq!(store.books().len(), 7);
    assert!(stored(&store, StorageKey::Books).unwrap().contains("\"b-1\""));
}

#[test]
fn unknown_book_lookup_is_none() {
    let store = test_store();
    assert!(store.book("missing").is_none());
}

#[test]
fn delete_book_removes_favorite() {
    let mut store = test_store();
    store.add_book(book("b-1", "Essays"));
    store.add_to_favorites("b-1");
    store.add_to_favorites("2");

    let removed = store.delete_book("b-1").unwrap();
    assert_eq!(removed.id, "b-1");
    assert!(store.book("b-1").is_none());
    assert!(!store.is_favorite("b-1"));
    assert!(store.is_favorite("2"));
    assert_eq!(stored(&store, StorageKey::Favorites).unwrap(), "[\"2\"]");
}

#[test]
fn update_book_applies_patch() {
    let mut store = test_store();
    let patch = BookPatch {
        rating: Some(3.5),
        genre: Some("Classic".to_string()),
        ..BookPatch::default()
    };

    assert!(store.update_book("4", patch));
    let updated = store.book("4").unwrap();
    assert_eq!(updated.rating, 3.5);
    assert_eq!(updated.genre, "Classic");
    assert_eq!(updated.title, "Pride and Prejudice");

    assert!(!store.update_book("missing", BookPatch::default()));
}

#[test]
fn import_skips_existing_ids() {
    let mut store = test_store();
    let existing = book("1", "Duplicate of seed");
    let new = book("b-7", "New");

    assert_eq!(store.import_books(vec![existing, new]), 1);
    assert_eq!(store.books().len(), 7);
    assert_eq!(store.book("1").unwrap().title, "One Hundred Years of Solitude");
    assert!(
        store
            .notifications()
            .last()
            .unwrap()
            .description
            .contains("1 new")
    );
}

#[test]
fn import_skips_duplicates_within_batch() {
    let mut store = test_store();
    let added = store.import_books(vec![book("x", "First"), book("x", "Second")]);
    assert_eq!(added, 1);
    assert_eq!(store.book("x").unwrap().title, "First");
}

// ========== MODERATION ==========

#[test]
fn block_by_user_is_noop() {
    let mut store = test_store();
    login_as(&mut store, Role::User);

    assert!(!store.block_book("1", "spam"));
    assert!(!store.book("1").unwrap().is_blocked);
    assert!(store.moderation_logs(None).is_empty());
    assert_eq!(last_level(&store), Some(Level::Error));
}

#[test]
fn block_without_session_is_noop() {
    let mut store = test_store();
    assert!(!store.block_book("1", "spam"));
    assert!(store.blocked_books().is_empty());
}

#[test]
fn block_by_reviewer() {
    let mut store = test_store();
    login_as(&mut store, Role::Reviewer);

    assert!(store.block_book("1", "offensive"));

    let blocked = store.book("1").unwrap();
    assert!(blocked.is_blocked);
    assert_eq!(blocked.block_reason.as_deref(), Some("offensive"));

    let logs = store.moderation_logs(Some("1"));
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].action, ModerationAction::Block);
    assert_eq!(logs[0].moderator_id, "1");
    assert_eq!(logs[0].reason, "offensive");
    assert!(
        stored(&store, StorageKey::ModerationLogs)
            .unwrap()
            .contains("\"action\":\"block\"")
    );
}

#[test]
fn unblock_clears_reason_and_logs_newest_first() {
    let mut store = test_store();
    login_as(&mut store, Role::Admin);

    store.block_book("2", "check");
    assert!(store.unblock_book("2"));

    let book = store.book("2").unwrap();
    assert!(!book.is_blocked);
    assert!(book.block_reason.is_none());

    let logs = store.moderation_logs(None);
    assert_eq!(logs[0].action, ModerationAction::Unblock);
    assert_eq!(logs[0].reason, UNBLOCK_REASON);
    assert_eq!(logs[1].action, ModerationAction::Block);
}

#[test]
fn anonymous_can_flag() {
    let mut store = test_store();

    assert!(store.flag_book("3", "wrong cover"));

    let logs = store.moderation_logs(Some("3"));
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].action, ModerationAction::Flag);
    assert_eq!(logs[0].moderator_id, "anonymous");
    assert!(!store.book("3").unwrap().is_blocked);
}

#[test]
fn flag_unknown_book_still_logs() {
    let mut store = test_store();

    assert!(store.flag_book("not-in-catalog", "spam link"));

    let logs = store.moderation_logs(None);
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].book_id, "not-in-catalog");
    assert_eq!(logs[0].action, ModerationAction::Flag);
    assert_eq!(last_level(&store), Some(Level::Success));
}

#[test]
fn block_unknown_book_logs_without_touching_catalog() {
    let mut store = test_store();
    login_as(&mut store, Role::Admin);

    assert!(store.block_book("ghost", "gone"));
    assert!(store.unblock_book("ghost"));

    assert!(store.blocked_books().is_empty());
    assert_eq!(store.books().len(), 6);
    let logs = store.moderation_logs(Some("ghost"));
    assert_eq!(logs.len(), 2);
    assert_eq!(logs[0].action, ModerationAction::Unblock);
}

#[test]
fn unblock_through_update_clears_reason() {
    let mut store = test_store();
    login_as(&mut store, Role::Reviewer);
    store.block_book("1", "bad");

    let patch = BookPatch {
        is_blocked: Some(false),
        ..BookPatch::default()
    };
    assert!(store.update_book("1", patch));

    let book = store.book("1").unwrap();
    assert!(!book.is_blocked);
    assert!(book.block_reason.is_none());
}

#[test]
fn approve_requires_moderator() {
    let mut store = test_store();
    login_as(&mut store, Role::User);
    assert!(!store.approve_book("1", "fine"));

    login_as(&mut store, Role::Reviewer);
    assert!(store.approve_book("1", "fine"));
    assert_eq!(store.moderation_logs(None)[0].action, ModerationAction::Approve);
}

#[test]
fn moderation_logs_filter_by_book() {
    let mut store = test_store();
    store.flag_book("1", "a");
    store.flag_book("2", "b");
    store.flag_book("1", "c");

    assert_eq!(store.moderation_logs(None).len(), 3);
    let for_one = store.moderation_logs(Some("1"));
    assert_eq!(for_one.len(), 2);
    assert_eq!(for_one[0].reason, "c");
    assert!(store.moderation_logs(Some("6")).is_empty());
}

#[test]
fn visible_books_hide_blocked_for_users() {
    let mut store = test_store();
    login_as(&mut store, Role::Reviewer);
    store.block_book("5", "review pending");

    assert_eq!(store.visible_books().len(), 6);
    assert_eq!(store.blocked_books().len(), 1);

    login_as(&mut store, Role::User);
    let visible = store.visible_books();
    assert_eq!(visible.len(), 5);
    assert!(visible.iter().all(|b| b.id != "5"));

    store.logout();
    assert_eq!(store.visible_books().len(), 5);
}

// ========== TERMS ==========

#[test]
fn terms_acceptance_is_append_only() {
    let mut store = test_store();
    login_as(&mut store, Role::User);

    let first = store.accept_terms("1");
    let second = store.accept_terms("1");
    assert_ne!(first.id, second.id);
    assert_eq!(store.terms_acceptances().len(), 2);
    assert_eq!(store.terms_acceptance("1").unwrap().id, first.id);
    assert!(store.terms_acceptance("2").is_none());
    assert!(first.user_agent.is_some());
}

#[test]
fn anonymous_terms_are_not_found_by_lookup() {
    let mut store = test_store();
    let acceptance = store.accept_terms("1");
    assert_eq!(acceptance.user_id, "anonymous");
    assert!(store.terms_acceptance("1").is_none());
}

// ========== REVIEWS ==========

fn new_review(book_id: &str, text: &str) -> NewReview {
    NewReview {
        book_id: book_id.to_string(),
        user_id: "1".to_string(),
        user_name: "reader".to_string(),
        user_avatar: None,
        rating: 5.0,
        text: text.to_string(),
    }
}

#[test]
fn add_review_prepends() {
    let mut store = test_store();
    let first = store.add_review(new_review("1", "great"));
    let second = store.add_review(new_review("2", "fine"));

    assert_eq!(first.helpful, 0);
    assert!(!first.date.is_empty());
    assert_eq!(store.reviews()[0].id, second.id);
    assert_eq!(store.book_reviews("1").len(), 1);
    assert!(store.book_reviews("3").is_empty());
}

#[test]
fn helpful_increments_known_review() {
    let mut store = test_store();
    let review = store.add_review(new_review("1", "great"));

    assert!(store.mark_review_helpful(&review.id));
    assert!(store.mark_review_helpful(&review.id));
    assert_eq!(store.reviews()[0].helpful, 2);

    assert!(!store.mark_review_helpful("missing"));
    assert_eq!(store.reviews()[0].helpful, 2);
}

// ========== FAVORITES ==========

#[test]
fn favorites_are_idempotent() {
    let mut store = test_store();
    store.add_to_favorites("1");
    store.add_to_favorites("1");
    assert_eq!(store.favorites(), ["1".to_string()]);
    assert!(store.is_favorite("1"));

    store.remove_from_favorites("1");
    store.remove_from_favorites("1");
    assert!(store.favorites().is_empty());
    assert!(!store.is_favorite("1"));
}

// ========== READING PROGRESS ==========

#[test]
fn progress_clamps_high_and_completes() {
    let mut store = test_store();

    assert_eq!(store.update_reading_progress("1", 150.0), 100.0);
    assert_eq!(store.reading_progress("1"), Some(100.0));

    let last = store.notifications().last().unwrap();
    assert_eq!(last.title, "Book completed!");
}

#[test]
fn progress_clamps_low() {
    let mut store = test_store();

    assert_eq!(store.update_reading_progress("1", -10.0), 0.0);
    assert_eq!(store.reading_progress("1"), Some(0.0));
    assert!(store.notifications().is_empty());
}

#[test]
fn partial_progress_is_quiet() {
    let mut store = test_store();
    store.update_reading_progress("2", 42.5);
    assert_eq!(store.reading_progress("2"), Some(42.5));
    assert!(store.notifications().is_empty());
    assert_eq!(
        stored(&store, StorageKey::ReadingProgress).unwrap(),
        "{\"2\":42.5}"
    );
}

// ========== SEARCH HISTORY ==========

#[test]
fn search_history_keeps_ten_most_recent() {
    let mut store = test_store();
    for i in 0..11 {
        store.add_to_search_history(&format!("term {}", i));
    }

    let history = store.search_history();
    assert_eq!(history.len(), 10);
    assert_eq!(history[0], "term 10");
    assert_eq!(history[9], "term 1");
    assert!(!history.iter().any(|t| t == "term 0"));
}

#[test]
fn search_history_moves_existing_to_front() {
    let mut store = test_store();
    store.add_to_search_history("tolkien");
    store.add_to_search_history("asimov");
    store.add_to_search_history("tolkien");

    assert_eq!(store.search_history(), ["tolkien", "asimov"]);

    store.clear_search_history();
    assert!(store.search_history().is_empty());
    assert_eq!(stored(&store, StorageKey::SearchHistory).unwrap(), "[]");
}

// ========== THEMES ==========

#[test]
fn default_theme_cannot_be_deleted() {
    let mut store = test_store();
    assert!(!store.delete_custom_theme("default"));
    assert_eq!(store.themes().len(), 4);
    assert_eq!(last_level(&store), Some(Level::Error));
}

#[test]
fn deleting_active_theme_resets_to_default() {
    let mut store = test_store();
    assert!(store.set_current_theme("ocean"));
    assert_eq!(stored(&store, StorageKey::CurrentTheme).as_deref(), Some("ocean"));

    assert!(store.delete_custom_theme("ocean"));
    assert_eq!(store.current_theme_id(), "default");
    assert_eq!(store.current_theme().unwrap().id, "default");
    assert_eq!(stored(&store, StorageKey::CurrentTheme).as_deref(), Some("default"));
}

#[test]
fn deleting_inactive_theme_keeps_current() {
    let mut store = test_store();
    store.set_current_theme("forest");
    assert!(store.delete_custom_theme("sunset"));
    assert_eq!(store.current_theme_id(), "forest");
}

#[test]
fn custom_theme_lifecycle() {
    let mut store = test_store();
    assert!(store.add_custom_theme(theme("night", "Night")));
    assert!(!store.add_custom_theme(theme("night", "Night again")));
    assert!(store.set_current_theme("night"));
    assert_eq!(store.current_theme().unwrap().name, "Night");

    assert!(!store.set_current_theme("missing"));
    assert_eq!(store.current_theme_id(), "night");
}

// ========== STATS ==========

#[test]
fn stats_on_empty_visible_set() {
    let state = LibraryState {
        books: Vec::new(),
        ..LibraryState::default()
    };
    let store = LibraryStore::with_state(Database::open_memory().unwrap(), session(), state);

    let stats = store.reading_stats();
    assert_eq!(stats.total_books, 0);
    assert_eq!(stats.average_rating, 0.0);
    assert_eq!(stats.favorite_genre, "N/A");
}

#[test]
fn stats_follow_visibility() {
    let mut store = test_store();
    login_as(&mut store, Role::Reviewer);
    store.block_book("2", "hidden");
    store.block_book("6", "hidden");
    assert_eq!(store.reading_stats().total_books, 6);

    login_as(&mut store, Role::User);
    let stats = store.reading_stats();
    assert_eq!(stats.total_books, 4);
    assert_eq!(stats.favorite_genre, "Science Fiction");
}

// ========== CONNECTIVITY ==========

#[test]
fn online_transitions_notify_once() {
    let mut store = test_store();
    assert!(store.is_online());

    store.set_online(true);
    assert!(store.notifications().is_empty());

    store.set_online(false);
    store.set_online(false);
    assert!(!store.is_online());
    assert_eq!(store.notifications().len(), 1);
    assert_eq!(last_level(&store), Some(Level::Warning));

    store.set_online(true);
    assert_eq!(last_level(&store), Some(Level::Success));
}

// ========== PERSISTENCE ==========

#[test]
fn state_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("library.db");

    {
        let mut store = LibraryStore::open(Database::open(&path).unwrap(), session()).unwrap();
        login_as(&mut store, Role::Reviewer);
        store.add_book(book("b-1", "Essays"));
        store.block_book("1", "check");
        store.add_to_favorites("b-1");
        store.update_reading_progress("b-1", 30.0);
        store.add_to_search_history("essays");
        store.add_custom_theme(theme("night", "Night"));
        store.set_current_theme("night");
        store.accept_terms("b-1");
    }

    let store = LibraryStore::open(Database::open(&path).unwrap(), session()).unwrap();
    assert_eq!(store.user().unwrap().role, Role::Reviewer);
    assert_eq!(store.books().len(), 7);
    assert!(store.book("1").unwrap().is_blocked);
    assert_eq!(store.favorites(), ["b-1".to_string()]);
    assert_eq!(store.reading_progress("b-1"), Some(30.0));
    assert_eq!(store.search_history(), ["essays"]);
    assert_eq!(store.current_theme_id(), "night");
    assert_eq!(store.moderation_logs(None).len(), 1);
    assert!(store.terms_acceptance("b-1").is_some());
}

#[test]
fn corrupt_collection_falls_back_to_default() {
    let db = Database::open_memory().unwrap();
    db.set(StorageKey::Books, "{not json").unwrap();
    db.set(StorageKey::Favorites, "[\"3\"]").unwrap();

    let store = LibraryStore::open(db, session()).unwrap();
    assert_eq!(store.books().len(), 6);
    assert_eq!(store.favorites(), ["3".to_string()]);
}

#[test]
fn dangling_current_theme_resets() {
    let db = Database::open_memory().unwrap();
    db.set(StorageKey::CurrentTheme, "vanished").unwrap();

    let store = LibraryStore::open(db, session()).unwrap();
    assert_eq!(store.current_theme_id(), "default");
}

#[test]
fn missing_default_theme_is_restored() {
    let db = Database::open_memory().unwrap();
    let stored_themes = serde_json::to_string(&vec![theme("night", "Night")]).unwrap();
    db.set(StorageKey::CustomThemes, &stored_themes).unwrap();
    db.set(StorageKey::CurrentTheme, "vanished").unwrap();

    let store = LibraryStore::open(db, session()).unwrap();
    assert_eq!(store.current_theme_id(), "default");
    assert_eq!(store.current_theme().unwrap().id, "default");
    assert_eq!(store.themes().len(), 2);
    assert_eq!(store.themes()[1].id, "night");
}

#[test]
fn stored_custom_theme_survives_without_default() {
    let db = Database::open_memory().unwrap();
    let stored_themes = serde_json::to_string(&vec![theme("night", "Night")]).unwrap();
    db.set(StorageKey::CustomThemes, &stored_themes).unwrap();
    db.set(StorageKey::CurrentTheme, "night").unwrap();

    let store = LibraryStore::open(db, session()).unwrap();
    assert_eq!(store.current_theme_id(), "night");
    assert!(store.themes().iter().any(|t| t.id == "default"));
}

#[test]
fn null_user_record_loads_as_signed_out() {
    let db = Database::open_memory().unwrap();
    db.set(StorageKey::User, "null").unwrap();

    let store = LibraryStore::open(db, session()).unwrap();
    assert!(!store.is_authenticated());
}

#[test]
fn persist_all_writes_every_key_but_user() {
    let db = Database::open_memory().unwrap();
    let store = LibraryStore::open(db.clone(), session()).unwrap();
    store.persist_all().unwrap();

    let keys: Vec<String> = db.list_keys().unwrap().into_iter().map(|(k, _)| k).collect();
    assert_eq!(keys.len(), 9);
    assert!(!keys.iter().any(|k| k == "user"));
    assert!(keys.iter().any(|k| k == "readingProgress"));
}

// ========== CONFIG ==========

#[test]
fn config_parse_toml() {
    let toml = r#"
[storage]
path = "/tmp/shelf.db"

[session]
login_delay_ms = 250
"#;
    let config: Config = toml::from_str(toml).unwrap();
    assert_eq!(config.storage.path.to_str(), Some("/tmp/shelf.db"));
    assert_eq!(config.session.login_delay_ms, 250);
    assert!(config.session.avatar_url.starts_with("https://"));
}

#[test]
fn config_default_values() {
    let config = Config::default();
    assert_eq!(config.storage.path.to_str(), Some("data/bookshelf.db"));
    assert_eq!(config.session.login_delay().as_millis(), 1000);
}

#[test]
fn generated_default_config_parses() {
    let config: Config = toml::from_str(&Config::generate_default()).unwrap();
    assert_eq!(config.session.login_delay_ms, 1000);
}

#[test]
fn offline_flag_is_global() {
    let cli = Cli::try_parse_from(["bookshelf-rs", "stats", "--offline"]).unwrap();
    assert!(cli.offline);
    assert!(matches!(cli.command, Command::Stats));

    let cli = Cli::try_parse_from(["bookshelf-rs", "stats"]).unwrap();
    assert!(!cli.offline);
}
