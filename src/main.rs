//! bookshelf-rs command-line entry point.

use bookshelf_rs::{
    config::{
        BookCommand, Cli, Command, Config, FavCommand, ModerateCommand, ProgressCommand,
        ReviewCommand, SearchCommand, StorageCommand, TermsCommand, ThemeCommand,
    },
    db::{self, Database},
    library::{Book, BookPatch, NewReview, Theme, ThemeColors},
    notify::Level,
    store::LibraryStore,
};
use clap::Parser;
use std::io::{self, Write};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

type Store = LibraryStore<Database>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bookshelf_rs=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    // Find or load config
    let config_path = cli.config.clone().or_else(Config::find_config_file);

    let config = if let Some(ref path) = config_path {
        Config::load(path)?
    } else {
        Config::default()
    };

    if let Command::Init { force } = cli.command {
        return cmd_init(force);
    }

    let mut store = open_store(&config)?;
    if cli.offline {
        store.set_online(false);
    }

    let result = match cli.command {
        Command::Init { .. } => Ok(()),
        Command::Login {
            email,
            password,
            role,
        } => {
            let password = match password {
                Some(p) => p,
                None => prompt_password("Password: ")?,
            };
            store.login(&email, &password, role).await;
            Ok(())
        }
        Command::Logout => {
            store.logout();
            Ok(())
        }
        Command::Whoami => {
            cmd_whoami(&store);
            Ok(())
        }
        Command::Role { role } => {
            store.update_user_role(role);
            Ok(())
        }
        Command::Book { action } => cmd_book(action, &mut store),
        Command::Moderate { action } => {
            cmd_moderate(action, &mut store);
            Ok(())
        }
        Command::Terms { action } => {
            cmd_terms(action, &mut store);
            Ok(())
        }
        Command::Review { action } => {
            cmd_review(action, &mut store);
            Ok(())
        }
        Command::Fav { action } => {
            cmd_fav(action, &mut store);
            Ok(())
        }
        Command::Progress { action } => {
            cmd_progress(action, &mut store);
            Ok(())
        }
        Command::Search { action } => {
            cmd_search(action, &mut store);
            Ok(())
        }
        Command::Stats => {
            cmd_stats(&store);
            Ok(())
        }
        Command::Theme { action } => {
            cmd_theme(action, &mut store);
            Ok(())
        }
        Command::Storage { action } => cmd_storage(action, &store),
    };

    let rejected = store
        .notifications()
        .iter()
        .any(|n| n.level == Level::Error);
    print_notifications(&mut store);
    result?;

    if rejected {
        std::process::exit(1);
    }
    Ok(())
}

/// Open the configured storage and load the store.
fn open_store(config: &Config) -> anyhow::Result<Store> {
    let db = Database::open(&config.storage.path)?;
    Ok(LibraryStore::open(db, config.session.clone())?)
}

/// Print and clear queued notifications.
fn print_notifications(store: &mut Store) {
    for notification in store.take_notifications() {
        println!("{}", notification);
    }
}

/// Initialize config and seed storage.
fn cmd_init(force: bool) -> anyhow::Result<()> {
    let config_path = PathBuf::from("config.toml");

    if config_path.exists() && !force {
        anyhow::bail!(
            "Config file already exists: {}. Use --force to overwrite.",
            config_path.display()
        );
    }

    // Write default config
    std::fs::write(&config_path, Config::generate_default())?;
    println!("Created config file: {}", config_path.display());

    // Seed storage
    let config = Config::default();
    let store = open_store(&config)?;
    store.persist_all()?;
    println!("Initialized storage: {}", config.storage.path.display());

    println!("\nSign in with: bookshelf-rs login <email> --role reviewer");

    Ok(())
}

fn cmd_whoami(store: &Store) {
    match store.user() {
        Some(user) => {
            println!("{} <{}>", user.name, user.email);
            println!("  id:   {}", user.id);
            println!("  role: {}", user.role);
            if let Some(avatar) = &user.avatar {
                println!("  avatar: {}", avatar);
            }
        }
        None => println!("Not signed in."),
    }
}

fn print_books<'a>(books: impl IntoIterator<Item = &'a Book>, store: &Store) {
    println!(
        "{:<38} {:<36} {:<24} {:>6} {:>5} FLAGS",
        "ID", "TITLE", "AUTHOR", "RATING", "PAGES"
    );
    println!("{}", "-".repeat(120));
    for book in books {
        let mut flags = Vec::new();
        if book.is_blocked {
            flags.push("blocked");
        }
        if store.is_favorite(&book.id) {
            flags.push("fav");
        }
        println!(
            "{:<38} {:<36} {:<24} {:>6.1} {:>5} {}",
            book.id,
            book.title,
            book.author,
            book.rating,
            book.pages,
            flags.join(",")
        );
    }
}

fn print_book(book: &Book, store: &Store) {
    println!("{} ({})", book.title, book.id);
    println!("  author:   {}", book.author);
    println!("  genre:    {}", book.genre);
    println!("  rating:   {:.1}", book.rating);
    println!("  pages:    {}", book.pages);
    println!("  year:     {}", book.year);
    if let Some(added) = &book.added_date {
        println!("  added:    {}", added);
    }
    if book.is_blocked {
        println!(
            "  blocked:  {}",
            book.block_reason.as_deref().unwrap_or("no reason given")
        );
    }
    if let Some(progress) = store.reading_progress(&book.id) {
        println!("  progress: {:.0}%", progress);
    }
    if !book.description.is_empty() {
        println!("\n{}", book.description);
    }
    if !book.related_docs.is_empty() {
        println!("\nRelated: {}", book.related_docs.join(", "));
    }
}

/// Book catalog commands.
fn cmd_book(action: BookCommand, store: &mut Store) -> anyhow::Result<()> {
    match action {
        BookCommand::List { all } => {
            if all {
                print_books(store.books(), store);
            } else {
                print_books(store.visible_books(), store);
            }
        }

        BookCommand::Show { id } => {
            // Blocked books stay hidden from regular users
            let book = store
                .visible_books()
                .into_iter()
                .find(|b| b.id == id)
                .ok_or_else(|| bookshelf_rs::AppError::NotFound(format!("book {}", id)))?;
            print_book(book, store);
        }

        BookCommand::Add {
            title,
            author,
            genre,
            pages,
            year,
            rating,
            id,
            description,
        } => {
            let uploaded_by = store
                .user()
                .map(|u| u.id.clone())
                .unwrap_or_else(|| "anonymous".to_string());
            let mut book = Book::new(
                id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
                title,
                uploaded_by,
            );
            book.author = author;
            book.genre = genre;
            book.pages = pages;
            book.year = year;
            book.rating = rating;
            book.description = description;
            book.added_date = Some(chrono::Local::now().date_naive().to_string());

            let id = book.id.clone();
            store.add_book(book);
            println!("Added book: {}", id);
        }

        BookCommand::Import { file } => {
            let content = std::fs::read_to_string(&file)?;
            let books: Vec<Book> = serde_json::from_str(&content).map_err(|e| {
                bookshelf_rs::AppError::InvalidFormat(format!(
                    "{} is not a JSON array of books: {}",
                    file.display(),
                    e
                ))
            })?;
            let total = books.len();
            let added = store.import_books(books);
            println!("Imported {} of {} books", added, total);
        }

        BookCommand::Update {
            id,
            title,
            author,
            genre,
            pages,
            year,
            rating,
        } => {
            let patch = BookPatch {
                title,
                author,
                genre,
                pages,
                year,
                rating,
                ..BookPatch::default()
            };
            if patch.is_empty() {
                println!("Nothing to update.");
            } else {
                store.update_book(&id, patch);
            }
        }

        BookCommand::Delete { id } => {
            if store.delete_book(&id).is_none() {
                println!("Book not found: {}", id);
            }
        }
    }

    Ok(())
}

/// Moderation commands.
fn cmd_moderate(action: ModerateCommand, store: &mut Store) {
    match action {
        ModerateCommand::Block { id, reason } => {
            store.block_book(&id, &reason);
        }
        ModerateCommand::Unblock { id } => {
            store.unblock_book(&id);
        }
        ModerateCommand::Flag { id, reason } => {
            store.flag_book(&id, &reason);
        }
        ModerateCommand::Approve { id, reason } => {
            store.approve_book(&id, &reason);
        }
        ModerateCommand::Logs { book } => {
            let logs = store.moderation_logs(book.as_deref());
            if logs.is_empty() {
                println!("No moderation entries.");
            } else {
                println!(
                    "{:<26} {:<8} {:<38} {:<20} REASON",
                    "TIMESTAMP", "ACTION", "BOOK", "MODERATOR"
                );
                println!("{}", "-".repeat(110));
                for log in logs {
                    println!(
                        "{:<26} {:<8} {:<38} {:<20} {}",
                        log.timestamp, log.action, log.book_id, log.moderator_name, log.reason
                    );
                }
            }
        }
        ModerateCommand::Blocked => {
            let blocked = store.blocked_books();
            if blocked.is_empty() {
                println!("No blocked books.");
            } else {
                for book in blocked {
                    println!(
                        "{:<38} {:<36} {}",
                        book.id,
                        book.title,
                        book.block_reason.as_deref().unwrap_or("")
                    );
                }
            }
        }
    }
}

/// Terms acceptance commands.
fn cmd_terms(action: TermsCommand, store: &mut Store) {
    match action {
        TermsCommand::Accept { book } => {
            let acceptance = store.accept_terms(&book);
            println!(
                "Accepted terms for {} as {} ({})",
                acceptance.book_id, acceptance.user_id, acceptance.id
            );
        }
        TermsCommand::Show { book } => match store.terms_acceptance(&book) {
            Some(acceptance) => println!(
                "Terms for {} accepted at {} ({})",
                acceptance.book_id, acceptance.accepted_at, acceptance.id
            ),
            None => println!("Terms for {} not accepted.", book),
        },
    }
}

/// Review commands.
fn cmd_review(action: ReviewCommand, store: &mut Store) {
    match action {
        ReviewCommand::Add { book, rating, text } => {
            let Some(user) = store.user().cloned() else {
                println!("Sign in to publish reviews.");
                return;
            };
            let review = store.add_review(NewReview {
                book_id: book,
                user_id: user.id,
                user_name: user.name,
                user_avatar: user.avatar,
                rating,
                text,
            });
            println!("Published review: {}", review.id);
        }
        ReviewCommand::List { book } => {
            let reviews = store.book_reviews(&book);
            if reviews.is_empty() {
                println!("No reviews for {}.", book);
            }
            for review in reviews {
                println!(
                    "{} | {} | {:.1} stars | {} helpful",
                    review.id, review.user_name, review.rating, review.helpful
                );
                println!("  {}", review.text);
            }
        }
        ReviewCommand::Helpful { id } => {
            if !store.mark_review_helpful(&id) {
                println!("Review not found: {}", id);
            }
        }
    }
}

/// Favorite commands.
fn cmd_fav(action: FavCommand, store: &mut Store) {
    match action {
        FavCommand::Add { id } => store.add_to_favorites(&id),
        FavCommand::Remove { id } => store.remove_from_favorites(&id),
        FavCommand::List => {
            let favorites: Vec<&Book> = store
                .favorites()
                .iter()
                .filter_map(|id| store.book(id))
                .collect();
            if favorites.is_empty() {
                println!("No favorites.");
            } else {
                print_books(favorites, store);
            }
        }
    }
}

/// Reading progress commands.
fn cmd_progress(action: ProgressCommand, store: &mut Store) {
    match action {
        ProgressCommand::Set { book, percent } => {
            let stored = store.update_reading_progress(&book, percent);
            println!("{}: {:.0}%", book, stored);
        }
        ProgressCommand::Show { book: Some(book) } => match store.reading_progress(&book) {
            Some(value) => println!("{}: {:.0}%", book, value),
            None => println!("{}: not started", book),
        },
        ProgressCommand::Show { book: None } => {
            for (id, value) in &store.state().reading_progress {
                let title = store.book(id).map(|b| b.title.as_str()).unwrap_or("unknown");
                println!("{:<38} {:<36} {:>4.0}%", id, title, value);
            }
        }
    }
}

/// Search history commands.
fn cmd_search(action: SearchCommand, store: &mut Store) {
    match action {
        SearchCommand::Add { term } => store.add_to_search_history(&term),
        SearchCommand::List => {
            for (i, term) in store.search_history().iter().enumerate() {
                println!("{:>2}. {}", i + 1, term);
            }
        }
        SearchCommand::Clear => store.clear_search_history(),
    }
}

fn cmd_stats(store: &Store) {
    let stats = store.reading_stats();
    println!("Books:           {}", stats.total_books);
    println!("Pages:           {}", stats.total_pages);
    println!("Reading hours:   {}", stats.total_hours);
    println!("Added this month: {}", stats.books_this_month);
    println!("Added this year:  {}", stats.books_this_year);
    println!("Average rating:  {:.1}", stats.average_rating);
    println!("Favorite genre:  {}", stats.favorite_genre);
    println!("Reading streak:  {} days", stats.reading_streak);
}

/// Theme commands.
fn cmd_theme(action: ThemeCommand, store: &mut Store) {
    match action {
        ThemeCommand::List => {
            let current = store.current_theme_id();
            for theme in store.themes() {
                let marker = if theme.id == current { "*" } else { " " };
                println!("{} {:<12} {:<24} {}", marker, theme.id, theme.name, theme.colors.primary);
            }
            if let Some(theme) = store.current_theme() {
                println!();
                for (var, value) in theme.css_variables() {
                    println!("{}: {};", var, value);
                }
            }
        }
        ThemeCommand::Add {
            id,
            name,
            primary,
            secondary,
            accent,
            background,
            foreground,
        } => {
            store.add_custom_theme(Theme {
                id,
                name,
                colors: ThemeColors {
                    primary,
                    secondary,
                    accent,
                    background,
                    foreground,
                },
            });
        }
        ThemeCommand::Use { id } => {
            store.set_current_theme(&id);
        }
        ThemeCommand::Del { id } => {
            store.delete_custom_theme(&id);
        }
    }
}

/// Local storage maintenance commands.
fn cmd_storage(action: StorageCommand, store: &Store) -> anyhow::Result<()> {
    match action {
        StorageCommand::Keys => {
            let keys = store.storage().list_keys()?;
            if keys.is_empty() {
                println!("Storage is empty.");
            }
            for (key, updated_at) in keys {
                println!(
                    "{:<20} {}",
                    key,
                    db::timestamp_to_datetime(updated_at).format("%Y-%m-%d %H:%M:%S")
                );
            }
        }
        StorageCommand::Reset { force } => {
            if !force {
                anyhow::bail!("Refusing to reset storage without --force");
            }
            let removed = store.storage().clear()?;
            println!("Removed {} stored keys.", removed);
        }
    }
    Ok(())
}

/// Prompt for password input.
fn prompt_password(prompt: &str) -> anyhow::Result<String> {
    print!("{}", prompt);
    io::stdout().flush()?;

    let mut password = String::new();
    io::stdin().read_line(&mut password)?;

    Ok(password.trim().to_string())
}
