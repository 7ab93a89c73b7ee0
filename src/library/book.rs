//! Book model and seed catalog.

use serde::{Deserialize, Serialize};

/// Represents a book in the library.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    /// Unique identifier for the book.
    pub id: String,

    /// Book title.
    pub title: String,

    /// Author name.
    pub author: String,

    /// Genre label.
    pub genre: String,

    /// Average rating (0.0 - 5.0).
    pub rating: f64,

    /// Book description or summary.
    #[serde(default)]
    pub description: String,

    /// Cover style token.
    #[serde(default)]
    pub cover: String,

    /// Number of pages.
    pub pages: u32,

    /// Publication year.
    pub year: i32,

    /// Titles of related documents.
    #[serde(default)]
    pub related_docs: Vec<String>,

    /// Date the book was added to the library (YYYY-MM-DD).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub added_date: Option<String>,

    /// Readable excerpt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    /// ID of the uploader ("system" for the seed catalog).
    pub uploaded_by: String,

    /// Hidden from regular users when set.
    #[serde(default)]
    pub is_blocked: bool,

    /// Reason given when the book was blocked.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_reason: Option<String>,

    /// Terms acceptance tied to this book.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub terms_acceptance_id: Option<String>,
}

impl Book {
    /// Create a new book with minimal information.
    pub fn new(id: impl Into<String>, title: impl Into<String>, uploaded_by: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            uploaded_by: uploaded_by.into(),
            ..Self::default()
        }
    }
}

impl Default for Book {
    fn default() -> Self {
        Self {
            id: String::new(),
            title: "Unknown".to_string(),
            author: "Unknown Author".to_string(),
            genre: String::new(),
            rating: 0.0,
            description: String::new(),
            cover: String::new(),
            pages: 0,
            year: 0,
            related_docs: Vec::new(),
            added_date: None,
            content: None,
            uploaded_by: String::new(),
            is_blocked: false,
            block_reason: None,
            terms_acceptance_id: None,
        }
    }
}

/// Partial update for a book. `None` fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BookPatch {
    /// New title.
    pub title: Option<String>,
    /// New author.
    pub author: Option<String>,
    /// New genre.
    pub genre: Option<String>,
    /// New rating.
    pub rating: Option<f64>,
    /// New description.
    pub description: Option<String>,
    /// New cover style.
    pub cover: Option<String>,
    /// New page count.
    pub pages: Option<u32>,
    /// New publication year.
    pub year: Option<i32>,
    /// Replacement related documents.
    pub related_docs: Option<Vec<String>>,
    /// New added date.
    pub added_date: Option<String>,
    /// New excerpt.
    pub content: Option<String>,
    /// New uploader.
    pub uploaded_by: Option<String>,
    /// New blocked flag.
    pub is_blocked: Option<bool>,
    /// New block reason. Ignored unless the book ends up blocked.
    pub block_reason: Option<String>,
    /// New terms acceptance link.
    pub terms_acceptance_id: Option<String>,
}

impl BookPatch {
    /// Whether the patch changes nothing.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.author.is_none()
            && self.genre.is_none()
            && self.rating.is_none()
            && self.description.is_none()
            && self.cover.is_none()
            && self.pages.is_none()
            && self.year.is_none()
            && self.related_docs.is_none()
            && self.added_date.is_none()
            && self.content.is_none()
            && self.uploaded_by.is_none()
            && self.is_blocked.is_none()
            && self.block_reason.is_none()
            && self.terms_acceptance_id.is_none()
    }

    /// Merge the set fields into `book`.
    pub fn apply(self, book: &mut Book) {
        if let Some(v) = self.title {
            book.title = v;
        }
        if let Some(v) = self.author {
            book.author = v;
        }
        if let Some(v) = self.genre {
            book.genre = v;
        }
        if let Some(v) = self.rating {
            book.rating = v;
        }
        if let Some(v) = self.description {
            book.description = v;
        }
        if let Some(v) = self.cover {
            book.cover = v;
        }
        if let Some(v) = self.pages {
            book.pages = v;
        }
        if let Some(v) = self.year {
            book.year = v;
        }
        if let Some(v) = self.related_docs {
            book.related_docs = v;
        }
        if let Some(v) = self.added_date {
            book.added_date = Some(v);
        }
        if let Some(v) = self.content {
            book.content = Some(v);
        }
        if let Some(v) = self.uploaded_by {
            book.uploaded_by = v;
        }
        if let Some(v) = self.is_blocked {
            book.is_blocked = v;
            if !v {
                book.block_reason = None;
            }
        }
        if let Some(v) = self.block_reason
            && book.is_blocked
        {
            book.block_reason = Some(v);
        }
        if let Some(v) = self.terms_acceptance_id {
            book.terms_acceptance_id = Some(v);
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn seed(
    id: &str,
    title: &str,
    author: &str,
    genre: &str,
    rating: f64,
    pages: u32,
    year: i32,
    added_date: &str,
    cover: &str,
    description: &str,
    related_docs: [&str; 3],
    content: &str,
) -> Book {
    Book {
        id: id.to_string(),
        title: title.to_string(),
        author: author.to_string(),
        genre: genre.to_string(),
        rating,
        description: description.to_string(),
        cover: cover.to_string(),
        pages,
        year,
        related_docs: related_docs.iter().map(|s| s.to_string()).collect(),
        added_date: Some(added_date.to_string()),
        content: Some(content.to_string()),
        uploaded_by: "system".to_string(),
        is_blocked: false,
        block_reason: None,
        terms_acceptance_id: None,
    }
}

/// Catalog used when no books have been persisted yet.
pub fn seed_catalog() -> Vec<Book> {
    vec![
        seed(
            "1",
            "One Hundred Years of Solitude",
            "Gabriel García Márquez",
            "Magical Realism",
            4.8,
            417,
            1967,
            "2024-01-15",
            "bg-gradient-to-br from-emerald-400 to-teal-500",
            "Seven generations of the Buendía family in the fictional town of Macondo.",
            ["Literary analysis", "Author biography", "Historical context"],
            "Many years later, as he faced the firing squad, Colonel Aureliano Buendía was to remember that distant afternoon when his father took him to discover ice...",
        ),
        seed(
            "2",
            "The Name of the Wind",
            "Patrick Rothfuss",
            "Fantasy",
            4.6,
            662,
            2007,
            "2024-01-10",
            "bg-gradient-to-br from-orange-400 to-red-500",
            "Kvothe, a young man who becomes a legend, tells his own story at a roadside inn.",
            ["World map", "Magic system", "Timeline"],
            "My name is Kvothe. You may have heard of me. Names are important as they tell you a great deal about a person...",
        ),
        seed(
            "3",
            "Neuromancer",
            "William Gibson",
            "Science Fiction",
            4.4,
            271,
            1984,
            "2024-01-08",
            "bg-gradient-to-br from-cyan-400 to-blue-500",
            "The cyberpunk novel that defined the genre and explored artificial intelligence and virtual reality.",
            ["Cyberpunk glossary", "Cultural influence", "Predicted technology"],
            "The sky above the port was the color of television, tuned to a dead channel...",
        ),
        seed(
            "4",
            "Pride and Prejudice",
            "Jane Austen",
            "Romance",
            4.7,
            432,
            1813,
            "2024-01-05",
            "bg-gradient-to-br from-pink-400 to-rose-500",
            "Love, social class and personal growth in nineteenth-century England.",
            ["Social context", "Character analysis", "Adaptations"],
            "It is a truth universally acknowledged, that a single man in possession of a good fortune, must be in want of a wife...",
        ),
        seed(
            "5",
            "Foundation",
            "Isaac Asimov",
            "Science Fiction",
            4.5,
            244,
            1951,
            "2024-01-03",
            "bg-gradient-to-br from-purple-400 to-indigo-500",
            "The first Foundation novel, introducing psychohistory and the future of humanity.",
            ["Laws of robotics", "Galactic timeline", "Scientific concepts"],
            "His name was Gaal Dornick and he was just a country boy who had never seen Trantor before...",
        ),
        seed(
            "6",
            "The Hobbit",
            "J.R.R. Tolkien",
            "Fantasy",
            4.9,
            310,
            1937,
            "2024-01-01",
            "bg-gradient-to-br from-green-400 to-emerald-500",
            "Bilbo Baggins' adventure before The Lord of the Rings, full of dragons, dwarves and treasure.",
            ["Map of Middle-earth", "Elvish languages", "Tolkien mythology"],
            "In a hole in the ground there lived a hobbit. Not a nasty, dirty, wet hole, filled with the ends of worms and an oozy smell...",
        ),
    ]
}
