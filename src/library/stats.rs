//! Aggregate reading statistics.

use crate::library::book::Book;
use chrono::{DateTime, Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Placeholder streak until reading sessions are tracked.
pub const READING_STREAK_DAYS: u32 = 7;

/// Pages assumed to be read per hour.
const PAGES_PER_HOUR: u64 = 50;

/// Derived metrics over a set of books. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadingStats {
    /// Number of books.
    pub total_books: usize,
    /// Sum of page counts.
    pub total_pages: u64,
    /// Estimated reading hours.
    pub total_hours: u64,
    /// Books added in the current month.
    pub books_this_month: usize,
    /// Books added in the current year.
    pub books_this_year: usize,
    /// Mean rating, one decimal.
    pub average_rating: f64,
    /// Most common genre, or "N/A".
    pub favorite_genre: String,
    /// Consecutive reading days.
    pub reading_streak: u32,
}

/// Parse an added date: plain `YYYY-MM-DD` or a full RFC 3339 timestamp.
fn parse_added_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
}

/// Genre with the highest count; ties go to the genre seen first.
fn favorite_genre<'a>(books: impl Iterator<Item = &'a Book>) -> Option<String> {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for book in books {
        match counts.iter_mut().find(|(genre, _)| *genre == book.genre) {
            Some((_, n)) => *n += 1,
            None => counts.push((book.genre.as_str(), 1)),
        }
    }

    let mut best: Option<(&str, usize)> = None;
    for (genre, n) in counts {
        if best.is_none_or(|(_, m)| n > m) {
            best = Some((genre, n));
        }
    }
    best.map(|(genre, _)| genre.to_string())
}

/// Compute statistics for `books` relative to `today`.
pub fn compute(books: &[&Book], today: NaiveDate) -> ReadingStats {
    let total_books = books.len();
    let total_pages: u64 = books.iter().map(|b| u64::from(b.pages)).sum();
    let total_hours = (total_pages + PAGES_PER_HOUR / 2) / PAGES_PER_HOUR;

    let added: Vec<NaiveDate> = books
        .iter()
        .filter_map(|b| b.added_date.as_deref().and_then(parse_added_date))
        .collect();
    let books_this_year = added.iter().filter(|d| d.year() == today.year()).count();
    let books_this_month = added
        .iter()
        .filter(|d| d.year() == today.year() && d.month() == today.month())
        .count();

    let average_rating = if total_books == 0 {
        0.0
    } else {
        let mean = books.iter().map(|b| b.rating).sum::<f64>() / total_books as f64;
        (mean * 10.0).round() / 10.0
    };

    ReadingStats {
        total_books,
        total_pages,
        total_hours,
        books_this_month,
        books_this_year,
        average_rating,
        favorite_genre: favorite_genre(books.iter().copied()).unwrap_or_else(|| "N/A".to_string()),
        reading_streak: READING_STREAK_DAYS,
    }
}
