use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::{Book, BorrowRecord, Member};
use crate::ports::LibraryStats;

use super::error::CliError;

#[derive(Debug, Serialize)]
pub struct BookResponse {
    pub id: i64,
    pub title: String,
    pub author: String,
    pub is_available: bool,
}

impl From<&Book> for BookResponse {
    fn from(book: &Book) -> Self {
        Self {
            id: book.id().value(),
            title: book.title().to_string(),
            author: book.author().to_string(),
            is_available: book.is_available(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MemberResponse {
    pub id: i64,
    pub name: String,
    pub borrowed_books: Vec<i64>,
}

impl From<&Member> for MemberResponse {
    fn from(member: &Member) -> Self {
        Self {
            id: member.id().value(),
            name: member.name().to_string(),
            borrowed_books: member.borrowed_books().iter().map(|id| id.value()).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BorrowRecordResponse {
    pub id: i64,
    pub book_id: i64,
    pub member_id: i64,
    pub borrow_date: DateTime<Utc>,
    pub return_date: Option<DateTime<Utc>>,
    pub days_borrowed: i64,
}

impl BorrowRecordResponse {
    pub fn new(record: &BorrowRecord, now: DateTime<Utc>) -> Self {
        Self {
            id: record.id().value(),
            book_id: record.book_id().value(),
            member_id: record.member_id().value(),
            borrow_date: record.borrowed_at(),
            return_date: record.returned_at(),
            days_borrowed: record.days_borrowed(now),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub total_books: i64,
    pub available_books: i64,
    pub borrowed_books: i64,
    pub total_members: i64,
    pub active_borrowings: i64,
}

impl From<LibraryStats> for StatsResponse {
    fn from(stats: LibraryStats) -> Self {
        Self {
            total_books: stats.total_books,
            available_books: stats.available_books,
            borrowed_books: stats.borrowed_books(),
            total_members: stats.total_members,
            active_borrowings: stats.active_borrowings,
        }
    }
}

/// Error payload printed with `--json`
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub kind: &'static str,
}

impl From<&CliError> for ErrorResponse {
    fn from(err: &CliError) -> Self {
        Self {
            error: err.to_string(),
            kind: err.kind(),
        }
    }
}
