use chrono::{DateTime, Utc};
use serde::Serialize;
use std::io::Write;

use crate::application::{ServiceDependencies, borrowing, catalog};
use crate::domain::{
    Book, BorrowRecord,
    commands::{AddBook, AddMember, BorrowBook, ReturnBook},
    value_objects::{BookId, MemberId},
};
use crate::ports::SearchCriteria;

use super::{
    commands::Command,
    error::CliError,
    types::{BookResponse, BorrowRecordResponse, MemberResponse, StatsResponse},
};

/// How results are written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC";

fn format_date(date: DateTime<Utc>) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn write_json<W: Write, T: Serialize>(out: &mut W, value: &T) -> Result<(), CliError> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}

fn status_label(book: &Book) -> &'static str {
    if book.is_available() {
        "Available"
    } else {
        "Borrowed"
    }
}

/// Run one command against the store and write its result to `out`
pub async fn execute<W: Write>(
    deps: &ServiceDependencies,
    command: Command,
    format: OutputFormat,
    out: &mut W,
) -> Result<(), CliError> {
    match command {
        Command::AddBook { title, author } => {
            let book = catalog::add_book(deps, AddBook { title, author }).await?;
            render_added_book(&book, format, out)
        }
        Command::AddMember { name } => {
            let member = catalog::add_member(deps, AddMember { name }).await?;
            match format {
                OutputFormat::Json => write_json(out, &MemberResponse::from(&member)),
                OutputFormat::Text => {
                    writeln!(out, "Member added successfully!")?;
                    writeln!(out, "ID: {}", member.id())?;
                    writeln!(out, "Name: {}", member.name())?;
                    Ok(())
                }
            }
        }
        Command::Borrow { book_id, member_id } => {
            let cmd = BorrowBook {
                book_id: BookId::from_i64(book_id),
                member_id: MemberId::from_i64(member_id),
                borrowed_at: Utc::now(),
            };
            let record = borrowing::borrow_book(deps, cmd).await?;
            render_borrowed(&record, format, out)
        }
        Command::Return { book_id, member_id } => {
            let cmd = ReturnBook {
                book_id: BookId::from_i64(book_id),
                member_id: MemberId::from_i64(member_id),
                returned_at: Utc::now(),
            };
            let record = borrowing::return_book(deps, cmd).await?;
            render_returned(&record, format, out)
        }
        Command::Search { title, author } => {
            if title.is_none() && author.is_none() {
                return Err(CliError::MissingSearchCriteria);
            }
            let books = catalog::search_books(deps, SearchCriteria { title, author }).await?;
            render_search_results(&books, format, out)
        }
        Command::MemberBooks { member_id } => {
            let member_id = MemberId::from_i64(member_id);
            let books = borrowing::get_member_borrowed_books(deps, member_id).await?;
            render_member_books(member_id, &books, format, out)
        }
        Command::Member { member_id } => {
            let member = catalog::get_member(deps, MemberId::from_i64(member_id)).await?;
            match format {
                OutputFormat::Json => write_json(out, &MemberResponse::from(&member)),
                OutputFormat::Text => {
                    let borrowed = member
                        .borrowed_books()
                        .iter()
                        .map(|id| id.to_string())
                        .collect::<Vec<_>>();
                    writeln!(out, "ID: {}", member.id())?;
                    writeln!(out, "Name: {}", member.name())?;
                    if borrowed.is_empty() {
                        writeln!(out, "Borrowed Books: none")?;
                    } else {
                        writeln!(out, "Borrowed Books: {}", borrowed.join(", "))?;
                    }
                    Ok(())
                }
            }
        }
        Command::History { book_id } => {
            let book_id = BookId::from_i64(book_id);
            let records = catalog::get_book_history(deps, book_id).await?;
            render_history(book_id, &records, format, out)
        }
        Command::Stats => {
            let stats = StatsResponse::from(catalog::library_stats(deps).await?);
            match format {
                OutputFormat::Json => write_json(out, &stats),
                OutputFormat::Text => {
                    writeln!(out, "\nLibrary Statistics:\n")?;
                    writeln!(out, "Total Books: {}", stats.total_books)?;
                    writeln!(out, "Available Books: {}", stats.available_books)?;
                    writeln!(out, "Borrowed Books: {}", stats.borrowed_books)?;
                    writeln!(out, "Total Members: {}", stats.total_members)?;
                    writeln!(out, "Active Borrowings: {}", stats.active_borrowings)?;
                    Ok(())
                }
            }
        }
        Command::ListBooks => {
            let books = catalog::list_books(deps).await?;
            render_collection(&books, format, out)
        }
    }
}

fn render_added_book<W: Write>(
    book: &Book,
    format: OutputFormat,
    out: &mut W,
) -> Result<(), CliError> {
    match format {
        OutputFormat::Json => write_json(out, &BookResponse::from(book)),
        OutputFormat::Text => {
            writeln!(out, "Book added successfully!")?;
            writeln!(out, "ID: {}", book.id())?;
            writeln!(out, "Title: {}", book.title())?;
            writeln!(out, "Author: {}", book.author())?;
            Ok(())
        }
    }
}

fn render_borrowed<W: Write>(
    record: &BorrowRecord,
    format: OutputFormat,
    out: &mut W,
) -> Result<(), CliError> {
    match format {
        OutputFormat::Json => write_json(out, &BorrowRecordResponse::new(record, Utc::now())),
        OutputFormat::Text => {
            writeln!(out, "Book borrowed successfully!")?;
            writeln!(out, "ID: {}", record.id())?;
            writeln!(out, "Book ID: {}", record.book_id())?;
            writeln!(out, "Member ID: {}", record.member_id())?;
            writeln!(out, "Borrow Date: {}", format_date(record.borrowed_at()))?;
            Ok(())
        }
    }
}

fn render_returned<W: Write>(
    record: &BorrowRecord,
    format: OutputFormat,
    out: &mut W,
) -> Result<(), CliError> {
    match format {
        OutputFormat::Json => write_json(out, &BorrowRecordResponse::new(record, Utc::now())),
        OutputFormat::Text => {
            writeln!(out, "Book returned successfully!")?;
            writeln!(out, "Book ID: {}", record.book_id())?;
            writeln!(out, "Member ID: {}", record.member_id())?;
            if let Some(returned_at) = record.returned_at() {
                writeln!(out, "Return Date: {}", format_date(returned_at))?;
            }
            Ok(())
        }
    }
}

fn render_search_results<W: Write>(
    books: &[Book],
    format: OutputFormat,
    out: &mut W,
) -> Result<(), CliError> {
    match format {
        OutputFormat::Json => {
            let books: Vec<BookResponse> = books.iter().map(BookResponse::from).collect();
            write_json(out, &books)
        }
        OutputFormat::Text => {
            if books.is_empty() {
                writeln!(out, "No books found matching your criteria")?;
                return Ok(());
            }
            writeln!(out, "\nFound {} book(s):\n", books.len())?;
            for book in books {
                writeln!(out, "ID: {}", book.id())?;
                writeln!(out, "Title: {}", book.title())?;
                writeln!(out, "Author: {}", book.author())?;
                writeln!(out, "Status: {}", status_label(book))?;
                writeln!(out, "---")?;
            }
            Ok(())
        }
    }
}

fn render_member_books<W: Write>(
    member_id: MemberId,
    books: &[Book],
    format: OutputFormat,
    out: &mut W,
) -> Result<(), CliError> {
    match format {
        OutputFormat::Json => {
            let books: Vec<BookResponse> = books.iter().map(BookResponse::from).collect();
            write_json(out, &books)
        }
        OutputFormat::Text => {
            if books.is_empty() {
                writeln!(out, "Member {} has no borrowed books currently", member_id)?;
                return Ok(());
            }
            writeln!(
                out,
                "\nMember {} has borrowed {} book(s):\n",
                member_id,
                books.len()
            )?;
            for book in books {
                writeln!(out, "ID: {}", book.id())?;
                writeln!(out, "Title: {}", book.title())?;
                writeln!(out, "Author: {}", book.author())?;
                writeln!(out, "---")?;
            }
            Ok(())
        }
    }
}

fn render_history<W: Write>(
    book_id: BookId,
    records: &[BorrowRecord],
    format: OutputFormat,
    out: &mut W,
) -> Result<(), CliError> {
    let now = Utc::now();
    match format {
        OutputFormat::Json => {
            let records: Vec<BorrowRecordResponse> = records
                .iter()
                .map(|r| BorrowRecordResponse::new(r, now))
                .collect();
            write_json(out, &records)
        }
        OutputFormat::Text => {
            if records.is_empty() {
                writeln!(out, "Book {} has never been borrowed", book_id)?;
                return Ok(());
            }
            writeln!(out, "\nBorrow history of book {}:\n", book_id)?;
            for record in records {
                let returned = record
                    .returned_at()
                    .map(format_date)
                    .unwrap_or_else(|| "on loan".to_string());
                writeln!(
                    out,
                    "Record {} | Member {} | Borrowed {} | Returned {} | {} day(s)",
                    record.id(),
                    record.member_id(),
                    format_date(record.borrowed_at()),
                    returned,
                    record.days_borrowed(now)
                )?;
            }
            Ok(())
        }
    }
}

fn render_collection<W: Write>(
    books: &[Book],
    format: OutputFormat,
    out: &mut W,
) -> Result<(), CliError> {
    match format {
        OutputFormat::Json => {
            let books: Vec<BookResponse> = books.iter().map(BookResponse::from).collect();
            write_json(out, &books)
        }
        OutputFormat::Text => {
            if books.is_empty() {
                writeln!(out, "No books in the library")?;
                return Ok(());
            }
            writeln!(out, "\nLibrary Collection ({} books):\n", books.len())?;
            for book in books {
                writeln!(
                    out,
                    "ID: {} | {} by {} ({})",
                    book.id(),
                    book.title(),
                    book.author(),
                    status_label(book)
                )?;
                writeln!(out)?;
            }
            Ok(())
        }
    }
}
