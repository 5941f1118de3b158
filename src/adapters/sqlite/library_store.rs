use crate::domain::value_objects::{BookId, BorrowRecordId, MemberId};
use crate::ports::library_store::{
    BookView, BorrowRecordView, LibraryStats, LibraryStore as LibraryStoreTrait,
    LibraryTransaction, MemberView, Result, SearchCriteria,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::{StreamExt, TryStreamExt, future};
use sqlx::{
    Row, Sqlite, SqlitePool, Transaction,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow},
};
use std::str::FromStr;

/// Convert a `books` row into a BookView
fn map_row_to_book_view(row: &SqliteRow) -> Result<BookView> {
    let is_available: i64 = row.try_get("is_available")?;

    Ok(BookView {
        book_id: BookId::from_i64(row.try_get("id")?),
        title: row.try_get("title")?,
        author: row.try_get("author")?,
        is_available: is_available != 0,
    })
}

fn map_row_to_member_view(row: &SqliteRow) -> Result<MemberView> {
    Ok(MemberView {
        member_id: MemberId::from_i64(row.try_get("id")?),
        name: row.try_get("name")?,
    })
}

fn map_row_to_borrow_record_view(row: &SqliteRow) -> Result<BorrowRecordView> {
    Ok(BorrowRecordView {
        record_id: BorrowRecordId::from_i64(row.try_get("id")?),
        book_id: BookId::from_i64(row.try_get("book_id")?),
        member_id: MemberId::from_i64(row.try_get("member_id")?),
        borrowed_at: row.try_get("borrow_date")?,
        returned_at: row.try_get("return_date")?,
    })
}

/// Whether the URL names an in-memory database
///
/// Covers `sqlite::memory:`, `sqlite://:memory:` and `mode=memory` URLs.
fn is_in_memory(database_url: &str) -> bool {
    let (path, query) = database_url.split_once('?').unwrap_or((database_url, ""));

    path.ends_with(":memory:")
        || query
            .split('&')
            .any(|param| param.eq_ignore_ascii_case("mode=memory"))
}

/// SQLite implementation of LibraryStore
///
/// Backed by a local file database. Every borrow/return runs inside a single
/// SQLite transaction obtained from `begin`.
pub struct LibraryStore {
    pool: SqlitePool,
}

impl LibraryStore {
    /// Create a new LibraryStore from an already migrated pool
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open (or create) the database at `database_url` and apply migrations
    ///
    /// In-memory databases are limited to a single long-lived connection so
    /// every query sees the same data.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = if is_in_memory(database_url) {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await?
        } else {
            SqlitePoolOptions::new()
                .max_connections(max_connections)
                .connect_with(options)
                .await?
        };

        Self::migrate(&pool).await?;
        tracing::debug!("Connected to {}", database_url);

        Ok(Self::new(pool))
    }

    /// Apply the embedded migrations (idempotent)
    pub async fn migrate(pool: &SqlitePool) -> Result<()> {
        sqlx::migrate!("./migrations").run(pool).await?;
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl LibraryStoreTrait for LibraryStore {
    async fn begin(&self) -> Result<Box<dyn LibraryTransaction>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(StoreTransaction { tx }))
    }

    async fn insert_book(&self, title: &str, author: &str) -> Result<BookId> {
        let result = sqlx::query("INSERT INTO books (title, author, is_available) VALUES (?, ?, 1)")
            .bind(title)
            .bind(author)
            .execute(&self.pool)
            .await?;

        Ok(BookId::from_i64(result.last_insert_rowid()))
    }

    async fn insert_member(&self, name: &str) -> Result<MemberId> {
        let result = sqlx::query("INSERT INTO members (name) VALUES (?)")
            .bind(name)
            .execute(&self.pool)
            .await?;

        Ok(MemberId::from_i64(result.last_insert_rowid()))
    }

    async fn find_book_by_id(&self, book_id: BookId) -> Result<Option<BookView>> {
        let row = sqlx::query("SELECT id, title, author, is_available FROM books WHERE id = ?")
            .bind(book_id.value())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(map_row_to_book_view).transpose()
    }

    async fn find_member_by_id(&self, member_id: MemberId) -> Result<Option<MemberView>> {
        let row = sqlx::query("SELECT id, name FROM members WHERE id = ?")
            .bind(member_id.value())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(map_row_to_member_view).transpose()
    }

    async fn find_open_book_ids_for_member(&self, member_id: MemberId) -> Result<Vec<BookId>> {
        let ids: Vec<i64> = sqlx::query_scalar(
            r#"
            SELECT book_id
            FROM borrow_records
            WHERE member_id = ? AND return_date IS NULL
            ORDER BY book_id ASC
            "#,
        )
        .bind(member_id.value())
        .fetch_all(&self.pool)
        .await?;

        Ok(ids.into_iter().map(BookId::from_i64).collect())
    }

    /// Join open borrow records for the member against books
    async fn find_books_on_loan_to(&self, member_id: MemberId) -> Result<Vec<BookView>> {
        let rows = sqlx::query(
            r#"
            SELECT DISTINCT b.id, b.title, b.author, b.is_available
            FROM books b
            INNER JOIN borrow_records br ON b.id = br.book_id
            WHERE br.member_id = ? AND br.return_date IS NULL
            ORDER BY b.id ASC
            "#,
        )
        .bind(member_id.value())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_row_to_book_view).collect()
    }

    async fn find_borrow_records_for_book(
        &self,
        book_id: BookId,
    ) -> Result<Vec<BorrowRecordView>> {
        let rows = sqlx::query(
            r#"
            SELECT id, book_id, member_id, borrow_date, return_date
            FROM borrow_records
            WHERE book_id = ?
            ORDER BY id ASC
            "#,
        )
        .bind(book_id.value())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_row_to_borrow_record_view).collect()
    }

    /// Case-insensitive substring search, streamed row by row
    ///
    /// SQLite's `LOWER` and `LIKE` fold ASCII only, so rows are matched with
    /// `SearchCriteria::matches`.
    async fn search_books(&self, criteria: &SearchCriteria) -> Result<Vec<BookView>> {
        let books: Vec<BookView> =
            sqlx::query("SELECT id, title, author, is_available FROM books ORDER BY id ASC")
                .fetch(&self.pool)
                .map_err(|e| Box::new(e) as Box<dyn std::error::Error + Send + Sync>)
                .and_then(|row| future::ready(map_row_to_book_view(&row)))
                .try_filter(|book| future::ready(criteria.matches(book)))
                .boxed()
                .try_collect()
                .await?;

        Ok(books)
    }

    async fn library_stats(&self) -> Result<LibraryStats> {
        let row = sqlx::query(
            r#"
            SELECT
                (SELECT COUNT(*) FROM books) AS total_books,
                (SELECT COUNT(*) FROM books WHERE is_available = 1) AS available_books,
                (SELECT COUNT(*) FROM members) AS total_members,
                (SELECT COUNT(*) FROM borrow_records WHERE return_date IS NULL) AS active_borrowings
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(LibraryStats {
            total_books: row.try_get("total_books")?,
            available_books: row.try_get("available_books")?,
            total_members: row.try_get("total_members")?,
            active_borrowings: row.try_get("active_borrowings")?,
        })
    }
}

/// A unit of work over one SQLite transaction
///
/// Dropping it without calling `commit` rolls the transaction back.
pub struct StoreTransaction {
    tx: Transaction<'static, Sqlite>,
}

#[async_trait]
impl LibraryTransaction for StoreTransaction {
    async fn find_book_by_id(&mut self, book_id: BookId) -> Result<Option<BookView>> {
        let row = sqlx::query("SELECT id, title, author, is_available FROM books WHERE id = ?")
            .bind(book_id.value())
            .fetch_optional(&mut *self.tx)
            .await?;

        row.as_ref().map(map_row_to_book_view).transpose()
    }

    async fn find_member_by_id(&mut self, member_id: MemberId) -> Result<Option<MemberView>> {
        let row = sqlx::query("SELECT id, name FROM members WHERE id = ?")
            .bind(member_id.value())
            .fetch_optional(&mut *self.tx)
            .await?;

        row.as_ref().map(map_row_to_member_view).transpose()
    }

    /// Highest id wins if more than one open record matches
    async fn find_open_borrow_record(
        &mut self,
        book_id: BookId,
        member_id: MemberId,
    ) -> Result<Option<BorrowRecordView>> {
        let row = sqlx::query(
            r#"
            SELECT id, book_id, member_id, borrow_date, return_date
            FROM borrow_records
            WHERE book_id = ? AND member_id = ? AND return_date IS NULL
            ORDER BY id DESC
            LIMIT 1
            "#,
        )
        .bind(book_id.value())
        .bind(member_id.value())
        .fetch_optional(&mut *self.tx)
        .await?;

        row.as_ref().map(map_row_to_borrow_record_view).transpose()
    }

    async fn insert_borrow_record(
        &mut self,
        book_id: BookId,
        member_id: MemberId,
        borrowed_at: DateTime<Utc>,
    ) -> Result<BorrowRecordId> {
        let result = sqlx::query(
            r#"
            INSERT INTO borrow_records (book_id, member_id, borrow_date, return_date)
            VALUES (?, ?, ?, NULL)
            "#,
        )
        .bind(book_id.value())
        .bind(member_id.value())
        .bind(borrowed_at)
        .execute(&mut *self.tx)
        .await?;

        Ok(BorrowRecordId::from_i64(result.last_insert_rowid()))
    }

    async fn close_borrow_record(
        &mut self,
        record_id: BorrowRecordId,
        returned_at: DateTime<Utc>,
    ) -> Result<()> {
        let result = sqlx::query(
            "UPDATE borrow_records SET return_date = ? WHERE id = ? AND return_date IS NULL",
        )
        .bind(returned_at)
        .bind(record_id.value())
        .execute(&mut *self.tx)
        .await?;

        if result.rows_affected() != 1 {
            return Err(format!("borrow record {} is not open", record_id).into());
        }
        Ok(())
    }

    async fn set_book_availability(&mut self, book_id: BookId, is_available: bool) -> Result<()> {
        let result = sqlx::query("UPDATE books SET is_available = ? WHERE id = ?")
            .bind(i64::from(is_available))
            .bind(book_id.value())
            .execute(&mut *self.tx)
            .await?;

        if result.rows_affected() != 1 {
            return Err(format!("book {} does not exist", book_id).into());
        }
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        self.tx.commit().await?;
        Ok(())
    }
}
