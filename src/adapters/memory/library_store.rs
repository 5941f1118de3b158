use crate::domain::value_objects::{BookId, BorrowRecordId, MemberId};
use crate::ports::library_store::{
    BookView, BorrowRecordView, LibraryStats, LibraryStore as LibraryStoreTrait,
    LibraryTransaction, MemberView, Result, SearchCriteria,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex};

/// Store operations that can be made to fail for testing purposes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailPoint {
    InsertBorrowRecord,
    CloseBorrowRecord,
    SetBookAvailability,
    Commit,
}

#[derive(Debug, Clone, Default)]
struct Tables {
    books: BTreeMap<BookId, BookView>,
    members: BTreeMap<MemberId, MemberView>,
    borrow_records: BTreeMap<BorrowRecordId, BorrowRecordView>,
    last_book_id: i64,
    last_member_id: i64,
    last_borrow_record_id: i64,
}

impl Tables {
    fn open_records_for_member(
        &self,
        member_id: MemberId,
    ) -> impl Iterator<Item = &BorrowRecordView> + '_ {
        self.borrow_records
            .values()
            .filter(move |r| r.member_id == member_id && r.returned_at.is_none())
    }
}

/// In-memory implementation of LibraryStore
///
/// Each instance is an isolated database. Transactions work on a private copy
/// of the tables and publish it on commit, so a dropped or failed
/// transaction leaves no trace.
#[derive(Default)]
pub struct LibraryStore {
    tables: Arc<Mutex<Tables>>,
    fail_points: Arc<Mutex<HashSet<FailPoint>>>,
}

impl LibraryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call of `point` fail for testing purposes
    pub fn fail_on(&self, point: FailPoint) {
        self.fail_points.lock().unwrap().insert(point);
    }

    /// Stop injecting failures
    pub fn clear_failures(&self) {
        self.fail_points.lock().unwrap().clear();
    }

    /// All borrow records in id order
    pub fn borrow_records(&self) -> Vec<BorrowRecordView> {
        self.tables
            .lock()
            .unwrap()
            .borrow_records
            .values()
            .cloned()
            .collect()
    }

    /// Insert a raw borrow record, bypassing the workflow
    ///
    /// Used to set up states the workflow itself never produces.
    pub fn seed_borrow_record(
        &self,
        book_id: BookId,
        member_id: MemberId,
        borrowed_at: DateTime<Utc>,
    ) -> BorrowRecordId {
        let mut tables = self.tables.lock().unwrap();
        tables.last_borrow_record_id += 1;
        let record_id = BorrowRecordId::from_i64(tables.last_borrow_record_id);
        tables.borrow_records.insert(
            record_id,
            BorrowRecordView {
                record_id,
                book_id,
                member_id,
                borrowed_at,
                returned_at: None,
            },
        );
        record_id
    }
}

#[async_trait]
impl LibraryStoreTrait for LibraryStore {
    async fn begin(&self) -> Result<Box<dyn LibraryTransaction>> {
        let working = self.tables.lock().unwrap().clone();
        Ok(Box::new(Transaction {
            shared: Arc::clone(&self.tables),
            fail_points: Arc::clone(&self.fail_points),
            working,
        }))
    }

    async fn insert_book(&self, title: &str, author: &str) -> Result<BookId> {
        let mut tables = self.tables.lock().unwrap();
        tables.last_book_id += 1;
        let book_id = BookId::from_i64(tables.last_book_id);
        tables.books.insert(
            book_id,
            BookView {
                book_id,
                title: title.to_string(),
                author: author.to_string(),
                is_available: true,
            },
        );
        Ok(book_id)
    }

    async fn insert_member(&self, name: &str) -> Result<MemberId> {
        let mut tables = self.tables.lock().unwrap();
        tables.last_member_id += 1;
        let member_id = MemberId::from_i64(tables.last_member_id);
        tables.members.insert(
            member_id,
            MemberView {
                member_id,
                name: name.to_string(),
            },
        );
        Ok(member_id)
    }

    async fn find_book_by_id(&self, book_id: BookId) -> Result<Option<BookView>> {
        Ok(self.tables.lock().unwrap().books.get(&book_id).cloned())
    }

    async fn find_member_by_id(&self, member_id: MemberId) -> Result<Option<MemberView>> {
        Ok(self.tables.lock().unwrap().members.get(&member_id).cloned())
    }

    async fn find_open_book_ids_for_member(&self, member_id: MemberId) -> Result<Vec<BookId>> {
        let tables = self.tables.lock().unwrap();
        let mut ids: Vec<BookId> = tables
            .open_records_for_member(member_id)
            .map(|r| r.book_id)
            .collect();
        ids.sort();
        Ok(ids)
    }

    async fn find_books_on_loan_to(&self, member_id: MemberId) -> Result<Vec<BookView>> {
        let tables = self.tables.lock().unwrap();
        let ids: HashSet<BookId> = tables
            .open_records_for_member(member_id)
            .map(|r| r.book_id)
            .collect();
        Ok(tables
            .books
            .values()
            .filter(|b| ids.contains(&b.book_id))
            .cloned()
            .collect())
    }

    async fn find_borrow_records_for_book(
        &self,
        book_id: BookId,
    ) -> Result<Vec<BorrowRecordView>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .borrow_records
            .values()
            .filter(|r| r.book_id == book_id)
            .cloned()
            .collect())
    }

    async fn search_books(&self, criteria: &SearchCriteria) -> Result<Vec<BookView>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .books
            .values()
            .filter(|b| criteria.matches(b))
            .cloned()
            .collect())
    }

    async fn library_stats(&self) -> Result<LibraryStats> {
        let tables = self.tables.lock().unwrap();
        Ok(LibraryStats {
            total_books: tables.books.len() as i64,
            available_books: tables.books.values().filter(|b| b.is_available).count() as i64,
            total_members: tables.members.len() as i64,
            active_borrowings: tables
                .borrow_records
                .values()
                .filter(|r| r.returned_at.is_none())
                .count() as i64,
        })
    }
}

/// Copy-on-commit transaction over the in-memory tables
pub struct Transaction {
    shared: Arc<Mutex<Tables>>,
    fail_points: Arc<Mutex<HashSet<FailPoint>>>,
    working: Tables,
}

impl Transaction {
    fn check(&self, point: FailPoint) -> Result<()> {
        if self.fail_points.lock().unwrap().contains(&point) {
            return Err(format!("injected failure at {:?}", point).into());
        }
        Ok(())
    }
}

#[async_trait]
impl LibraryTransaction for Transaction {
    async fn find_book_by_id(&mut self, book_id: BookId) -> Result<Option<BookView>> {
        Ok(self.working.books.get(&book_id).cloned())
    }

    async fn find_member_by_id(&mut self, member_id: MemberId) -> Result<Option<MemberView>> {
        Ok(self.working.members.get(&member_id).cloned())
    }

    async fn find_open_borrow_record(
        &mut self,
        book_id: BookId,
        member_id: MemberId,
    ) -> Result<Option<BorrowRecordView>> {
        // Highest id wins if more than one open record matches
        Ok(self
            .working
            .borrow_records
            .values()
            .rev()
            .find(|r| r.book_id == book_id && r.member_id == member_id && r.returned_at.is_none())
            .cloned())
    }

    async fn insert_borrow_record(
        &mut self,
        book_id: BookId,
        member_id: MemberId,
        borrowed_at: DateTime<Utc>,
    ) -> Result<BorrowRecordId> {
        self.check(FailPoint::InsertBorrowRecord)?;

        if !self.working.books.contains_key(&book_id) {
            return Err(format!("book {} does not exist", book_id).into());
        }
        if !self.working.members.contains_key(&member_id) {
            return Err(format!("member {} does not exist", member_id).into());
        }

        self.working.last_borrow_record_id += 1;
        let record_id = BorrowRecordId::from_i64(self.working.last_borrow_record_id);
        self.working.borrow_records.insert(
            record_id,
            BorrowRecordView {
                record_id,
                book_id,
                member_id,
                borrowed_at,
                returned_at: None,
            },
        );
        Ok(record_id)
    }

    async fn close_borrow_record(
        &mut self,
        record_id: BorrowRecordId,
        returned_at: DateTime<Utc>,
    ) -> Result<()> {
        self.check(FailPoint::CloseBorrowRecord)?;

        match self.working.borrow_records.get_mut(&record_id) {
            Some(record) if record.returned_at.is_none() => {
                record.returned_at = Some(returned_at);
                Ok(())
            }
            _ => Err(format!("borrow record {} is not open", record_id).into()),
        }
    }

    async fn set_book_availability(&mut self, book_id: BookId, is_available: bool) -> Result<()> {
        self.check(FailPoint::SetBookAvailability)?;

        match self.working.books.get_mut(&book_id) {
            Some(book) => {
                book.is_available = is_available;
                Ok(())
            }
            None => Err(format!("book {} does not exist", book_id).into()),
        }
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        self.check(FailPoint::Commit)?;

        let Transaction { shared, working, .. } = *self;
        *shared.lock().unwrap() = working;
        Ok(())
    }
}
