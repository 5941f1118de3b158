#![allow(dead_code)]

use rusty_library::adapters::sqlite::SqliteLibraryStore;
use rusty_library::application::ServiceDependencies;
use rusty_library::ports::{LibraryStore, SearchCriteria};
use std::sync::Arc;

/// マイグレーション済みのインメモリSQLiteストアを作成
///
/// テストごとに独立したデータベースになる。
pub async fn create_test_store() -> Arc<SqliteLibraryStore> {
    let store = SqliteLibraryStore::connect("sqlite::memory:", 1)
        .await
        .expect("Failed to open in-memory database");
    Arc::new(store)
}

pub fn deps_for(store: Arc<dyn LibraryStore>) -> ServiceDependencies {
    ServiceDependencies::new(store)
}

/// 可用性の不変条件を検証する
///
/// すべての書籍について is_available == false ⇔ 未返却の貸出記録が存在する
pub async fn assert_availability_invariant(store: &dyn LibraryStore) {
    let books = store
        .search_books(&SearchCriteria::default())
        .await
        .expect("Failed to list books");

    for book in books {
        let records = store
            .find_borrow_records_for_book(book.book_id)
            .await
            .expect("Failed to load borrow records");
        let has_open = records.iter().any(|r| r.returned_at.is_none());
        assert_eq!(
            book.is_available, !has_open,
            "availability of book {} disagrees with its borrow records",
            book.book_id
        );
    }
}
