mod common;

use chrono::Utc;
use rusty_library::adapters::memory::InMemoryLibraryStore;
use rusty_library::application::{LibraryError, ServiceDependencies, borrowing, catalog};
use rusty_library::domain::{ValidationError, commands::*, value_objects::*};
use rusty_library::ports::{LibraryStore, SearchCriteria};
use std::sync::Arc;

async fn seed_catalog(deps: &ServiceDependencies) {
    for (title, author) in [
        ("The Great Gatsby", "F. Scott Fitzgerald"),
        ("1984", "George Orwell"),
        ("Animal Farm", "George Orwell"),
        ("Great Expectations", "Charles Dickens"),
        ("100% Pure", "Anon"),
    ] {
        catalog::add_book(
            deps,
            AddBook {
                title: title.to_string(),
                author: author.to_string(),
            },
        )
        .await
        .unwrap();
    }
}

fn criteria(title: Option<&str>, author: Option<&str>) -> SearchCriteria {
    SearchCriteria {
        title: title.map(str::to_string),
        author: author.map(str::to_string),
    }
}

async fn titles(deps: &ServiceDependencies, criteria: SearchCriteria) -> Vec<String> {
    catalog::search_books(deps, criteria)
        .await
        .unwrap()
        .iter()
        .map(|b| b.title().to_string())
        .collect()
}

#[tokio::test]
async fn test_borrow_and_return_workflow() {
    let store = common::create_test_store().await;
    let deps = common::deps_for(store.clone());

    let book = catalog::add_book(
        &deps,
        AddBook {
            title: "Dune".to_string(),
            author: "Frank Herbert".to_string(),
        },
    )
    .await
    .unwrap();
    let member = catalog::add_member(
        &deps,
        AddMember {
            name: "Ada".to_string(),
        },
    )
    .await
    .unwrap();
    assert_eq!(book.id(), BookId::from_i64(1));
    assert_eq!(member.id(), MemberId::from_i64(1));

    let record = borrowing::borrow_book(
        &deps,
        BorrowBook {
            book_id: book.id(),
            member_id: member.id(),
            borrowed_at: Utc::now(),
        },
    )
    .await
    .unwrap();
    assert!(record.id().is_assigned());

    let loaned = store.find_book_by_id(book.id()).await.unwrap().unwrap();
    assert!(!loaned.is_available);

    let result = borrowing::borrow_book(
        &deps,
        BorrowBook {
            book_id: book.id(),
            member_id: MemberId::from_i64(2),
            borrowed_at: Utc::now(),
        },
    )
    .await;
    assert!(matches!(result, Err(LibraryError::MemberNotFound { .. })));

    let on_loan = borrowing::get_member_borrowed_books(&deps, member.id())
        .await
        .unwrap();
    assert_eq!(on_loan.len(), 1);
    assert_eq!(on_loan[0].title(), "Dune");

    let returned = borrowing::return_book(
        &deps,
        ReturnBook {
            book_id: book.id(),
            member_id: member.id(),
            returned_at: Utc::now(),
        },
    )
    .await
    .unwrap();
    assert_eq!(returned.id(), record.id());
    assert!(returned.is_returned());

    let result = borrowing::return_book(
        &deps,
        ReturnBook {
            book_id: book.id(),
            member_id: member.id(),
            returned_at: Utc::now(),
        },
    )
    .await;
    assert_eq!(
        result.unwrap_err(),
        LibraryError::BookNotBorrowed {
            book_id: book.id(),
            member_id: member.id()
        }
    );

    let history = catalog::get_book_history(&deps, book.id()).await.unwrap();
    assert_eq!(history.len(), 1);
    assert!(history[0].returned_at().unwrap() >= history[0].borrowed_at());

    common::assert_availability_invariant(store.as_ref()).await;
}

#[tokio::test]
async fn test_search_by_title_is_case_insensitive() {
    let store = common::create_test_store().await;
    let deps = common::deps_for(store);
    seed_catalog(&deps).await;

    let found = titles(&deps, criteria(Some("great"), None)).await;

    assert_eq!(found, vec!["The Great Gatsby", "Great Expectations"]);
}

#[tokio::test]
async fn test_search_folds_non_ascii_case_like_memory_store() {
    let sqlite = common::create_test_store().await;
    let memory = Arc::new(InMemoryLibraryStore::new());

    for deps in [common::deps_for(sqlite), common::deps_for(memory)] {
        for (title, author) in [("Émile", "Jean-Jacques Rousseau"), ("Ödön", "Ärzte")] {
            catalog::add_book(
                &deps,
                AddBook {
                    title: title.to_string(),
                    author: author.to_string(),
                },
            )
            .await
            .unwrap();
        }

        assert_eq!(titles(&deps, criteria(Some("Émile"), None)).await, vec!["Émile"]);
        assert_eq!(titles(&deps, criteria(Some("émile"), None)).await, vec!["Émile"]);
        assert_eq!(titles(&deps, criteria(Some("ÉMILE"), None)).await, vec!["Émile"]);
        assert_eq!(titles(&deps, criteria(None, Some("ärzte"))).await, vec!["Ödön"]);
    }
}

#[tokio::test]
async fn test_search_by_author() {
    let store = common::create_test_store().await;
    let deps = common::deps_for(store);
    seed_catalog(&deps).await;

    let found = titles(&deps, criteria(None, Some("ORWELL"))).await;

    assert_eq!(found, vec!["1984", "Animal Farm"]);
}

#[tokio::test]
async fn test_search_with_both_criteria_requires_both() {
    let store = common::create_test_store().await;
    let deps = common::deps_for(store);
    seed_catalog(&deps).await;

    let found = titles(&deps, criteria(Some("farm"), Some("orwell"))).await;
    assert_eq!(found, vec!["Animal Farm"]);

    let found = titles(&deps, criteria(Some("gatsby"), Some("orwell"))).await;
    assert!(found.is_empty());
}

#[tokio::test]
async fn test_search_without_criteria_returns_all_books() {
    let store = common::create_test_store().await;
    let deps = common::deps_for(store);
    seed_catalog(&deps).await;

    let books = catalog::list_books(&deps).await.unwrap();

    let ids: Vec<i64> = books.iter().map(|b| b.id().value()).collect();
    assert_eq!(ids, vec![1, 2, 3, 4, 5]);
}

#[tokio::test]
async fn test_search_treats_wildcards_literally() {
    let store = common::create_test_store().await;
    let deps = common::deps_for(store);
    seed_catalog(&deps).await;

    assert_eq!(titles(&deps, criteria(Some("%"), None)).await, vec!["100% Pure"]);
    assert!(titles(&deps, criteria(Some("_"), None)).await.is_empty());
    assert!(titles(&deps, criteria(Some("nothing like this"), None)).await.is_empty());
}

#[tokio::test]
async fn test_stats_and_member_view() {
    let store = common::create_test_store().await;
    let deps = common::deps_for(store);
    seed_catalog(&deps).await;
    let member = catalog::add_member(
        &deps,
        AddMember {
            name: "Grace Hopper".to_string(),
        },
    )
    .await
    .unwrap();

    for book_id in [2, 3] {
        borrowing::borrow_book(
            &deps,
            BorrowBook {
                book_id: BookId::from_i64(book_id),
                member_id: member.id(),
                borrowed_at: Utc::now(),
            },
        )
        .await
        .unwrap();
    }

    let stats = catalog::library_stats(&deps).await.unwrap();
    assert_eq!(stats.total_books, 5);
    assert_eq!(stats.available_books, 3);
    assert_eq!(stats.borrowed_books(), 2);
    assert_eq!(stats.total_members, 1);
    assert_eq!(stats.active_borrowings, 2);

    let member = catalog::get_member(&deps, member.id()).await.unwrap();
    assert_eq!(
        member.borrowed_books(),
        vec![BookId::from_i64(2), BookId::from_i64(3)]
    );
}

#[tokio::test]
async fn test_unavailable_book_is_rejected() {
    let store = common::create_test_store().await;
    let deps = common::deps_for(store.clone());
    seed_catalog(&deps).await;
    let ada = catalog::add_member(
        &deps,
        AddMember {
            name: "Ada".to_string(),
        },
    )
    .await
    .unwrap();

    let borrow = || BorrowBook {
        book_id: BookId::from_i64(2),
        member_id: ada.id(),
        borrowed_at: Utc::now(),
    };
    borrowing::borrow_book(&deps, borrow()).await.unwrap();

    let result = borrowing::borrow_book(&deps, borrow()).await;

    assert_eq!(
        result.unwrap_err(),
        LibraryError::BookUnavailable {
            book_id: BookId::from_i64(2),
            title: "1984".to_string()
        }
    );
    let history = catalog::get_book_history(&deps, BookId::from_i64(2))
        .await
        .unwrap();
    assert_eq!(history.len(), 1);
    common::assert_availability_invariant(store.as_ref()).await;
}

#[tokio::test]
async fn test_invalid_stored_row_is_a_validation_error() {
    let store = common::create_test_store().await;
    sqlx::query("INSERT INTO books (title, author, is_available) VALUES ('', 'Nobody', 1)")
        .execute(store.pool())
        .await
        .unwrap();
    let deps = common::deps_for(store);

    let result = catalog::list_books(&deps).await;

    assert_eq!(
        result.unwrap_err(),
        LibraryError::Validation(ValidationError::EmptyTitle)
    );
}

#[tokio::test]
async fn test_file_database_persists_between_connections() {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite://{}", dir.path().join("library.db").display());

    {
        let store = rusty_library::adapters::sqlite::SqliteLibraryStore::connect(&url, 2)
            .await
            .unwrap();
        let deps = ServiceDependencies::new(Arc::new(store));
        seed_catalog(&deps).await;
    }

    let store = rusty_library::adapters::sqlite::SqliteLibraryStore::connect(&url, 2)
        .await
        .unwrap();
    let stats = store.library_stats().await.unwrap();
    assert_eq!(stats.total_books, 5);
    assert_eq!(stats.available_books, 5);
}
