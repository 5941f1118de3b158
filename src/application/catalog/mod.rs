mod catalog_service;

pub use catalog_service::{
    add_book, add_member, get_book_history, get_member, library_stats, list_books, search_books,
};
