mod borrowing_service;

pub use borrowing_service::{borrow_book, get_member_borrowed_books, return_book};
