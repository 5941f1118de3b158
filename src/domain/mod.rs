pub mod book;
pub mod borrow_record;
pub mod commands;
pub mod errors;
pub mod lending;
pub mod member;
pub mod value_objects;

pub use book::Book;
pub use borrow_record::{BorrowRecord, NewBorrowRecord};
pub use errors::*;
pub use member::Member;
pub use value_objects::*;
