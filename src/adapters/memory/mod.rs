pub mod library_store;

pub use library_store::{FailPoint, LibraryStore as InMemoryLibraryStore};
