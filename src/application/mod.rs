pub mod borrowing;
pub mod catalog;
mod conversions;
mod errors;

pub use errors::{LibraryError, Result};

use crate::ports::LibraryStore;
use std::sync::Arc;

/// サービスの依存関係
///
/// ストアへのハンドルを明示的に渡す（グローバルな接続は持たない）。
/// テストごとに独立したストアを渡せる。
#[derive(Clone)]
pub struct ServiceDependencies {
    pub store: Arc<dyn LibraryStore>,
}

impl ServiceDependencies {
    pub fn new(store: Arc<dyn LibraryStore>) -> Self {
        Self { store }
    }
}
