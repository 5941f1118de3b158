use crate::domain::{BookId, MemberId, ValidationError};
use thiserror::Error;

/// 蔵書管理アプリケーション層のエラー
///
/// ワークフローはすべての失敗をこの型で返し、プロセスの終了や出力は行わない。
/// エンティティのバリデーションエラーは `Validation` としてそのまま運び、
/// ストアのエラーに読み替えない。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LibraryError {
    /// 書籍が存在しない
    #[error("Book with ID {book_id} not found")]
    BookNotFound { book_id: BookId },

    /// 会員が存在しない
    #[error("Member with ID {member_id} not found")]
    MemberNotFound { member_id: MemberId },

    /// 書籍が貸出中
    #[error("Book \"{title}\" (ID: {book_id}) is not available")]
    BookUnavailable { book_id: BookId, title: String },

    /// 書籍と会員の組に未返却の貸出記録がない
    #[error("Book {book_id} is not borrowed by member {member_id}")]
    BookNotBorrowed { book_id: BookId, member_id: MemberId },

    /// ストア操作の失敗（I/O、制約違反、接続断など）
    #[error("Database error: {message}")]
    DatabaseError { message: String },

    /// エンティティ生成時のバリデーションエラー
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// アプリケーション層の Result型
pub type Result<T> = std::result::Result<T, LibraryError>;

/// ストアのエラーを操作名付きの `DatabaseError` に変換するクロージャを返す
pub(crate) fn store_error(
    context: &'static str,
) -> impl FnOnce(Box<dyn std::error::Error + Send + Sync>) -> LibraryError {
    move |err| {
        tracing::error!("{}: {}", context, err);
        LibraryError::DatabaseError {
            message: format!("{}: {}", context, err),
        }
    }
}
