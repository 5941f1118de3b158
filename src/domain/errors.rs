use thiserror::Error;

/// エンティティ生成時のバリデーションエラー
///
/// 不正な入力に対する契約違反であり、ストアのエラーとは区別する。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// 書籍タイトルが空
    #[error("Book title is required")]
    EmptyTitle,

    /// 著者名が空
    #[error("Book author is required")]
    EmptyAuthor,

    /// 会員名が空
    #[error("Member name cannot be empty")]
    EmptyMemberName,

    /// 会員名が短すぎる（トリム後2文字未満）
    #[error("Member name must be at least {min} characters")]
    MemberNameTooShort { min: usize },

    /// 書籍IDが正の値でない
    #[error("Invalid book ID: {0}")]
    InvalidBookId(i64),

    /// 会員IDが正の値でない
    #[error("Invalid member ID: {0}")]
    InvalidMemberId(i64),

    /// 貸出記録IDが正の値でない
    #[error("Invalid borrow record ID: {0}")]
    InvalidBorrowRecordId(i64),

    /// 返却日が貸出日より前
    #[error("Return date cannot be before borrow date")]
    ReturnBeforeBorrow,
}

/// 貸出ルール違反
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LendBookError {
    /// 書籍が貸出中
    #[error("book is already on loan")]
    Unavailable,
}

/// 返却ルール違反
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TakeBackBookError {
    /// 既に返却済み
    #[error("book has already been returned")]
    AlreadyReturned,

    /// 貸出記録が別の書籍を指している
    #[error("borrow record does not reference this book")]
    RecordMismatch,

    /// 返却日時が貸出日時より前
    #[error("return date cannot be before borrow date")]
    ReturnBeforeBorrow,
}
