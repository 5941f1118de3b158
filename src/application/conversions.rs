use crate::domain::{Book, BookId, BorrowRecord, Member, ValidationError};
use crate::ports::{BookView, BorrowRecordView, MemberView};

/// ストアの行データからエンティティを生成する
///
/// 生成時のバリデーションはここで一度だけ行われる。
pub(crate) fn book_from_view(view: BookView) -> Result<Book, ValidationError> {
    Book::new(view.book_id, view.title, view.author, view.is_available)
}

pub(crate) fn member_from_view(
    view: &MemberView,
    borrowed_books: impl IntoIterator<Item = BookId>,
) -> Result<Member, ValidationError> {
    Member::new(view.member_id, &view.name, borrowed_books)
}

pub(crate) fn borrow_record_from_view(
    view: BorrowRecordView,
) -> Result<BorrowRecord, ValidationError> {
    BorrowRecord::new(
        view.record_id,
        view.book_id,
        view.member_id,
        view.borrowed_at,
        view.returned_at,
    )
}
