use chrono::{DateTime, Utc};

use super::{Book, BorrowRecord, LendBookError, Member, NewBorrowRecord, TakeBackBookError};

/// 純粋関数：書籍を貸し出す
///
/// ビジネスルール：
/// - 貸出可能な書籍のみ貸し出せる
/// - 貸出後の書籍は貸出不可になる
///
/// 副作用なし。貸出不可にした書籍と採番前の貸出記録を返す。
pub fn lend_book(
    book: &Book,
    member: &Member,
    borrowed_at: DateTime<Utc>,
) -> Result<(Book, NewBorrowRecord), LendBookError> {
    if !book.is_available() {
        return Err(LendBookError::Unavailable);
    }

    let record = NewBorrowRecord {
        book_id: book.id(),
        member_id: member.id(),
        borrowed_at,
    };

    Ok((book.clone().with_availability(false), record))
}

/// 純粋関数：書籍を返却する
///
/// ビジネスルール：
/// - 未返却の記録のみ返却できる
/// - 返却日時は貸出日時以降
/// - 返却後の書籍は貸出可能になる
///
/// 副作用なし。貸出可能にした書籍と返却済みの貸出記録を返す。
pub fn take_back_book(
    book: &Book,
    record: &BorrowRecord,
    returned_at: DateTime<Utc>,
) -> Result<(Book, BorrowRecord), TakeBackBookError> {
    if record.book_id() != book.id() {
        return Err(TakeBackBookError::RecordMismatch);
    }

    let closed = record.close(returned_at)?;

    Ok((book.clone().with_availability(true), closed))
}
