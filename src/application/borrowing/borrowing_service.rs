use crate::domain::{
    self, Book, BorrowRecord, LendBookError, TakeBackBookError, ValidationError, commands::*,
    value_objects::*,
};

use crate::application::{
    ServiceDependencies,
    conversions::{book_from_view, borrow_record_from_view, member_from_view},
    errors::{LibraryError, Result, store_error},
};

const BORROW_CONTEXT: &str = "Failed to borrow book";
const RETURN_CONTEXT: &str = "Failed to return book";
const MEMBER_BOOKS_CONTEXT: &str = "Failed to get member borrowed books";

/// 書籍を貸し出す
///
/// ビジネスルール：
/// - 書籍が存在すること
/// - 会員が存在すること
/// - 書籍が貸出可能であること
///
/// エラーの判定順は 書籍の存在 → 会員の存在 → 貸出可否。
/// 存在しない会員への貸出は、書籍が貸出中でも `MemberNotFound` になる。
///
/// # 一貫性保証
///
/// 検証から書き込みまでを1つのトランザクションで行う。
/// 貸出記録の挿入と書籍の貸出不可への更新は、両方反映されるか、
/// どちらも反映されないかのいずれか。
///
/// # 戻り値
/// 採番済みの未返却の貸出記録
#[tracing::instrument(skip_all, fields(book_id = %cmd.book_id, member_id = %cmd.member_id))]
pub async fn borrow_book(deps: &ServiceDependencies, cmd: BorrowBook) -> Result<BorrowRecord> {
    let mut tx = deps.store.begin().await.map_err(store_error(BORROW_CONTEXT))?;

    // 1. 書籍の存在確認
    let book_view = tx
        .find_book_by_id(cmd.book_id)
        .await
        .map_err(store_error(BORROW_CONTEXT))?
        .ok_or(LibraryError::BookNotFound {
            book_id: cmd.book_id,
        })?;
    let book = book_from_view(book_view)?;

    // 2. 会員の存在確認
    let member_view = tx
        .find_member_by_id(cmd.member_id)
        .await
        .map_err(store_error(BORROW_CONTEXT))?
        .ok_or(LibraryError::MemberNotFound {
            member_id: cmd.member_id,
        })?;
    let member = member_from_view(&member_view, [])?;

    // 3. ドメイン層の純粋関数を呼び出し（貸出可否の確認）
    let (lent_book, pending) = domain::lending::lend_book(&book, &member, cmd.borrowed_at)
        .map_err(|e| match e {
            LendBookError::Unavailable => {
                tracing::warn!("Book is already on loan");
                LibraryError::BookUnavailable {
                    book_id: book.id(),
                    title: book.title().to_string(),
                }
            }
        })?;

    // 4. 貸出記録の挿入と書籍の更新（同一トランザクション）
    let record_id = tx
        .insert_borrow_record(pending.book_id, pending.member_id, pending.borrowed_at)
        .await
        .map_err(store_error(BORROW_CONTEXT))?;

    tx.set_book_availability(lent_book.id(), lent_book.is_available())
        .await
        .map_err(store_error(BORROW_CONTEXT))?;

    let record = pending.assign(record_id)?;

    // 5. 確定
    tx.commit().await.map_err(store_error(BORROW_CONTEXT))?;

    tracing::info!(record_id = %record.id(), "Book borrowed");
    Ok(record)
}

/// 書籍を返却する
///
/// ビジネスルール：
/// - 書籍が存在すること
/// - 書籍と会員の組に未返却の貸出記録があること
///
/// 未返却の記録が複数ある場合（不変条件上は起こらない）は、
/// IDが最大の記録を返却する。
///
/// # 一貫性保証
///
/// 貸出記録への返却日時の設定と書籍の貸出可能への更新は
/// 同一トランザクションで行う。詳細は`borrow_book()`を参照。
///
/// # 戻り値
/// 返却済みになった貸出記録
#[tracing::instrument(skip_all, fields(book_id = %cmd.book_id, member_id = %cmd.member_id))]
pub async fn return_book(deps: &ServiceDependencies, cmd: ReturnBook) -> Result<BorrowRecord> {
    let mut tx = deps.store.begin().await.map_err(store_error(RETURN_CONTEXT))?;

    // 1. 書籍の存在確認
    let book_view = tx
        .find_book_by_id(cmd.book_id)
        .await
        .map_err(store_error(RETURN_CONTEXT))?
        .ok_or(LibraryError::BookNotFound {
            book_id: cmd.book_id,
        })?;
    let book = book_from_view(book_view)?;

    // 2. 未返却の貸出記録を検索
    let not_borrowed = LibraryError::BookNotBorrowed {
        book_id: cmd.book_id,
        member_id: cmd.member_id,
    };
    let record_view = match tx
        .find_open_borrow_record(cmd.book_id, cmd.member_id)
        .await
        .map_err(store_error(RETURN_CONTEXT))?
    {
        Some(view) => view,
        None => {
            tracing::warn!("No open borrow record for this book and member");
            return Err(not_borrowed);
        }
    };
    let record = borrow_record_from_view(record_view)?;

    // 3. ドメイン層の純粋関数を呼び出し
    let (returned_book, closed) = domain::lending::take_back_book(&book, &record, cmd.returned_at)
        .map_err(|e| match e {
            TakeBackBookError::AlreadyReturned | TakeBackBookError::RecordMismatch => not_borrowed,
            TakeBackBookError::ReturnBeforeBorrow => {
                LibraryError::Validation(ValidationError::ReturnBeforeBorrow)
            }
        })?;

    // 4. 返却日時の設定と書籍の更新（同一トランザクション）
    tx.close_borrow_record(closed.id(), cmd.returned_at)
        .await
        .map_err(store_error(RETURN_CONTEXT))?;

    tx.set_book_availability(returned_book.id(), returned_book.is_available())
        .await
        .map_err(store_error(RETURN_CONTEXT))?;

    // 5. 確定
    tx.commit().await.map_err(store_error(RETURN_CONTEXT))?;

    tracing::info!(record_id = %closed.id(), "Book returned");
    Ok(closed)
}

/// 会員が貸出中の書籍を取得する
///
/// 未返却の貸出記録と書籍を結合して導出する（ID順）。
/// 返却済みの記録に対応する書籍は含まない。
#[tracing::instrument(skip_all, fields(member_id = %member_id))]
pub async fn get_member_borrowed_books(
    deps: &ServiceDependencies,
    member_id: MemberId,
) -> Result<Vec<Book>> {
    // 1. 会員の存在確認
    deps.store
        .find_member_by_id(member_id)
        .await
        .map_err(store_error(MEMBER_BOOKS_CONTEXT))?
        .ok_or(LibraryError::MemberNotFound { member_id })?;

    // 2. 貸出中の書籍を取得
    let views = deps
        .store
        .find_books_on_loan_to(member_id)
        .await
        .map_err(store_error(MEMBER_BOOKS_CONTEXT))?;

    let books = views
        .into_iter()
        .map(book_from_view)
        .collect::<std::result::Result<Vec<_>, _>>()?;

    tracing::debug!(count = books.len(), "Loaded member borrowed books");
    Ok(books)
}
