use crate::domain::{
    Book, BorrowRecord, Member, book::validate_book_details, commands::*,
    member::validate_member_name, value_objects::*,
};
use crate::ports::{LibraryStats, SearchCriteria};

use crate::application::{
    ServiceDependencies,
    conversions::{book_from_view, borrow_record_from_view, member_from_view},
    errors::{LibraryError, Result, store_error},
};

/// 書籍を登録する
///
/// 登録直後の書籍は貸出可能。
#[tracing::instrument(skip_all)]
pub async fn add_book(deps: &ServiceDependencies, cmd: AddBook) -> Result<Book> {
    validate_book_details(&cmd.title, &cmd.author)?;

    let book_id = deps
        .store
        .insert_book(&cmd.title, &cmd.author)
        .await
        .map_err(store_error("Failed to add book"))?;

    tracing::info!(book_id = %book_id, "Book added");
    Ok(Book::new(book_id, cmd.title, cmd.author, true)?)
}

/// 会員を登録する
///
/// 名前はトリムして保存する。
#[tracing::instrument(skip_all)]
pub async fn add_member(deps: &ServiceDependencies, cmd: AddMember) -> Result<Member> {
    let name = validate_member_name(&cmd.name)?;

    let member_id = deps
        .store
        .insert_member(&name)
        .await
        .map_err(store_error("Failed to add member"))?;

    tracing::info!(member_id = %member_id, "Member added");
    Ok(Member::new(member_id, &name, [])?)
}

/// 会員を取得する
///
/// 貸出中の書籍IDは未返却の貸出記録から導出する。
#[tracing::instrument(skip_all, fields(member_id = %member_id))]
pub async fn get_member(deps: &ServiceDependencies, member_id: MemberId) -> Result<Member> {
    let view = deps
        .store
        .find_member_by_id(member_id)
        .await
        .map_err(store_error("Failed to get member"))?
        .ok_or(LibraryError::MemberNotFound { member_id })?;

    let borrowed_books = deps
        .store
        .find_open_book_ids_for_member(member_id)
        .await
        .map_err(store_error("Failed to get member"))?;

    Ok(member_from_view(&view, borrowed_books)?)
}

/// 書籍を検索する（ID順）
///
/// タイトル・著者の大文字小文字を区別しない部分一致。条件なしなら全件。
#[tracing::instrument(skip_all)]
pub async fn search_books(
    deps: &ServiceDependencies,
    criteria: SearchCriteria,
) -> Result<Vec<Book>> {
    let views = deps
        .store
        .search_books(&criteria)
        .await
        .map_err(store_error("Failed to search books"))?;

    let books = views
        .into_iter()
        .map(book_from_view)
        .collect::<std::result::Result<Vec<_>, _>>()?;

    tracing::debug!(count = books.len(), "Books found");
    Ok(books)
}

/// 全書籍を取得する（ID順）
pub async fn list_books(deps: &ServiceDependencies) -> Result<Vec<Book>> {
    search_books(deps, SearchCriteria::default()).await
}

/// 書籍の貸出履歴を取得する（ID順）
#[tracing::instrument(skip_all, fields(book_id = %book_id))]
pub async fn get_book_history(
    deps: &ServiceDependencies,
    book_id: BookId,
) -> Result<Vec<BorrowRecord>> {
    deps.store
        .find_book_by_id(book_id)
        .await
        .map_err(store_error("Failed to get book history"))?
        .ok_or(LibraryError::BookNotFound { book_id })?;

    let views = deps
        .store
        .find_borrow_records_for_book(book_id)
        .await
        .map_err(store_error("Failed to get book history"))?;

    Ok(views
        .into_iter()
        .map(borrow_record_from_view)
        .collect::<std::result::Result<Vec<_>, _>>()?)
}

/// 蔵書統計を取得する
pub async fn library_stats(deps: &ServiceDependencies) -> Result<LibraryStats> {
    deps.store
        .library_stats()
        .await
        .map_err(store_error("Failed to get library stats"))
}
