use crate::domain::value_objects::{BookId, BorrowRecordId, MemberId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// 書籍の行データ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookView {
    pub book_id: BookId,
    pub title: String,
    pub author: String,
    pub is_available: bool,
}

/// 会員の行データ
///
/// 貸出中の書籍は保持しない（未返却の貸出記録から導出する）。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberView {
    pub member_id: MemberId,
    pub name: String,
}

/// 貸出記録の行データ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BorrowRecordView {
    pub record_id: BorrowRecordId,
    pub book_id: BookId,
    pub member_id: MemberId,
    pub borrowed_at: DateTime<Utc>,
    pub returned_at: Option<DateTime<Utc>>,
}

/// 書籍検索条件
///
/// 指定された項目ごとに大文字小文字を区別しない部分一致で絞り込む。
/// 両方指定した場合はAND。どちらも未指定なら全件。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchCriteria {
    pub title: Option<String>,
    pub author: Option<String>,
}

impl SearchCriteria {
    /// 書籍が条件に一致するか
    ///
    /// 大文字小文字の畳み込みは Unicode 準拠（"émile" は "Émile" に一致する）。
    pub fn matches(&self, book: &BookView) -> bool {
        fn contains_folded(haystack: &str, needle: Option<&str>) -> bool {
            needle.is_none_or(|n| haystack.to_lowercase().contains(&n.to_lowercase()))
        }

        contains_folded(&book.title, self.title.as_deref())
            && contains_folded(&book.author, self.author.as_deref())
    }
}

/// 蔵書統計
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LibraryStats {
    pub total_books: i64,
    pub available_books: i64,
    pub total_members: i64,
    pub active_borrowings: i64,
}

impl LibraryStats {
    pub fn borrowed_books(&self) -> i64 {
        self.total_books - self.available_books
    }
}

/// 蔵書ストアポート
///
/// books / members / borrow_records の3つの関係を扱う。
/// ビジネスロジックは持たない。
#[async_trait]
pub trait LibraryStore: Send + Sync {
    /// 原子的な作業単位を開始する
    ///
    /// 返されたトランザクション内の変更は `commit` するまで外部から見えない。
    /// commit せずに破棄した場合はすべてロールバックされる。
    async fn begin(&self) -> Result<Box<dyn LibraryTransaction>>;

    /// 書籍を登録する（貸出可能な状態で作成）
    async fn insert_book(&self, title: &str, author: &str) -> Result<BookId>;

    /// 会員を登録する
    async fn insert_member(&self, name: &str) -> Result<MemberId>;

    async fn find_book_by_id(&self, book_id: BookId) -> Result<Option<BookView>>;

    async fn find_member_by_id(&self, member_id: MemberId) -> Result<Option<MemberView>>;

    /// 会員が貸出中の書籍IDを取得する
    async fn find_open_book_ids_for_member(&self, member_id: MemberId) -> Result<Vec<BookId>>;

    /// 会員が貸出中の書籍を取得する（ID順）
    async fn find_books_on_loan_to(&self, member_id: MemberId) -> Result<Vec<BookView>>;

    /// 書籍の貸出記録を取得する（ID順）
    async fn find_borrow_records_for_book(
        &self,
        book_id: BookId,
    ) -> Result<Vec<BorrowRecordView>>;

    /// 書籍を検索する（ID順）
    async fn search_books(&self, criteria: &SearchCriteria) -> Result<Vec<BookView>>;

    async fn library_stats(&self) -> Result<LibraryStats>;
}

/// 原子的な作業単位
///
/// 貸出・返却の「貸出記録の書き込み」と「書籍の貸出可否の更新」は
/// 同じトランザクション内で行い、両方が反映されるか、どちらも反映されないかのいずれか。
/// 読み取りもトランザクション内で行い、検証と更新の間に状態が変わらないようにする。
#[async_trait]
pub trait LibraryTransaction: Send {
    async fn find_book_by_id(&mut self, book_id: BookId) -> Result<Option<BookView>>;

    async fn find_member_by_id(&mut self, member_id: MemberId) -> Result<Option<MemberView>>;

    /// 書籍と会員の組に対する未返却の貸出記録を検索する
    ///
    /// 複数存在する場合はIDが最大のもの（最後に作成されたもの）を返す。
    async fn find_open_borrow_record(
        &mut self,
        book_id: BookId,
        member_id: MemberId,
    ) -> Result<Option<BorrowRecordView>>;

    /// 未返却の貸出記録を挿入し、採番されたIDを返す
    async fn insert_borrow_record(
        &mut self,
        book_id: BookId,
        member_id: MemberId,
        borrowed_at: DateTime<Utc>,
    ) -> Result<BorrowRecordId>;

    /// 貸出記録に返却日時を設定する
    async fn close_borrow_record(
        &mut self,
        record_id: BorrowRecordId,
        returned_at: DateTime<Utc>,
    ) -> Result<()>;

    async fn set_book_availability(&mut self, book_id: BookId, is_available: bool) -> Result<()>;

    /// すべての変更を確定する
    async fn commit(self: Box<Self>) -> Result<()>;
}
