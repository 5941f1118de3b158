use serde::Serialize;

use super::{BookId, ValidationError};

/// 書籍エンティティ
///
/// 不変条件：
/// - タイトル・著者は空でない（生成時に検証）
/// - is_available が false ⇔ 未返却の貸出記録が存在する
///
/// 貸出可否の切り替えは貸出ワークフロー（`lending`）だけが行う。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Book {
    id: BookId,
    title: String,
    author: String,
    is_available: bool,
}

impl Book {
    pub fn new(
        id: BookId,
        title: impl Into<String>,
        author: impl Into<String>,
        is_available: bool,
    ) -> Result<Self, ValidationError> {
        let title = title.into();
        let author = author.into();
        validate_book_details(&title, &author)?;

        Ok(Self {
            id,
            title,
            author,
            is_available,
        })
    }

    pub fn id(&self) -> BookId {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn author(&self) -> &str {
        &self.author
    }

    pub fn is_available(&self) -> bool {
        self.is_available
    }

    pub(super) fn with_availability(self, is_available: bool) -> Self {
        Self {
            is_available,
            ..self
        }
    }
}

/// タイトルと著者を検証する
pub fn validate_book_details(title: &str, author: &str) -> Result<(), ValidationError> {
    if title.trim().is_empty() {
        return Err(ValidationError::EmptyTitle);
    }
    if author.trim().is_empty() {
        return Err(ValidationError::EmptyAuthor);
    }
    Ok(())
}
