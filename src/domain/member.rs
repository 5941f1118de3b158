use serde::Serialize;
use std::collections::BTreeSet;

use super::{BookId, MemberId, ValidationError};

/// 会員名の最小文字数（トリム後）
pub const MIN_MEMBER_NAME_LEN: usize = 2;

/// 会員エンティティ
///
/// `borrowed_books` は未返却の貸出記録から読み取り時に導出するビューであり、
/// 永続化はしない。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Member {
    id: MemberId,
    name: String,
    borrowed_books: BTreeSet<BookId>,
}

impl Member {
    /// 会員を生成する
    ///
    /// 名前は前後の空白を取り除いて保持する。
    pub fn new(
        id: MemberId,
        name: &str,
        borrowed_books: impl IntoIterator<Item = BookId>,
    ) -> Result<Self, ValidationError> {
        let name = validate_member_name(name)?;

        Ok(Self {
            id,
            name,
            borrowed_books: borrowed_books.into_iter().collect(),
        })
    }

    pub fn id(&self) -> MemberId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// 貸出中の書籍ID（ID昇順）
    pub fn borrowed_books(&self) -> Vec<BookId> {
        self.borrowed_books.iter().copied().collect()
    }

    pub fn borrowed_books_count(&self) -> usize {
        self.borrowed_books.len()
    }

    pub fn has_book(&self, book_id: BookId) -> bool {
        self.borrowed_books.contains(&book_id)
    }
}

/// 会員名を検証し、トリム済みの名前を返す
pub fn validate_member_name(name: &str) -> Result<String, ValidationError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyMemberName);
    }
    if trimmed.chars().count() < MIN_MEMBER_NAME_LEN {
        return Err(ValidationError::MemberNameTooShort {
            min: MIN_MEMBER_NAME_LEN,
        });
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_member_name_is_trimmed() {
        let member = Member::new(MemberId::from_i64(1), "  Ada  ", []).unwrap();
        assert_eq!(member.name(), "Ada");
        assert_eq!(member.borrowed_books_count(), 0);
    }

    #[test]
    fn test_member_rejects_blank_name() {
        let result = Member::new(MemberId::from_i64(1), "   ", []);
        assert_eq!(result.unwrap_err(), ValidationError::EmptyMemberName);
    }

    #[test]
    fn test_member_rejects_single_character_name() {
        let result = Member::new(MemberId::from_i64(1), " A ", []);
        assert_eq!(
            result.unwrap_err(),
            ValidationError::MemberNameTooShort { min: 2 }
        );
    }

    #[test]
    fn test_member_name_length_counts_characters() {
        // マルチバイト文字2文字は有効
        assert!(Member::new(MemberId::from_i64(1), "太郎", []).is_ok());
    }

    #[test]
    fn test_borrowed_books_are_deduplicated_and_sorted() {
        let ids = [3, 1, 3, 2].map(BookId::from_i64);
        let member = Member::new(MemberId::from_i64(1), "Ada", ids).unwrap();

        assert_eq!(
            member.borrowed_books(),
            vec![BookId::from_i64(1), BookId::from_i64(2), BookId::from_i64(3)]
        );
        assert_eq!(member.borrowed_books_count(), 3);
        assert!(member.has_book(BookId::from_i64(2)));
        assert!(!member.has_book(BookId::from_i64(4)));
    }
}
