use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{BookId, BorrowRecordId, MemberId, TakeBackBookError, ValidationError};

const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// 採番前の貸出記録
///
/// 貸出ルールが生成し、ストアに挿入されてIDが確定する。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBorrowRecord {
    pub book_id: BookId,
    pub member_id: MemberId,
    pub borrowed_at: DateTime<Utc>,
}

impl NewBorrowRecord {
    /// 採番されたIDで貸出記録を確定する
    pub fn assign(self, id: BorrowRecordId) -> Result<BorrowRecord, ValidationError> {
        BorrowRecord::new(id, self.book_id, self.member_id, self.borrowed_at, None)
    }
}

/// 貸出記録エンティティ
///
/// 不変条件：
/// - 各IDは正の値
/// - returned_at が存在する場合は borrowed_at 以上
///
/// returned_at が None の記録を「未返却（open）」と呼ぶ。
/// returned_at の設定は返却時に一度だけ行われる。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BorrowRecord {
    id: BorrowRecordId,
    book_id: BookId,
    member_id: MemberId,
    borrowed_at: DateTime<Utc>,
    returned_at: Option<DateTime<Utc>>,
}

impl BorrowRecord {
    pub fn new(
        id: BorrowRecordId,
        book_id: BookId,
        member_id: MemberId,
        borrowed_at: DateTime<Utc>,
        returned_at: Option<DateTime<Utc>>,
    ) -> Result<Self, ValidationError> {
        if !id.is_assigned() {
            return Err(ValidationError::InvalidBorrowRecordId(id.value()));
        }
        if !book_id.is_assigned() {
            return Err(ValidationError::InvalidBookId(book_id.value()));
        }
        if !member_id.is_assigned() {
            return Err(ValidationError::InvalidMemberId(member_id.value()));
        }
        if returned_at.is_some_and(|returned_at| returned_at < borrowed_at) {
            return Err(ValidationError::ReturnBeforeBorrow);
        }

        Ok(Self {
            id,
            book_id,
            member_id,
            borrowed_at,
            returned_at,
        })
    }

    pub fn id(&self) -> BorrowRecordId {
        self.id
    }

    pub fn book_id(&self) -> BookId {
        self.book_id
    }

    pub fn member_id(&self) -> MemberId {
        self.member_id
    }

    pub fn borrowed_at(&self) -> DateTime<Utc> {
        self.borrowed_at
    }

    pub fn returned_at(&self) -> Option<DateTime<Utc>> {
        self.returned_at
    }

    pub fn is_open(&self) -> bool {
        self.returned_at.is_none()
    }

    pub fn is_returned(&self) -> bool {
        self.returned_at.is_some()
    }

    /// 貸出日数（切り上げ）
    ///
    /// 返却済みなら返却日時まで、未返却なら `now` までの日数。
    pub fn days_borrowed(&self, now: DateTime<Utc>) -> i64 {
        let end = self.returned_at.unwrap_or(now);
        let millis = (end - self.borrowed_at).num_milliseconds();
        let days = millis.div_euclid(MILLIS_PER_DAY);
        if millis.rem_euclid(MILLIS_PER_DAY) > 0 {
            days + 1
        } else {
            days
        }
    }

    /// 返却済みにした新しい記録を返す
    pub(super) fn close(&self, returned_at: DateTime<Utc>) -> Result<Self, TakeBackBookError> {
        if self.is_returned() {
            return Err(TakeBackBookError::AlreadyReturned);
        }
        if returned_at < self.borrowed_at {
            return Err(TakeBackBookError::ReturnBeforeBorrow);
        }

        Ok(Self {
            returned_at: Some(returned_at),
            ..self.clone()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn borrowed_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 10, 0, 0).unwrap()
    }

    fn open_record() -> BorrowRecord {
        BorrowRecord::new(
            BorrowRecordId::from_i64(1),
            BookId::from_i64(1),
            MemberId::from_i64(1),
            borrowed_at(),
            None,
        )
        .unwrap()
    }

    #[test]
    fn test_new_record_is_open() {
        let record = open_record();
        assert!(record.is_open());
        assert!(!record.is_returned());
        assert_eq!(record.returned_at(), None);
    }

    #[test]
    fn test_record_rejects_non_positive_ids() {
        let result = BorrowRecord::new(
            BorrowRecordId::from_i64(1),
            BookId::from_i64(0),
            MemberId::from_i64(1),
            borrowed_at(),
            None,
        );
        assert_eq!(result.unwrap_err(), ValidationError::InvalidBookId(0));

        let result = BorrowRecord::new(
            BorrowRecordId::from_i64(1),
            BookId::from_i64(1),
            MemberId::from_i64(-5),
            borrowed_at(),
            None,
        );
        assert_eq!(result.unwrap_err(), ValidationError::InvalidMemberId(-5));

        let result = BorrowRecord::new(
            BorrowRecordId::from_i64(0),
            BookId::from_i64(1),
            MemberId::from_i64(1),
            borrowed_at(),
            None,
        );
        assert_eq!(result.unwrap_err(), ValidationError::InvalidBorrowRecordId(0));
    }

    #[test]
    fn test_record_rejects_return_before_borrow() {
        let result = BorrowRecord::new(
            BorrowRecordId::from_i64(1),
            BookId::from_i64(1),
            MemberId::from_i64(1),
            borrowed_at(),
            Some(borrowed_at() - Duration::seconds(1)),
        );
        assert_eq!(result.unwrap_err(), ValidationError::ReturnBeforeBorrow);
    }

    #[test]
    fn test_record_accepts_return_at_borrow_instant() {
        let result = BorrowRecord::new(
            BorrowRecordId::from_i64(1),
            BookId::from_i64(1),
            MemberId::from_i64(1),
            borrowed_at(),
            Some(borrowed_at()),
        );
        assert!(result.unwrap().is_returned());
    }

    #[test]
    fn test_close_sets_return_date_once() {
        let record = open_record();
        let closed = record.close(borrowed_at() + Duration::days(3)).unwrap();
        assert_eq!(closed.returned_at(), Some(borrowed_at() + Duration::days(3)));

        let again = closed.close(borrowed_at() + Duration::days(4));
        assert_eq!(again.unwrap_err(), TakeBackBookError::AlreadyReturned);
    }

    #[test]
    fn test_close_rejects_return_before_borrow() {
        let result = open_record().close(borrowed_at() - Duration::hours(1));
        assert_eq!(result.unwrap_err(), TakeBackBookError::ReturnBeforeBorrow);
    }

    #[test]
    fn test_days_borrowed_rounds_up() {
        let record = open_record();
        assert_eq!(record.days_borrowed(borrowed_at()), 0);
        assert_eq!(record.days_borrowed(borrowed_at() + Duration::hours(1)), 1);
        assert_eq!(record.days_borrowed(borrowed_at() + Duration::days(2)), 2);
        assert_eq!(
            record.days_borrowed(borrowed_at() + Duration::days(2) + Duration::minutes(1)),
            3
        );
    }

    #[test]
    fn test_days_borrowed_stops_at_return_date() {
        let closed = open_record().close(borrowed_at() + Duration::days(5)).unwrap();
        assert_eq!(closed.days_borrowed(borrowed_at() + Duration::days(30)), 5);
    }

    #[test]
    fn test_new_borrow_record_assign() {
        let pending = NewBorrowRecord {
            book_id: BookId::from_i64(2),
            member_id: MemberId::from_i64(3),
            borrowed_at: borrowed_at(),
        };
        let record = pending.assign(BorrowRecordId::from_i64(10)).unwrap();
        assert_eq!(record.id(), BorrowRecordId::from_i64(10));
        assert_eq!(record.book_id(), BookId::from_i64(2));
        assert_eq!(record.member_id(), MemberId::from_i64(3));
        assert!(record.is_open());
    }
}
