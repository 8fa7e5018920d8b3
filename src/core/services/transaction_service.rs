//! Business logic helpers for managing transactions.

use chrono::{DateTime, FixedOffset};
use uuid::Uuid;

use crate::core::services::{ServiceError, ServiceResult};
use crate::domain::transaction::{Transaction, TransactionDraft};

/// Provides validated CRUD helpers over a transaction collection.
pub struct TransactionService;

impl TransactionService {
    /// Validates the draft, appends the new transaction and returns its identifier.
    pub fn add(
        transactions: &mut Vec<Transaction>,
        draft: TransactionDraft,
        now: DateTime<FixedOffset>,
    ) -> ServiceResult<Uuid> {
        let txn = draft.into_transaction(now)?;
        let id = txn.id;
        transactions.push(txn);
        Ok(id)
    }

    /// Replaces the stored transaction carrying the same identifier.
    pub fn replace(transactions: &mut [Transaction], updated: Transaction) -> ServiceResult<()> {
        updated.validate()?;
        let slot = transactions
            .iter_mut()
            .find(|txn| txn.id == updated.id)
            .ok_or_else(|| ServiceError::NotFound(format!("transaction {}", updated.id)))?;
        *slot = updated;
        Ok(())
    }

    /// Removes the transaction identified by `id`, returning the removed instance.
    pub fn remove(transactions: &mut Vec<Transaction>, id: Uuid) -> ServiceResult<Transaction> {
        let index = transactions
            .iter()
            .position(|txn| txn.id == id)
            .ok_or_else(|| ServiceError::NotFound(format!("transaction {}", id)))?;
        Ok(transactions.remove(index))
    }

    pub fn find(transactions: &[Transaction], id: Uuid) -> Option<&Transaction> {
        transactions.iter().find(|txn| txn.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::transaction::{AccountType, TransactionType};
    use crate::errors::ValidationError;
    use chrono::{NaiveDate, TimeZone};

    fn now() -> DateTime<FixedOffset> {
        FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2024, 3, 1, 10, 0, 0)
            .unwrap()
    }

    fn draft(amount: f64) -> TransactionDraft {
        TransactionDraft {
            description: "Ride fare".into(),
            amount,
            kind: TransactionType::Income,
            account: AccountType::Cash,
            date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
        }
    }

    #[test]
    fn add_rejects_invalid_draft_without_touching_list() {
        let mut list = Vec::new();
        let err = TransactionService::add(&mut list, draft(0.0), now()).unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Invalid(ValidationError::InvalidAmount(_))
        ));
        assert!(list.is_empty());
    }

    #[test]
    fn replace_swaps_whole_record() {
        let mut list = Vec::new();
        let id = TransactionService::add(&mut list, draft(50.0), now()).unwrap();
        let mut edited = list[0].clone();
        edited.amount = 75.0;
        edited.account = AccountType::Loan;
        TransactionService::replace(&mut list, edited.clone()).unwrap();
        assert_eq!(TransactionService::find(&list, id), Some(&edited));
    }

    #[test]
    fn replace_fails_for_missing_transaction() {
        let mut list = Vec::new();
        TransactionService::add(&mut list, draft(50.0), now()).unwrap();
        let mut stranger = list[0].clone();
        stranger.id = Uuid::new_v4();
        let err = TransactionService::replace(&mut list, stranger).unwrap_err();
        assert!(
            matches!(err, ServiceError::NotFound(ref message) if message.contains("transaction")),
            "unexpected error: {err:?}"
        );
    }

    #[test]
    fn remove_returns_deleted_transaction() {
        let mut list = Vec::new();
        let id = TransactionService::add(&mut list, draft(20.0), now()).unwrap();
        let removed = TransactionService::remove(&mut list, id).unwrap();
        assert_eq!(removed.id, id);
        assert!(TransactionService::find(&list, id).is_none());
    }
}
