use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::common::{Displayable, Identifiable};
use crate::errors::ValidationError;

/// Direction of money movement on an account.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Income,
    Expense,
}

/// The two books a transaction can be posted against.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    Cash,
    Loan,
}

impl AccountType {
    pub fn label(&self) -> &'static str {
        match self {
            AccountType::Cash => "cash",
            AccountType::Loan => "loan",
        }
    }

    /// Capitalised name shown in report lines.
    pub fn display_name(&self) -> &'static str {
        match self {
            AccountType::Cash => "Cash",
            AccountType::Loan => "Loan",
        }
    }

    /// Form label for the income side; on the loan book an income is a withdrawal.
    pub fn income_label(&self) -> &'static str {
        match self {
            AccountType::Cash => "Income",
            AccountType::Loan => "Withdrawal",
        }
    }

    pub fn expense_label(&self) -> &'static str {
        match self {
            AccountType::Cash => "Expense",
            AccountType::Loan => "Pay Loan",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Transaction {
    pub id: Uuid,
    pub description: String,
    pub amount: f64,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub account: AccountType,
    pub date: DateTime<Utc>,
}

impl Transaction {
    pub fn new(
        description: impl Into<String>,
        amount: f64,
        kind: TransactionType,
        account: AccountType,
        date: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            description: description.into(),
            amount,
            kind,
            account,
            date,
        }
    }

    pub fn is_loan(&self) -> bool {
        self.account == AccountType::Loan
    }

    pub fn is_income(&self) -> bool {
        self.kind == TransactionType::Income
    }

    /// Checks the invariants every stored transaction must hold.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_fields(&self.description, self.amount)
    }
}

impl Identifiable for Transaction {
    fn id(&self) -> Uuid {
        self.id
    }
}

impl Displayable for Transaction {
    fn display_label(&self) -> String {
        let sign = if self.is_income() { '+' } else { '-' };
        format!(
            "{} [{}] {}{:.2}",
            self.description,
            self.account.label(),
            sign,
            self.amount
        )
    }
}

/// Raw input collected by the add-transaction flow.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionDraft {
    pub description: String,
    pub amount: f64,
    pub kind: TransactionType,
    pub account: AccountType,
    pub date: NaiveDate,
}

impl TransactionDraft {
    /// Validates the draft and stamps it with the time-of-day of `now`.
    ///
    /// Only the calendar day is picked by the user; borrowing the current
    /// wall-clock time keeps entries made on the same day in insertion order.
    pub fn into_transaction(
        self,
        now: DateTime<FixedOffset>,
    ) -> Result<Transaction, ValidationError> {
        validate_fields(&self.description, self.amount)?;
        let local = self.date.and_time(now.time());
        let date = now
            .offset()
            .from_local_datetime(&local)
            .single()
            .map(|instant| instant.with_timezone(&Utc))
            .unwrap_or_else(|| Utc.from_utc_datetime(&local));
        Ok(Transaction::new(
            self.description,
            self.amount,
            self.kind,
            self.account,
            date,
        ))
    }
}

fn validate_fields(description: &str, amount: f64) -> Result<(), ValidationError> {
    if description.trim().is_empty() {
        return Err(ValidationError::MissingDescription);
    }
    if !amount.is_finite() || amount <= 0.0 {
        return Err(ValidationError::InvalidAmount(amount));
    }
    Ok(())
}
