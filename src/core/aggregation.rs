//! Pure derivations over a transaction log.
//!
//! Nothing here mutates its input or keeps state between calls; every view is
//! rebuilt from the slice it is given. Totals come either from the whole log
//! (dashboard) or from the period-filtered log (monthly report), never a mix.

use serde::{Deserialize, Serialize};

use crate::calendar::{ForeignCalendar, ForeignDate};
use crate::domain::transaction::{AccountType, Transaction, TransactionType};
use crate::errors::ValidationError;

/// A (month, year) pair in the foreign calendar. `month` is zero-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PeriodScope {
    month: u8,
    year: i32,
}

impl PeriodScope {
    pub fn new(month: u8, year: i32) -> Result<Self, ValidationError> {
        if month > 11 {
            return Err(ValidationError::InvalidMonth(month));
        }
        Ok(Self { month, year })
    }

    /// The month a calendar date falls in.
    pub fn containing(date: &ForeignDate) -> Self {
        Self {
            month: date.month.min(11),
            year: date.year,
        }
    }

    pub fn month(&self) -> u8 {
        self.month
    }

    pub fn year(&self) -> i32 {
        self.year
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Totals {
    pub total_income: f64,
    pub total_expenses: f64,
    pub cash_balance: f64,
    pub loan_balance: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Profit,
    Loss,
}

impl Outcome {
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Profit => "Profit",
            Outcome::Loss => "Loss",
        }
    }
}

impl Totals {
    pub fn net_profit(&self) -> f64 {
        self.total_income - self.total_expenses
    }

    pub fn outcome(&self) -> Outcome {
        if self.net_profit() >= 0.0 {
            Outcome::Profit
        } else {
            Outcome::Loss
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Partitions {
    pub income: Vec<Transaction>,
    pub expense: Vec<Transaction>,
    pub loan: Vec<Transaction>,
}

/// Every derived view for one call of [`calculate`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionCalculations {
    pub totals: Totals,
    pub sorted: Vec<Transaction>,
    pub income: Vec<Transaction>,
    pub expense: Vec<Transaction>,
    pub loan: Vec<Transaction>,
}

/// Keeps the transactions whose foreign date falls in `scope`.
///
/// Without a scope the input is returned as is. Records the calendar cannot
/// convert are left out of the period view and logged.
pub fn filter_by_period(
    transactions: &[Transaction],
    scope: Option<PeriodScope>,
    calendar: &dyn ForeignCalendar,
) -> Vec<Transaction> {
    let Some(scope) = scope else {
        return transactions.to_vec();
    };
    transactions
        .iter()
        .filter(|txn| match calendar.to_foreign_date(txn.date) {
            Ok(date) => date.year == scope.year && date.month == scope.month,
            Err(err) => {
                tracing::warn!(
                    transaction = %txn.id,
                    date = %txn.date,
                    calendar = calendar.name(),
                    error = %err,
                    "dropping transaction from period view"
                );
                false
            }
        })
        .cloned()
        .collect()
}

/// Newest first; equal timestamps keep their input order.
pub fn sort_descending(transactions: &[Transaction]) -> Vec<Transaction> {
    let mut sorted = transactions.to_vec();
    sorted.sort_by(|a, b| b.date.cmp(&a.date));
    sorted
}

/// Splits transactions into income, expense and loan columns.
///
/// Loan entries go to `loan` whatever their type, so each transaction lands
/// in exactly one column.
pub fn partition_by_category(sorted: &[Transaction]) -> Partitions {
    let mut partitions = Partitions::default();
    for txn in sorted {
        let column = match (txn.account, txn.kind) {
            (AccountType::Loan, _) => &mut partitions.loan,
            (_, TransactionType::Income) => &mut partitions.income,
            (_, TransactionType::Expense) => &mut partitions.expense,
        };
        column.push(txn.clone());
    }
    partitions
}

/// Folds a transaction list into P&L totals and account balances.
///
/// Loan movements stay off the P&L. On the loan book an income is a draw that
/// raises the liability and an expense is a repayment that lowers it.
pub fn compute_totals(source: &[Transaction]) -> Totals {
    source.iter().fold(Totals::default(), |mut acc, txn| {
        match (txn.account, txn.kind) {
            (AccountType::Cash, TransactionType::Income) => {
                acc.total_income += txn.amount;
                acc.cash_balance += txn.amount;
            }
            (AccountType::Cash, TransactionType::Expense) => {
                acc.total_expenses += txn.amount;
                acc.cash_balance -= txn.amount;
            }
            (AccountType::Loan, TransactionType::Income) => acc.loan_balance += txn.amount,
            (AccountType::Loan, TransactionType::Expense) => acc.loan_balance -= txn.amount,
        }
        acc
    })
}

/// Derives the sorted list, the three columns and the totals in one pass.
///
/// With a scope the totals describe that period only; without one they cover
/// the whole log.
pub fn calculate(
    transactions: &[Transaction],
    scope: Option<PeriodScope>,
    calendar: &dyn ForeignCalendar,
) -> TransactionCalculations {
    let filtered = filter_by_period(transactions, scope, calendar);
    let sorted = sort_descending(&filtered);
    let Partitions {
        income,
        expense,
        loan,
    } = partition_by_category(&sorted);
    let totals = match scope {
        Some(_) => compute_totals(&filtered),
        None => compute_totals(transactions),
    };
    TransactionCalculations {
        totals,
        sorted,
        income,
        expense,
        loan,
    }
}
