//! Dashboard and Bikram Sambat monthly report views.

use std::fmt::Write as _;

use crate::calendar::{ForeignCalendar, ForeignDate, GregorianFallback};
use crate::core::aggregation::{calculate, PeriodScope, Totals};
use crate::currency::{format_amount, FormatOptions};
use crate::domain::transaction::Transaction;

/// One rendered line in a report column.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportLine {
    pub description: String,
    pub date_label: String,
    pub account: &'static str,
    pub amount: String,
}

impl ReportLine {
    fn from_transaction(
        txn: &Transaction,
        calendar: &dyn ForeignCalendar,
        format: &FormatOptions,
    ) -> Self {
        let date_label = match calendar.to_foreign_date(txn.date) {
            Ok(date) => date.format(&calendar.month_names()),
            Err(err) => {
                tracing::warn!(transaction = %txn.id, error = %err, "could not convert date");
                String::new()
            }
        };
        let sign = if txn.is_income() { '+' } else { '-' };
        Self {
            description: txn.description.clone(),
            date_label,
            account: txn.account.display_name(),
            amount: format!("{} {}", sign, format_amount(txn.amount, format)),
        }
    }

    /// `description · date · account  ±amount`
    pub fn render(&self) -> String {
        format!(
            "{} · {} · {}  {}",
            self.description, self.date_label, self.account, self.amount
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportColumn {
    pub heading: &'static str,
    pub empty_message: &'static str,
    pub lines: Vec<ReportLine>,
}

/// Income, expense and loan activity for one BS month.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyReport {
    pub scope: PeriodScope,
    pub title: String,
    pub totals: Totals,
    pub columns: [ReportColumn; 3],
    format: FormatOptions,
}

impl MonthlyReport {
    pub fn build(
        transactions: &[Transaction],
        scope: PeriodScope,
        calendar: &dyn ForeignCalendar,
        format: &FormatOptions,
    ) -> Self {
        let view = calculate(transactions, Some(scope), calendar);
        let month_name = calendar
            .month_names()
            .get(scope.month() as usize)
            .copied()
            .unwrap_or_default();
        let lines = |txns: &[Transaction]| {
            txns.iter()
                .map(|txn| ReportLine::from_transaction(txn, calendar, format))
                .collect::<Vec<_>>()
        };
        Self {
            scope,
            title: format!("Summary for {} {}", month_name, scope.year()),
            totals: view.totals,
            columns: [
                ReportColumn {
                    heading: "Income",
                    empty_message: "No income transactions.",
                    lines: lines(&view.income),
                },
                ReportColumn {
                    heading: "Expenses",
                    empty_message: "No expense transactions.",
                    lines: lines(&view.expense),
                },
                ReportColumn {
                    heading: "Loans",
                    empty_message: "No loan transactions.",
                    lines: lines(&view.loan),
                },
            ],
            format: format.clone(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.columns.iter().all(|column| column.lines.is_empty())
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Monthly Report (Bikram Sambat)");
        let _ = writeln!(out, "{}", self.title);
        let _ = writeln!(
            out,
            "  Total Income    {}",
            format_amount(self.totals.total_income, &self.format)
        );
        let _ = writeln!(
            out,
            "  Total Expenses  {}",
            format_amount(self.totals.total_expenses, &self.format)
        );
        let _ = writeln!(
            out,
            "  Net {:<12}{}",
            self.totals.outcome().label(),
            format_amount(self.totals.net_profit(), &self.format)
        );
        let _ = writeln!(out);
        if self.is_empty() {
            let _ = writeln!(out, "No transactions for this month.");
            return out;
        }
        for column in &self.columns {
            let _ = writeln!(out, "{}", column.heading);
            if column.lines.is_empty() {
                let _ = writeln!(out, "  {}", column.empty_message);
            }
            for line in &column.lines {
                let _ = writeln!(out, "  {}", line.render());
            }
        }
        out
    }
}

/// Number of transactions listed under the dashboard balances.
pub const RECENT_LIMIT: usize = 10;

/// All-time balances and profit/loss shown on the dashboard.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardSummary {
    pub totals: Totals,
    /// Every transaction, newest first.
    pub recent: Vec<Transaction>,
    pub recent_lines: Vec<ReportLine>,
    format: FormatOptions,
}

impl DashboardSummary {
    pub fn build(
        transactions: &[Transaction],
        calendar: &dyn ForeignCalendar,
        format: &FormatOptions,
    ) -> Self {
        let view = calculate(transactions, None, calendar);
        let recent_lines = view
            .sorted
            .iter()
            .take(RECENT_LIMIT)
            .map(|txn| ReportLine::from_transaction(txn, calendar, format))
            .collect();
        Self {
            totals: view.totals,
            recent: view.sorted,
            recent_lines,
            format: format.clone(),
        }
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        let money = |amount| format_amount(amount, &self.format);
        let _ = writeln!(out, "Cash Balance    {}", money(self.totals.cash_balance));
        let _ = writeln!(out, "Loan Balance    {}", money(self.totals.loan_balance));
        let _ = writeln!(out, "Total Income    {}", money(self.totals.total_income));
        let _ = writeln!(out, "Total Expenses  {}", money(self.totals.total_expenses));
        let _ = writeln!(
            out,
            "Net {:<12}{}",
            self.totals.outcome().label(),
            money(self.totals.net_profit())
        );
        let _ = writeln!(out);
        let _ = writeln!(out, "Recent Transactions");
        if self.recent_lines.is_empty() {
            let _ = writeln!(out, "  No transactions yet.");
        }
        for line in &self.recent_lines {
            let _ = writeln!(out, "  {}", line.render());
        }
        let hidden = self.recent.len().saturating_sub(self.recent_lines.len());
        if hidden > 0 {
            let _ = writeln!(out, "  … and {} more", hidden);
        }
        out
    }
}

/// Today's date in `calendar`, or in `fallback` when `calendar` cannot place it.
pub fn today_or_fallback(
    calendar: &dyn ForeignCalendar,
    fallback: &GregorianFallback,
) -> ForeignDate {
    calendar.today().unwrap_or_else(|err| {
        tracing::warn!(
            calendar = calendar.name(),
            error = %err,
            "falling back to Gregorian calendar for today's date"
        );
        fallback.current_date()
    })
}

/// The current month, used as the report's initial selection.
pub fn default_scope(
    calendar: &dyn ForeignCalendar,
    fallback: &GregorianFallback,
) -> PeriodScope {
    PeriodScope::containing(&today_or_fallback(calendar, fallback))
}

/// Selectable report years: the current year and the `count - 1` after it.
pub fn available_years(
    calendar: &dyn ForeignCalendar,
    fallback: &GregorianFallback,
    count: usize,
) -> Vec<i32> {
    let current = today_or_fallback(calendar, fallback).year;
    (0..count as i32).map(|step| current + step).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::{BikramSambat, NEPAL_UTC_OFFSET_MINUTES};
    use crate::core::time::FixedClock;
    use crate::domain::transaction::{AccountType, TransactionType};
    use crate::calendar::fallback::DEFAULT_YEAR_OFFSET;
    use chrono::{DateTime, FixedOffset, TimeZone, Utc};
    use std::sync::Arc;

    fn calendar_at(year: i32, month: u32, day: u32) -> BikramSambat {
        let offset = FixedOffset::east_opt(NEPAL_UTC_OFFSET_MINUTES * 60).unwrap();
        let now = Utc.with_ymd_and_hms(year, month, day, 6, 0, 0).unwrap();
        BikramSambat::new(offset, Arc::new(FixedClock(now)))
    }

    fn fallback_at(now: DateTime<Utc>) -> GregorianFallback {
        let offset = FixedOffset::east_opt(NEPAL_UTC_OFFSET_MINUTES * 60).unwrap();
        GregorianFallback::new(offset, DEFAULT_YEAR_OFFSET, Arc::new(FixedClock(now)))
    }

    fn entry(
        description: &str,
        account: AccountType,
        kind: TransactionType,
        amount: f64,
    ) -> Transaction {
        let date = Utc.with_ymd_and_hms(2024, 5, 1, 6, 0, 0).unwrap();
        Transaction::new(description, amount, kind, account, date)
    }

    #[test]
    fn monthly_report_lists_each_column() {
        let calendar = calendar_at(2024, 5, 1);
        let list = vec![
            entry("Fare", AccountType::Cash, TransactionType::Income, 1500.0),
            entry("Charging", AccountType::Cash, TransactionType::Expense, 400.0),
            entry("Bank draw", AccountType::Loan, TransactionType::Income, 100000.0),
        ];
        let scope = PeriodScope::new(0, 2081).unwrap();
        let report = MonthlyReport::build(&list, scope, &calendar, &FormatOptions::default());

        assert_eq!(report.title, "Summary for Baisakh 2081");
        assert_eq!(report.totals.net_profit(), 1100.0);
        let rendered = report.render();
        assert!(rendered.contains("Fare · Baisakh 19, 2081 · Cash  + Rs. 1,500.00"));
        assert!(rendered.contains("Charging · Baisakh 19, 2081 · Cash  - Rs. 400.00"));
        assert!(rendered.contains("Bank draw · Baisakh 19, 2081 · Loan  + Rs. 1,00,000.00"));
        assert!(rendered.contains("Net Profit"));
    }

    #[test]
    fn empty_columns_show_placeholders() {
        let calendar = calendar_at(2024, 5, 1);
        let list = vec![entry("Fare", AccountType::Cash, TransactionType::Income, 10.0)];
        let scope = PeriodScope::new(0, 2081).unwrap();
        let rendered =
            MonthlyReport::build(&list, scope, &calendar, &FormatOptions::default()).render();
        assert!(rendered.contains("No expense transactions."));
        assert!(rendered.contains("No loan transactions."));
        assert!(!rendered.contains("No income transactions."));
    }

    #[test]
    fn empty_month_has_single_message() {
        let calendar = calendar_at(2024, 5, 1);
        let scope = PeriodScope::new(5, 2081).unwrap();
        let report = MonthlyReport::build(&[], scope, &calendar, &FormatOptions::default());
        assert!(report.is_empty());
        assert_eq!(report.title, "Summary for Aswin 2081");
        assert!(report.render().contains("No transactions for this month."));
    }

    #[test]
    fn dashboard_uses_whole_log() {
        let calendar = calendar_at(2024, 5, 1);
        let mut old = entry("Old fare", AccountType::Cash, TransactionType::Income, 50.0);
        old.date = Utc.with_ymd_and_hms(1990, 1, 1, 0, 0, 0).unwrap();
        let list = vec![old, entry("Loss", AccountType::Cash, TransactionType::Expense, 80.0)];
        let summary = DashboardSummary::build(&list, &calendar, &FormatOptions::default());
        assert_eq!(summary.totals.cash_balance, -30.0);
        assert_eq!(summary.recent.len(), 2);
        let rendered = summary.render();
        assert!(rendered.contains("Net Loss"));
        assert!(rendered.contains("Loss · Baisakh 19, 2081 · Cash  - Rs. 80.00"));
    }

    #[test]
    fn dashboard_lists_newest_transactions_first() {
        let calendar = calendar_at(2024, 5, 1);
        let list: Vec<Transaction> = (0..RECENT_LIMIT + 2)
            .map(|idx| {
                let mut txn = entry(
                    &format!("Fare {idx}"),
                    AccountType::Cash,
                    TransactionType::Income,
                    10.0,
                );
                txn.date = Utc.with_ymd_and_hms(2024, 5, 1, idx as u32, 0, 0).unwrap();
                txn
            })
            .collect();
        let summary = DashboardSummary::build(&list, &calendar, &FormatOptions::default());
        assert_eq!(summary.recent_lines.len(), RECENT_LIMIT);
        assert_eq!(summary.recent_lines[0].description, "Fare 11");
        let rendered = summary.render();
        assert!(rendered.contains("Recent Transactions"));
        assert!(rendered.contains("… and 2 more"));
        assert!(!rendered.contains("Fare 1 ·"));
    }

    #[test]
    fn empty_dashboard_says_so() {
        let calendar = calendar_at(2024, 5, 1);
        let rendered = DashboardSummary::build(&[], &calendar, &FormatOptions::default()).render();
        assert!(rendered.contains("No transactions yet."));
    }

    #[test]
    fn default_scope_is_current_month() {
        let now = Utc.with_ymd_and_hms(2024, 5, 20, 6, 0, 0).unwrap();
        let calendar = calendar_at(2024, 5, 20);
        let scope = default_scope(&calendar, &fallback_at(now));
        assert_eq!((scope.month(), scope.year()), (1, 2081));
    }

    #[test]
    fn years_start_at_current_year() {
        let now = Utc.with_ymd_and_hms(2024, 5, 20, 6, 0, 0).unwrap();
        let calendar = calendar_at(2024, 5, 20);
        assert_eq!(
            available_years(&calendar, &fallback_at(now), 3),
            vec![2081, 2082, 2083]
        );
    }

    #[test]
    fn out_of_table_today_uses_injected_fallback() {
        let now = Utc.with_ymd_and_hms(1990, 1, 1, 6, 0, 0).unwrap();
        let calendar = calendar_at(1990, 1, 1);
        let fallback = fallback_at(now);
        assert_eq!(
            today_or_fallback(&calendar, &fallback),
            ForeignDate::new(2047, 0, 1)
        );
        let scope = default_scope(&calendar, &fallback);
        assert_eq!((scope.month(), scope.year()), (0, 2047));
        assert_eq!(available_years(&calendar, &fallback, 2), vec![2047, 2048]);
    }
}
