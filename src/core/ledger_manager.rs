use std::sync::Arc;

use chrono::{DateTime, FixedOffset};
use uuid::Uuid;

use crate::calendar::{self, ForeignCalendar, GregorianFallback};
use crate::config::Config;
use crate::core::aggregation::{calculate, PeriodScope, TransactionCalculations};
use crate::core::services::{ServiceError, ServiceRecordService, ServiceResult, TransactionService};
use crate::core::time::Clock;
use crate::currency::FormatOptions;
use crate::domain::common::{Displayable, Identifiable};
use crate::domain::service_record::{ServiceRecord, ServiceRecordDraft};
use crate::domain::transaction::{Transaction, TransactionDraft};
use crate::errors::LedgerError;
use crate::report::{self, DashboardSummary, MonthlyReport};
use crate::session::Session;
use crate::storage::{EntityKind, PersistenceGateway, SaveHandle, SyncedCollection};

/// Facade that owns the signed-in user's ledger and routes every change
/// through validation and persistence.
pub struct LedgerManager {
    session: Session,
    gateway: PersistenceGateway,
    transactions: SyncedCollection<Transaction>,
    service_records: SyncedCollection<ServiceRecord>,
    calendar: Arc<dyn ForeignCalendar>,
    fallback: GregorianFallback,
    clock: Arc<dyn Clock>,
    offset: FixedOffset,
    report_years: usize,
    format: FormatOptions,
}

impl LedgerManager {
    /// Loads both collections for `session` using the calendar chosen in `config`.
    pub async fn open(
        gateway: PersistenceGateway,
        session: Session,
        config: &Config,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, LedgerError> {
        let calendar = calendar::from_config(config, Arc::clone(&clock))?;
        let fallback = calendar::fallback_from_config(config, Arc::clone(&clock))?;
        let offset = calendar::fixed_offset(config.utc_offset_minutes)?;
        let (transactions, service_records) = load_collections(&gateway, &session).await;
        Ok(Self {
            session,
            gateway,
            transactions,
            service_records,
            calendar,
            fallback,
            clock,
            offset,
            report_years: config.report_years,
            format: FormatOptions::from_config(config),
        })
    }

    /// Replaces the session and reloads the collections stored for it.
    ///
    /// Pending saves of the outgoing user finish first so the reload never
    /// reads an older snapshot.
    pub async fn switch_session(&mut self, session: Session) {
        tokio::join!(self.transactions.flush(), self.service_records.flush());
        let (transactions, service_records) = load_collections(&self.gateway, &session).await;
        tracing::info!(user = session.current_user().unwrap_or("-"), "session switched");
        self.session = session;
        self.transactions = transactions;
        self.service_records = service_records;
    }

    pub async fn sign_out(&mut self) {
        self.switch_session(Session::anonymous()).await;
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn calendar(&self) -> &dyn ForeignCalendar {
        self.calendar.as_ref()
    }

    pub fn format(&self) -> &FormatOptions {
        &self.format
    }

    pub fn transactions(&self) -> &[Transaction] {
        self.transactions.items()
    }

    pub fn service_records(&self) -> &[ServiceRecord] {
        self.service_records.items()
    }

    /// The first storage problem to surface, if any.
    pub fn banner(&self) -> Option<String> {
        self.transactions
            .banner()
            .or_else(|| self.service_records.banner())
    }

    pub fn add_transaction(
        &mut self,
        draft: TransactionDraft,
    ) -> ServiceResult<(Uuid, SaveHandle)> {
        let now = self.local_now();
        let (id, handle) = self
            .transactions
            .update(|txns| TransactionService::add(txns, draft, now))?;
        tracing::debug!(transaction = %id, "transaction added");
        Ok((id, handle))
    }

    pub fn update_transaction(&mut self, updated: Transaction) -> ServiceResult<SaveHandle> {
        let id = updated.id;
        let ((), handle) = self
            .transactions
            .update(|txns| TransactionService::replace(txns, updated))?;
        tracing::debug!(transaction = %id, "transaction updated");
        Ok(handle)
    }

    pub fn remove_transaction(&mut self, id: Uuid) -> ServiceResult<(Transaction, SaveHandle)> {
        let (removed, handle) = self
            .transactions
            .update(|txns| TransactionService::remove(txns, id))?;
        tracing::debug!(
            transaction = %removed.id(),
            label = %removed.display_label(),
            "transaction removed"
        );
        Ok((removed, handle))
    }

    pub fn find_transaction(&self, id: Uuid) -> ServiceResult<&Transaction> {
        TransactionService::find(self.transactions.items(), id)
            .ok_or_else(|| ServiceError::NotFound(format!("transaction {}", id)))
    }

    pub fn add_service_record(
        &mut self,
        draft: ServiceRecordDraft,
    ) -> ServiceResult<(Uuid, SaveHandle)> {
        let offset = self.offset;
        let (id, handle) = self
            .service_records
            .update(|records| ServiceRecordService::add(records, draft, offset))?;
        if let Some(record) = self.service_records.items().iter().find(|r| r.id == id) {
            tracing::debug!(
                record = %record.id(),
                label = %record.display_label(),
                "service record added"
            );
        }
        Ok((id, handle))
    }

    pub fn service_history(&self) -> Vec<ServiceRecord> {
        ServiceRecordService::history(self.service_records.items())
    }

    pub fn latest_odometer(&self) -> Option<u64> {
        ServiceRecordService::latest_odometer(self.service_records.items())
    }

    pub fn calculations(&self, scope: Option<PeriodScope>) -> TransactionCalculations {
        calculate(self.transactions.items(), scope, self.calendar.as_ref())
    }

    pub fn dashboard(&self) -> DashboardSummary {
        DashboardSummary::build(self.transactions.items(), self.calendar.as_ref(), &self.format)
    }

    pub fn monthly_report(&self, scope: PeriodScope) -> MonthlyReport {
        MonthlyReport::build(
            self.transactions.items(),
            scope,
            self.calendar.as_ref(),
            &self.format,
        )
    }

    pub fn default_scope(&self) -> PeriodScope {
        report::default_scope(self.calendar.as_ref(), &self.fallback)
    }

    pub fn available_years(&self) -> Vec<i32> {
        report::available_years(self.calendar.as_ref(), &self.fallback, self.report_years)
    }

    fn local_now(&self) -> DateTime<FixedOffset> {
        self.clock.now().with_timezone(&self.offset)
    }
}

async fn load_collections(
    gateway: &PersistenceGateway,
    session: &Session,
) -> (SyncedCollection<Transaction>, SyncedCollection<ServiceRecord>) {
    tokio::join!(
        SyncedCollection::open(gateway.clone(), session.storage_key(EntityKind::Transactions)),
        SyncedCollection::open(
            gateway.clone(),
            session.storage_key(EntityKind::ServiceRecords)
        ),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::time::FixedClock;
    use crate::domain::service_record::ServiceType;
    use crate::domain::transaction::{AccountType, TransactionType};
    use crate::errors::ValidationError;
    use crate::storage::{MemoryStore, LOAD_ERROR_BANNER, SAVE_ERROR_BANNER};
    use chrono::{NaiveDate, TimeZone, Utc};
    use std::time::Duration;

    fn clock() -> Arc<dyn Clock> {
        Arc::new(FixedClock(Utc.with_ymd_and_hms(2024, 5, 1, 6, 0, 0).unwrap()))
    }

    async fn manager(user: Option<&str>) -> (LedgerManager, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let gateway = PersistenceGateway::new(store.clone());
        let session = user.map(Session::signed_in).unwrap_or_default();
        let manager = LedgerManager::open(gateway, session, &Config::default(), clock())
            .await
            .unwrap();
        (manager, store)
    }

    fn draft(description: &str, amount: f64) -> TransactionDraft {
        TransactionDraft {
            description: description.into(),
            amount,
            kind: TransactionType::Income,
            account: AccountType::Cash,
            date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
        }
    }

    #[tokio::test]
    async fn add_applies_locally_and_persists() {
        let (mut manager, store) = manager(Some("maya")).await;
        let (id, handle) = manager.add_transaction(draft("Fare", 250.0)).unwrap();
        assert_eq!(manager.transactions().len(), 1);
        handle.wait().await;

        let raw = store.raw("transactions_maya").unwrap();
        assert!(raw.contains(&id.to_string()));
        assert_eq!(manager.dashboard().totals.cash_balance, 250.0);
    }

    #[tokio::test]
    async fn invalid_draft_leaves_state_untouched() {
        let (mut manager, store) = manager(Some("maya")).await;
        let err = manager.add_transaction(draft("  ", 10.0)).unwrap_err();
        assert!(matches!(err, ServiceError::Invalid(ValidationError::MissingDescription)));
        assert!(manager.transactions().is_empty());
        assert!(store.raw("transactions_maya").is_none());
    }

    #[tokio::test]
    async fn edit_and_delete_by_id() {
        let (mut manager, _) = manager(Some("maya")).await;
        let (id, _) = manager.add_transaction(draft("Fare", 100.0)).unwrap();

        let mut edited = manager.find_transaction(id).unwrap().clone();
        edited.amount = 180.0;
        manager.update_transaction(edited).unwrap().wait().await;
        assert_eq!(manager.find_transaction(id).unwrap().amount, 180.0);

        let (removed, handle) = manager.remove_transaction(id).unwrap();
        handle.wait().await;
        assert_eq!(removed.id, id);
        assert!(matches!(
            manager.remove_transaction(id),
            Err(ServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn failed_save_keeps_local_change_and_sets_banner() {
        let (mut manager, store) = manager(Some("maya")).await;
        store.set_fail_writes(true);
        let (_, handle) = manager.add_transaction(draft("Fare", 10.0)).unwrap();
        handle.wait().await;
        assert_eq!(manager.transactions().len(), 1);
        assert_eq!(manager.banner().as_deref(), Some(SAVE_ERROR_BANNER));

        store.set_fail_writes(false);
        let (_, handle) = manager.add_transaction(draft("Fare", 20.0)).unwrap();
        handle.wait().await;
        assert_eq!(manager.banner(), None);
    }

    #[tokio::test]
    async fn failed_load_starts_empty_with_banner() {
        let store = Arc::new(MemoryStore::new());
        store.set_fail_reads(true);
        let gateway = PersistenceGateway::new(store.clone());
        let manager = LedgerManager::open(
            gateway,
            Session::signed_in("maya"),
            &Config::default(),
            clock(),
        )
        .await
        .unwrap();
        assert!(manager.transactions().is_empty());
        assert_eq!(manager.banner().as_deref(), Some(LOAD_ERROR_BANNER));
    }

    #[tokio::test]
    async fn users_see_only_their_own_data() {
        let (mut manager, _) = manager(Some("maya")).await;
        manager
            .add_transaction(draft("Fare", 10.0))
            .unwrap()
            .1
            .wait()
            .await;

        manager.switch_session(Session::signed_in("ravi")).await;
        assert!(manager.transactions().is_empty());

        manager.switch_session(Session::signed_in("maya")).await;
        assert_eq!(manager.transactions().len(), 1);

        manager.sign_out().await;
        assert!(!manager.session().is_authenticated());
        assert!(manager.transactions().is_empty());
    }

    #[tokio::test]
    async fn anonymous_changes_are_not_written() {
        let (mut manager, store) = manager(None).await;
        manager
            .add_transaction(draft("Fare", 10.0))
            .unwrap()
            .1
            .wait()
            .await;
        assert_eq!(manager.transactions().len(), 1);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn service_log_and_reports() {
        let (mut manager, _) = manager(Some("maya")).await;
        let service = ServiceRecordDraft {
            date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            odometer: 1200,
            description: "Brake pads".into(),
            cost: 900.0,
            service_types: [ServiceType::Repairing].into_iter().collect(),
            ..ServiceRecordDraft::default()
        };
        manager.add_service_record(service).unwrap().1.wait().await;
        assert_eq!(manager.latest_odometer(), Some(1200));
        assert_eq!(manager.service_history().len(), 1);

        manager.add_transaction(draft("Fare", 300.0)).unwrap();
        let scope = manager.default_scope();
        assert_eq!((scope.month(), scope.year()), (0, 2081));
        assert_eq!(manager.monthly_report(scope).totals.total_income, 300.0);
        assert_eq!(manager.available_years().first(), Some(&2081));
        assert_eq!(manager.available_years().len(), 10);
    }

    #[tokio::test(start_paused = true)]
    async fn switching_users_waits_for_pending_saves() {
        let store = Arc::new(MemoryStore::new());
        let gateway = PersistenceGateway::new(store.clone())
            .with_latency(Duration::ZERO, Duration::from_millis(300));
        let mut manager = LedgerManager::open(
            gateway,
            Session::signed_in("maya"),
            &Config::default(),
            clock(),
        )
        .await
        .unwrap();

        // Handles are dropped; nothing waits for the writes here.
        manager.add_transaction(draft("Fare", 10.0)).unwrap();
        manager.add_transaction(draft("Fare", 20.0)).unwrap();
        manager.sign_out().await;
        manager.switch_session(Session::signed_in("maya")).await;

        assert_eq!(manager.transactions().len(), 2);
    }

    #[tokio::test]
    async fn report_defaults_fall_back_to_configured_offset() {
        let store = Arc::new(MemoryStore::new());
        let before_table: Arc<dyn Clock> =
            Arc::new(FixedClock(Utc.with_ymd_and_hms(1990, 1, 1, 6, 0, 0).unwrap()));
        let config = Config {
            fallback_year_offset: 56,
            report_years: 2,
            ..Config::default()
        };
        let manager = LedgerManager::open(
            PersistenceGateway::new(store),
            Session::signed_in("maya"),
            &config,
            before_table,
        )
        .await
        .unwrap();

        let scope = manager.default_scope();
        assert_eq!((scope.month(), scope.year()), (0, 2046));
        assert_eq!(manager.available_years(), vec![2046, 2047]);
    }
}
