//! Application state: every collection the app works on, plus the store it persists to.
//!
//! Each mutating method updates memory first and then writes the affected
//! collection's snapshot. A failed write is logged and otherwise ignored, so
//! the in-memory state stays authoritative for the rest of the session.
use crate::core::currency::{RateBook, RateProvider};
use crate::core::ledger::{LendRecord, LendStatus, Ledger, NewLoan, NewRepayment};
use crate::core::notifications::{self, Notification};
use crate::core::profile::{Theme, UserProfile};
use crate::core::transactions::{NewTransaction, Transaction};
use crate::store::{self, Collection, SnapshotStore};
use chrono::NaiveDate;
use std::sync::Arc;
use tracing::{debug, warn};

pub struct AppState {
    store: Arc<dyn SnapshotStore>,
    ledger: Ledger,
    transactions: Vec<Transaction>,
    profile: UserProfile,
    notifications: Vec<Notification>,
    theme: Theme,
    rates: RateBook,
}

impl AppState {
    /// Reads every collection from `store`, substituting defaults for missing
    /// or malformed snapshots.
    pub fn load(store: Arc<dyn SnapshotStore>, default_pkr_rate: f64) -> Self {
        let mut records: Vec<LendRecord> = store::load_or(store.as_ref(), Collection::Loans, Vec::new);
        for record in records.iter_mut() {
            if record.reconcile_status() {
                warn!(
                    "Stored status of loan {} did not match its repayments, now {}",
                    record.id, record.status
                );
            }
        }

        let transactions = store::load_or(store.as_ref(), Collection::Transactions, Vec::new);
        let profile = store::load_or(store.as_ref(), Collection::Profile, UserProfile::default);
        let notifications = store::load_or(store.as_ref(), Collection::Notifications, Vec::new);
        let theme = store::load_or(store.as_ref(), Collection::Theme, Theme::default);

        let mut rates: RateBook = store::load_or(store.as_ref(), Collection::Rates, || {
            RateBook::new(default_pkr_rate)
        });
        if !rates.is_usable() {
            warn!("Stored exchange rate is unusable, falling back to {default_pkr_rate}");
            rates = RateBook::new(default_pkr_rate);
        }

        debug!(
            loans = records.len(),
            rate = rates.rate(),
            "Loaded application state"
        );

        AppState {
            store,
            ledger: Ledger::from_records(records),
            transactions,
            profile,
            notifications,
            theme,
            rates,
        }
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn profile(&self) -> &UserProfile {
        &self.profile
    }

    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    pub fn unread_count(&self) -> usize {
        notifications::unread_count(&self.notifications)
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn rates(&self) -> &RateBook {
        &self.rates
    }

    /// Asks `provider` for a fresh EUR to PKR rate. The last known rate is
    /// kept when the lookup fails.
    pub async fn refresh_rate(&mut self, provider: &dyn RateProvider) -> bool {
        let updated = self.rates.refresh(provider).await;
        if updated {
            self.persist(Collection::Rates);
        }
        updated
    }

    /// Applies a PKR per EUR rate obtained elsewhere, such as a conversion lookup.
    pub fn apply_rate(&mut self, pkr_per_eur: Option<f64>) -> bool {
        let updated = self.rates.apply(pkr_per_eur);
        if updated {
            self.persist(Collection::Rates);
        }
        updated
    }

    pub fn add_loan(&mut self, loan: NewLoan) -> String {
        let id = self.ledger.add_loan(loan, self.rates.rate());
        self.persist(Collection::Loans);
        id
    }

    /// Refreshes the rate, then records the loan with whatever rate is current.
    pub async fn add_loan_with_live_rate(
        &mut self,
        provider: &dyn RateProvider,
        loan: NewLoan,
    ) -> String {
        self.refresh_rate(provider).await;
        self.add_loan(loan)
    }

    pub fn add_repayment(&mut self, loan_id: &str, repayment: NewRepayment) -> Option<LendStatus> {
        let status = self
            .ledger
            .add_repayment(loan_id, repayment, self.rates.rate())?;
        self.persist(Collection::Loans);
        Some(status)
    }

    pub async fn add_repayment_with_live_rate(
        &mut self,
        provider: &dyn RateProvider,
        loan_id: &str,
        repayment: NewRepayment,
    ) -> Option<LendStatus> {
        if self.ledger.get(loan_id).is_none() {
            debug!("Ignoring repayment for unknown loan {loan_id}");
            return None;
        }
        self.refresh_rate(provider).await;
        self.add_repayment(loan_id, repayment)
    }

    pub fn delete_loan(&mut self, loan_id: &str) -> bool {
        let removed = self.ledger.delete_loan(loan_id);
        if removed {
            self.persist(Collection::Loans);
        }
        removed
    }

    pub fn add_transaction(&mut self, transaction: NewTransaction) -> String {
        let transaction = Transaction::from(transaction);
        let id = transaction.id.clone();
        self.transactions.push(transaction);
        self.persist(Collection::Transactions);
        id
    }

    pub fn delete_transaction(&mut self, id: &str) -> bool {
        let before = self.transactions.len();
        self.transactions.retain(|t| t.id != id);
        let removed = before != self.transactions.len();
        if removed {
            self.persist(Collection::Transactions);
        }
        removed
    }

    pub fn update_profile(&mut self, profile: UserProfile) {
        self.profile = profile;
        self.persist(Collection::Profile);
    }

    pub fn toggle_theme(&mut self) -> Theme {
        self.theme = self.theme.toggled();
        self.persist(Collection::Theme);
        self.theme
    }

    pub fn mark_notification_read(&mut self, id: &str) -> bool {
        let found = notifications::mark_as_read(&mut self.notifications, id);
        if found {
            self.persist(Collection::Notifications);
        }
        found
    }

    pub fn mark_all_notifications_read(&mut self) {
        notifications::mark_all_as_read(&mut self.notifications);
        self.persist(Collection::Notifications);
    }

    /// Adds due-date alerts for loans that are due soon or overdue.
    pub fn refresh_due_alerts(&mut self, today: NaiveDate, within_days: i64) -> usize {
        let alerts = notifications::due_date_alerts(self.ledger.records(), today, within_days);
        let added = notifications::merge_alerts(&mut self.notifications, alerts);
        if added > 0 {
            self.persist(Collection::Notifications);
        }
        added
    }

    fn persist(&self, collection: Collection) {
        let store = self.store.as_ref();
        let result = match collection {
            Collection::Loans => store::save(store, collection, self.ledger.records()),
            Collection::Transactions => store::save(store, collection, &self.transactions),
            Collection::Profile => store::save(store, collection, &self.profile),
            Collection::Notifications => store::save(store, collection, &self.notifications),
            Collection::Theme => store::save(store, collection, &self.theme),
            Collection::Rates => store::save(store, collection, &self.rates),
        };
        if let Err(e) = result {
            warn!("Could not persist {collection}: {e:#}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::currency::Currency;
    use crate::core::transactions::TransactionType;
    use crate::store::memory::MemoryStore;
    use anyhow::{Result, anyhow};
    use async_trait::async_trait;
    use std::collections::HashMap;

    struct FailingStore;

    impl SnapshotStore for FailingStore {
        fn read(&self, _key: &str) -> Result<Option<Vec<u8>>> {
            Ok(None)
        }

        fn write(&self, _key: &str, _value: &[u8]) -> Result<()> {
            Err(anyhow!("quota exceeded"))
        }
    }

    struct MockRateProvider {
        rate: Option<f64>,
    }

    #[async_trait]
    impl RateProvider for MockRateProvider {
        async fn get_rates(&self, _base: &str, targets: &[&str]) -> Result<HashMap<String, f64>> {
            match self.rate {
                Some(rate) => Ok(targets.iter().map(|t| (t.to_string(), rate)).collect()),
                None => Err(anyhow!("network unreachable")),
            }
        }
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn loan() -> NewLoan {
        NewLoan {
            person_name: "Ali Khan".to_string(),
            amount: 150.0,
            currency: Currency::Eur,
            date_lent: date("2023-11-20"),
            due_date: date("2023-12-05"),
            description: "Laptop repair loan".to_string(),
        }
    }

    #[test]
    fn test_state_survives_reload() {
        let store: Arc<dyn SnapshotStore> = Arc::new(MemoryStore::new());
        let mut state = AppState::load(Arc::clone(&store), 300.0);
        let id = state.add_loan(loan());
        state.add_repayment(
            &id,
            NewRepayment {
                amount: 50.0,
                currency: Currency::Eur,
                date: date("2023-11-25"),
            },
        );
        state.add_transaction(NewTransaction {
            amount: 1200.0,
            category: "Rent".to_string(),
            date: date("2023-11-02"),
            kind: TransactionType::Expense,
            description: String::new(),
        });
        assert_eq!(state.toggle_theme(), Theme::Dark);

        let reloaded = AppState::load(store, 300.0);
        assert_eq!(reloaded.ledger().records(), state.ledger().records());
        assert_eq!(reloaded.transactions(), state.transactions());
        assert_eq!(reloaded.theme(), Theme::Dark);
        assert_eq!(
            reloaded.ledger().get(&id).unwrap().status,
            LendStatus::Partial
        );
    }

    #[test]
    fn test_persistence_failure_keeps_memory_state() {
        let mut state = AppState::load(Arc::new(FailingStore), 300.0);
        let id = state.add_loan(loan());
        assert_eq!(state.ledger().len(), 1);

        let status = state.add_repayment(
            &id,
            NewRepayment {
                amount: 150.0,
                currency: Currency::Eur,
                date: date("2023-11-30"),
            },
        );
        assert_eq!(status, Some(LendStatus::Returned));
        assert_eq!(state.ledger().get(&id).unwrap().status, LendStatus::Returned);
    }

    #[test]
    fn test_malformed_snapshot_falls_back_to_default() {
        let store = MemoryStore::new();
        store.write("loans", br#"[{"id": 1, "amount": "lots"}]"#).unwrap();
        store.write("theme", br#""sepia""#).unwrap();
        store.write("rates", br#"{"pkrPerEur": -1.0, "updatedAt": null}"#).unwrap();

        let state = AppState::load(Arc::new(store), 300.0);
        assert!(state.ledger().is_empty());
        assert_eq!(state.theme(), Theme::Light);
        assert_eq!(state.rates().rate(), 300.0);
    }

    #[test]
    fn test_load_reconciles_stale_status() {
        let store = MemoryStore::new();
        let stored = r#"[{
            "id": "l1", "personName": "Ali Khan", "amount": 150, "currency": "EUR",
            "exchangeRateAtLending": 305.5, "dateLent": "2023-11-20", "dueDate": "2023-12-05",
            "status": "pending", "description": "Laptop repair loan",
            "repayments": [{"id": "r1", "amount": 45825, "currency": "PKR",
                            "exchangeRateAtRepayment": 305.5, "date": "2023-11-20"}]
        }]"#;
        store.write("loans", stored.as_bytes()).unwrap();

        let state = AppState::load(Arc::new(store), 300.0);
        assert_eq!(state.ledger().get("l1").unwrap().status, LendStatus::Returned);
    }

    #[tokio::test]
    async fn test_loan_keeps_last_rate_when_provider_fails() {
        let mut state = AppState::load(Arc::new(MemoryStore::new()), 300.0);
        state
            .refresh_rate(&MockRateProvider { rate: Some(305.5) })
            .await;

        let id = state
            .add_loan_with_live_rate(&MockRateProvider { rate: None }, loan())
            .await;

        let rate = state.ledger().get(&id).unwrap().exchange_rate_at_lending;
        assert_eq!(rate, 305.5);
        assert!(rate.is_finite());
    }

    #[tokio::test]
    async fn test_repayment_captures_live_rate() {
        let mut state = AppState::load(Arc::new(MemoryStore::new()), 300.0);
        let id = state.add_loan(loan());

        let status = state
            .add_repayment_with_live_rate(
                &MockRateProvider { rate: Some(305.5) },
                &id,
                NewRepayment {
                    amount: 45825.0,
                    currency: Currency::Pkr,
                    date: date("2023-11-20"),
                },
            )
            .await;

        assert_eq!(status, Some(LendStatus::Returned));
        let record = state.ledger().get(&id).unwrap();
        assert_eq!(record.repayments[0].exchange_rate_at_repayment, 305.5);
        assert_eq!(record.exchange_rate_at_lending, 300.0);
    }

    #[tokio::test]
    async fn test_repayment_for_unknown_loan_leaves_state_unchanged() {
        let mut state = AppState::load(Arc::new(MemoryStore::new()), 300.0);
        state.add_loan(loan());
        let before = state.ledger().records().to_vec();

        let status = state
            .add_repayment_with_live_rate(
                &MockRateProvider { rate: Some(310.0) },
                "missing",
                NewRepayment {
                    amount: 10.0,
                    currency: Currency::Eur,
                    date: date("2023-11-21"),
                },
            )
            .await;

        assert_eq!(status, None);
        assert_eq!(state.ledger().records(), before.as_slice());
        assert_eq!(state.rates().rate(), 300.0);
    }

    #[test]
    fn test_due_alerts_are_added_once() {
        let mut state = AppState::load(Arc::new(MemoryStore::new()), 300.0);
        state.add_loan(loan());

        assert_eq!(state.refresh_due_alerts(date("2023-12-03"), 3), 1);
        assert_eq!(state.refresh_due_alerts(date("2023-12-03"), 3), 0);
        assert_eq!(state.unread_count(), 1);

        assert!(!state.mark_notification_read("missing"));
        let id = state.notifications()[0].id.clone();
        assert!(state.mark_notification_read(&id));
        assert_eq!(state.unread_count(), 0);
    }

    #[test]
    fn test_delete_transaction_and_profile_update() {
        let mut state = AppState::load(Arc::new(MemoryStore::new()), 300.0);
        let id = state.add_transaction(NewTransaction {
            amount: 5000.0,
            category: "Salary".to_string(),
            date: date("2023-11-01"),
            kind: TransactionType::Income,
            description: "Monthly pay".to_string(),
        });
        assert!(state.delete_transaction(&id));
        assert!(!state.delete_transaction(&id));
        assert!(state.transactions().is_empty());

        state.update_profile(UserProfile {
            name: "Yasir Khan".to_string(),
            avatar_seed: "Aneka".to_string(),
        });
        assert_eq!(state.profile().name, "Yasir Khan");
    }
}
