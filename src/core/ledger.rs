//! Peer lending ledger: loans, repayments and their normalized totals.
use crate::core::currency::Currency;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LendStatus {
    Pending,
    Partial,
    Returned,
}

impl Display for LendStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                LendStatus::Pending => "pending",
                LendStatus::Partial => "partial",
                LendStatus::Returned => "returned",
            }
        )
    }
}

/// A single repayment against a loan. Never edited after it is appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Repayment {
    pub id: String,
    pub amount: f64,
    pub currency: Currency,
    /// PKR per 1 EUR at the moment the repayment was recorded.
    pub exchange_rate_at_repayment: f64,
    pub date: NaiveDate,
}

impl Repayment {
    /// This repayment expressed in `principal` currency, using its own captured rate.
    pub fn normalized(&self, principal: Currency) -> f64 {
        normalize(
            self.amount,
            self.currency,
            principal,
            self.exchange_rate_at_repayment,
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LendRecord {
    pub id: String,
    pub person_name: String,
    /// Original principal, in `currency`.
    pub amount: f64,
    pub currency: Currency,
    /// PKR per 1 EUR on the day the loan was made.
    pub exchange_rate_at_lending: f64,
    pub date_lent: NaiveDate,
    pub due_date: NaiveDate,
    pub status: LendStatus,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub repayments: Vec<Repayment>,
}

impl LendRecord {
    pub fn total_repaid(&self) -> f64 {
        total_repaid(self)
    }

    pub fn remaining(&self) -> f64 {
        (self.amount - self.total_repaid()).max(0.0)
    }

    /// Percentage of the principal repaid. Not capped at 100.
    pub fn progress(&self) -> f64 {
        if self.amount > 0.0 {
            (self.total_repaid() / self.amount) * 100.0
        } else {
            0.0
        }
    }

    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.status != LendStatus::Returned && self.due_date < today
    }

    /// Re-derives `status` from the repayments. Returns true if it changed.
    pub fn reconcile_status(&mut self) -> bool {
        let resolved = if self.repayments.is_empty() {
            LendStatus::Pending
        } else {
            resolve_status(self.amount, self.total_repaid())
        };
        let changed = resolved != self.status;
        self.status = resolved;
        changed
    }
}

/// Input for a new loan. Id, status and rate are assigned by the ledger.
#[derive(Debug, Clone)]
pub struct NewLoan {
    pub person_name: String,
    pub amount: f64,
    pub currency: Currency,
    pub date_lent: NaiveDate,
    pub due_date: NaiveDate,
    pub description: String,
}

#[derive(Debug, Clone)]
pub struct NewRepayment {
    pub amount: f64,
    pub currency: Currency,
    pub date: NaiveDate,
}

/// Converts `amount` between EUR and PKR with `rate` (PKR per 1 EUR).
pub fn convert(amount: f64, from: Currency, to: Currency, rate: f64) -> f64 {
    match (from, to) {
        (Currency::Pkr, Currency::Eur) => amount / rate,
        (Currency::Eur, Currency::Pkr) => amount * rate,
        _ => amount,
    }
}

/// Expresses a repayment amount in the principal currency.
pub fn normalize(amount: f64, currency: Currency, principal: Currency, rate: f64) -> f64 {
    convert(amount, currency, principal, rate)
}

/// Expresses a principal-currency value back in `currency`.
pub fn denormalize(value: f64, principal: Currency, currency: Currency, rate: f64) -> f64 {
    convert(value, principal, currency, rate)
}

/// Sum of all repayments, in the record's principal currency.
pub fn total_repaid(record: &LendRecord) -> f64 {
    record
        .repayments
        .iter()
        .map(|r| r.normalized(record.currency))
        .sum()
}

pub fn resolve_status(principal: f64, total_repaid: f64) -> LendStatus {
    if total_repaid >= principal {
        LendStatus::Returned
    } else if total_repaid > 0.0 {
        LendStatus::Partial
    } else {
        LendStatus::Pending
    }
}

/// In-memory collection of lending records.
#[derive(Debug, Clone, Default)]
pub struct Ledger {
    records: Vec<LendRecord>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: Vec<LendRecord>) -> Self {
        Ledger { records }
    }

    pub fn records(&self) -> &[LendRecord] {
        &self.records
    }

    pub fn get(&self, id: &str) -> Option<&LendRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Appends a pending loan with no repayments and returns its id.
    pub fn add_loan(&mut self, loan: NewLoan, rate: f64) -> String {
        let id = Uuid::new_v4().to_string();
        debug!(
            "Adding loan {id} to {} of {} {} at rate {rate}",
            loan.person_name, loan.amount, loan.currency
        );
        self.records.push(LendRecord {
            id: id.clone(),
            person_name: loan.person_name,
            amount: loan.amount,
            currency: loan.currency,
            exchange_rate_at_lending: rate,
            date_lent: loan.date_lent,
            due_date: loan.due_date,
            status: LendStatus::Pending,
            description: loan.description,
            repayments: Vec::new(),
        });
        id
    }

    /// Appends a repayment and re-resolves the loan's status.
    ///
    /// Returns `None` without touching the ledger if `loan_id` is unknown.
    pub fn add_repayment(
        &mut self,
        loan_id: &str,
        repayment: NewRepayment,
        rate: f64,
    ) -> Option<LendStatus> {
        let Some(record) = self.records.iter_mut().find(|r| r.id == loan_id) else {
            debug!("Ignoring repayment for unknown loan {loan_id}");
            return None;
        };

        record.repayments.push(Repayment {
            id: Uuid::new_v4().to_string(),
            amount: repayment.amount,
            currency: repayment.currency,
            exchange_rate_at_repayment: rate,
            date: repayment.date,
        });

        let total = record.total_repaid();
        record.status = resolve_status(record.amount, total);
        debug!(
            "Loan {loan_id} repaid {total} of {} {}: {}",
            record.amount, record.currency, record.status
        );
        Some(record.status)
    }

    pub fn delete_loan(&mut self, loan_id: &str) -> bool {
        let before = self.records.len();
        self.records.retain(|r| r.id != loan_id);
        before != self.records.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn laptop_loan() -> NewLoan {
        NewLoan {
            person_name: "Ali Khan".to_string(),
            amount: 150.0,
            currency: Currency::Eur,
            date_lent: date("2023-11-20"),
            due_date: date("2023-12-05"),
            description: "Laptop repair loan".to_string(),
        }
    }

    fn repay(amount: f64, currency: Currency) -> NewRepayment {
        NewRepayment {
            amount,
            currency,
            date: date("2023-11-20"),
        }
    }

    #[test]
    fn test_new_loan_is_pending_with_captured_rate() {
        let mut ledger = Ledger::new();
        let id = ledger.add_loan(laptop_loan(), 305.5);

        let record = ledger.get(&id).unwrap();
        assert_eq!(record.status, LendStatus::Pending);
        assert!(record.repayments.is_empty());
        assert_eq!(record.exchange_rate_at_lending, 305.5);
        assert_eq!(record.total_repaid(), 0.0);
        assert_eq!(record.remaining(), 150.0);
    }

    #[test]
    fn test_pkr_repayment_settles_eur_loan() {
        let mut ledger = Ledger::new();
        let id = ledger.add_loan(laptop_loan(), 305.5);

        let status = ledger.add_repayment(&id, repay(45825.0, Currency::Pkr), 305.5);

        let record = ledger.get(&id).unwrap();
        assert!((record.total_repaid() - 150.0).abs() < 1e-9);
        assert_eq!(status, Some(LendStatus::Returned));
        assert_eq!(record.status, LendStatus::Returned);
        assert_eq!(record.remaining(), 0.0);
    }

    #[test]
    fn test_partial_repayment_in_principal_currency() {
        let mut ledger = Ledger::new();
        let id = ledger.add_loan(laptop_loan(), 305.5);

        let status = ledger.add_repayment(&id, repay(50.0, Currency::Eur), 310.0);

        let record = ledger.get(&id).unwrap();
        assert_eq!(status, Some(LendStatus::Partial));
        assert_eq!(record.total_repaid(), 50.0);
        assert_eq!(record.remaining(), 100.0);
        assert!((record.progress() - 100.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_pkr_loan_multiplies_eur_repayment() {
        let mut ledger = Ledger::new();
        let id = ledger.add_loan(
            NewLoan {
                amount: 60000.0,
                currency: Currency::Pkr,
                ..laptop_loan()
            },
            300.0,
        );

        ledger.add_repayment(&id, repay(100.0, Currency::Eur), 300.0);
        let record = ledger.get(&id).unwrap();
        assert_eq!(record.total_repaid(), 30000.0);
        assert_eq!(record.status, LendStatus::Partial);
    }

    #[test]
    fn test_each_repayment_uses_its_own_rate() {
        let mut ledger = Ledger::new();
        let id = ledger.add_loan(laptop_loan(), 300.0);

        ledger.add_repayment(&id, repay(15000.0, Currency::Pkr), 300.0);
        ledger.add_repayment(&id, repay(15500.0, Currency::Pkr), 310.0);

        let record = ledger.get(&id).unwrap();
        assert!((record.total_repaid() - 100.0).abs() < 1e-9);
        assert_eq!(record.status, LendStatus::Partial);
    }

    #[test]
    fn test_status_consistent_after_every_repayment() {
        let mut ledger = Ledger::new();
        let id = ledger.add_loan(laptop_loan(), 300.0);
        let steps = [
            (10.0, Currency::Eur, 300.0),
            (3000.0, Currency::Pkr, 300.0),
            (0.5, Currency::Eur, 301.0),
            (9000.0, Currency::Pkr, 312.5),
            (60.0, Currency::Eur, 299.0),
            (100.0, Currency::Eur, 305.0),
        ];

        for (amount, currency, rate) in steps {
            ledger.add_repayment(&id, repay(amount, currency), rate);
            let record = ledger.get(&id).unwrap();
            assert_eq!(
                record.status,
                resolve_status(record.amount, total_repaid(record))
            );
        }
        assert_eq!(ledger.get(&id).unwrap().status, LendStatus::Returned);
    }

    #[test]
    fn test_same_currency_normalization_is_identity() {
        for amount in [0.0, 0.01, 42.0, 1234.5678] {
            let eur = Repayment {
                id: "r".to_string(),
                amount,
                currency: Currency::Eur,
                exchange_rate_at_repayment: 305.5,
                date: date("2024-01-01"),
            };
            assert_eq!(eur.normalized(Currency::Eur), amount);
            let pkr = Repayment {
                currency: Currency::Pkr,
                ..eur
            };
            assert_eq!(pkr.normalized(Currency::Pkr), amount);
        }
    }

    #[test]
    fn test_conversion_round_trip() {
        for (amount, rate) in [(45750.0, 305.5), (1.0, 299.99), (123456.78, 287.1)] {
            let eur = normalize(amount, Currency::Pkr, Currency::Eur, rate);
            let back = denormalize(eur, Currency::Eur, Currency::Pkr, rate);
            assert!((back - amount).abs() < 1e-6 * amount.max(1.0));

            let pkr = normalize(amount, Currency::Eur, Currency::Pkr, rate);
            let back = denormalize(pkr, Currency::Pkr, Currency::Eur, rate);
            assert!((back - amount).abs() < 1e-6 * amount.max(1.0));
        }
    }

    #[test]
    fn test_total_repaid_is_idempotent() {
        let mut ledger = Ledger::new();
        let id = ledger.add_loan(laptop_loan(), 300.0);
        ledger.add_repayment(&id, repay(7000.0, Currency::Pkr), 303.0);
        ledger.add_repayment(&id, repay(20.0, Currency::Eur), 303.0);

        let record = ledger.get(&id).unwrap().clone();
        let first = total_repaid(&record);
        let second = total_repaid(&record);
        assert_eq!(first, second);
        assert_eq!(&record, ledger.get(&id).unwrap());
    }

    #[test]
    fn test_repayment_for_unknown_loan_is_ignored() {
        let mut ledger = Ledger::new();
        ledger.add_loan(laptop_loan(), 300.0);
        let before = ledger.records().to_vec();

        let status = ledger.add_repayment("missing", repay(10.0, Currency::Eur), 300.0);

        assert_eq!(status, None);
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.records(), before.as_slice());
    }

    #[test]
    fn test_delete_loan_removes_record_and_repayments() {
        let mut ledger = Ledger::new();
        let keep = ledger.add_loan(laptop_loan(), 300.0);
        let gone = ledger.add_loan(laptop_loan(), 300.0);
        ledger.add_repayment(&gone, repay(10.0, Currency::Eur), 300.0);

        assert!(ledger.delete_loan(&gone));
        assert!(!ledger.delete_loan(&gone));
        assert_eq!(ledger.len(), 1);
        assert!(ledger.get(&keep).is_some());
    }

    #[test]
    fn test_overdue_excludes_returned_and_due_today() {
        let mut ledger = Ledger::new();
        let id = ledger.add_loan(laptop_loan(), 300.0);
        let record = ledger.get(&id).unwrap();

        assert!(!record.is_overdue(date("2023-12-05")));
        assert!(record.is_overdue(date("2023-12-06")));

        ledger.add_repayment(&id, repay(150.0, Currency::Eur), 300.0);
        assert!(!ledger.get(&id).unwrap().is_overdue(date("2024-06-01")));
    }

    #[test]
    fn test_reconcile_status_fixes_stale_status() {
        let mut ledger = Ledger::new();
        let id = ledger.add_loan(laptop_loan(), 300.0);
        ledger.add_repayment(&id, repay(150.0, Currency::Eur), 300.0);

        let mut record = ledger.get(&id).unwrap().clone();
        record.status = LendStatus::Pending;
        assert!(record.reconcile_status());
        assert_eq!(record.status, LendStatus::Returned);
        assert!(!record.reconcile_status());
    }

    #[test]
    fn test_record_serializes_with_camel_case_fields() {
        let mut ledger = Ledger::new();
        ledger.add_loan(laptop_loan(), 305.5);
        let json = serde_json::to_value(&ledger.records()[0]).unwrap();

        assert_eq!(json["personName"], "Ali Khan");
        assert_eq!(json["exchangeRateAtLending"], 305.5);
        assert_eq!(json["dateLent"], "2023-11-20");
        assert_eq!(json["status"], "pending");
        assert_eq!(json["currency"], "EUR");
    }
}
