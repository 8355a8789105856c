use crate::core::ledger::{LendRecord, LendStatus};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Info,
    Alert,
    Success,
}

/// How close a loan is to its due date when an alert is raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DueStage {
    Upcoming,
    Today,
    Overdue,
}

/// The loan and stage a due-date alert was raised for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DueAlert {
    pub loan_id: String,
    pub stage: DueStage,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: String,
    pub title: String,
    pub message: String,
    pub date: NaiveDate,
    pub is_read: bool,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_alert: Option<DueAlert>,
}

impl Notification {
    pub fn new(title: &str, message: String, date: NaiveDate, kind: NotificationKind) -> Self {
        Notification {
            id: Uuid::new_v4().to_string(),
            title: title.to_string(),
            message,
            date,
            is_read: false,
            kind,
            due_alert: None,
        }
    }

    /// Alerts for the same loan and stage are duplicates even when the
    /// day count in the message differs.
    fn duplicates(&self, other: &Notification) -> bool {
        match (&self.due_alert, &other.due_alert) {
            (Some(a), Some(b)) => a == b,
            _ => self.title == other.title && self.message == other.message,
        }
    }
}

pub fn unread_count(notifications: &[Notification]) -> usize {
    notifications.iter().filter(|n| !n.is_read).count()
}

/// Marks one notification read. Unknown ids are ignored.
pub fn mark_as_read(notifications: &mut [Notification], id: &str) -> bool {
    match notifications.iter_mut().find(|n| n.id == id) {
        Some(n) => {
            n.is_read = true;
            true
        }
        None => false,
    }
}

pub fn mark_all_as_read(notifications: &mut [Notification]) {
    for n in notifications.iter_mut() {
        n.is_read = true;
    }
}

/// Alerts for unreturned loans due within `within_days` days, or already overdue.
pub fn due_date_alerts(
    records: &[LendRecord],
    today: NaiveDate,
    within_days: i64,
) -> Vec<Notification> {
    records
        .iter()
        .filter(|r| r.status != LendStatus::Returned)
        .filter_map(|r| {
            let days_left = (r.due_date - today).num_days();
            let (stage, message) = match days_left {
                d if d < 0 => (
                    DueStage::Overdue,
                    format!("{}'s loan payment is overdue since {}.", r.person_name, r.due_date),
                ),
                0 => (DueStage::Today, format!("{}'s loan payment is due today.", r.person_name)),
                1 => (
                    DueStage::Upcoming,
                    format!("{}'s loan payment is due tomorrow.", r.person_name),
                ),
                d if d <= within_days => (
                    DueStage::Upcoming,
                    format!("{}'s loan payment is due in {} days.", r.person_name, d),
                ),
                _ => return None,
            };
            let mut alert = Notification::new("Due Date Alert", message, today, NotificationKind::Alert);
            alert.due_alert = Some(DueAlert {
                loan_id: r.id.clone(),
                stage,
            });
            Some(alert)
        })
        .collect()
}

/// Appends the alerts that are not already present. Returns how many were added.
pub fn merge_alerts(notifications: &mut Vec<Notification>, alerts: Vec<Notification>) -> usize {
    let mut added = 0;
    for alert in alerts {
        if !notifications.iter().any(|n| n.duplicates(&alert)) {
            notifications.push(alert);
            added += 1;
        }
    }
    added
}
