use super::ui;
use crate::core::AppState;
use crate::core::notifications::Notification;
use crate::core::profile::UserProfile;
use chrono::NaiveDate;
use comfy_table::Cell;
use tracing::debug;

pub fn render_notifications(notifications: &[Notification]) -> String {
    if notifications.is_empty() {
        return "No notifications.".to_string();
    }

    let mut sorted: Vec<&Notification> = notifications.iter().collect();
    sorted.sort_by(|a, b| b.date.cmp(&a.date));

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell(""),
        ui::header_cell("Date"),
        ui::header_cell("Title"),
        ui::header_cell("Message"),
    ]);
    for n in sorted {
        table.add_row(vec![
            Cell::new(if n.is_read { " " } else { "●" }),
            Cell::new(n.date.to_string()),
            Cell::new(&n.title),
            Cell::new(&n.message),
        ]);
    }
    table.to_string()
}

pub fn notifications(state: &mut AppState, today: NaiveDate, alert_days: i64, read_all: bool) {
    let added = state.refresh_due_alerts(today, alert_days);
    debug!("Added {added} due date alerts");

    println!("{}", render_notifications(state.notifications()));
    if read_all {
        state.mark_all_notifications_read();
        println!("Marked all notifications as read.");
    } else {
        println!("{} unread", state.unread_count());
    }
}

pub fn profile(state: &mut AppState, name: Option<String>, avatar: Option<String>) {
    let current = state.profile().clone();
    let updated = UserProfile {
        name: name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .unwrap_or(current.name.clone()),
        avatar_seed: avatar.unwrap_or(current.avatar_seed.clone()),
    };
    if updated != current {
        state.update_profile(updated);
    }

    let profile = state.profile();
    println!(
        "{} (avatar: {})",
        ui::style_text(&profile.name, ui::StyleType::TotalLabel),
        profile.avatar_seed
    );
}

pub fn theme(state: &mut AppState) {
    let theme = state.toggle_theme();
    println!("Theme set to {theme}");
}
