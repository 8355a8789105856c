use super::ui;
use crate::core::{AppState, Currency, LendRecord, NewLoan, NewRepayment, RateProvider};
use anyhow::{Result, bail};
use chrono::NaiveDate;
use clap::Subcommand;
use comfy_table::Cell;
use tracing::info;

#[derive(Debug, Clone, Subcommand)]
pub enum LendAction {
    /// Record a new loan
    Add {
        /// Who received the money
        #[arg(long)]
        name: String,
        #[arg(long)]
        amount: f64,
        #[arg(long, default_value = "EUR")]
        currency: Currency,
        /// Date lent (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
        /// Return date (YYYY-MM-DD)
        #[arg(long)]
        due: NaiveDate,
        #[arg(long, default_value = "")]
        note: String,
    },
    /// Record a repayment against a loan
    Repay {
        /// Loan id or a unique prefix of it
        id: String,
        #[arg(long)]
        amount: f64,
        #[arg(long, default_value = "EUR")]
        currency: Currency,
        /// Repayment date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Show one loan with its repayment timeline
    Show { id: String },
    /// Delete a loan and all its repayments
    Delete { id: String },
    /// List all loans
    List,
}

fn validate_amount(amount: f64) -> Result<()> {
    if !amount.is_finite() || amount <= 0.0 {
        bail!("Amount must be a positive number, got {amount}");
    }
    Ok(())
}

/// Resolves a full id or a unique prefix to the stored loan id.
pub fn resolve_id(state: &AppState, id: &str) -> Option<String> {
    if let Some(record) = state.ledger().get(id) {
        return Some(record.id.clone());
    }
    let mut matches = state
        .ledger()
        .records()
        .iter()
        .filter(|r| !id.is_empty() && r.id.starts_with(id));
    match (matches.next(), matches.next()) {
        (Some(record), None) => Some(record.id.clone()),
        _ => None,
    }
}

fn money(currency: Currency, value: f64, decimals: usize) -> String {
    format!("{}{value:.decimals$}", currency.symbol())
}

fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

pub fn render_loans(records: &[LendRecord], today: NaiveDate) -> String {
    if records.is_empty() {
        return "No loans recorded.".to_string();
    }

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("ID"),
        ui::header_cell("Name"),
        ui::header_cell("Due"),
        ui::header_cell("Principal"),
        ui::header_cell("Paid"),
        ui::header_cell("Left"),
        ui::header_cell("Progress"),
        ui::header_cell("Status"),
        ui::header_cell("Notes"),
    ]);

    for record in records {
        let paid = record.total_repaid();
        table.add_row(vec![
            Cell::new(short_id(&record.id)),
            Cell::new(&record.person_name),
            Cell::new(record.due_date.to_string()),
            ui::amount_cell(money(record.currency, record.amount, 2)),
            ui::amount_cell(money(record.currency, paid, 0)),
            ui::amount_cell(money(record.currency, record.remaining(), 0)),
            ui::amount_cell(format!("{:.0}%", record.progress().min(100.0))),
            ui::status_cell(record.status, record.is_overdue(today)),
            Cell::new(if record.description.is_empty() {
                "N/A"
            } else {
                record.description.as_str()
            }),
        ]);
    }

    table.to_string()
}

pub fn render_loan(record: &LendRecord, today: NaiveDate) -> String {
    let mut output = format!(
        "Loan to {} ({})\n",
        ui::style_text(&record.person_name, ui::StyleType::Title),
        record.id
    );
    output.push_str(&format!(
        "Lent {} on {} at 1€ = {:.2}₨, due {}{}\n",
        money(record.currency, record.amount, 2),
        record.date_lent,
        record.exchange_rate_at_lending,
        record.due_date,
        if record.is_overdue(today) {
            format!(" {}", ui::style_text("(overdue)", ui::StyleType::Error))
        } else {
            String::new()
        }
    ));
    output.push_str(&format!(
        "Paid: {}  Left: {}  Status: {}\n\n",
        money(record.currency, record.total_repaid(), 2),
        money(record.currency, record.remaining(), 2),
        record.status
    ));

    if record.repayments.is_empty() {
        output.push_str(&ui::style_text("No history found.", ui::StyleType::Subtle));
        return output;
    }

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Date"),
        ui::header_cell("Amount"),
        ui::header_cell("Rate"),
        ui::header_cell(&format!("Valued ({})", record.currency)),
    ]);
    for repayment in &record.repayments {
        let rate = if repayment.currency == record.currency {
            "-".to_string()
        } else {
            format!("{:.2}", repayment.exchange_rate_at_repayment)
        };
        table.add_row(vec![
            Cell::new(repayment.date.to_string()),
            ui::amount_cell(money(repayment.currency, repayment.amount, 2)),
            ui::amount_cell(rate),
            ui::amount_cell(money(
                record.currency,
                repayment.normalized(record.currency),
                2,
            )),
        ]);
    }
    output.push_str(&table.to_string());
    output
}

pub async fn run(
    state: &mut AppState,
    provider: &dyn RateProvider,
    action: LendAction,
    today: NaiveDate,
) -> Result<()> {
    match action {
        LendAction::Add {
            name,
            amount,
            currency,
            date,
            due,
            note,
        } => {
            validate_amount(amount)?;
            if name.trim().is_empty() {
                bail!("Recipient name must not be empty");
            }

            let pb = ui::new_spinner("Fetching EUR → PKR rate...");
            let id = state
                .add_loan_with_live_rate(
                    provider,
                    NewLoan {
                        person_name: name.trim().to_string(),
                        amount,
                        currency,
                        date_lent: date.unwrap_or(today),
                        due_date: due,
                        description: note,
                    },
                )
                .await;
            pb.finish_and_clear();

            info!("Recorded loan {id}");
            if let Some(record) = state.ledger().get(&id) {
                println!(
                    "Recorded loan {} to {}: {} at 1€ = {:.2}₨",
                    short_id(&record.id),
                    record.person_name,
                    money(record.currency, record.amount, 2),
                    record.exchange_rate_at_lending
                );
            }
        }
        LendAction::Repay {
            id,
            amount,
            currency,
            date,
        } => {
            validate_amount(amount)?;
            let Some(loan_id) = resolve_id(state, &id) else {
                println!("No loan matches '{id}'; nothing recorded.");
                return Ok(());
            };

            let pb = ui::new_spinner("Fetching EUR → PKR rate...");
            let status = state
                .add_repayment_with_live_rate(
                    provider,
                    &loan_id,
                    NewRepayment {
                        amount,
                        currency,
                        date: date.unwrap_or(today),
                    },
                )
                .await;
            pb.finish_and_clear();

            if let (Some(status), Some(record)) = (status, state.ledger().get(&loan_id)) {
                println!(
                    "Recorded {} from {}. Left: {} ({status})",
                    money(currency, amount, 2),
                    record.person_name,
                    money(record.currency, record.remaining(), 2)
                );
            }
        }
        LendAction::Show { id } => match resolve_id(state, &id).and_then(|id| state.ledger().get(&id)) {
            Some(record) => println!("{}", render_loan(record, today)),
            None => println!("No loan matches '{id}'."),
        },
        LendAction::Delete { id } => match resolve_id(state, &id) {
            Some(loan_id) if state.delete_loan(&loan_id) => {
                println!("Deleted loan {}", short_id(&loan_id))
            }
            _ => println!("No loan matches '{id}'; nothing deleted."),
        },
        LendAction::List => println!("{}", render_loans(state.ledger().records(), today)),
    }
    Ok(())
}
