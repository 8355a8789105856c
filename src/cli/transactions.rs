use super::ui;
use crate::core::analytics::Month;
use crate::core::{AppState, NewTransaction, Transaction, TransactionType};
use anyhow::{Result, bail};
use chrono::NaiveDate;
use clap::Subcommand;
use comfy_table::Cell;

#[derive(Debug, Clone, Subcommand)]
pub enum TxAction {
    /// Record an income or expense
    Add {
        #[arg(long)]
        amount: f64,
        #[arg(long)]
        category: String,
        /// income or expense
        #[arg(long, default_value = "expense")]
        kind: TransactionType,
        /// Transaction date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long, default_value = "")]
        note: String,
    },
    /// Delete a transaction
    Delete { id: String },
    /// List transactions, optionally for one month (YYYY-MM)
    List {
        #[arg(long)]
        month: Option<Month>,
    },
}

pub fn render_transactions(transactions: &[Transaction]) -> String {
    if transactions.is_empty() {
        return "No transactions recorded.".to_string();
    }

    let mut sorted: Vec<&Transaction> = transactions.iter().collect();
    sorted.sort_by(|a, b| b.date.cmp(&a.date));

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("ID"),
        ui::header_cell("Date"),
        ui::header_cell("Category"),
        ui::header_cell("Amount"),
        ui::header_cell("Description"),
    ]);
    for t in sorted {
        let signed = match t.kind {
            TransactionType::Income => t.amount,
            TransactionType::Expense => -t.amount,
        };
        table.add_row(vec![
            Cell::new(t.id.get(..8).unwrap_or(&t.id)),
            Cell::new(t.date.to_string()),
            Cell::new(&t.category),
            ui::balance_cell(signed, format!("{signed:+.2}")),
            Cell::new(&t.description),
        ]);
    }
    table.to_string()
}

pub fn run(state: &mut AppState, action: TxAction, today: NaiveDate) -> Result<()> {
    match action {
        TxAction::Add {
            amount,
            category,
            kind,
            date,
            note,
        } => {
            if !amount.is_finite() || amount <= 0.0 {
                bail!("Amount must be a positive number, got {amount}");
            }
            if category.trim().is_empty() {
                bail!("Category must not be empty");
            }
            let id = state.add_transaction(NewTransaction {
                amount,
                category: category.trim().to_string(),
                date: date.unwrap_or(today),
                kind,
                description: note,
            });
            println!("Recorded {kind} {amount:.2} ({}) as {}", category.trim(), &id[..8]);
        }
        TxAction::Delete { id } => {
            let matches: Vec<String> = state
                .transactions()
                .iter()
                .filter(|t| !id.is_empty() && t.id.starts_with(&id))
                .map(|t| t.id.clone())
                .collect();
            match matches.as_slice() {
                [only] if state.delete_transaction(only) => println!("Deleted transaction {id}"),
                _ => println!("No single transaction matches '{id}'; nothing deleted."),
            }
        }
        TxAction::List { month } => {
            let selected: Vec<Transaction> = state
                .transactions()
                .iter()
                .filter(|t| month.is_none_or(|m| m.contains(t.date)))
                .cloned()
                .collect();
            println!("{}", render_transactions(&selected));
        }
    }
    Ok(())
}
