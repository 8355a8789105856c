use super::ui;
use crate::core::TransactionType;
use crate::core::analytics::{self, CategoryTotal, Month, MonthlyFlow, MonthlySummary};
use crate::core::transactions::Transaction;
use comfy_table::Cell;

const FLOW_MONTHS: u32 = 4;

impl MonthlySummary {
    pub fn display(&self) -> String {
        format!(
            "{}\n\nIncome:   {}\nExpenses: {}\n{}  {}\nSavings rate: {:.1}%",
            ui::style_text(&format!("Summary for {}", self.month.label()), ui::StyleType::Title),
            format_args!("€{:.2}", self.income),
            format_args!("€{:.2}", self.expense),
            ui::style_text("Balance:", ui::StyleType::TotalLabel),
            ui::style_text(
                &format!("€{:.2}", self.balance),
                if self.balance >= 0.0 {
                    ui::StyleType::TotalValue
                } else {
                    ui::StyleType::Error
                }
            ),
            self.savings_rate
        )
    }
}

fn breakdown_table(title: &str, breakdown: &[CategoryTotal]) -> String {
    if breakdown.is_empty() {
        return format!("{title}: {}", ui::style_text("none", ui::StyleType::Subtle));
    }

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell(title),
        ui::header_cell("Total"),
        ui::header_cell("Share"),
    ]);
    for c in breakdown {
        table.add_row(vec![
            Cell::new(&c.category),
            ui::amount_cell(format!("€{:.2}", c.total)),
            ui::amount_cell(format!("{:.1}%", c.share)),
        ]);
    }
    table.to_string()
}

fn flow_table(flow: &[MonthlyFlow]) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Month"),
        ui::header_cell("Income"),
        ui::header_cell("Expenses"),
        ui::header_cell("Net"),
    ]);
    for f in flow {
        let net = f.income - f.expense;
        table.add_row(vec![
            Cell::new(f.month.label()),
            ui::amount_cell(format!("€{:.2}", f.income)),
            ui::amount_cell(format!("€{:.2}", f.expense)),
            ui::balance_cell(net, format!("€{net:.2}")),
        ]);
    }
    table.to_string()
}

pub fn render(transactions: &[Transaction], month: Month) -> String {
    let summary = analytics::monthly_summary(transactions, month);
    let expenses = analytics::category_breakdown(transactions, month, TransactionType::Expense);
    let income = analytics::category_breakdown(transactions, month, TransactionType::Income);
    let flow = analytics::historical_flow(transactions, month, FLOW_MONTHS);

    [
        summary.display(),
        breakdown_table("Expenses", &expenses),
        breakdown_table("Income", &income),
        flow_table(&flow),
    ]
    .join("\n\n")
}

pub fn render_calendar(transactions: &[Transaction], month: Month) -> String {
    let days = analytics::daily_totals(transactions, month);
    let title = ui::style_text(&format!("Cashflow for {}", month.label()), ui::StyleType::Title);
    if days.is_empty() {
        return format!("{title}\n\nNo transactions this month.");
    }

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Date"),
        ui::header_cell("Day"),
        ui::header_cell("Entries"),
        ui::header_cell("Total"),
    ]);
    for day in days {
        table.add_row(vec![
            Cell::new(day.date.to_string()),
            Cell::new(day.date.format("%a").to_string()),
            ui::amount_cell(day.count.to_string()),
            ui::amount_cell(format!("€{:.2}", day.total)),
        ]);
    }
    format!("{title}\n\n{table}")
}
