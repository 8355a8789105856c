//! Month-windowed aggregations over transactions for the summary and calendar views.
use crate::core::transactions::{Transaction, TransactionType};
use anyhow::{Context, Result, anyhow};
use chrono::{Datelike, NaiveDate};
use std::collections::{BTreeMap, HashMap};
use std::fmt::Display;
use std::str::FromStr;

/// A calendar month. `month` is 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Month {
    pub year: i32,
    pub month: u32,
}

impl Month {
    pub fn new(year: i32, month: u32) -> Result<Self> {
        if !(1..=12).contains(&month) {
            return Err(anyhow!("Invalid month: {}", month));
        }
        if NaiveDate::from_ymd_opt(year, month, 1).is_none() {
            return Err(anyhow!("Year out of range: {}", year));
        }
        Ok(Month { year, month })
    }

    pub fn of(date: NaiveDate) -> Self {
        Month {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }

    /// Moves by `offset` months, wrapping across year boundaries.
    pub fn shift(&self, offset: i32) -> Self {
        let index = self.year * 12 + (self.month as i32 - 1) + offset;
        Month {
            year: index.div_euclid(12),
            month: index.rem_euclid(12) as u32 + 1,
        }
    }

    pub fn first_day(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
    }

    /// Short label such as "Nov 2023".
    pub fn label(&self) -> String {
        self.first_day()
            .map(|d| d.format("%b %Y").to_string())
            .unwrap_or_else(|| self.to_string())
    }
}

impl Display for Month {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for Month {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (year, month) = s
            .trim()
            .split_once('-')
            .ok_or_else(|| anyhow!("Invalid month (expected YYYY-MM): {}", s))?;
        let year = year
            .parse::<i32>()
            .with_context(|| format!("Invalid year in month: {s}"))?;
        let month = month
            .parse::<u32>()
            .with_context(|| format!("Invalid month number in: {s}"))?;
        Month::new(year, month)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MonthlySummary {
    pub month: Month,
    pub income: f64,
    pub expense: f64,
    pub balance: f64,
    /// Share of income kept, in percent. Zero when there was no income.
    pub savings_rate: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryTotal {
    pub category: String,
    pub total: f64,
    /// Percent of the month's total for the same transaction type.
    pub share: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyFlow {
    pub month: Month,
    pub income: f64,
    pub expense: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DailyTotal {
    pub date: NaiveDate,
    pub total: f64,
    pub count: usize,
}

fn sum_of(transactions: &[Transaction], month: Month, kind: TransactionType) -> f64 {
    transactions
        .iter()
        .filter(|t| t.kind == kind && month.contains(t.date))
        .map(|t| t.amount)
        .sum()
}

pub fn monthly_summary(transactions: &[Transaction], month: Month) -> MonthlySummary {
    let income = sum_of(transactions, month, TransactionType::Income);
    let expense = sum_of(transactions, month, TransactionType::Expense);
    let savings_rate = if income > 0.0 {
        ((income - expense) / income) * 100.0
    } else {
        0.0
    };

    MonthlySummary {
        month,
        income,
        expense,
        balance: income - expense,
        savings_rate,
    }
}

/// Per-category totals for one type, largest first.
pub fn category_breakdown(
    transactions: &[Transaction],
    month: Month,
    kind: TransactionType,
) -> Vec<CategoryTotal> {
    let mut totals: HashMap<&str, f64> = HashMap::new();
    for t in transactions
        .iter()
        .filter(|t| t.kind == kind && month.contains(t.date))
    {
        *totals.entry(t.category.as_str()).or_insert(0.0) += t.amount;
    }

    let grand_total: f64 = totals.values().sum();
    let divisor = if grand_total == 0.0 { 1.0 } else { grand_total };

    let mut breakdown: Vec<CategoryTotal> = totals
        .into_iter()
        .map(|(category, total)| CategoryTotal {
            category: category.to_string(),
            total,
            share: (total / divisor) * 100.0,
        })
        .collect();
    breakdown.sort_by(|a, b| {
        b.total
            .total_cmp(&a.total)
            .then_with(|| a.category.cmp(&b.category))
    });
    breakdown
}

/// Income and expense for the `months` months ending at `end`, oldest first.
pub fn historical_flow(transactions: &[Transaction], end: Month, months: u32) -> Vec<MonthlyFlow> {
    (0..months as i32)
        .rev()
        .map(|back| {
            let month = end.shift(-back);
            MonthlyFlow {
                month,
                income: sum_of(transactions, month, TransactionType::Income),
                expense: sum_of(transactions, month, TransactionType::Expense),
            }
        })
        .collect()
}

/// Sum of every transaction per day of the month, regardless of type.
pub fn daily_totals(transactions: &[Transaction], month: Month) -> Vec<DailyTotal> {
    let mut days: BTreeMap<NaiveDate, (f64, usize)> = BTreeMap::new();
    for t in transactions.iter().filter(|t| month.contains(t.date)) {
        let entry = days.entry(t.date).or_insert((0.0, 0));
        entry.0 += t.amount;
        entry.1 += 1;
    }
    days.into_iter()
        .map(|(date, (total, count))| DailyTotal { date, total, count })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tx(amount: f64, category: &str, date: &str, kind: TransactionType) -> Transaction {
        Transaction {
            id: format!("{category}-{date}"),
            amount,
            category: category.to_string(),
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            kind,
            description: String::new(),
        }
    }

    fn sample() -> Vec<Transaction> {
        use TransactionType::*;
        vec![
            tx(5000.0, "Salary", "2023-11-01", Income),
            tx(1200.0, "Rent", "2023-11-02", Expense),
            tx(300.0, "Food", "2023-11-02", Expense),
            tx(150.0, "Food", "2023-11-20", Expense),
            tx(4800.0, "Salary", "2023-10-01", Income),
            tx(900.0, "Rent", "2023-10-03", Expense),
            tx(200.0, "Travel", "2024-01-15", Expense),
        ]
    }

    #[test]
    fn test_month_rejects_out_of_range_year() {
        assert!("200000000-01".parse::<Month>().is_err());
        assert!(Month::new(i32::MAX, 12).is_err());

        let month: Month = "262000-06".parse().unwrap();
        let flow = historical_flow(&[], month, 4);
        assert_eq!(flow.len(), 4);
        assert_eq!(flow[0].month, Month::new(262000, 3).unwrap());
    }

    #[test]
    fn test_month_shift_wraps_years() {
        let jan = Month::new(2024, 1).unwrap();
        assert_eq!(jan.shift(-1), Month::new(2023, 12).unwrap());
        assert_eq!(jan.shift(-13), Month::new(2022, 12).unwrap());
        assert_eq!(jan.shift(11), Month::new(2024, 12).unwrap());
        assert_eq!(jan.shift(12), Month::new(2025, 1).unwrap());
    }

    #[test]
    fn test_month_parse() {
        assert_eq!("2023-11".parse::<Month>().unwrap(), Month::new(2023, 11).unwrap());
        assert!("2023-13".parse::<Month>().is_err());
        assert!("November".parse::<Month>().is_err());
        assert_eq!(Month::new(2023, 3).unwrap().to_string(), "2023-03");
        assert_eq!(Month::new(2023, 11).unwrap().label(), "Nov 2023");
    }

    #[test]
    fn test_monthly_summary() {
        let summary = monthly_summary(&sample(), Month::new(2023, 11).unwrap());
        assert_eq!(summary.income, 5000.0);
        assert_eq!(summary.expense, 1650.0);
        assert_eq!(summary.balance, 3350.0);
        assert!((summary.savings_rate - 67.0).abs() < 1e-9);
    }

    #[test]
    fn test_monthly_summary_without_income() {
        let summary = monthly_summary(&sample(), Month::new(2024, 1).unwrap());
        assert_eq!(summary.income, 0.0);
        assert_eq!(summary.expense, 200.0);
        assert_eq!(summary.balance, -200.0);
        assert_eq!(summary.savings_rate, 0.0);
    }

    #[test]
    fn test_category_breakdown_sorted_by_total() {
        let breakdown = category_breakdown(
            &sample(),
            Month::new(2023, 11).unwrap(),
            TransactionType::Expense,
        );
        assert_eq!(breakdown.len(), 2);
        assert_eq!(breakdown[0].category, "Rent");
        assert_eq!(breakdown[0].total, 1200.0);
        assert_eq!(breakdown[1].category, "Food");
        assert_eq!(breakdown[1].total, 450.0);
        let shares: f64 = breakdown.iter().map(|c| c.share).sum();
        assert!((shares - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_category_breakdown_empty_month() {
        let breakdown = category_breakdown(
            &sample(),
            Month::new(2022, 5).unwrap(),
            TransactionType::Income,
        );
        assert!(breakdown.is_empty());
    }

    #[test]
    fn test_historical_flow_oldest_first() {
        let flow = historical_flow(&sample(), Month::new(2024, 1).unwrap(), 4);
        let months: Vec<String> = flow.iter().map(|f| f.month.to_string()).collect();
        assert_eq!(months, vec!["2023-10", "2023-11", "2023-12", "2024-01"]);
        assert_eq!(flow[0].income, 4800.0);
        assert_eq!(flow[0].expense, 900.0);
        assert_eq!(flow[2].income, 0.0);
        assert_eq!(flow[3].expense, 200.0);
    }

    #[test]
    fn test_daily_totals_groups_by_day() {
        let days = daily_totals(&sample(), Month::new(2023, 11).unwrap());
        assert_eq!(days.len(), 3);
        assert_eq!(days[1].date.to_string(), "2023-11-02");
        assert_eq!(days[1].total, 1500.0);
        assert_eq!(days[1].count, 2);
    }
}
