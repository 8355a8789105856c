use super::ui;
use crate::core::{AppState, Currency, RateProvider};
use anyhow::{Result, bail};
use clap::Args;
use comfy_table::{Cell, Color};
use std::collections::HashMap;
use tracing::{debug, warn};

#[derive(Debug, Clone, Args)]
pub struct RatesArgs {
    /// Currency to convert from
    #[arg(long, default_value = "EUR")]
    pub base: String,
    /// Comma separated currencies to convert to
    #[arg(long = "to", value_delimiter = ',', default_value = "PKR")]
    pub targets: Vec<String>,
    /// Amount of the base currency to convert
    #[arg(long, default_value_t = 1.0)]
    pub amount: f64,
}

impl Default for RatesArgs {
    fn default() -> Self {
        RatesArgs {
            base: Currency::Eur.code().to_string(),
            targets: vec![Currency::Pkr.code().to_string()],
            amount: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuoteSource {
    Live,
    LastKnown,
    Unavailable,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RateQuote {
    pub code: String,
    /// Target units per 1 base.
    pub rate: Option<f64>,
    pub source: QuoteSource,
}

fn currency_code(raw: &str) -> Result<String> {
    let code = raw.trim().to_uppercase();
    if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
        bail!("Invalid currency code: '{raw}' (expected three letters such as EUR)");
    }
    Ok(code)
}

/// The last known rate for the EUR/PKR pair, in either direction.
fn last_known(state: &AppState, base: &str, target: &str) -> Option<f64> {
    let pkr_per_eur = state.rates().rate();
    match (base, target) {
        ("EUR", "PKR") => Some(pkr_per_eur),
        ("PKR", "EUR") => Some(1.0 / pkr_per_eur),
        _ => None,
    }
}

/// Looks up `base` to every target. A live EUR to PKR rate also updates the
/// stored rate. Targets the provider could not price fall back to the last
/// known rate when there is one.
pub async fn fetch_quotes(
    state: &mut AppState,
    provider: &dyn RateProvider,
    args: &RatesArgs,
) -> Result<Vec<RateQuote>> {
    let base = currency_code(&args.base)?;
    let mut targets: Vec<String> = Vec::new();
    for raw in args.targets.iter().filter(|t| !t.trim().is_empty()) {
        let code = currency_code(raw)?;
        if !targets.contains(&code) {
            targets.push(code);
        }
    }
    if targets.is_empty() {
        bail!("At least one target currency is required");
    }

    let target_refs: Vec<&str> = targets.iter().map(String::as_str).collect();
    let live: HashMap<String, f64> = match provider.get_rates(&base, &target_refs).await {
        Ok(rates) => rates
            .into_iter()
            .filter(|(_, r)| r.is_finite() && *r > 0.0)
            .collect(),
        Err(e) => {
            warn!("Rate lookup for {base} failed: {e}");
            HashMap::new()
        }
    };
    debug!("Received {} of {} rates for {base}", live.len(), targets.len());

    let eur = Currency::Eur.code();
    let pkr = Currency::Pkr.code();
    let live_pkr_per_eur = match base.as_str() {
        b if b == eur => live.get(pkr).copied(),
        b if b == pkr => live.get(eur).map(|r| 1.0 / r),
        _ => None,
    };
    if live_pkr_per_eur.is_some() {
        state.apply_rate(live_pkr_per_eur);
    }

    Ok(targets
        .into_iter()
        .map(|code| match live.get(&code).copied() {
            Some(rate) => RateQuote {
                rate: Some(rate),
                source: QuoteSource::Live,
                code,
            },
            None => match last_known(state, &base, &code) {
                Some(rate) => RateQuote {
                    rate: Some(rate),
                    source: QuoteSource::LastKnown,
                    code,
                },
                None => RateQuote {
                    rate: None,
                    source: QuoteSource::Unavailable,
                    code,
                },
            },
        })
        .collect())
}

pub fn render_quotes(state: &AppState, base: &str, amount: f64, quotes: &[RateQuote]) -> String {
    let title = ui::style_text(
        &format!("{amount:.2} {} converts to", base.trim().to_uppercase()),
        ui::StyleType::Title,
    );

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Currency"),
        ui::header_cell("Rate"),
        ui::header_cell("Amount"),
        ui::header_cell("Source"),
    ]);
    for quote in quotes {
        let (rate, converted) = match quote.rate {
            Some(rate) => (format!("{rate:.4}"), format!("{:.2}", amount * rate)),
            None => ("N/A".to_string(), "N/A".to_string()),
        };
        let source = match quote.source {
            QuoteSource::Live => Cell::new("live").fg(Color::Green),
            QuoteSource::LastKnown => Cell::new("last known").fg(Color::Yellow),
            QuoteSource::Unavailable => Cell::new("unavailable").fg(Color::Red),
        };
        table.add_row(vec![
            Cell::new(&quote.code),
            ui::amount_cell(rate),
            ui::amount_cell(converted),
            source,
        ]);
    }

    let updated = state
        .rates()
        .updated_at()
        .map(|t| t.format("%Y-%m-%d %H:%M UTC").to_string())
        .unwrap_or_else(|| "never".to_string());
    format!(
        "{title}\n\n{table}\n{}",
        ui::style_text(
            &format!(
                "EUR → PKR {:.2}, last updated: {updated}",
                state.rates().rate()
            ),
            ui::StyleType::Subtle
        )
    )
}

pub async fn run(state: &mut AppState, provider: &dyn RateProvider, args: RatesArgs) -> Result<()> {
    if !args.amount.is_finite() || args.amount <= 0.0 {
        bail!("Amount must be a positive number, got {}", args.amount);
    }

    let pb = ui::new_spinner("Fetching exchange rates...");
    let quotes = fetch_quotes(state, provider, &args).await;
    pb.finish_and_clear();

    let quotes = quotes?;
    println!("{}", render_quotes(state, &args.base, args.amount, &quotes));
    Ok(())
}
