//! Currency codes, the exchange-rate lookup contract and the last-known rate.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::Display;
use std::str::FromStr;
use tracing::{debug, info};

/// The two currencies a loan or repayment can be denominated in.
///
/// Every rate in this crate is expressed as PKR units per 1 EUR.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Currency {
    #[serde(rename = "EUR")]
    Eur,
    #[serde(rename = "PKR")]
    Pkr,
}

impl Currency {
    pub fn code(&self) -> &'static str {
        match self {
            Currency::Eur => "EUR",
            Currency::Pkr => "PKR",
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Currency::Eur => "€",
            Currency::Pkr => "₨",
        }
    }
}

impl Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for Currency {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "EUR" => Ok(Currency::Eur),
            "PKR" => Ok(Currency::Pkr),
            _ => Err(anyhow::anyhow!("Unsupported currency: {} (expected EUR or PKR)", s)),
        }
    }
}

/// Looks up live exchange rates from some external source.
///
/// `get_rates` returns a map of target code to "target units per 1 base".
/// Targets the source could not price are left out of the map.
#[async_trait]
pub trait RateProvider: Send + Sync {
    async fn get_rates(&self, base: &str, targets: &[&str]) -> Result<HashMap<String, f64>>;

    /// Single-pair lookup. Errors and unusable values collapse to `None`.
    async fn get_rate(&self, base: &str, target: &str) -> Option<f64> {
        match self.get_rates(base, &[target]).await {
            Ok(rates) => {
                let rate = rates
                    .get(target)
                    .copied()
                    .filter(|r| r.is_finite() && *r > 0.0);
                if rate.is_none() {
                    debug!("No usable rate for {base} -> {target} in provider response");
                }
                rate
            }
            Err(e) => {
                debug!("Rate lookup failed for {base} -> {target}: {e}");
                None
            }
        }
    }
}

/// Last known EUR to PKR rate.
///
/// A failed lookup never clears the rate, so loan and repayment entry can
/// always capture a number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateBook {
    pkr_per_eur: f64,
    updated_at: Option<DateTime<Utc>>,
}

impl RateBook {
    pub fn new(pkr_per_eur: f64) -> Self {
        RateBook {
            pkr_per_eur,
            updated_at: None,
        }
    }

    pub fn rate(&self) -> f64 {
        self.pkr_per_eur
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    pub fn is_usable(&self) -> bool {
        self.pkr_per_eur.is_finite() && self.pkr_per_eur > 0.0
    }

    /// Applies a lookup result. Returns true when the rate changed hands.
    pub fn apply(&mut self, rate: Option<f64>) -> bool {
        match rate {
            Some(rate) if rate.is_finite() && rate > 0.0 => {
                self.pkr_per_eur = rate;
                self.updated_at = Some(Utc::now());
                true
            }
            _ => {
                debug!(
                    "Keeping last known rate {} PKR per EUR",
                    self.pkr_per_eur
                );
                false
            }
        }
    }

    pub async fn refresh(&mut self, provider: &dyn RateProvider) -> bool {
        let rate = provider
            .get_rate(Currency::Eur.code(), Currency::Pkr.code())
            .await;
        let updated = self.apply(rate);
        if updated {
            info!("Updated EUR -> PKR rate to {}", self.pkr_per_eur);
        }
        updated
    }
}
