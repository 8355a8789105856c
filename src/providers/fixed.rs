use crate::core::currency::RateProvider;
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use std::collections::HashMap;

/// Serves rates from a fixed table. Inverse pairs are derived automatically.
#[derive(Debug, Clone, Default)]
pub struct FixedRateProvider {
    rates: HashMap<String, f64>,
}

impl FixedRateProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eur_pkr(pkr_per_eur: f64) -> Self {
        Self::new().with_rate("EUR", "PKR", pkr_per_eur)
    }

    pub fn with_rate(mut self, from: &str, to: &str, rate: f64) -> Self {
        self.rates.insert(format!("{from}:{to}"), rate);
        if rate != 0.0 {
            self.rates.insert(format!("{to}:{from}"), 1.0 / rate);
        }
        self
    }
}

#[async_trait]
impl RateProvider for FixedRateProvider {
    async fn get_rates(&self, base: &str, targets: &[&str]) -> Result<HashMap<String, f64>> {
        let rates: HashMap<String, f64> = targets
            .iter()
            .filter_map(|target| {
                if *target == base {
                    return Some((target.to_string(), 1.0));
                }
                self.rates
                    .get(&format!("{base}:{target}"))
                    .map(|rate| (target.to_string(), *rate))
            })
            .collect();

        if rates.is_empty() && !targets.is_empty() {
            return Err(anyhow!(
                "No fixed rate for {} to {}",
                base,
                targets.join(", ")
            ));
        }
        Ok(rates)
    }
}
