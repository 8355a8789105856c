use anyhow::{Result, anyhow};
use async_trait::async_trait;
use futures::future::join_all;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{debug, instrument};

use crate::core::currency::RateProvider;

/// Exchange rates from the Yahoo Finance chart endpoint, one pair per request.
pub struct YahooCurrencyProvider {
    base_url: String,
}

impl YahooCurrencyProvider {
    pub fn new(base_url: &str) -> Self {
        YahooCurrencyProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn fetch_pair(&self, client: &reqwest::Client, base: &str, target: &str) -> Result<f64> {
        let symbol = format!("{base}{target}=X");
        let url = format!("{}/v8/finance/chart/{symbol}", self.base_url);
        debug!("Requesting currency rate from {}", url);

        let response = client
            .get(&url)
            .send()
            .await
            .map_err(|e| anyhow!("Request error: {} for currency pair: {}", e, symbol))?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "HTTP error: {} for currency pair: {}",
                response.status(),
                symbol
            ));
        }

        let text = response.text().await?;

        let data: YahooCurrencyResponse = serde_json::from_str(&text)
            .map_err(|e| anyhow!("Failed to parse JSON response for {}: {}", symbol, e))?;

        let item = data
            .chart
            .result
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("No rate data found for currency pair: {}", symbol))?;

        Ok(item.meta.regular_market_price)
    }
}

#[derive(Debug, Deserialize)]
struct YahooCurrencyResponse {
    chart: CurrencyChartResult,
}

#[derive(Debug, Deserialize)]
struct CurrencyChartResult {
    result: Vec<CurrencyChartItem>,
}

#[derive(Debug, Deserialize)]
struct CurrencyChartItem {
    meta: CurrencyChartMeta,
}

#[derive(Debug, Deserialize)]
struct CurrencyChartMeta {
    #[serde(alias = "regularMarketPrice")]
    regular_market_price: f64,
}

#[async_trait]
impl RateProvider for YahooCurrencyProvider {
    #[instrument(name = "YahooRateFetch", skip(self), fields(base = %base))]
    async fn get_rates(&self, base: &str, targets: &[&str]) -> Result<HashMap<String, f64>> {
        let client = reqwest::Client::builder()
            .user_agent("hisaab/0.1")
            .build()?;

        let lookups = targets.iter().map(|target| {
            let client = &client;
            async move {
                let rate = if *target == base {
                    Ok(1.0)
                } else {
                    self.fetch_pair(client, base, target).await
                };
                (target.to_string(), rate)
            }
        });

        let mut rates = HashMap::new();
        let mut last_error = None;
        for (target, result) in join_all(lookups).await {
            match result {
                Ok(rate) => {
                    rates.insert(target, rate);
                }
                Err(e) => {
                    debug!("Skipping {target}: {e}");
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(e) if rates.is_empty() => Err(e),
            _ => Ok(rates),
        }
    }
}
