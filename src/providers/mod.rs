pub mod fixed;
pub mod yahoo_finance;

use crate::core::config::AppConfig;
use crate::core::currency::RateProvider;
use fixed::FixedRateProvider;
use tracing::debug;
use yahoo_finance::YahooCurrencyProvider;

/// Picks the rate provider named by the config. A fixed rate wins over Yahoo.
pub fn from_config(config: &AppConfig) -> Box<dyn RateProvider> {
    if let Some(fixed) = &config.providers.fixed {
        debug!("Using fixed rate provider at {}", fixed.pkr_per_eur);
        return Box::new(FixedRateProvider::eur_pkr(fixed.pkr_per_eur));
    }

    let base_url = config
        .providers
        .yahoo
        .as_ref()
        .map_or("https://query1.finance.yahoo.com", |p| &p.base_url);
    debug!("Using Yahoo rate provider at {base_url}");
    Box::new(YahooCurrencyProvider::new(base_url))
}
