pub mod cli;
pub mod core;
pub mod providers;
pub mod store;

use crate::cli::lend::LendAction;
use crate::cli::rates::RatesArgs;
use crate::cli::transactions::TxAction;
use crate::core::analytics::Month;
use crate::core::config::AppConfig;
use crate::core::state::AppState;
use crate::store::disk::DiskStore;
use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, info};

pub enum AppCommand {
    Lend(LendAction),
    Tx(TxAction),
    Summary { month: Option<Month> },
    Calendar { month: Option<Month> },
    Rates(RatesArgs),
    Notifications { read_all: bool },
    Profile { name: Option<String>, avatar: Option<String> },
    Theme,
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("Hisaab starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    let data_path = config.data_path()?;
    let store = DiskStore::open(&data_path)?;
    let mut state = AppState::load(Arc::new(store), config.default_pkr_rate);
    let provider = providers::from_config(&config);
    let today = chrono::Local::now().date_naive();

    match command {
        AppCommand::Lend(action) => cli::lend::run(&mut state, provider.as_ref(), action, today).await?,
        AppCommand::Tx(action) => cli::transactions::run(&mut state, action, today)?,
        AppCommand::Summary { month } => {
            let month = month.unwrap_or_else(|| Month::of(today));
            println!("{}", cli::summary::render(state.transactions(), month));
        }
        AppCommand::Calendar { month } => {
            let month = month.unwrap_or_else(|| Month::of(today));
            println!("{}", cli::summary::render_calendar(state.transactions(), month));
        }
        AppCommand::Rates(args) => cli::rates::run(&mut state, provider.as_ref(), args).await?,
        AppCommand::Notifications { read_all } => {
            cli::settings::notifications(&mut state, today, config.alert_days, read_all)
        }
        AppCommand::Profile { name, avatar } => cli::settings::profile(&mut state, name, avatar),
        AppCommand::Theme => cli::settings::theme(&mut state),
    }
    Ok(())
}
