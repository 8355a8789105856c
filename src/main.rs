use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use hisaab::cli::lend::LendAction;
use hisaab::cli::rates::RatesArgs;
use hisaab::cli::transactions::TxAction;
use hisaab::core::analytics::Month;
use hisaab::core::log::init_logging;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

impl From<Commands> for hisaab::AppCommand {
    fn from(cmd: Commands) -> hisaab::AppCommand {
        match cmd {
            Commands::Lend { action } => hisaab::AppCommand::Lend(action),
            Commands::Tx { action } => hisaab::AppCommand::Tx(action),
            Commands::Summary { month } => hisaab::AppCommand::Summary { month },
            Commands::Calendar { month } => hisaab::AppCommand::Calendar { month },
            Commands::Rates(args) => hisaab::AppCommand::Rates(args),
            Commands::Notifications { read_all } => hisaab::AppCommand::Notifications { read_all },
            Commands::Profile { name, avatar } => hisaab::AppCommand::Profile { name, avatar },
            Commands::Theme => hisaab::AppCommand::Theme,
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Track money lent to others
    Lend {
        #[command(subcommand)]
        action: LendAction,
    },
    /// Record income and expenses
    Tx {
        #[command(subcommand)]
        action: TxAction,
    },
    /// Display the monthly summary (YYYY-MM, defaults to this month)
    Summary {
        #[arg(long)]
        month: Option<Month>,
    },
    /// Display daily totals for a month
    Calendar {
        #[arg(long)]
        month: Option<Month>,
    },
    /// Fetch live exchange rates and convert an amount
    Rates(RatesArgs),
    /// Display notifications and due date alerts
    Notifications {
        /// Mark every notification as read
        #[arg(long)]
        read_all: bool,
    },
    /// Show or update the user profile
    Profile {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        avatar: Option<String>,
    },
    /// Switch between light and dark theme
    Theme,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => match cli.config_path.as_deref() {
            Some(path) => hisaab::cli::setup::setup_at_path(path),
            None => hisaab::cli::setup::setup(),
        },
        Some(cmd) => hisaab::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
