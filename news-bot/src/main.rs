use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;

use news_bot::config::AppConfig;
use news_bot::telegram::{self, BotApi, NewsBot};
use news_bot::{logging, AdminCli, NewsServices, ReaderCli};

/// RSS news reader with free/premium tiers, as a terminal app or a Telegram bot
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Subscription file (overrides SUBSCRIPTIONS_PATH)
    #[arg(long, global = true)]
    subscriptions: Option<PathBuf>,

    /// Log level or filter directive (overrides NEWS_BOT_LOG)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    mode: Mode,
}

#[derive(Subcommand, Debug)]
enum Mode {
    /// Browse and search news in the terminal
    Read {
        /// User id whose tier and daily usage apply
        #[arg(long, default_value = "cli")]
        user: String,
    },
    /// Manage premium subscriptions
    Admin,
    /// Run the Telegram bot
    Telegram,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Cli::parse();

    let mut config = AppConfig::from_env().context("invalid configuration")?;
    if let Some(path) = args.subscriptions {
        config.subscriptions_path = path;
    }
    if let Some(level) = args.log_level {
        config.log_level = level;
    }
    logging::init(&config.log_level)?;

    match args.mode {
        Mode::Read { user } => {
            let services = NewsServices::from_config(&config).await?;
            let stdin = io::stdin();
            let mut reader = ReaderCli::new(services, user, stdin.lock(), io::stdout());
            reader.run().await?;
        }
        Mode::Admin => {
            let services = NewsServices::from_config(&config).await?;
            let stdin = io::stdin();
            let mut admin = AdminCli::new(services.subscriptions, stdin.lock(), io::stdout());
            admin.run().await?;
        }
        Mode::Telegram => {
            let token = config
                .require_telegram_token()
                .context("cannot start the Telegram bot")?;
            let api = Arc::new(BotApi::new(token, config.timeout_seconds)?);
            let services = NewsServices::from_config(&config).await?;
            let bot = Arc::new(NewsBot::new(services, config.payment_link.clone()));

            info!(
                "Subscriptions stored in {}",
                config.subscriptions_path.display()
            );
            telegram::run_polling(api, bot).await?;
        }
    }

    Ok(())
}
