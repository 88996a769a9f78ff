//! Telegram front end: Bot API client, dispatcher and the polling loop.

pub mod api;
pub mod bot;
pub mod messages;

pub use api::{BotApi, InlineKeyboardButton, InlineKeyboardMarkup, Update, POLL_TIMEOUT_SECS};
pub use bot::{BotAction, Callback, ChatSink, Command, NewsBot};

use std::sync::Arc;

use tokio::time::{sleep, Duration};
use tracing::{debug, info, warn};

use crate::types::Result;

/// Pause after a failed poll before trying again.
const POLL_BACKOFF: Duration = Duration::from_secs(5);

/// Long-poll for updates until Ctrl-C, handling each update on its own task.
pub async fn run_polling(api: Arc<BotApi>, bot: Arc<NewsBot>) -> Result<()> {
    info!("Starting News Bot with Subscription System...");
    let mut offset = 0;

    loop {
        let updates = tokio::select! {
            result = api.get_updates(offset, POLL_TIMEOUT_SECS) => result,
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown requested, stopping polling");
                return Ok(());
            }
        };

        let updates = match updates {
            Ok(updates) => updates,
            Err(e) => {
                warn!("Polling failed: {}; retrying in {:?}", e, POLL_BACKOFF);
                sleep(POLL_BACKOFF).await;
                continue;
            }
        };

        for update in updates {
            offset = offset.max(update.update_id + 1);
            debug!("Dispatching update {}", update.update_id);

            let api = api.clone();
            let bot = bot.clone();
            tokio::spawn(async move {
                bot.handle_update(&update, api.as_ref()).await;
            });
        }
    }
}
