//! Operator tool for granting and revoking premium by hand.

use std::io::{BufRead, Write};
use std::sync::Arc;

use tracing::info;

use crate::cli::Console;
use crate::render;
use crate::subscription::SubscriptionManager;
use crate::types::Result;

pub struct AdminCli<R, W> {
    subscriptions: Arc<SubscriptionManager>,
    console: Console<R, W>,
}

impl<R: BufRead, W: Write> AdminCli<R, W> {
    pub fn new(subscriptions: Arc<SubscriptionManager>, input: R, output: W) -> Self {
        Self {
            subscriptions,
            console: Console::new(input, output),
        }
    }

    pub fn into_output(self) -> W {
        self.console.into_output()
    }

    pub async fn run(&mut self) -> Result<()> {
        info!("Admin CLI started");
        self.console.say(&"=".repeat(60))?;
        self.console.say("  📰 News Bot - Subscription Admin Tool")?;
        self.console.say(&"=".repeat(60))?;

        loop {
            self.console.say("\nOptions:")?;
            self.console.say("  1. Upgrade user to Premium")?;
            self.console.say("  2. View user status")?;
            self.console.say("  3. List all premium users")?;
            self.console.say("  4. Remove premium access")?;
            self.console.say("  5. Exit")?;

            let Some(choice) = self.console.prompt("\nSelect option (1-5): ")? else {
                break;
            };

            match choice.as_str() {
                "1" => self.upgrade().await?,
                "2" => self.status().await?,
                "3" => self.list_premium().await?,
                "4" => self.revoke().await?,
                "5" => break,
                _ => self.console.say("❌ Invalid option")?,
            }
        }

        self.console.say("\n👋 Goodbye!")?;
        Ok(())
    }

    /// Read a numeric Telegram user id. Prints `error` on bad input.
    fn read_user_id(&mut self, error: &str) -> Result<Option<String>> {
        let Some(raw) = self.console.prompt("Enter Telegram User ID: ")? else {
            return Ok(None);
        };
        match raw.parse::<i64>() {
            Ok(id) => Ok(Some(id.to_string())),
            Err(_) => {
                self.console.say(error)?;
                Ok(None)
            }
        }
    }

    fn confirm(&mut self, question: &str) -> Result<bool> {
        Ok(self
            .console
            .prompt(question)?
            .is_some_and(|answer| answer.eq_ignore_ascii_case("y")))
    }

    async fn upgrade(&mut self) -> Result<()> {
        let Some(user_id) = self.read_user_id("❌ Invalid input")? else {
            return Ok(());
        };
        let Some(raw_months) = self.console.prompt("Duration in months (default 1): ")? else {
            return Ok(());
        };
        let months = if raw_months.is_empty() {
            1
        } else {
            match raw_months.parse::<u32>() {
                Ok(months) => months,
                Err(_) => return self.console.say("❌ Invalid input"),
            }
        };

        let question = format!(
            "\nUpgrade user {} to Premium for {} month(s)? (y/n): ",
            user_id, months
        );
        if !self.confirm(&question)? {
            return self.console.say("❌ Cancelled");
        }

        match self.subscriptions.upgrade(&user_id, months).await {
            Ok(record) => {
                let until = record
                    .expires_at
                    .map(render::date_long)
                    .unwrap_or_else(|| "N/A".to_string());
                self.console.say(&format!(
                    "✅ User {} upgraded to Premium for {} month(s)! (until {})",
                    user_id, months, until
                ))
            }
            Err(e) => self.console.say(&format!("❌ Upgrade failed: {}", e)),
        }
    }

    async fn status(&mut self) -> Result<()> {
        let Some(user_id) = self.read_user_id("❌ Invalid user ID")? else {
            return Ok(());
        };
        let snapshot = self.subscriptions.get_limits(&user_id).await;
        self.console.print(&render::user_status(&user_id, &snapshot))
    }

    async fn list_premium(&mut self) -> Result<()> {
        match self.subscriptions.premium_users().await {
            Ok(users) => self.console.print(&render::premium_users(&users)),
            Err(e) => self.console.say(&format!("❌ Could not read subscriptions: {}", e)),
        }
    }

    async fn revoke(&mut self) -> Result<()> {
        let Some(user_id) = self.read_user_id("❌ Invalid user ID")? else {
            return Ok(());
        };
        if self.subscriptions.record(&user_id).await.is_none() {
            return self
                .console
                .say(&format!("❌ User {} not found in database", user_id));
        }

        let question = format!("\nRemove premium access for user {}? (y/n): ", user_id);
        if !self.confirm(&question)? {
            return self.console.say("❌ Cancelled");
        }

        match self.subscriptions.revoke(&user_id).await {
            Ok(true) => self
                .console
                .say(&format!("✅ Premium access removed for user {}", user_id)),
            Ok(false) => self
                .console
                .say(&format!("❌ User {} not found in database", user_id)),
            Err(e) => self.console.say(&format!("❌ Revoke failed: {}", e)),
        }
    }
}
