//! Console adapter for development/testing
//!
//! Reads moderation commands from stdin and runs them against one scope
//! backed by the in-memory membership service.

use regex_lite::Regex;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::application::errors::BotError;
use crate::application::services::{ScopeContext, StrikeOutcome};
use crate::infrastructure::directory::InMemoryDirectory;

const HOUR_MS: i64 = 60 * 60 * 1000;

const HELP: &str = "Commands:
  strike <user>                 add a strike (3 = 24h suspension)
  unstrike <user>               remove a strike
  ban <user> <hours>            suspend for a number of hours
  unban <user>                  lift a suspension
  enroll <user> [ib] <course>…  set course roles, e.g. math-hl
  record <user>                 show the moderation record
  roles <user>                  show held roles
  join <user> / leave <user>    change membership
  sweep                         run the reconciler now
  quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Strike(String),
    Unstrike(String),
    Ban { user: String, hours: i64 },
    Unban(String),
    Enroll { user: String, courses: Vec<String>, honors: bool },
    Record(String),
    Roles(String),
    Join(String),
    Leave(String),
    Sweep,
    Help,
    Quit,
}

pub struct ConsoleAdapter {
    prefix: String,
    mention: Regex,
}

impl ConsoleAdapter {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            // Discord-style mentions: <@123> or <@!123>
            mention: Regex::new(r"^<@!?(\d+)>$").expect("static regex"),
        }
    }

    fn user(&self, raw: Option<&str>) -> Result<String, BotError> {
        let raw = raw.ok_or_else(|| BotError::InvalidArgs("missing user".to_string()))?;
        Ok(match self.mention.captures(raw) {
            Some(caps) => caps[1].to_string(),
            None => raw.to_string(),
        })
    }

    /// Parse one input line. Blank lines yield `Ok(None)`.
    pub fn parse(&self, line: &str) -> Result<Option<ConsoleCommand>, BotError> {
        let line = line.trim();
        let line = line.strip_prefix(self.prefix.as_str()).unwrap_or(line);
        let mut parts = line.split_whitespace();
        let Some(name) = parts.next() else {
            return Ok(None);
        };

        let command = match name.to_lowercase().as_str() {
            "strike" => ConsoleCommand::Strike(self.user(parts.next())?),
            "unstrike" => ConsoleCommand::Unstrike(self.user(parts.next())?),
            "ban" => {
                let user = self.user(parts.next())?;
                let hours = parts
                    .next()
                    .and_then(|h| h.parse::<i64>().ok())
                    .filter(|h| *h > 0)
                    .ok_or_else(|| BotError::InvalidArgs("ban needs a positive number of hours".to_string()))?;
                ConsoleCommand::Ban { user, hours }
            }
            "unban" => ConsoleCommand::Unban(self.user(parts.next())?),
            "enroll" => {
                let user = self.user(parts.next())?;
                let mut honors = false;
                let mut courses = Vec::new();
                for part in parts {
                    if part.eq_ignore_ascii_case("ib") {
                        honors = true;
                    } else {
                        courses.push(part.to_string());
                    }
                }
                ConsoleCommand::Enroll { user, courses, honors }
            }
            "record" => ConsoleCommand::Record(self.user(parts.next())?),
            "roles" => ConsoleCommand::Roles(self.user(parts.next())?),
            "join" => ConsoleCommand::Join(self.user(parts.next())?),
            "leave" => ConsoleCommand::Leave(self.user(parts.next())?),
            "sweep" => ConsoleCommand::Sweep,
            "help" => ConsoleCommand::Help,
            "quit" | "exit" => ConsoleCommand::Quit,
            other => return Err(BotError::InvalidArgs(format!("unknown command {:?}", other))),
        };
        Ok(Some(command))
    }

    /// Run a command and return the reply text
    pub async fn execute(
        &self,
        command: ConsoleCommand,
        ctx: &ScopeContext,
        directory: &InMemoryDirectory,
    ) -> Result<String, BotError> {
        let engine = ctx.engine();
        let scope = ctx.scope();
        let reply = match command {
            ConsoleCommand::Strike(user) => match engine.strike(&user).await? {
                StrikeOutcome::Warned { strikes } => format!("{} now has {} strike(s)", user, strikes),
                StrikeOutcome::Suspended { strikes, .. } => {
                    format!("{} reached {} strikes and is suspended for 24 hours", user, strikes)
                }
            },
            ConsoleCommand::Unstrike(user) => {
                if engine.unstrike(&user).await? {
                    format!("Removed a strike from {}", user)
                } else {
                    format!("{} has no strikes", user)
                }
            }
            ConsoleCommand::Ban { user, hours } => {
                let until = hours
                    .checked_mul(HOUR_MS)
                    .and_then(|d| engine.clock().now_ms().checked_add(d))
                    .ok_or_else(|| BotError::InvalidArgs(format!("{} hours is too long", hours)))?;
                engine.ban(&user, until).await?;
                format!("{} is suspended for {} hour(s)", user, hours)
            }
            ConsoleCommand::Unban(user) => {
                if engine.unban(&user).await? {
                    format!("{} is no longer suspended", user)
                } else {
                    format!("No record for {}", user)
                }
            }
            ConsoleCommand::Enroll { user, courses, honors } => {
                let record = engine.enroll(&user, courses, honors).await?;
                format!("Updated {}", record)
            }
            ConsoleCommand::Record(user) => match engine.record(&user).await? {
                Some(record) => record.to_string(),
                None => format!("No record for {}", user),
            },
            ConsoleCommand::Roles(user) => {
                let names = directory.capability_names(scope, &user).await;
                format!("{}: [{}]", user, names.join(", "))
            }
            ConsoleCommand::Join(user) => {
                directory.add_member(scope, &user).await;
                format!("{} joined {}", user, scope)
            }
            ConsoleCommand::Leave(user) => {
                if directory.remove_member(scope, &user).await {
                    format!("{} left {}", user, scope)
                } else {
                    format!("{} is not a member", user)
                }
            }
            ConsoleCommand::Sweep => {
                let report = ctx.sweep().await;
                format!(
                    "Swept {} member(s): {} unbanned, {} failed",
                    report.members, report.unbanned, report.failed
                )
            }
            ConsoleCommand::Help => HELP.to_string(),
            ConsoleCommand::Quit => String::new(),
        };
        Ok(reply)
    }

    /// Read commands from stdin until EOF or `quit`
    pub async fn run(&self, ctx: &ScopeContext, directory: Arc<InMemoryDirectory>) -> Result<(), BotError> {
        tracing::info!("Console ready on scope {} (type 'help')", ctx.scope());
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        while let Some(line) = lines.next_line().await? {
            let command = match self.parse(&line) {
                Ok(Some(command)) => command,
                Ok(None) => continue,
                Err(e) => {
                    println!("[BOT] Error: {}", e);
                    continue;
                }
            };
            if command == ConsoleCommand::Quit {
                break;
            }
            match self.execute(command, ctx, &directory).await {
                Ok(reply) => println!("[BOT] {}", reply),
                Err(e) => println!("[BOT] Error: {}", e),
            }
        }
        Ok(())
    }
}
