//! CLI channel — stdin/stdout REPL for local testing.
//!
//! Input conventions:
//! - `/command` is a slash command,
//! - `!payload` presses a button with that payload,
//! - `?payload` simulates the user opening the bot through a deep link,
//! - anything else is a plain message.

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_stream::wrappers::UnboundedReceiverStream;

use crate::channels::{Channel, EventStream};
use crate::error::ChannelError;
use crate::menu::{MenuAction, MenuDescriptor};
use crate::router::{Caller, Event, Outbound};

/// User id reported for the local user.
pub const CLI_USER_ID: i64 = 1;

/// A simple CLI channel that reads from stdin and writes to stdout.
pub struct CliChannel {
    caller: Caller,
}

impl CliChannel {
    pub fn new() -> Self {
        Self {
            caller: Caller::new(CLI_USER_ID, CLI_USER_ID)
                .with_first_name("Local")
                .with_username("local"),
        }
    }
}

impl Default for CliChannel {
    fn default() -> Self {
        Self::new()
    }
}

/// Turn one input line into an event.
pub fn parse_line(caller: &Caller, line: &str) -> Event {
    let caller = caller.clone();
    if let Some(payload) = line.strip_prefix('!') {
        return Event::action(caller, "cli", payload.trim());
    }
    if let Some(payload) = line.strip_prefix('?') {
        let payload = payload.trim();
        let payload = (!payload.is_empty()).then(|| payload.to_string());
        return Event::bot_started(caller, payload);
    }
    Event::from_text(caller, Some(line))
}

/// Draw a menu as numbered text rows.
pub fn render_menu(menu: &MenuDescriptor) -> String {
    let mut lines = Vec::new();
    let mut n = 0;
    for row in &menu.rows {
        let cells: Vec<String> = row
            .iter()
            .map(|action| {
                n += 1;
                match action {
                    MenuAction::Callback { label, payload } => format!("[{n}] {label} (!{payload})"),
                    MenuAction::Link { label, url } => format!("[{n}] {label} → {url}"),
                }
            })
            .collect();
        lines.push(format!("  {}", cells.join("   ")));
    }
    lines.join("\n")
}

#[async_trait]
impl Channel for CliChannel {
    fn name(&self) -> &str {
        "cli"
    }

    async fn start(&self) -> Result<EventStream, ChannelError> {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        let caller = self.caller.clone();

        tokio::spawn(async move {
            let stdin = tokio::io::stdin();
            let reader = BufReader::new(stdin);
            let mut lines = reader.lines();

            eprint!("> ");

            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        let line = line.trim().to_string();
                        if line.is_empty() {
                            eprint!("> ");
                            continue;
                        }
                        if tx.send(parse_line(&caller, &line)).is_err() {
                            break;
                        }
                    }
                    Ok(None) => break, // EOF
                    Err(e) => {
                        tracing::error!("Error reading stdin: {}", e);
                        break;
                    }
                }
            }
        });

        Ok(Box::pin(UnboundedReceiverStream::new(rx)))
    }

    async fn deliver(&self, _event: &Event, outbound: Outbound) -> Result<(), ChannelError> {
        match outbound {
            Outbound::Ack { notification, .. } => {
                if let Some(text) = notification {
                    eprintln!("✓ {text}");
                }
            }
            Outbound::Reply(reply) => {
                println!("\n{}", reply.text);
                if let Some(menu) = reply.menu.as_ref().filter(|m| !m.is_empty()) {
                    println!("{}", render_menu(menu));
                }
                println!();
                eprint!("> ");
            }
        }
        Ok(())
    }

    async fn health_check(&self) -> Result<(), ChannelError> {
        Ok(())
    }
}
