//! The interactive tail session.
//!
//! Received frames are written to stdout as `{"topic": .., "data": ..}`
//! lines. Stdin lines are commands:
//!
//! | Line | Effect |
//! |------|--------|
//! | `:sub <topic>` | subscribe to a topic |
//! | `:unsub <topic>` | drop the subscription |
//! | `:hide` / `:show` | report a visibility transition |
//! | anything else | parsed as JSON and sent |

use anyhow::{bail, Context, Result};
use serde_json::{json, Value};
use std::collections::HashMap;
use tokio::io::{AsyncBufReadExt, BufReader};
use topicwire_client::{visibility, Client, Subscriber, VisibilityNotifier};
use tracing::{info, warn};

use crate::config::Config;

/// A parsed stdin line.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Subscribe(String),
    Unsubscribe(String),
    Hide,
    Show,
    Send(Value),
    Empty,
}

impl Command {
    /// Parse one stdin line.
    ///
    /// # Errors
    ///
    /// Returns an error for unknown `:` commands, missing topics and lines
    /// that are not valid JSON.
    pub fn parse(line: &str) -> Result<Self> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(Command::Empty);
        }

        let Some(command) = line.strip_prefix(':') else {
            let value = serde_json::from_str(line).context("Not a command or JSON value")?;
            return Ok(Command::Send(value));
        };

        let (name, arg) = match command.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (command, ""),
        };

        match name {
            "sub" | "unsub" if arg.is_empty() => bail!("Missing topic for :{}", name),
            "sub" => Ok(Command::Subscribe(arg.to_string())),
            "unsub" => Ok(Command::Unsubscribe(arg.to_string())),
            "hide" => Ok(Command::Hide),
            "show" => Ok(Command::Show),
            other => bail!("Unknown command :{}", other),
        }
    }
}

struct Session {
    client: Client,
    visibility: VisibilityNotifier,
    subscriptions: HashMap<String, Subscriber>,
}

impl Session {
    fn subscribe(&mut self, topic: &str) {
        if self.subscriptions.contains_key(topic) {
            info!("Already subscribed to {}", topic);
            return;
        }

        let name = topic.to_string();
        let printer = Subscriber::new(move |data| {
            println!("{}", json!({ "topic": name, "data": data }));
        });
        self.client.subscribe(topic, printer.clone());
        self.subscriptions.insert(topic.to_string(), printer);
        info!("Subscribed to {}", topic);
    }

    fn unsubscribe(&mut self, topic: &str) {
        match self.subscriptions.remove(topic) {
            Some(printer) => {
                self.client.unsubscribe(topic, &printer);
                info!("Unsubscribed from {}", topic);
            }
            None => warn!("Not subscribed to {}", topic),
        }
    }

    fn handle_line(&mut self, line: &str) {
        match Command::parse(line) {
            Ok(Command::Subscribe(topic)) => self.subscribe(&topic),
            Ok(Command::Unsubscribe(topic)) => self.unsubscribe(&topic),
            Ok(Command::Hide) => {
                self.visibility.hidden();
            }
            Ok(Command::Show) => {
                self.visibility.visible();
            }
            Ok(Command::Send(value)) => self.client.send(&value),
            Ok(Command::Empty) => {}
            Err(e) => warn!("{:#}", e),
        }
    }
}

/// Run the tail until interrupted.
///
/// # Errors
///
/// Returns an error if the client cannot be created or stdin fails.
pub async fn run(config: Config) -> Result<()> {
    let (notifier, events) = visibility::channel();
    let client = Client::builder()
        .options(config.client.clone())
        .visibility(events)
        .build()
        .context("Failed to create client")?;

    let mut session = Session {
        client,
        visibility: notifier,
        subscriptions: HashMap::new(),
    };
    for topic in &config.topics {
        session.subscribe(topic);
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    loop {
        tokio::select! {
            line = lines.next_line(), if stdin_open => {
                match line.context("Failed to read stdin")? {
                    Some(line) => session.handle_line(&line),
                    None => {
                        info!("Stdin closed, tailing until interrupted");
                        stdin_open = false;
                    }
                }
            }

            result = tokio::signal::ctrl_c() => {
                result.context("Failed to listen for ctrl-c")?;
                info!("Shutting down");
                break;
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!(
            Command::parse(":sub prices").unwrap(),
            Command::Subscribe("prices".into())
        );
        assert_eq!(
            Command::parse("  :unsub   news  ").unwrap(),
            Command::Unsubscribe("news".into())
        );
        assert_eq!(Command::parse(":hide").unwrap(), Command::Hide);
        assert_eq!(Command::parse(":show").unwrap(), Command::Show);
        assert_eq!(Command::parse("   ").unwrap(), Command::Empty);
    }

    #[test]
    fn test_parse_json_line() {
        assert_eq!(
            Command::parse(r#"{"action": "ping"}"#).unwrap(),
            Command::Send(json!({"action": "ping"}))
        );
        assert_eq!(Command::parse("42").unwrap(), Command::Send(json!(42)));
    }

    #[test]
    fn test_parse_errors() {
        assert!(Command::parse(":sub").is_err());
        assert!(Command::parse(":unsub ").is_err());
        assert!(Command::parse(":bogus").is_err());
        assert!(Command::parse("not json").is_err());
    }
}
