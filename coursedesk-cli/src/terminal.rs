//! Terminal implementations of the feed and session hooks.

use std::io::Write;

use async_trait::async_trait;
use coursedesk_lib::auth::Navigator;
use coursedesk_lib::feed::AlertSink;
use coursedesk_lib::feed::Confirm;
use coursedesk_lib::model::Notification;
use log::info;
use log::warn;
use tokio::io::AsyncBufReadExt;
use tokio::io::AsyncWriteExt;
use tokio::io::BufReader;

/// Path the CLI reports as its location. Every command is an admin screen.
const CONSOLE_PATH: &str = "/admin";

/// Writes `question` and reads one trimmed line from stdin.
pub async fn prompt(question: &str) -> std::io::Result<String> {
    let mut stdout = tokio::io::stdout();
    stdout.write_all(question.as_bytes()).await?;
    stdout.flush().await?;

    let mut line = String::new();
    BufReader::new(tokio::io::stdin())
        .read_line(&mut line)
        .await?;
    Ok(line.trim().to_string())
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.to_ascii_lowercase().as_str(), "y" | "yes")
}

fn delete_label(notification: &Notification) -> String {
    let message = notification.plain_message();
    if message.trim().is_empty() {
        format!("notification {}", notification.id)
    } else {
        message
    }
}

/// Asks on the terminal before deleting, unless told to assume yes.
pub struct PromptConfirm {
    assume_yes: bool,
}

impl PromptConfirm {
    pub fn new(assume_yes: bool) -> Self {
        Self { assume_yes }
    }
}

#[async_trait]
impl Confirm for PromptConfirm {
    async fn confirm_delete(&self, notification: &Notification) -> bool {
        if self.assume_yes {
            return true;
        }
        let question = format!("Delete \"{}\"? [y/N] ", delete_label(notification));
        match prompt(&question).await {
            Ok(answer) => is_yes(&answer),
            Err(e) => {
                warn!("Confirmation prompt failed: {}", e);
                false
            }
        }
    }
}

/// Rings the terminal bell for each pushed notification.
pub struct BellAlert;

impl AlertSink for BellAlert {
    fn alert(&self, notification: &Notification) {
        info!("Alert for notification {}", notification.id);
        let mut stdout = std::io::stdout();
        let _ = stdout.write_all(b"\x07");
        let _ = stdout.flush();
    }
}

/// Reports the console as an admin location and turns a login redirect into
/// a hint on stderr.
pub struct TerminalNavigator;

impl Navigator for TerminalNavigator {
    fn current_path(&self) -> String {
        CONSOLE_PATH.to_string()
    }

    fn navigate(&self, path: &str) {
        info!("Redirect to {}", path);
        eprintln!("Session expired. Run `coursedesk login` to sign in again.");
    }
}
