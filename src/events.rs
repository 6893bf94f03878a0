//! Network-pushed notices
//!
//! Chat messages, broadcasts and challenges arrive as JSON frames at any
//! time, including while the program waits for a line. [`NoticeFeed`] prints
//! them through its own [`Terminal`] handle, in arrival order.
//!
//! ```json
//! {"type": "chat", "from": "bob", "message": "hi"}
//! {"type": "broadcast", "message": "server restarts in 5 minutes"}
//! {"type": "challenge", "from": "alice", "game": "tic-tac-toe"}
//! ```

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::core::session::Terminal;
use crate::error::Result;

/// A pushed notice
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Notice {
    Chat { from: String, message: String },
    Broadcast { message: String },
    Challenge { from: String, game: String },
}

impl Notice {
    /// Decode one JSON frame
    pub fn parse(frame: &str) -> Result<Self> {
        Ok(serde_json::from_str(frame)?)
    }

    /// Styled line shown for this notice.
    ///
    /// Remote text is stripped of escape characters so it cannot restyle the
    /// terminal.
    pub fn to_line(&self) -> String {
        match self {
            Notice::Chat { from, message } => {
                format!("\x1b[1;36m[chat] {}:\x1b[0m {}", sanitize(from), sanitize(message))
            }
            Notice::Broadcast { message } => {
                format!("\x1b[1;33m*** {} ***", sanitize(message))
            }
            Notice::Challenge { from, game } => {
                format!(
                    "\x1b[35m{} challenges you to a game of {}!",
                    sanitize(from),
                    sanitize(game)
                )
            }
        }
    }
}

fn sanitize(text: &str) -> String {
    text.chars()
        .filter(|c| *c != '\x1b' && *c != '\n' && *c != '\r')
        .collect()
}

/// Producer that prints notices into a terminal
pub struct NoticeFeed {
    terminal: Terminal,
}

impl NoticeFeed {
    pub fn new(terminal: Terminal) -> Self {
        Self { terminal }
    }

    pub fn deliver(&self, notice: &Notice) {
        self.terminal.println(&notice.to_line());
    }

    /// Decode and print one frame
    pub fn deliver_frame(&self, frame: &str) -> Result<()> {
        let notice = Notice::parse(frame)?;
        self.deliver(&notice);
        Ok(())
    }

    /// Print frames until the sender side closes. Malformed frames are
    /// skipped.
    pub async fn run(self, mut frames: mpsc::Receiver<String>) {
        while let Some(frame) = frames.recv().await {
            if let Err(e) = self.deliver_frame(&frame) {
                tracing::warn!("Dropping notice frame: {}", e);
            }
        }
        tracing::debug!("Notice feed closed");
    }
}
