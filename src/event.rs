use std::path::PathBuf;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use crate::fs::search::SearchOutcome;

/// Shell events.
#[derive(Debug)]
pub enum Event {
    /// A command line typed by the user.
    Line(String),
    /// Standard input reached end of file.
    InputClosed,
    /// A debounced search finished.
    SearchComplete {
        generation: u64,
        query: String,
        outcome: SearchOutcome,
    },
    /// The watched directory changed on disk.
    FsChange(PathBuf),
}

/// Async event handler that reads stdin lines and forwards them via a
/// channel shared with background tasks.
pub struct EventHandler {
    rx: mpsc::UnboundedReceiver<Event>,
    tx: mpsc::UnboundedSender<Event>,
}

impl Default for EventHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl EventHandler {
    /// Create a handler with no input source attached.
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self { rx, tx }
    }

    /// Spawn a task forwarding stdin lines as [`Event::Line`].
    pub fn spawn_stdin_reader(&self) {
        let event_tx = self.tx.clone();
        tokio::spawn(async move {
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        if event_tx.send(Event::Line(line)).is_err() {
                            break;
                        }
                    }
                    Ok(None) | Err(_) => {
                        let _ = event_tx.send(Event::InputClosed);
                        break;
                    }
                }
            }
        });
    }

    /// Get a sender clone for async tasks to send events.
    pub fn sender(&self) -> mpsc::UnboundedSender<Event> {
        self.tx.clone()
    }

    /// Receive the next event (waits until available).
    pub async fn next(&mut self) -> Option<Event> {
        self.rx.recv().await
    }
}
