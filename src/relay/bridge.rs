//! Bridge between the page context and the analyzer context
//!
//! Forwards CHECKs toward the analyzer and VERDICTs back, unchanged. It
//! never looks inside a message beyond its tag; traffic in the wrong
//! direction is dropped.

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::models::messages::RelayMessage;

/// Both directions of one bridge
pub struct Bridge {
    pub from_page: mpsc::Receiver<RelayMessage>,
    pub to_analyzer: mpsc::Sender<RelayMessage>,
    pub from_analyzer: mpsc::Receiver<RelayMessage>,
    pub to_page: mpsc::Sender<RelayMessage>,
}

impl Bridge {
    /// Run until both inbound sides are closed
    pub fn spawn(self) -> JoinHandle<()> {
        let Bridge {
            mut from_page,
            to_analyzer,
            mut from_analyzer,
            to_page,
        } = self;

        tokio::spawn(async move {
            let mut page_open = true;
            let mut analyzer_open = true;

            while page_open || analyzer_open {
                tokio::select! {
                    msg = from_page.recv(), if page_open => match msg {
                        Some(msg @ RelayMessage::Check(_)) => {
                            if to_analyzer.send(msg).await.is_err() {
                                warn!("⚠️ Analyzer side closed, dropping CHECK");
                            }
                        }
                        Some(other) => debug!(id = other.id(), "non-CHECK from page dropped"),
                        None => page_open = false,
                    },
                    msg = from_analyzer.recv(), if analyzer_open => match msg {
                        Some(msg @ RelayMessage::Verdict(_)) => {
                            if to_page.send(msg).await.is_err() {
                                debug!("page side closed, dropping VERDICT");
                            }
                        }
                        Some(other) => debug!(id = other.id(), "non-VERDICT from analyzer dropped"),
                        None => analyzer_open = false,
                    },
                }
            }
            debug!("bridge stopped");
        })
    }
}
