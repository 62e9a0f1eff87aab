//! Progress channel between a generation worker and its host
//!
//! A typed layer over an unbounded tokio mpsc channel. Sends never block and
//! are delivered in order; there is no replay and no acknowledgement. Once
//! the receiving side is gone, every send fails with
//! [`TypegenError::ChannelClosed`].

use crate::errors::{Result, TypegenError};
use crate::generator::{GenerateTypesResult, GeneratorEvent, GeneratorReporter};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Every event a worker can send to its host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum ProgressEvent {
    LoadedSchema,

    #[serde(rename_all = "camelCase")]
    TypegenStarted { expected_file_count: usize },

    TypegenComplete(GenerateTypesResult),

    /// Relayed from the generator's reporter contract
    #[serde(untagged)]
    Generator(GeneratorEvent),
}

impl ProgressEvent {
    pub fn name(&self) -> &'static str {
        match self {
            ProgressEvent::LoadedSchema => "loadedSchema",
            ProgressEvent::TypegenStarted { .. } => "typegenStarted",
            ProgressEvent::Generator(event) => event.name(),
            ProgressEvent::TypegenComplete(_) => "typegenComplete",
        }
    }
}

/// Worker side of the channel
#[derive(Debug, Clone)]
pub struct ProgressSender {
    tx: mpsc::UnboundedSender<ProgressEvent>,
}

impl ProgressSender {
    pub fn send(&self, event: ProgressEvent) -> Result<()> {
        self.tx.send(event).map_err(|_| TypegenError::ChannelClosed)
    }
}

/// Relays generator events onto the channel unchanged
impl GeneratorReporter for ProgressSender {
    fn report(&self, event: GeneratorEvent) -> Result<()> {
        self.send(ProgressEvent::Generator(event))
    }
}

/// Host side of the channel
#[derive(Debug)]
pub struct ProgressReceiver {
    rx: mpsc::UnboundedReceiver<ProgressEvent>,
}

impl ProgressReceiver {
    /// Next event, or `None` once every sender is gone and the queue is drained
    pub async fn recv(&mut self) -> Option<ProgressEvent> {
        self.rx.recv().await
    }

    /// Tear the channel down; later sends fail
    pub fn close(&mut self) {
        self.rx.close();
    }
}

pub fn progress_channel() -> (ProgressSender, ProgressReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (ProgressSender { tx }, ProgressReceiver { rx })
}
