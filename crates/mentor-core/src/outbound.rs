//! Outbound delivery types — shared between the scheduler and the channel
//! adapters so handlers can compose messages without knowing the transport.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One inline button: visible label plus opaque callback payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Button {
    pub label: String,
    pub data: String,
}

/// Inline keyboard layout — rows of buttons, rendered by the adapter.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Keyboard {
    pub rows: Vec<Vec<Button>>,
}

impl Keyboard {
    pub fn single_row(buttons: Vec<Button>) -> Self {
        Self {
            rows: vec![buttons],
        }
    }
}

/// A composed, ready-to-send message. Handlers produce these; the sink
/// delivers them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutboundMessage {
    /// External transport address of the recipient chat.
    pub chat_id: i64,
    /// UTF-8 body; the adapter splits it if it exceeds the transport limit.
    pub body: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keyboard: Option<Keyboard>,
}

impl OutboundMessage {
    pub fn text(chat_id: i64, body: impl Into<String>) -> Self {
        Self {
            chat_id,
            body: body.into(),
            keyboard: None,
        }
    }

    pub fn with_keyboard(chat_id: i64, body: impl Into<String>, keyboard: Keyboard) -> Self {
        Self {
            chat_id,
            body: body.into(),
            keyboard: Some(keyboard),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    /// Transient transport failure — the scheduler leaves the dedup key unset
    /// and the next minute tick retries.
    #[error("transport error: {0}")]
    Transport(String),

    #[error("chat {chat_id} not reachable")]
    Unreachable { chat_id: i64 },
}

/// The single outbound capability the scheduler depends on.
#[async_trait]
pub trait Sink: Send + Sync {
    async fn send(&self, message: &OutboundMessage) -> Result<(), SinkError>;
}
