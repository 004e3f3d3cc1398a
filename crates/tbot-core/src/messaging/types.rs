use serde::{Deserialize, Serialize};

use crate::domain::{Distribution, MessageId, ThreadId};

/// Event emitted by the transport's message receiver.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TransportEvent {
    Message { data: MessageEventData },
    KeyChange { addr: String },
    Error { message: String },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageEventData {
    pub message: RawMessage,
}

/// Decrypted message whose `body` is a JSON-encoded array of versioned payloads.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawMessage {
    pub body: String,
}

impl TransportEvent {
    pub fn message(body: impl Into<String>) -> Self {
        TransportEvent::Message {
            data: MessageEventData {
                message: RawMessage { body: body.into() },
            },
        }
    }
}

/// A message handed to the transport for delivery.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutgoingMessage {
    pub distribution: Distribution,
    pub thread_id: ThreadId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_ref: Option<MessageId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
    pub text: String,
}

impl OutgoingMessage {
    pub fn text(distribution: Distribution, thread_id: ThreadId, text: impl Into<String>) -> Self {
        Self {
            distribution,
            thread_id,
            thread_title: None,
            message_ref: None,
            html: None,
            text: text.into(),
        }
    }

    pub fn titled(mut self, title: &str) -> Self {
        self.thread_title = Some(title.to_string());
        self
    }

    /// Reply to `message_ref`, carrying the same content as html and text.
    pub fn reply_to(mut self, message_ref: MessageId) -> Self {
        self.html = Some(self.text.clone());
        self.message_ref = Some(message_ref);
        self
    }
}

/// Where replies to an inbound message go: the whole distribution, same thread.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReplyTarget {
    pub distribution: Distribution,
    pub thread_id: ThreadId,
    pub message_id: MessageId,
}

impl ReplyTarget {
    pub fn reply(&self, text: impl Into<String>) -> OutgoingMessage {
        OutgoingMessage::text(self.distribution.clone(), self.thread_id.clone(), text)
            .reply_to(self.message_id.clone())
    }
}
