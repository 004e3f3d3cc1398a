//! Versioned message payloads carried in a transport message body.

use serde::Deserialize;
use serde_json::Value;

use crate::{
    domain::{MessageId, ThreadId, UserId},
    errors::Error,
    Result,
};

pub const SUPPORTED_VERSION: u64 = 1;
pub const CONTROL_MESSAGE_TYPE: &str = "control";

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sender {
    pub user_id: UserId,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct PayloadDistribution {
    #[serde(default)]
    pub expression: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct BodyPart {
    #[serde(default, rename = "type")]
    pub mime: String,
    #[serde(default)]
    pub value: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct PayloadData {
    #[serde(default)]
    pub body: Vec<BodyPart>,
    #[serde(default)]
    pub mentions: Vec<UserId>,
}

/// Version 1 payload.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payload {
    pub version: u64,
    #[serde(default)]
    pub message_type: Option<String>,
    pub thread_id: ThreadId,
    pub message_id: MessageId,
    pub sender: Sender,
    #[serde(default)]
    pub distribution: PayloadDistribution,
    #[serde(default)]
    pub data: PayloadData,
}

impl Payload {
    pub fn is_control(&self) -> bool {
        self.message_type.as_deref() == Some(CONTROL_MESSAGE_TYPE)
    }

    /// Text of the first body part.
    pub fn text(&self) -> Option<&str> {
        self.data.body.first().map(|p| p.value.as_str())
    }
}

/// Pick the version-1 payload out of a JSON-encoded payload array.
///
/// Entries of other versions are skipped without being decoded.
pub fn parse_body(body: &str) -> Result<Payload> {
    let entries: Vec<Value> = serde_json::from_str(body)
        .map_err(|e| Error::Envelope(format!("body is not a payload array: {e}")))?;

    let v1 = entries
        .into_iter()
        .find(|x| x.get("version").and_then(Value::as_u64) == Some(SUPPORTED_VERSION))
        .ok_or_else(|| Error::Envelope("no version 1 payload".to_string()))?;

    serde_json::from_value(v1).map_err(|e| Error::Envelope(format!("malformed v1 payload: {e}")))
}
