/// Wire bodies for the relay: what the browser sends, what goes to NVIDIA, and what comes back.
use serde::{Deserialize, Serialize};

use crate::errors::RelayError;

/// The body posted to `/chat`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ChatRequest {
    #[serde(default)]
    pub(crate) message: Option<String>,
    #[serde(default)]
    pub(crate) api_key: Option<String>,
}

impl ChatRequest {
    /// Decodes an inbound body. Only a JSON object is accepted; a repeated key keeps its
    /// last value.
    pub(crate) fn from_slice(body: &[u8]) -> Result<Self, RelayError> {
        match serde_json::from_slice::<serde_json::Value>(body).map_err(RelayError::unexpected)? {
            value @ serde_json::Value::Object(_) => {
                serde_json::from_value(value).map_err(RelayError::unexpected)
            }
            other => Err(RelayError::Unexpected(format!(
                "expected a JSON object, found {}",
                json_kind(&other)
            ))),
        }
    }

    /// Both fields, if each is present and non-empty.
    pub(crate) fn fields(&self) -> Option<(&str, &str)> {
        let message = self.message.as_deref().filter(|m| !m.is_empty())?;
        let api_key = self.api_key.as_deref().filter(|k| !k.is_empty())?;
        Some((message, api_key))
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpstreamMessage<'a> {
    pub role: &'a str,
    pub content: &'a str,
}

/// The body sent to the upstream chat endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpstreamRequest<'a> {
    #[serde(borrow)]
    pub messages: Vec<UpstreamMessage<'a>>,
}

impl<'a> UpstreamRequest<'a> {
    /// A single-turn conversation holding one user message.
    pub fn user(content: &'a str) -> Self {
        Self {
            messages: vec![UpstreamMessage {
                role: "user",
                content,
            }],
        }
    }
}

/// The part of a successful upstream reply we care about.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct UpstreamReply {
    #[serde(default)]
    pub(crate) response: String,
}

/// Success body returned to the caller.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ChatReply {
    pub response: String,
}

/// Failure body returned to the caller.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ErrorBody {
    pub error: String,
}
