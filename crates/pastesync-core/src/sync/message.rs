//! Live protocol frames
//!
//! Inbound frames are JSON text: `{type: "init"|"update", text}` or
//! `{type: "userCount", count}`. Text that is not JSON at all is a legacy
//! frame carrying the whole paste body; other JSON is ignored. Outbound
//! frames are the raw body.

use serde::{Deserialize, Serialize};

/// JSON shape of the tagged frames
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
enum TaggedFrame {
    #[serde(rename = "init")]
    Init { text: String },

    #[serde(rename = "update")]
    Update { text: String },

    #[serde(rename = "userCount")]
    UserCount { count: u32 },
}

/// A frame received on the live connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundFrame {
    /// Full paste body sent right after connecting
    Init(String),
    /// Full paste body after someone saved
    Update(String),
    /// Number of clients watching the paste
    UserCount(u32),
    /// Non-JSON payload, treated as a full body
    Legacy(String),
    /// JSON of a shape this client does not know; carries no content
    Unknown,
}

impl InboundFrame {
    /// Decode a text payload
    ///
    /// Never fails: non-JSON payloads become [`InboundFrame::Legacy`] and
    /// unrecognised JSON becomes [`InboundFrame::Unknown`].
    pub fn decode(payload: &str) -> Self {
        let value = match serde_json::from_str::<serde_json::Value>(payload) {
            Ok(value) => value,
            Err(_) => return InboundFrame::Legacy(payload.to_string()),
        };
        match serde_json::from_value::<TaggedFrame>(value) {
            Ok(TaggedFrame::Init { text }) => InboundFrame::Init(text),
            Ok(TaggedFrame::Update { text }) => InboundFrame::Update(text),
            Ok(TaggedFrame::UserCount { count }) => InboundFrame::UserCount(count),
            Err(_) => InboundFrame::Unknown,
        }
    }

    /// Full-content snapshot carried by this frame, if any
    pub fn snapshot(&self) -> Option<&str> {
        match self {
            InboundFrame::Init(text) | InboundFrame::Update(text) | InboundFrame::Legacy(text) => {
                Some(text)
            }
            InboundFrame::UserCount(_) | InboundFrame::Unknown => None,
        }
    }
}
