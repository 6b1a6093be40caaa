//! Canonical message model for the wireproof pipeline.
//!
//! Defines the owned payload wrapper and the message type tag used by
//! processors and validators to decide whether a message is theirs to
//! handle. All other crates depend on these types.

use serde::{Deserialize, Serialize};

/// Type tag carried by every message.
///
/// Dispatching layers check this tag, nothing else. There is no content
/// sniffing: a payload tagged `Plaintext` is plain text even if it happens
/// to parse as JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    Json,
    Plaintext,
    Xml,
    Binary,
}

impl MessageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageType::Json => "json",
            MessageType::Plaintext => "plaintext",
            MessageType::Xml => "xml",
            MessageType::Binary => "binary",
        }
    }
}

impl std::str::FromStr for MessageType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(MessageType::Json),
            "plaintext" | "text" => Ok(MessageType::Plaintext),
            "xml" => Ok(MessageType::Xml),
            "binary" => Ok(MessageType::Binary),
            other => Err(format!("unknown message type '{other}'")),
        }
    }
}

impl std::fmt::Display for MessageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A message exchanged with the system under test.
///
/// The payload is an owned string. Whoever holds the `Message` owns the
/// payload exclusively; processors take the message by value and hand back
/// a new one, so there is never aliasing into caller-retained structures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub payload: String,
    pub message_type: MessageType,
    /// Ordered name/value pairs. Carried through processing untouched.
    #[serde(default)]
    pub headers: Vec<(String, String)>,
}

impl Message {
    pub fn new(payload: impl Into<String>, message_type: MessageType) -> Self {
        Self {
            payload: payload.into(),
            message_type,
            headers: Vec::new(),
        }
    }

    /// Shorthand for a JSON-typed message.
    pub fn json(payload: impl Into<String>) -> Self {
        Self::new(payload, MessageType::Json)
    }

    /// Shorthand for a plain-text message.
    pub fn plaintext(payload: impl Into<String>) -> Self {
        Self::new(payload, MessageType::Plaintext)
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// First header with the given name, if any.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }
}
