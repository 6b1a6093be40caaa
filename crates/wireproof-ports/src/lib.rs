//! Trait seams for the wireproof pipeline.
//!
//! Processors rewrite outbound payloads; validators assert on inbound
//! ones. Both declare which message types they handle via `supports`, a
//! plain type-tag equality check, so a dispatching layer can route a
//! message without inspecting its content. Implementations live in the
//! `wireproof-dictionary` and `wireproof-text` crates.

use anyhow::Result;
use std::fmt;
use wireproof_context::ExchangeContext;
use wireproof_schema::{Message, MessageType};

/// Rewrites a message on its way out.
///
/// Takes the message by value and returns a new one; the processor is the
/// sole owner for the duration of the call, so in-place mutation never
/// aliases caller-retained state.
pub trait MessageProcessor {
    fn supports(&self, message_type: MessageType) -> bool;
    fn process(&self, message: Message, ctx: &mut ExchangeContext) -> Result<Message>;
}

/// Asserts on a received message against a control message.
///
/// Domain mismatches surface as [`ValidationFailure`] values inside the
/// `anyhow` error (recover them with `err.downcast_ref`); anything else
/// (unresolvable dynamic content, bad configuration) is an ordinary error.
pub trait MessageValidator {
    fn supports(&self, message_type: MessageType) -> bool;
    fn validate(
        &self,
        received: &Message,
        control: &Message,
        ctx: &mut ExchangeContext,
    ) -> Result<()>;
}

/// What kind of mismatch a validation failure represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Content differs.
    ContentMismatch,
    /// Content is identical once every whitespace character is removed.
    WhitespaceOnly,
    /// Control expects content but the received payload is blank.
    BlankReceived,
}

/// A failed assertion, carrying both sides of the comparison.
///
/// Not retried, not swallowed: a validation failure is a genuine test
/// assertion failure and always propagates to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationFailure {
    pub kind: FailureKind,
    pub expected: String,
    pub actual: String,
}

impl ValidationFailure {
    pub fn content_mismatch(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::ContentMismatch,
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    pub fn whitespace_only(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::WhitespaceOnly,
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    pub fn blank_received(expected: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::BlankReceived,
            expected: expected.into(),
            actual: String::new(),
        }
    }
}

impl fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            FailureKind::ContentMismatch => write!(
                f,
                "validation failed: expected '{}' but was '{}'",
                self.expected, self.actual
            ),
            FailureKind::WhitespaceOnly => write!(
                f,
                "validation failed, only whitespace differs: expected '{}' but was '{}'",
                self.expected, self.actual
            ),
            FailureKind::BlankReceived => write!(
                f,
                "validation failed: received payload is blank, expected '{}'",
                self.expected
            ),
        }
    }
}

impl std::error::Error for ValidationFailure {}
