//! Plain-text payload validation.
//!
//! Compares a received payload against a control string after resolving
//! dynamic content and placeholder tokens in the control side. The
//! control string may mark stretches of the received text as
//! uninteresting (`@ignore@`, `@ignore(n)@`), capture stretches into
//! context variables (`@variable('name')@`), or defer the whole
//! comparison to a validation matcher (`@contains(...)@` and friends).
//!
//! Processing order is fixed: trim, dynamic content, whitespace policy,
//! ignore tokens, variable tokens, matcher dispatch, comparison. Each
//! step feeds the next; reordering changes observable behavior.

mod normalize;
mod placeholders;

pub use normalize::{normalize_newlines, normalize_whitespace, strip_whitespace};
pub use placeholders::{resolve_ignore_tokens, resolve_variable_tokens};

use anyhow::Result;
use serde::{Deserialize, Serialize};
use wireproof_context::ExchangeContext;
use wireproof_ports::{MessageValidator, ValidationFailure};
use wireproof_schema::{Message, MessageType};

/// Control value that accepts any received payload without scanning.
const GLOBAL_IGNORE: &str = "@ignore@";

/// Comparison policies.
///
/// `ignore_whitespace` collapses all whitespace runs on both sides and
/// wins over `ignore_newline_type` when both are set; it is checked
/// first and short-circuits. Both default to off: exact comparison.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextValidatorConfig {
    #[serde(default)]
    pub ignore_whitespace: bool,
    #[serde(default)]
    pub ignore_newline_type: bool,
}

/// Validator for plain-text payloads.
///
/// Stateless per call; policies are fixed at construction. One instance
/// can serve any number of validations, concurrently if needed.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextValidator {
    config: TextValidatorConfig,
}

impl PlainTextValidator {
    pub fn new(config: TextValidatorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> TextValidatorConfig {
        self.config
    }

    /// Validate `received` against `control`.
    ///
    /// Ok on success. Domain mismatches are [`ValidationFailure`] values
    /// inside the error (recover with `downcast_ref`); an unresolvable
    /// `${var}` or `fn:...` in the control string is an ordinary error.
    ///
    /// A blank control string means "no expectation" and skips
    /// validation entirely. A blank received payload against a non-blank
    /// control is a hard failure regardless of content, raised before
    /// any normalization.
    pub fn validate(
        &self,
        received: &str,
        control: &str,
        ctx: &mut ExchangeContext,
    ) -> Result<()> {
        let control = control.trim();
        if control.is_empty() {
            return Ok(());
        }
        let received = received.trim();
        if received.is_empty() {
            return Err(ValidationFailure::blank_received(control).into());
        }

        let control = ctx.resolve_dynamic(control)?;

        let (mut received, mut control) = (received.to_string(), control);
        if self.config.ignore_whitespace {
            received = normalize_whitespace(&received);
            control = normalize_whitespace(&control);
        } else if self.config.ignore_newline_type {
            received = normalize_newlines(&received);
            control = normalize_newlines(&control);
        }

        if control == GLOBAL_IGNORE {
            return Ok(());
        }

        let control = resolve_ignore_tokens(&control, &received);
        let control = resolve_variable_tokens(&control, &received, ctx);

        if ctx.is_matcher_expression(&control) {
            return ctx
                .delegate_validate(&received, &control)
                .map_err(|mismatch| {
                    ValidationFailure::content_mismatch(mismatch.expression, mismatch.received)
                        .into()
                });
        }

        if received == control {
            return Ok(());
        }
        if strip_whitespace(&received) == strip_whitespace(&control) {
            return Err(ValidationFailure::whitespace_only(control, received).into());
        }
        Err(ValidationFailure::content_mismatch(control, received).into())
    }
}

impl MessageValidator for PlainTextValidator {
    fn supports(&self, message_type: MessageType) -> bool {
        message_type == MessageType::Plaintext
    }

    fn validate(
        &self,
        received: &Message,
        control: &Message,
        ctx: &mut ExchangeContext,
    ) -> Result<()> {
        PlainTextValidator::validate(self, &received.payload, &control.payload, ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wireproof_ports::{FailureKind, ValidationFailure};

    fn validator() -> PlainTextValidator {
        PlainTextValidator::default()
    }

    fn failure(err: anyhow::Error) -> ValidationFailure {
        err.downcast_ref::<ValidationFailure>()
            .expect("expected a validation failure")
            .clone()
    }

    #[test]
    fn identical_text_passes() {
        let mut ctx = ExchangeContext::new();
        assert!(validator().validate("Hello World!", "Hello World!", &mut ctx).is_ok());
    }

    #[test]
    fn leading_and_trailing_whitespace_is_trimmed() {
        let mut ctx = ExchangeContext::new();
        assert!(validator().validate("   Hello World!   ", "Hello World!", &mut ctx).is_ok());
    }

    #[test]
    fn multiline_text_compares_exactly() {
        let mut ctx = ExchangeContext::new();
        assert!(validator().validate("Hello\nWorld!\n", "Hello\nWorld!\n", &mut ctx).is_ok());
    }

    #[test]
    fn content_mismatch_carries_both_sides() {
        let mut ctx = ExchangeContext::new();
        let err = validator().validate("foo", "bar", &mut ctx).unwrap_err();
        let f = failure(err);
        assert_eq!(f.kind, FailureKind::ContentMismatch);
        assert_eq!(f.expected, "bar");
        assert_eq!(f.actual, "foo");
        insta::assert_snapshot!(
            f.to_string(),
            @"validation failed: expected 'bar' but was 'foo'"
        );
    }

    #[test]
    fn blank_control_skips_validation() {
        let mut ctx = ExchangeContext::new();
        assert!(validator().validate("anything", "   ", &mut ctx).is_ok());
        assert!(validator().validate("", "", &mut ctx).is_ok());
    }

    #[test]
    fn blank_received_is_a_hard_failure() {
        let mut ctx = ExchangeContext::new();
        let err = validator().validate("   ", "expected text", &mut ctx).unwrap_err();
        assert_eq!(failure(err).kind, FailureKind::BlankReceived);
    }

    #[test]
    fn blank_received_fails_even_against_global_ignore() {
        let mut ctx = ExchangeContext::new();
        let err = validator().validate("", "@ignore@", &mut ctx).unwrap_err();
        assert_eq!(failure(err).kind, FailureKind::BlankReceived);
    }

    #[test]
    fn global_ignore_accepts_anything() {
        let mut ctx = ExchangeContext::new();
        assert!(validator().validate("Hello World!", "@ignore@", &mut ctx).is_ok());
        assert!(validator().validate("{\"also\": \"json\"}", "@ignore@", &mut ctx).is_ok());
    }

    #[test]
    fn ignore_token_with_count_passes() {
        let mut ctx = ExchangeContext::new();
        assert!(validator().validate("Hello World!", "Hello @ignore(5)@!", &mut ctx).is_ok());
    }

    #[test]
    fn ignore_token_count_overrun_clamps() {
        let mut ctx = ExchangeContext::new();
        assert!(
            validator()
                .validate("Hello World, time is 1234", "Hello @ignore@ time is @ignore(100)@", &mut ctx)
                .is_ok()
        );
    }

    #[test]
    fn bare_ignore_consumes_to_next_whitespace() {
        let mut ctx = ExchangeContext::new();
        assert!(
            validator()
                .validate("Hello World! today", "Hello @ignore@ today", &mut ctx)
                .is_ok()
        );
    }

    #[test]
    fn mismatch_outside_ignored_stretch_still_fails() {
        let mut ctx = ExchangeContext::new();
        let err = validator()
            .validate("Hello World!", "Goodbye @ignore(5)@!", &mut ctx)
            .unwrap_err();
        assert_eq!(failure(err).kind, FailureKind::ContentMismatch);
    }

    #[test]
    fn variable_token_passes_and_binds() {
        let mut ctx = ExchangeContext::new();
        assert!(
            validator()
                .validate("Status: OK", "Status: @variable('st')@", &mut ctx)
                .is_ok()
        );
        assert_eq!(ctx.variable("st"), Some("OK"));
    }

    // Ignore tokens resolve before variable tokens; an ignore ahead of a
    // variable keeps every later offset aligned. The reverse arrangement
    // (a variable token ahead of an ignore token) is deliberately
    // unpinned: offsets for the ignore pass are computed while variable
    // tokens still sit in the control string, and that interaction is
    // undefined.
    #[test]
    fn ignore_before_variable_keeps_offsets_aligned() {
        let mut ctx = ExchangeContext::new();
        assert!(
            validator()
                .validate(
                    "order 42 state shipped",
                    "order @ignore@ state @variable('state')@",
                    &mut ctx,
                )
                .is_ok()
        );
        assert_eq!(ctx.variable("state"), Some("shipped"));
    }

    #[test]
    fn control_resolves_context_variables() {
        let mut ctx = ExchangeContext::new();
        ctx.set_variable("world", "World");
        assert!(validator().validate("Hello World!", "Hello ${world}!", &mut ctx).is_ok());
    }

    #[test]
    fn unknown_control_variable_is_not_a_validation_failure() {
        let mut ctx = ExchangeContext::new();
        let err = validator().validate("x", "${undefined}", &mut ctx).unwrap_err();
        assert!(err.downcast_ref::<ValidationFailure>().is_none());
        assert!(err.to_string().contains("undefined"));
    }

    #[test]
    fn whitespace_only_difference_is_distinguished() {
        let mut ctx = ExchangeContext::new();
        let err = validator().validate("foo  bar", "foo bar", &mut ctx).unwrap_err();
        let f = failure(err);
        assert_eq!(f.kind, FailureKind::WhitespaceOnly);
        insta::assert_snapshot!(
            f.to_string(),
            @"validation failed, only whitespace differs: expected 'foo bar' but was 'foo  bar'"
        );
    }

    #[test]
    fn ignore_whitespace_policy_collapses_runs() {
        let mut ctx = ExchangeContext::new();
        let v = PlainTextValidator::new(TextValidatorConfig {
            ignore_whitespace: true,
            ignore_newline_type: false,
        });
        assert!(v.validate("foo  bar", "foo bar", &mut ctx).is_ok());
        assert!(
            v.validate(" Hello\r\n\n  \t World!\t\t\n\n    ", "Hello\n World!\n", &mut ctx)
                .is_ok()
        );
    }

    #[test]
    fn newline_policy_folds_crlf_and_cr() {
        let mut ctx = ExchangeContext::new();
        let strict = validator();
        let err = strict
            .validate("Hello\nWorld!\na", "Hello\r\nWorld!\r\na", &mut ctx)
            .unwrap_err();
        assert_eq!(failure(err).kind, FailureKind::WhitespaceOnly);

        let lenient = PlainTextValidator::new(TextValidatorConfig {
            ignore_whitespace: false,
            ignore_newline_type: true,
        });
        assert!(
            lenient
                .validate("Hello\nWorld!\na", "Hello\r\nWorld!\r\na", &mut ctx)
                .is_ok()
        );
        assert!(
            lenient
                .validate("Hello\nWorld!\na", "Hello\rWorld!\ra", &mut ctx)
                .is_ok()
        );
    }

    #[test]
    fn ignore_whitespace_wins_over_newline_policy() {
        let mut ctx = ExchangeContext::new();
        let v = PlainTextValidator::new(TextValidatorConfig {
            ignore_whitespace: true,
            ignore_newline_type: true,
        });
        // Collapsing runs also erases the newline difference entirely.
        assert!(v.validate("a \r\n b", "a\nb", &mut ctx).is_ok());
    }

    #[test]
    fn matcher_expression_delegates() {
        let mut ctx = ExchangeContext::new();
        assert!(
            validator()
                .validate("Hello World!", "@contains('World!')@", &mut ctx)
                .is_ok()
        );
        let err = validator()
            .validate("Hello World!", "@contains('Space!')@", &mut ctx)
            .unwrap_err();
        let f = failure(err);
        assert_eq!(f.kind, FailureKind::ContentMismatch);
        assert_eq!(f.expected, "@contains('Space!')@");
        assert_eq!(f.actual, "Hello World!");
    }

    #[test]
    fn supports_only_plaintext_messages() {
        let v = validator();
        assert!(MessageValidator::supports(&v, MessageType::Plaintext));
        assert!(!MessageValidator::supports(&v, MessageType::Json));
        assert!(!MessageValidator::supports(&v, MessageType::Binary));
    }

    #[test]
    fn message_level_validate_uses_payloads() {
        let mut ctx = ExchangeContext::new();
        let v = validator();
        let received = Message::plaintext("Status: OK");
        let control = Message::plaintext("Status: @variable('st')@");
        assert!(MessageValidator::validate(&v, &received, &control, &mut ctx).is_ok());
        assert_eq!(ctx.variable("st"), Some("OK"));
    }
}
