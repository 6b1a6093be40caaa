//! Placeholder token resolution against the received text.
//!
//! Tokens are resolved left to right, re-scanning after every
//! substitution because offsets shift as replacements land. The left
//! portion of the control string is already substituted when a token is
//! reached, so a token's char offset in the control string addresses the
//! corresponding position in the received text. Ignore tokens are
//! processed before variable tokens; behavior of overlapping or nested
//! tokens is deliberately left undefined.
//!
//! Offsets are measured in chars on both sides, never in bytes, so
//! multi-byte payloads cannot split a character.

use regex::Regex;
use std::sync::LazyLock;
use wireproof_context::ExchangeContext;

static IGNORE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@ignore(?:\((\d+)\))?@").expect("ignore token pattern"));

static VARIABLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@variable\('?([^']*?)'?\)@").expect("variable token pattern"));

/// Resolve `@ignore@` / `@ignore(n)@` tokens in `control` against
/// `received`.
///
/// `@ignore(n)@` swallows exactly `n` chars of `received` starting at the
/// token's offset, clamped to the end; `@ignore@` swallows up to (not
/// including) the next whitespace char, or to the end when none follows.
/// A token whose offset lies beyond the end of `received` resolves to the
/// empty string.
pub fn resolve_ignore_tokens(control: &str, received: &str) -> String {
    let received: Vec<char> = received.chars().collect();
    let mut control = control.to_string();
    // Already-substituted text is never reprocessed, so a received value
    // that itself contains token syntax cannot trigger another round.
    let mut search_from = 0;
    loop {
        let (range, replacement) = {
            let Some(caps) = IGNORE_RE.captures_at(&control, search_from) else {
                break;
            };
            let Some(whole) = caps.get(0) else { break };
            let start = control[..whole.start()].chars().count();
            let replacement = match caps.get(1) {
                Some(digits) => take_exact(&received, start, digits.as_str()),
                None => take_until_whitespace(&received, start),
            };
            (whole.range(), replacement)
        };
        search_from = range.start + replacement.len();
        control.replace_range(range, &replacement);
    }
    control
}

/// Resolve `@variable('name')@` tokens in `control` against `received`,
/// binding each captured value into the context.
///
/// The captured value runs from the token's offset up to the first char
/// outside `[a-zA-Z0-9_.-]`. Both quoted and unquoted names are accepted.
pub fn resolve_variable_tokens(
    control: &str,
    received: &str,
    ctx: &mut ExchangeContext,
) -> String {
    let received: Vec<char> = received.chars().collect();
    let mut control = control.to_string();
    let mut search_from = 0;
    loop {
        let (range, name, value) = {
            let Some(caps) = VARIABLE_RE.captures_at(&control, search_from) else {
                break;
            };
            let Some(whole) = caps.get(0) else { break };
            let name = caps.get(1).map(|m| m.as_str()).unwrap_or_default().to_string();
            let start = control[..whole.start()].chars().count();
            let value = take_capture_word(&received, start);
            (whole.range(), name, value)
        };
        search_from = range.start + value.len();
        ctx.set_variable(name, value.clone());
        control.replace_range(range, &value);
    }
    control
}

fn take_exact(received: &[char], start: usize, digits: &str) -> String {
    let n: usize = digits.parse().unwrap_or(usize::MAX);
    if start >= received.len() {
        return String::new();
    }
    let end = start.saturating_add(n).min(received.len());
    received[start..end].iter().collect()
}

fn take_until_whitespace(received: &[char], start: usize) -> String {
    if start >= received.len() {
        return String::new();
    }
    received[start..]
        .iter()
        .copied()
        .take_while(|c| !c.is_whitespace())
        .collect()
}

fn take_capture_word(received: &[char], start: usize) -> String {
    if start >= received.len() {
        return String::new();
    }
    received[start..]
        .iter()
        .copied()
        .take_while(|&c| c.is_ascii_alphanumeric() || c == '_' || c == '.' || c == '-')
        .collect()
}
