//! Fuzz harness for plain-text validation.
//!
//! Splits the input into control and received halves at the first NUL
//! and runs the full validation pipeline under each policy. Placeholder
//! scanning works on char offsets and must never panic or spin, even
//! when the received text itself contains token syntax.

#![no_main]

use libfuzzer_sys::fuzz_target;
use wireproof_context::ExchangeContext;
use wireproof_text::{PlainTextValidator, TextValidatorConfig};

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let (control, received) = match text.split_once('\0') {
        Some(pair) => pair,
        None => (text, text),
    };

    for (ignore_whitespace, ignore_newline_type) in
        [(false, false), (true, false), (false, true)]
    {
        let validator = PlainTextValidator::new(TextValidatorConfig {
            ignore_whitespace,
            ignore_newline_type,
        });
        let mut ctx = ExchangeContext::new();
        let _ = validator.validate(received, control, &mut ctx);
    }
});
