//! Fuzz harness for dictionary traversal.
//!
//! Feeds arbitrary payload text through a dictionary with overlapping
//! keys under every strategy. The traversal must never panic: malformed
//! JSON passes through, valid JSON is rewritten in place.

#![no_main]

use libfuzzer_sys::fuzz_target;
use wireproof_context::ExchangeContext;
use wireproof_dictionary::{Dictionary, PathMappingStrategy};

fuzz_target!(|data: &[u8]| {
    let Ok(payload) = std::str::from_utf8(data) else {
        return;
    };

    let ctx = ExchangeContext::new();
    for strategy in [
        PathMappingStrategy::Exact,
        PathMappingStrategy::StartsWith,
        PathMappingStrategy::EndsWith,
    ] {
        let dictionary = Dictionary::from_pairs(
            [("a", "1"), ("a.b", "x"), ("id", "masked"), ("root[0]", "r")],
            strategy,
        );
        let _ = dictionary.apply_payload(payload, &ctx);
    }
});
