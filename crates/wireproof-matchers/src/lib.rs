//! Validation-matcher mini-language for control values.
//!
//! A control value of the form `@name('param1','param2')@` is not compared
//! literally; it names a matcher that decides whether the received text is
//! acceptable. Matchers are a closed registry here. The placeholder tokens
//! `@ignore@` and `@variable(...)@` are not matchers; they are resolved by
//! the text validator before matcher dispatch and never reach this crate.

use regex::Regex;
use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

static EXPRESSION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^@([a-z][a-z0-9-]*)\((.*)\)@$").expect("matcher expression pattern")
});

/// A single matcher: given the received text and the expression parameters,
/// decide whether the expectation holds.
pub trait ValidationMatcher: Send + Sync {
    fn name(&self) -> &'static str;
    fn matches(&self, received: &str, params: &[String]) -> bool;
}

/// Raised when a matcher expression does not accept the received text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatcherMismatch {
    pub expression: String,
    pub received: String,
}

impl fmt::Display for MatcherMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "validation matcher {} did not accept received value '{}'",
            self.expression, self.received
        )
    }
}

impl std::error::Error for MatcherMismatch {}

/// Name-indexed matcher registry.
///
/// Lookup only; registration happens at construction time, so a registry
/// can be shared freely across threads.
pub struct MatcherRegistry {
    matchers: HashMap<&'static str, Box<dyn ValidationMatcher>>,
}

impl MatcherRegistry {
    pub fn empty() -> Self {
        Self {
            matchers: HashMap::new(),
        }
    }

    /// Registry with the built-in matcher set.
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        registry.register(Box::new(Contains));
        registry.register(Box::new(StartsWith));
        registry.register(Box::new(EndsWith));
        registry.register(Box::new(EqualsIgnoreCase));
        registry.register(Box::new(Matches));
        registry
    }

    pub fn register(&mut self, matcher: Box<dyn ValidationMatcher>) {
        self.matchers.insert(matcher.name(), matcher);
    }

    /// True when the control value is a well-formed expression naming a
    /// registered matcher.
    pub fn is_expression(&self, control: &str) -> bool {
        parse_expression(control)
            .map(|(name, _)| self.matchers.contains_key(name.as_str()))
            .unwrap_or(false)
    }

    /// Evaluate the expression against the received text.
    pub fn verify(&self, received: &str, expression: &str) -> Result<(), MatcherMismatch> {
        let mismatch = || MatcherMismatch {
            expression: expression.to_string(),
            received: received.to_string(),
        };

        let Some((name, params)) = parse_expression(expression) else {
            return Err(mismatch());
        };
        let Some(matcher) = self.matchers.get(name.as_str()) else {
            return Err(mismatch());
        };

        if matcher.matches(received, &params) {
            Ok(())
        } else {
            Err(mismatch())
        }
    }
}

impl Default for MatcherRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Parse `@name('a','b')@` into the matcher name and its parameters.
pub fn parse_expression(control: &str) -> Option<(String, Vec<String>)> {
    let caps = EXPRESSION_RE.captures(control.trim())?;
    let name = caps.get(1)?.as_str().to_string();
    let params = split_params(caps.get(2)?.as_str());
    Some((name, params))
}

/// Split a comma-separated parameter list, honoring single quotes.
///
/// Surrounding quotes are stripped from each parameter; unquoted
/// parameters are trimmed.
pub fn split_params(raw: &str) -> Vec<String> {
    if raw.trim().is_empty() {
        return Vec::new();
    }

    let mut params = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    for c in raw.chars() {
        match c {
            '\'' => {
                in_quotes = !in_quotes;
                current.push(c);
            }
            ',' if !in_quotes => {
                params.push(std::mem::take(&mut current));
            }
            _ => current.push(c),
        }
    }
    params.push(current);

    params.iter().map(|p| unquote(p.trim())).collect()
}

fn unquote(param: &str) -> String {
    param
        .strip_prefix('\'')
        .and_then(|p| p.strip_suffix('\''))
        .unwrap_or(param)
        .to_string()
}

struct Contains;

impl ValidationMatcher for Contains {
    fn name(&self) -> &'static str {
        "contains"
    }

    fn matches(&self, received: &str, params: &[String]) -> bool {
        params.len() == 1 && received.contains(params[0].as_str())
    }
}

struct StartsWith;

impl ValidationMatcher for StartsWith {
    fn name(&self) -> &'static str {
        "starts-with"
    }

    fn matches(&self, received: &str, params: &[String]) -> bool {
        params.len() == 1 && received.starts_with(params[0].as_str())
    }
}

struct EndsWith;

impl ValidationMatcher for EndsWith {
    fn name(&self) -> &'static str {
        "ends-with"
    }

    fn matches(&self, received: &str, params: &[String]) -> bool {
        params.len() == 1 && received.ends_with(params[0].as_str())
    }
}

struct EqualsIgnoreCase;

impl ValidationMatcher for EqualsIgnoreCase {
    fn name(&self) -> &'static str {
        "equals-ignore-case"
    }

    fn matches(&self, received: &str, params: &[String]) -> bool {
        params.len() == 1 && received.eq_ignore_ascii_case(params[0].as_str())
    }
}

/// Whole-string regex match. A parameter that fails to compile never
/// matches; authoring mistakes surface as validation failures, not panics.
struct Matches;

impl ValidationMatcher for Matches {
    fn name(&self) -> &'static str {
        "matches"
    }

    fn matches(&self, received: &str, params: &[String]) -> bool {
        if params.len() != 1 {
            return false;
        }
        match Regex::new(&format!("^(?:{})$", params[0])) {
            Ok(re) => re.is_match(received),
            Err(_) => false,
        }
    }
}
