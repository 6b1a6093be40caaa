//! Exchange context: the per-execution state shared by processors and
//! validators.
//!
//! Holds the variable-binding store (append-only across one test
//! execution), resolves dynamic content in strings (`${name}` references
//! and `fn:name(...)` function calls), and fronts the validation-matcher
//! registry so callers can ask "is this control value a matcher
//! expression?" without depending on the matcher crate directly.

mod functions;

pub use functions::FunctionLibrary;

use anyhow::{Result, anyhow};
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;
use wireproof_matchers::{MatcherMismatch, MatcherRegistry, split_params};

static VARIABLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([A-Za-z0-9_.-]+)\}").expect("variable reference pattern"));

static FUNCTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"fn:([a-z][a-z0-9-]*)\(([^)]*)\)").expect("function call pattern"));

/// Per-execution context.
///
/// One instance lives for the duration of one test execution. Variable
/// bindings only grow; nothing here is shared between tests.
pub struct ExchangeContext {
    variables: BTreeMap<String, String>,
    functions: FunctionLibrary,
    matchers: MatcherRegistry,
}

impl ExchangeContext {
    pub fn new() -> Self {
        Self {
            variables: BTreeMap::new(),
            functions: FunctionLibrary::with_defaults(),
            matchers: MatcherRegistry::with_defaults(),
        }
    }

    pub fn set_variable(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.variables.insert(name.into(), value.into());
    }

    pub fn variable(&self, name: &str) -> Option<&str> {
        self.variables.get(name).map(String::as_str)
    }

    pub fn has_variable(&self, name: &str) -> bool {
        self.variables.contains_key(name)
    }

    /// All bindings, in name order.
    pub fn variables(&self) -> impl Iterator<Item = (&str, &str)> {
        self.variables
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Replace `${name}` references and evaluate `fn:name(...)` calls.
    ///
    /// Variables resolve first so function parameters can reference them.
    /// An unbound variable or unknown function is an error; dynamic
    /// content comes from test authors and silent corruption is worse
    /// than failing the run.
    pub fn resolve_dynamic(&self, input: &str) -> Result<String> {
        let resolved = self.resolve_variables(input)?;
        self.resolve_functions(&resolved)
    }

    fn resolve_variables(&self, input: &str) -> Result<String> {
        let mut out = String::with_capacity(input.len());
        let mut last = 0;
        for caps in VARIABLE_RE.captures_iter(input) {
            let Some(whole) = caps.get(0) else { continue };
            let name = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
            let value = self
                .variable(name)
                .ok_or_else(|| anyhow!("unknown variable '{name}' in dynamic content"))?;
            out.push_str(&input[last..whole.start()]);
            out.push_str(value);
            last = whole.end();
        }
        out.push_str(&input[last..]);
        Ok(out)
    }

    fn resolve_functions(&self, input: &str) -> Result<String> {
        let mut out = String::with_capacity(input.len());
        let mut last = 0;
        for caps in FUNCTION_RE.captures_iter(input) {
            let Some(whole) = caps.get(0) else { continue };
            let name = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
            let params = split_params(caps.get(2).map(|m| m.as_str()).unwrap_or_default());
            let value = self.functions.call(name, &params)?;
            out.push_str(&input[last..whole.start()]);
            out.push_str(&value);
            last = whole.end();
        }
        out.push_str(&input[last..]);
        Ok(out)
    }

    /// True when the control value is a registered matcher expression.
    pub fn is_matcher_expression(&self, control: &str) -> bool {
        self.matchers.is_expression(control)
    }

    /// Delegate a matcher-expression control value to the registry.
    pub fn delegate_validate(
        &self,
        received: &str,
        expression: &str,
    ) -> Result<(), MatcherMismatch> {
        self.matchers.verify(received, expression)
    }

    /// Swap in a custom matcher registry (test harness extension point).
    pub fn set_matchers(&mut self, matchers: MatcherRegistry) {
        self.matchers = matchers;
    }
}

impl Default for ExchangeContext {
    fn default() -> Self {
        Self::new()
    }
}
