//! Path-matched data dictionary for JSON message payloads.
//!
//! A dictionary is an ordered table of path expression → replacement
//! value. Applying it to a JSON payload walks the parsed tree, computes a
//! dot/bracket path for every leaf, and swaps in the replacement wherever
//! the path matches under the active [`PathMappingStrategy`]. Replacement
//! values go through dynamic-content resolution first, so `${var}` and
//! `fn:...` expressions work inside mapping tables.
//!
//! Dictionaries are enrichment, not gatekeepers: a payload that does not
//! parse as JSON is passed through untouched with a logged warning, never
//! failed.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use wireproof_context::ExchangeContext;
use wireproof_ports::MessageProcessor;
use wireproof_schema::{Message, MessageType};

/// How a computed element path is matched against dictionary keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PathMappingStrategy {
    /// Path must equal a key exactly.
    #[default]
    Exact,
    /// Path must begin with a key; first key in table order wins.
    StartsWith,
    /// Path must end with a key; first key in table order wins.
    EndsWith,
}

impl PathMappingStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            PathMappingStrategy::Exact => "exact",
            PathMappingStrategy::StartsWith => "starts-with",
            PathMappingStrategy::EndsWith => "ends-with",
        }
    }
}

impl std::str::FromStr for PathMappingStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "exact" => Ok(PathMappingStrategy::Exact),
            "starts-with" => Ok(PathMappingStrategy::StartsWith),
            "ends-with" => Ok(PathMappingStrategy::EndsWith),
            other => Err(format!(
                "unknown path mapping strategy '{other}' (expected exact, starts-with, or ends-with)"
            )),
        }
    }
}

impl std::fmt::Display for PathMappingStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered mapping table plus the strategy used to match against it.
///
/// Read-only after construction. `&self` everywhere, no interior
/// mutability, so one instance can back concurrent validations across
/// threads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dictionary {
    mappings: Vec<(String, String)>,
    strategy: PathMappingStrategy,
}

impl Dictionary {
    pub fn new(strategy: PathMappingStrategy) -> Self {
        Self {
            mappings: Vec::new(),
            strategy,
        }
    }

    pub fn from_pairs<I, K, V>(pairs: I, strategy: PathMappingStrategy) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut dictionary = Self::new(strategy);
        for (path, value) in pairs {
            dictionary.insert(path, value);
        }
        dictionary
    }

    /// Add a mapping. Re-inserting an existing path updates its value but
    /// keeps its position, preserving first-match determinism.
    pub fn insert(&mut self, path: impl Into<String>, value: impl Into<String>) {
        let path = path.into();
        let value = value.into();
        match self.mappings.iter_mut().find(|(p, _)| *p == path) {
            Some(slot) => slot.1 = value,
            None => self.mappings.push((path, value)),
        }
    }

    pub fn strategy(&self) -> PathMappingStrategy {
        self.strategy
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn mappings(&self) -> impl Iterator<Item = (&str, &str)> {
        self.mappings.iter().map(|(p, v)| (p.as_str(), v.as_str()))
    }

    /// Find the replacement for a computed path, if any mapping matches.
    ///
    /// A miss is a normal, silent outcome. For the prefix and suffix
    /// strategies the first matching key in table order wins.
    pub fn lookup(&self, path: &str) -> Option<&str> {
        match self.strategy {
            PathMappingStrategy::Exact => self
                .mappings
                .iter()
                .find(|(key, _)| key == path)
                .map(|(_, value)| value.as_str()),
            PathMappingStrategy::StartsWith => self
                .mappings
                .iter()
                .find(|(key, _)| path.starts_with(key.as_str()))
                .map(|(_, value)| value.as_str()),
            PathMappingStrategy::EndsWith => self
                .mappings
                .iter()
                .find(|(key, _)| path.ends_with(key.as_str()))
                .map(|(_, value)| value.as_str()),
        }
    }

    /// Translate one leaf value.
    ///
    /// On a lookup hit the replacement is dynamic-content resolved and
    /// coerced toward the original leaf's kind; on a miss the value comes
    /// back unchanged. A resolution failure inside a matched replacement
    /// is an error: mapping tables are author-controlled input.
    pub fn translate(&self, path: &str, value: Value, ctx: &ExchangeContext) -> Result<Value> {
        match self.lookup(path) {
            Some(replacement) => {
                let resolved = ctx.resolve_dynamic(replacement)?;
                Ok(coerce(resolved, &value))
            }
            None => Ok(value),
        }
    }

    /// Apply the dictionary to a JSON payload string.
    ///
    /// Returns the re-serialized payload. Malformed JSON is reported with
    /// a warning and returned untouched; tests routinely run dictionaries
    /// over heterogeneous payloads.
    pub fn apply_payload(&self, payload: &str, ctx: &ExchangeContext) -> Result<String> {
        if payload.trim().is_empty() {
            return Ok(payload.to_string());
        }
        let parsed: Value = match serde_json::from_str(payload) {
            Ok(value) => value,
            Err(err) => {
                eprintln!("warning: dictionary skipped payload that does not parse as JSON: {err}");
                return Ok(payload.to_string());
            }
        };

        let rewritten = match parsed {
            Value::Object(mut object) => {
                self.traverse_object(&mut object, "", ctx)?;
                Value::Object(object)
            }
            Value::Array(items) => {
                // Wrap a top-level array in a synthetic single-key object so
                // path computation has a stable starting point; entries see
                // paths of the form root[i]...
                let mut wrapper = serde_json::Map::new();
                wrapper.insert("root".to_string(), Value::Array(items));
                self.traverse_object(&mut wrapper, "", ctx)?;
                wrapper.remove("root").unwrap_or_default()
            }
            scalar => scalar,
        };

        Ok(rewritten.to_string())
    }

    fn traverse_object(
        &self,
        object: &mut serde_json::Map<String, Value>,
        path: &str,
        ctx: &ExchangeContext,
    ) -> Result<()> {
        for (key, slot) in object.iter_mut() {
            let entry_path = if path.is_empty() {
                key.clone()
            } else {
                format!("{path}.{key}")
            };
            match slot {
                Value::Object(child) => self.traverse_object(child, &entry_path, ctx)?,
                Value::Array(items) => {
                    for (i, item) in items.iter_mut().enumerate() {
                        let slot_path = format!("{entry_path}[{i}]");
                        if let Value::Object(child) = item {
                            self.traverse_object(child, &slot_path, ctx)?;
                        } else {
                            let value = std::mem::take(item);
                            *item = self.translate(&slot_path, value, ctx)?;
                        }
                    }
                }
                _ => {
                    let value = std::mem::take(slot);
                    *slot = self.translate(&entry_path, value, ctx)?;
                }
            }
        }
        Ok(())
    }
}

/// Coerce a resolved replacement toward the original leaf's kind.
///
/// Numbers stay numbers and booleans stay booleans when the replacement
/// parses cleanly; otherwise the replacement becomes a JSON string. A
/// replacement for a string leaf is always a string, even if it would
/// parse as something else.
fn coerce(replacement: String, original: &Value) -> Value {
    match original {
        Value::String(_) => Value::String(replacement),
        Value::Number(_) => match serde_json::from_str::<Value>(&replacement) {
            Ok(parsed @ Value::Number(_)) => parsed,
            _ => Value::String(replacement),
        },
        Value::Bool(_) => match serde_json::from_str::<Value>(&replacement) {
            Ok(parsed @ Value::Bool(_)) => parsed,
            _ => Value::String(replacement),
        },
        _ => match serde_json::from_str::<Value>(&replacement) {
            Ok(parsed) => parsed,
            Err(_) => Value::String(replacement),
        },
    }
}

impl MessageProcessor for Dictionary {
    fn supports(&self, message_type: MessageType) -> bool {
        message_type == MessageType::Json
    }

    fn process(&self, message: Message, ctx: &mut ExchangeContext) -> Result<Message> {
        let payload = self.apply_payload(&message.payload, ctx)?;
        Ok(Message { payload, ..message })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ctx() -> ExchangeContext {
        ExchangeContext::new()
    }

    fn apply(dictionary: &Dictionary, payload: &str) -> Value {
        let out = dictionary.apply_payload(payload, &ctx()).unwrap();
        serde_json::from_str(&out).unwrap()
    }

    #[test]
    fn exact_match_replaces_nested_leaf() {
        let dictionary = Dictionary::from_pairs(
            [("a.b", "99")],
            PathMappingStrategy::Exact,
        );

        let out = apply(&dictionary, r#"{"a":{"b":1},"c":[1,2]}"#);
        assert_eq!(out, json!({"a":{"b":99},"c":[1,2]}));
    }

    #[test]
    fn exact_match_addresses_array_elements() {
        let dictionary = Dictionary::from_pairs(
            [("items[1].id", "X")],
            PathMappingStrategy::Exact,
        );

        let out = apply(&dictionary, r#"{"items":[{"id":1},{"id":2}]}"#);
        assert_eq!(out, json!({"items":[{"id":1},{"id":"X"}]}));
    }

    #[test]
    fn scalar_array_slots_use_bracket_paths() {
        let dictionary = Dictionary::from_pairs(
            [("c[0]", "first"), ("c[2]", "third")],
            PathMappingStrategy::Exact,
        );

        let out = apply(&dictionary, r#"{"c":["a","b","c"]}"#);
        assert_eq!(out, json!({"c":["first","b","third"]}));
    }

    #[test]
    fn top_level_array_paths_start_with_root() {
        let dictionary = Dictionary::from_pairs(
            [("root[0].name", "renamed")],
            PathMappingStrategy::Exact,
        );

        let out = apply(&dictionary, r#"[{"name":"a"},{"name":"b"}]"#);
        assert_eq!(out, json!([{"name":"renamed"},{"name":"b"}]));
    }

    #[test]
    fn miss_leaves_payload_unchanged() {
        let dictionary = Dictionary::from_pairs(
            [("nowhere", "x")],
            PathMappingStrategy::Exact,
        );

        let out = apply(&dictionary, r#"{"a":1,"b":null}"#);
        assert_eq!(out, json!({"a":1,"b":null}));
    }

    #[test]
    fn null_leaves_are_translated_in_place() {
        let dictionary = Dictionary::from_pairs(
            [("b", "filled")],
            PathMappingStrategy::Exact,
        );

        let out = apply(&dictionary, r#"{"a":1,"b":null}"#);
        assert_eq!(out, json!({"a":1,"b":"filled"}));
    }

    #[test]
    fn starts_with_first_table_entry_wins() {
        let dictionary = Dictionary::from_pairs(
            [("order", "by-prefix"), ("order.id", "by-longer-prefix")],
            PathMappingStrategy::StartsWith,
        );

        let out = apply(&dictionary, r#"{"order":{"id":1,"state":"open"}}"#);
        // Both leaves match the first key; the longer key is never reached.
        assert_eq!(out, json!({"order":{"id":"by-prefix","state":"by-prefix"}}));
    }

    #[test]
    fn ends_with_matches_leaf_names_anywhere() {
        let dictionary = Dictionary::from_pairs(
            [("id", "masked")],
            PathMappingStrategy::EndsWith,
        );

        let out = apply(
            &dictionary,
            r#"{"id":1,"nested":{"id":2},"items":[{"id":3}]}"#,
        );
        assert_eq!(
            out,
            json!({"id":"masked","nested":{"id":"masked"},"items":[{"id":"masked"}]})
        );
    }

    #[test]
    fn replacement_for_number_leaf_stays_numeric_when_it_parses() {
        let dictionary = Dictionary::from_pairs(
            [("count", "42"), ("label", "42")],
            PathMappingStrategy::Exact,
        );

        let out = apply(&dictionary, r#"{"count":7,"label":"seven"}"#);
        assert_eq!(out, json!({"count":42,"label":"42"}));
    }

    #[test]
    fn replacement_for_bool_leaf_parses_or_falls_back_to_string() {
        let dictionary = Dictionary::from_pairs(
            [("active", "false"), ("ready", "maybe")],
            PathMappingStrategy::Exact,
        );

        let out = apply(&dictionary, r#"{"active":true,"ready":true}"#);
        assert_eq!(out, json!({"active":false,"ready":"maybe"}));
    }

    #[test]
    fn replacement_values_resolve_dynamic_content() {
        let dictionary = Dictionary::from_pairs(
            [("user", "${login}"), ("greeting", "fn:upper-case('hi')")],
            PathMappingStrategy::Exact,
        );
        let mut ctx = ExchangeContext::new();
        ctx.set_variable("login", "alice");

        let out = dictionary
            .apply_payload(r#"{"user":"?","greeting":"?"}"#, &ctx)
            .unwrap();
        let out: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(out, json!({"user":"alice","greeting":"HI"}));
    }

    #[test]
    fn unresolvable_replacement_is_an_error() {
        let dictionary = Dictionary::from_pairs(
            [("user", "${missing}")],
            PathMappingStrategy::Exact,
        );

        let err = dictionary
            .apply_payload(r#"{"user":"?"}"#, &ctx())
            .unwrap_err();
        assert!(err.to_string().contains("missing"));
    }

    #[test]
    fn malformed_json_passes_through_untouched() {
        let dictionary = Dictionary::from_pairs(
            [("a", "x")],
            PathMappingStrategy::Exact,
        );

        let out = dictionary.apply_payload("not json {", &ctx()).unwrap();
        assert_eq!(out, "not json {");
    }

    #[test]
    fn top_level_scalar_passes_through() {
        let dictionary = Dictionary::from_pairs(
            [("a", "x")],
            PathMappingStrategy::Exact,
        );

        let out = dictionary.apply_payload("\"scalar\"", &ctx()).unwrap();
        assert_eq!(out, "\"scalar\"");
    }

    #[test]
    fn reinsert_updates_value_but_keeps_position() {
        let mut dictionary = Dictionary::new(PathMappingStrategy::StartsWith);
        dictionary.insert("a", "one");
        dictionary.insert("b", "two");
        dictionary.insert("a", "updated");

        let entries: Vec<(&str, &str)> = dictionary.mappings().collect();
        assert_eq!(entries, vec![("a", "updated"), ("b", "two")]);
    }

    #[test]
    fn supports_only_json_messages() {
        let dictionary = Dictionary::new(PathMappingStrategy::Exact);
        assert!(dictionary.supports(MessageType::Json));
        assert!(!dictionary.supports(MessageType::Plaintext));
        assert!(!dictionary.supports(MessageType::Xml));
        assert!(!dictionary.supports(MessageType::Binary));
    }

    #[test]
    fn process_preserves_type_and_headers() {
        let dictionary = Dictionary::from_pairs(
            [("a", "2")],
            PathMappingStrategy::Exact,
        );
        let message = Message::json(r#"{"a":1}"#).with_header("trace", "t1");
        let mut ctx = ExchangeContext::new();

        let out = dictionary.process(message, &mut ctx).unwrap();
        assert_eq!(out.message_type, MessageType::Json);
        assert_eq!(out.header("trace"), Some("t1"));
        assert_eq!(
            serde_json::from_str::<Value>(&out.payload).unwrap(),
            json!({"a":2})
        );
    }

    #[test]
    fn strategy_parses_from_str() {
        assert_eq!(
            "starts-with".parse::<PathMappingStrategy>(),
            Ok(PathMappingStrategy::StartsWith)
        );
        assert!("fuzzy".parse::<PathMappingStrategy>().is_err());
    }
}
