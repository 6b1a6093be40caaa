//! Built-in function library for dynamic content.
//!
//! Functions are a closed set dispatched by name. Parameters arrive
//! already unquoted and variable-resolved.

use anyhow::{Context as _, Result, bail};
use std::collections::HashMap;

type FunctionImpl = fn(&[String]) -> Result<String>;

pub struct FunctionLibrary {
    functions: HashMap<&'static str, FunctionImpl>,
}

impl FunctionLibrary {
    pub fn with_defaults() -> Self {
        let mut functions: HashMap<&'static str, FunctionImpl> = HashMap::new();
        functions.insert("upper-case", upper_case);
        functions.insert("lower-case", lower_case);
        functions.insert("concat", concat);
        functions.insert("substring", substring);
        functions.insert("trim", trim);
        Self { functions }
    }

    pub fn call(&self, name: &str, params: &[String]) -> Result<String> {
        match self.functions.get(name) {
            Some(function) => function(params),
            None => bail!("unknown function 'fn:{name}' in dynamic content"),
        }
    }
}

fn single_param<'a>(name: &str, params: &'a [String]) -> Result<&'a str> {
    match params {
        [value] => Ok(value.as_str()),
        _ => bail!("fn:{name} expects exactly one parameter, got {}", params.len()),
    }
}

fn upper_case(params: &[String]) -> Result<String> {
    Ok(single_param("upper-case", params)?.to_uppercase())
}

fn lower_case(params: &[String]) -> Result<String> {
    Ok(single_param("lower-case", params)?.to_lowercase())
}

fn concat(params: &[String]) -> Result<String> {
    Ok(params.concat())
}

fn trim(params: &[String]) -> Result<String> {
    Ok(single_param("trim", params)?.trim().to_string())
}

/// `fn:substring('value', from[, to])` with char indices, end exclusive.
fn substring(params: &[String]) -> Result<String> {
    if params.len() < 2 || params.len() > 3 {
        bail!("fn:substring expects 2 or 3 parameters, got {}", params.len());
    }
    let chars: Vec<char> = params[0].chars().collect();
    let from: usize = params[1]
        .trim()
        .parse()
        .context("fn:substring start index")?;
    let to: usize = match params.get(2) {
        Some(p) => p.trim().parse().context("fn:substring end index")?,
        None => chars.len(),
    };
    if from > to || to > chars.len() {
        bail!(
            "fn:substring range {from}..{to} out of bounds for value of length {}",
            chars.len()
        );
    }
    Ok(chars[from..to].iter().collect())
}
