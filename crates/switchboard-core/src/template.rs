//! Placeholder templates
//!
//! Descriptor strings may embed placeholders of the form `{{.name}}`, where
//! `name` matches `[A-Za-z_][A-Za-z0-9_]*`. Whitespace inside the delimiters is
//! tolerated (`{{ .name }}`). Any other action inside `{{ }}` is a syntax
//! error, as is an opening `{{` without a matching `}}`.
//!
//! Expansion is strict: a placeholder whose name has no binding fails with
//! [`Error::MissingSubstitution`] instead of expanding to an empty string.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{BTreeMap, HashMap};

use crate::error::{Error, Result};

const OPEN: &str = "{{";
const CLOSE: &str = "}}";

static ACTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*\.([A-Za-z_][A-Za-z0-9_]*)\s*$").expect("placeholder pattern is valid")
});

/// Name to literal lookup used while expanding placeholders
pub trait Bindings {
    /// Value bound to `name`, if any
    fn binding(&self, name: &str) -> Option<&str>;
}

impl Bindings for HashMap<String, String> {
    fn binding(&self, name: &str) -> Option<&str> {
        self.get(name).map(String::as_str)
    }
}

impl Bindings for BTreeMap<String, String> {
    fn binding(&self, name: &str) -> Option<&str> {
        self.get(name).map(String::as_str)
    }
}

/// A parsed piece of a template
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Segment<'a> {
    Text(&'a str),
    Placeholder(&'a str),
}

fn parse(template: &str) -> Result<Vec<Segment<'_>>> {
    let mut segments = Vec::new();
    let mut rest = template;

    while let Some(open) = rest.find(OPEN) {
        if open > 0 {
            segments.push(Segment::Text(&rest[..open]));
        }
        let after_open = &rest[open + OPEN.len()..];
        let close = after_open.find(CLOSE).ok_or_else(|| Error::InvalidTemplate {
            template: template.to_string(),
            message: "unclosed action".to_string(),
        })?;
        let action = &after_open[..close];
        if action.contains(OPEN) {
            return Err(Error::InvalidTemplate {
                template: template.to_string(),
                message: "unexpected '{{' inside action".to_string(),
            });
        }
        let name = ACTION
            .captures(action)
            .and_then(|caps| caps.get(1))
            .ok_or_else(|| Error::InvalidTemplate {
                template: template.to_string(),
                message: format!("unsupported action '{}'", action.trim()),
            })?;
        segments.push(Segment::Placeholder(name.as_str()));
        rest = &after_open[close + CLOSE.len()..];
    }

    if !rest.is_empty() {
        segments.push(Segment::Text(rest));
    }
    Ok(segments)
}

/// Expand every `{{.name}}` placeholder in `template` using `bindings`.
///
/// # Errors
///
/// [`Error::InvalidTemplate`] for malformed templates and
/// [`Error::MissingSubstitution`] for the first placeholder without a binding.
pub fn substitute<B: Bindings + ?Sized>(template: &str, bindings: &B) -> Result<String> {
    if !template.contains(OPEN) {
        return Ok(template.to_string());
    }

    let mut output = String::with_capacity(template.len());
    for segment in parse(template)? {
        match segment {
            Segment::Text(text) => output.push_str(text),
            Segment::Placeholder(name) => {
                let value = bindings
                    .binding(name)
                    .ok_or_else(|| Error::MissingSubstitution {
                        name: name.to_string(),
                    })?;
                output.push_str(value);
            }
        }
    }
    Ok(output)
}

/// Names of the placeholders used in `template`, in order of first use
pub fn placeholders(template: &str) -> Result<Vec<String>> {
    let mut names: Vec<String> = Vec::new();
    for segment in parse(template)? {
        if let Segment::Placeholder(name) = segment {
            if !names.iter().any(|n| n == name) {
                names.push(name.to_string());
            }
        }
    }
    Ok(names)
}
