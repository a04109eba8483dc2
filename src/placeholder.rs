//! Placeholder discovery.
//!
//! Two conventions are supported:
//!
//! - **Delimited** (default): `[FIELD_NAME]` tokens, where the name is one or
//!   more ASCII letters, digits, or underscores. The key is the inner name.
//! - **Literal** (legacy): the template text itself is the key. Every
//!   non-empty paragraph line is a candidate, and filling replaces exact
//!   substrings.

use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use crate::template::Template;

/// Resolved values keyed by placeholder.
pub type FieldMapping = BTreeMap<String, String>;

/// Which placeholder convention the template uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaceholderStyle {
    #[default]
    Delimited,
    Literal,
}

impl FromStr for PlaceholderStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "delimited" | "bracket" | "brackets" => Ok(Self::Delimited),
            "literal" => Ok(Self::Literal),
            other => Err(format!(
                "unknown placeholder style '{other}' (expected delimited or literal)"
            )),
        }
    }
}

impl fmt::Display for PlaceholderStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Delimited => f.write_str("delimited"),
            Self::Literal => f.write_str("literal"),
        }
    }
}

/// The `[KEY]` token pattern; capture group 1 is the key.
pub(crate) fn token_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\[([A-Za-z0-9_]+)\]").expect("token pattern is valid"))
}

/// Iterate the delimited keys appearing in `text`, in order of appearance.
pub fn tokens_in(text: &str) -> impl Iterator<Item = &str> {
    token_regex()
        .captures_iter(text)
        .filter_map(|c| c.get(1).map(|m| m.as_str()))
}

/// Scan every paragraph and table cell of `template` for placeholders.
pub fn scan(template: &Template, style: PlaceholderStyle) -> BTreeSet<String> {
    let mut keys = BTreeSet::new();
    template.for_each_paragraph(|p| match style {
        PlaceholderStyle::Delimited => {
            keys.extend(tokens_in(&p.text).map(String::from));
        }
        PlaceholderStyle::Literal => {
            for line in p.text.lines() {
                let line = line.trim();
                if !line.is_empty() {
                    keys.insert(line.to_string());
                }
            }
        }
    });
    keys
}
