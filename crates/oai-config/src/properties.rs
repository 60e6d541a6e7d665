//! Parser for Java-style `.properties` files.
//!
//! The supported grammar follows `java.util.Properties`: `#` and `!` start
//! comment lines, keys are separated from values by `=`, `:` or blank space,
//! a trailing unescaped backslash continues the logical line, and the usual
//! `\t`, `\n`, `\r`, `\f` and `\uXXXX` escapes are decoded. Later duplicate
//! keys replace earlier ones.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while parsing a properties document.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PropertiesError {
    /// A `\u` escape was not followed by four hexadecimal digits naming a
    /// valid scalar value.
    #[error("line {line}: malformed unicode escape '\\u{sequence}'")]
    InvalidUnicodeEscape {
        /// One-based line on which the logical entry starts.
        line: usize,
        /// Characters that followed `\u`.
        sequence: String,
    },
}

/// Immutable key/value view over a parsed properties document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Properties {
    entries: BTreeMap<String, String>,
}

impl Properties {
    /// Parses the textual contents of a properties file.
    pub fn parse(input: &str) -> Result<Self, PropertiesError> {
        let mut entries = BTreeMap::new();
        let mut lines = input.lines().enumerate();
        while let Some((index, line)) = lines.next() {
            let trimmed = line.trim_start_matches(is_blank);
            if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with('!') {
                continue;
            }

            let mut logical = trimmed.to_owned();
            while ends_with_continuation(&logical) {
                logical.pop();
                match lines.next() {
                    Some((_, next)) => logical.push_str(next.trim_start_matches(is_blank)),
                    None => break,
                }
            }

            let line_number = index + 1;
            let (key, value) = split_entry(&logical);
            entries.insert(unescape(key, line_number)?, unescape(value, line_number)?);
        }
        Ok(Self { entries })
    }

    /// Returns the raw value stored for `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Returns the trimmed value for `key`, treating blank values as absent.
    #[must_use]
    pub fn get_non_empty(&self, key: &str) -> Option<&str> {
        self.get(key).map(str::trim).filter(|value| !value.is_empty())
    }

    /// Returns `true` when the document defines `key`, even with a blank value.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of distinct keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when the document defines no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over the entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }
}

impl<K, V> FromIterator<(K, V)> for Properties
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        }
    }
}

const fn is_blank(ch: char) -> bool {
    matches!(ch, ' ' | '\t' | '\u{c}')
}

fn ends_with_continuation(line: &str) -> bool {
    let trailing = line.chars().rev().take_while(|ch| *ch == '\\').count();
    trailing % 2 == 1
}

/// Splits a logical line at the first unescaped separator.
fn split_entry(line: &str) -> (&str, &str) {
    let mut escaped = false;
    for (offset, ch) in line.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' => escaped = true,
            '=' | ':' => {
                let (key, rest) = line.split_at(offset);
                let value = rest.strip_prefix(ch).unwrap_or(rest);
                return (key, value.trim_start_matches(is_blank));
            }
            blank if is_blank(blank) => {
                let (key, rest) = line.split_at(offset);
                let rest = rest.trim_start_matches(is_blank);
                let value = rest.strip_prefix(['=', ':']).unwrap_or(rest);
                return (key, value.trim_start_matches(is_blank));
            }
            _ => {}
        }
    }
    (line, "")
}

fn unescape(raw: &str, line: usize) -> Result<String, PropertiesError> {
    let mut decoded = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            decoded.push(ch);
            continue;
        }
        match chars.next() {
            Some('t') => decoded.push('\t'),
            Some('n') => decoded.push('\n'),
            Some('r') => decoded.push('\r'),
            Some('f') => decoded.push('\u{c}'),
            Some('u') => {
                let sequence: String = chars.by_ref().take(4).collect();
                let scalar = u32::from_str_radix(&sequence, 16)
                    .ok()
                    .filter(|_| sequence.len() == 4)
                    .and_then(char::from_u32)
                    .ok_or_else(|| PropertiesError::InvalidUnicodeEscape {
                        line,
                        sequence: sequence.clone(),
                    })?;
                decoded.push(scalar);
            }
            Some(other) => decoded.push(other),
            None => {}
        }
    }
    Ok(decoded)
}
