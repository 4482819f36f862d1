//! Query cleaning for the `q=` parameter of content lookups.
//!
//! Callers send something that is almost JSON: an object literal where at
//! most one field may carry a regex literal such as `{"@subject":/abc/}`.
//! [`clean`] turns that into a [`CleanedQuery`] the provider can evaluate.

use crate::errors::{ContentError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Case-insensitive pattern match on a single field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RegexCondition {
    pub pattern: String,
    pub case_insensitive: bool,
}

impl RegexCondition {
    /// Regex conditions coming out of [`clean`] are always case-insensitive.
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            case_insensitive: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Condition {
    Regex(RegexCondition),
    Equals(Value),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct CleanedQuery {
    pub fields: BTreeMap<String, Condition>,
}

impl CleanedQuery {
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&Condition> {
        self.fields.get(field)
    }

    /// The regex condition, if the raw query carried one.
    pub fn regex(&self) -> Option<(&str, &RegexCondition)> {
        self.fields.iter().find_map(|(k, c)| match c {
            Condition::Regex(r) => Some((k.as_str(), r)),
            Condition::Equals(_) => None,
        })
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

impl From<serde_json::Map<String, Value>> for CleanedQuery {
    fn from(map: serde_json::Map<String, Value>) -> Self {
        Self {
            fields: map
                .into_iter()
                .map(|(k, v)| (k, Condition::Equals(v)))
                .collect(),
        }
    }
}

/// Cleans a raw query string.
///
/// Strict JSON is tried first. When the string contains a `/`, everything up
/// to the first slash names the field and everything after it is the
/// pattern:
///
/// * field: the text before the slash, minus the single character right
///   before it, with every `{`, `"`, `:` and `<` removed, trimmed.
/// * pattern: the text from the slash on, minus one trailing `}`, with every
///   `/`, `"` and `>` removed, trimmed.
///
/// The regex entry replaces any decoded field of the same name. Only the
/// first pattern is honoured and nothing in it is escaped or validated.
/// Without a slash the decoded object is returned as is, and a decode
/// failure becomes [`ContentError::MalformedQuery`].
///
/// ```
/// use contentblocks_core::query::{clean, Condition, RegexCondition};
///
/// let q = clean(r#"{"@subject":"/abc/"}"#).unwrap();
/// assert_eq!(
///     q.get("@subject"),
///     Some(&Condition::Regex(RegexCondition::new("abc")))
/// );
/// ```
pub fn clean(raw: &str) -> Result<CleanedQuery> {
    let decoded = serde_json::from_str::<Value>(raw);

    let Some(index) = raw.find('/') else {
        return match decoded {
            Ok(Value::Object(map)) => Ok(CleanedQuery::from(map)),
            Ok(_) => Err(ContentError::malformed(raw, "expected a JSON object")),
            Err(e) => Err(ContentError::malformed(raw, e)),
        };
    };

    let mut cleaned = match decoded {
        Ok(Value::Object(map)) => CleanedQuery::from(map),
        _ => CleanedQuery::default(),
    };
    let (field, pattern) = split_regex(raw, index);
    tracing::debug!(%field, %pattern, "regex condition in query");
    cleaned
        .fields
        .insert(field, Condition::Regex(RegexCondition::new(pattern)));
    Ok(cleaned)
}

/// Decodes a request body, reporting failures with the same message shape as
/// [`clean`].
pub fn try_parse_json(data: &str) -> Result<Value> {
    serde_json::from_str(data).map_err(|e| ContentError::malformed(data, e))
}

fn split_regex(raw: &str, index: usize) -> (String, String) {
    // The character right before the slash is dropped along with the slash
    // itself. For `"@subject":/x/` that is the colon; for short unquoted names
    // written as `{ab/x/}` it eats the last letter of the name.
    let mut left = raw[..index].chars();
    left.next_back();
    let field = strip(left.as_str(), &['{', '"', ':', '<']);

    let right = raw[index..].trim_end();
    let right = right.strip_suffix('}').unwrap_or(right);
    let pattern = strip(right, &['/', '"', '>']);

    (field, pattern)
}

fn strip(fragment: &str, chars: &[char]) -> String {
    fragment
        .chars()
        .filter(|c| !chars.contains(c))
        .collect::<String>()
        .trim()
        .to_string()
}
