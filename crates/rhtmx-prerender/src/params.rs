//! Parameter records and pathname interpolation

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::segment::pattern::{parse_dynamic_segment, ParamArity};

/// The value bound to one dynamic parameter
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    /// `[slug]` → `"hello"`
    Single(String),
    /// `[...slug]` → `["docs", "intro"]`
    Multi(Vec<String>),
}

impl ParamValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::Single(value) => Some(value),
            ParamValue::Multi(_) => None,
        }
    }

    pub fn as_slice(&self) -> Option<&[String]> {
        match self {
            ParamValue::Single(_) => None,
            ParamValue::Multi(values) => Some(values),
        }
    }

    /// Parses an untrusted generator value: a string or an array of strings
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::String(s) => Some(ParamValue::Single(s.clone())),
            serde_json::Value::Array(items) => items
                .iter()
                .map(|item| item.as_str().map(str::to_string))
                .collect::<Option<Vec<_>>>()
                .map(ParamValue::Multi),
            _ => None,
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Single(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Single(value)
    }
}

impl From<Vec<String>> for ParamValue {
    fn from(values: Vec<String>) -> Self {
        ParamValue::Multi(values)
    }
}

impl From<Vec<&str>> for ParamValue {
    fn from(values: Vec<&str>) -> Self {
        ParamValue::Multi(values.into_iter().map(str::to_string).collect())
    }
}

/// A mapping from parameter name to resolved value
///
/// Two records are equal when they bind the same names to the same values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParamRecord(BTreeMap<String, ParamValue>);

impl ParamRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<ParamValue>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.0.get(name)
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(ParamValue::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.0.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for ParamRecord
where
    K: Into<String>,
    V: Into<ParamValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        )
    }
}

/// Substitutes a record's values into a route pathname
///
/// `/[lang]/blog/[slug]` with `{lang: "en", slug: "a"}` becomes `/en/blog/a`.
/// Values are percent-encoded per component; catch-all values are joined
/// with `/` and an empty optional catch-all drops its component.
///
/// # Errors
///
/// Returns a message naming the parameter when the record has no value for
/// it or the value has the wrong shape for the segment.
pub fn interpolate_pathname(pattern: &str, record: &ParamRecord) -> Result<String, String> {
    let mut parts: Vec<String> = Vec::new();

    for component in pattern.split('/').filter(|c| !c.is_empty()) {
        let Some(param) = parse_dynamic_segment(component) else {
            parts.push(component.to_string());
            continue;
        };

        match (param.arity, record.get(&param.name)) {
            (ParamArity::Single, Some(ParamValue::Single(value))) => {
                parts.push(urlencoding::encode(value).into_owned());
            }
            (ParamArity::OptionalCatchAll, None) => {}
            (ParamArity::CatchAll, Some(ParamValue::Multi(values))) if values.is_empty() => {
                return Err(format!("catch-all parameter `{}` needs at least one value", param.name));
            }
            (ParamArity::CatchAll | ParamArity::OptionalCatchAll, Some(ParamValue::Multi(values))) => {
                parts.extend(values.iter().map(|v| urlencoding::encode(v).into_owned()));
            }
            (_, None) => return Err(format!("missing value for parameter `{}`", param.name)),
            (_, Some(_)) => {
                return Err(format!("value for parameter `{}` has the wrong shape", param.name))
            }
        }
    }

    Ok(format!("/{}", parts.join("/")))
}
