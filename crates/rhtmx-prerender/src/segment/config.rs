//! Segment configuration schema
//!
//! The recognized configuration exports of a layout, page or route handler
//! module. Parsing is lenient about unknown keys and strict about the values
//! of recognized ones: a single invalid value discards the whole config.

use serde::{Deserialize, Serialize};

/// Export names the schema recognizes
pub const CONFIG_KEYS: &[&str] = &[
    "revalidate",
    "dynamic",
    "dynamicParams",
    "fetchCache",
    "runtime",
    "preferredRegion",
    "maxDuration",
    "experimental_ppr",
];

/// Revalidation interval declared by a segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawRevalidate", into = "RawRevalidate")]
pub enum Revalidate {
    /// `revalidate = false`: cache indefinitely
    Never,
    /// Regenerate after this many seconds
    After(u64),
}

#[derive(Clone, Copy, Serialize, Deserialize)]
#[serde(untagged)]
enum RawRevalidate {
    Seconds(u64),
    /// Loosely typed exports may encode whole seconds as `60.0`
    Float(f64),
    Flag(bool),
}

impl TryFrom<RawRevalidate> for Revalidate {
    type Error = String;

    fn try_from(raw: RawRevalidate) -> Result<Self, Self::Error> {
        match raw {
            RawRevalidate::Seconds(secs) => Ok(Revalidate::After(secs)),
            RawRevalidate::Float(secs)
                if secs >= 0.0 && secs.fract() == 0.0 && secs <= u64::MAX as f64 =>
            {
                Ok(Revalidate::After(secs as u64))
            }
            RawRevalidate::Float(secs) => Err(format!(
                "revalidate must be a whole number of seconds, got {}",
                secs
            )),
            RawRevalidate::Flag(false) => Ok(Revalidate::Never),
            RawRevalidate::Flag(true) => {
                Err("revalidate must be false or a non-negative integer".to_string())
            }
        }
    }
}

impl From<Revalidate> for RawRevalidate {
    fn from(value: Revalidate) -> Self {
        match value {
            Revalidate::Never => RawRevalidate::Flag(false),
            Revalidate::After(secs) => RawRevalidate::Seconds(secs),
        }
    }
}

/// `export const dynamic = ...`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DynamicDirective {
    Auto,
    ForceDynamic,
    ForceStatic,
    Error,
}

/// `export const fetchCache = ...`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FetchCache {
    Auto,
    DefaultCache,
    OnlyCache,
    ForceCache,
    ForceNoStore,
    DefaultNoStore,
    OnlyNoStore,
}

/// `export const runtime = ...`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Runtime {
    Nodejs,
    Edge,
    ExperimentalEdge,
}

/// `export const preferredRegion = ...`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PreferredRegion {
    One(String),
    Many(Vec<String>),
}

/// Validated configuration of one segment
///
/// Only ever constructed with at least one field set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revalidate: Option<Revalidate>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dynamic: Option<DynamicDirective>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dynamic_params: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fetch_cache: Option<FetchCache>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runtime: Option<Runtime>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_region: Option<PreferredRegion>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_duration: Option<u64>,

    #[serde(
        default,
        rename = "experimental_ppr",
        skip_serializing_if = "Option::is_none"
    )]
    pub experimental_ppr: Option<bool>,
}

impl SegmentConfig {
    /// Parses a map of exported values against the schema
    ///
    /// Unknown keys are ignored. Returns `Err` with the validation message
    /// when a recognized key carries an invalid value, and `Ok(None)` when no
    /// recognized key is present.
    pub fn parse(
        exports: serde_json::Map<String, serde_json::Value>,
    ) -> Result<Option<Self>, String> {
        let config: SegmentConfig = serde_json::from_value(serde_json::Value::Object(exports))
            .map_err(|e| e.to_string())?;

        Ok((!config.is_empty()).then_some(config))
    }

    /// Whether no recognized key is set
    pub fn is_empty(&self) -> bool {
        *self == SegmentConfig::default()
    }
}
