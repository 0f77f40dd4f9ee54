//! Static Path Expander
//!
//! Invokes segment generators root-to-leaf, feeding every partially resolved
//! record of one depth into the next depth's generator, and collects the
//! cross product as the route's prerenderable params.
//!
//! Within one depth, invocations for distinct parent records run
//! concurrently up to the configured limit. A child generator never starts
//! before its parent's invocation has completed.

use std::collections::{HashMap, HashSet};
use std::future::Future;

use futures::stream::{self, StreamExt, TryStreamExt};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{GeneratorErrorKind, ResolveError};
use crate::params::{ParamRecord, ParamValue};
use crate::reducer::RoutePolicy;
use crate::segment::config::Revalidate;
use crate::segment::{DynamicParam, ParamArity, Segment, StaticParamsGenerator};

/// What to do with requests whose params were not enumerated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawFallback", into = "RawFallback")]
pub enum Fallback {
    /// `false`: respond not-found
    NotFound,
    /// `true`: serve a fallback shell, then render and cache
    Shell,
    /// `"blocking"`: render on demand before responding
    Blocking,
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum RawFallback {
    Flag(bool),
    Mode(String),
}

impl TryFrom<RawFallback> for Fallback {
    type Error = String;

    fn try_from(raw: RawFallback) -> Result<Self, Self::Error> {
        match raw {
            RawFallback::Flag(false) => Ok(Fallback::NotFound),
            RawFallback::Flag(true) => Ok(Fallback::Shell),
            RawFallback::Mode(mode) if mode == "blocking" => Ok(Fallback::Blocking),
            RawFallback::Mode(mode) => Err(format!("unknown fallback mode `{}`", mode)),
        }
    }
}

impl From<Fallback> for RawFallback {
    fn from(value: Fallback) -> Self {
        match value {
            Fallback::NotFound => RawFallback::Flag(false),
            Fallback::Shell => RawFallback::Flag(true),
            Fallback::Blocking => RawFallback::Mode("blocking".to_string()),
        }
    }
}

/// Expansion output for one route
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaticPathsResult {
    /// One record per prerenderable path, in traversal order
    pub paths: Vec<ParamRecord>,
    pub fallback: Fallback,
    pub revalidate: Revalidate,
}

/// Route-level inputs to expansion
#[derive(Debug, Clone, Copy)]
pub struct ExpandOptions {
    /// Fallback when `dynamicParams` is not disabled
    pub default_fallback: Fallback,
    /// Max concurrent generator invocations per depth
    pub concurrency: usize,
}

impl Default for ExpandOptions {
    fn default() -> Self {
        Self {
            default_fallback: Fallback::Blocking,
            concurrency: 8,
        }
    }
}

/// Expands a filtered segment chain into its static params
pub async fn expand(
    segments: &[Segment],
    policy: &RoutePolicy,
    options: &ExpandOptions,
) -> Result<StaticPathsResult, ResolveError> {
    check_param_conflicts(segments)?;

    let result = |paths: Vec<ParamRecord>, fallback: Fallback| StaticPathsResult {
        paths,
        fallback,
        revalidate: policy.revalidate,
    };

    if !segments.iter().any(Segment::is_dynamic) {
        return Ok(result(Vec::new(), Fallback::NotFound));
    }

    let fallback = if policy.dynamic_params {
        options.default_fallback
    } else {
        Fallback::NotFound
    };

    if !policy.enumerates_params() {
        tracing::debug!("Route is force-dynamic; skipping static params generation");
        return Ok(result(Vec::new(), fallback));
    }

    let limit = options.concurrency.max(1);
    let mut owners: HashMap<String, String> = HashMap::new();
    let mut records = vec![ParamRecord::new()];

    for segment in segments {
        records = match (&segment.param, &segment.generator) {
            (Some(param), Some(generator)) => {
                let next =
                    expand_dynamic(segment, param, generator.as_ref(), records, &owners, limit)
                        .await?;
                owners.insert(param.name.clone(), segment.describe());
                next
            }
            (Some(_), None) => {
                tracing::debug!(
                    "Segment {} has no generator; paths cannot be enumerated",
                    segment.describe()
                );
                Vec::new()
            }
            (None, Some(generator)) => {
                filter_records(segment, generator.as_ref(), records, &owners, limit).await?
            }
            (None, None) => records,
        };

        tracing::debug!(
            "Expanded segment {} to {} records",
            segment.describe(),
            records.len()
        );

        if records.is_empty() {
            break;
        }
    }

    let mut seen = HashSet::new();
    records.retain(|record| seen.insert(record.clone()));

    Ok(result(records, fallback))
}

/// Rejects chains where two dynamic segments bind the same name
fn check_param_conflicts(segments: &[Segment]) -> Result<(), ResolveError> {
    let mut seen: HashMap<&str, &Segment> = HashMap::new();

    for segment in segments {
        let Some(name) = segment.param_name() else {
            continue;
        };
        if let Some(first) = seen.insert(name, segment) {
            return Err(ResolveError::Conflict {
                param: name.to_string(),
                first: first.describe(),
                second: segment.describe(),
            });
        }
    }

    Ok(())
}

/// Cross product of every parent record with the values generated for it
async fn expand_dynamic(
    segment: &Segment,
    param: &DynamicParam,
    generator: &dyn StaticParamsGenerator,
    parents: Vec<ParamRecord>,
    owners: &HashMap<String, String>,
    limit: usize,
) -> Result<Vec<ParamRecord>, ResolveError> {
    let per_parent = fan_out(parents, limit, |parent| async move {
        let entries = invoke(segment, generator, &parent).await?;
        entries
            .into_iter()
            .map(|entry| bind_entry(segment, param, &parent, entry, owners))
            .collect::<Result<Vec<_>, ResolveError>>()
    })
    .await?;

    Ok(per_parent.into_iter().flatten().collect())
}

/// Runs `task` for every parent record, at most `limit` at a time
///
/// Returns on the first error without waiting for slower siblings. Results
/// come back in parent order.
async fn fan_out<T, F, Fut>(
    parents: Vec<ParamRecord>,
    limit: usize,
    task: F,
) -> Result<Vec<T>, ResolveError>
where
    F: Fn(ParamRecord) -> Fut,
    Fut: Future<Output = Result<T, ResolveError>>,
{
    let mut results: Vec<(usize, T)> = stream::iter(parents.into_iter().enumerate())
        .map(|(index, parent)| {
            let pending = task(parent);
            async move { pending.await.map(|value| (index, value)) }
        })
        .buffer_unordered(limit)
        .try_collect()
        .await?;

    results.sort_unstable_by_key(|(index, _)| *index);
    Ok(results.into_iter().map(|(_, value)| value).collect())
}

fn bind_entry(
    segment: &Segment,
    param: &DynamicParam,
    parent: &ParamRecord,
    mut entry: Map<String, Value>,
    owners: &HashMap<String, String>,
) -> Result<ParamRecord, ResolveError> {
    let raw = entry.remove(&param.name);

    for key in entry.keys() {
        if parent.contains(key) {
            return Err(ResolveError::Conflict {
                param: key.clone(),
                first: owner_of(owners, key),
                second: segment.describe(),
            });
        }
        tracing::warn!(
            "Ignoring `{}` returned by generator of {}: not its parameter",
            key,
            segment.describe()
        );
    }

    let value = match (param.arity, raw) {
        (ParamArity::OptionalCatchAll, None | Some(Value::Null)) => ParamValue::Multi(Vec::new()),
        (_, None) => {
            return Err(malformed(
                segment,
                format!("an entry is missing parameter `{}`", param.name),
            ))
        }
        (arity, Some(raw)) => {
            let value = ParamValue::from_json(&raw).ok_or_else(|| {
                malformed(
                    segment,
                    format!("`{}` must be a string or an array of strings", param.name),
                )
            })?;
            check_arity(segment, param, arity, &value)?;
            value
        }
    };

    let mut record = parent.clone();
    record.insert(param.name.clone(), value);
    Ok(record)
}

fn check_arity(
    segment: &Segment,
    param: &DynamicParam,
    arity: ParamArity,
    value: &ParamValue,
) -> Result<(), ResolveError> {
    let problem = match (arity, value) {
        (ParamArity::Single, ParamValue::Single(_)) => return Ok(()),
        (ParamArity::Single, ParamValue::Multi(_)) => "must be a string",
        (ParamArity::CatchAll, ParamValue::Multi(values)) if values.is_empty() => {
            "needs at least one value"
        }
        (_, ParamValue::Multi(_)) => return Ok(()),
        (_, ParamValue::Single(_)) => "must be an array of strings",
    };

    Err(malformed(segment, format!("`{}` {}", param.name, problem)))
}

/// Runs a non-dynamic segment's generator as a filter over parent records
///
/// A parent survives when the generator returns at least one entry for it.
/// Entries may repeat parent values but never contradict them.
async fn filter_records(
    segment: &Segment,
    generator: &dyn StaticParamsGenerator,
    parents: Vec<ParamRecord>,
    owners: &HashMap<String, String>,
    limit: usize,
) -> Result<Vec<ParamRecord>, ResolveError> {
    let kept: Vec<Option<ParamRecord>> = fan_out(parents, limit, |parent| async move {
        let entries = invoke(segment, generator, &parent).await?;
        for entry in &entries {
            check_reaffirmed(segment, &parent, entry, owners)?;
        }
        Ok::<_, ResolveError>((!entries.is_empty()).then_some(parent))
    })
    .await?;

    Ok(kept.into_iter().flatten().collect())
}

fn check_reaffirmed(
    segment: &Segment,
    parent: &ParamRecord,
    entry: &Map<String, Value>,
    owners: &HashMap<String, String>,
) -> Result<(), ResolveError> {
    for (key, raw) in entry {
        let Some(known) = parent.get(key) else {
            tracing::warn!(
                "Ignoring `{}` returned by generator of {}: segment has no parameter",
                key,
                segment.describe()
            );
            continue;
        };

        if ParamValue::from_json(raw).as_ref() != Some(known) {
            return Err(ResolveError::Conflict {
                param: key.clone(),
                first: owner_of(owners, key),
                second: segment.describe(),
            });
        }
    }

    Ok(())
}

async fn invoke(
    segment: &Segment,
    generator: &dyn StaticParamsGenerator,
    parent: &ParamRecord,
) -> Result<Vec<Map<String, Value>>, ResolveError> {
    let value = generator.generate(parent).await.map_err(|e| ResolveError::Generator {
        segment: segment.name.clone(),
        module: segment.source_path.clone(),
        kind: GeneratorErrorKind::Failed(e),
    })?;

    let Value::Array(items) = value else {
        return Err(malformed(segment, "expected an array of param objects".to_string()));
    };

    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| match item {
            Value::Object(map) => Ok(map),
            other => Err(malformed(
                segment,
                format!("entry {} is not an object: {}", i, other),
            )),
        })
        .collect()
}

fn owner_of(owners: &HashMap<String, String>, param: &str) -> String {
    owners
        .get(param)
        .cloned()
        .unwrap_or_else(|| format!("`[{}]`", param))
}

fn malformed(segment: &Segment, reason: String) -> ResolveError {
    ResolveError::Generator {
        segment: segment.name.clone(),
        module: segment.source_path.clone(),
        kind: GeneratorErrorKind::Malformed(reason),
    }
}
