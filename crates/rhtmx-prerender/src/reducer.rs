//! Config Reducer
//!
//! Folds per-segment configuration into one route-level policy.

use serde::{Deserialize, Serialize};

use crate::segment::config::{DynamicDirective, FetchCache, PreferredRegion, Revalidate, Runtime};
use crate::segment::Segment;

/// How the route is rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DynamicMode {
    /// No dynamic segment, generator or directive
    Static,
    /// Has dynamic segments; rendered per request unless prerendered
    Dynamic,
    ForceStatic,
    ForceDynamic,
}

/// Route-level rendering policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutePolicy {
    pub dynamic_mode: DynamicMode,
    pub revalidate: Revalidate,
    /// `false` when any segment sets `dynamicParams = false`
    pub dynamic_params: bool,
    pub ppr_eligible: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runtime: Option<Runtime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fetch_cache: Option<FetchCache>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_region: Option<PreferredRegion>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_duration: Option<u64>,
}

impl RoutePolicy {
    /// Whether generators should be invoked to enumerate paths
    pub fn enumerates_params(&self) -> bool {
        self.dynamic_mode != DynamicMode::ForceDynamic
    }
}

/// Reduces an ordered (root-to-leaf) segment chain to a route policy
///
/// `ppr_enabled` is the process-wide experimental partial rendering flag.
pub fn reduce(segments: &[Segment], ppr_enabled: bool) -> RoutePolicy {
    let mut force_dynamic = false;
    let mut force_static = false;
    let mut revalidate: Option<Revalidate> = None;
    let mut dynamic_params = true;
    let mut ppr_opt_out = false;
    let mut runtime = None;
    let mut fetch_cache = None;
    let mut preferred_region = None;
    let mut max_duration: Option<u64> = None;

    for config in segments.iter().filter_map(|s| s.config.as_ref()) {
        match config.dynamic {
            Some(DynamicDirective::ForceDynamic) => force_dynamic = true,
            Some(DynamicDirective::ForceStatic | DynamicDirective::Error) => force_static = true,
            Some(DynamicDirective::Auto) | None => {}
        }

        // A finite value after `false` starts a new minimum.
        revalidate = match (revalidate, config.revalidate) {
            (_, None) => revalidate,
            (_, Some(Revalidate::Never)) => Some(Revalidate::Never),
            (Some(Revalidate::After(current)), Some(Revalidate::After(secs))) => {
                Some(Revalidate::After(current.min(secs)))
            }
            (_, Some(after)) => Some(after),
        };

        if config.dynamic_params == Some(false) {
            dynamic_params = false;
        }
        if config.experimental_ppr == Some(false) {
            ppr_opt_out = true;
        }

        runtime = config.runtime.or(runtime);
        fetch_cache = config.fetch_cache.or(fetch_cache);
        if config.preferred_region.is_some() {
            preferred_region = config.preferred_region.clone();
        }
        max_duration = match (max_duration, config.max_duration) {
            (Some(current), Some(secs)) => Some(current.min(secs)),
            (current, secs) => secs.or(current),
        };
    }

    let has_dynamic_input = segments
        .iter()
        .any(|s| s.is_dynamic() || s.generator.is_some());

    let dynamic_mode = if force_dynamic {
        DynamicMode::ForceDynamic
    } else if force_static {
        DynamicMode::ForceStatic
    } else if has_dynamic_input {
        DynamicMode::Dynamic
    } else {
        DynamicMode::Static
    };

    let revalidate = if force_dynamic {
        Revalidate::After(0)
    } else {
        revalidate.unwrap_or(Revalidate::Never)
    };

    RoutePolicy {
        dynamic_mode,
        revalidate,
        dynamic_params,
        ppr_eligible: ppr_enabled && !ppr_opt_out,
        runtime,
        fetch_cache,
        preferred_region,
        max_duration,
    }
}
