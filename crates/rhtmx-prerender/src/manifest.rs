//! Prerender manifest written at the end of a build

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::expander::Fallback;
use crate::reducer::DynamicMode;
use crate::resolver::ResolvedRoute;
use crate::route::RouteKind;
use crate::segment::config::Revalidate;

/// Manifest entry for one resolved route
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestRoute {
    pub pathname: String,
    pub kind: RouteKind,
    pub dynamic_mode: DynamicMode,
    pub revalidate: Revalidate,
    pub fallback: Fallback,
    pub ppr: bool,
    /// Concrete pathnames rendered at build time
    pub prerendered: Vec<String>,
}

impl ManifestRoute {
    pub fn from_resolved(route: &ResolvedRoute) -> Result<Self> {
        let prerendered = route
            .prerendered_pathnames()
            .map_err(|e| anyhow::anyhow!(e))
            .with_context(|| format!("Failed to interpolate paths of {}", route.pathname))?;

        Ok(Self {
            pathname: route.pathname.clone(),
            kind: route.kind,
            dynamic_mode: route.policy.dynamic_mode,
            revalidate: route.static_paths.revalidate,
            fallback: route.static_paths.fallback,
            ppr: route.policy.ppr_eligible,
            prerendered,
        })
    }
}

/// All resolved routes of a build, keyed by route id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrerenderManifest {
    pub generated_at: DateTime<Utc>,
    pub routes: BTreeMap<String, ManifestRoute>,
}

impl PrerenderManifest {
    pub fn new() -> Self {
        Self {
            generated_at: Utc::now(),
            routes: BTreeMap::new(),
        }
    }

    /// Build a manifest from resolved routes
    pub fn from_routes<'a>(routes: impl IntoIterator<Item = &'a ResolvedRoute>) -> Result<Self> {
        let mut manifest = Self::new();
        for route in routes {
            manifest.insert(route)?;
        }
        Ok(manifest)
    }

    pub fn insert(&mut self, route: &ResolvedRoute) -> Result<()> {
        let entry = ManifestRoute::from_resolved(route)?;
        self.routes.insert(route.route_id.clone(), entry);
        Ok(())
    }

    /// Total number of prerendered pathnames
    pub fn prerendered_count(&self) -> usize {
        self.routes.values().map(|r| r.prerendered.len()).sum()
    }

    /// Write the manifest as pretty-printed JSON
    pub async fn write(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .context("Failed to create manifest directory")?;
        }

        let json = serde_json::to_string_pretty(self).context("Failed to serialize manifest")?;
        fs::write(path, json)
            .await
            .with_context(|| format!("Failed to write manifest: {:?}", path))?;

        tracing::info!(
            "Wrote prerender manifest with {} routes ({} paths) to {:?}",
            self.routes.len(),
            self.prerendered_count(),
            path
        );
        Ok(())
    }

    /// Read a manifest written by [`PrerenderManifest::write`]
    pub async fn read(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read manifest: {:?}", path))?;
        serde_json::from_str(&json).context("Failed to deserialize manifest")
    }
}

impl Default for PrerenderManifest {
    fn default() -> Self {
        Self::new()
    }
}
