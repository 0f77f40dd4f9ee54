//! Prerender configuration types

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Prerender resolution configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrerenderConfig {
    /// Process-wide experimental partial prerendering flag
    #[serde(default)]
    pub experimental_ppr: bool,

    /// Max concurrent generator invocations at one depth of a route
    #[serde(default = "default_generator_concurrency")]
    pub generator_concurrency: usize,

    /// Max routes resolved at once by `resolve_routes`
    #[serde(default = "default_route_concurrency")]
    pub route_concurrency: usize,

    /// Where the prerender manifest is written
    #[serde(default = "default_manifest_path")]
    pub manifest_path: String,
}

fn default_generator_concurrency() -> usize {
    8
}

fn default_route_concurrency() -> usize {
    4
}

fn default_manifest_path() -> String {
    ".rhtmx/prerender-manifest.json".to_string()
}

impl Default for PrerenderConfig {
    fn default() -> Self {
        Self {
            experimental_ppr: false,
            generator_concurrency: default_generator_concurrency(),
            route_concurrency: default_route_concurrency(),
            manifest_path: default_manifest_path(),
        }
    }
}

/// The `[prerender]` table of rhtmx.toml
#[derive(Debug, Clone, Default, Deserialize)]
struct TomlFile {
    #[serde(default)]
    prerender: PrerenderConfig,
}

impl PrerenderConfig {
    /// Load the `[prerender]` section from a rhtmx.toml file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        // If file doesn't exist or is empty, return default config
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        Self::from_toml_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))
    }

    /// Parse the `[prerender]` section out of TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let file: TomlFile = toml::from_str(content)?;
        Ok(file.prerender.normalized())
    }

    /// Clamp concurrency limits to at least one
    pub fn normalized(mut self) -> Self {
        self.generator_concurrency = self.generator_concurrency.max(1);
        self.route_concurrency = self.route_concurrency.max(1);
        self
    }
}
