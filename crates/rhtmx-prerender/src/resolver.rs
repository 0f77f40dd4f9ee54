//! Resolution orchestrator - walks, reduces and expands one route at a time

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use serde::Serialize;

use crate::config::PrerenderConfig;
use crate::error::{ResolveError, RouteError};
use crate::expander::{expand, ExpandOptions, StaticPathsResult};
use crate::loader::{DirectiveClassifier, ModuleClassifier, ModuleLoader};
use crate::manifest::PrerenderManifest;
use crate::params::{interpolate_pathname, ParamRecord};
use crate::reducer::{reduce, RoutePolicy};
use crate::route::RouteKind;
use crate::segment::pattern::is_dynamic_segment;
use crate::walker::walk;

/// Everything the build pipeline needs to prerender one route
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedRoute {
    pub route_id: String,
    /// Route pathname pattern, e.g. `/[lang]/blog/[slug]`
    pub pathname: String,
    pub kind: RouteKind,
    pub policy: RoutePolicy,
    pub static_paths: StaticPathsResult,
}

impl ResolvedRoute {
    /// Concrete pathnames to prerender
    ///
    /// A route without dynamic segments prerenders its own pathname.
    pub fn prerendered_pathnames(&self) -> Result<Vec<String>, String> {
        if self.static_paths.paths.is_empty() {
            let is_static = !self.pathname.split('/').any(is_dynamic_segment);
            return if is_static {
                interpolate_pathname(&self.pathname, &ParamRecord::new()).map(|p| vec![p])
            } else {
                Ok(Vec::new())
            };
        }

        self.static_paths
            .paths
            .iter()
            .map(|record| interpolate_pathname(&self.pathname, record))
            .collect()
    }
}

/// Resolves routes against a module loader
pub struct Resolver {
    config: PrerenderConfig,
    loader: Arc<dyn ModuleLoader>,
    classifier: Arc<dyn ModuleClassifier>,
}

impl Resolver {
    /// Create a resolver using the `"use client"` directive classifier
    pub fn new(config: PrerenderConfig, loader: Arc<dyn ModuleLoader>) -> Self {
        Self {
            config: config.normalized(),
            loader,
            classifier: Arc::new(DirectiveClassifier),
        }
    }

    /// Replace the client module classifier
    pub fn with_classifier(mut self, classifier: Arc<dyn ModuleClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn config(&self) -> &PrerenderConfig {
        &self.config
    }

    /// Resolve the rendering policy and static paths of one route
    pub async fn resolve_route(&self, route_id: &str) -> Result<ResolvedRoute, RouteError> {
        self.resolve(route_id)
            .await
            .map_err(|source| RouteError::new(route_id, source))
    }

    async fn resolve(&self, route_id: &str) -> Result<ResolvedRoute, ResolveError> {
        let route = self
            .loader
            .load_route(route_id)
            .await
            .map_err(|source| ResolveError::Load {
                what: format!("route `{}` via {} loader", route_id, self.loader.name()),
                source,
            })?;

        let segments = walk(&route, self.loader.as_ref(), self.classifier.as_ref()).await?;

        let ppr_enabled = self.config.experimental_ppr && route.kind == RouteKind::AppPage;
        let policy = reduce(&segments, ppr_enabled);

        let options = ExpandOptions {
            default_fallback: route.kind.default_fallback(policy.ppr_eligible),
            concurrency: self.config.generator_concurrency,
        };
        let static_paths = expand(&segments, &policy, &options).await?;

        tracing::info!(
            "Resolved {} route {}: {:?}, {} static paths, fallback {:?}",
            route.kind.as_str(),
            route.pathname,
            policy.dynamic_mode,
            static_paths.paths.len(),
            static_paths.fallback
        );

        Ok(ResolvedRoute {
            route_id: route_id.to_string(),
            pathname: route.pathname,
            kind: route.kind,
            policy,
            static_paths,
        })
    }

    /// Resolve many routes, isolating failures per route
    ///
    /// Results are returned in input order.
    pub async fn resolve_routes<S: AsRef<str>>(
        &self,
        route_ids: &[S],
    ) -> Vec<Result<ResolvedRoute, RouteError>> {
        stream::iter(route_ids)
            .map(|id| async move {
                let result = self.resolve_route(id.as_ref()).await;
                if let Err(ref e) = result {
                    tracing::error!("{}", e.report());
                }
                result
            })
            .buffered(self.config.route_concurrency)
            .collect()
            .await
    }

    /// Write the manifest of resolved routes to the configured path
    pub async fn write_manifest(&self, routes: &[ResolvedRoute]) -> anyhow::Result<PrerenderManifest> {
        let manifest = PrerenderManifest::from_routes(routes)?;
        manifest.write(&self.config.manifest_path).await?;
        Ok(manifest)
    }
}

impl Clone for Resolver {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            loader: Arc::clone(&self.loader),
            classifier: Arc::clone(&self.classifier),
        }
    }
}
