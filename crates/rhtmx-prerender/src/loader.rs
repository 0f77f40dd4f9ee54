//! Module loading collaborators
//!
//! The resolver never evaluates user code itself. A `ModuleLoader` hands it
//! route definitions and module namespaces; a `ModuleClassifier` decides
//! which modules are client-only.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::route::{LoadedRoute, ModuleRef};
use crate::segment::module::{ModuleExports, USE_CLIENT};

/// Trait for route and module loaders
#[async_trait]
pub trait ModuleLoader: Send + Sync {
    /// Load the definition of a route by id
    async fn load_route(&self, route_id: &str) -> Result<LoadedRoute>;

    /// Evaluate a module and return its exports
    ///
    /// `Ok(None)` means the module did not evaluate to a structured object.
    async fn load_module(&self, module: &ModuleRef) -> Result<Option<ModuleExports>>;

    /// Get loader name
    fn name(&self) -> &'static str;
}

/// Decides whether a module is client-only
pub trait ModuleClassifier: Send + Sync {
    fn is_client_module(&self, module: &ModuleExports) -> bool;
}

/// Classifies modules by their `"use client"` directive
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectiveClassifier;

impl ModuleClassifier for DirectiveClassifier {
    fn is_client_module(&self, module: &ModuleExports) -> bool {
        module.directives().iter().any(|d| d == USE_CLIENT)
    }
}

/// In-memory loader
///
/// Holds pre-evaluated routes and modules. Used by tests and by build steps
/// that evaluate modules ahead of resolution.
#[derive(Clone, Default)]
pub struct MemoryModuleLoader {
    routes: Arc<RwLock<HashMap<String, LoadedRoute>>>,
    modules: Arc<RwLock<HashMap<ModuleRef, Option<ModuleExports>>>>,
}

impl MemoryModuleLoader {
    /// Create an empty loader
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a route under an id
    pub async fn insert_route(&self, route_id: impl Into<String>, route: LoadedRoute) {
        self.routes.write().await.insert(route_id.into(), route);
    }

    /// Register the exports of a module
    pub async fn insert_module(&self, module: impl Into<String>, exports: ModuleExports) {
        self.modules
            .write()
            .await
            .insert(ModuleRef::new(module), Some(exports));
    }

    /// Register a module that evaluates to something other than an object
    pub async fn insert_opaque_module(&self, module: impl Into<String>) {
        self.modules.write().await.insert(ModuleRef::new(module), None);
    }

    /// Ids of all registered routes, sorted
    pub async fn route_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.routes.read().await.keys().cloned().collect();
        ids.sort();
        ids
    }
}

#[async_trait]
impl ModuleLoader for MemoryModuleLoader {
    async fn load_route(&self, route_id: &str) -> Result<LoadedRoute> {
        let routes = self.routes.read().await;
        routes
            .get(route_id)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("Unknown route: {}", route_id))
    }

    async fn load_module(&self, module: &ModuleRef) -> Result<Option<ModuleExports>> {
        let modules = self.modules.read().await;
        modules
            .get(module)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("Module not found: {}", module.as_str()))
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::route::RouteKind;
    use serde_json::json;

    #[tokio::test]
    async fn test_memory_loader_basic() {
        let loader = MemoryModuleLoader::new();
        loader
            .insert_route(
                "api-item",
                LoadedRoute::flat(RouteKind::AppRoute, "/api/[id]", "app/api/[id]/route"),
            )
            .await;
        loader
            .insert_module(
                "app/api/[id]/route",
                ModuleExports::new().with_value("dynamic", json!("force-static")),
            )
            .await;

        let route = loader.load_route("api-item").await.unwrap();
        assert_eq!(route.pathname, "/api/[id]");

        let module = loader
            .load_module(&ModuleRef::new("app/api/[id]/route"))
            .await
            .unwrap();
        assert!(module.is_some());

        assert!(loader.load_route("missing").await.is_err());
        assert!(loader.load_module(&ModuleRef::new("missing")).await.is_err());
    }

    #[tokio::test]
    async fn test_memory_loader_opaque_module() {
        let loader = MemoryModuleLoader::new();
        loader.insert_opaque_module("app/weird/page").await;

        let module = loader
            .load_module(&ModuleRef::new("app/weird/page"))
            .await
            .unwrap();
        assert!(module.is_none());
    }

    #[tokio::test]
    async fn test_route_ids_sorted() {
        let loader = MemoryModuleLoader::new();
        loader.insert_route("b", LoadedRoute::flat(RouteKind::PagesPage, "/b", "pages/b")).await;
        loader.insert_route("a", LoadedRoute::flat(RouteKind::PagesPage, "/a", "pages/a")).await;

        assert_eq!(loader.route_ids().await, vec!["a", "b"]);
        assert_eq!(loader.name(), "memory");
    }

    #[test]
    fn test_directive_classifier() {
        let classifier = DirectiveClassifier;
        let client = ModuleExports::new().with_directive("use client");
        let server = ModuleExports::new().with_directive("use strict");

        assert!(classifier.is_client_module(&client));
        assert!(!classifier.is_client_module(&server));
        assert!(!classifier.is_client_module(&ModuleExports::new()));
    }
}
