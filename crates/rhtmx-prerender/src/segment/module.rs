//! Loaded module exports
//!
//! User modules are untrusted and loosely typed: an export is either plain
//! data or something callable. Only the static params generator is ever
//! called by the resolver.

use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

use crate::params::ParamRecord;

/// Reserved export name of the static params generator
pub const GENERATOR_EXPORT: &str = "generateStaticParams";

/// Directive that marks a module as client-only
pub const USE_CLIENT: &str = "use client";

/// Enumerates the concrete parameter values of a segment
///
/// Receives the parameters already resolved by ancestor segments and returns
/// untrusted data: the resolver validates that it is an array of objects
/// whose values are strings or string arrays.
#[async_trait]
pub trait StaticParamsGenerator: Send + Sync {
    async fn generate(&self, parent: &ParamRecord) -> Result<Value>;
}

#[async_trait]
impl<F, Fut> StaticParamsGenerator for F
where
    F: Fn(ParamRecord) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Value>> + Send + 'static,
{
    async fn generate(&self, parent: &ParamRecord) -> Result<Value> {
        (self)(parent.clone()).await
    }
}

/// A single named export of a module
#[derive(Clone)]
pub enum Export {
    /// Serializable data (`export const revalidate = 60`)
    Value(Value),
    /// A callable export
    Function(Arc<dyn StaticParamsGenerator>),
}

impl fmt::Debug for Export {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Export::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Export::Function(_) => f.write_str("Function(..)"),
        }
    }
}

/// The export namespace of a loaded layout, page or route handler module
#[derive(Debug, Clone, Default)]
pub struct ModuleExports {
    directives: Vec<String>,
    bindings: BTreeMap<String, Export>,
}

impl ModuleExports {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a module-level directive such as `"use client"`
    pub fn with_directive(mut self, directive: impl Into<String>) -> Self {
        self.directives.push(directive.into());
        self
    }

    /// Adds a data export
    pub fn with_value(mut self, name: impl Into<String>, value: Value) -> Self {
        self.bindings.insert(name.into(), Export::Value(value));
        self
    }

    /// Adds a callable export under an arbitrary name
    pub fn with_function(
        mut self,
        name: impl Into<String>,
        function: Arc<dyn StaticParamsGenerator>,
    ) -> Self {
        self.bindings.insert(name.into(), Export::Function(function));
        self
    }

    /// Adds a `generateStaticParams` export
    pub fn with_generator<F, Fut>(self, generator: F) -> Self
    where
        F: Fn(ParamRecord) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value>> + Send + 'static,
    {
        self.with_function(GENERATOR_EXPORT, Arc::new(generator))
    }

    /// Builds a module from a JSON object of data exports
    ///
    /// Returns `None` when `value` is not an object.
    pub fn from_json(value: Value) -> Option<Self> {
        let Value::Object(map) = value else {
            return None;
        };

        Some(Self {
            directives: Vec::new(),
            bindings: map
                .into_iter()
                .map(|(name, value)| (name, Export::Value(value)))
                .collect(),
        })
    }

    pub fn directives(&self) -> &[String] {
        &self.directives
    }

    pub fn get(&self, name: &str) -> Option<&Export> {
        self.bindings.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Export)> {
        self.bindings.iter().map(|(name, export)| (name.as_str(), export))
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json_requires_object() {
        assert!(ModuleExports::from_json(json!([1, 2])).is_none());
        assert!(ModuleExports::from_json(json!("page")).is_none());

        let module = ModuleExports::from_json(json!({ "revalidate": 10 })).unwrap();
        assert!(matches!(module.get("revalidate"), Some(Export::Value(v)) if *v == json!(10)));
    }

    #[tokio::test]
    async fn test_closure_generator() {
        let module = ModuleExports::new().with_generator(|parent: ParamRecord| async move {
            let lang = parent.get_str("lang").unwrap_or("none").to_string();
            anyhow::Ok(json!([{ "slug": lang }]))
        });

        let Some(Export::Function(generator)) = module.get(GENERATOR_EXPORT) else {
            panic!("generator export missing");
        };

        let parent = ParamRecord::new().with("lang", "en");
        let value = generator.generate(&parent).await.unwrap();
        assert_eq!(value, json!([{ "slug": "en" }]));
    }
}
