//! Segment Extractor
//!
//! Pulls the build-time contribution (config + generator) out of a module's
//! exports. Never fails: malformed declarations yield an empty extraction.

use std::sync::Arc;

use serde_json::{Map, Value};

use super::config::{SegmentConfig, CONFIG_KEYS};
use super::module::{Export, ModuleExports, StaticParamsGenerator, GENERATOR_EXPORT};

/// What a module contributes to its segment
#[derive(Clone, Default)]
pub struct Extracted {
    pub config: Option<SegmentConfig>,
    pub generator: Option<Arc<dyn StaticParamsGenerator>>,
}

/// Extracts config and generator from a module namespace
///
/// `None` stands for a module that did not evaluate to a structured object.
pub fn extract(module: Option<&ModuleExports>) -> Extracted {
    let Some(module) = module else {
        return Extracted::default();
    };

    let generator = match module.get(GENERATOR_EXPORT) {
        Some(Export::Function(generator)) => Some(Arc::clone(generator)),
        _ => None,
    };

    Extracted {
        config: extract_config(module),
        generator,
    }
}

fn extract_config(module: &ModuleExports) -> Option<SegmentConfig> {
    let mut values = Map::new();

    for (name, export) in module.iter() {
        match export {
            Export::Value(value) => {
                values.insert(name.to_string(), value.clone());
            }
            Export::Function(_) if CONFIG_KEYS.contains(&name) => {
                tracing::warn!("Ignoring segment config: `{}` must not be a function", name);
                return None;
            }
            Export::Function(_) => {}
        }
    }

    match SegmentConfig::parse(values) {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!("Ignoring invalid segment config: {}", e);
            None
        }
    }
}

/// Shorthand for tests and loaders that hold raw JSON exports
pub fn extract_json(value: Value) -> Extracted {
    extract(ModuleExports::from_json(value).as_ref())
}
