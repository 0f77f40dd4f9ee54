/// Segment module: one node of a route's path chain
///
/// - `pattern`: dynamic name parsing (`[id]`, `[...slug]`, `[[...slug]]`)
/// - `config`: recognized configuration schema
/// - `module`: loaded module export model
/// - `extract`: pulls config and generator out of module exports

pub mod config;
pub mod extract;
pub mod module;
pub mod pattern;

use std::fmt;
use std::sync::Arc;

pub use config::SegmentConfig;
pub use extract::{extract, Extracted};
pub use module::{ModuleExports, StaticParamsGenerator};
pub use pattern::{parse_dynamic_segment, DynamicParam, ParamArity};

/// One path component of a route with its build-time contribution
#[derive(Clone)]
pub struct Segment {
    /// Literal path component, e.g. `"blog"` or `"[slug]"`
    pub name: String,
    /// Parsed parameter when `name` is bracketed
    pub param: Option<DynamicParam>,
    /// Module that defines this segment, if any
    pub source_path: Option<String>,
    pub config: Option<SegmentConfig>,
    pub generator: Option<Arc<dyn StaticParamsGenerator>>,
}

impl Segment {
    /// Builds a segment from its name and extracted contribution
    pub fn new(name: impl Into<String>, source_path: Option<String>, extracted: Extracted) -> Self {
        let name = name.into();
        let param = parse_dynamic_segment(&name);

        Self {
            name,
            param,
            source_path,
            config: extracted.config,
            generator: extracted.generator,
        }
    }

    pub fn is_dynamic(&self) -> bool {
        self.param.is_some()
    }

    pub fn param_name(&self) -> Option<&str> {
        self.param.as_ref().map(|p| p.name.as_str())
    }

    /// Whether the segment affects policy or path enumeration
    pub fn contributes(&self) -> bool {
        self.config.is_some() || self.generator.is_some() || self.is_dynamic()
    }

    /// Human-readable identity for diagnostics
    pub fn describe(&self) -> String {
        match &self.source_path {
            Some(path) => format!("`{}` ({})", self.name, path),
            None => format!("`{}`", self.name),
        }
    }
}

impl fmt::Debug for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Segment")
            .field("name", &self.name)
            .field("param", &self.param)
            .field("source_path", &self.source_path)
            .field("config", &self.config)
            .field("generator", &self.generator.is_some())
            .finish()
    }
}
