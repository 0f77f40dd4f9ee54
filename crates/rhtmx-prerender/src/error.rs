//! Error types for route resolution

/// Why a single route could not be resolved
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// The route definition is internally inconsistent
    #[error("invalid route structure: {0}")]
    Structure(String),

    /// Two segments bind the same parameter name
    #[error("parameter `{param}` is declared by both {first} and {second}")]
    Conflict {
        param: String,
        first: String,
        second: String,
    },

    /// A static params generator failed or returned malformed data
    #[error("generateStaticParams for segment `{segment}` in {}", .module.as_deref().unwrap_or("<unknown module>"))]
    Generator {
        segment: String,
        module: Option<String>,
        #[source]
        kind: GeneratorErrorKind,
    },

    /// The module loader could not provide the route or one of its modules
    #[error("failed to load {what}")]
    Load {
        what: String,
        #[source]
        source: anyhow::Error,
    },
}

impl ResolveError {
    pub fn structure(msg: impl Into<String>) -> Self {
        ResolveError::Structure(msg.into())
    }

    pub fn is_structure(&self) -> bool {
        matches!(self, ResolveError::Structure(_))
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, ResolveError::Conflict { .. })
    }

    pub fn is_generator(&self) -> bool {
        matches!(self, ResolveError::Generator { .. })
    }
}

/// How a generator invocation went wrong
#[derive(Debug, thiserror::Error)]
pub enum GeneratorErrorKind {
    #[error("generator failed")]
    Failed(#[source] anyhow::Error),

    #[error("returned malformed data: {0}")]
    Malformed(String),
}

/// A resolution failure tagged with the route it belongs to
#[derive(Debug, thiserror::Error)]
#[error("failed to resolve route `{route}`")]
pub struct RouteError {
    pub route: String,
    #[source]
    pub source: ResolveError,
}

impl RouteError {
    pub fn new(route: impl Into<String>, source: ResolveError) -> Self {
        Self {
            route: route.into(),
            source,
        }
    }

    pub fn kind(&self) -> &ResolveError {
        &self.source
    }

    /// One-line message with every cause in the chain, outermost first
    pub fn report(&self) -> String {
        anyhow::Chain::new(self)
            .map(|cause| cause.to_string())
            .collect::<Vec<_>>()
            .join(": ")
    }
}
