//! Dynamic segment name parsing
//!
//! Pure parsing of bracketed path components into parameter descriptors.
//! Shares its grammar with the request router: `[id]`, `[...slug]`, `[[...slug]]`.

/// How many path components a dynamic parameter binds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamArity {
    /// `[id]` binds exactly one component
    Single,
    /// `[...slug]` binds one or more components
    CatchAll,
    /// `[[...slug]]` binds zero or more components
    OptionalCatchAll,
}

impl ParamArity {
    /// Whether values for this parameter are sequences of strings
    pub fn is_multi(self) -> bool {
        !matches!(self, ParamArity::Single)
    }
}

/// A parsed dynamic parameter: its name and arity
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DynamicParam {
    pub name: String,
    pub arity: ParamArity,
}

/// Parses a path component into a dynamic parameter (pure function)
///
/// Returns `None` for static components and for malformed brackets.
///
/// # Parsing Rules (evaluated in order)
///
/// 1. **Optional catch-all**: `[[...name]]`
/// 2. **Catch-all**: `[...name]`
/// 3. **Single**: `[name]`
///
/// # Examples
///
/// ```
/// use rhtmx_prerender::segment::pattern::{parse_dynamic_segment, ParamArity};
///
/// let param = parse_dynamic_segment("[slug]").unwrap();
/// assert_eq!(param.name, "slug");
/// assert_eq!(param.arity, ParamArity::Single);
///
/// let param = parse_dynamic_segment("[[...path]]").unwrap();
/// assert_eq!(param.arity, ParamArity::OptionalCatchAll);
///
/// assert!(parse_dynamic_segment("blog").is_none());
/// ```
pub fn parse_dynamic_segment(segment: &str) -> Option<DynamicParam> {
    // Optional catch-all: [[...name]] (double brackets)
    if let Some(inner) = segment.strip_prefix("[[").and_then(|s| s.strip_suffix("]]")) {
        return inner
            .strip_prefix("...")
            .and_then(valid_name)
            .map(|name| DynamicParam {
                name,
                arity: ParamArity::OptionalCatchAll,
            });
    }

    let inner = segment.strip_prefix('[')?.strip_suffix(']')?;

    match inner.strip_prefix("...") {
        Some(rest) => valid_name(rest).map(|name| DynamicParam {
            name,
            arity: ParamArity::CatchAll,
        }),
        None => valid_name(inner).map(|name| DynamicParam {
            name,
            arity: ParamArity::Single,
        }),
    }
}

/// Whether a component is fully wrapped in a bracket pair
pub fn is_dynamic_segment(segment: &str) -> bool {
    parse_dynamic_segment(segment).is_some()
}

fn valid_name(name: &str) -> Option<String> {
    let invalid = name.is_empty() || name.contains(['[', ']', '/']);
    (!invalid).then(|| name.to_string())
}
