//! Segment-Chain Walker
//!
//! Turns a route definition into the ordered root-to-leaf list of segments
//! that contribute config, a generator, or a dynamic parameter.

use crate::error::ResolveError;
use crate::loader::{ModuleClassifier, ModuleLoader};
use crate::route::{LoadedRoute, LoaderTree, ModuleRef, RouteKind, RouteShape};
use crate::segment::{extract, Extracted, ModuleExports, Segment};

/// Walks a loaded route, dispatching on its kind and shape
pub async fn walk(
    route: &LoadedRoute,
    loader: &dyn ModuleLoader,
    classifier: &dyn ModuleClassifier,
) -> Result<Vec<Segment>, ResolveError> {
    match (route.kind, &route.shape) {
        (RouteKind::AppPage, RouteShape::Tree(tree)) => walk_tree(tree, loader, classifier).await,
        (RouteKind::AppRoute | RouteKind::PagesPage, RouteShape::Flat { module }) => {
            let exports = load(loader, module).await?;
            walk_flat(&route.pathname, module, exports.as_ref())
        }
        (kind, _) => Err(ResolveError::structure(format!(
            "{} route `{}` has an unsupported definition shape",
            kind.as_str(),
            route.pathname
        ))),
    }
}

/// Flat variant: one segment per pathname component
///
/// Only the last component carries the module's config and generator.
pub fn walk_flat(
    pathname: &str,
    module: &ModuleRef,
    exports: Option<&ModuleExports>,
) -> Result<Vec<Segment>, ResolveError> {
    let mut components = pathname.split('/').peekable();
    if components.peek() == Some(&"") {
        components.next();
    }
    let components: Vec<&str> = components.collect();

    let Some((last, parents)) = components.split_last() else {
        return Err(ResolveError::structure("expected at least one segment"));
    };

    let mut segments: Vec<Segment> = parents
        .iter()
        .map(|name| Segment::new(*name, None, Extracted::default()))
        .collect();

    segments.push(Segment::new(
        *last,
        Some(module.as_str().to_string()),
        extract(exports),
    ));

    Ok(retain_contributing(segments))
}

/// Tree variant: follows the primary child from the root to the leaf
pub async fn walk_tree(
    root: &LoaderTree,
    loader: &dyn ModuleLoader,
    classifier: &dyn ModuleClassifier,
) -> Result<Vec<Segment>, ResolveError> {
    let mut segments = Vec::new();
    let mut current = Some(root);

    while let Some(node) = current {
        let (source_path, extracted) = match node.layout_or_page() {
            Some(module) => {
                let exports = load(loader, module).await?;
                let is_client = exports
                    .as_ref()
                    .is_some_and(|m| classifier.is_client_module(m));

                let extracted = if is_client {
                    tracing::debug!("Skipping client module {}", module.as_str());
                    Extracted::default()
                } else {
                    extract(exports.as_ref())
                };

                (Some(module.as_str().to_string()), extracted)
            }
            None => (None, Extracted::default()),
        };

        segments.push(Segment::new(node.segment.clone(), source_path, extracted));
        current = node.primary_child();
    }

    Ok(retain_contributing(segments))
}

fn retain_contributing(segments: Vec<Segment>) -> Vec<Segment> {
    segments
        .into_iter()
        .filter(|segment| {
            let keep = segment.contributes();
            if keep {
                tracing::debug!(
                    "Segment {} contributes (config: {}, generator: {})",
                    segment.describe(),
                    segment.config.is_some(),
                    segment.generator.is_some()
                );
            }
            keep
        })
        .collect()
}

async fn load(
    loader: &dyn ModuleLoader,
    module: &ModuleRef,
) -> Result<Option<ModuleExports>, ResolveError> {
    loader
        .load_module(module)
        .await
        .map_err(|source| ResolveError::Load {
            what: format!("module `{}`", module.as_str()),
            source,
        })
}
