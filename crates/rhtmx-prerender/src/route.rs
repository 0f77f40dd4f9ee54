//! Route definition model
//!
//! What the module loader hands back for a route id: the route's kind and
//! either a flat module reference or a nested loader tree.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::expander::Fallback;

/// Capability tag of a loaded route module
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RouteKind {
    /// App-router page: nested layouts and pages
    AppPage,
    /// App-router route handler (`route.rs`)
    AppRoute,
    /// Pages-router page with its own generator
    PagesPage,
}

impl RouteKind {
    /// Fallback used when `dynamicParams` is not disabled
    pub fn default_fallback(self, ppr_eligible: bool) -> Fallback {
        match self {
            RouteKind::PagesPage => Fallback::Shell,
            RouteKind::AppPage if ppr_eligible => Fallback::Shell,
            RouteKind::AppPage | RouteKind::AppRoute => Fallback::Blocking,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RouteKind::AppPage => "app-page",
            RouteKind::AppRoute => "app-route",
            RouteKind::PagesPage => "pages-page",
        }
    }
}

/// Identity of a module the loader can evaluate
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModuleRef(pub String);

impl ModuleRef {
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// One node of an app-router loader tree
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoaderTree {
    /// Path component of this node (`""` at the root)
    pub segment: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout: Option<ModuleRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<ModuleRef>,
    /// Parallel branches keyed by slot; `"children"` is the primary one
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub parallel_routes: BTreeMap<String, LoaderTree>,
}

/// Key of the primary branch in `parallel_routes`
pub const PRIMARY_BRANCH: &str = "children";

impl LoaderTree {
    pub fn new(segment: impl Into<String>) -> Self {
        Self {
            segment: segment.into(),
            ..Self::default()
        }
    }

    pub fn with_layout(mut self, module: impl Into<String>) -> Self {
        self.layout = Some(ModuleRef::new(module));
        self
    }

    pub fn with_page(mut self, module: impl Into<String>) -> Self {
        self.page = Some(ModuleRef::new(module));
        self
    }

    /// Sets the primary child
    pub fn with_child(self, child: LoaderTree) -> Self {
        self.with_slot(PRIMARY_BRANCH, child)
    }

    /// Adds a parallel branch
    pub fn with_slot(mut self, slot: impl Into<String>, child: LoaderTree) -> Self {
        self.parallel_routes.insert(slot.into(), child);
        self
    }

    /// The module backing this node: its layout, else its page
    pub fn layout_or_page(&self) -> Option<&ModuleRef> {
        self.layout.as_ref().or(self.page.as_ref())
    }

    pub fn primary_child(&self) -> Option<&LoaderTree> {
        self.parallel_routes.get(PRIMARY_BRANCH)
    }
}

/// Shape of a route definition
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RouteShape {
    /// A single module behind a slash-separated pathname
    Flat { module: ModuleRef },
    /// A nested tree of layouts and pages
    Tree(LoaderTree),
}

/// A route as provided by the module loader
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadedRoute {
    /// Route pathname pattern, e.g. `/[lang]/blog/[slug]`
    pub pathname: String,
    pub kind: RouteKind,
    pub shape: RouteShape,
}

impl LoadedRoute {
    pub fn flat(kind: RouteKind, pathname: impl Into<String>, module: impl Into<String>) -> Self {
        Self {
            pathname: pathname.into(),
            kind,
            shape: RouteShape::Flat {
                module: ModuleRef::new(module),
            },
        }
    }

    pub fn tree(pathname: impl Into<String>, tree: LoaderTree) -> Self {
        Self {
            pathname: pathname.into(),
            kind: RouteKind::AppPage,
            shape: RouteShape::Tree(tree),
        }
    }
}
