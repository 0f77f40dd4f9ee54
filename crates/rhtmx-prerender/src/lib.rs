//! # RHTMX Prerender - Static Path Resolution
//!
//! This crate decides, at build time, which concrete paths of a route are
//! prerendered and how the route behaves for everything else.
//!
//! ## Features
//!
//! - **Segment Config**: `revalidate`, `dynamic`, `dynamicParams` and friends
//!   exported by layouts, pages and route handlers
//! - **Nested Generators**: parent params flow into child `generateStaticParams`
//! - **Bounded Concurrency**: sibling invocations run concurrently, in order
//! - **Prerender Manifest**: JSON summary of every resolved route
//!
//! ## Example
//!
//! ```rust
//! use rhtmx_prerender::{
//!     LoadedRoute, LoaderTree, MemoryModuleLoader, ModuleExports, ParamRecord,
//!     PrerenderConfig, Resolver,
//! };
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let loader = MemoryModuleLoader::new();
//!     loader
//!         .insert_route(
//!             "blog-post",
//!             LoadedRoute::tree(
//!                 "/blog/[slug]",
//!                 LoaderTree::new("").with_child(
//!                     LoaderTree::new("blog")
//!                         .with_child(LoaderTree::new("[slug]").with_page("app/blog/[slug]/page")),
//!                 ),
//!             ),
//!         )
//!         .await;
//!     loader
//!         .insert_module(
//!             "app/blog/[slug]/page",
//!             ModuleExports::new().with_generator(|_parent: ParamRecord| async {
//!                 anyhow::Ok(json!([{ "slug": "hello" }]))
//!             }),
//!         )
//!         .await;
//!
//!     let resolver = Resolver::new(PrerenderConfig::default(), Arc::new(loader));
//!     let route = resolver.resolve_route("blog-post").await.unwrap();
//!
//!     assert_eq!(route.prerendered_pathnames().unwrap(), vec!["/blog/hello"]);
//! }
//! ```

pub mod config;
pub mod error;
pub mod expander;
pub mod loader;
pub mod manifest;
pub mod params;
pub mod reducer;
pub mod resolver;
pub mod route;
pub mod segment;
pub mod walker;

pub use config::PrerenderConfig;
pub use error::{GeneratorErrorKind, ResolveError, RouteError};
pub use expander::{expand, ExpandOptions, Fallback, StaticPathsResult};
pub use loader::{DirectiveClassifier, MemoryModuleLoader, ModuleClassifier, ModuleLoader};
pub use manifest::{ManifestRoute, PrerenderManifest};
pub use params::{interpolate_pathname, ParamRecord, ParamValue};
pub use reducer::{reduce, DynamicMode, RoutePolicy};
pub use resolver::{ResolvedRoute, Resolver};
pub use route::{LoadedRoute, LoaderTree, ModuleRef, RouteKind, RouteShape};
pub use segment::config::Revalidate;
pub use segment::{extract, Extracted, ModuleExports, Segment, SegmentConfig, StaticParamsGenerator};
pub use walker::{walk, walk_flat, walk_tree};
