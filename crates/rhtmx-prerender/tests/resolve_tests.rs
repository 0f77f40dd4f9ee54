/// Integration tests for route resolution
///
/// Each test builds a small app in a `MemoryModuleLoader` and resolves it
/// the way a build would.

use pretty_assertions::assert_eq;
use rhtmx_prerender::{
    DynamicMode, Fallback, LoadedRoute, LoaderTree, MemoryModuleLoader, ModuleExports,
    ParamRecord, PrerenderConfig, PrerenderManifest, ResolveError, Resolver, Revalidate,
    RouteKind,
};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn resolver(loader: &MemoryModuleLoader, config: PrerenderConfig) -> Resolver {
    Resolver::new(config, Arc::new(loader.clone()))
}

fn lang_blog_tree() -> LoaderTree {
    LoaderTree::new("")
        .with_layout("app/layout")
        .with_child(
            LoaderTree::new("[lang]").with_layout("app/[lang]/layout").with_child(
                LoaderTree::new("blog").with_child(
                    LoaderTree::new("[slug]").with_page("app/[lang]/blog/[slug]/page"),
                ),
            ),
        )
}

async fn lang_blog_app(lang_config: serde_json::Value) -> MemoryModuleLoader {
    let loader = MemoryModuleLoader::new();
    loader
        .insert_route("lang-blog", LoadedRoute::tree("/[lang]/blog/[slug]", lang_blog_tree()))
        .await;
    loader
        .insert_module("app/layout", ModuleExports::new().with_value("revalidate", json!(3600)))
        .await;

    let mut lang = ModuleExports::from_json(lang_config).unwrap_or_default();
    lang = lang.with_generator(|_parent: ParamRecord| async {
        anyhow::Ok(json!([{ "lang": "en" }, { "lang": "fr" }]))
    });
    loader.insert_module("app/[lang]/layout", lang).await;

    loader
        .insert_module(
            "app/[lang]/blog/[slug]/page",
            ModuleExports::new()
                .with_value("revalidate", json!(60))
                .with_generator(|parent: ParamRecord| async move {
                    match parent.get_str("lang") {
                        Some("en") => anyhow::Ok(json!([{ "slug": "a" }])),
                        Some("fr") => anyhow::Ok(json!([{ "slug": "a" }, { "slug": "b" }])),
                        other => anyhow::bail!("unexpected lang {:?}", other),
                    }
                }),
        )
        .await;

    loader
}

// ============================================================================
// Nested generators
// ============================================================================

#[tokio::test]
async fn test_nested_generators_produce_ordered_paths() {
    init_tracing();
    let loader = lang_blog_app(json!({})).await;

    let route = resolver(&loader, PrerenderConfig::default())
        .resolve_route("lang-blog")
        .await
        .unwrap();

    assert_eq!(route.kind, RouteKind::AppPage);
    assert_eq!(route.policy.dynamic_mode, DynamicMode::Dynamic);
    assert_eq!(route.static_paths.revalidate, Revalidate::After(60));
    assert_eq!(route.static_paths.fallback, Fallback::Blocking);
    assert_eq!(
        route.static_paths.paths,
        vec![
            ParamRecord::new().with("lang", "en").with("slug", "a"),
            ParamRecord::new().with("lang", "fr").with("slug", "a"),
            ParamRecord::new().with("lang", "fr").with("slug", "b"),
        ]
    );
    assert_eq!(
        route.prerendered_pathnames().unwrap(),
        vec!["/en/blog/a", "/fr/blog/a", "/fr/blog/b"]
    );
}

#[tokio::test]
async fn test_dynamic_params_false_disables_fallback() {
    init_tracing();
    let loader = lang_blog_app(json!({ "dynamicParams": false })).await;

    let route = resolver(&loader, PrerenderConfig::default())
        .resolve_route("lang-blog")
        .await
        .unwrap();

    assert_eq!(route.static_paths.fallback, Fallback::NotFound);
    assert_eq!(route.static_paths.paths.len(), 3);
}

#[tokio::test]
async fn test_ppr_page_gets_shell_fallback() {
    init_tracing();
    let loader = lang_blog_app(json!({})).await;
    let config = PrerenderConfig {
        experimental_ppr: true,
        ..PrerenderConfig::default()
    };

    let route = resolver(&loader, config).resolve_route("lang-blog").await.unwrap();
    assert!(route.policy.ppr_eligible);
    assert_eq!(route.static_paths.fallback, Fallback::Shell);
}

#[tokio::test]
async fn test_client_page_generator_is_ignored() {
    init_tracing();
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);

    let loader = MemoryModuleLoader::new();
    loader
        .insert_route(
            "widget",
            LoadedRoute::tree(
                "/widgets/[id]",
                LoaderTree::new("").with_child(
                    LoaderTree::new("widgets")
                        .with_child(LoaderTree::new("[id]").with_page("app/widgets/[id]/page")),
                ),
            ),
        )
        .await;
    loader
        .insert_module(
            "app/widgets/[id]/page",
            ModuleExports::new()
                .with_directive("use client")
                .with_value("dynamicParams", json!(false))
                .with_generator(move |_parent: ParamRecord| {
                    counter.fetch_add(1, Ordering::SeqCst);
                    async { anyhow::Ok(json!([{ "id": "1" }])) }
                }),
        )
        .await;

    let route = resolver(&loader, PrerenderConfig::default())
        .resolve_route("widget")
        .await
        .unwrap();

    assert!(route.static_paths.paths.is_empty());
    assert_eq!(route.static_paths.fallback, Fallback::Blocking);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_unenumerable_parent_skips_leaf_generator() {
    init_tracing();
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);

    let loader = MemoryModuleLoader::new();
    loader
        .insert_route(
            "docs",
            LoadedRoute::flat(RouteKind::PagesPage, "/[section]/[page]", "pages/[section]/[page]"),
        )
        .await;
    loader
        .insert_module(
            "pages/[section]/[page]",
            ModuleExports::new().with_generator(move |_parent: ParamRecord| {
                counter.fetch_add(1, Ordering::SeqCst);
                async { anyhow::Ok(json!([{ "page": "intro" }])) }
            }),
        )
        .await;

    let route = resolver(&loader, PrerenderConfig::default())
        .resolve_route("docs")
        .await
        .unwrap();

    // Only the leaf carries a generator, so `[section]` cannot be enumerated.
    assert!(route.static_paths.paths.is_empty());
    assert_eq!(route.static_paths.fallback, Fallback::Shell);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_wide_expansion_is_bounded_and_ordered() {
    init_tracing();
    let in_flight = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));

    let loader = MemoryModuleLoader::new();
    loader
        .insert_route(
            "shop",
            LoadedRoute::tree(
                "/[category]/[item]",
                LoaderTree::new("").with_child(
                    LoaderTree::new("[category]")
                        .with_layout("app/[category]/layout")
                        .with_child(LoaderTree::new("[item]").with_page("app/[category]/[item]/page")),
                ),
            ),
        )
        .await;
    loader
        .insert_module(
            "app/[category]/layout",
            ModuleExports::new().with_generator(|_parent: ParamRecord| async {
                anyhow::Ok(json!([
                    { "category": "a" },
                    { "category": "b" },
                    { "category": "c" },
                    { "category": "d" },
                ]))
            }),
        )
        .await;

    let (current, max) = (Arc::clone(&in_flight), Arc::clone(&peak));
    loader
        .insert_module(
            "app/[category]/[item]/page",
            ModuleExports::new().with_generator(move |parent: ParamRecord| {
                let (current, max) = (Arc::clone(&current), Arc::clone(&max));
                async move {
                    let now = current.fetch_add(1, Ordering::SeqCst) + 1;
                    max.fetch_max(now, Ordering::SeqCst);
                    // Earlier parents finish later; output order must not change.
                    let delay = match parent.get_str("category") {
                        Some("a") => 40,
                        Some("b") => 30,
                        Some("c") => 20,
                        _ => 10,
                    };
                    tokio::time::sleep(Duration::from_millis(delay)).await;
                    current.fetch_sub(1, Ordering::SeqCst);
                    anyhow::Ok(json!([{ "item": "x" }]))
                }
            }),
        )
        .await;

    let config = PrerenderConfig {
        generator_concurrency: 2,
        ..PrerenderConfig::default()
    };
    let route = resolver(&loader, config).resolve_route("shop").await.unwrap();

    assert_eq!(
        route.prerendered_pathnames().unwrap(),
        vec!["/a/x", "/b/x", "/c/x", "/d/x"]
    );
    assert_eq!(peak.load(Ordering::SeqCst), 2);
}

// ============================================================================
// Errors
// ============================================================================

#[tokio::test]
async fn test_conflict_returns_no_partial_paths() {
    init_tracing();
    let loader = MemoryModuleLoader::new();
    loader
        .insert_route(
            "conflict",
            LoadedRoute::tree(
                "/[lang]/[slug]",
                LoaderTree::new("").with_child(
                    LoaderTree::new("[lang]")
                        .with_layout("app/[lang]/layout")
                        .with_child(LoaderTree::new("[slug]").with_page("app/[lang]/[slug]/page")),
                ),
            ),
        )
        .await;
    loader
        .insert_module(
            "app/[lang]/layout",
            ModuleExports::new().with_generator(|_parent: ParamRecord| async {
                anyhow::Ok(json!([{ "lang": "en" }]))
            }),
        )
        .await;
    loader
        .insert_module(
            "app/[lang]/[slug]/page",
            ModuleExports::new().with_generator(|_parent: ParamRecord| async {
                anyhow::Ok(json!([{ "slug": "a", "lang": "en" }]))
            }),
        )
        .await;

    let err = resolver(&loader, PrerenderConfig::default())
        .resolve_route("conflict")
        .await
        .unwrap_err();

    assert_eq!(err.route, "conflict");
    match err.kind() {
        ResolveError::Conflict { param, .. } => assert_eq!(param, "lang"),
        other => panic!("expected conflict, got {other}"),
    }
}

#[tokio::test]
async fn test_generator_error_names_module() {
    init_tracing();
    let loader = MemoryModuleLoader::new();
    loader
        .insert_route(
            "items",
            LoadedRoute::flat(RouteKind::AppRoute, "/api/items/[id]", "app/api/items/[id]/route"),
        )
        .await;
    loader
        .insert_module(
            "app/api/items/[id]/route",
            ModuleExports::new().with_generator(|_parent: ParamRecord| async {
                Err::<serde_json::Value, _>(anyhow::anyhow!("connection refused"))
            }),
        )
        .await;

    let err = resolver(&loader, PrerenderConfig::default())
        .resolve_route("items")
        .await
        .unwrap_err();

    assert!(err.kind().is_generator());
    let message = err.report();
    assert!(message.contains("app/api/items/[id]/route"), "{message}");
    assert!(message.contains("connection refused"), "{message}");
}

#[tokio::test]
async fn test_batch_resolution_isolates_failures() {
    init_tracing();
    let loader = lang_blog_app(json!({})).await;
    loader
        .insert_route("about", LoadedRoute::flat(RouteKind::PagesPage, "/about", "pages/about"))
        .await;
    loader.insert_module("pages/about", ModuleExports::new()).await;
    loader
        .insert_route("broken", LoadedRoute::flat(RouteKind::AppRoute, "", "app/route"))
        .await;
    loader.insert_module("app/route", ModuleExports::new()).await;

    let ids = ["lang-blog", "missing", "broken", "about"];
    let results = resolver(&loader, PrerenderConfig::default())
        .resolve_routes(&ids)
        .await;

    assert_eq!(results.len(), 4);
    assert_eq!(results[0].as_ref().unwrap().static_paths.paths.len(), 3);
    assert!(matches!(
        results[1].as_ref().unwrap_err().kind(),
        ResolveError::Load { .. }
    ));
    assert!(results[2].as_ref().unwrap_err().kind().is_structure());
    assert_eq!(
        results[3].as_ref().unwrap().prerendered_pathnames().unwrap(),
        vec!["/about"]
    );
}

// ============================================================================
// Manifest
// ============================================================================

#[tokio::test]
async fn test_write_manifest_to_configured_path() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let manifest_path = dir.path().join(".rhtmx/prerender-manifest.json");

    let loader = lang_blog_app(json!({})).await;
    let config = PrerenderConfig {
        manifest_path: manifest_path.to_string_lossy().into_owned(),
        ..PrerenderConfig::default()
    };
    let resolver = resolver(&loader, config);

    let routes: Vec<_> = resolver
        .resolve_routes(&["lang-blog"])
        .await
        .into_iter()
        .collect::<Result<_, _>>()
        .unwrap();
    let written = resolver.write_manifest(&routes).await.unwrap();

    let read = PrerenderManifest::read(&manifest_path).await.unwrap();
    assert_eq!(read, written);
    assert_eq!(
        read.routes["lang-blog"].prerendered,
        vec!["/en/blog/a", "/fr/blog/a", "/fr/blog/b"]
    );
    assert_eq!(read.routes["lang-blog"].revalidate, Revalidate::After(60));
}
