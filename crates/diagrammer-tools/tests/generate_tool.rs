// SPDX-FileCopyrightText: 2026 Diagrammer Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `generate_diagram` end to end against a scripted renderer and a real
//! artifact store.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use diagrammer_core::{
    AdapterType, DiagramFormat, DiagrammerError, HealthStatus, PluginAdapter, RenderConfig,
    RenderOutcome, RendererAdapter,
};
use diagrammer_render::DiagramGenerator;
use diagrammer_storage::ArtifactStore;
use diagrammer_tools::{ImageLinks, RequestDefaults, ToolRegistry, register_builtins};
use serde_json::json;
use tempfile::TempDir;

struct Scripted {
    script: Mutex<VecDeque<RenderOutcome>>,
    configs: Mutex<Vec<RenderConfig>>,
    calls: AtomicU32,
    delay: Option<Duration>,
}

impl Scripted {
    fn new(script: Vec<RenderOutcome>) -> Arc<Self> {
        Self::build(script, None)
    }

    /// Sleeps before answering so concurrent calls overlap.
    fn slow(script: Vec<RenderOutcome>, delay: Duration) -> Arc<Self> {
        Self::build(script, Some(delay))
    }

    fn build(script: Vec<RenderOutcome>, delay: Option<Duration>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            configs: Mutex::new(Vec::new()),
            calls: AtomicU32::new(0),
            delay,
        })
    }
}

#[async_trait]
impl PluginAdapter for Scripted {
    fn name(&self) -> &str {
        "scripted"
    }
    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }
    fn adapter_type(&self) -> AdapterType {
        AdapterType::Renderer
    }
    async fn health_check(&self) -> Result<HealthStatus, DiagrammerError> {
        Ok(HealthStatus::Healthy)
    }
    async fn shutdown(&self) -> Result<(), DiagrammerError> {
        Ok(())
    }
}

#[async_trait]
impl RendererAdapter for Scripted {
    async fn render(
        &self,
        _description: &str,
        config: &RenderConfig,
        attempt: u32,
    ) -> RenderOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.configs.lock().unwrap().push(config.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(RenderOutcome::SyntaxFailure {
                message: "Error: Parse error on line 1".into(),
                attempt,
            })
    }
}

fn svg() -> RenderOutcome {
    RenderOutcome::Success {
        bytes: b"<svg/>".to_vec(),
    }
}

async fn registry(
    renderer: Arc<Scripted>,
    defaults: RequestDefaults,
    token: Option<&str>,
) -> (TempDir, Arc<ArtifactStore>, ToolRegistry) {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(ArtifactStore::open(dir.path()).await.unwrap());
    let generator = Arc::new(DiagramGenerator::new(renderer, store.clone(), 3, 200));
    let mut registry = ToolRegistry::new();
    register_builtins(
        &mut registry,
        generator,
        defaults,
        ImageLinks::new("http://localhost:8401", token),
    );
    (dir, store, registry)
}

#[tokio::test]
async fn registers_three_tools() {
    let (_dir, _store, registry) =
        registry(Scripted::new(vec![]), RequestDefaults::default(), None).await;
    assert_eq!(
        registry.names(),
        vec!["generate_diagram", "list_diagram_types", "validate_syntax"]
    );
}

#[tokio::test]
async fn success_returns_url_and_metadata() {
    let renderer = Scripted::new(vec![svg()]);
    let (_dir, store, registry) =
        registry(renderer, RequestDefaults::default(), Some("s3cret")).await;

    let out = registry
        .get("generate_diagram")
        .unwrap()
        .invoke(json!({ "description": "graph TD; A-->B" }))
        .await
        .unwrap();

    assert!(!out.is_error, "{}", out.content);
    assert_eq!(out.content["success"], true);
    assert_eq!(out.content["format"], "svg");
    assert_eq!(out.content["size_bytes"], 6);
    let file_name = out.content["file_name"].as_str().unwrap();
    assert!(file_name.starts_with("diagram_") && file_name.ends_with(".svg"));
    assert_eq!(
        out.content["image_url"],
        format!("http://localhost:8401/diagrams/{file_name}?token=s3cret")
    );
    assert!(store.resolve(file_name).is_ok());
}

#[tokio::test]
async fn omitted_parameters_use_configured_defaults() {
    let renderer = Scripted::new(vec![svg()]);
    let defaults = RequestDefaults {
        format: DiagramFormat::Png,
        scale: 3,
        width: 2000,
        ..RequestDefaults::default()
    };
    let (_dir, _store, registry) = registry(renderer.clone(), defaults, None).await;

    let out = registry
        .get("generate_diagram")
        .unwrap()
        .invoke(json!({ "mermaid_code": "graph TD; A-->B", "format": "", "theme": "dark" }))
        .await
        .unwrap();
    assert_eq!(out.content["format"], "png");

    let configs = renderer.configs.lock().unwrap();
    assert_eq!(configs[0].format, DiagramFormat::Png);
    assert_eq!(configs[0].scale, 3);
    assert_eq!(configs[0].width, 2000);
    assert_eq!(configs[0].theme.to_string(), "dark");
}

#[tokio::test]
async fn exhausted_retries_report_attempts_and_suggestion() {
    let renderer = Scripted::new(vec![]);
    let (_dir, store, registry) =
        registry(renderer.clone(), RequestDefaults::default(), None).await;

    let out = registry
        .get("generate_diagram")
        .unwrap()
        .invoke(json!({ "description": "graph TD; A-->" }))
        .await
        .unwrap();

    assert!(out.is_error);
    assert_eq!(out.content["success"], false);
    assert_eq!(out.content["code"], "syntax_error");
    assert_eq!(out.content["attempt"], 3);
    assert_eq!(out.content["max_attempts"], 3);
    assert_eq!(out.content["error"], "Error: Parse error on line 1");
    assert!(out.content["suggestion"].as_str().unwrap().starts_with("Parse error"));
    assert_eq!(renderer.calls.load(Ordering::SeqCst), 3);
    assert!(store.is_empty());
}

#[tokio::test]
async fn infrastructure_failure_is_distinct() {
    let renderer = Scripted::new(vec![RenderOutcome::InfrastructureFailure {
        reason: "renderer binary `mmdc` not found".into(),
    }]);
    let (_dir, _store, registry) =
        registry(renderer.clone(), RequestDefaults::default(), None).await;

    let out = registry
        .get("generate_diagram")
        .unwrap()
        .invoke(json!({ "description": "graph TD; A-->B" }))
        .await
        .unwrap();

    assert!(out.is_error);
    assert_eq!(out.content["code"], "infrastructure_error");
    assert_eq!(out.content["attempt"], 1);
    assert_eq!(renderer.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn invalid_parameters_never_reach_renderer() {
    let renderer = Scripted::new(vec![svg()]);
    let (_dir, _store, registry) =
        registry(renderer.clone(), RequestDefaults::default(), None).await;
    let tool = registry.get("generate_diagram").unwrap();

    for args in [
        json!({ "description": "graph TD; A-->B", "format": "gif" }),
        json!({ "description": "graph TD; A-->B", "scale": 9 }),
        json!({ "description": "graph TD; A-->B", "scale": -1 }),
        json!({ "description": "graph TD; A-->B", "width": 100 }),
        json!({ "description": "   " }),
        json!({ "description": "x".repeat(201) }),
        json!({ "format": "svg" }),
    ] {
        let out = tool.invoke(args.clone()).await.unwrap();
        assert!(out.is_error, "{args}");
        assert_eq!(out.content["code"], "validation_error", "{args}");
        assert!(out.content["suggestion"].is_string(), "{args}");
    }
    assert_eq!(renderer.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn scale_and_width_are_range_checked_for_svg_too() {
    let renderer = Scripted::new(vec![svg()]);
    let (_dir, _store, registry) = registry(renderer, RequestDefaults::default(), None).await;

    let out = registry
        .get("generate_diagram")
        .unwrap()
        .invoke(json!({ "description": "graph TD; A-->B", "format": "svg", "width": 5000 }))
        .await
        .unwrap();
    assert!(out.is_error);
    assert!(out.content["error"].as_str().unwrap().contains("width"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_identical_requests_get_distinct_artifacts() {
    let renderer = Scripted::slow(vec![svg(), svg()], Duration::from_millis(200));
    let (dir, store, registry) = registry(renderer.clone(), RequestDefaults::default(), None).await;
    let tool = registry.get("generate_diagram").unwrap();
    let args = json!({ "description": "graph TD; A-->B", "format": "svg" });

    let (first, second) = tokio::join!(tool.invoke(args.clone()), tool.invoke(args.clone()));
    let (first, second) = (first.unwrap(), second.unwrap());
    assert!(!first.is_error && !second.is_error);
    assert_eq!(renderer.calls.load(Ordering::SeqCst), 2);

    let first_name = first.content["file_name"].as_str().unwrap();
    let second_name = second.content["file_name"].as_str().unwrap();
    assert_ne!(first_name, second_name);
    assert_eq!(store.len(), 2);

    let on_disk: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|entry| entry.unwrap().file_name().into_string().unwrap())
        .collect();
    assert_eq!(on_disk.len(), 2, "{on_disk:?}");
    assert!(on_disk.iter().any(|name| name == first_name));
    assert!(on_disk.iter().any(|name| name == second_name));
}
