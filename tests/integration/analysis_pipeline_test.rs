//! Analysis Pipeline Integration Tests
//!
//! An axum server stands in for Ollama so the whole path runs: prompt,
//! HTTP round trip, reply parsing, execution, merge, history and storage.

use std::sync::Arc;

use axum::routing::{get, post};
use axum::{extract::State, Json, Router};
use code_insight::models::analysis::{AnalyzeRequest, FileInput};
use code_insight::models::settings::AppConfig;
use code_insight::storage::{AnalysisStore, Database, MemoryAnalysisStore};
use code_insight::{analyze_files, check_advisory_health, get_analysis, get_file_history, AppState};
use code_insight_llm::{ProviderConfig, ProviderType};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

const REPLY: &str = "ERRORS:
- STYLE: Missing trailing newline [WARNING] (line 1)
SUGGESTIONS:
- REFACTOR: Quote the argument (line 1)
```sh
echo \"hi\"
```
METRICS:
COMPLEXITY: 2
MEMORY: 123456
TIME: 9.5
END";

async fn generate(State(reply): State<Arc<String>>, Json(body): Json<Value>) -> Json<Value> {
    assert_eq!(body["stream"], json!(false));
    assert_eq!(body["options"]["stop"], json!(["END"]));
    Json(json!({
        "model": "mock",
        "response": reply.as_str(),
        "done": true,
        "done_reason": "stop",
    }))
}

async fn tags() -> Json<Value> {
    Json(json!({ "models": [] }))
}

async fn spawn_mock_ollama(reply: &str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = Router::new()
        .route("/api/generate", post(generate))
        .route("/api/tags", get(tags))
        .with_state(Arc::new(reply.to_string()));
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("http://{}", addr)
}

/// A base URL nothing listens on
async fn closed_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

fn config(base_url: String) -> AppConfig {
    let mut config = AppConfig::default();
    config.advisory = ProviderConfig {
        provider: ProviderType::Ollama,
        base_url: Some(base_url),
        model: "mock".to_string(),
        timeout_secs: 10,
        ..Default::default()
    };
    config.execution.timeout_secs = 10;
    // Python sources are run by sh so the tests need no interpreter
    config
        .execution
        .executors
        .insert(code_insight_core::Language::Python, "sh".to_string());
    config
}

fn request() -> AnalyzeRequest {
    AnalyzeRequest {
        files: vec![
            FileInput::new("ok.py", "echo hi"),
            FileInput::new("boom.py", "echo 'ValueError: bad input' >&2; exit 1"),
        ],
    }
}

#[tokio::test]
async fn test_advisory_health() {
    let state = AppState::with_store(
        config(spawn_mock_ollama(REPLY).await),
        Arc::new(MemoryAnalysisStore::new()),
    )
    .unwrap();
    let health = check_advisory_health(&state).await.data.unwrap();
    assert!(health.healthy);
    assert_eq!(health.provider, "ollama");
    assert_eq!(health.model, "mock");

    let state = AppState::with_store(config(closed_url().await), Arc::new(MemoryAnalysisStore::new()))
        .unwrap();
    let health = check_advisory_health(&state).await.data.unwrap();
    assert!(!health.healthy);
    assert!(health.error.unwrap().contains("Cannot connect to Ollama"));
}

#[cfg(unix)]
#[tokio::test]
async fn test_batch_round_trip_through_sqlite() {
    let db = Arc::new(Database::new_in_memory().unwrap());
    let state = AppState::with_store(config(spawn_mock_ollama(REPLY).await), db.clone()).unwrap();

    let response = analyze_files(&state, request(), &CancellationToken::new()).await;
    assert!(response.success, "{:?}", response.error);
    let outcome = response.data.unwrap();
    let result = &outcome.result;

    // One advisory error per file, plus the runtime error from boom.py
    let kinds: Vec<(&str, &str)> = result
        .errors
        .iter()
        .map(|e| (e.file.as_str(), e.kind.as_str()))
        .collect();
    assert_eq!(
        kinds,
        vec![("ok.py", "style"), ("boom.py", "style"), ("boom.py", "RUNTIME")]
    );
    assert_eq!(result.errors[2].message, "ValueError: bad input\n");
    assert_eq!(result.errors[2].line, Some(0));

    // Complexity comes from the advisor; time and memory are measured
    assert_eq!(result.metrics.complexity, 4);
    assert!(result.metrics.execution_time < 19.0);
    assert_ne!(result.metrics.memory_usage, 2 * 123456);

    assert_eq!(result.output["ok.py"], "hi\n");
    assert_eq!(result.output["boom.py"], "ValueError: bad input\n");

    let stored = db.get(outcome.id).unwrap().unwrap();
    assert_eq!(stored.record.files.len(), 2);
    assert_eq!(stored.record.improved_code["ok.py"], "echo \"hi\"");
    assert_eq!(stored.record.analysis, *result);

    let fetched = get_analysis(&state, outcome.id).data.unwrap();
    assert_eq!(fetched, stored);

    let history = get_file_history(&state, "boom.py").data.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].errors.len(), 2);
}

#[cfg(unix)]
#[tokio::test]
async fn test_unreachable_advisor_still_executes() {
    let state = AppState::with_store(config(closed_url().await), Arc::new(MemoryAnalysisStore::new()))
        .unwrap();
    let request = AnalyzeRequest {
        files: vec![FileInput::new("ok.py", "echo hi")],
    };
    let outcome = analyze_files(&state, request, &CancellationToken::new())
        .await
        .data
        .unwrap();

    assert_eq!(outcome.result.errors.len(), 1);
    assert_eq!(outcome.result.errors[0].kind, "analysis_error");
    assert!(outcome.result.suggestions.is_empty());
    assert_eq!(outcome.result.output["ok.py"], "hi\n");
}

#[tokio::test]
async fn test_invalid_batch_is_not_persisted() {
    let db = Arc::new(Database::new_in_memory().unwrap());
    let state = AppState::with_store(config(closed_url().await), db.clone()).unwrap();
    let request = AnalyzeRequest {
        files: vec![FileInput::new("a.cob", "").with_language("cobol")],
    };
    let response = analyze_files(&state, request, &CancellationToken::new()).await;
    assert!(!response.success);
    assert!(db.list_recent(10).unwrap().is_empty());
}
