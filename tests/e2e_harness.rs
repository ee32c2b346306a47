#![allow(dead_code)]

use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router, extract::State, routing::post};
use serde_json::{Value, json};
use std::net::TcpListener;
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::oneshot;

pub type TestResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// How the mock inference endpoint answers every request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockMode {
    Generate,
    WarmingUp,
}

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub authorization: Option<String>,
    pub body: Value,
}

#[derive(Clone)]
struct MockServerState {
    mode: MockMode,
    hits: Arc<AtomicU32>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

pub struct MockInferenceServer {
    pub port: u16,
    hits: Arc<AtomicU32>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    handle: Option<tokio::task::JoinHandle<()>>,
}

async fn mock_inference(
    State(state): State<MockServerState>,
    headers: HeaderMap,
    Json(payload): Json<Value>,
) -> Response {
    let n = state.hits.fetch_add(1, Ordering::SeqCst) + 1;
    state
        .requests
        .lock()
        .unwrap_or_else(|e| e.into_inner())
        .push(RecordedRequest {
            authorization: headers
                .get("authorization")
                .and_then(|v| v.to_str().ok())
                .map(str::to_string),
            body: payload.clone(),
        });

    match state.mode {
        MockMode::WarmingUp => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "error": "Model is currently loading", "estimated_time": 20.0 })),
        )
            .into_response(),
        MockMode::Generate => {
            let prompt = payload
                .get("inputs")
                .and_then(Value::as_str)
                .unwrap_or_default();
            let text = format!("  Mock article #{} written for: {}  ", n, prompt.len());
            Json(json!([{ "generated_text": text }])).into_response()
        }
    }
}

impl MockInferenceServer {
    pub async fn start(mode: MockMode) -> TestResult<Self> {
        let port = find_free_port()?;
        let hits = Arc::new(AtomicU32::new(0));
        let requests = Arc::new(Mutex::new(Vec::new()));
        let state = MockServerState {
            mode,
            hits: Arc::clone(&hits),
            requests: Arc::clone(&requests),
        };
        let app = Router::new()
            .route("/models/{*model}", post(mock_inference))
            .with_state(state);

        let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port)).await?;
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let handle = tokio::spawn(async move {
            let _ = axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await;
        });

        Ok(Self {
            port,
            hits,
            requests,
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        })
    }

    pub fn model_url(&self) -> String {
        format!("http://127.0.0.1:{}/models/mock/gpt2", self.port)
    }

    pub fn hits(&self) -> u32 {
        self.hits.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

/// A throwaway data dir plus helpers for driving the `autoblog` binary against it.
pub struct CliHarness {
    data_dir: tempfile::TempDir,
    env: Vec<(String, String)>,
}

impl CliHarness {
    pub fn new() -> TestResult<Self> {
        Ok(Self {
            data_dir: tempfile::Builder::new().prefix("autoblog-e2e").tempdir()?,
            env: Vec::new(),
        })
    }

    pub fn data_dir(&self) -> &Path {
        self.data_dir.path()
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_dir().join("articles.db")
    }

    pub fn with_env(mut self, key: &str, value: &str) -> Self {
        self.env.push((key.to_string(), value.to_string()));
        self
    }

    pub fn write_config(&self, toml: &str) -> TestResult<()> {
        std::fs::write(self.data_dir().join("config.toml"), toml)?;
        Ok(())
    }

    fn command(&self, args: &[&str]) -> TestResult<tokio::process::Command> {
        let mut cmd = tokio::process::Command::new(autoblog_binary_path()?);
        cmd.args(args)
            .env("AUTOBLOG_DATA_DIR", self.data_dir())
            .env_remove("HUGGINGFACE_API_KEY")
            .env_remove("AUTOBLOG_MODEL_URL")
            .env_remove("AUTOBLOG_SCHEDULE")
            .env_remove("AUTOBLOG_MIN_ARTICLES")
            .env_remove("AUTOBLOG_LOG_LEVEL")
            .stdin(Stdio::null())
            .kill_on_drop(true);
        for (k, v) in &self.env {
            cmd.env(k, v);
        }
        Ok(cmd)
    }

    pub async fn run(&self, args: &[&str]) -> TestResult<Output> {
        let output = tokio::time::timeout(Duration::from_secs(60), self.command(args)?.output())
            .await
            .map_err(|_| format!("autoblog {:?} timed out", args))??;
        Ok(output)
    }

    pub fn spawn(&self, args: &[&str]) -> TestResult<tokio::process::Child> {
        let child = self
            .command(args)?
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;
        Ok(child)
    }

    /// `(author, created_at)` for every stored article, oldest first.
    pub fn articles(&self) -> TestResult<Vec<(String, String)>> {
        let path = self.database_path();
        if !path.exists() {
            return Ok(Vec::new());
        }
        let db = rusqlite::Connection::open(path)?;
        let mut stmt =
            db.prepare("SELECT author, created_at FROM articles ORDER BY created_at ASC")?;
        let rows = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<rusqlite::Result<Vec<(String, String)>>>()?;
        Ok(rows)
    }

    /// Mark the article job as running in some other process.
    pub fn hold_run_lock(&self, owner: &str) -> TestResult<()> {
        let db = rusqlite::Connection::open(self.database_path())?;
        let now = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true);
        db.execute(
            "UPDATE job_lock SET owner = ?1, claimed_at = ?2 WHERE name = 'article_job'",
            rusqlite::params![owner, now],
        )?;
        Ok(())
    }
}

pub fn stdout_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

pub fn stderr_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

pub fn find_free_port() -> TestResult<u16> {
    let listener = TcpListener::bind("127.0.0.1:0")?;
    let port = listener.local_addr()?.port();
    drop(listener);
    Ok(port)
}

fn autoblog_binary_path() -> TestResult<PathBuf> {
    if let Some(path) = option_env!("CARGO_BIN_EXE_autoblog") {
        return Ok(PathBuf::from(path));
    }

    let candidate = PathBuf::from("target")
        .join("debug")
        .join(if cfg!(windows) { "autoblog.exe" } else { "autoblog" });
    if candidate.exists() {
        return Ok(candidate);
    }

    Err("Could not locate autoblog test binary path".into())
}
