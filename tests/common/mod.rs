//! In-process stand-in for the parts of the Gemini REST API the tool calls.

#![allow(dead_code)]

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json, Router,
};
use serde_json::{json, Value};
use std::{
    net::SocketAddr,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
};
use tokio::net::TcpListener;

pub const FILE_NAME: &str = "files/demo";

#[derive(Debug, Clone)]
pub struct StubConfig {
    /// Status checks that still report PROCESSING; 0 makes the upload itself ACTIVE.
    pub checks_until_active: usize,
    /// Reported forever instead of PROCESSING when set, e.g. "FAILED".
    pub stuck_state: Option<&'static str>,
    /// Text of the generated answer.
    pub reply: String,
}

impl Default for StubConfig {
    fn default() -> Self {
        Self {
            checks_until_active: 1,
            stuck_state: None,
            reply: "OK".to_string(),
        }
    }
}

#[derive(Debug)]
pub struct Recorded {
    config: StubConfig,
    addr: SocketAddr,
    pub upload_starts: AtomicUsize,
    pub uploads: AtomicUsize,
    pub status_checks: AtomicUsize,
    pub generations: AtomicUsize,
    pub api_keys: Mutex<Vec<String>>,
    pub upload_content_type: Mutex<Option<String>>,
    pub upload_body: Mutex<Vec<u8>>,
    pub generate_path: Mutex<Option<String>>,
    pub generate_body: Mutex<Option<Value>>,
}

impl Recorded {
    pub fn count(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }

    pub fn total_requests(&self) -> usize {
        Self::count(&self.upload_starts)
            + Self::count(&self.uploads)
            + Self::count(&self.status_checks)
            + Self::count(&self.generations)
    }

    fn file_json(&self, state: &str) -> Value {
        json!({
            "name": FILE_NAME,
            "displayName": "demo.mp4",
            "mimeType": self.upload_content_type.lock().unwrap().clone().unwrap_or_default(),
            "sizeBytes": self.upload_body.lock().unwrap().len().to_string(),
            "createTime": "2025-06-01T12:00:00.000000Z",
            "updateTime": "2025-06-01T12:00:00.000000Z",
            "expirationTime": "2025-06-03T12:00:00.000000Z",
            "uri": format!("http://{}/v1beta/{FILE_NAME}", self.addr),
            "state": state,
        })
    }
}

pub struct Stub {
    pub base_url: String,
    pub recorded: Arc<Recorded>,
}

impl Stub {
    pub async fn start(config: StubConfig) -> Stub {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let recorded = Arc::new(Recorded {
            config,
            addr,
            upload_starts: AtomicUsize::new(0),
            uploads: AtomicUsize::new(0),
            status_checks: AtomicUsize::new(0),
            generations: AtomicUsize::new(0),
            api_keys: Mutex::new(Vec::new()),
            upload_content_type: Mutex::new(None),
            upload_body: Mutex::new(Vec::new()),
            generate_path: Mutex::new(None),
            generate_body: Mutex::new(None),
        });

        let app = Router::new().fallback(handle).with_state(recorded.clone());
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Stub {
            base_url: format!("http://{addr}/v1beta/"),
            recorded,
        }
    }

    /// Start the stub on its own runtime, for tests that block on a child process.
    pub fn start_blocking(config: StubConfig) -> (tokio::runtime::Runtime, Stub) {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .build()
            .unwrap();
        let stub = runtime.block_on(Stub::start(config));
        (runtime, stub)
    }
}

fn header(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

async fn handle(
    State(recorded): State<Arc<Recorded>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if let Some(key) = header(&headers, "x-goog-api-key") {
        recorded.api_keys.lock().unwrap().push(key);
    }

    let path = uri.path().to_string();
    match (method, path.as_str()) {
        (Method::POST, "/upload/v1beta/files") => {
            if header(&headers, "x-goog-upload-command").as_deref() != Some("start") {
                return StatusCode::BAD_REQUEST.into_response();
            }
            recorded.upload_starts.fetch_add(1, Ordering::SeqCst);
            *recorded.upload_content_type.lock().unwrap() =
                header(&headers, "x-goog-upload-header-content-type");
            let session = format!("http://{}/upload-session/1", recorded.addr);
            ([("x-goog-upload-url", session)], Json(json!({}))).into_response()
        }
        (Method::POST, "/upload-session/1") => {
            if header(&headers, "x-goog-upload-command").as_deref() != Some("upload, finalize") {
                return StatusCode::BAD_REQUEST.into_response();
            }
            recorded.uploads.fetch_add(1, Ordering::SeqCst);
            *recorded.upload_body.lock().unwrap() = body.to_vec();
            let state = if recorded.config.checks_until_active == 0 {
                "ACTIVE"
            } else {
                "PROCESSING"
            };
            Json(json!({ "file": recorded.file_json(state) })).into_response()
        }
        (Method::GET, "/v1beta/files/demo") => {
            let n = recorded.status_checks.fetch_add(1, Ordering::SeqCst) + 1;
            let state = match recorded.config.stuck_state {
                Some(state) => state,
                None if n >= recorded.config.checks_until_active => "ACTIVE",
                None => "PROCESSING",
            };
            let mut file = recorded.file_json(state);
            if state == "FAILED" {
                file["error"] = json!({ "code": 3, "message": "unsupported codec" });
            }
            Json(file).into_response()
        }
        (Method::POST, p) if p.ends_with(":generateContent") => {
            recorded.generations.fetch_add(1, Ordering::SeqCst);
            *recorded.generate_path.lock().unwrap() = Some(p.to_string());
            *recorded.generate_body.lock().unwrap() = serde_json::from_slice(&body).ok();
            Json(json!({
                "candidates": [{
                    "content": {
                        "parts": [{ "text": recorded.config.reply }],
                        "role": "model"
                    },
                    "finishReason": "STOP",
                    "index": 0
                }],
                "usageMetadata": {
                    "promptTokenCount": 1200,
                    "candidatesTokenCount": 1,
                    "totalTokenCount": 1201
                },
                "modelVersion": "gemini-3-flash-preview"
            }))
            .into_response()
        }
        _ => StatusCode::NOT_FOUND.into_response(),
    }
}
