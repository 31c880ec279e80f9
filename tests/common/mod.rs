#![allow(dead_code)]

use async_trait::async_trait;
use legacy_use::app::App;
use legacy_use::errors::ToolError;
use legacy_use::services::transport::{ApiTransport, HttpRequest, HttpResponse};
use once_cell::sync::Lazy;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex as StdMutex};
use tokio::sync::Mutex;

pub static ENV_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

pub const ENV_KEYS: &[&str] = &[
    "LEGACY_USE_SUBDOMAIN",
    "LEGACY_USE_API_KEY",
    "LEGACY_USE_BASE_URL",
    "LEGACY_USE_DISTINCT_ID",
    "LEGACY_USE_POLL_DELAY_MS",
    "LEGACY_USE_POLL_LIMIT",
];

/// Clears the client's env vars for the lifetime of the guard and restores
/// them afterwards. Hold `ENV_LOCK` while it is alive.
pub struct EnvSnapshot {
    saved: Vec<(&'static str, Option<String>)>,
}

impl EnvSnapshot {
    pub fn cleared() -> Self {
        let saved = ENV_KEYS
            .iter()
            .map(|key| (*key, std::env::var(key).ok()))
            .collect();
        for key in ENV_KEYS {
            std::env::remove_var(key);
        }
        Self { saved }
    }
}

impl Drop for EnvSnapshot {
    fn drop(&mut self) {
        for (key, value) in &self.saved {
            match value {
                Some(value) => std::env::set_var(key, value),
                None => std::env::remove_var(key),
            }
        }
    }
}

/// In-memory transport: records every request and replays canned responses
/// in order. Once the script runs out, `repeat` (if any) answers forever.
#[derive(Default)]
pub struct ScriptedTransport {
    script: StdMutex<VecDeque<HttpResponse>>,
    repeat: StdMutex<Option<HttpResponse>>,
    requests: StdMutex<Vec<HttpRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push_json(&self, status: u16, body: Value) -> &Self {
        self.push_raw(status, &body.to_string())
    }

    pub fn push_raw(&self, status: u16, body: &str) -> &Self {
        self.script.lock().unwrap().push_back(response(status, body));
        self
    }

    pub fn repeat_json(&self, status: u16, body: Value) {
        *self.repeat.lock().unwrap() = Some(response(status, &body.to_string()));
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

fn response(status: u16, body: &str) -> HttpResponse {
    let mut headers = serde_json::Map::new();
    headers.insert("content-type".to_string(), json!("application/json"));
    HttpResponse {
        status,
        headers,
        body: body.to_string(),
    }
}

#[async_trait]
impl ApiTransport for ScriptedTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ToolError> {
        self.requests.lock().unwrap().push(request);
        if let Some(next) = self.script.lock().unwrap().pop_front() {
            return Ok(next);
        }
        self.repeat
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| ToolError::transport("script exhausted"))
    }
}

pub fn app_with(transport: Arc<ScriptedTransport>) -> App {
    App::with_transport(transport).expect("app wiring")
}

pub fn credentials() -> Value {
    json!({"subdomain": "acme", "api_key": "secret-key"})
}

pub const BASE: &str = "https://acme.legacy-use.com/api";

pub fn definition(params: Value) -> Value {
    json!({"name": "get_weather", "parameters": params})
}
