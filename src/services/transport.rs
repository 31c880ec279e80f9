use crate::config;
use crate::constants::network;
use crate::errors::ToolError;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl HttpRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            query: Vec::new(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn post_json(url: impl Into<String>, body: Value) -> Self {
        let mut req = Self::new(Method::POST, url);
        req.body = Some(body);
        req
    }

    /// Sets a header, replacing any existing value case-insensitively.
    pub fn set_header(&mut self, name: &str, value: impl Into<String>) {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self.headers.push((name.to_string(), value.into()));
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .rev()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: serde_json::Map<String, Value>,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("HTTP request timed out")]
    Timeout,
    #[error("Invalid header name: {0}")]
    InvalidHeaderName(String),
    #[error("Invalid value for header {0}")]
    InvalidHeaderValue(String),
    #[error("HTTP request failed: {0}")]
    Reqwest(#[from] reqwest::Error),
}

impl From<TransportError> for ToolError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Timeout => ToolError::timeout(err.to_string()),
            TransportError::InvalidHeaderName(_) | TransportError::InvalidHeaderValue(_) => {
                ToolError::invalid_params(err.to_string())
            }
            TransportError::Reqwest(_) => ToolError::transport(err.to_string()),
        }
    }
}

fn classify(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        return TransportError::Timeout;
    }
    TransportError::Reqwest(err)
}

/// The one seam between this crate and the network. Everything above it
/// works on plain request/response values, which is what the tests fake.
#[async_trait]
pub trait ApiTransport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ToolError>;
}

#[derive(Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self, ToolError> {
        Self::with_timeout(Duration::from_millis(config::http_timeout_ms()))
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, ToolError> {
        let client = Client::builder()
            .user_agent(network::USER_AGENT)
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .map_err(|err| ToolError::internal(format!("Failed to build HTTP client: {}", err)))?;
        Ok(Self { client })
    }

    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let mut req = self
            .client
            .request(request.method.clone(), request.url.as_str())
            .headers(headers_to_headermap(&request.headers)?);
        if !request.query.is_empty() {
            req = req.query(&request.query);
        }
        if let Some(body) = request.body.as_ref() {
            req = req.json(body);
        }

        let response = req.send().await.map_err(classify)?;
        let status = response.status().as_u16();
        let headers = headers_to_value(response.headers());
        let body = response.text().await.map_err(classify)?;
        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

#[async_trait]
impl ApiTransport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ToolError> {
        Ok(self.execute(request).await?)
    }
}

fn headers_to_headermap(headers: &[(String, String)]) -> Result<HeaderMap, TransportError> {
    let mut map = HeaderMap::new();
    for (key, value) in headers {
        let name = HeaderName::from_bytes(key.as_bytes())
            .map_err(|_| TransportError::InvalidHeaderName(key.clone()))?;
        let val = HeaderValue::from_str(value)
            .map_err(|_| TransportError::InvalidHeaderValue(key.clone()))?;
        map.insert(name, val);
    }
    Ok(map)
}

/// A header sent once maps to a string; repeated headers such as
/// `set-cookie` map to an array of every value in arrival order.
fn headers_to_value(headers: &HeaderMap) -> serde_json::Map<String, Value> {
    let mut map = serde_json::Map::new();
    for key in headers.keys() {
        let mut values: Vec<Value> = headers
            .get_all(key)
            .iter()
            .map(|value| Value::String(String::from_utf8_lossy(value.as_bytes()).into_owned()))
            .collect();
        let rendered = if values.len() == 1 {
            values.remove(0)
        } else {
            Value::Array(values)
        };
        map.insert(key.as_str().to_string(), rendered);
    }
    map
}
