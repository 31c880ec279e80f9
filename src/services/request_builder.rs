use crate::constants::{limits, protocols};
use crate::errors::ToolError;
use crate::services::api_client::LegacyUseClient;
use crate::services::credentials::Credentials;
use crate::services::logger::Logger;
use crate::services::transport::HttpRequest;
use crate::utils::simplify::simplify_value;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Method;
use serde_json::Value;

static ABSOLUTE_URL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^https?://").expect("absolute url regex"));

pub const INVALID_BODY_MESSAGE: &str =
    r#"Body (JSON) must be valid JSON. For example: {"key":"value"}"#;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseFormat {
    #[default]
    Json,
    Text,
}

impl ResponseFormat {
    pub fn parse(raw: Option<&str>) -> Result<Self, ToolError> {
        match raw.map(|s| s.trim().to_lowercase()).as_deref() {
            None | Some("") | Some("json") => Ok(ResponseFormat::Json),
            Some("text") => Ok(ResponseFormat::Text),
            Some(other) => Err(ToolError::invalid_params(format!(
                "Unsupported response_format: {}",
                other
            ))
            .with_hint("Use one of: json, text.")),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenericRequest {
    pub method: Method,
    pub url: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    /// Raw body input: a JSON string, or an already structured value.
    pub body: Option<Value>,
    pub response_format: ResponseFormat,
    pub simplify: bool,
}

impl GenericRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            query: Vec::new(),
            headers: Vec::new(),
            body: None,
            response_format: ResponseFormat::Json,
            simplify: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenericResponse {
    pub body: Value,
    pub headers: serde_json::Map<String, Value>,
    pub status_code: u16,
}

impl GenericResponse {
    pub fn to_value(&self) -> Value {
        serde_json::json!({
            "body": self.body,
            "headers": self.headers,
            "statusCode": self.status_code,
        })
    }
}

pub fn parse_method(raw: Option<&str>) -> Result<Method, ToolError> {
    let normalized = raw
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "GET".to_string());
    if !protocols::SUPPORTED_METHODS.contains(&normalized.as_str()) {
        return Err(
            ToolError::invalid_params(format!("Unsupported HTTP method: {}", normalized))
                .with_hint(format!("Use one of: {}.", protocols::SUPPORTED_METHODS.join(", "))),
        );
    }
    Method::from_bytes(normalized.as_bytes())
        .map_err(|_| ToolError::invalid_params("Invalid HTTP method"))
}

/// Absolute `http(s)://` URLs are used verbatim; anything else is a path
/// under the tenant base, joined with exactly one slash.
pub fn resolve_url(base_url: &str, input: &str) -> String {
    if ABSOLUTE_URL_RE.is_match(input) {
        return input.to_string();
    }
    let base = base_url.trim_end_matches('/');
    if input.starts_with('/') {
        format!("{}{}", base, input)
    } else {
        format!("{}/{}", base, input)
    }
}

fn is_write_method(method: &Method) -> bool {
    protocols::WRITE_METHODS.contains(&method.as_str())
}

/// Only write methods carry a body. A blank body string means no body.
pub fn parse_body(method: &Method, body: Option<&Value>) -> Result<Option<Value>, ToolError> {
    if !is_write_method(method) {
        return Ok(None);
    }
    match body {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(text)) if text.trim().is_empty() => Ok(None),
        Some(Value::String(text)) => serde_json::from_str::<Value>(text)
            .map(Some)
            .map_err(|err| {
                ToolError::invalid_params(INVALID_BODY_MESSAGE)
                    .with_details(serde_json::json!({"parse_error": err.to_string()}))
            }),
        Some(other) => Ok(Some(other.clone())),
    }
}

pub fn normalize_body(raw: String, format: ResponseFormat, simplify: bool) -> Value {
    match format {
        ResponseFormat::Text => Value::String(raw),
        ResponseFormat::Json => {
            let parsed = serde_json::from_str::<Value>(&raw).unwrap_or(Value::String(raw));
            if simplify && (parsed.is_object() || parsed.is_array()) {
                simplify_value(&parsed, limits::SIMPLIFY_MAX_ENTRIES)
            } else {
                parsed
            }
        }
    }
}

#[derive(Clone)]
pub struct RequestBuilder {
    logger: Logger,
    client: LegacyUseClient,
}

impl RequestBuilder {
    pub fn new(logger: Logger, client: LegacyUseClient) -> Self {
        Self {
            logger: logger.child("request"),
            client,
        }
    }

    /// Validates and assembles the outgoing request. Never touches the
    /// network, so a bad body fails here before any call is made.
    pub fn build(
        &self,
        credentials: &Credentials,
        request: &GenericRequest,
    ) -> Result<HttpRequest, ToolError> {
        let body = parse_body(&request.method, request.body.as_ref())?;
        let mut out = HttpRequest::new(
            request.method.clone(),
            resolve_url(credentials.base_url(), &request.url),
        );
        for (key, value) in &request.query {
            if key.is_empty() {
                continue;
            }
            out.query.retain(|(k, _)| k != key);
            out.query.push((key.clone(), value.clone()));
        }
        for (key, value) in &request.headers {
            if key.is_empty() {
                continue;
            }
            out.set_header(key, value.clone());
        }
        out.body = body;
        Ok(out)
    }

    pub async fn execute(
        &self,
        credentials: &Credentials,
        request: &GenericRequest,
    ) -> Result<GenericResponse, ToolError> {
        let outgoing = self.build(credentials, request)?;
        self.logger.debug(
            "generic request",
            Some(&serde_json::json!({
                "method": outgoing.method.as_str(),
                "url": outgoing.url,
                "query_params": outgoing.query.len(),
                "has_body": outgoing.body.is_some(),
            })),
        );
        let response = self.client.send(credentials, outgoing).await?;
        Ok(GenericResponse {
            body: normalize_body(response.body, request.response_format, request.simplify),
            headers: response.headers,
            status_code: response.status,
        })
    }
}
