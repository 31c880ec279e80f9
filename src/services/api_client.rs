use crate::config;
use crate::constants::{limits, network};
use crate::errors::ToolError;
use crate::models::ApiDefinition;
use crate::services::credentials::Credentials;
use crate::services::logger::Logger;
use crate::services::transport::{ApiTransport, HttpRequest, HttpResponse};
use crate::utils::text::truncate_utf8_prefix;
use serde_json::Value;
use std::sync::Arc;
use url::Url;

/// Authenticated access to a tenant's API. Injects the key header on every
/// call and turns non-2xx responses into `remote` errors.
#[derive(Clone)]
pub struct LegacyUseClient {
    logger: Logger,
    transport: Arc<dyn ApiTransport>,
}

impl LegacyUseClient {
    pub fn new(logger: Logger, transport: Arc<dyn ApiTransport>) -> Self {
        Self {
            logger: logger.child("http"),
            transport,
        }
    }

    /// Joins percent-encoded path segments onto the tenant base URL. An empty
    /// last segment yields a trailing slash.
    pub fn endpoint(&self, credentials: &Credentials, segments: &[&str]) -> Result<String, ToolError> {
        let mut url = Url::parse(credentials.base_url())
            .map_err(|_| ToolError::invalid_params("Invalid base URL"))?;
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| ToolError::invalid_params("Base URL cannot carry a path"))?;
            path.pop_if_empty();
            path.extend(segments);
        }
        Ok(url.to_string())
    }

    pub async fn send(
        &self,
        credentials: &Credentials,
        mut request: HttpRequest,
    ) -> Result<HttpResponse, ToolError> {
        request.set_header(network::API_KEY_HEADER, credentials.api_key());
        if request.header(network::DISTINCT_ID_HEADER).is_none() {
            request.set_header(network::DISTINCT_ID_HEADER, config::distinct_id());
        }
        let method = request.method.clone();
        let url = request.url.clone();
        self.logger.debug(
            "request",
            Some(&serde_json::json!({"method": method.as_str(), "url": url})),
        );

        let response = self.transport.send(request).await?;
        if !response.is_success() {
            self.logger.warn(
                "remote returned error status",
                Some(&serde_json::json!({
                    "method": method.as_str(),
                    "url": url,
                    "status": response.status,
                })),
            );
            return Err(remote_status_error(method.as_str(), &url, &response));
        }
        Ok(response)
    }

    pub async fn get_json(
        &self,
        credentials: &Credentials,
        segments: &[&str],
    ) -> Result<Value, ToolError> {
        let url = self.endpoint(credentials, segments)?;
        let response = self.send(credentials, HttpRequest::get(url)).await?;
        Ok(parse_json_lenient(&response.body))
    }

    pub async fn post_json(
        &self,
        credentials: &Credentials,
        segments: &[&str],
        body: Value,
    ) -> Result<Value, ToolError> {
        let url = self.endpoint(credentials, segments)?;
        let response = self
            .send(credentials, HttpRequest::post_json(url, body))
            .await?;
        Ok(parse_json_lenient(&response.body))
    }
}

impl LegacyUseClient {
    /// `GET /api/definitions`
    pub async fn list_definitions(&self, credentials: &Credentials) -> Result<Value, ToolError> {
        self.get_json(credentials, &["api", "definitions"]).await
    }

    /// `GET /api/definitions/{name}`, always fetched live.
    pub async fn get_definition(
        &self,
        credentials: &Credentials,
        api_name: &str,
    ) -> Result<ApiDefinition, ToolError> {
        let response = self
            .get_json(credentials, &["api", "definitions", api_name])
            .await?;
        Ok(ApiDefinition::from_response(api_name, &response))
    }

    /// `GET /targets/`
    pub async fn list_targets(&self, credentials: &Credentials) -> Result<Value, ToolError> {
        self.get_json(credentials, &["targets", ""]).await
    }

    /// `POST /targets/{target_id}/jobs/`
    pub async fn create_job(
        &self,
        credentials: &Credentials,
        target_id: &str,
        api_name: &str,
        parameters: &serde_json::Map<String, Value>,
    ) -> Result<Value, ToolError> {
        self.post_json(
            credentials,
            &["targets", target_id, "jobs", ""],
            serde_json::json!({"api_name": api_name, "parameters": parameters}),
        )
        .await
    }

    /// `GET /targets/{target_id}/jobs/{job_id}`
    pub async fn get_job(
        &self,
        credentials: &Credentials,
        target_id: &str,
        job_id: &str,
    ) -> Result<Value, ToolError> {
        self.get_json(credentials, &["targets", target_id, "jobs", job_id])
            .await
    }
}

/// Parses a response body as JSON. An empty body is `null`; anything that
/// does not parse is returned as the original string.
pub fn parse_json_lenient(body: &str) -> Value {
    if body.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(body).unwrap_or_else(|_| Value::String(body.to_string()))
}

fn remote_status_error(method: &str, url: &str, response: &HttpResponse) -> ToolError {
    let preview = truncate_utf8_prefix(&response.body, limits::LOG_BODY_PREVIEW_BYTES);
    let detail = parse_json_lenient(&response.body)
        .get("detail")
        .and_then(|v| v.as_str())
        .map(|s| s.to_string());
    let message = match detail {
        Some(detail) => format!("{} {} failed with status {}: {}", method, url, response.status, detail),
        None => format!("{} {} failed with status {}", method, url, response.status),
    };
    ToolError::remote(response.status, message).with_details(serde_json::json!({
        "status": response.status,
        "url": url,
        "body": preview,
    }))
}
