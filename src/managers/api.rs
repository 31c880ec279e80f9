use crate::errors::ToolError;
use crate::services::credentials::CredentialResolver;
use crate::services::logger::Logger;
use crate::services::request_builder::{parse_method, GenericRequest, RequestBuilder, ResponseFormat};
use crate::services::validation::Validation;
use crate::utils::tool_errors::unsupported_operation_error;
use serde_json::Value;
use std::sync::Arc;

pub const API_ACTIONS: &[&str] = &["request"];

/// Generic authenticated calls against the tenant API.
#[derive(Clone)]
pub struct ApiManager {
    logger: Logger,
    validation: Validation,
    credentials: CredentialResolver,
    builder: Arc<RequestBuilder>,
}

impl ApiManager {
    pub fn new(
        logger: Logger,
        validation: Validation,
        credentials: CredentialResolver,
        builder: Arc<RequestBuilder>,
    ) -> Self {
        Self {
            logger: logger.child("api"),
            validation,
            credentials,
            builder,
        }
    }

    pub async fn handle_action(&self, args: Value) -> Result<Value, ToolError> {
        let action = args
            .get("action")
            .and_then(|v| v.as_str())
            .unwrap_or("request")
            .to_string();
        match action.as_str() {
            "request" => self.request(&args).await,
            other => Err(unsupported_operation_error("generic", other, API_ACTIONS)),
        }
    }

    fn generic_request(&self, args: &Value) -> Result<GenericRequest, ToolError> {
        let method = parse_method(args.get("method").and_then(|v| v.as_str()))?;
        let url = self
            .validation
            .ensure_optional_string(args.get("url"), "url", true)?
            .unwrap_or_else(|| "/".to_string());
        let response_format =
            ResponseFormat::parse(args.get("response_format").and_then(|v| v.as_str()))?;
        let simplify = self
            .validation
            .ensure_optional_bool(args.get("simplify"), "simplify")?
            .unwrap_or(false);

        let mut request = GenericRequest::new(method, url);
        request.query = self.validation.ensure_string_pairs(args.get("query"), "query")?;
        request.headers = self
            .validation
            .ensure_string_pairs(args.get("headers"), "headers")?;
        request.body = args.get("body_json").or_else(|| args.get("body")).cloned();
        request.response_format = response_format;
        request.simplify = simplify && response_format == ResponseFormat::Json;
        Ok(request)
    }

    async fn request(&self, args: &Value) -> Result<Value, ToolError> {
        let request = self.generic_request(args)?;
        let credentials = self.credentials.resolve(&[args.get("credentials")])?;
        let response = self.builder.execute(&credentials, &request).await?;
        Ok(response.to_value())
    }
}

#[async_trait::async_trait]
impl crate::services::tool_executor::ToolHandler for ApiManager {
    async fn handle(&self, args: Value) -> Result<Value, ToolError> {
        self.logger.debug("handle_action", args.get("action"));
        self.handle_action(args).await
    }
}
