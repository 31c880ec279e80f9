use crate::errors::ToolError;
use crate::models::{parse_api_names, parse_targets, ApiParameter};
use crate::services::api_client::LegacyUseClient;
use crate::services::credentials::Credentials;
use crate::services::logger::Logger;
use crate::services::validation::render_scalar;
use serde::Serialize;
use serde_json::Value;

/// A display/value pair for a dynamic choice list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OptionEntry {
    pub name: String,
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl OptionEntry {
    fn plain(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            description: None,
        }
    }
}

#[derive(Clone)]
pub struct OptionLoader {
    logger: Logger,
    client: LegacyUseClient,
}

impl OptionLoader {
    pub fn new(logger: Logger, client: LegacyUseClient) -> Self {
        Self {
            logger: logger.child("options"),
            client,
        }
    }

    pub async fn list_apis(&self, credentials: &Credentials) -> Result<Vec<OptionEntry>, ToolError> {
        let response = self.client.list_definitions(credentials).await?;
        Ok(parse_api_names(&response)
            .into_iter()
            .map(|name| OptionEntry::plain(name.clone(), name))
            .collect())
    }

    /// Without an API name there is nothing to describe, so no remote call is
    /// made.
    pub async fn list_api_parameters(
        &self,
        credentials: &Credentials,
        api_name: Option<&str>,
    ) -> Result<Vec<OptionEntry>, ToolError> {
        let Some(api_name) = api_name.map(str::trim).filter(|s| !s.is_empty()) else {
            self.logger.debug("api_name not chosen yet, skipping lookup", None);
            return Ok(Vec::new());
        };
        let definition = self.client.get_definition(credentials, api_name).await?;
        Ok(definition.parameters.iter().map(parameter_entry).collect())
    }

    pub async fn list_targets(
        &self,
        credentials: &Credentials,
    ) -> Result<Vec<OptionEntry>, ToolError> {
        let response = self.client.list_targets(credentials).await?;
        Ok(parse_targets(&response)
            .into_iter()
            .map(|t| OptionEntry::plain(t.name, t.id))
            .collect())
    }

    /// Connectivity probe against the definitions listing. Failures are
    /// reported, not raised.
    pub async fn check(&self, credentials: &Credentials) -> Value {
        match self.client.list_definitions(credentials).await {
            Ok(response) => serde_json::json!({
                "success": true,
                "accessible": true,
                "base_url": credentials.base_url(),
                "subdomain": credentials.subdomain(),
                "api_count": parse_api_names(&response).len(),
            }),
            Err(err) => {
                self.logger.warn(
                    "credential check failed",
                    Some(&serde_json::json!({"base_url": credentials.base_url(), "error": err.message})),
                );
                serde_json::json!({
                    "success": false,
                    "accessible": false,
                    "base_url": credentials.base_url(),
                    "subdomain": credentials.subdomain(),
                    "error": err.message,
                })
            }
        }
    }
}

fn parameter_entry(parameter: &ApiParameter) -> OptionEntry {
    let default = parameter
        .default
        .as_ref()
        .map(render_scalar)
        .filter(|s| !s.is_empty());
    let description = parameter
        .description
        .as_deref()
        .filter(|s| !s.is_empty());
    let description = match (description, default) {
        (Some(d), Some(def)) => Some(format!("{} (default: {})", d, def)),
        (Some(d), None) => Some(d.to_string()),
        (None, Some(def)) => Some(format!("Default: {}", def)),
        (None, None) => None,
    };
    OptionEntry {
        name: parameter.name.clone(),
        value: parameter.name.clone(),
        description,
    }
}
