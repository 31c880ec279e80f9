use crate::errors::ToolError;
use crate::services::credentials::CredentialResolver;
use crate::services::logger::Logger;
use crate::services::options::{OptionEntry, OptionLoader};
use crate::services::validation::Validation;
use crate::utils::tool_errors::unsupported_operation_error;
use serde_json::Value;
use std::sync::Arc;

pub const OPTION_ACTIONS: &[&str] = &["list_apis", "list_api_parameters", "list_targets", "check"];

/// Choice lists for pickers plus the credential probe.
#[derive(Clone)]
pub struct OptionsManager {
    logger: Logger,
    validation: Validation,
    credentials: CredentialResolver,
    loader: Arc<OptionLoader>,
}

impl OptionsManager {
    pub fn new(
        logger: Logger,
        validation: Validation,
        credentials: CredentialResolver,
        loader: Arc<OptionLoader>,
    ) -> Self {
        Self {
            logger: logger.child("options"),
            validation,
            credentials,
            loader,
        }
    }

    pub async fn handle_action(&self, args: Value) -> Result<Value, ToolError> {
        let action = args
            .get("action")
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string();
        if !OPTION_ACTIONS.contains(&action.as_str()) {
            return Err(unsupported_operation_error("options", &action, OPTION_ACTIONS));
        }
        let api_name = self
            .validation
            .ensure_optional_string(args.get("api_name"), "api_name", true)?;
        let credentials = self.credentials.resolve(&[args.get("credentials")])?;

        let options = match action.as_str() {
            "list_apis" => self.loader.list_apis(&credentials).await?,
            "list_api_parameters" => {
                self.loader
                    .list_api_parameters(&credentials, api_name.as_deref())
                    .await?
            }
            "list_targets" => self.loader.list_targets(&credentials).await?,
            _ => return Ok(self.loader.check(&credentials).await),
        };
        Ok(options_payload(options))
    }
}

fn options_payload(options: Vec<OptionEntry>) -> Value {
    serde_json::json!({"count": options.len(), "options": options})
}

#[async_trait::async_trait]
impl crate::services::tool_executor::ToolHandler for OptionsManager {
    async fn handle(&self, args: Value) -> Result<Value, ToolError> {
        self.logger.debug("handle_action", args.get("action"));
        self.handle_action(args).await
    }
}
