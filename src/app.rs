use crate::errors::ToolError;
use crate::managers;
use crate::mcp::catalog::tool_catalog;
use crate::services::api_client::LegacyUseClient;
use crate::services::credentials::CredentialResolver;
use crate::services::job::JobEngine;
use crate::services::logger::Logger;
use crate::services::options::OptionLoader;
use crate::services::request_builder::RequestBuilder;
use crate::services::tool_executor::{ToolExecutor, ToolHandler};
use crate::services::transport::{ApiTransport, ReqwestTransport};
use crate::services::validation::Validation;
use std::collections::HashMap;
use std::sync::Arc;

pub const TOOL_JOB: &str = "legacy_use_job";
pub const TOOL_API: &str = "legacy_use_api";
pub const TOOL_OPTIONS: &str = "legacy_use_options";
pub const TOOL_BATCH: &str = "legacy_use_batch";

pub struct App {
    pub logger: Logger,
    pub tool_executor: Arc<ToolExecutor>,
}

impl App {
    fn validate_tool_wiring(
        handlers: &HashMap<String, Arc<dyn ToolHandler>>,
    ) -> Result<(), ToolError> {
        let mut missing: Vec<String> = tool_catalog()
            .iter()
            .filter(|tool| !handlers.contains_key(&tool.name))
            .map(|tool| tool.name.clone())
            .collect();
        if missing.is_empty() {
            return Ok(());
        }
        missing.sort();
        Err(ToolError::internal("Tool wiring is incomplete")
            .with_hint("Every tool in tool_catalog.json needs a registered handler.")
            .with_details(serde_json::json!({ "missing_tools": missing })))
    }

    pub fn initialize() -> Result<Self, ToolError> {
        let transport: Arc<dyn ApiTransport> = Arc::new(ReqwestTransport::new()?);
        Self::with_transport(transport)
    }

    /// Wires every manager over the given transport. Tests pass a scripted
    /// transport here.
    pub fn with_transport(transport: Arc<dyn ApiTransport>) -> Result<Self, ToolError> {
        let logger = Logger::new("legacy-use");
        let validation = Validation::new();
        let credentials = CredentialResolver::new();

        let client = LegacyUseClient::new(logger.clone(), transport);
        let engine = Arc::new(JobEngine::new(logger.clone(), client.clone()));
        let builder = Arc::new(RequestBuilder::new(logger.clone(), client.clone()));
        let loader = Arc::new(OptionLoader::new(logger.clone(), client));

        let job_manager: Arc<dyn ToolHandler> = Arc::new(managers::jobs::JobManager::new(
            logger.clone(),
            validation.clone(),
            credentials.clone(),
            engine,
        ));
        let api_manager: Arc<dyn ToolHandler> = Arc::new(managers::api::ApiManager::new(
            logger.clone(),
            validation.clone(),
            credentials.clone(),
            builder,
        ));
        let options_manager: Arc<dyn ToolHandler> =
            Arc::new(managers::options::OptionsManager::new(
                logger.clone(),
                validation.clone(),
                credentials,
                loader,
            ));
        let batch_manager: Arc<dyn ToolHandler> = Arc::new(managers::batch::BatchManager::new(
            logger.clone(),
            validation,
            job_manager.clone(),
            api_manager.clone(),
        ));

        let mut handlers: HashMap<String, Arc<dyn ToolHandler>> = HashMap::new();
        handlers.insert(TOOL_JOB.to_string(), job_manager);
        handlers.insert(TOOL_API.to_string(), api_manager);
        handlers.insert(TOOL_OPTIONS.to_string(), options_manager);
        handlers.insert(TOOL_BATCH.to_string(), batch_manager);
        Self::validate_tool_wiring(&handlers)?;

        let tool_executor = Arc::new(ToolExecutor::new(logger.clone(), handlers));
        Ok(Self {
            logger,
            tool_executor,
        })
    }
}
