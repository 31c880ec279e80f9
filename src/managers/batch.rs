use crate::errors::ToolError;
use crate::services::logger::Logger;
use crate::services::tool_executor::ToolHandler;
use crate::services::validation::Validation;
use crate::utils::merge::merge_shallow;
use crate::utils::tool_errors::{unsupported_operation_error, unsupported_resource_error};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;

pub const BATCH_RESOURCES: &[&str] = &["job", "generic"];

/// Result of one batch item. Failures only surface here when the batch runs
/// with `continue_on_fail`.
#[derive(Debug, Clone, PartialEq)]
pub enum ItemOutcome {
    Completed(Value),
    Failed { message: String },
}

impl ItemOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, ItemOutcome::Failed { .. })
    }

    pub fn to_value(&self) -> Value {
        match self {
            ItemOutcome::Completed(value) => value.clone(),
            ItemOutcome::Failed { message } => serde_json::json!({"error": message}),
        }
    }
}

fn default_operation(resource: &str) -> &'static str {
    match resource {
        "generic" => "request",
        _ => "run",
    }
}

fn known_operations(resource: &str) -> &'static [&'static str] {
    match resource {
        "generic" => crate::managers::api::API_ACTIONS,
        _ => crate::managers::jobs::JOB_ACTIONS,
    }
}

#[derive(Clone)]
pub struct BatchManager {
    logger: Logger,
    validation: Validation,
    handlers: HashMap<&'static str, Arc<dyn ToolHandler>>,
}

impl BatchManager {
    pub fn new(
        logger: Logger,
        validation: Validation,
        job: Arc<dyn ToolHandler>,
        generic: Arc<dyn ToolHandler>,
    ) -> Self {
        let mut handlers: HashMap<&'static str, Arc<dyn ToolHandler>> = HashMap::new();
        handlers.insert("job", job);
        handlers.insert("generic", generic);
        Self {
            logger: logger.child("batch"),
            validation,
            handlers,
        }
    }

    pub async fn handle_action(&self, args: Value) -> Result<Value, ToolError> {
        let items = match args.get("items") {
            Some(Value::Array(items)) => items.clone(),
            None | Some(Value::Null) => Vec::new(),
            Some(_) => return Err(ToolError::invalid_params("items must be an array")),
        };
        let continue_on_fail = self
            .validation
            .ensure_optional_bool(args.get("continue_on_fail"), "continue_on_fail")?
            .unwrap_or(false);
        let shared_credentials = match args.get("credentials") {
            None | Some(Value::Null) => Map::new(),
            Some(Value::Object(map)) => map.clone(),
            Some(_) => return Err(ToolError::invalid_params("credentials must be an object")),
        };

        let mut outcomes = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            let outcome = match self.run_item(item, &shared_credentials).await {
                Ok(value) => ItemOutcome::Completed(value),
                Err(err) if continue_on_fail => {
                    self.logger.warn(
                        "batch item failed",
                        Some(&serde_json::json!({
                            "item_index": index,
                            "code": err.code,
                            "message": err.message,
                        })),
                    );
                    ItemOutcome::Failed {
                        message: err.message,
                    }
                }
                Err(err) => return Err(err.with_item_index(index)),
            };
            outcomes.push(outcome);
        }

        let failed = outcomes.iter().filter(|o| o.is_failure()).count();
        self.logger.info(
            "batch finished",
            Some(&serde_json::json!({"items": outcomes.len(), "failed": failed})),
        );
        Ok(serde_json::json!({
            "success": failed == 0,
            "results": outcomes.iter().map(ItemOutcome::to_value).collect::<Vec<_>>(),
            "failed": failed,
        }))
    }

    async fn run_item(
        &self,
        item: &Value,
        shared_credentials: &Map<String, Value>,
    ) -> Result<Value, ToolError> {
        let mut fields = item
            .as_object()
            .cloned()
            .ok_or_else(|| ToolError::invalid_params("batch items must be objects"))?;

        let resource = self
            .validation
            .ensure_optional_string(fields.get("resource"), "resource", true)?
            .unwrap_or_else(|| "job".to_string());
        let handler = self
            .handlers
            .get(resource.as_str())
            .cloned()
            .ok_or_else(|| unsupported_resource_error(&resource, BATCH_RESOURCES))?;

        let operation = self
            .validation
            .ensure_optional_string(fields.get("operation"), "operation", true)?
            .unwrap_or_else(|| default_operation(&resource).to_string());
        let known = known_operations(&resource);
        if !known.contains(&operation.as_str()) {
            return Err(unsupported_operation_error(&resource, &operation, known));
        }

        let mut credentials = shared_credentials.clone();
        if let Some(Value::Object(own)) = fields.remove("credentials") {
            merge_shallow(&mut credentials, own);
        }
        fields.remove("resource");
        fields.remove("operation");
        fields.insert("action".to_string(), Value::String(operation));
        if !credentials.is_empty() {
            fields.insert("credentials".to_string(), Value::Object(credentials));
        }

        handler.handle(Value::Object(fields)).await
    }
}

#[async_trait::async_trait]
impl ToolHandler for BatchManager {
    async fn handle(&self, args: Value) -> Result<Value, ToolError> {
        self.handle_action(args).await
    }
}
