use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use crate::errors::ToolError;
use crate::services::logger::Logger;
use crate::utils::suggest::closest_matches;

use serde_json::Value;

/// One host-facing step. Handlers receive the raw call arguments and return
/// the output record.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn handle(&self, args: Value) -> Result<Value, ToolError>;
}

#[derive(Clone)]
pub struct ToolExecutor {
    logger: Logger,
    handlers: Arc<HashMap<String, Arc<dyn ToolHandler>>>,
}

impl ToolExecutor {
    pub fn new(logger: Logger, handlers: HashMap<String, Arc<dyn ToolHandler>>) -> Self {
        Self {
            logger: logger.child("executor"),
            handlers: Arc::new(handlers),
        }
    }

    pub fn tool_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.handlers.keys().cloned().collect();
        names.sort();
        names
    }

    pub async fn execute(&self, tool: &str, args: Value) -> Result<Value, ToolError> {
        let Some(handler) = self.handlers.get(tool).cloned() else {
            let names = self.tool_names();
            let known: Vec<&str> = names.iter().map(String::as_str).collect();
            let suggestions = closest_matches(tool, &known, 3);
            let mut err = ToolError::invalid_params(format!("Unknown tool: {}", tool));
            if !suggestions.is_empty() {
                err = err.with_hint(format!("Did you mean: {}?", suggestions.join(", ")));
            }
            return Err(err);
        };

        let trace_id = args
            .get("trace_id")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        let action = args.get("action").cloned().unwrap_or(Value::Null);
        let started = Instant::now();

        let result = handler.handle(args).await;
        let meta = serde_json::json!({
            "tool": tool,
            "action": action,
            "trace_id": trace_id,
            "duration_ms": started.elapsed().as_millis() as u64,
        });
        match &result {
            Ok(_) => self.logger.info("tool call finished", Some(&meta)),
            Err(err) => {
                let mut meta = meta;
                if let Value::Object(map) = &mut meta {
                    map.insert("error".to_string(), Value::String(err.message.clone()));
                    map.insert("code".to_string(), Value::String(err.code.clone()));
                }
                self.logger.warn("tool call failed", Some(&meta));
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Constant;

    #[async_trait]
    impl ToolHandler for Constant {
        async fn handle(&self, args: Value) -> Result<Value, ToolError> {
            Ok(serde_json::json!({"echo": args}))
        }
    }

    fn executor() -> ToolExecutor {
        let mut handlers: HashMap<String, Arc<dyn ToolHandler>> = HashMap::new();
        handlers.insert("legacy_use_job".to_string(), Arc::new(Constant));
        ToolExecutor::new(Logger::new("test"), handlers)
    }

    #[tokio::test]
    async fn dispatches_to_registered_handler() {
        let out = executor()
            .execute("legacy_use_job", serde_json::json!({"action": "run"}))
            .await
            .expect("dispatch");
        assert_eq!(out["echo"]["action"], "run");
    }

    #[tokio::test]
    async fn unknown_tool_suggests_close_names() {
        let err = executor()
            .execute("legacy_use_jobs", serde_json::json!({}))
            .await
            .expect_err("unknown");
        assert!(err.is_validation());
        assert_eq!(err.hint.as_deref(), Some("Did you mean: legacy_use_job?"));
    }
}
