use crate::errors::ToolError;
use crate::services::credentials::CredentialResolver;
use crate::services::job::{JobEngine, PollPolicy, StartRequest};
use crate::services::logger::Logger;
use crate::services::parameters::ParameterInput;
use crate::services::validation::Validation;
use crate::utils::tool_errors::unsupported_operation_error;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

pub const JOB_ACTIONS: &[&str] = &["run", "start", "wait", "get_params"];

#[derive(Clone)]
pub struct JobManager {
    logger: Logger,
    validation: Validation,
    credentials: CredentialResolver,
    engine: Arc<JobEngine>,
}

impl JobManager {
    pub fn new(
        logger: Logger,
        validation: Validation,
        credentials: CredentialResolver,
        engine: Arc<JobEngine>,
    ) -> Self {
        Self {
            logger: logger.child("job"),
            validation,
            credentials,
            engine,
        }
    }

    pub async fn handle_action(&self, args: Value) -> Result<Value, ToolError> {
        let action = args
            .get("action")
            .and_then(|v| v.as_str())
            .unwrap_or("run")
            .to_string();
        match action.as_str() {
            "run" => self.run(&args).await,
            "start" => self.start(&args).await,
            "wait" => self.wait(&args).await,
            "get_params" => self.get_params(&args).await,
            other => Err(unsupported_operation_error("job", other, JOB_ACTIONS)),
        }
    }

    fn ensure_field(&self, args: &Value, key: &str) -> Result<String, ToolError> {
        self.validation
            .ensure_string(args.get(key).unwrap_or(&Value::Null), key, true)
    }

    fn start_request(&self, args: &Value) -> Result<StartRequest, ToolError> {
        let target_id = self.ensure_field(args, "target_id")?;
        let api_name = self.ensure_field(args, "api_name")?;
        let pairs = self.validation.ensure_pairs(args.get("parameters"), "parameters")?;
        let mut parameters = ParameterInput::from_pairs(pairs);
        if let Some(json) = args.get("parameters_json").filter(|v| !v.is_null()) {
            parameters = parameters.with_json(json.clone());
        }
        Ok(StartRequest {
            target_id,
            api_name,
            parameters,
        })
    }

    fn poll_policy(&self, args: &Value) -> Result<PollPolicy, ToolError> {
        let defaults = PollPolicy::from_env();
        let delay_ms = self
            .validation
            .ensure_optional_u64(args.get("poll_delay_ms"), "poll_delay_ms")?
            .unwrap_or(defaults.delay.as_millis() as u64);
        let limit = self
            .validation
            .ensure_optional_u64(args.get("poll_limit"), "poll_limit")?
            .unwrap_or(defaults.limit);
        let mut policy = PollPolicy::new(delay_ms, limit);
        if let Some(timeout_ms) = self
            .validation
            .ensure_optional_u64(args.get("timeout_ms"), "timeout_ms")?
            .filter(|ms| *ms > 0)
        {
            policy = policy.with_timeout(Duration::from_millis(timeout_ms));
        }
        Ok(policy)
    }

    async fn run(&self, args: &Value) -> Result<Value, ToolError> {
        let request = self.start_request(args)?;
        let policy = self.poll_policy(args)?;
        let credentials = self.credentials.resolve(&[args.get("credentials")])?;
        let report = self.engine.run(&credentials, &request, &policy).await?;
        Ok(report.outcome.to_value())
    }

    async fn start(&self, args: &Value) -> Result<Value, ToolError> {
        let request = self.start_request(args)?;
        let credentials = self.credentials.resolve(&[args.get("credentials")])?;
        let started = self.engine.start(&credentials, &request).await?;
        Ok(serde_json::json!({"job_id": started.job_id, "status": started.status}))
    }

    async fn wait(&self, args: &Value) -> Result<Value, ToolError> {
        let target_id = self.ensure_field(args, "target_id")?;
        let job_id = self.ensure_field(args, "job_id")?;
        let policy = self.poll_policy(args)?;
        let credentials = self.credentials.resolve(&[args.get("credentials")])?;
        let report = self
            .engine
            .wait(&credentials, &target_id, &job_id, &policy)
            .await?;
        Ok(report.outcome.to_value())
    }

    async fn get_params(&self, args: &Value) -> Result<Value, ToolError> {
        let api_name = self.ensure_field(args, "api_name")?;
        let credentials = self.credentials.resolve(&[args.get("credentials")])?;
        self.engine.describe(&credentials, &api_name).await
    }
}

#[async_trait::async_trait]
impl crate::services::tool_executor::ToolHandler for JobManager {
    async fn handle(&self, args: Value) -> Result<Value, ToolError> {
        self.logger.debug("handle_action", args.get("action"));
        self.handle_action(args).await
    }
}
