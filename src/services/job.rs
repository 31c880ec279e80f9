//! Job lifecycle: start a remote job, then observe it until it reaches a
//! terminal status or the local polling budget runs out.

use crate::config;
use crate::constants::polling;
use crate::errors::{ToolError, ToolErrorKind};
use crate::models::id_to_string;
use crate::services::api_client::LegacyUseClient;
use crate::services::credentials::Credentials;
use crate::services::logger::Logger;
use crate::services::parameters::{ParameterInput, ParameterResolver};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

/// Local reading of a remote job status. The in-flight vocabulary is closed:
/// any status outside it other than `success`, including a missing one, is a
/// failure.
#[derive(Debug, Clone, PartialEq)]
pub enum JobState {
    InFlight { status: String },
    Success { result: Value },
    Failure { status: Value, error: Value },
}

impl JobState {
    pub fn classify(response: &Value) -> Self {
        let status = response.get("status").and_then(|v| v.as_str());
        match status {
            Some(s) if polling::IN_FLIGHT_STATUSES.contains(&s) => JobState::InFlight {
                status: s.to_string(),
            },
            Some(s) if s == polling::SUCCESS_STATUS => JobState::Success {
                result: response.get("result").cloned().unwrap_or(Value::Null),
            },
            _ => JobState::Failure {
                status: response.get("status").cloned().unwrap_or(Value::Null),
                error: response
                    .get("error")
                    .filter(|v| !v.is_null())
                    .cloned()
                    .unwrap_or_else(|| response.clone()),
            },
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, JobState::InFlight { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub delay: Duration,
    pub limit: u64,
    /// Wall-clock bound over the whole loop, on top of `limit`.
    pub timeout: Option<Duration>,
}

impl PollPolicy {
    pub fn new(delay_ms: u64, limit: u64) -> Self {
        Self {
            delay: Duration::from_millis(delay_ms),
            limit,
            timeout: None,
        }
    }

    pub fn from_env() -> Self {
        Self::new(config::default_poll_delay_ms(), config::default_poll_limit())
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self::new(polling::DEFAULT_DELAY_MS, polling::DEFAULT_LIMIT)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StartedJob {
    pub job_id: String,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum JobOutcome {
    Succeeded { job_id: String, result: Value },
    Failed { job_id: String, status: Value, error: Value },
    /// Synthetic: the attempt budget ran out while the job was in flight.
    PollLimitReached { job_id: String },
    /// Synthetic: the wall-clock bound elapsed first.
    TimedOut { job_id: String },
}

impl JobOutcome {
    pub fn job_id(&self) -> &str {
        match self {
            JobOutcome::Succeeded { job_id, .. }
            | JobOutcome::Failed { job_id, .. }
            | JobOutcome::PollLimitReached { job_id }
            | JobOutcome::TimedOut { job_id } => job_id,
        }
    }

    /// Output record: `{job_id, status, result}` on success,
    /// `{job_id, status, error}` otherwise.
    pub fn to_value(&self) -> Value {
        match self {
            JobOutcome::Succeeded { job_id, result } => serde_json::json!({
                "job_id": job_id,
                "status": polling::SUCCESS_STATUS,
                "result": result,
            }),
            JobOutcome::Failed {
                job_id,
                status,
                error,
            } => serde_json::json!({
                "job_id": job_id,
                "status": status,
                "error": error,
            }),
            JobOutcome::PollLimitReached { job_id } => serde_json::json!({
                "job_id": job_id,
                "status": polling::FAILED_STATUS,
                "error": polling::LIMIT_REACHED_MESSAGE,
            }),
            JobOutcome::TimedOut { job_id } => serde_json::json!({
                "job_id": job_id,
                "status": polling::FAILED_STATUS,
                "error": polling::TIMEOUT_REACHED_MESSAGE,
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PollReport {
    pub outcome: JobOutcome,
    pub attempts: u64,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct StartRequest {
    pub target_id: String,
    pub api_name: String,
    pub parameters: ParameterInput,
}

#[derive(Clone)]
pub struct JobEngine {
    logger: Logger,
    client: LegacyUseClient,
    parameters: ParameterResolver,
}

impl JobEngine {
    pub fn new(logger: Logger, client: LegacyUseClient) -> Self {
        let logger = logger.child("engine");
        Self {
            parameters: ParameterResolver::new(logger.clone(), client.clone()),
            logger,
            client,
        }
    }

    /// Resolves parameters against the live definition and creates the job.
    /// Does not poll.
    pub async fn start(
        &self,
        credentials: &Credentials,
        request: &StartRequest,
    ) -> Result<StartedJob, ToolError> {
        let parameters = self
            .parameters
            .resolve(credentials, &request.api_name, &request.parameters)
            .await?;
        let response = self
            .client
            .create_job(credentials, &request.target_id, &request.api_name, &parameters)
            .await?;

        let job_id = response.get("id").and_then(id_to_string).ok_or_else(|| {
            ToolError::new(
                ToolErrorKind::Remote,
                "MISSING_JOB_ID",
                "Job creation response did not include an id",
            )
            .with_details(serde_json::json!({"response": response}))
        })?;
        let status = response
            .get("status")
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .unwrap_or(polling::START_STATUS)
            .to_string();

        self.logger.info(
            "job started",
            Some(&serde_json::json!({
                "target_id": request.target_id,
                "api_name": request.api_name,
                "job_id": job_id,
                "status": status,
            })),
        );
        Ok(StartedJob { job_id, status })
    }

    /// Polls until a terminal status, the attempt limit, or the optional
    /// timeout. Remote failures come back as outcomes; only transport and
    /// HTTP errors are `Err`.
    pub async fn poll_to_completion(
        &self,
        credentials: &Credentials,
        target_id: &str,
        job_id: &str,
        policy: &PollPolicy,
    ) -> Result<PollReport, ToolError> {
        let mut attempts = 0u64;
        let outcome = match policy.timeout {
            Some(timeout) => {
                let polled = tokio::time::timeout(
                    timeout,
                    self.poll_loop(credentials, target_id, job_id, policy, &mut attempts),
                )
                .await;
                match polled {
                    Ok(result) => result?,
                    Err(_) => JobOutcome::TimedOut {
                        job_id: job_id.to_string(),
                    },
                }
            }
            None => {
                self.poll_loop(credentials, target_id, job_id, policy, &mut attempts)
                    .await?
            }
        };

        let meta = serde_json::json!({
            "target_id": target_id,
            "job_id": outcome.job_id(),
            "attempts": attempts,
        });
        match &outcome {
            JobOutcome::Succeeded { .. } => self.logger.info("job succeeded", Some(&meta)),
            JobOutcome::Failed { .. } => self.logger.warn("job failed", Some(&meta)),
            JobOutcome::PollLimitReached { .. } => {
                self.logger.warn("polling limit reached", Some(&meta))
            }
            JobOutcome::TimedOut { .. } => self.logger.warn("polling timed out", Some(&meta)),
        }
        Ok(PollReport { outcome, attempts })
    }

    async fn poll_loop(
        &self,
        credentials: &Credentials,
        target_id: &str,
        job_id: &str,
        policy: &PollPolicy,
        attempts: &mut u64,
    ) -> Result<JobOutcome, ToolError> {
        while *attempts < policy.limit {
            let response = self.client.get_job(credentials, target_id, job_id).await?;
            *attempts += 1;
            let observed_id = response
                .get("id")
                .and_then(id_to_string)
                .unwrap_or_else(|| job_id.to_string());

            match JobState::classify(&response) {
                JobState::InFlight { status } => {
                    self.logger.debug(
                        "job in flight",
                        Some(&serde_json::json!({
                            "job_id": observed_id,
                            "status": status,
                            "attempt": *attempts,
                        })),
                    );
                }
                JobState::Success { result } => {
                    return Ok(JobOutcome::Succeeded {
                        job_id: observed_id,
                        result,
                    })
                }
                JobState::Failure { status, error } => {
                    return Ok(JobOutcome::Failed {
                        job_id: observed_id,
                        status,
                        error,
                    })
                }
            }

            if *attempts < policy.limit {
                tokio::time::sleep(policy.delay).await;
            }
        }
        Ok(JobOutcome::PollLimitReached {
            job_id: job_id.to_string(),
        })
    }

    /// Start, then poll the job just created.
    pub async fn run(
        &self,
        credentials: &Credentials,
        request: &StartRequest,
        policy: &PollPolicy,
    ) -> Result<PollReport, ToolError> {
        let started = self.start(credentials, request).await?;
        self.poll_to_completion(credentials, &request.target_id, &started.job_id, policy)
            .await
    }

    /// Poll an existing job without starting anything.
    pub async fn wait(
        &self,
        credentials: &Credentials,
        target_id: &str,
        job_id: &str,
        policy: &PollPolicy,
    ) -> Result<PollReport, ToolError> {
        self.poll_to_completion(credentials, target_id, job_id, policy)
            .await
    }

    /// Declared parameters of an API plus a fill-in template.
    pub async fn describe(
        &self,
        credentials: &Credentials,
        api_name: &str,
    ) -> Result<Value, ToolError> {
        let definition = self.client.get_definition(credentials, api_name).await?;
        Ok(serde_json::json!({
            "api_name": api_name,
            "parameters": definition.parameters,
            "template": definition.template(),
        }))
    }
}
