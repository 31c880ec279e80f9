mod common;
use common::{app_with, credentials, definition, EnvSnapshot, ScriptedTransport, BASE, ENV_LOCK};

use legacy_use::errors::ToolErrorKind;
use serde_json::json;

#[tokio::test]
async fn run_resolves_parameters_starts_and_polls_to_success() {
    let _guard = ENV_LOCK.lock().await;
    let _env = EnvSnapshot::cleared();

    let transport = ScriptedTransport::new();
    transport
        .push_json(
            200,
            definition(json!([
                {"name": "city", "description": "City name"},
                {"name": "units", "default": "metric"},
            ])),
        )
        .push_json(200, json!({"id": 42, "status": "pending"}))
        .push_json(200, json!({"id": 42, "status": "pending"}))
        .push_json(200, json!({"id": 42, "status": "running"}))
        .push_json(200, json!({"id": 42, "status": "success", "result": {"temp": 3}}));
    let app = app_with(transport.clone());

    let out = app
        .tool_executor
        .execute(
            "legacy_use_job",
            json!({
                "action": "run",
                "target_id": "t1",
                "api_name": "get_weather",
                "parameters": [{"key": "city", "value": "Berlin"}],
                "poll_delay_ms": 0,
                "poll_limit": 5,
                "credentials": credentials(),
            }),
        )
        .await
        .expect("run");

    assert_eq!(
        out,
        json!({"job_id": "42", "status": "success", "result": {"temp": 3}})
    );

    let requests = transport.requests();
    assert_eq!(requests.len(), 5, "definition + create + 3 polls");
    assert_eq!(requests[0].url, format!("{}/api/definitions/get_weather", BASE));
    assert_eq!(requests[1].method.as_str(), "POST");
    assert_eq!(requests[1].url, format!("{}/targets/t1/jobs/", BASE));
    assert_eq!(
        requests[1].body,
        Some(json!({
            "api_name": "get_weather",
            "parameters": {"city": "Berlin", "units": "metric"},
        }))
    );
    assert_eq!(requests[4].url, format!("{}/targets/t1/jobs/42", BASE));
    for request in &requests {
        assert_eq!(request.header("X-API-Key"), Some("secret-key"));
        assert_eq!(request.header("X-Distinct-Id"), Some("rust-client"));
    }
}

#[tokio::test]
async fn missing_parameters_fail_before_the_job_is_created() {
    let _guard = ENV_LOCK.lock().await;
    let _env = EnvSnapshot::cleared();

    let transport = ScriptedTransport::new();
    transport.push_json(
        200,
        definition(json!([{"name": "city"}, {"name": "units", "default": "metric"}, {"name": "date"}])),
    );
    let app = app_with(transport.clone());

    let err = app
        .tool_executor
        .execute(
            "legacy_use_job",
            json!({
                "action": "start",
                "target_id": "t1",
                "api_name": "get_weather",
                "parameters": [{"key": "date", "value": ""}],
                "credentials": credentials(),
            }),
        )
        .await
        .expect_err("missing parameters");

    assert_eq!(err.kind, ToolErrorKind::InvalidParams);
    assert_eq!(err.message, "Missing parameters: city, date");
    assert_eq!(transport.request_count(), 1, "only the definition lookup");
}

#[tokio::test]
async fn parameters_json_overrides_pairs() {
    let _guard = ENV_LOCK.lock().await;
    let _env = EnvSnapshot::cleared();

    let transport = ScriptedTransport::new();
    transport
        .push_json(200, definition(json!([{"name": "city"}])))
        .push_json(200, json!({"id": "job-1", "status": "queued"}));
    let app = app_with(transport.clone());

    let out = app
        .tool_executor
        .execute(
            "legacy_use_job",
            json!({
                "action": "start",
                "target_id": "t1",
                "api_name": "get_weather",
                "parameters": [{"key": "city", "value": "Berlin"}],
                "parameters_json": "{\"city\": \"Paris\", \"extra\": 1}",
                "credentials": credentials(),
            }),
        )
        .await
        .expect("start");

    assert_eq!(out, json!({"job_id": "job-1", "status": "queued"}));
    let requests = transport.requests();
    assert_eq!(
        requests[1].body.as_ref().map(|b| b["parameters"].clone()),
        Some(json!({"city": "Paris", "extra": 1}))
    );
}

#[tokio::test]
async fn zero_poll_limit_never_contacts_the_remote() {
    let _guard = ENV_LOCK.lock().await;
    let _env = EnvSnapshot::cleared();

    let transport = ScriptedTransport::new();
    let app = app_with(transport.clone());

    let out = app
        .tool_executor
        .execute(
            "legacy_use_job",
            json!({
                "action": "wait",
                "target_id": "t1",
                "job_id": "j1",
                "poll_limit": 0,
                "credentials": credentials(),
            }),
        )
        .await
        .expect("wait");

    assert_eq!(
        out,
        json!({"job_id": "j1", "status": "failed", "error": "Polling limit reached"})
    );
    assert_eq!(transport.request_count(), 0);
}

#[tokio::test]
async fn stuck_job_uses_exactly_the_poll_limit() {
    let _guard = ENV_LOCK.lock().await;
    let _env = EnvSnapshot::cleared();

    let transport = ScriptedTransport::new();
    transport.repeat_json(200, json!({"id": "j1", "status": "running"}));
    let app = app_with(transport.clone());

    let out = app
        .tool_executor
        .execute(
            "legacy_use_job",
            json!({
                "action": "wait",
                "target_id": "t1",
                "job_id": "j1",
                "poll_delay_ms": 0,
                "poll_limit": 4,
                "credentials": credentials(),
            }),
        )
        .await
        .expect("wait");

    assert_eq!(out["error"], json!("Polling limit reached"));
    assert_eq!(transport.request_count(), 4);
}

#[tokio::test]
async fn terminal_job_returns_on_first_attempt() {
    let _guard = ENV_LOCK.lock().await;
    let _env = EnvSnapshot::cleared();

    let transport = ScriptedTransport::new();
    transport.push_json(200, json!({"id": "j1", "status": "error", "error": "target offline"}));
    let app = app_with(transport.clone());

    let out = app
        .tool_executor
        .execute(
            "legacy_use_job",
            json!({
                "action": "wait",
                "target_id": "t1",
                "job_id": "j1",
                "poll_delay_ms": 60000,
                "poll_limit": 10,
                "credentials": credentials(),
            }),
        )
        .await
        .expect("wait");

    assert_eq!(
        out,
        json!({"job_id": "j1", "status": "error", "error": "target offline"})
    );
    assert_eq!(transport.request_count(), 1);
}

#[tokio::test]
async fn timeout_bounds_the_whole_polling_loop() {
    let _guard = ENV_LOCK.lock().await;
    let _env = EnvSnapshot::cleared();

    let transport = ScriptedTransport::new();
    transport.repeat_json(200, json!({"id": "j1", "status": "queued"}));
    let app = app_with(transport.clone());

    let out = app
        .tool_executor
        .execute(
            "legacy_use_job",
            json!({
                "action": "wait",
                "target_id": "t1",
                "job_id": "j1",
                "poll_delay_ms": 60000,
                "poll_limit": 100,
                "timeout_ms": 50,
                "credentials": credentials(),
            }),
        )
        .await
        .expect("wait");

    assert_eq!(
        out,
        json!({"job_id": "j1", "status": "failed", "error": "Polling timeout reached"})
    );
    assert_eq!(transport.request_count(), 1);
}

#[tokio::test]
async fn get_params_returns_a_template() {
    let _guard = ENV_LOCK.lock().await;
    let _env = EnvSnapshot::cleared();

    let transport = ScriptedTransport::new();
    transport.push_json(
        200,
        definition(json!([{"name": "city"}, {"name": "units", "default": "metric"}])),
    );
    let app = app_with(transport.clone());

    let out = app
        .tool_executor
        .execute(
            "legacy_use_job",
            json!({"action": "get_params", "api_name": "get_weather", "credentials": credentials()}),
        )
        .await
        .expect("get_params");

    assert_eq!(out["api_name"], json!("get_weather"));
    assert_eq!(out["template"], json!({"city": "", "units": "metric"}));
    assert_eq!(out["parameters"].as_array().map(|a| a.len()), Some(2));
}

#[tokio::test]
async fn remote_errors_propagate_with_status() {
    let _guard = ENV_LOCK.lock().await;
    let _env = EnvSnapshot::cleared();

    let transport = ScriptedTransport::new();
    transport.push_json(404, json!({"detail": "API not found"}));
    let app = app_with(transport.clone());

    let err = app
        .tool_executor
        .execute(
            "legacy_use_job",
            json!({
                "action": "run",
                "target_id": "t1",
                "api_name": "nope",
                "credentials": credentials(),
            }),
        )
        .await
        .expect_err("404");

    assert_eq!(err.kind, ToolErrorKind::Remote);
    assert!(err.message.contains("API not found"));
    assert_eq!(err.details.as_ref().map(|d| d["status"].clone()), Some(json!(404)));
    assert_eq!(transport.request_count(), 1);
}

#[tokio::test]
async fn credentials_fall_back_to_environment() {
    let _guard = ENV_LOCK.lock().await;
    let _env = EnvSnapshot::cleared();
    std::env::set_var("LEGACY_USE_SUBDOMAIN", "envco");
    std::env::set_var("LEGACY_USE_API_KEY", "env-key");
    std::env::set_var("LEGACY_USE_DISTINCT_ID", "tester");

    let transport = ScriptedTransport::new();
    transport.push_json(200, json!({"id": "j1", "status": "success", "result": null}));
    let app = app_with(transport.clone());

    app.tool_executor
        .execute(
            "legacy_use_job",
            json!({"action": "wait", "target_id": "t1", "job_id": "j1", "poll_delay_ms": 0}),
        )
        .await
        .expect("wait");

    let requests = transport.requests();
    assert_eq!(requests[0].url, "https://envco.legacy-use.com/api/targets/t1/jobs/j1");
    assert_eq!(requests[0].header("X-API-Key"), Some("env-key"));
    assert_eq!(requests[0].header("X-Distinct-Id"), Some("tester"));
}

#[tokio::test]
async fn parameters_with_non_string_descriptions_are_still_required() {
    let _guard = ENV_LOCK.lock().await;
    let _env = EnvSnapshot::cleared();

    let transport = ScriptedTransport::new();
    transport
        .push_json(200, definition(json!([{"name": "city", "description": 5}])))
        .push_json(200, json!({"id": "j1", "status": "pending"}));
    let app = app_with(transport.clone());

    let err = app
        .tool_executor
        .execute(
            "legacy_use_job",
            json!({
                "action": "start",
                "target_id": "t1",
                "api_name": "get_weather",
                "credentials": credentials(),
            }),
        )
        .await
        .expect_err("city is declared");

    assert_eq!(err.kind, ToolErrorKind::InvalidParams);
    assert_eq!(err.message, "Missing parameters: city");
    assert_eq!(transport.request_count(), 1, "no job is created");
}

#[tokio::test(start_paused = true)]
async fn delay_separates_attempts_but_does_not_follow_the_last() {
    let _guard = ENV_LOCK.lock().await;
    let _env = EnvSnapshot::cleared();

    let transport = ScriptedTransport::new();
    transport.repeat_json(200, json!({"id": "j1", "status": "running"}));
    let app = app_with(transport.clone());

    let started = tokio::time::Instant::now();
    let out = app
        .tool_executor
        .execute(
            "legacy_use_job",
            json!({
                "action": "wait",
                "target_id": "t1",
                "job_id": "j1",
                "poll_delay_ms": 1000,
                "poll_limit": 3,
                "credentials": credentials(),
            }),
        )
        .await
        .expect("wait");

    assert_eq!(out["error"], json!("Polling limit reached"));
    assert_eq!(transport.request_count(), 3);
    assert_eq!(started.elapsed(), std::time::Duration::from_millis(2000));
}
