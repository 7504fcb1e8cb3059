mod support;

use std::time::Duration;

use env_feature_core::contract::ResponseStatus;
use env_feature_lambda::adapters::response_sender::HttpResponseSender;
use env_feature_lambda::config::HandlerConfig;
use env_feature_lambda::handlers::env_features::{handle_custom_resource_event, HandlerError};
use serde_json::{json, Value};
use support::events::feature_event;
use support::stack::FakeEnvironmentStack;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_config() -> HandlerConfig {
    HandlerConfig {
        poll_interval: Duration::ZERO,
        max_attempts: 10,
        response_timeout: Duration::from_secs(5),
        log_stream_name: Some("2026/10/19/[$LATEST]0123456789".to_string()),
    }
}

async fn response_server(status: u16) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/cfn-response"))
        .respond_with(ResponseTemplate::new(status))
        .mount(&server)
        .await;
    server
}

async fn delivered_body(server: &MockServer) -> Value {
    let requests = server
        .received_requests()
        .await
        .expect("request recording should be enabled");
    assert_eq!(requests.len(), 1, "exactly one response should be sent");
    serde_json::from_slice(&requests[0].body).expect("response body should be JSON")
}

#[tokio::test]
async fn create_updates_environment_and_reports_exports() {
    let server = response_server(200).await;
    let stack = FakeEnvironmentStack::new(
        "demo-test",
        &[("AppName", "demo"), ("EFSWorkloads", ""), ("Aliases", "")],
    )
    .with_export("FileSystemId", "fs-0123");
    let sender = HttpResponseSender::new(Duration::from_secs(5)).expect("client should build");
    let event = feature_event(
        "Create",
        &format!("{}/cfn-response", server.uri()),
        json!({"EFSWorkloads": "api", "Unrelated": "ignored"}),
    );

    let response = handle_custom_resource_event(&event, &stack, &sender, &test_config())
        .await
        .expect("response should be delivered");
    assert_eq!(response.status, ResponseStatus::Success);

    let values = stack.parameter_values();
    assert_eq!(values["EFSWorkloads"].as_deref(), Some("api"));
    assert_eq!(values["Aliases"].as_deref(), Some(""));
    assert!(!values.contains_key("Unrelated"));

    let body = delivered_body(&server).await;
    assert_eq!(body["Status"], "SUCCESS");
    assert_eq!(body["Reason"], "");
    assert_eq!(body["PhysicalResourceId"], "demo/test/api/features");
    assert_eq!(body["RequestId"], "c2d9b5c0-request");
    assert_eq!(body["LogicalResourceId"], "EnvironmentFeatures");
    assert_eq!(body["Data"], json!({"FileSystemId": "fs-0123"}));
}

#[tokio::test]
async fn repeated_update_without_changes_still_succeeds() {
    let server = response_server(200).await;
    let stack = FakeEnvironmentStack::new("demo-test", &[("EFSWorkloads", "api")])
        .with_export("FileSystemId", "fs-0123");
    let sender = HttpResponseSender::new(Duration::from_secs(5)).expect("client should build");
    let event = feature_event(
        "Update",
        &format!("{}/cfn-response", server.uri()),
        json!({"EFSWorkloads": "api"}),
    );

    let response = handle_custom_resource_event(&event, &stack, &sender, &test_config())
        .await
        .expect("response should be delivered");

    assert_eq!(response.status, ResponseStatus::Success);
    assert_eq!(stack.updates().len(), 1);
    let body = delivered_body(&server).await;
    assert_eq!(body["Data"]["FileSystemId"], "fs-0123");
}

#[tokio::test]
async fn missing_environment_stack_reports_failure() {
    let server = response_server(200).await;
    let stack = FakeEnvironmentStack::new("demo-prod", &[("EFSWorkloads", "")]);
    let sender = HttpResponseSender::new(Duration::from_secs(5)).expect("client should build");
    let event = feature_event(
        "Delete",
        &format!("{}/cfn-response", server.uri()),
        json!({}),
    );

    let response = handle_custom_resource_event(&event, &stack, &sender, &test_config())
        .await
        .expect("failure should be delivered");

    assert_eq!(response.status, ResponseStatus::Failed);
    let body = delivered_body(&server).await;
    assert_eq!(body["Status"], "FAILED");
    assert_eq!(body["Reason"], "Stack with id demo-test does not exist");
    assert_eq!(body["Data"], Value::Null);
    assert!(stack.updates().is_empty());
}

#[tokio::test]
async fn invalid_properties_fall_back_to_log_stream_id() {
    let server = response_server(200).await;
    let stack = FakeEnvironmentStack::new("demo-test", &[]);
    let sender = HttpResponseSender::new(Duration::from_secs(5)).expect("client should build");
    let mut event = feature_event(
        "Create",
        &format!("{}/cfn-response", server.uri()),
        json!({}),
    );
    event.resource_properties.remove("App");

    handle_custom_resource_event(&event, &stack, &sender, &test_config())
        .await
        .expect("failure should be delivered");

    let body = delivered_body(&server).await;
    assert_eq!(body["Status"], "FAILED");
    assert_eq!(body["PhysicalResourceId"], "2026/10/19/[$LATEST]0123456789");
    assert_eq!(
        body["Reason"],
        "resource property 'App' is required"
    );
}

#[tokio::test]
async fn rejected_response_upload_fails_the_invocation() {
    let server = response_server(403).await;
    let stack = FakeEnvironmentStack::new("demo-test", &[("EFSWorkloads", "")]);
    let sender = HttpResponseSender::new(Duration::from_secs(5)).expect("client should build");
    let event = feature_event(
        "Create",
        &format!("{}/cfn-response", server.uri()),
        json!({"EFSWorkloads": "api"}),
    );

    let error = handle_custom_resource_event(&event, &stack, &sender, &test_config())
        .await
        .expect_err("403 from the presigned URL should fail");

    assert!(matches!(error, HandlerError::Response(_)));
    assert_eq!(error.to_string(), "Error 403: Forbidden");
}

#[tokio::test]
async fn rejected_stack_update_reports_service_message() {
    let server = response_server(200).await;
    let stack = FakeEnvironmentStack::new("demo-test", &[("EFSWorkloads", "")])
        .failing_updates_with("Parameter 'EFSWorkloads' must be one of AllowedValues");
    let sender = HttpResponseSender::new(Duration::from_secs(5)).expect("client should build");
    let event = feature_event(
        "Update",
        &format!("{}/cfn-response", server.uri()),
        json!({"EFSWorkloads": "api"}),
    );

    let response = handle_custom_resource_event(&event, &stack, &sender, &test_config())
        .await
        .expect("failure should be delivered");

    assert_eq!(response.status, ResponseStatus::Failed);
    assert_eq!(stack.updates().len(), 1);
    assert_eq!(stack.parameter_values()["EFSWorkloads"].as_deref(), Some(""));
    let body = delivered_body(&server).await;
    assert_eq!(body["Status"], "FAILED");
    assert_eq!(
        body["Reason"],
        "Parameter 'EFSWorkloads' must be one of AllowedValues"
    );
    assert_eq!(body["Data"], Value::Null);
}
