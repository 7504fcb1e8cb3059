use env_feature_core::contract::{
    resolve_physical_resource_id, CustomResourceEvent, CustomResourceResponse, FeatureProperties,
    RequestType, ResponseData, ValidationError,
};
use env_feature_core::stack::{
    environment_stack_name, exported_values, merge_feature_parameters, StackUpdate,
};
use env_feature_core::waiter::{
    classify_update_status, is_no_updates_message, UpdateOutcome, WaitProgress,
};
use thiserror::Error;
use tracing::{error, info, warn};

use crate::adapters::response_sender::{ResponseError, ResponseSender};
use crate::adapters::stack_client::{StackClient, StackClientError};
use crate::config::HandlerConfig;

const COMPONENT: &str = "env_feature_handler";

#[derive(Debug, Error)]
pub enum HandlerError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Stack(#[from] StackClientError),
    #[error("stack {stack_name} update failed with status {status}: {reason}")]
    UpdateFailed {
        stack_name: String,
        status: String,
        reason: String,
    },
    #[error("timed out waiting for stack {stack_name} to finish updating after {attempts} attempts")]
    WaitTimedOut { stack_name: String, attempts: u32 },
    #[error("custom resource event has no ResponseURL")]
    MissingResponseUrl,
    #[error(transparent)]
    Response(#[from] ResponseError),
}

impl HandlerError {
    /// Service error code of a failed stack API call, e.g. `ValidationError`.
    pub fn error_code(&self) -> Option<&str> {
        match self {
            Self::Stack(failure) => failure.code.as_deref(),
            _ => None,
        }
    }
}

/// Runs one custom-resource request and reports its outcome to CloudFormation.
///
/// Any failure of the stack update itself is reported as `FAILED`; only a
/// missing response URL or an undeliverable response is returned as an error.
pub async fn handle_custom_resource_event(
    event: &CustomResourceEvent,
    stack_client: &impl StackClient,
    response_sender: &impl ResponseSender,
    config: &HandlerConfig,
) -> Result<CustomResourceResponse, HandlerError> {
    let response_url = event
        .response_url
        .as_deref()
        .filter(|url| !url.trim().is_empty())
        .ok_or(HandlerError::MissingResponseUrl)?;
    let physical_resource_id = resolve_physical_resource_id(event, config.log_stream_name.as_deref());

    let response = match process_request(event, stack_client, config).await {
        Ok(data) => CustomResourceResponse::success(event, physical_resource_id, data),
        Err(failure) => {
            error!(
                component = COMPONENT,
                event = "request_failed",
                request_id = %event.request_id,
                request_type = %event.request_type,
                error_code = failure.error_code().unwrap_or("none"),
                error = %failure,
            );
            CustomResourceResponse::failure(event, physical_resource_id, failure.to_string())
        }
    };

    response_sender.send(response_url, &response).await?;
    info!(
        component = COMPONENT,
        event = "response_sent",
        request_id = %event.request_id,
        status = response.status.as_str(),
        physical_resource_id = %response.physical_resource_id,
    );
    Ok(response)
}

async fn process_request(
    event: &CustomResourceEvent,
    stack_client: &impl StackClient,
    config: &HandlerConfig,
) -> Result<ResponseData, HandlerError> {
    let request_type = event.parsed_request_type()?;
    let features = FeatureProperties::from_properties(&event.resource_properties)?;
    info!(
        component = COMPONENT,
        event = "request_received",
        request_id = %event.request_id,
        request_type = request_type.as_str(),
        project = %features.project,
        env = %features.env,
        app = %features.app,
    );

    // Deleting the feature resource re-applies its properties; the environment keeps them.
    match request_type {
        RequestType::Create | RequestType::Update | RequestType::Delete => {
            add_env_features(&features, stack_client, config).await
        }
    }
}

/// Applies the feature properties to the environment stack and returns its
/// exported values once the update has settled.
pub async fn add_env_features(
    features: &FeatureProperties,
    stack_client: &impl StackClient,
    config: &HandlerConfig,
) -> Result<ResponseData, HandlerError> {
    let stack_name = environment_stack_name(&features.project, &features.env);
    let stack = stack_client.describe_stack(&stack_name).await?;
    info!(
        component = COMPONENT,
        event = "stack_described",
        stack_name = %stack_name,
        status = %stack.status,
        parameters = stack.parameters.len(),
    );

    let merged = merge_feature_parameters(&stack.parameters, &features.overrides);
    info!(
        component = COMPONENT,
        event = "parameters_merged",
        stack_name = %stack_name,
        overwritten = ?merged.overwritten_keys,
    );

    let update = StackUpdate::from_description(&stack, merged.parameters);
    let outcome = start_update(stack_client, &update).await?;
    wait_for_update(stack_client, &stack_name, outcome, config).await?;

    let updated = stack_client.describe_stack(&stack_name).await?;
    let values = exported_values(&stack_name, &updated.outputs);
    info!(
        component = COMPONENT,
        event = "stack_update_completed",
        stack_name = %stack_name,
        exported_values = values.len(),
    );
    Ok(values)
}

async fn start_update(
    stack_client: &impl StackClient,
    update: &StackUpdate,
) -> Result<UpdateOutcome, HandlerError> {
    match stack_client.update_stack(update).await {
        Ok(()) => {
            info!(
                component = COMPONENT,
                event = "stack_update_started",
                stack_name = %update.stack_name,
            );
            Ok(UpdateOutcome::Started)
        }
        Err(failure) if is_no_updates_message(&failure.message) => {
            info!(
                component = COMPONENT,
                event = "stack_update_noop",
                stack_name = %update.stack_name,
            );
            Ok(UpdateOutcome::NoChanges)
        }
        Err(failure) => Err(failure.into()),
    }
}

async fn wait_for_update(
    stack_client: &impl StackClient,
    stack_name: &str,
    outcome: UpdateOutcome,
    config: &HandlerConfig,
) -> Result<(), HandlerError> {
    let attempts = config.max_attempts.max(1);
    for attempt in 1..=attempts {
        let stack = stack_client.describe_stack(stack_name).await?;
        let progress = classify_update_status(&stack.status, stack.status_reason.as_deref(), outcome);
        info!(
            component = COMPONENT,
            event = "stack_update_polled",
            stack_name = %stack_name,
            attempt,
            status = %stack.status,
        );

        match progress {
            WaitProgress::Complete => return Ok(()),
            WaitProgress::Failed { status, reason } => {
                return Err(HandlerError::UpdateFailed {
                    stack_name: stack_name.to_string(),
                    status,
                    reason: reason.unwrap_or_else(|| "no reason reported".to_string()),
                });
            }
            WaitProgress::Pending if attempt < attempts => {
                tokio::time::sleep(config.poll_interval).await;
            }
            WaitProgress::Pending => {}
        }
    }

    warn!(
        component = COMPONENT,
        event = "stack_update_wait_exhausted",
        stack_name = %stack_name,
        attempts,
    );
    Err(HandlerError::WaitTimedOut {
        stack_name: stack_name.to_string(),
        attempts,
    })
}
