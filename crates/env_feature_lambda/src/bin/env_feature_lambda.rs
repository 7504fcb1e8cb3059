use async_trait::async_trait;
use aws_sdk_cloudformation::error::ProvideErrorMetadata;
use aws_sdk_cloudformation::types::{Capability, Output, Parameter, Stack, Tag};
use env_feature_core::contract::CustomResourceEvent;
use env_feature_core::stack::{
    StackDescription, StackOutput, StackParameter, StackTag, StackUpdate,
};
use env_feature_lambda::adapters::response_sender::HttpResponseSender;
use env_feature_lambda::adapters::stack_client::{StackClient, StackClientError};
use env_feature_lambda::config::HandlerConfig;
use env_feature_lambda::handlers::env_features::handle_custom_resource_event;
use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde_json::{json, Value};
use tracing_subscriber::EnvFilter;

struct CloudFormationStackClient {
    client: aws_sdk_cloudformation::Client,
}

#[async_trait]
impl StackClient for CloudFormationStackClient {
    async fn describe_stack(&self, stack_name: &str) -> Result<StackDescription, StackClientError> {
        let output = self
            .client
            .describe_stacks()
            .stack_name(stack_name)
            .send()
            .await
            .map_err(|error| sdk_error("failed to describe stack", &error))?;

        output
            .stacks()
            .first()
            .map(stack_description)
            .ok_or_else(|| StackClientError::new(format!("Stack with id {stack_name} does not exist")))
    }

    async fn update_stack(&self, update: &StackUpdate) -> Result<(), StackClientError> {
        let tags = update
            .tags
            .iter()
            .map(sdk_tag)
            .collect::<Result<Vec<_>, _>>()?;

        self.client
            .update_stack()
            .stack_name(&update.stack_name)
            .use_previous_template(update.use_previous_template)
            .set_parameters(Some(update.parameters.iter().map(sdk_parameter).collect()))
            .set_capabilities(Some(
                update
                    .capabilities
                    .iter()
                    .map(|capability| Capability::from(capability.as_str()))
                    .collect(),
            ))
            .set_tags(Some(tags))
            .send()
            .await
            .map(|_| ())
            .map_err(|error| sdk_error("failed to update stack", &error))
    }
}

/// Keeps the service message verbatim so callers can match on it.
fn sdk_error(context: &str, error: &impl ProvideErrorMetadata) -> StackClientError {
    match (error.code(), error.message()) {
        (Some(code), Some(message)) => StackClientError::with_code(code, message),
        (None, Some(message)) => StackClientError::new(message),
        (Some(code), None) => StackClientError::with_code(code, format!("{context}: {code}")),
        (None, None) => StackClientError::new(context),
    }
}

fn stack_description(stack: &Stack) -> StackDescription {
    StackDescription {
        stack_id: stack.stack_id().map(str::to_string),
        stack_name: stack.stack_name().to_string(),
        status: stack.stack_status().as_str().to_string(),
        status_reason: stack.stack_status_reason().map(str::to_string),
        parameters: stack.parameters().iter().map(stack_parameter).collect(),
        capabilities: stack
            .capabilities()
            .iter()
            .map(|capability| capability.as_str().to_string())
            .collect(),
        tags: stack
            .tags()
            .iter()
            .map(|tag| StackTag {
                key: tag.key().to_string(),
                value: tag.value().to_string(),
            })
            .collect(),
        outputs: stack.outputs().iter().map(stack_output).collect(),
    }
}

fn stack_parameter(parameter: &Parameter) -> StackParameter {
    StackParameter {
        key: parameter.parameter_key().unwrap_or_default().to_string(),
        value: parameter.parameter_value().map(str::to_string),
    }
}

fn stack_output(output: &Output) -> StackOutput {
    StackOutput {
        key: output.output_key().unwrap_or_default().to_string(),
        value: output.output_value().map(str::to_string),
        export_name: output.export_name().map(str::to_string),
    }
}

fn sdk_parameter(parameter: &StackParameter) -> Parameter {
    Parameter::builder()
        .parameter_key(&parameter.key)
        .set_parameter_value(parameter.value.clone())
        .build()
}

fn sdk_tag(tag: &StackTag) -> Result<Tag, StackClientError> {
    Ok(Tag::builder().key(&tag.key).value(&tag.value).build())
}

async fn handle_request(event: LambdaEvent<Value>) -> Result<Value, Error> {
    let request: CustomResourceEvent = serde_json::from_value(event.payload)
        .map_err(|error| Error::from(format!("invalid custom resource event: {error}")))?;

    let config = HandlerConfig::from_env_or_default();
    let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let stack_client = CloudFormationStackClient {
        client: aws_sdk_cloudformation::Client::new(&aws_config),
    };
    let response_sender = HttpResponseSender::new(config.response_timeout)
        .map_err(|error| Error::from(error.to_string()))?;

    let response = handle_custom_resource_event(&request, &stack_client, &response_sender, &config)
        .await
        .map_err(|error| Error::from(error.to_string()))?;

    Ok(json!({
        "status": response.status.as_str(),
        "physical_resource_id": response.physical_resource_id,
    }))
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        // CloudWatch stamps every line on ingestion.
        .without_time()
        .with_target(false)
        .with_current_span(false)
        .init();

    lambda_runtime::run(service_fn(handle_request)).await
}
