use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

pub const PROJECT_PROPERTY: &str = "Project";
pub const ENV_PROPERTY: &str = "Env";
pub const APP_PROPERTY: &str = "App";

pub type ResourceProperties = Map<String, Value>;

/// Data returned to CloudFormation on success, readable with `Fn::GetAtt`.
pub type ResponseData = BTreeMap<String, String>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Unsupported request type {0}")]
    UnsupportedRequestType(String),
    #[error("resource property '{0}' is required")]
    MissingProperty(&'static str),
}

/// Custom-resource request as delivered by CloudFormation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct CustomResourceEvent {
    pub request_type: String,
    #[serde(rename = "ResponseURL", default)]
    pub response_url: Option<String>,
    pub stack_id: String,
    pub request_id: String,
    pub logical_resource_id: String,
    #[serde(default)]
    pub resource_type: Option<String>,
    #[serde(default)]
    pub physical_resource_id: Option<String>,
    #[serde(default)]
    pub resource_properties: ResourceProperties,
    #[serde(default)]
    pub old_resource_properties: Option<ResourceProperties>,
}

impl CustomResourceEvent {
    pub fn parsed_request_type(&self) -> Result<RequestType, ValidationError> {
        self.request_type.parse()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestType {
    Create,
    Update,
    Delete,
}

impl RequestType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Create => "Create",
            Self::Update => "Update",
            Self::Delete => "Delete",
        }
    }
}

impl FromStr for RequestType {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "Create" => Ok(Self::Create),
            "Update" => Ok(Self::Update),
            "Delete" => Ok(Self::Delete),
            other => Err(ValidationError::UnsupportedRequestType(other.to_string())),
        }
    }
}

impl fmt::Display for RequestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resource properties of an application feature resource.
///
/// Every property is a candidate override for an environment stack
/// parameter with the same key; `Project` and `Env` also name the stack.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureProperties {
    pub project: String,
    pub env: String,
    pub app: String,
    pub overrides: BTreeMap<String, String>,
}

impl FeatureProperties {
    pub fn from_properties(properties: &ResourceProperties) -> Result<Self, ValidationError> {
        Ok(Self {
            project: required_property(properties, PROJECT_PROPERTY)?,
            env: required_property(properties, ENV_PROPERTY)?,
            app: required_property(properties, APP_PROPERTY)?,
            overrides: parameter_overrides(properties),
        })
    }

    pub fn physical_resource_id(&self) -> String {
        physical_resource_id(&self.project, &self.env, &self.app)
    }
}

fn required_property(
    properties: &ResourceProperties,
    name: &'static str,
) -> Result<String, ValidationError> {
    properties
        .get(name)
        .and_then(render_scalar)
        .filter(|value| !value.is_empty())
        .ok_or(ValidationError::MissingProperty(name))
}

/// Renders property values as CloudFormation parameter strings.
///
/// Scalars are kept; nulls and composite values can never be a parameter
/// value and are dropped.
pub fn parameter_overrides(properties: &ResourceProperties) -> BTreeMap<String, String> {
    properties
        .iter()
        .filter_map(|(key, value)| Some((key.clone(), render_scalar(value)?)))
        .collect()
}

fn render_scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

pub fn physical_resource_id(project: &str, env: &str, app: &str) -> String {
    format!("{project}/{env}/{app}/features")
}

/// Picks the physical id reported for a request, even when its properties
/// are unusable: the feature id when possible, else the log stream name,
/// else the logical id.
pub fn resolve_physical_resource_id(
    event: &CustomResourceEvent,
    log_stream_name: Option<&str>,
) -> String {
    let properties = &event.resource_properties;
    let identity = (
        required_property(properties, PROJECT_PROPERTY),
        required_property(properties, ENV_PROPERTY),
        required_property(properties, APP_PROPERTY),
    );
    match identity {
        (Ok(project), Ok(env), Ok(app)) => physical_resource_id(&project, &env, &app),
        _ => log_stream_name
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| event.logical_resource_id.clone()),
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum ResponseStatus {
    Success,
    Failed,
}

impl ResponseStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "SUCCESS",
            Self::Failed => "FAILED",
        }
    }
}

/// Document PUT to the presigned response URL.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct CustomResourceResponse {
    pub status: ResponseStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub physical_resource_id: String,
    pub stack_id: String,
    pub request_id: String,
    pub logical_resource_id: String,
    pub data: Option<ResponseData>,
}

impl CustomResourceResponse {
    pub fn success(
        event: &CustomResourceEvent,
        physical_resource_id: impl Into<String>,
        data: ResponseData,
    ) -> Self {
        Self {
            status: ResponseStatus::Success,
            reason: Some(String::new()),
            physical_resource_id: physical_resource_id.into(),
            stack_id: event.stack_id.clone(),
            request_id: event.request_id.clone(),
            logical_resource_id: event.logical_resource_id.clone(),
            data: Some(data),
        }
    }

    pub fn failure(
        event: &CustomResourceEvent,
        physical_resource_id: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            status: ResponseStatus::Failed,
            reason: Some(reason.into()),
            physical_resource_id: physical_resource_id.into(),
            stack_id: event.stack_id.clone(),
            request_id: event.request_id.clone(),
            logical_resource_id: event.logical_resource_id.clone(),
            data: None,
        }
    }
}
