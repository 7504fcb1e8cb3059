use async_trait::async_trait;
use env_feature_core::stack::{StackDescription, StackUpdate};
use thiserror::Error;

/// Failure reported by the stack-management API, message kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct StackClientError {
    pub code: Option<String>,
    pub message: String,
}

impl StackClientError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
        }
    }

    pub fn with_code(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
            message: message.into(),
        }
    }
}

#[async_trait]
pub trait StackClient: Send + Sync {
    async fn describe_stack(&self, stack_name: &str) -> Result<StackDescription, StackClientError>;

    async fn update_stack(&self, update: &StackUpdate) -> Result<(), StackClientError>;
}
