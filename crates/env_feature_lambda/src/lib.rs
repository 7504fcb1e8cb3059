//! AWS-oriented adapters and handlers for the environment feature custom resource.
//!
//! This crate owns runtime integration details (the Lambda handler flow,
//! the CloudFormation and presigned-URL adapters, invocation configuration).
//! Event contracts and the stack model live in `env_feature_core`.

pub mod adapters;
pub mod config;
pub mod handlers;
