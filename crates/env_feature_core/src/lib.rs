//! Environment feature custom-resource domain primitives.
//!
//! This crate owns the CloudFormation custom-resource contracts, the
//! SDK-independent stack model, and the deterministic pieces of the update
//! flow (parameter merge, output mapping, waiter status classification).
//! It intentionally excludes AWS SDK and Lambda runtime concerns.

pub mod contract;
pub mod stack;
pub mod waiter;
