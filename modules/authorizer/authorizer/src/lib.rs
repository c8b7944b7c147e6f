//! Shared Service Authorizer
//!
//! Verifies bearer tokens, synthesizes a tenant-scoped session policy and
//! exchanges it for short-lived credentials. The resulting decision carries
//! the credentials and identity fields for the downstream handler.
//!
//! Provides [`AuthorizerLocalClient`](domain::AuthorizerLocalClient), an
//! implementation of `authorizer_sdk::AuthorizerClient`.
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod config;
pub mod domain;
pub mod infra;

pub use config::{AuthorizerConfig, ConfigError};
pub use domain::{AuthorizerLocalClient, Collaborators, Service};
