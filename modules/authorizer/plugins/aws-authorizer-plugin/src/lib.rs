#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! AWS Authorizer Plugin
//!
//! AWS implementations of the authorizer's collaborator traits:
//!
//! - [`StsCredentialBroker`]: `AssumeRole` with the synthesized document as
//!   session policy
//! - [`StsAccountResolver`]: account id from `GetCallerIdentity`
//! - [`ApiGatewayTierKeys`]: value of the usage-plan API key `<tier>Key`
//!
//! ## Configuration
//!
//! ```yaml
//! aws:
//!   region: "eu-west-2"
//!   endpoint_url: null
//! ```

pub mod config;
pub mod domain;

pub use config::AwsPluginConfig;
pub use domain::{ApiGatewayTierKeys, AwsAdapters, StsAccountResolver, StsCredentialBroker};
