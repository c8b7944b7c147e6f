//! Typed view of the authorization context for downstream handlers.
//!
//! Handlers behind the gateway receive the context bundle of an allowed
//! decision as a flat string map. [`ExecutionContext::from_context`] turns it
//! into a typed value, failing closed when any required field is absent or
//! empty.

use std::collections::HashMap;
use std::hash::BuildHasher;

use secrecy::SecretString;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::claims::UserRole;
use crate::models::AuthorizationDecision;

/// Keys of the decision context bundle.
pub mod keys {
    pub const ACCESS_KEY_ID: &str = "accessKeyId";
    pub const SECRET_ACCESS_KEY: &str = "secretAccessKey";
    pub const SESSION_TOKEN: &str = "sessionToken";
    pub const CREDENTIAL_EXPIRY: &str = "credentialExpiry";
    pub const TENANT_ID: &str = "tenantId";
    pub const USER_ROLE: &str = "userRole";
    pub const EMAIL: &str = "email";
    pub const REGION: &str = "region";
    pub const AWS_REGION: &str = "awsRegion";
    pub const FIRST_NAME: &str = "firstName";
    pub const LAST_NAME: &str = "lastName";
    pub const REQUEST_ID: &str = "requestId";
    pub const USER_ID: &str = "userId";
    pub const ERROR_CODE: &str = "errorCode";
    pub const MESSAGE: &str = "message";
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ContextError {
    #[error("authorization context is missing '{field}'")]
    Missing { field: &'static str },

    #[error("authorization context field '{field}' is empty")]
    Empty { field: &'static str },

    #[error("authorization context field '{field}' is not a valid timestamp")]
    InvalidTimestamp { field: &'static str },
}

/// Identity, region and scoped credentials of the current request.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    pub tenant_id: String,
    pub user_id: String,
    pub user_role: UserRole,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub aws_region: String,
    pub access_key_id: String,
    pub secret_access_key: SecretString,
    pub session_token: SecretString,
    /// Present when the authorizer reported the credential expiry.
    pub credential_expiry: Option<OffsetDateTime>,
}

impl ExecutionContext {
    /// Parse the context map forwarded by the gateway.
    ///
    /// # Errors
    ///
    /// Returns [`ContextError`] when a required field is missing or empty,
    /// or when `credentialExpiry` is present but not RFC 3339.
    pub fn from_context<S: BuildHasher>(
        context: &HashMap<String, String, S>,
    ) -> Result<Self, ContextError> {
        Self::parse(|key| context.get(key).map(String::as_str))
    }

    /// Parse the context bundle of a decision produced in-process.
    ///
    /// # Errors
    ///
    /// Same as [`ExecutionContext::from_context`]; a deny decision always
    /// fails because it carries no identity.
    pub fn from_decision(decision: &AuthorizationDecision) -> Result<Self, ContextError> {
        Self::parse(|key| decision.context.get(key).and_then(|value| value.expose_str()))
    }

    fn parse<'a>(lookup: impl Fn(&str) -> Option<&'a str>) -> Result<Self, ContextError> {
        let required = |field: &'static str| -> Result<String, ContextError> {
            let value = lookup(field).ok_or(ContextError::Missing { field })?;
            if value.trim().is_empty() {
                return Err(ContextError::Empty { field });
            }
            Ok(value.to_owned())
        };

        let credential_expiry = lookup(keys::CREDENTIAL_EXPIRY)
            .map(|raw| {
                OffsetDateTime::parse(raw, &Rfc3339).map_err(|_| ContextError::InvalidTimestamp {
                    field: keys::CREDENTIAL_EXPIRY,
                })
            })
            .transpose()?;

        Ok(Self {
            tenant_id: required(keys::TENANT_ID)?,
            user_id: required(keys::USER_ID)?,
            user_role: UserRole::parse(&required(keys::USER_ROLE)?),
            email: required(keys::EMAIL)?,
            first_name: required(keys::FIRST_NAME)?,
            last_name: required(keys::LAST_NAME)?,
            aws_region: required(keys::AWS_REGION)?,
            access_key_id: required(keys::ACCESS_KEY_ID)?,
            secret_access_key: SecretString::from(required(keys::SECRET_ACCESS_KEY)?),
            session_token: SecretString::from(required(keys::SESSION_TOKEN)?),
            credential_expiry,
        })
    }
}
