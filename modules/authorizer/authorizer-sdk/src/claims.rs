//! Verified identity claims.
//!
//! Claims are parsed from the signature-verified token payload in a single
//! typed step. Any missing or mistyped claim fails the parse; there is no
//! partially populated identity.

use std::fmt;

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use time::OffsetDateTime;

pub const CLAIM_SUBJECT: &str = "sub";
pub const CLAIM_ISSUER: &str = "iss";
pub const CLAIM_AUDIENCE: &str = "aud";
pub const CLAIM_EXPIRES_AT: &str = "exp";
pub const CLAIM_ISSUED_AT: &str = "iat";
pub const CLAIM_EMAIL: &str = "email";
pub const CLAIM_TENANT_ID: &str = "custom:tenantId";
pub const CLAIM_USER_ROLE: &str = "custom:userRole";
pub const CLAIM_REGION: &str = "custom:region";
pub const CLAIM_FIRST_NAME: &str = "custom:firstName";
pub const CLAIM_LAST_NAME: &str = "custom:lastName";

/// Caller role carried in the `custom:userRole` claim.
///
/// Closed set: anything the authorizer does not know is kept verbatim in
/// [`UserRole::Unrecognized`] so that policy synthesis can match every role
/// exhaustively and deny the unknown ones.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum UserRole {
    /// SaaS operator with account-wide data access.
    SystemAdmin,
    /// SaaS provider support staff.
    CustomerSupport,
    /// Administrator of a single tenant.
    TenantAdmin,
    /// Regular member of a single tenant.
    TenantUser,
    /// Any other role string.
    Unrecognized(String),
}

impl UserRole {
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw {
            "SystemAdmin" => Self::SystemAdmin,
            "CustomerSupport" => Self::CustomerSupport,
            "TenantAdmin" => Self::TenantAdmin,
            "TenantUser" => Self::TenantUser,
            other => Self::Unrecognized(other.to_owned()),
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::SystemAdmin => "SystemAdmin",
            Self::CustomerSupport => "CustomerSupport",
            Self::TenantAdmin => "TenantAdmin",
            Self::TenantUser => "TenantUser",
            Self::Unrecognized(raw) => raw,
        }
    }

    /// Roles operated by the SaaS provider rather than by a tenant.
    #[must_use]
    pub fn is_saas_provider(&self) -> bool {
        matches!(self, Self::SystemAdmin | Self::CustomerSupport)
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for UserRole {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Reasons a verified payload cannot become [`IdentityClaims`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClaimsParseError {
    #[error("token payload is not a JSON object")]
    NotAnObject,

    #[error("claim '{claim}' is missing")]
    Missing { claim: &'static str },

    #[error("claim '{claim}' must be {expected}")]
    WrongType {
        claim: &'static str,
        expected: &'static str,
    },

    #[error("claim '{claim}' is empty")]
    Empty { claim: &'static str },

    #[error("claim '{claim}' is not a valid timestamp")]
    InvalidTimestamp { claim: &'static str },

    #[error("tenant id contains characters reserved for policy patterns")]
    InvalidTenantId,
}

/// Identity extracted from a signature-verified bearer token.
///
/// Immutable once parsed; all fields are guaranteed non-empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityClaims {
    subject: String,
    tenant_id: String,
    user_role: UserRole,
    region_alias: String,
    email: String,
    first_name: String,
    last_name: String,
    issuer: String,
    audience: Vec<String>,
    issued_at: OffsetDateTime,
    expires_at: OffsetDateTime,
}

impl IdentityClaims {
    /// Parse the verified token payload.
    ///
    /// # Errors
    ///
    /// Returns [`ClaimsParseError`] when any required claim is absent, has the
    /// wrong JSON type, is empty, or (for the tenant id) contains characters
    /// that would act as wildcards in a policy condition.
    pub fn from_payload(payload: &Value) -> Result<Self, ClaimsParseError> {
        let map = payload.as_object().ok_or(ClaimsParseError::NotAnObject)?;

        let tenant_id = required_str(map, CLAIM_TENANT_ID)?;
        if !is_valid_tenant_id(&tenant_id) {
            return Err(ClaimsParseError::InvalidTenantId);
        }

        Ok(Self {
            subject: required_str(map, CLAIM_SUBJECT)?,
            tenant_id,
            user_role: UserRole::parse(&required_str(map, CLAIM_USER_ROLE)?),
            region_alias: required_str(map, CLAIM_REGION)?,
            email: required_str(map, CLAIM_EMAIL)?,
            first_name: required_str(map, CLAIM_FIRST_NAME)?,
            last_name: required_str(map, CLAIM_LAST_NAME)?,
            issuer: required_str(map, CLAIM_ISSUER)?,
            audience: required_audience(map)?,
            issued_at: required_timestamp(map, CLAIM_ISSUED_AT)?,
            expires_at: required_timestamp(map, CLAIM_EXPIRES_AT)?,
        })
    }

    #[must_use]
    pub fn subject(&self) -> &str {
        &self.subject
    }

    #[must_use]
    pub fn tenant_id(&self) -> &str {
        &self.tenant_id
    }

    #[must_use]
    pub fn user_role(&self) -> &UserRole {
        &self.user_role
    }

    #[must_use]
    pub fn region_alias(&self) -> &str {
        &self.region_alias
    }

    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }

    #[must_use]
    pub fn first_name(&self) -> &str {
        &self.first_name
    }

    #[must_use]
    pub fn last_name(&self) -> &str {
        &self.last_name
    }

    #[must_use]
    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    #[must_use]
    pub fn audience(&self) -> &[String] {
        &self.audience
    }

    #[must_use]
    pub fn issued_at(&self) -> OffsetDateTime {
        self.issued_at
    }

    #[must_use]
    pub fn expires_at(&self) -> OffsetDateTime {
        self.expires_at
    }

    /// A token is expired from the instant of its `exp` onwards.
    #[must_use]
    pub fn is_expired_at(&self, now: OffsetDateTime) -> bool {
        now >= self.expires_at
    }
}

/// Tenant ids end up inside `StringLike` patterns, so wildcard and delimiter
/// characters are refused.
#[must_use]
pub fn is_valid_tenant_id(tenant_id: &str) -> bool {
    !tenant_id.is_empty()
        && !tenant_id
            .chars()
            .any(|c| matches!(c, '*' | '?' | '#') || c.is_whitespace())
}

fn required<'a>(
    map: &'a Map<String, Value>,
    claim: &'static str,
) -> Result<&'a Value, ClaimsParseError> {
    match map.get(claim) {
        None | Some(Value::Null) => Err(ClaimsParseError::Missing { claim }),
        Some(value) => Ok(value),
    }
}

fn required_str(map: &Map<String, Value>, claim: &'static str) -> Result<String, ClaimsParseError> {
    let value = required(map, claim)?
        .as_str()
        .ok_or(ClaimsParseError::WrongType {
            claim,
            expected: "a string",
        })?;
    if value.trim().is_empty() {
        return Err(ClaimsParseError::Empty { claim });
    }
    Ok(value.to_owned())
}

fn required_audience(map: &Map<String, Value>) -> Result<Vec<String>, ClaimsParseError> {
    let wrong_type = ClaimsParseError::WrongType {
        claim: CLAIM_AUDIENCE,
        expected: "a string or an array of strings",
    };
    let audience = match required(map, CLAIM_AUDIENCE)? {
        Value::String(single) => vec![single.clone()],
        Value::Array(items) => items
            .iter()
            .map(|item| item.as_str().map(str::to_owned))
            .collect::<Option<Vec<_>>>()
            .ok_or(wrong_type)?,
        _ => return Err(wrong_type),
    };
    if audience.iter().all(|aud| aud.trim().is_empty()) {
        return Err(ClaimsParseError::Empty {
            claim: CLAIM_AUDIENCE,
        });
    }
    Ok(audience)
}

fn required_timestamp(
    map: &Map<String, Value>,
    claim: &'static str,
) -> Result<OffsetDateTime, ClaimsParseError> {
    let seconds = required(map, claim)?
        .as_i64()
        .ok_or(ClaimsParseError::WrongType {
            claim,
            expected: "an integer number of seconds",
        })?;
    OffsetDateTime::from_unix_timestamp(seconds)
        .map_err(|_| ClaimsParseError::InvalidTimestamp { claim })
}
