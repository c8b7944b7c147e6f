//! Gateway-facing request and decision models.

use std::collections::{BTreeMap, HashMap};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize, Serializer};

use crate::context::keys;
use crate::error::AuthorizerError;
use crate::policy::{Effect, POLICY_VERSION};

/// Header carrying the bearer token.
pub const AUTHORIZATION_HEADER: &str = "Authorization";

/// Action granted on the gateway resource when a request is allowed.
pub const INVOKE_ACTION: &str = "execute-api:Invoke";

/// Principal reported when no identity could be established.
pub const ANONYMOUS_PRINCIPAL: &str = "user";

/// Fixed CORS entries present in every decision context.
pub const CORS_CONTEXT: [(&str, &str); 4] = [
    ("Access-Control-Allow-Origin", "*"),
    ("Access-Control-Allow-Methods", "*"),
    ("Access-Control-Allow-Headers", "*"),
    ("Content-Type", "*/*"),
];

/// Inbound request descriptor handed over by the gateway.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizationRequest {
    /// Request headers. Lookup is case-insensitive.
    #[serde(default)]
    pub headers: HashMap<String, String>,
    /// Method/resource identifier being invoked; echoed into the decision.
    pub method_arn: String,
    /// Correlation id assigned by the gateway.
    #[serde(default)]
    pub request_id: String,
}

impl AuthorizationRequest {
    /// Case-insensitive header lookup.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Bearer token from the `Authorization` header.
    ///
    /// The `Bearer ` scheme prefix is optional (identity providers wired
    /// directly to the gateway send the raw token). Returns `None` when the
    /// header is absent or carries no token.
    #[must_use]
    pub fn bearer_token(&self) -> Option<&str> {
        let raw = self.header(AUTHORIZATION_HEADER)?.trim();
        let token = match raw.split_once(char::is_whitespace) {
            Some((scheme, rest)) if scheme.eq_ignore_ascii_case("bearer") => rest.trim(),
            // A scheme with nothing after it carries no token.
            None if raw.eq_ignore_ascii_case("bearer") => "",
            _ => raw,
        };
        (!token.is_empty()).then_some(token)
    }
}

/// Value stored in the decision context.
///
/// `Secret` values are serialised in clear (the gateway must forward them to
/// the integration) but redacted in `Debug` output.
#[derive(Debug, Clone)]
pub enum ContextValue {
    Text(String),
    Flag(bool),
    Secret(SecretString),
}

impl ContextValue {
    /// String content, exposing secrets. Only for forwarding, never logging.
    #[must_use]
    pub fn expose_str(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Secret(secret) => Some(secret.expose_secret()),
            Self::Flag(_) => None,
        }
    }

    #[must_use]
    pub fn is_secret(&self) -> bool {
        matches!(self, Self::Secret(_))
    }
}

impl From<&str> for ContextValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for ContextValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<bool> for ContextValue {
    fn from(value: bool) -> Self {
        Self::Flag(value)
    }
}

impl Serialize for ContextValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Text(text) => serializer.serialize_str(text),
            Self::Flag(flag) => serializer.serialize_bool(*flag),
            Self::Secret(secret) => serializer.serialize_str(secret.expose_secret()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct GatewayStatement {
    pub action: Vec<String>,
    pub effect: Effect,
    pub resource: Vec<String>,
}

/// Gateway-level policy: may the caller invoke the requested method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct GatewayPolicy {
    pub version: &'static str,
    pub statement: Vec<GatewayStatement>,
}

impl GatewayPolicy {
    #[must_use]
    pub fn invoke(effect: Effect, resource: &str) -> Self {
        Self {
            version: POLICY_VERSION,
            statement: vec![GatewayStatement {
                action: vec![INVOKE_ACTION.to_owned()],
                effect,
                resource: vec![resource.to_owned()],
            }],
        }
    }
}

/// Outcome of one authorization, returned to the gateway.
///
/// Created once per request and discarded afterwards.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizationDecision {
    pub principal_id: String,
    pub policy_document: GatewayPolicy,
    pub context: BTreeMap<String, ContextValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage_identifier_key: Option<String>,
    #[serde(skip)]
    reason: Option<AuthorizerError>,
}

impl AuthorizationDecision {
    /// Allow decision carrying the assembled context bundle.
    #[must_use]
    pub fn allow(
        principal_id: impl Into<String>,
        resource: &str,
        context: BTreeMap<String, ContextValue>,
        usage_identifier_key: Option<String>,
    ) -> Self {
        Self {
            principal_id: principal_id.into(),
            policy_document: GatewayPolicy::invoke(Effect::Allow, resource),
            context,
            usage_identifier_key,
            reason: None,
        }
    }

    /// Deny decision with a structured error payload.
    ///
    /// The context carries the CORS entries, the correlation id and the
    /// failure code and message; never any claim or credential.
    #[must_use]
    pub fn deny(resource: &str, request_id: &str, reason: AuthorizerError) -> Self {
        let mut context = cors_context();
        context.insert(keys::REQUEST_ID.to_owned(), request_id.into());
        context.insert(keys::ERROR_CODE.to_owned(), reason.code().into());
        context.insert(
            keys::MESSAGE.to_owned(),
            format!("Rejected: {reason}").into(),
        );

        Self {
            principal_id: ANONYMOUS_PRINCIPAL.to_owned(),
            policy_document: GatewayPolicy::invoke(Effect::Deny, resource),
            context,
            usage_identifier_key: None,
            reason: Some(reason),
        }
    }

    #[must_use]
    pub fn effect(&self) -> Effect {
        self.policy_document
            .statement
            .first()
            .map_or(Effect::Deny, |statement| statement.effect)
    }

    #[must_use]
    pub fn is_allowed(&self) -> bool {
        self.effect() == Effect::Allow
    }

    /// Echoed method/resource identifier.
    #[must_use]
    pub fn resource(&self) -> Option<&str> {
        self.policy_document
            .statement
            .first()
            .and_then(|statement| statement.resource.first())
            .map(String::as_str)
    }

    /// Why the request was denied; `None` for allowed requests.
    #[must_use]
    pub fn reason(&self) -> Option<&AuthorizerError> {
        self.reason.as_ref()
    }

    /// Plain (non-secret) context entry.
    #[must_use]
    pub fn context_text(&self, key: &str) -> Option<&str> {
        match self.context.get(key)? {
            ContextValue::Text(text) => Some(text),
            ContextValue::Flag(_) | ContextValue::Secret(_) => None,
        }
    }
}

/// Context map pre-populated with the fixed CORS entries.
#[must_use]
pub fn cors_context() -> BTreeMap<String, ContextValue> {
    CORS_CONTEXT
        .iter()
        .map(|(key, value)| ((*key).to_owned(), ContextValue::from(*value)))
        .collect()
}
