//! Access-control documents passed to the credential exchange.
//!
//! The document serialises to the standard JSON grant layout:
//!
//! ```json
//! {
//!   "Version": "2012-10-17",
//!   "Statement": [{
//!     "Effect": "Allow",
//!     "Action": ["dynamodb:GetItem"],
//!     "Resource": ["arn:aws:dynamodb:eu-west-2:111122223333:table/SharedServices"],
//!     "Condition": {
//!       "ForAllValues:StringEquals": { "dynamodb:LeadingKeys": ["TENANT#T1"] }
//!     }
//!   }]
//! }
//! ```

use std::collections::BTreeSet;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

pub const POLICY_VERSION: &str = "2012-10-17";

/// Condition key restricting the partition keys an item operation may touch.
pub const LEADING_KEYS_CONDITION_KEY: &str = "dynamodb:LeadingKeys";

/// Prefix of every tenant partition key in the shared table.
pub const TENANT_PARTITION_PREFIX: &str = "TENANT#";

/// Partition key of a tenant: `TENANT#<tenantId>`.
#[must_use]
pub fn tenant_partition(tenant_id: &str) -> String {
    format!("{TENANT_PARTITION_PREFIX}{tenant_id}")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Effect {
    Allow,
    Deny,
}

/// Set operator applied to the condition key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionOperator {
    /// Every requested leading key equals one of the values.
    ForAllValuesStringEquals,
    /// Every requested leading key matches one of the (wildcard) patterns.
    ForAllValuesStringLike,
}

impl ConditionOperator {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ForAllValuesStringEquals => "ForAllValues:StringEquals",
            Self::ForAllValuesStringLike => "ForAllValues:StringLike",
        }
    }
}

/// Predicate scoping a statement to one tenant's logical partition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantCondition {
    pub operator: ConditionOperator,
    pub key: String,
    pub values: Vec<String>,
}

impl TenantCondition {
    /// Leading key must equal `TENANT#<tenantId>`.
    #[must_use]
    pub fn leading_key_equals(tenant_id: &str) -> Self {
        Self {
            operator: ConditionOperator::ForAllValuesStringEquals,
            key: LEADING_KEYS_CONDITION_KEY.to_owned(),
            values: vec![tenant_partition(tenant_id)],
        }
    }

    /// Leading key must be `TENANT#<tenantId>` or start with `TENANT#<tenantId>#`.
    ///
    /// The delimiter keeps `TENANT#T1` from matching the sibling `TENANT#T10`.
    #[must_use]
    pub fn leading_key_prefix(tenant_id: &str) -> Self {
        let partition = tenant_partition(tenant_id);
        Self {
            operator: ConditionOperator::ForAllValuesStringLike,
            key: LEADING_KEYS_CONDITION_KEY.to_owned(),
            values: vec![partition.clone(), format!("{partition}#*")],
        }
    }

    /// Whether this condition confines matched keys to the given tenant.
    #[must_use]
    pub fn scopes_to_tenant(&self, tenant_id: &str) -> bool {
        let partition = tenant_partition(tenant_id);
        let delimited = format!("{partition}#");
        self.key == LEADING_KEYS_CONDITION_KEY
            && self.values.contains(&partition)
            && self
                .values
                .iter()
                .all(|value| *value == partition || value.starts_with(&delimited))
    }
}

impl Serialize for TenantCondition {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        struct KeyValues<'a>(&'a str, &'a [String]);

        impl Serialize for KeyValues<'_> {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry(self.0, self.1)?;
                map.end()
            }
        }

        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(self.operator.as_str(), &KeyValues(&self.key, &self.values))?;
        map.end()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PolicyStatement {
    pub effect: Effect,
    #[serde(rename = "Action")]
    pub actions: BTreeSet<String>,
    #[serde(rename = "Resource")]
    pub resources: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<TenantCondition>,
}

impl PolicyStatement {
    #[must_use]
    pub fn is_permissive(&self) -> bool {
        self.effect == Effect::Allow && !self.actions.is_empty() && !self.resources.is_empty()
    }
}

/// Ordered list of statements granted to one request's credentials.
///
/// An empty document grants nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct AccessPolicyDocument {
    version: &'static str,
    #[serde(rename = "Statement")]
    statements: Vec<PolicyStatement>,
}

impl Default for AccessPolicyDocument {
    fn default() -> Self {
        Self::empty()
    }
}

impl AccessPolicyDocument {
    /// A document without statements: deny by default.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            version: POLICY_VERSION,
            statements: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_statements(statements: Vec<PolicyStatement>) -> Self {
        Self {
            version: POLICY_VERSION,
            statements,
        }
    }

    #[must_use]
    pub fn version(&self) -> &str {
        self.version
    }

    #[must_use]
    pub fn statements(&self) -> &[PolicyStatement] {
        &self.statements
    }

    /// Whether at least one statement grants something.
    #[must_use]
    pub fn grants_anything(&self) -> bool {
        self.statements.iter().any(PolicyStatement::is_permissive)
    }

    /// Compact JSON form handed to the credential exchange.
    ///
    /// # Errors
    ///
    /// Returns an error only if serialisation fails, which the document's
    /// plain string content does not produce in practice.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
