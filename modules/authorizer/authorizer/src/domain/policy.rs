//! Tenant-scoped policy synthesis.
//!
//! The synthesized document is presented as the session policy of the
//! credential exchange, so tenant isolation holds at the credential layer:
//! whatever the downstream handler does, the issued credentials cannot touch
//! another tenant's partition.

use std::collections::BTreeSet;

use authorizer_sdk::UserRole;
use authorizer_sdk::policy::{AccessPolicyDocument, Effect, PolicyStatement, TenantCondition};

/// Service identifier whose data lives in the shared multi-tenant table.
pub const SHARED_SERVICES: &str = "SharedServices";

/// Item operations granted by every permissive statement.
pub const DATA_ACTIONS: [&str; 8] = [
    "dynamodb:BatchGetItem",
    "dynamodb:BatchWriteItem",
    "dynamodb:DeleteItem",
    "dynamodb:GetItem",
    "dynamodb:PutItem",
    "dynamodb:Query",
    "dynamodb:Scan",
    "dynamodb:UpdateItem",
];

/// Pure mapping from caller attributes to a least-privilege document.
#[derive(Debug, Clone)]
pub struct PolicySynthesizer {
    shared_table: String,
}

impl PolicySynthesizer {
    #[must_use]
    pub fn new(shared_table: impl Into<String>) -> Self {
        Self {
            shared_table: shared_table.into(),
        }
    }

    /// Build the document for one caller. Deterministic, no I/O.
    ///
    /// Roles without a grant get an empty document.
    #[must_use]
    pub fn synthesize(
        &self,
        role: &UserRole,
        tenant_id: &str,
        service_id: &str,
        region: &str,
        account_id: &str,
    ) -> AccessPolicyDocument {
        match role {
            // Full operational access to every table in the account/region.
            UserRole::SystemAdmin => AccessPolicyDocument::with_statements(vec![data_statement(
                table_arn(region, account_id, "*"),
                None,
            )]),
            UserRole::TenantAdmin if service_id == SHARED_SERVICES => {
                AccessPolicyDocument::with_statements(vec![data_statement(
                    table_arn(region, account_id, &self.shared_table),
                    Some(TenantCondition::leading_key_equals(tenant_id)),
                )])
            }
            // Dedicated-tenant resources have no grant yet.
            UserRole::TenantAdmin => AccessPolicyDocument::empty(),
            UserRole::TenantUser => AccessPolicyDocument::with_statements(vec![data_statement(
                table_arn(region, account_id, &self.shared_table),
                Some(TenantCondition::leading_key_prefix(tenant_id)),
            )]),
            UserRole::CustomerSupport | UserRole::Unrecognized(_) => AccessPolicyDocument::empty(),
        }
    }
}

fn table_arn(region: &str, account_id: &str, table: &str) -> String {
    format!("arn:aws:dynamodb:{region}:{account_id}:table/{table}")
}

fn data_statement(resource: String, condition: Option<TenantCondition>) -> PolicyStatement {
    PolicyStatement {
        effect: Effect::Allow,
        actions: DATA_ACTIONS.iter().map(|action| (*action).to_owned()).collect::<BTreeSet<_>>(),
        resources: vec![resource],
        condition,
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use authorizer_sdk::policy::ConditionOperator;

    const REGION: &str = "eu-west-2";
    const ACCOUNT: &str = "111122223333";

    fn synth(role: &UserRole, service: &str) -> AccessPolicyDocument {
        PolicySynthesizer::new("SharedServices").synthesize(role, "T1", service, REGION, ACCOUNT)
    }

    #[test]
    fn system_admin_gets_unconditioned_account_wide_grant() {
        let doc = synth(&UserRole::SystemAdmin, SHARED_SERVICES);

        let [statement] = doc.statements() else {
            panic!("expected exactly one statement");
        };
        assert!(statement.condition.is_none());
        assert_eq!(
            statement.resources,
            vec!["arn:aws:dynamodb:eu-west-2:111122223333:table/*"]
        );
        assert_eq!(statement.actions.len(), DATA_ACTIONS.len());
    }

    #[test]
    fn tenant_admin_on_shared_services_is_scoped_by_equality() {
        let doc = synth(&UserRole::TenantAdmin, SHARED_SERVICES);

        let [statement] = doc.statements() else {
            panic!("expected exactly one statement");
        };
        let condition = statement.condition.as_ref().unwrap();
        assert_eq!(condition.operator, ConditionOperator::ForAllValuesStringEquals);
        assert_eq!(condition.values, vec!["TENANT#T1"]);
        assert_eq!(
            statement.resources,
            vec!["arn:aws:dynamodb:eu-west-2:111122223333:table/SharedServices"]
        );
    }

    #[test]
    fn tenant_admin_on_dedicated_service_gets_nothing() {
        let doc = synth(&UserRole::TenantAdmin, "DedicatedTenantServices");

        assert!(doc.statements().is_empty());
        assert!(!doc.grants_anything());
    }

    #[test]
    fn tenant_user_is_scoped_by_delimited_prefix() {
        let doc = synth(&UserRole::TenantUser, SHARED_SERVICES);

        let [statement] = doc.statements() else {
            panic!("expected exactly one statement");
        };
        let condition = statement.condition.as_ref().unwrap();
        assert_eq!(condition.operator, ConditionOperator::ForAllValuesStringLike);
        assert!(condition.scopes_to_tenant("T1"));
        assert!(!condition.scopes_to_tenant("T10"));
    }

    #[test]
    fn tenant_user_scope_ignores_service() {
        assert_eq!(
            synth(&UserRole::TenantUser, "Anything"),
            synth(&UserRole::TenantUser, SHARED_SERVICES)
        );
    }

    #[test]
    fn support_and_unknown_roles_get_nothing() {
        for role in [
            UserRole::CustomerSupport,
            UserRole::Unrecognized("Auditor".to_owned()),
            UserRole::Unrecognized(String::new()),
        ] {
            let doc = synth(&role, SHARED_SERVICES);
            assert!(
                doc.statements().iter().all(|s| !s.is_permissive()),
                "{role} must not be granted anything"
            );
        }
    }
}
