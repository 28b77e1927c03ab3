use serde::{Deserialize, Serialize};

use crate::TenantId;

/// A signed-in user context known to an identity provider
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    /// Identifier of the account across all tenants
    pub home_account_id: String,
    /// Identifier of the account within its tenant
    pub local_account_id: String,
    /// The identity provider environment that issued the account
    pub environment: String,
    /// The tenant that the account belongs to
    pub tenant_id: TenantId,
    /// The user's sign-in name
    pub username: String,
    /// A display name, if the provider reported one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_camel_case_fields() {
        let json = r#"{
            "homeAccountId": "home",
            "localAccountId": "local",
            "environment": "login.example.com",
            "tenantId": "test-tenant",
            "username": "user@example.com"
        }"#;

        let account: Account = serde_json::from_str(json).unwrap();
        assert_eq!(account.tenant_id, TenantId::from_static("test-tenant"));
        assert_eq!(account.name, None);

        let value = serde_json::to_value(&account).unwrap();
        assert_eq!(value["homeAccountId"], "home");
        assert!(value.get("name").is_none());
    }
}
