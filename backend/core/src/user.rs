//! The authenticated console user, as returned by the management API.

use serde::{Deserialize, Serialize};

use crate::crud::{flatten, CrudMap};
use crate::types::{PermissionString, Scope};

/// A role held by the user within one scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRole {
    pub scope: Scope,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub permissions: CrudMap,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub roles: Vec<UserRole>,
}

impl User {
    /// Flattened permissions of every organization-scoped role.
    pub fn organization_permissions(&self) -> Vec<PermissionString> {
        self.roles
            .iter()
            .filter(|role| role.scope == Scope::Organization)
            .flat_map(|role| flatten(Scope::Organization, &role.permissions))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn only_organization_roles_contribute() {
        let user: User = serde_json::from_value(json!({
            "id": "u-1",
            "displayName": "Jane",
            "roles": [
                { "scope": "ORGANIZATION", "name": "ADMIN", "permissions": { "USER": ["C", "R"] } },
                { "scope": "ENVIRONMENT", "name": "USER", "permissions": { "API": ["R"] } }
            ]
        }))
        .unwrap();

        let perms = user.organization_permissions();
        assert_eq!(
            perms,
            vec![
                PermissionString::from("organization-user-c"),
                PermissionString::from("organization-user-r"),
            ]
        );
    }

    #[test]
    fn user_without_roles_has_no_permissions() {
        let user: User = serde_json::from_value(json!({ "id": "u-2" })).unwrap();
        assert!(user.organization_permissions().is_empty());
    }
}
