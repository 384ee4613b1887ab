//! The authenticated caller, threaded through every store/pipeline/mcp
//! call that needs to check tenant scope.

use std::collections::HashSet;

use crate::ids::TenantId;

#[derive(Debug, Clone)]
pub struct Principal {
    pub tenant_id: TenantId,
    pub subject: String,
    pub scopes: HashSet<String>,
    pub roles: HashSet<String>,
}

impl Principal {
    pub fn has_scope(&self, scope: &str) -> bool {
        self.scopes.contains(scope)
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.contains(role)
    }

    /// Service-to-service principal used by background workers and the
    /// CLI, scoped to a single tenant and trusted with every scope.
    pub fn system(tenant_id: TenantId) -> Self {
        Self {
            tenant_id,
            subject: "system".to_string(),
            scopes: HashSet::from(["*".to_string()]),
            roles: HashSet::from(["system".to_string()]),
        }
    }
}
