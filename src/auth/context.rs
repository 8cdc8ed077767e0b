use crate::errors::ServiceError;
use crate::types::{Permission, UserRole};
use uuid::Uuid;

/// Represents the authentication context for the current operation.
/// Constructed by the HTTP façade after token verification and passed
/// explicitly into every service call.
#[derive(Debug, Clone)]
pub struct AuthContext {
    /// The ID of the authenticated user
    pub user_id: Uuid,

    /// The role of the authenticated user
    pub role: UserRole,
}

impl AuthContext {
    /// Create a new authentication context
    pub fn new(user_id: Uuid, role: UserRole) -> Self {
        Self { user_id, role }
    }

    /// Create a context for internal system operations
    pub fn internal_system_context() -> Self {
        Self {
            user_id: Uuid::nil(),
            role: UserRole::Admin,
        }
    }

    /// Check if user has a specific permission
    pub fn has_permission(&self, permission: Permission) -> bool {
        self.role.has_permission(permission)
    }

    /// Authorize a specific permission, returning an error if not allowed
    pub fn authorize(&self, permission: Permission) -> Result<(), ServiceError> {
        if self.has_permission(permission) {
            Ok(())
        } else {
            Err(ServiceError::PermissionDenied(format!(
                "User does not have permission: {:?}",
                permission
            )))
        }
    }

    /// Verify user is an admin
    pub fn authorize_admin(&self) -> Result<(), ServiceError> {
        if matches!(self.role, UserRole::Admin) {
            Ok(())
        } else {
            Err(ServiceError::PermissionDenied(
                "This action requires administrator privileges".to_string(),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authorize() {
        let ctx = AuthContext::new(Uuid::new_v4(), UserRole::Receptionist);
        assert!(ctx.authorize(Permission::ManagePatients).is_ok());
        assert!(ctx.authorize(Permission::ManageClinicalRecords).is_err());
        assert!(ctx.authorize_admin().is_err());

        let admin = AuthContext::internal_system_context();
        assert!(admin.authorize_admin().is_ok());
    }
}
