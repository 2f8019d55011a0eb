//! Well-known role name constants.
//!
//! These must match the `CHECK` constraint on `users.role`.

pub const ROLE_USER: &str = "user";
pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_SUPERADMIN: &str = "superadmin";

pub const VALID_ROLES: &[&str] = &[ROLE_USER, ROLE_ADMIN, ROLE_SUPERADMIN];

/// Whether `role` grants access to the admin surface.
pub fn is_admin_role(role: &str) -> bool {
    role == ROLE_ADMIN || role == ROLE_SUPERADMIN
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_and_superadmin_are_admin_roles() {
        assert!(is_admin_role(ROLE_ADMIN));
        assert!(is_admin_role(ROLE_SUPERADMIN));
        assert!(!is_admin_role(ROLE_USER));
        assert!(!is_admin_role("Admin"));
    }
}
