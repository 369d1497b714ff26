//! # Authentication
//!
//! Login against the `users` table and role gating for admin-only actions.
//!
//! Roles are plain strings. The service checks them with [`require_role`]
//! before an admin-only call; the core never looks at them.

use tally_core::{UserRecord, ROLE_ADMIN};
use tally_db::{Database, NewUser, UserRepository};
use tracing::{info, warn};

use crate::error::{PosError, PosResult};

/// Fails with `Forbidden` unless `user.role` is one of `allowed`.
pub fn require_role(user: &UserRecord, allowed: &[&str], action: &str) -> PosResult<()> {
    if user.has_role(allowed) {
        Ok(())
    } else {
        warn!(username = %user.username, role = %user.role, action = %action, "Access denied");
        Err(PosError::Forbidden {
            role: user.role.clone(),
            action: action.to_string(),
        })
    }
}

/// Login and account management.
#[derive(Debug, Clone)]
pub struct AuthService {
    users: UserRepository,
}

impl AuthService {
    pub fn new(db: &Database) -> Self {
        AuthService { users: db.users() }
    }

    /// Verifies credentials and returns the account.
    ///
    /// The account's `full_name` is what receipts print as the issuer.
    pub async fn authenticate(&self, username: &str, password: &str) -> PosResult<UserRecord> {
        match self.users.authenticate(username, password).await? {
            Some(user) => {
                info!(username = %user.username, role = %user.role, "User logged in");
                Ok(user)
            }
            None => {
                warn!(username = %username, "Login failed");
                Err(PosError::AuthenticationFailed)
            }
        }
    }

    /// Creates an account. Admin only.
    pub async fn create_user(
        &self,
        admin: &UserRecord,
        new_user: &NewUser,
    ) -> PosResult<UserRecord> {
        require_role(admin, &[ROLE_ADMIN], "create users")?;

        let user = self.users.create(new_user).await?;
        info!(admin = %admin.username, username = %user.username, "Account created");
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tally_core::ROLE_CASHIER;
    use tally_db::DbConfig;

    fn new_user(username: &str, role: &str) -> NewUser {
        NewUser {
            username: username.to_string(),
            full_name: format!("{} Person", username),
            password: "long-enough".to_string(),
            role: role.to_string(),
        }
    }

    #[tokio::test]
    async fn test_authenticate() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.users().create(&new_user("admin", ROLE_ADMIN)).await.unwrap();
        let auth = AuthService::new(&db);

        let user = auth.authenticate("admin", "long-enough").await.unwrap();
        assert_eq!(user.full_name, "admin Person");

        assert!(matches!(
            auth.authenticate("admin", "nope").await,
            Err(PosError::AuthenticationFailed)
        ));
        assert!(matches!(
            auth.authenticate("ghost", "long-enough").await,
            Err(PosError::AuthenticationFailed)
        ));
    }

    #[tokio::test]
    async fn test_only_admin_creates_users() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let admin = db.users().create(&new_user("admin", ROLE_ADMIN)).await.unwrap();
        let cashier = db.users().create(&new_user("bola", ROLE_CASHIER)).await.unwrap();
        let auth = AuthService::new(&db);

        assert!(matches!(
            auth.create_user(&cashier, &new_user("chidi", ROLE_CASHIER)).await,
            Err(PosError::Forbidden { .. })
        ));

        let created = auth
            .create_user(&admin, &new_user("chidi", ROLE_CASHIER))
            .await
            .unwrap();
        assert_eq!(created.role, ROLE_CASHIER);
    }

    #[test]
    fn test_require_role() {
        let user = UserRecord {
            id: "1".into(),
            username: "bola".into(),
            full_name: "Bola Ade".into(),
            role: ROLE_CASHIER.into(),
        };
        assert!(require_role(&user, &[ROLE_ADMIN, ROLE_CASHIER], "issue receipts").is_ok());
        assert!(require_role(&user, &[ROLE_ADMIN], "view receipt history").is_err());
    }
}
