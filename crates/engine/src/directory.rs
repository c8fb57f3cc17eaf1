use sqlx::PgPool;
use uuid::Uuid;

use infra::models::RoleProfile;
use infra::repos::users::{self, UserRepo, UserRole};

use crate::error::{Result, WorkflowError};

/// Read-only identity/role lookup consumed by the workflows. Authentication
/// itself lives outside this crate; approval authority does not, so the
/// workflows gate actions on the roles resolved here.
#[derive(Clone)]
pub struct AccountDirectory {
    pool: PgPool,
}

impl AccountDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn resolve_role(&self, user_id: Uuid) -> Result<UserRole> {
        users::get_role(&self.pool, user_id)
            .await?
            .ok_or(WorkflowError::AccountNotFound {
                account_id: user_id,
            })
    }

    /// Active admin account ids, sorted by id so the creation-fee split
    /// produces the same audit trail on every run.
    pub async fn list_admins(&self) -> Result<Vec<Uuid>> {
        Ok(users::list_admin_ids(&self.pool).await?)
    }

    pub async fn profile(&self, user_id: Uuid) -> Result<Option<RoleProfile>> {
        let user = UserRepo::new(self.pool.clone())
            .get_by_id(user_id)
            .await?
            .ok_or(WorkflowError::AccountNotFound {
                account_id: user_id,
            })?;

        user.role_profile()
            .map_err(|e| WorkflowError::Validation(format!("malformed profile payload: {e}")))
    }

    pub async fn ensure_role(
        &self,
        user_id: Uuid,
        role: UserRole,
        action: &'static str,
    ) -> Result<()> {
        if self.resolve_role(user_id).await? != role {
            return Err(WorkflowError::Forbidden { user_id, action });
        }
        Ok(())
    }
}
