//! Postgres-backed directory.
//!
//! Read-only adapter over the platform schema. Every query filters on the
//! `active` column; physical deletion never happens in this core.

use anyhow::Context;
use async_trait::async_trait;
use sqlx::postgres::PgPool;
use sqlx::Row;
use uuid::Uuid;

use mostrador_core::{
    AuthUserId, Directory, Organization, OrganizationId, Permission, PermissionId, Role,
    RoleAssignment, RoleId, RolePermission, StoreError, SystemUser, SystemUserId,
};

pub struct PostgresDirectory {
    pool: PgPool,
}

impl PostgresDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        let pool = PgPool::connect(database_url)
            .await
            .with_context(|| "failed to connect the directory pool")?;
        Ok(Self::new(pool))
    }
}

fn query_error(err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::PoolTimedOut | sqlx::Error::Io(_) => {
            StoreError::Unavailable(err.to_string())
        }
        other => StoreError::Query(other.to_string()),
    }
}

fn organization_from_row(row: &sqlx::postgres::PgRow) -> Result<Organization, StoreError> {
    Ok(Organization {
        id: OrganizationId::new(row.try_get::<i64, _>("id").map_err(query_error)?),
        name: row.try_get("name").map_err(query_error)?,
        active: row.try_get("active").map_err(query_error)?,
    })
}

fn role_from_row(row: &sqlx::postgres::PgRow) -> Result<Role, StoreError> {
    Ok(Role {
        id: RoleId::new(row.try_get::<i64, _>("id").map_err(query_error)?),
        name: row.try_get("name").map_err(query_error)?,
        active: row.try_get("active").map_err(query_error)?,
    })
}

fn permission_from_row(row: &sqlx::postgres::PgRow) -> Result<Permission, StoreError> {
    Ok(Permission {
        id: PermissionId::new(row.try_get::<i64, _>("id").map_err(query_error)?),
        name: row.try_get("name").map_err(query_error)?,
        active: row.try_get("active").map_err(query_error)?,
    })
}

#[async_trait]
impl Directory for PostgresDirectory {
    async fn system_user_by_auth_id(
        &self,
        auth_user_id: AuthUserId,
    ) -> Result<Option<SystemUser>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, auth_user_id, organization_id, active
            FROM system_users
            WHERE auth_user_id = $1 AND active = TRUE
            "#,
        )
        .bind(auth_user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(query_error)?;

        let Some(row) = row else {
            return Ok(None);
        };
        Ok(Some(SystemUser {
            id: SystemUserId::new(row.try_get::<i64, _>("id").map_err(query_error)?),
            auth_user_id: AuthUserId::from_uuid(
                row.try_get::<Uuid, _>("auth_user_id").map_err(query_error)?,
            ),
            organization_id: row
                .try_get::<Option<i64>, _>("organization_id")
                .map_err(query_error)?
                .map(OrganizationId::new),
            active: row.try_get("active").map_err(query_error)?,
        }))
    }

    async fn organization(&self, id: OrganizationId) -> Result<Option<Organization>, StoreError> {
        let row = sqlx::query("SELECT id, name, active FROM organizations WHERE id = $1")
            .bind(id.get())
            .fetch_optional(&self.pool)
            .await
            .map_err(query_error)?;

        row.as_ref().map(organization_from_row).transpose()
    }

    async fn active_organizations(&self) -> Result<Vec<Organization>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, name, active FROM organizations WHERE active = TRUE ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(query_error)?;

        rows.iter().map(organization_from_row).collect()
    }

    async fn role_assignments_for_user(
        &self,
        user_id: SystemUserId,
    ) -> Result<Vec<RoleAssignment>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT r.id, r.name, r.active, ra.active AS assignment_active
            FROM role_assignments ra
            JOIN roles r ON r.id = ra.role_id
            WHERE ra.user_id = $1 AND ra.active = TRUE
            "#,
        )
        .bind(user_id.get())
        .fetch_all(&self.pool)
        .await
        .map_err(query_error)?;

        rows.iter()
            .map(|row| {
                Ok(RoleAssignment {
                    role: role_from_row(row)?,
                    active: row.try_get("assignment_active").map_err(query_error)?,
                })
            })
            .collect()
    }

    async fn active_roles_by_names(&self, names: &[String]) -> Result<Vec<Role>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, name, active FROM roles WHERE active = TRUE AND name = ANY($1)",
        )
        .bind(names)
        .fetch_all(&self.pool)
        .await
        .map_err(query_error)?;

        rows.iter().map(role_from_row).collect()
    }

    async fn active_role_permissions(
        &self,
        role_ids: &[RoleId],
    ) -> Result<Vec<RolePermission>, StoreError> {
        let ids: Vec<i64> = role_ids.iter().map(|id| id.get()).collect();
        let rows = sqlx::query(
            r#"
            SELECT role_id, permission_id, active
            FROM role_permissions
            WHERE active = TRUE AND role_id = ANY($1)
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await
        .map_err(query_error)?;

        rows.iter()
            .map(|row| {
                Ok(RolePermission {
                    role_id: RoleId::new(row.try_get::<i64, _>("role_id").map_err(query_error)?),
                    permission_id: PermissionId::new(
                        row.try_get::<i64, _>("permission_id").map_err(query_error)?,
                    ),
                    active: row.try_get("active").map_err(query_error)?,
                })
            })
            .collect()
    }

    async fn active_permissions_by_ids(
        &self,
        ids: &[PermissionId],
    ) -> Result<Vec<Permission>, StoreError> {
        let ids: Vec<i64> = ids.iter().map(|id| id.get()).collect();
        let rows = sqlx::query(
            "SELECT id, name, active FROM permissions WHERE active = TRUE AND id = ANY($1)",
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await
        .map_err(query_error)?;

        rows.iter().map(permission_from_row).collect()
    }

    async fn active_permissions(&self) -> Result<Vec<Permission>, StoreError> {
        let rows = sqlx::query("SELECT id, name, active FROM permissions WHERE active = TRUE")
            .fetch_all(&self.pool)
            .await
            .map_err(query_error)?;

        rows.iter().map(permission_from_row).collect()
    }
}
