pub mod query;
pub mod store;

use chrono::{DateTime, Utc};
use sqlx::{postgres::PgPoolOptions, PgConnection, PgPool, Postgres, Transaction};

use crate::{
    config::Config,
    error::Result,
    models::{Group, Invitation, Tenant, TenantScope},
    services::rate_limiter::RateLimitState,
};

pub use store::{InvitationStore, InvitationTx, RecordStore};

#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    pub async fn new(config: &Config) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .connect(&config.database_url)
            .await?;

        Ok(Self { pool })
    }

    pub async fn run_migrations(&self) -> anyhow::Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn begin(&self) -> Result<Transaction<'static, Postgres>> {
        Ok(self.pool.begin().await?)
    }
}

// ==================== TENANT QUERIES ====================
/// Row-locks the tenant so its request counter is read and written by one attempt at a time.
pub async fn lock_tenant(conn: &mut PgConnection, scope: TenantScope) -> Result<Option<Tenant>> {
    let tenant = sqlx::query_as::<_, Tenant>("SELECT * FROM tenants WHERE id = $1 FOR UPDATE")
        .bind(scope.tenant_id)
        .fetch_optional(conn)
        .await?;
    Ok(tenant)
}

pub async fn save_tenant_request_state(
    conn: &mut PgConnection,
    scope: TenantScope,
    state: RateLimitState,
) -> Result<()> {
    sqlx::query(
        "UPDATE tenants
         SET daily_request_count = $2, daily_request_reset_at = $3
         WHERE id = $1",
    )
    .bind(scope.tenant_id)
    .bind(state.attempts_today)
    .bind(state.last_attempt_or_reset_at)
    .execute(conn)
    .await?;
    Ok(())
}

// ==================== GROUP QUERIES ====================
impl Database {
    pub async fn get_group(&self, scope: TenantScope, group_id: i64) -> Result<Option<Group>> {
        let group = sqlx::query_as::<_, Group>(
            "SELECT * FROM groups WHERE tenant_id = $1 AND id = $2",
        )
        .bind(scope.tenant_id)
        .bind(group_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(group)
    }

    pub async fn list_child_groups(&self, scope: TenantScope, parent_id: i64) -> Result<Vec<Group>> {
        let groups = sqlx::query_as::<_, Group>(
            "SELECT * FROM groups
             WHERE tenant_id = $1 AND parent_group_id = $2
             ORDER BY name ASC, id ASC",
        )
        .bind(scope.tenant_id)
        .bind(parent_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(groups)
    }
}

// ==================== INVITATION QUERIES ====================
pub async fn lock_invitation(
    conn: &mut PgConnection,
    scope: TenantScope,
    invitation_id: i64,
) -> Result<Option<Invitation>> {
    let invitation = sqlx::query_as::<_, Invitation>(
        "SELECT * FROM invitations WHERE tenant_id = $1 AND id = $2 FOR UPDATE",
    )
    .bind(scope.tenant_id)
    .bind(invitation_id)
    .fetch_optional(conn)
    .await?;
    Ok(invitation)
}

pub async fn lock_invitation_by_phone(
    conn: &mut PgConnection,
    scope: TenantScope,
    phone: &str,
) -> Result<Option<Invitation>> {
    let invitation = sqlx::query_as::<_, Invitation>(
        "SELECT * FROM invitations WHERE tenant_id = $1 AND phone = $2 FOR UPDATE",
    )
    .bind(scope.tenant_id)
    .bind(phone)
    .fetch_optional(conn)
    .await?;
    Ok(invitation)
}

pub async fn insert_invitation(
    conn: &mut PgConnection,
    scope: TenantScope,
    phone: &str,
    name: Option<&str>,
    retry: RateLimitState,
    sent_at: DateTime<Utc>,
) -> Result<Invitation> {
    let invitation = sqlx::query_as::<_, Invitation>(
        r#"
        INSERT INTO invitations
            (tenant_id, phone, name, status, retry_count, retry_reset_at, last_sent_at, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $7)
        RETURNING *
        "#,
    )
    .bind(scope.tenant_id)
    .bind(phone)
    .bind(name)
    .bind(crate::constants::INVITATION_STATUS_PENDING)
    .bind(retry.attempts_today)
    .bind(retry.last_attempt_or_reset_at)
    .bind(sent_at)
    .fetch_one(conn)
    .await?;
    Ok(invitation)
}

pub async fn mark_invitation_sent(
    conn: &mut PgConnection,
    scope: TenantScope,
    invitation_id: i64,
    retry: RateLimitState,
    sent_at: DateTime<Utc>,
) -> Result<Invitation> {
    let invitation = sqlx::query_as::<_, Invitation>(
        r#"
        UPDATE invitations
        SET retry_count = $3, retry_reset_at = $4, last_sent_at = $5
        WHERE tenant_id = $1 AND id = $2
        RETURNING *
        "#,
    )
    .bind(scope.tenant_id)
    .bind(invitation_id)
    .bind(retry.attempts_today)
    .bind(retry.last_attempt_or_reset_at)
    .bind(sent_at)
    .fetch_one(conn)
    .await?;
    Ok(invitation)
}
