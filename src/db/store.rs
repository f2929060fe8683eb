use chrono::{DateTime, Utc};
use sqlx::{postgres::PgRow, FromRow, Postgres, Transaction};

use super::{
    query::{count_query, select_query},
    Database,
};
use crate::{
    error::Result,
    models::{Invitation, Tenant, TenantScope},
    pagination::{Listable, Predicate, QueryOptions},
    services::rate_limiter::RateLimitState,
};

/// Data-access capability consumed by list endpoints.
#[async_trait::async_trait]
pub trait RecordStore<R: Listable>: Send + Sync {
    async fn find(&self, scope: TenantScope, options: &QueryOptions) -> Result<Vec<R>>;

    async fn count(&self, scope: TenantScope, filter: Option<&Predicate>) -> Result<i64>;
}

#[async_trait::async_trait]
impl<R> RecordStore<R> for Database
where
    R: Listable + for<'r> FromRow<'r, PgRow> + Send + Unpin + 'static,
{
    async fn find(&self, scope: TenantScope, options: &QueryOptions) -> Result<Vec<R>> {
        let mut qb = select_query(R::schema(), scope, options);
        let rows = qb.build_query_as::<R>().fetch_all(self.pool()).await?;
        Ok(rows)
    }

    async fn count(&self, scope: TenantScope, filter: Option<&Predicate>) -> Result<i64> {
        let mut qb = count_query(R::schema(), scope, filter);
        let total: i64 = qb.build_query_scalar().fetch_one(self.pool()).await?;
        Ok(total)
    }
}

/// Opens the unit of work that guards invitation counters.
#[async_trait::async_trait]
pub trait InvitationStore: Send + Sync {
    async fn begin_invitations(&self) -> Result<Box<dyn InvitationTx>>;
}

/// Row access inside one transaction. Dropping it without `commit` rolls back.
#[async_trait::async_trait]
pub trait InvitationTx: Send {
    async fn lock_tenant(&mut self, scope: TenantScope) -> Result<Option<Tenant>>;

    async fn save_tenant_request_state(
        &mut self,
        scope: TenantScope,
        state: RateLimitState,
    ) -> Result<()>;

    async fn lock_invitation(
        &mut self,
        scope: TenantScope,
        invitation_id: i64,
    ) -> Result<Option<Invitation>>;

    async fn lock_invitation_by_phone(
        &mut self,
        scope: TenantScope,
        phone: &str,
    ) -> Result<Option<Invitation>>;

    async fn insert_invitation(
        &mut self,
        scope: TenantScope,
        phone: &str,
        name: Option<&str>,
        retry: RateLimitState,
        sent_at: DateTime<Utc>,
    ) -> Result<Invitation>;

    async fn mark_invitation_sent(
        &mut self,
        scope: TenantScope,
        invitation_id: i64,
        retry: RateLimitState,
        sent_at: DateTime<Utc>,
    ) -> Result<Invitation>;

    async fn commit(self: Box<Self>) -> Result<()>;
}

struct PgInvitationTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait::async_trait]
impl InvitationStore for Database {
    async fn begin_invitations(&self) -> Result<Box<dyn InvitationTx>> {
        let tx = self.begin().await?;
        Ok(Box::new(PgInvitationTx { tx }))
    }
}

#[async_trait::async_trait]
impl InvitationTx for PgInvitationTx {
    async fn lock_tenant(&mut self, scope: TenantScope) -> Result<Option<Tenant>> {
        super::lock_tenant(&mut self.tx, scope).await
    }

    async fn save_tenant_request_state(
        &mut self,
        scope: TenantScope,
        state: RateLimitState,
    ) -> Result<()> {
        super::save_tenant_request_state(&mut self.tx, scope, state).await
    }

    async fn lock_invitation(
        &mut self,
        scope: TenantScope,
        invitation_id: i64,
    ) -> Result<Option<Invitation>> {
        super::lock_invitation(&mut self.tx, scope, invitation_id).await
    }

    async fn lock_invitation_by_phone(
        &mut self,
        scope: TenantScope,
        phone: &str,
    ) -> Result<Option<Invitation>> {
        super::lock_invitation_by_phone(&mut self.tx, scope, phone).await
    }

    async fn insert_invitation(
        &mut self,
        scope: TenantScope,
        phone: &str,
        name: Option<&str>,
        retry: RateLimitState,
        sent_at: DateTime<Utc>,
    ) -> Result<Invitation> {
        super::insert_invitation(&mut self.tx, scope, phone, name, retry, sent_at).await
    }

    async fn mark_invitation_sent(
        &mut self,
        scope: TenantScope,
        invitation_id: i64,
        retry: RateLimitState,
        sent_at: DateTime<Utc>,
    ) -> Result<Invitation> {
        super::mark_invitation_sent(&mut self.tx, scope, invitation_id, retry, sent_at).await
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        self.tx.commit().await?;
        Ok(())
    }
}
