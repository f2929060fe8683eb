use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::{
    config::Config,
    constants::INVITATION_STATUS_ACCEPTED,
    db::InvitationStore,
    error::{AppError, Result},
    models::{CreateInvitationRequest, Invitation, TenantScope},
    services::rate_limiter::{Clock, DailyLimit, RateLimitState},
};

const REQUEST_LIMIT_REASON: &str = "Daily invitation request limit reached for this church";
const RETRY_LIMIT_REASON: &str = "Daily retry limit reached for this invitation";

/// How a new invitation request lands on the `invitations` table.
#[derive(Debug, Clone, PartialEq)]
enum RequestPlan {
    Insert,
    Resend { invitation_id: i64, retry: RateLimitState },
}

/// Keeps a leading `+` and digits; rejects anything too short to be a phone number.
pub fn normalize_phone(raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    let mut normalized = String::with_capacity(trimmed.len());
    if trimmed.starts_with('+') {
        normalized.push('+');
    }
    normalized.extend(trimmed.chars().filter(|c| c.is_ascii_digit()));

    let digits = normalized.trim_start_matches('+').len();
    if !(7..=15).contains(&digits) {
        return Err(AppError::BadRequest(format!("Invalid phone number: {}", raw)));
    }
    Ok(normalized)
}

pub struct InvitationService {
    store: Arc<dyn InvitationStore>,
    clock: Arc<dyn Clock>,
    request_limit: DailyLimit,
    retry_limit: DailyLimit,
}

impl InvitationService {
    pub fn new(store: Arc<dyn InvitationStore>, config: &Config, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            request_limit: DailyLimit::new(
                config.invitation_daily_request_limit,
                REQUEST_LIMIT_REASON,
                config.rate_limit_utc_offset,
            ),
            retry_limit: DailyLimit::new(
                config.invitation_daily_retry_limit,
                RETRY_LIMIT_REASON,
                config.rate_limit_utc_offset,
            ),
        }
    }

    /// Sends an invitation, charged against the tenant's daily counter.
    ///
    /// A pending invitation for the same phone is re-sent instead of duplicated,
    /// and that re-send is also charged against the invitation's retry counter.
    pub async fn request(
        &self,
        scope: TenantScope,
        input: CreateInvitationRequest,
    ) -> Result<Invitation> {
        let phone = normalize_phone(&input.phone)?;
        let name = input
            .name
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty());
        let now = self.clock.now();

        let mut tx = self.store.begin_invitations().await?;
        let tenant = tx
            .lock_tenant(scope)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Tenant {}", scope.tenant_id)))?;

        let tenant_state = self
            .request_limit
            .attempt(tenant.request_state(), now)
            .inspect_err(|_| {
                tracing::warn!(
                    "Tenant {} hit the daily invitation limit ({})",
                    scope.tenant_id,
                    self.request_limit.limit()
                )
            })?;

        let existing = tx.lock_invitation_by_phone(scope, &phone).await?;
        let invitation = match self.plan_request(existing.as_ref(), now)? {
            RequestPlan::Insert => {
                tx.insert_invitation(scope, &phone, name, RateLimitState::fresh(now), now)
                    .await?
            }
            RequestPlan::Resend {
                invitation_id,
                retry,
            } => tx.mark_invitation_sent(scope, invitation_id, retry, now).await?,
        };
        tx.save_tenant_request_state(scope, tenant_state).await?;
        tx.commit().await?;

        tracing::info!(
            "Invitation {} dispatched for tenant {} ({} request(s) today)",
            invitation.id,
            scope.tenant_id,
            tenant_state.attempts_today
        );
        Ok(invitation)
    }

    /// Re-sends an existing invitation, charged against that invitation's retry counter.
    pub async fn retry(&self, scope: TenantScope, invitation_id: i64) -> Result<Invitation> {
        let now = self.clock.now();

        let mut tx = self.store.begin_invitations().await?;
        let invitation = tx
            .lock_invitation(scope, invitation_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Invitation {}", invitation_id)))?;
        ensure_not_accepted(&invitation)?;

        let retry = self.charge_retry(&invitation, now)?;
        let updated = tx.mark_invitation_sent(scope, invitation_id, retry, now).await?;
        tx.commit().await?;

        tracing::info!(
            "Invitation {} re-sent for tenant {} (retry {} today)",
            invitation_id,
            scope.tenant_id,
            retry.attempts_today
        );
        Ok(updated)
    }

    fn plan_request(&self, existing: Option<&Invitation>, now: DateTime<Utc>) -> Result<RequestPlan> {
        let Some(invitation) = existing else {
            return Ok(RequestPlan::Insert);
        };
        ensure_not_accepted(invitation)?;
        Ok(RequestPlan::Resend {
            invitation_id: invitation.id,
            retry: self.charge_retry(invitation, now)?,
        })
    }

    fn charge_retry(&self, invitation: &Invitation, now: DateTime<Utc>) -> Result<RateLimitState> {
        self.retry_limit
            .attempt(invitation.retry_state(), now)
            .inspect_err(|_| {
                tracing::warn!("Invitation {} hit the daily retry limit", invitation.id)
            })
    }
}

fn ensure_not_accepted(invitation: &Invitation) -> Result<()> {
    if invitation.status == INVITATION_STATUS_ACCEPTED {
        return Err(AppError::BadRequest(format!(
            "Invitation {} was already accepted",
            invitation.id
        )));
    }
    Ok(())
}
