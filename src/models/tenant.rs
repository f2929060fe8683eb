use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::services::rate_limiter::RateLimitState;

// ==================== TENANT ====================
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Tenant {
    pub id: i64,
    pub name: String,
    pub daily_request_count: i32,
    pub daily_request_reset_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Tenant {
    pub fn request_state(&self) -> RateLimitState {
        RateLimitState {
            attempts_today: self.daily_request_count,
            last_attempt_or_reset_at: self.daily_request_reset_at,
        }
    }
}

/// Every data-access call carries the tenant it is scoped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TenantScope {
    pub tenant_id: i64,
}

impl TenantScope {
    pub fn new(tenant_id: i64) -> Self {
        Self { tenant_id }
    }
}
