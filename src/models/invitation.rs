use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::pagination::{Field, FieldKind, Listable, Resource, ResourceSchema, SortDirection, Value};
use crate::services::rate_limiter::RateLimitState;

// ==================== INVITATION ====================
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Invitation {
    pub id: i64,
    pub tenant_id: i64,
    pub phone: String,
    pub name: Option<String>,
    pub status: String,
    pub retry_count: i32,
    pub retry_reset_at: DateTime<Utc>,
    pub last_sent_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Invitation {
    pub fn retry_state(&self) -> RateLimitState {
        RateLimitState {
            attempts_today: self.retry_count,
            last_attempt_or_reset_at: self.retry_reset_at,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateInvitationRequest {
    pub phone: String,
    pub name: Option<String>,
}

pub static INVITATION_SCHEMA: ResourceSchema = ResourceSchema {
    table: "invitations",
    fields: &[
        Field::sortable("id", "id", FieldKind::Integer),
        Field::sortable("phone", "phone", FieldKind::Text),
        Field::new("name", "name", FieldKind::Text),
        Field::new("status", "status", FieldKind::Text),
        Field::new("retryCount", "retry_count", FieldKind::Integer),
        Field::sortable("lastSentAt", "last_sent_at", FieldKind::Timestamp),
        Field::sortable("createdAt", "created_at", FieldKind::Timestamp),
    ],
    default_sort: "createdAt",
    default_direction: SortDirection::Desc,
};

impl Listable for Invitation {
    const RESOURCE: Resource = Resource::Invitations;

    fn id(&self) -> i64 {
        self.id
    }

    fn value_of(&self, field: &str) -> Option<Value> {
        match field {
            "id" => Some(self.id.into()),
            "phone" => Some(self.phone.clone().into()),
            "name" => self.name.clone().map(Value::from),
            "status" => Some(self.status.clone().into()),
            "retryCount" => Some(i64::from(self.retry_count).into()),
            "lastSentAt" => Some(self.last_sent_at.into()),
            "createdAt" => Some(self.created_at.into()),
            _ => None,
        }
    }
}
