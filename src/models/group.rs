use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::pagination::{Field, FieldKind, Listable, Resource, ResourceSchema, SortDirection, Value};

// ==================== GROUP ====================
// Hierarchy is a plain parent id; children are fetched with their own query.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub id: i64,
    pub tenant_id: i64,
    pub name: String,
    pub parent_group_id: Option<i64>,
    pub member_count: i64,
    pub created_at: DateTime<Utc>,
}

pub static GROUP_SCHEMA: ResourceSchema = ResourceSchema {
    table: "groups",
    fields: &[
        Field::sortable("id", "id", FieldKind::Integer),
        Field::sortable("name", "name", FieldKind::Text),
        Field::new("parentGroupId", "parent_group_id", FieldKind::Integer),
        Field::sortable("memberCount", "member_count", FieldKind::Integer),
        Field::sortable("createdAt", "created_at", FieldKind::Timestamp),
    ],
    default_sort: "name",
    default_direction: SortDirection::Asc,
};

impl Listable for Group {
    const RESOURCE: Resource = Resource::Groups;

    fn id(&self) -> i64 {
        self.id
    }

    fn value_of(&self, field: &str) -> Option<Value> {
        match field {
            "id" => Some(self.id.into()),
            "name" => Some(self.name.clone().into()),
            "parentGroupId" => self.parent_group_id.map(Value::from),
            "memberCount" => Some(self.member_count.into()),
            "createdAt" => Some(self.created_at.into()),
            _ => None,
        }
    }
}
