use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::pagination::{Field, FieldKind, Listable, Resource, ResourceSchema, SortDirection, Value};

// ==================== MEMBER ====================
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub id: i64,
    pub tenant_id: i64,
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub group_id: Option<i64>,
    pub is_baptized: bool,
    pub registered_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

pub static MEMBER_SCHEMA: ResourceSchema = ResourceSchema {
    table: "members",
    fields: &[
        Field::sortable("id", "id", FieldKind::Integer),
        Field::sortable("name", "name", FieldKind::Text),
        Field::new("phone", "phone", FieldKind::Text),
        Field::new("email", "email", FieldKind::Text),
        Field::new("groupId", "group_id", FieldKind::Integer),
        Field::new("isBaptized", "is_baptized", FieldKind::Boolean),
        Field::sortable("registeredAt", "registered_at", FieldKind::Timestamp),
        Field::sortable("createdAt", "created_at", FieldKind::Timestamp),
    ],
    default_sort: "createdAt",
    default_direction: SortDirection::Desc,
};

impl Listable for Member {
    const RESOURCE: Resource = Resource::Members;

    fn id(&self) -> i64 {
        self.id
    }

    fn value_of(&self, field: &str) -> Option<Value> {
        match field {
            "id" => Some(self.id.into()),
            "name" => Some(self.name.clone().into()),
            "phone" => self.phone.clone().map(Value::from),
            "email" => self.email.clone().map(Value::from),
            "groupId" => self.group_id.map(Value::from),
            "isBaptized" => Some(self.is_baptized.into()),
            "registeredAt" => Some(self.registered_at.into()),
            "createdAt" => Some(self.created_at.into()),
            _ => None,
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub fn member(id: i64, name: &str, created_at: DateTime<Utc>) -> Member {
        Member {
            id,
            tenant_id: 1,
            name: name.to_string(),
            phone: None,
            email: Some(format!("m{id}@example.org")),
            group_id: None,
            is_baptized: id % 2 == 0,
            registered_at: created_at,
            created_at,
        }
    }

    #[test]
    fn every_schema_field_is_readable() {
        let m = member(2, "Lydia", Utc::now());
        for field in MEMBER_SCHEMA.fields {
            if field.sortable {
                assert!(m.value_of(field.name).is_some(), "{} unreadable", field.name);
            }
        }
        assert_eq!(m.value_of("phone"), None);
        assert_eq!(m.value_of("groupId"), None);
    }

    #[test]
    fn serializes_camel_case() {
        let json = serde_json::to_value(member(1, "Ann", Utc::now())).expect("serializes");
        assert!(json.get("isBaptized").is_some());
        assert!(json.get("createdAt").is_some());
    }
}
