use serde::Serialize;

use super::value::{FieldKind, Value};
use crate::models::{group::GROUP_SCHEMA, invitation::INVITATION_SCHEMA, member::MEMBER_SCHEMA};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "ASC" => Some(SortDirection::Asc),
            "DESC" => Some(SortDirection::Desc),
            _ => None,
        }
    }

    pub fn as_sql(self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// A field exposed to list endpoints. `name` is the API name, `column` the SQL column.
#[derive(Debug, PartialEq, Eq)]
pub struct Field {
    pub name: &'static str,
    pub column: &'static str,
    pub kind: FieldKind,
    /// Sortable fields must be NOT NULL so every row can anchor a cursor.
    pub sortable: bool,
}

impl Field {
    pub const fn new(name: &'static str, column: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            column,
            kind,
            sortable: false,
        }
    }

    pub const fn sortable(name: &'static str, column: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            column,
            kind,
            sortable: true,
        }
    }
}

/// Tag for every listable resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Members,
    Groups,
    Invitations,
}

impl Resource {
    pub fn schema(self) -> &'static ResourceSchema {
        match self {
            Resource::Members => &MEMBER_SCHEMA,
            Resource::Groups => &GROUP_SCHEMA,
            Resource::Invitations => &INVITATION_SCHEMA,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Resource::Members => "members",
            Resource::Groups => "groups",
            Resource::Invitations => "invitations",
        }
    }
}

#[derive(Debug)]
pub struct ResourceSchema {
    pub table: &'static str,
    pub fields: &'static [Field],
    pub default_sort: &'static str,
    pub default_direction: SortDirection,
}

impl ResourceSchema {
    pub fn field(&'static self, name: &str) -> Option<&'static Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn sortable_field(&'static self, name: &str) -> Option<&'static Field> {
        self.field(name).filter(|f| f.sortable)
    }

    /// Every schema declares an `id` integer field; it is the keyset tie-breaker.
    pub fn id_field(&'static self) -> &'static Field {
        self.fields
            .iter()
            .find(|f| f.name == "id")
            .unwrap_or(&self.fields[0])
    }

    pub fn default_sort_field(&'static self) -> &'static Field {
        self.sortable_field(self.default_sort)
            .unwrap_or_else(|| self.id_field())
    }
}

/// A row type that list endpoints can page through.
pub trait Listable {
    const RESOURCE: Resource;

    fn id(&self) -> i64;

    /// Value of an API field; `None` for unknown fields and SQL NULLs.
    fn value_of(&self, field: &str) -> Option<Value>;

    fn schema() -> &'static ResourceSchema {
        Self::RESOURCE.schema()
    }
}
