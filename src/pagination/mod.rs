// List-endpoint pagination: filters, sorting, offset pages and keyset cursors.
pub mod composer;
pub mod cursor;
pub mod filter;
pub mod page;
pub mod request;
pub mod schema;
pub mod value;

pub use composer::{compose, PageMode, QueryOptions};
pub use filter::Predicate;
pub use page::{finish_cursor_page, legacy_next_page_url, OffsetPage, Page};
pub use request::PaginationRequest;
pub use schema::{Field, Listable, Resource, ResourceSchema, SortDirection};
pub use value::{FieldKind, Value};
