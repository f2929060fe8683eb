/// Application constants

// Pagination
pub const DEFAULT_TAKE: u32 = 20;
pub const MAX_TAKE: u32 = 100;
pub const WHERE_PREFIX: &str = "where__";
pub const KEY_SEPARATOR: &str = "__";

// Invitation throttling
pub const DEFAULT_INVITATION_DAILY_REQUEST_LIMIT: u32 = 100;
pub const DEFAULT_INVITATION_DAILY_RETRY_LIMIT: u32 = 3;
pub const DEFAULT_RATE_LIMIT_UTC_OFFSET: &str = "+00:00";

// Invitation status values stored in `invitations.status`
pub const INVITATION_STATUS_PENDING: &str = "pending";
pub const INVITATION_STATUS_ACCEPTED: &str = "accepted";

// Tenant scope header
pub const TENANT_HEADER: &str = "x-tenant-id";

// API version
pub const API_VERSION: &str = "v1";
