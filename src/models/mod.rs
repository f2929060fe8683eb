// src/models/mod.rs
pub mod group;
pub mod invitation;
pub mod member;
pub mod tenant;

pub use group::Group;
pub use invitation::{CreateInvitationRequest, Invitation};
pub use member::Member;
pub use tenant::{Tenant, TenantScope};

use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_response_success_sets_flag() {
        let response = ApiResponse::success("ok");
        assert!(response.success);
        assert_eq!(response.data, "ok");
    }
}
