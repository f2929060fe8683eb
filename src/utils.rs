// Utility helpers shared by the pagination and config layers

use crate::{
    constants::MAX_TAKE,
    error::{AppError, Result},
};

/// Guard for list page sizes to avoid expensive queries.
pub fn ensure_take_in_range(take: u32) -> Result<()> {
    if take == 0 || take > MAX_TAKE {
        return Err(AppError::invalid_value(
            "take",
            take.to_string(),
            format!("must be between 1 and {}", MAX_TAKE),
        ));
    }
    Ok(())
}

/// Pages are 1-based.
pub fn ensure_page_in_range(page: u32) -> Result<()> {
    if page == 0 {
        return Err(AppError::invalid_value("page", "0", "must be >= 1"));
    }
    Ok(())
}

// Internal helper that checks truthy env-style flags.
pub fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "y" | "on"
    )
}
