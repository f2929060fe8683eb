use super::schema::SortDirection;
use crate::{
    constants::{DEFAULT_TAKE, WHERE_PREFIX},
    error::{AppError, Result},
    utils::{ensure_page_in_range, ensure_take_in_range},
};

/// Flat list-endpoint parameters as received on the query string.
#[derive(Debug, Clone, PartialEq)]
pub struct PaginationRequest {
    pub page: Option<u32>,
    pub take: u32,
    pub cursor: Option<String>,
    pub sort_column: Option<String>,
    pub sort_direction: Option<SortDirection>,
    /// Every `where__*` pair in arrival order.
    pub filters: Vec<(String, String)>,
    /// All pairs as received, used to echo parameters into legacy links.
    pub raw: Vec<(String, String)>,
}

impl Default for PaginationRequest {
    fn default() -> Self {
        Self {
            page: None,
            take: DEFAULT_TAKE,
            cursor: None,
            sort_column: None,
            sort_direction: None,
            filters: Vec::new(),
            raw: Vec::new(),
        }
    }
}

impl PaginationRequest {
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Result<Self> {
        let mut request = PaginationRequest::default();

        for (key, value) in &pairs {
            match key.as_str() {
                "page" => {
                    let page = parse_number(key, value)?;
                    ensure_page_in_range(page)?;
                    request.page = Some(page);
                }
                "take" => {
                    let take = parse_number(key, value)?;
                    ensure_take_in_range(take)?;
                    request.take = take;
                }
                "cursor" => {
                    let trimmed = value.trim();
                    request.cursor = (!trimmed.is_empty()).then(|| trimmed.to_string());
                }
                "sortColumn" => {
                    let trimmed = value.trim();
                    request.sort_column = (!trimmed.is_empty()).then(|| trimmed.to_string());
                }
                "sortDirection" => {
                    let direction = SortDirection::parse(value).ok_or_else(|| {
                        AppError::invalid_value(key, value, "expected ASC or DESC")
                    })?;
                    request.sort_direction = Some(direction);
                }
                k if k.starts_with(WHERE_PREFIX) => {
                    request.filters.push((key.clone(), value.clone()));
                }
                _ => {}
            }
        }

        request.raw = pairs;
        Ok(request)
    }

    pub fn is_offset_mode(&self) -> bool {
        self.page.is_some()
    }
}

fn parse_number(key: &str, value: &str) -> Result<u32> {
    value
        .trim()
        .parse()
        .map_err(|_| AppError::invalid_value(key, value, "expected a positive integer"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn defaults_to_cursor_mode_with_default_take() {
        let request = PaginationRequest::from_pairs(Vec::new()).expect("empty is valid");
        assert!(!request.is_offset_mode());
        assert_eq!(request.take, DEFAULT_TAKE);
        assert!(request.cursor.is_none());
    }

    #[test]
    fn page_selects_offset_mode() {
        let request = PaginationRequest::from_pairs(pairs(&[
            ("page", "3"),
            ("take", "10"),
            ("sortColumn", "name"),
            ("sortDirection", "asc"),
            ("where__name__i_like", "lee"),
            ("utm_source", "bulletin"),
        ]))
        .expect("valid request");
        assert!(request.is_offset_mode());
        assert_eq!(request.page, Some(3));
        assert_eq!(request.take, 10);
        assert_eq!(request.sort_column.as_deref(), Some("name"));
        assert_eq!(request.sort_direction, Some(SortDirection::Asc));
        assert_eq!(request.filters.len(), 1);
        assert_eq!(request.raw.len(), 6);
    }

    #[test]
    fn out_of_range_values_fail_fast() {
        assert!(PaginationRequest::from_pairs(pairs(&[("take", "0")])).is_err());
        assert!(PaginationRequest::from_pairs(pairs(&[("take", "101")])).is_err());
        assert!(PaginationRequest::from_pairs(pairs(&[("page", "0")])).is_err());
        assert!(PaginationRequest::from_pairs(pairs(&[("page", "-1")])).is_err());
        assert!(PaginationRequest::from_pairs(pairs(&[("sortDirection", "UP")])).is_err());
    }

    #[test]
    fn blank_cursor_is_treated_as_absent() {
        let request = PaginationRequest::from_pairs(pairs(&[("cursor", "  ")])).expect("valid");
        assert!(request.cursor.is_none());
    }
}
