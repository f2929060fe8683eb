use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use serde::{Deserialize, Serialize};

use super::schema::Listable;
use super::value::Value;

/// Keyset anchor: the last row's id and sort value, plus the column it was sorted by.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cursor {
    pub id: i64,
    pub value: Value,
    pub column: String,
}

impl Cursor {
    pub fn encode(&self) -> String {
        // Serializing a plain struct of owned scalars cannot fail.
        let json = serde_json::to_vec(self).unwrap_or_default();
        URL_SAFE_NO_PAD.encode(json)
    }

    /// Any malformed token decodes to `None`; callers treat that as "no cursor".
    pub fn decode(token: &str) -> Option<Self> {
        let bytes = URL_SAFE_NO_PAD.decode(token.trim().trim_end_matches('=')).ok()?;
        serde_json::from_slice(&bytes).ok()
    }
}

/// Builds the continuation token for `item` sorted by `sort_column`.
pub fn encode_cursor<R: Listable>(item: &R, sort_column: &str) -> Option<String> {
    let value = item.value_of(sort_column)?;
    Some(
        Cursor {
            id: item.id(),
            value,
            column: sort_column.to_string(),
        }
        .encode(),
    )
}

pub fn decode_cursor(token: &str) -> Option<Cursor> {
    Cursor::decode(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::member::tests::member;
    use chrono::{TimeZone, Utc};

    #[test]
    fn encode_then_decode_returns_anchor() {
        let m = member(7, "Hannah", Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap());
        for column in ["id", "name", "createdAt", "registeredAt"] {
            let token = encode_cursor(&m, column).expect("sortable column");
            let decoded = decode_cursor(&token).expect("round trip");
            assert_eq!(decoded.id, 7);
            assert_eq!(decoded.column, column);
            assert_eq!(Some(decoded.value), m.value_of(column));
        }
    }

    #[test]
    fn token_is_url_safe() {
        let m = member(1, "??>>~~ü", Utc::now());
        let token = encode_cursor(&m, "name").expect("token");
        assert!(token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn malformed_tokens_decode_to_none() {
        assert!(decode_cursor("").is_none());
        assert!(decode_cursor("%%%not-base64%%%").is_none());
        // valid base64, not JSON
        assert!(decode_cursor(&URL_SAFE_NO_PAD.encode("hello")).is_none());
        // valid JSON, missing fields
        assert!(decode_cursor(&URL_SAFE_NO_PAD.encode(r#"{"id":1}"#)).is_none());
    }

    #[test]
    fn unknown_column_yields_no_cursor() {
        let m = member(3, "Ruth", Utc::now());
        assert!(encode_cursor(&m, "password").is_none());
    }
}
