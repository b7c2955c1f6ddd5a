//! Success response envelope
//!
//! Every successful response except member removal renders as
//! `{"status": true, "content": {"data": ..., "meta"?: ...}}`. List
//! endpoints carry pagination meta; signin carries the issued token.
//! Member removal acknowledges with a bare `{"status": true}`.

use serde::Serialize;

/// Success envelope with a data payload and optional meta
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub status: bool,
    pub content: Content<T>,
}

/// The `content` object of a success envelope
#[derive(Debug, Serialize)]
pub struct Content<T: Serialize> {
    pub data: T,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
}

/// Meta attached to a success envelope
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum Meta {
    /// Pagination meta for list endpoints
    Page { total: i64, pages: i64, page: i64 },

    /// Issued bearer token, returned by signin
    Token { access_token: String },
}

impl<T: Serialize> ApiResponse<T> {
    /// Wraps a payload with no meta
    pub fn data(data: T) -> Self {
        Self {
            status: true,
            content: Content { data, meta: None },
        }
    }

    /// Wraps a payload with meta
    pub fn with_meta(data: T, meta: Meta) -> Self {
        Self {
            status: true,
            content: Content {
                data,
                meta: Some(meta),
            },
        }
    }
}

/// Bare success acknowledgement: `{"status": true}`
#[derive(Debug, Serialize)]
pub struct Ack {
    pub status: bool,
}

impl Ack {
    pub fn ok() -> Self {
        Self { status: true }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_data_envelope_omits_meta() {
        let response = ApiResponse::data(json!({"id": 1}));
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["status"], json!(true));
        assert_eq!(value["content"]["data"]["id"], json!(1));
        assert!(value["content"].get("meta").is_none());
    }

    #[test]
    fn test_page_meta_shape() {
        let response = ApiResponse::with_meta(
            json!([]),
            Meta::Page {
                total: 5,
                pages: 3,
                page: 2,
            },
        );
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["content"]["meta"]["total"], json!(5));
        assert_eq!(value["content"]["meta"]["pages"], json!(3));
        assert_eq!(value["content"]["meta"]["page"], json!(2));
    }

    #[test]
    fn test_token_meta_shape() {
        let response = ApiResponse::with_meta(
            json!({}),
            Meta::Token {
                access_token: "abc".to_string(),
            },
        );
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["content"]["meta"]["access_token"], json!("abc"));
    }

    #[test]
    fn test_ack_is_bare() {
        let value = serde_json::to_value(Ack::ok()).unwrap();
        assert_eq!(value, json!({"status": true}));
    }
}
