//! Content-type driven body decoding.
//!
//! Only two content types are recognized, and only by exact, case-sensitive comparison of the
//! whole header value:
//!
//! | `content-type` | result |
//! |---|---|
//! | `application/json` | [`ParsedBody::Json`], or [`ParsedBody::Absent`] when the body is not valid json |
//! | `application/x-www-form-urlencoded` | [`ParsedBody::Form`] |
//! | anything else, or no header | [`ParsedBody::Absent`] |
//!
//! A parameterised value such as `application/json; charset=utf-8` is not recognized. The raw
//! body always stays available on the request.

use comet_http::protocol::Params;
use http::HeaderMap;
use http::header::CONTENT_TYPE;
use serde_json::Value;
use tracing::debug;

/// The decoded representation of a request body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ParsedBody {
    #[default]
    Absent,
    Json(Value),
    Form(Params),
}

impl ParsedBody {
    pub fn is_absent(&self) -> bool {
        matches!(self, ParsedBody::Absent)
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            ParsedBody::Json(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_form(&self) -> Option<&Params> {
        match self {
            ParsedBody::Form(params) => Some(params),
            _ => None,
        }
    }

    /// Looks up a top-level field of either a json object or a form.
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            ParsedBody::Absent => None,
            ParsedBody::Json(value) => value.get(key),
            ParsedBody::Form(params) => params.get(key),
        }
    }

    /// Converts the body into one json value, forms become objects of strings.
    pub fn into_value(self) -> Option<Value> {
        match self {
            ParsedBody::Absent => None,
            ParsedBody::Json(value) => Some(value),
            ParsedBody::Form(params) => Some(params.into()),
        }
    }
}

/// Decodes request bodies according to their declared content type.
#[derive(Debug, Default, Clone, Copy)]
pub struct BodyDecoder;

impl BodyDecoder {
    /// Decodes `body` according to the `content-type` in `headers`.
    ///
    /// Never fails: unrecognized types and malformed json both yield [`ParsedBody::Absent`].
    pub fn decode(headers: &HeaderMap, body: &[u8]) -> ParsedBody {
        let Some(content_type) = headers.get(CONTENT_TYPE) else {
            return ParsedBody::Absent;
        };

        let content_type = content_type.as_bytes();
        if content_type == mime::APPLICATION_JSON.essence_str().as_bytes() {
            decode_json(body)
        } else if content_type == mime::APPLICATION_WWW_FORM_URLENCODED.essence_str().as_bytes() {
            ParsedBody::Form(Params::parse(body))
        } else {
            ParsedBody::Absent
        }
    }
}

fn decode_json(body: &[u8]) -> ParsedBody {
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Null) => ParsedBody::Absent,
        Ok(value) => ParsedBody::Json(value),
        Err(e) => {
            debug!(cause = %e, body_size = body.len(), "malformed json body, leaving parsed body absent");
            ParsedBody::Absent
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::{HeaderName, HeaderValue};
    use serde_json::json;

    fn headers(content_type: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
        headers
    }

    #[test]
    fn json_object() {
        let parsed = BodyDecoder::decode(&headers("application/json"), br#"{"a":1}"#);

        assert_eq!(parsed, ParsedBody::Json(json!({"a": 1})));
        assert_eq!(parsed.get("a"), Some(&json!(1)));
    }

    #[test]
    fn json_scalar_and_null() {
        assert_eq!(BodyDecoder::decode(&headers("application/json"), b"[1,2]"), ParsedBody::Json(json!([1, 2])));
        assert_eq!(BodyDecoder::decode(&headers("application/json"), b"null"), ParsedBody::Absent);
    }

    #[test]
    fn malformed_json_degrades() {
        assert_eq!(BodyDecoder::decode(&headers("application/json"), br#"{"a":"#), ParsedBody::Absent);
        assert_eq!(BodyDecoder::decode(&headers("application/json"), b""), ParsedBody::Absent);
    }

    #[test]
    fn decode_is_pure() {
        let headers = headers("application/json");
        let body = br#"{"user":{"name":"zava"}}"#;

        assert_eq!(BodyDecoder::decode(&headers, body), BodyDecoder::decode(&headers, body));
    }

    #[test]
    fn form_last_wins() {
        let parsed = BodyDecoder::decode(&headers("application/x-www-form-urlencoded"), b"a=1&a=2&b=3");

        assert_eq!(parsed.into_value(), Some(json!({"a": "2", "b": "3"})));
    }

    #[test]
    fn form_brackets() {
        let parsed = BodyDecoder::decode(&headers("application/x-www-form-urlencoded"), b"a[b]=1&a[c][]=x");

        assert_eq!(parsed.get("a"), Some(&json!({"b": "1", "c": {"0": "x"}})));
        assert!(parsed.as_form().is_some());
    }

    #[test]
    fn empty_form_is_still_a_form() {
        let parsed = BodyDecoder::decode(&headers("application/x-www-form-urlencoded"), b"");

        assert_eq!(parsed, ParsedBody::Form(Params::new()));
    }

    #[test]
    fn only_exact_types_are_recognized() {
        for content_type in ["application/json; charset=utf-8", "Application/JSON", "text/plain", "multipart/form-data"] {
            assert!(BodyDecoder::decode(&headers(content_type), br#"{"a":1}"#).is_absent(), "{content_type}");
        }
    }

    #[test]
    fn no_content_type() {
        assert!(BodyDecoder::decode(&HeaderMap::new(), br#"{"a":1}"#).is_absent());
    }

    #[test]
    fn header_name_is_case_insensitive() {
        let mut headers = HeaderMap::new();
        headers.insert(HeaderName::from_bytes(b"Content-Type").unwrap(), HeaderValue::from_static("application/json"));

        assert!(BodyDecoder::decode(&headers, b"{}").as_json().is_some());
    }
}
