use thiserror::Error;

/// Errors raised while assembling or re-parsing a [`Request`](crate::Request).
///
/// Malformed bodies are not reported during assembly, a body that fails to decode leaves
/// [`ParsedBody::Absent`](crate::ParsedBody::Absent). The `Json`, `Form` and `Query` variants
/// only come from the explicit strict helpers such as [`Request::json`](crate::Request::json).
#[derive(Error, Debug)]
pub enum RequestError {
    #[error("invalid upload spec: {reason}")]
    InvalidUploadSpec { reason: String },

    #[error("requests can only be assembled from a framed request, not from process globals")]
    UnsupportedConstructionMode,

    #[error("invalid http method: {source}")]
    InvalidMethod {
        #[from]
        source: http::method::InvalidMethod,
    },

    #[error("invalid http uri: {source}")]
    InvalidUri {
        #[from]
        source: http::uri::InvalidUri,
    },

    #[error("invalid json body: {source}")]
    Json {
        #[from]
        source: serde_json::Error,
    },

    #[error("invalid form body: {source}")]
    Form {
        #[from]
        source: serde_urlencoded::de::Error,
    },

    #[error("invalid query string: {source}")]
    Query {
        #[from]
        source: serde_qs::Error,
    },
}

impl RequestError {
    pub fn invalid_upload_spec<S: ToString>(str: S) -> Self {
        Self::InvalidUploadSpec { reason: str.to_string() }
    }
}
