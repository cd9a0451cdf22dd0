//! Framing of a fully buffered HTTP/1.x request into a [`FramedRequest`].
//!
//! The decoder works in multiple stages:
//!
//! 1. Parse the request line and headers using `httparse`
//! 2. Convert header names and values into a typed [`HeaderMap`]
//! 3. Cut the body out of the buffer according to `Content-Length`
//! 4. Derive query parameters, cookies and informational server parameters
//!
//! # Limits
//!
//! - Maximum number of headers: 64
//! - Maximum header size: 8KB
//! - Only HTTP/1.0 and HTTP/1.1
//! - Chunked transfer coding is not decoded here, it belongs to the transport

use bytes::Bytes;
use http::{HeaderMap, HeaderName, HeaderValue};
use httparse::{Error, Status};
use tracing::trace;

use crate::ensure;
use crate::protocol::{FramedRequest, ParseError, Parts, ServerParams, cookies_of, query_of};

/// Maximum number of headers allowed in a request
const MAX_HEADER_NUM: usize = 64;

/// Maximum size in bytes allowed for the entire header section
const MAX_HEADER_BYTES: usize = 8 * 1024;

/// Frames one complete request held in a byte buffer.
#[derive(Debug, Default, Clone, Copy)]
pub struct FrameDecoder;

impl FrameDecoder {
    pub fn new() -> Self {
        Self
    }

    /// Decodes the request held in `src`.
    ///
    /// Bytes past the declared `Content-Length` are ignored.
    ///
    /// # Errors
    ///
    /// Returns `ParseError` if:
    /// - The buffer ends before the header section or the declared body is complete
    /// - The number of headers exceeds `MAX_HEADER_NUM`
    /// - The total header size exceeds `MAX_HEADER_BYTES`
    /// - The HTTP version is not supported
    /// - Headers contain invalid characters
    /// - The body uses `Transfer-Encoding` or has an invalid `Content-Length`
    pub fn decode(&self, src: &[u8]) -> Result<FramedRequest, ParseError> {
        let mut headers = [httparse::EMPTY_HEADER; MAX_HEADER_NUM];
        let mut req = httparse::Request::new(&mut headers);

        let parsed_result = req.parse(src).map_err(|e| match e {
            Error::TooManyHeaders => ParseError::too_many_headers(MAX_HEADER_NUM),
            e => ParseError::invalid_header(e.to_string()),
        });

        let body_offset = match parsed_result? {
            Status::Complete(body_offset) => body_offset,
            Status::Partial => {
                ensure!(src.len() <= MAX_HEADER_BYTES, ParseError::too_large_header(src.len(), MAX_HEADER_BYTES));
                return Err(ParseError::incomplete(src.len()));
            }
        };
        trace!(header_size = body_offset, "parsed request header");
        ensure!(body_offset <= MAX_HEADER_BYTES, ParseError::too_large_header(body_offset, MAX_HEADER_BYTES));

        let version = match req.version {
            Some(0) => "HTTP/1.0",
            Some(1) => "HTTP/1.1",
            // Currently HTTP/2 and HTTP/3 not supported
            _ => return Err(ParseError::InvalidVersion(req.version)),
        };
        let method = req.method.ok_or(ParseError::InvalidMethod)?;
        let uri = req.path.ok_or(ParseError::InvalidUri)?;

        let mut header_map = HeaderMap::with_capacity(req.headers.len());
        for header in req.headers.iter() {
            let name = HeaderName::from_bytes(header.name.as_bytes()).map_err(ParseError::invalid_header)?;
            let value = HeaderValue::from_bytes(header.value).map_err(ParseError::invalid_header)?;
            header_map.append(name, value);
        }

        let body_len = body_length(&header_map)?;
        let available = src.len() - body_offset;
        ensure!(available >= body_len, ParseError::incomplete(src.len()));
        let body = Bytes::copy_from_slice(&src[body_offset..body_offset + body_len]);
        trace!(body_size = body_len, "parsed request body");

        let mut server_params = ServerParams::new();
        server_params.insert("REQUEST_METHOD", method);
        server_params.insert("REQUEST_URI", uri);
        server_params.insert("SERVER_PROTOCOL", version);
        if let Some((_, query)) = uri.split_once('?') {
            server_params.insert("QUERY_STRING", query);
        }
        if let Some(host) = header_map.get(http::header::HOST).and_then(|h| h.to_str().ok()) {
            server_params.insert("HTTP_HOST", host);
        }

        let parts = Parts {
            method: method.to_string(),
            uri: uri.to_string(),
            query: query_of(uri),
            cookies: cookies_of(&header_map),
            headers: header_map,
            body,
            server_params,
            ..Parts::default()
        };

        Ok(FramedRequest::from_parts(parts))
    }
}

/// Determines the body length from the `Content-Length` header.
///
/// A request without `Content-Length` has no body. Any `Transfer-Encoding` is rejected since
/// decoding it is the transport's job.
fn body_length(headers: &HeaderMap) -> Result<usize, ParseError> {
    ensure!(
        !headers.contains_key(http::header::TRANSFER_ENCODING),
        ParseError::invalid_body("transfer-encoding must be decoded before framing")
    );

    let mut values = headers.get_all(http::header::CONTENT_LENGTH).iter();
    let Some(cl_value) = values.next() else {
        return Ok(0);
    };
    ensure!(values.all(|v| v == cl_value), ParseError::invalid_content_length("conflicting content-length values"));

    let cl_str = cl_value.to_str().map_err(|_| ParseError::invalid_content_length("value can't to_str"))?;
    cl_str.trim().parse::<usize>().map_err(|_| ParseError::invalid_content_length(format!("value {cl_str} is not usize")))
}
