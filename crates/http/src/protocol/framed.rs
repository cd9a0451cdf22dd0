//! The transport's output: one fully framed request.
//!
//! A [`FramedRequest`] holds everything the transport collected for one exchange. Nothing here
//! is interpreted yet: the method and URI are the raw strings from the request line, and the
//! body is the buffered payload.

use bytes::Bytes;
use http::header::{self, HeaderName, HeaderValue};
use http::HeaderMap;

use crate::protocol::{Cookies, FileSpecMap, ParseError, Params, ServerParams, UploadedFiles};

/// A request as framed by the transport, before any interpretation.
#[derive(Debug, Clone, Default)]
pub struct FramedRequest {
    parts: Parts,
}

/// The owned components of a [`FramedRequest`].
#[derive(Debug, Clone, Default)]
pub struct Parts {
    pub method: String,
    pub uri: String,
    pub headers: HeaderMap,
    pub body: Bytes,
    pub query: Params,
    pub cookies: Cookies,
    /// Files the transport already split into descriptors
    pub files: UploadedFiles,
    /// Raw `$_FILES`-shaped specs still waiting for normalization
    pub file_specs: FileSpecMap,
    pub server_params: ServerParams,
}

impl FramedRequest {
    pub fn builder() -> FramedRequestBuilder {
        FramedRequestBuilder::new()
    }

    pub fn from_parts(parts: Parts) -> Self {
        Self { parts }
    }

    pub fn into_parts(self) -> Parts {
        self.parts
    }

    pub fn method(&self) -> &str {
        &self.parts.method
    }

    pub fn uri(&self) -> &str {
        &self.parts.uri
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.parts.headers
    }

    pub fn body(&self) -> &Bytes {
        &self.parts.body
    }

    pub fn query(&self) -> &Params {
        &self.parts.query
    }

    pub fn cookies(&self) -> &Cookies {
        &self.parts.cookies
    }

    pub fn files(&self) -> &UploadedFiles {
        &self.parts.files
    }

    pub fn file_specs(&self) -> &FileSpecMap {
        &self.parts.file_specs
    }

    pub fn server_params(&self) -> &ServerParams {
        &self.parts.server_params
    }
}

/// Builds a [`FramedRequest`], collecting the first header error until [`build`](Self::build).
///
/// When no query or cookies are set explicitly, they are derived from the URI query string and
/// the `Cookie` headers at build time.
#[derive(Debug)]
pub struct FramedRequestBuilder {
    inner: Result<Parts, ParseError>,
    query_set: bool,
    cookies_set: bool,
}

impl FramedRequestBuilder {
    fn new() -> Self {
        let parts = Parts { method: "GET".into(), uri: "/".into(), ..Parts::default() };
        Self { inner: Ok(parts), query_set: false, cookies_set: false }
    }

    pub fn method(self, method: impl Into<String>) -> Self {
        self.and_then(|mut parts| {
            parts.method = method.into();
            Ok(parts)
        })
    }

    pub fn uri(self, uri: impl Into<String>) -> Self {
        self.and_then(|mut parts| {
            parts.uri = uri.into();
            Ok(parts)
        })
    }

    /// Appends a header, keeping earlier values with the same name.
    pub fn header<K, V>(self, name: K, value: V) -> Self
    where
        HeaderName: TryFrom<K>,
        <HeaderName as TryFrom<K>>::Error: ToString,
        HeaderValue: TryFrom<V>,
        <HeaderValue as TryFrom<V>>::Error: ToString,
    {
        self.and_then(|mut parts| {
            let name = HeaderName::try_from(name).map_err(|e| ParseError::invalid_header(e.to_string()))?;
            let value = HeaderValue::try_from(value).map_err(|e| ParseError::invalid_header(e.to_string()))?;
            parts.headers.append(name, value);
            Ok(parts)
        })
    }

    pub fn headers(self, headers: HeaderMap) -> Self {
        self.and_then(|mut parts| {
            parts.headers.extend(headers);
            Ok(parts)
        })
    }

    pub fn body(self, body: impl Into<Bytes>) -> Self {
        self.and_then(|mut parts| {
            parts.body = body.into();
            Ok(parts)
        })
    }

    pub fn query(mut self, query: Params) -> Self {
        self.query_set = true;
        self.and_then(|mut parts| {
            parts.query = query;
            Ok(parts)
        })
    }

    pub fn cookies(mut self, cookies: Cookies) -> Self {
        self.cookies_set = true;
        self.and_then(|mut parts| {
            parts.cookies = cookies;
            Ok(parts)
        })
    }

    pub fn files(self, files: UploadedFiles) -> Self {
        self.and_then(|mut parts| {
            parts.files = files;
            Ok(parts)
        })
    }

    pub fn file_specs(self, file_specs: FileSpecMap) -> Self {
        self.and_then(|mut parts| {
            parts.file_specs = file_specs;
            Ok(parts)
        })
    }

    pub fn server_params(self, server_params: ServerParams) -> Self {
        self.and_then(|mut parts| {
            parts.server_params = server_params;
            Ok(parts)
        })
    }

    /// # Errors
    ///
    /// Returns the first [`ParseError`] recorded by a header setter.
    pub fn build(self) -> Result<FramedRequest, ParseError> {
        let Self { inner, query_set, cookies_set } = self;
        let mut parts = inner?;

        if !query_set {
            parts.query = query_of(&parts.uri);
        }
        if !cookies_set {
            parts.cookies = cookies_of(&parts.headers);
        }

        Ok(FramedRequest { parts })
    }

    fn and_then<F>(self, f: F) -> Self
    where
        F: FnOnce(Parts) -> Result<Parts, ParseError>,
    {
        Self { inner: self.inner.and_then(f), ..self }
    }
}

/// Decodes the query string part of a raw request target.
pub fn query_of(uri: &str) -> Params {
    uri.split_once('?').map(|(_, query)| Params::parse(query.as_bytes())).unwrap_or_default()
}

/// Collects the cookies of every `Cookie` header, later headers win.
pub fn cookies_of(headers: &HeaderMap) -> Cookies {
    let mut cookies = Cookies::new();
    for value in headers.get_all(header::COOKIE) {
        crate::protocol::parse_cookies(value.as_bytes(), &mut cookies);
    }
    cookies
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derives_query_and_cookies() {
        let framed = FramedRequest::builder()
            .method("POST")
            .uri("/users?page=2&sort[by]=name")
            .header("Cookie", "SID=abc123; theme=dark")
            .header("cookie", "theme=light")
            .body("payload")
            .build()
            .unwrap();

        assert_eq!(framed.method(), "POST");
        assert_eq!(framed.uri(), "/users?page=2&sort[by]=name");
        assert_eq!(framed.query().get_str("page"), Some("2"));
        assert_eq!(framed.query().get_map("sort").and_then(|m| m.get("by")).and_then(|v| v.as_str()), Some("name"));
        assert_eq!(framed.cookies().get("SID").map(String::as_str), Some("abc123"));
        assert_eq!(framed.cookies().get("theme").map(String::as_str), Some("light"));
        assert_eq!(framed.headers().get_all(header::COOKIE).iter().count(), 2);
        assert_eq!(&framed.body()[..], b"payload");
    }

    #[test]
    fn explicit_values_are_kept() {
        let framed = FramedRequest::builder()
            .uri("/?a=1")
            .header("Cookie", "SID=abc123")
            .query(Params::new())
            .cookies(Cookies::from([("SID".to_string(), "other".to_string())]))
            .build()
            .unwrap();

        assert!(framed.query().is_empty());
        assert_eq!(framed.cookies().get("SID").map(String::as_str), Some("other"));
    }

    #[test]
    fn invalid_header_is_reported_at_build() {
        let result = FramedRequest::builder().header("bad header", "x").uri("/").build();

        assert!(matches!(result, Err(ParseError::InvalidHeader { .. })));
    }

    #[test]
    fn defaults() {
        let framed = FramedRequest::builder().build().unwrap();

        assert_eq!(framed.method(), "GET");
        assert_eq!(framed.uri(), "/");
        assert!(framed.body().is_empty());
        assert!(framed.files().is_empty());
        assert!(framed.file_specs().is_empty());
        assert!(framed.server_params().is_empty());
    }
}
