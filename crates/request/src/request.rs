use std::any::Any;

use bytes::Bytes;
use comet_http::protocol::{Cookies, Params, ServerParams, UploadedFiles};
use http::header::{AsHeaderName, IntoHeaderName};
use http::{HeaderMap, HeaderValue, Method, Uri, Version};
use serde::de::DeserializeOwned;

use crate::{Attributes, ParsedBody, RequestError, Session};

/// A fully interpreted incoming request.
///
/// Every component except the attributes and the session is replaced through consuming `with_*`
/// methods, which return the updated request and leave nothing shared with the previous value.
/// Attributes can also be changed in place with [`set_attribute`](Self::set_attribute).
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    uri: Uri,
    version: Version,
    headers: HeaderMap,
    body: Bytes,
    parsed_body: ParsedBody,
    query: Params,
    cookies: Cookies,
    uploaded_files: UploadedFiles,
    attributes: Attributes,
    server_params: ServerParams,
    session: Option<Session>,
}

impl Request {
    pub(crate) fn new(method: Method, uri: Uri, headers: HeaderMap, body: Bytes, session: Session) -> Self {
        Self {
            method,
            uri,
            version: Version::HTTP_11,
            headers,
            body,
            parsed_body: ParsedBody::Absent,
            query: Params::new(),
            cookies: Cookies::new(),
            uploaded_files: UploadedFiles::new(),
            attributes: Attributes::new(),
            server_params: ServerParams::new(),
            session: Some(session),
        }
    }

    /// Building a request from process-wide state is not supported, requests are only assembled
    /// from an explicit [`FramedRequest`](comet_http::protocol::FramedRequest).
    ///
    /// # Errors
    ///
    /// Always returns [`RequestError::UnsupportedConstructionMode`].
    pub fn from_globals() -> Result<Request, RequestError> {
        Err(RequestError::UnsupportedConstructionMode)
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns the raw body as received.
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn parsed_body(&self) -> &ParsedBody {
        &self.parsed_body
    }

    pub fn query_params(&self) -> &Params {
        &self.query
    }

    pub fn cookie_params(&self) -> &Cookies {
        &self.cookies
    }

    pub fn uploaded_files(&self) -> &UploadedFiles {
        &self.uploaded_files
    }

    pub fn server_params(&self) -> &ServerParams {
        &self.server_params
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    /// Returns the attribute `name` if it is set and holds a `T`.
    pub fn attribute<T: Any + Send + Sync>(&self, name: &str) -> Option<&T> {
        self.attributes.get(name)
    }

    pub fn attribute_or<'a, T: Any + Send + Sync>(&'a self, name: &str, default: &'a T) -> &'a T {
        self.attribute(name).unwrap_or(default)
    }

    /// Sets an attribute on this request, visible to every later reader of the same value.
    pub fn set_attribute<T: Any + Send + Sync>(&mut self, name: impl Into<String>, value: T) {
        self.attributes.insert(name, value);
    }

    /// Returns the session bound to this request, `None` only after
    /// [`take_session`](Self::take_session).
    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Returns the session for modification, creating a fresh one if the handle was taken out
    /// with [`take_session`](Self::take_session).
    pub fn session_mut(&mut self) -> &mut Session {
        self.session.get_or_insert_with(Session::new)
    }

    /// Moves the session out, typically to hand it back to the session store.
    pub fn take_session(&mut self) -> Option<Session> {
        self.session.take()
    }

    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub fn with_uri(mut self, uri: Uri) -> Self {
        self.uri = uri;
        self
    }

    /// Replaces every value of the header `name` with `value`.
    pub fn with_header<K: IntoHeaderName>(mut self, name: K, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Adds `value` to the header `name`, keeping the existing values.
    pub fn with_added_header<K: IntoHeaderName>(mut self, name: K, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    pub fn without_header<K: AsHeaderName>(mut self, name: K) -> Self {
        self.headers.remove(name);
        self
    }

    /// Replaces the raw body. The parsed body is left as it was.
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn with_parsed_body(mut self, parsed_body: ParsedBody) -> Self {
        self.parsed_body = parsed_body;
        self
    }

    pub fn with_query_params(mut self, query: Params) -> Self {
        self.query = query;
        self
    }

    pub fn with_cookie_params(mut self, cookies: Cookies) -> Self {
        self.cookies = cookies;
        self
    }

    pub fn with_uploaded_files(mut self, uploaded_files: UploadedFiles) -> Self {
        self.uploaded_files = uploaded_files;
        self
    }

    pub fn with_server_params(mut self, server_params: ServerParams) -> Self {
        self.server_params = server_params;
        self
    }

    pub fn with_attribute<T: Any + Send + Sync>(mut self, name: impl Into<String>, value: T) -> Self {
        self.attributes.insert(name, value);
        self
    }

    pub fn without_attribute(mut self, name: &str) -> Self {
        self.attributes.remove(name);
        self
    }

    /// Deserializes the raw body as json, reporting malformed input.
    ///
    /// # Errors
    ///
    /// Returns [`RequestError::Json`] when the body is not valid json for `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, RequestError> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    /// Deserializes the raw body as an urlencoded form, reporting malformed input.
    ///
    /// # Errors
    ///
    /// Returns [`RequestError::Form`] when the body does not match `T`.
    pub fn form<T: DeserializeOwned>(&self) -> Result<T, RequestError> {
        Ok(serde_urlencoded::from_bytes(&self.body)?)
    }

    /// Deserializes the URI query string, with support for bracketed nested keys.
    ///
    /// # Errors
    ///
    /// Returns [`RequestError::Query`] when the query does not match `T`.
    pub fn query<T: DeserializeOwned>(&self) -> Result<T, RequestError> {
        Ok(serde_qs::from_str(self.uri.query().unwrap_or_default())?)
    }
}
