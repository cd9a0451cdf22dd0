use std::sync::Arc;

use comet_http::protocol::FramedRequest;
use http::Method;
use tracing::{debug, trace};

use crate::session::DEFAULT_COOKIE_NAME;
use crate::uri::parse_uri;
use crate::{BodyDecoder, Request, RequestError, SessionBinder, SessionConfig, SessionFactory, normalize_files};

/// Turns framed requests into [`Request`] values.
///
/// An assembler holds no per-request state and can be shared between connection tasks.
#[derive(Debug, Clone)]
pub struct RequestAssembler {
    binder: SessionBinder,
    cookie_name: String,
}

impl RequestAssembler {
    pub fn builder() -> RequestAssemblerBuilder {
        RequestAssemblerBuilder::new()
    }

    pub fn session_cookie_name(&self) -> &str {
        &self.cookie_name
    }

    /// Interprets a framed request.
    ///
    /// The URI is sanitized before parsing, the body is decoded by its content type, raw file
    /// specs are normalized next to the files the transport already split, and a session is
    /// bound from the configured session cookie.
    ///
    /// A raw file spec takes precedence over a transport file under the same field name.
    ///
    /// # Errors
    ///
    /// Returns an error when the method or the sanitized URI is rejected, or when a raw file spec
    /// is malformed. A malformed body never fails assembly.
    pub fn assemble(&self, framed: FramedRequest) -> Result<Request, RequestError> {
        let parts = framed.into_parts();

        let method = Method::from_bytes(parts.method.as_bytes())?;
        let uri = parse_uri(&parts.uri)?;
        let parsed_body = BodyDecoder::decode(&parts.headers, &parts.body);

        let mut files = parts.files;
        for (field, tree) in normalize_files(parts.file_specs)? {
            if files.contains_key(&field) {
                debug!(field = %field, "raw file spec replaces transport file");
            }
            files.insert(field, tree);
        }

        let session = self.binder.bind(&parts.cookies, &self.cookie_name);

        trace!(
            method = %method,
            uri = %uri,
            body_size = parts.body.len(),
            parsed_body = !parsed_body.is_absent(),
            files = files.len(),
            session_id = %session.id(),
            "assembled request"
        );

        Ok(Request::new(method, uri, parts.headers, parts.body, session)
            .with_parsed_body(parsed_body)
            .with_query_params(parts.query)
            .with_cookie_params(parts.cookies)
            .with_uploaded_files(files)
            .with_server_params(parts.server_params))
    }
}

impl Default for RequestAssembler {
    fn default() -> Self {
        Self::builder().build()
    }
}

#[derive(Debug)]
pub struct RequestAssemblerBuilder {
    binder: Option<SessionBinder>,
    cookie_name: String,
}

impl RequestAssemblerBuilder {
    fn new() -> Self {
        Self { binder: None, cookie_name: DEFAULT_COOKIE_NAME.to_string() }
    }

    pub fn session_config(mut self, config: SessionConfig) -> Self {
        self.cookie_name = config.cookie_name;
        self
    }

    pub fn session_cookie_name(mut self, cookie_name: impl Into<String>) -> Self {
        self.cookie_name = cookie_name.into();
        self
    }

    pub fn session_factory(mut self, factory: Arc<dyn SessionFactory>) -> Self {
        self.binder = Some(SessionBinder::new(factory));
        self
    }

    pub fn build(self) -> RequestAssembler {
        RequestAssembler { binder: self.binder.unwrap_or_default(), cookie_name: self.cookie_name }
    }
}
