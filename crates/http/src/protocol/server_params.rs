//! Read-only snapshot of transport and environment metadata.

use std::collections::BTreeMap;

use http::Uri;
use http::uri::{Authority, Scheme};

/// Server parameters, keyed the CGI way (`REQUEST_METHOD`, `HTTP_HOST`, `SERVER_PORT`, ...).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServerParams {
    inner: BTreeMap<String, String>,
}

impl ServerParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.inner.get(key).map(String::as_str)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.inner.insert(key.into(), value.into())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.inner.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Rebuilds the request URI from the `HTTPS`, `HTTP_HOST`, `SERVER_NAME`, `SERVER_ADDR`,
    /// `SERVER_PORT`, `REQUEST_URI` and `QUERY_STRING` entries.
    ///
    /// The host comes from `HTTP_HOST` (including its port), falling back to `SERVER_NAME` and
    /// then `SERVER_ADDR`. Without any host the result is origin-form (path and query only).
    /// Default ports are dropped from the authority.
    ///
    /// # Errors
    ///
    /// Returns an error when the collected parts do not form a valid URI.
    pub fn effective_uri(&self) -> Result<Uri, http::Error> {
        let https = self.get("HTTPS").is_some_and(|v| !v.is_empty() && v != "off");
        let scheme = if https { Scheme::HTTPS } else { Scheme::HTTP };

        let (mut host, mut port) = (None, None);
        if let Some(authority) = self.get("HTTP_HOST") {
            (host, port) = split_authority(authority);
        } else if let Some(name) = self.get("SERVER_NAME") {
            host = Some(name.to_string());
        } else if let Some(addr) = self.get("SERVER_ADDR") {
            host = Some(addr.to_string());
        }

        if port.is_none() {
            port = self.get("SERVER_PORT").and_then(|p| p.trim().parse::<u16>().ok());
        }

        let (path, mut query) = match self.get("REQUEST_URI") {
            Some(request_uri) => match request_uri.split_once('?') {
                Some((path, query)) => (path, Some(query)),
                None => (request_uri, None),
            },
            None => ("", None),
        };
        if query.is_none() {
            query = self.get("QUERY_STRING").filter(|q| !q.is_empty());
        }

        let path = if path.is_empty() { "/" } else { path };
        let path_and_query = match query {
            Some(query) => format!("{path}?{query}"),
            None => path.to_string(),
        };

        let builder = Uri::builder().path_and_query(path_and_query);
        let Some(host) = host.filter(|h| !h.is_empty()) else {
            return builder.build();
        };

        let default_port = if https { 443 } else { 80 };
        let authority = match port {
            Some(port) if port != default_port => format!("{host}:{port}"),
            _ => host,
        };

        builder.scheme(scheme).authority(authority.parse::<Authority>()?).build()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ServerParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self { inner: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect() }
    }
}

/// Splits `host[:port]` into its parts, yielding nothing for an unparsable authority.
fn split_authority(authority: &str) -> (Option<String>, Option<u16>) {
    match authority.parse::<Authority>() {
        Ok(authority) => (Some(authority.host().to_string()), authority.port_u16()),
        Err(_) => (None, None),
    }
}
