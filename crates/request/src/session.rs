//! Session handles and the rule that binds one to each request.
//!
//! Persistence belongs to an external session store, this module only consumes its
//! construction contract through [`SessionFactory`]: a session is either resumed from the id in
//! the session cookie, or freshly created with a new id when the cookie is missing.

use std::fmt;
use std::sync::Arc;

use comet_http::protocol::Cookies;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::trace;
use uuid::Uuid;

/// Cookie name used when the configuration does not name one
pub const DEFAULT_COOKIE_NAME: &str = "SID";

/// Identifier of a session, as carried by the session cookie.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    /// Generates a new random identifier.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for SessionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SessionId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for SessionId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// A session handle bound to one request.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    id: SessionId,
    fresh: bool,
    data: Map<String, Value>,
    modified: bool,
}

impl Session {
    /// Creates a fresh session with a newly generated id.
    pub fn new() -> Self {
        Self::with_id(SessionId::generate(), true)
    }

    /// Resumes the session identified by `id`.
    pub fn resume(id: impl Into<SessionId>) -> Self {
        Self::with_id(id.into(), false)
    }

    fn with_id(id: SessionId, fresh: bool) -> Self {
        Self { id, fresh, data: Map::new(), modified: false }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    /// Returns true when the session was created for this request rather than resumed.
    pub fn is_new(&self) -> bool {
        self.fresh
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.modified = true;
        self.data.insert(key.into(), value.into())
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        let removed = self.data.remove(key);
        self.modified |= removed.is_some();
        removed
    }

    /// Returns true when data was changed through this handle.
    pub fn is_modified(&self) -> bool {
        self.modified
    }

    pub fn data(&self) -> &Map<String, Value> {
        &self.data
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

/// Construction contract of the external session store.
#[cfg_attr(test, mockall::automock)]
pub trait SessionFactory: Send + Sync {
    /// Creates a new session with a newly generated id.
    fn create(&self) -> Session;

    /// Resumes the session stored under `id`.
    fn resume(&self, id: &str) -> Session;
}

/// Factory building plain in-memory handles through [`Session::new`] and [`Session::resume`].
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultSessionFactory;

impl SessionFactory for DefaultSessionFactory {
    fn create(&self) -> Session {
        Session::new()
    }

    fn resume(&self, id: &str) -> Session {
        Session::resume(id)
    }
}

/// Session settings, loadable from an application's configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Name of the cookie carrying the session id
    pub cookie_name: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self { cookie_name: DEFAULT_COOKIE_NAME.to_string() }
    }
}

/// Decides whether a request resumes an existing session or starts a new one.
#[derive(Clone)]
pub struct SessionBinder {
    factory: Arc<dyn SessionFactory>,
}

impl SessionBinder {
    pub fn new(factory: Arc<dyn SessionFactory>) -> Self {
        Self { factory }
    }

    /// Resumes the session named by the `cookie_name` cookie, or creates a fresh one when the
    /// cookie is missing.
    ///
    /// A present cookie is always handed to [`SessionFactory::resume`], even when its value is
    /// empty. Rejecting unusable ids is up to the factory.
    pub fn bind(&self, cookies: &Cookies, cookie_name: &str) -> Session {
        match cookies.get(cookie_name) {
            Some(id) => {
                trace!(cookie_name, session_id = %id, "resume session");
                self.factory.resume(id)
            }
            None => {
                let session = self.factory.create();
                trace!(cookie_name, session_id = %session.id(), "create session");
                session
            }
        }
    }
}

impl Default for SessionBinder {
    fn default() -> Self {
        Self::new(Arc::new(DefaultSessionFactory))
    }
}

impl fmt::Debug for SessionBinder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionBinder").finish_non_exhaustive()
    }
}
