//! Request-scoped attributes used by handlers to annotate a request for each other, for
//! example with route parameters or an authenticated principal.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

type AnyValue = Arc<dyn Any + Send + Sync>;

/// A string-keyed map of arbitrary typed values.
///
/// Values are reference counted, cloning the map is cheap and shares the stored values.
#[derive(Clone, Default)]
pub struct Attributes {
    map: HashMap<String, AnyValue>,
}

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `value` under `key`, returning true when an earlier value was replaced.
    pub fn insert<T: Any + Send + Sync>(&mut self, key: impl Into<String>, value: T) -> bool {
        self.map.insert(key.into(), Arc::new(value)).is_some()
    }

    /// Returns the value under `key` if it exists and has type `T`.
    pub fn get<T: Any + Send + Sync>(&self, key: &str) -> Option<&T> {
        self.map.get(key).and_then(|value| value.downcast_ref::<T>())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.map.contains_key(key)
    }

    pub fn remove(&mut self, key: &str) -> bool {
        self.map.remove(key).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.map.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl fmt::Debug for Attributes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.map.keys()).finish()
    }
}
