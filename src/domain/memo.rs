//! Pass-through memoization of fetch results.
//!
//! A [`Memo`] maps `(operation name, serialized arguments)` to the shared
//! result of the first call with those arguments. Failures are stored too;
//! callers clear a failed entry explicitly when they want the next call to
//! reach the network again. There is no TTL and no size bound.

use crate::domain::error::FetchResult;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

struct Cached<T> {
    stored_at: DateTime<Utc>,
    value: Arc<FetchResult<T>>,
}

pub struct Memo<T> {
    name: &'static str,
    entries: Mutex<HashMap<String, Cached<T>>>,
}

impl<T> Memo<T> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Cached<T>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn key<A: Serialize + ?Sized>(&self, args: &A) -> Option<String> {
        match serde_json::to_string(args) {
            Ok(json) => Some(format!("{}:{}", self.name, json)),
            Err(e) => {
                log::warn!("{}: arguments not cacheable: {}", self.name, e);
                None
            }
        }
    }

    /// Returns the cached result for `args`, calling `fetch` only on a miss.
    ///
    /// The lock is not held while `fetch` runs. If two callers race on the
    /// same key the first stored result wins and both receive it.
    pub fn get_or_fetch<A, F>(&self, args: &A, fetch: F) -> Arc<FetchResult<T>>
    where
        A: Serialize + ?Sized,
        F: FnOnce() -> FetchResult<T>,
    {
        let Some(key) = self.key(args) else {
            return Arc::new(fetch());
        };

        if let Some(hit) = self.lock().get(&key) {
            log::debug!("memo hit {}", key);
            return Arc::clone(&hit.value);
        }

        log::debug!("memo miss {}", key);
        let value = Arc::new(fetch());
        let mut entries = self.lock();
        let entry = entries.entry(key).or_insert(Cached {
            stored_at: Utc::now(),
            value,
        });
        Arc::clone(&entry.value)
    }

    pub fn get<A: Serialize + ?Sized>(&self, args: &A) -> Option<Arc<FetchResult<T>>> {
        let key = self.key(args)?;
        self.lock().get(&key).map(|c| Arc::clone(&c.value))
    }

    pub fn stored_at<A: Serialize + ?Sized>(&self, args: &A) -> Option<DateTime<Utc>> {
        let key = self.key(args)?;
        self.lock().get(&key).map(|c| c.stored_at)
    }

    /// Removes the entry for `args`. Returns whether one was present.
    pub fn clear<A: Serialize + ?Sized>(&self, args: &A) -> bool {
        match self.key(args) {
            Some(key) => self.lock().remove(&key).is_some(),
            None => false,
        }
    }

    pub fn clear_all(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
