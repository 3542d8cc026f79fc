//! # Memoization Cache
//!
//! Holds artifacts compiled from a schema (validators, derived defaults and
//! shapes) so repeated use of the same schema object reuses them.
//!
//! Entries are keyed by *identity*, never by deep equality: the address of
//! the `Arc`'d schema, the address of an optional options object, a kind
//! tag, and the artifact's type. Each entry holds weak references to its
//! schema and options. While an entry exists those addresses cannot be
//! reused, and once the schema is dropped the entry is stale and ignored.
//! Stale entries are swept on every insert, so the cache never holds more
//! than the live entries plus those gone stale since the last insert.
//!
//! The cache is an owned value, not global state. Construct one per
//! engine (or per test) and share it by reference.
//!
//! ## Concurrency
//!
//! Builds run outside the lock, so two threads missing on the same key at
//! once may both build. The first insert wins and the loser's artifact is
//! discarded, so at most one entry ever exists per key.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, Weak};

use parking_lot::RwLock;

use formshape_core::StructuralSchema;

type Erased = Arc<dyn Any + Send + Sync>;

/// Identity of one cached artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct CacheKey {
    kind: &'static str,
    artifact: TypeId,
    schema: usize,
    options: usize,
}

/// Lookup handle built from the objects an artifact was derived from.
#[derive(Clone)]
pub struct Identity {
    key: CacheKey,
    schema: Weak<StructuralSchema>,
    options: Option<Weak<dyn Any + Send + Sync>>,
}

impl Identity {
    /// Identity of an artifact of `kind` derived from `schema` alone.
    pub fn new(kind: &'static str, schema: &Arc<StructuralSchema>) -> Self {
        Self {
            key: CacheKey {
                kind,
                artifact: TypeId::of::<()>(),
                schema: Arc::as_ptr(schema) as usize,
                options: 0,
            },
            schema: Arc::downgrade(schema),
            options: None,
        }
    }

    /// Also key on the identity of an options object.
    pub fn with_options<O: Any + Send + Sync>(mut self, options: &Arc<O>) -> Self {
        self.key.options = Arc::as_ptr(options) as *const () as usize;
        let weak: Weak<dyn Any + Send + Sync> = Arc::downgrade(options) as Weak<dyn Any + Send + Sync>;
        self.options = Some(weak);
        self
    }

    fn typed<T: Any>(mut self) -> Self {
        self.key.artifact = TypeId::of::<T>();
        self
    }
}

impl std::fmt::Debug for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Identity").field("key", &self.key).finish()
    }
}

struct CacheEntry {
    schema: Weak<StructuralSchema>,
    options: Option<Weak<dyn Any + Send + Sync>>,
    value: Erased,
}

impl CacheEntry {
    fn is_live(&self) -> bool {
        self.schema.strong_count() > 0
            && self.options.as_ref().map_or(true, |o| o.strong_count() > 0)
    }
}

/// Identity-keyed store of schema-derived artifacts.
#[derive(Default)]
pub struct MemoCache {
    entries: RwLock<HashMap<CacheKey, CacheEntry>>,
}

impl MemoCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached artifact for `identity`, building it on a miss.
    ///
    /// # Errors
    ///
    /// Propagates the build error; nothing is cached in that case.
    pub fn get_or_try_insert_with<T, E, F>(&self, identity: Identity, build: F) -> Result<Arc<T>, E>
    where
        T: Any + Send + Sync,
        F: FnOnce() -> Result<T, E>,
    {
        let identity = identity.typed::<T>();
        if let Some(hit) = self.lookup::<T>(&identity.key) {
            tracing::debug!(kind = identity.key.kind, "memo cache hit");
            return Ok(hit);
        }

        tracing::debug!(kind = identity.key.kind, "memo cache miss; building");
        let built = Arc::new(build()?);

        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|_, e| e.is_live());
        if entries.len() < before {
            tracing::debug!(dropped = before - entries.len(), "memo cache dropped stale entries");
        }
        if let Some(existing) = entries
            .get(&identity.key)
            .and_then(|e| Arc::clone(&e.value).downcast::<T>().ok())
        {
            return Ok(existing);
        }
        let erased: Erased = Arc::clone(&built) as Erased;
        entries.insert(
            identity.key,
            CacheEntry {
                schema: identity.schema,
                options: identity.options,
                value: erased,
            },
        );
        Ok(built)
    }

    fn lookup<T: Any + Send + Sync>(&self, key: &CacheKey) -> Option<Arc<T>> {
        let entries = self.entries.read();
        let entry = entries.get(key).filter(|e| e.is_live())?;
        Arc::clone(&entry.value).downcast::<T>().ok()
    }

    /// Drop entries whose schema or options no longer exist. Returns the
    /// number removed.
    pub fn purge(&self) -> usize {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|_, e| e.is_live());
        before - entries.len()
    }

    /// Number of entries, stale ones included.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }
}

impl std::fmt::Debug for MemoCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoCache").field("entries", &self.len()).finish()
    }
}
