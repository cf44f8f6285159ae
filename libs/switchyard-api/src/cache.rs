use std::fmt;
use std::sync::Arc;

use moka::policy::EvictionPolicy;
use moka::sync::Cache;

use crate::error::PluginError;
use crate::schema::{Schema, SchemaRef};

/// Default number of derived schemas kept per transform instance.
pub const DEFAULT_SCHEMA_CACHE_SIZE: u64 = 16;

/// Bounded LRU map `(source schema, added field) → derived schema`.
///
/// Lookups are structural on the source schema. A hit returns the very
/// `Arc` handed out on the first miss, so repeated applications over
/// equal input schemas produce one stable output schema.
/// Concurrent misses on the same key are coalesced: the derivation runs
/// once and every caller receives its result.
///
/// Schema equality ignores `doc`, so sources differing only in doc share an
/// entry and get the doc of whichever source was derived first.
pub struct SchemaCache {
    inner: Cache<(SchemaRef, String), SchemaRef>,
}

/// Validate a `schemaCacheSize` option. A zero-sized cache never hits.
pub fn check_capacity(capacity: u64) -> Result<u64, PluginError> {
    if capacity == 0 {
        return Err(PluginError::config(
            "parameter 'schemaCacheSize': must be at least 1",
        ));
    }
    Ok(capacity)
}

impl SchemaCache {
    /// Capacity is raised to 1 if given as 0.
    pub fn new(capacity: u64) -> Self {
        Self {
            inner: Cache::builder()
                .max_capacity(capacity.max(1))
                .eviction_policy(EvictionPolicy::lru())
                .build(),
        }
    }

    /// Cached schema for `(source, field)`, running `derive` on a miss.
    ///
    /// A failed derivation is not cached.
    pub fn get_or_derive<F>(
        &self,
        source: &SchemaRef,
        field: &str,
        derive: F,
    ) -> Result<SchemaRef, PluginError>
    where
        F: FnOnce() -> Result<Schema, PluginError>,
    {
        let key = (Arc::clone(source), field.to_string());
        self.inner
            .try_get_with(key, || {
                tracing::debug!(
                    schema = source.name().unwrap_or("<anonymous>"),
                    field,
                    "deriving schema"
                );
                derive().map(Arc::new)
            })
            .map_err(PluginError::from)
    }

    /// Number of live entries, after pending evictions are applied.
    pub fn entry_count(&self) -> u64 {
        self.inner.run_pending_tasks();
        self.inner.entry_count()
    }
}

impl Default for SchemaCache {
    fn default() -> Self {
        Self::new(DEFAULT_SCHEMA_CACHE_SIZE)
    }
}

impl fmt::Debug for SchemaCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaCache")
            .field("entries", &self.inner.entry_count())
            .finish()
    }
}
