//! # Load Cache
//!
//! Single-entry memo for the upload parse step, keyed by the BLAKE3 digest
//! of the uploaded bytes. Re-rendering the same file never re-parses it; a
//! different file replaces the entry.

use crate::ingestor::Ingestor;
use crate::{CohortError, Table};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// BLAKE3 digest of an upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Digest([u8; 32]);

impl Digest {
    /// Digest of a byte slice.
    #[must_use]
    pub fn of(bytes: &[u8]) -> Self {
        Self(*blake3::hash(bytes).as_bytes())
    }

    /// Lowercase hex rendering.
    #[must_use]
    pub fn to_hex(&self) -> String {
        blake3::Hash::from(self.0).to_hex().to_string()
    }
}

/// Whether a load was served from the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheOutcome {
    Hit,
    Miss,
}

/// Counters exposed for status reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    /// Hex digest of the cached upload, if any.
    pub cached: Option<String>,
}

/// Result of a cache lookup: the parsed table, its digest, hit or miss.
#[derive(Debug, Clone)]
pub struct CachedLoad {
    pub table: Arc<Table>,
    pub digest: Digest,
    pub outcome: CacheOutcome,
}

/// The single-entry load cache.
#[derive(Debug, Default)]
pub struct LoadCache {
    entry: Option<(Digest, Arc<Table>)>,
    hits: u64,
    misses: u64,
}

impl LoadCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `bytes` with [`Ingestor::load`], or return the cached table.
    pub fn load(&mut self, bytes: &[u8]) -> Result<CachedLoad, CohortError> {
        self.load_with(bytes, Ingestor::load)
    }

    /// Same as [`load`](Self::load) with an explicit parse function.
    ///
    /// Failed loads are not cached and leave the current entry in place.
    pub fn load_with<F>(
        &mut self,
        bytes: &[u8],
        parse: F,
    ) -> Result<CachedLoad, CohortError>
    where
        F: FnOnce(&[u8]) -> Result<Table, CohortError>,
    {
        let digest = Digest::of(bytes);
        if let Some((cached, table)) = &self.entry {
            if *cached == digest {
                self.hits = self.hits.saturating_add(1);
                return Ok(CachedLoad {
                    table: Arc::clone(table),
                    digest,
                    outcome: CacheOutcome::Hit,
                });
            }
        }

        self.misses = self.misses.saturating_add(1);
        let table = Arc::new(parse(bytes)?);
        self.entry = Some((digest, Arc::clone(&table)));
        Ok(CachedLoad {
            table,
            digest,
            outcome: CacheOutcome::Miss,
        })
    }

    /// Check whether the given digest is cached.
    #[must_use]
    pub fn contains(&self, digest: &Digest) -> bool {
        self.entry.as_ref().is_some_and(|(d, _)| d == digest)
    }

    /// Current counters.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            cached: self.entry.as_ref().map(|(d, _)| d.to_hex()),
        }
    }

    /// Drop the cached entry. Counters are kept.
    pub fn clear(&mut self) {
        self.entry = None;
    }
}
