//! # Session Module
//!
//! The explicit session object passed through the render path.
//!
//! A Session owns:
//! - the navigation state (current page)
//! - the single-entry load cache
//! - the current upload, loaded or rejected
//!
//! Nothing here is persisted. A new upload discards the previous one; the
//! cleaned cohort is re-derived from the cached table on every render.

use crate::cache::{CacheOutcome, CacheStats, CachedLoad, Digest, LoadCache};
use crate::navigation::{NavigationState, Page};
use crate::{Cohort, CohortError, Ingestor, Notice, Table};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A successfully parsed upload.
#[derive(Debug, Clone)]
pub struct LoadedUpload {
    pub name: String,
    pub digest: Digest,
    pub size: usize,
    pub table: Arc<Table>,
}

/// The state of the most recent upload.
#[derive(Debug, Clone)]
pub enum UploadState {
    /// The file parsed; validation happens at render time.
    Loaded(LoadedUpload),
    /// The file could not be parsed.
    Rejected { name: String, error: CohortError },
}

/// Summary returned to the uploader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadReceipt {
    pub name: String,
    pub digest: String,
    pub size: usize,
    pub rows: usize,
    pub columns: Vec<String>,
    pub cache: CacheOutcome,
}

/// One interactive session.
#[derive(Debug, Default)]
pub struct Session {
    navigation: NavigationState,
    cache: LoadCache,
    upload: Option<UploadState>,
}

impl Session {
    /// Create a fresh session on the landing page with no upload.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // NAVIGATION
    // =========================================================================

    /// The page being shown.
    #[must_use]
    pub fn current_page(&self) -> Page {
        self.navigation.current()
    }

    /// Switch pages. Returns the previous page.
    pub fn select_page(&mut self, page: Page) -> Page {
        self.navigation.select(page)
    }

    /// Switch pages by slug.
    pub fn select_page_slug(&mut self, slug: &str) -> Result<Page, CohortError> {
        self.navigation.select_slug(slug)
    }

    // =========================================================================
    // UPLOADS
    // =========================================================================

    /// Accept a new upload, replacing the previous one.
    ///
    /// Parsing is memoized by content digest. A parse failure is remembered
    /// as `UploadState::Rejected` and returned.
    pub fn upload(&mut self, name: &str, bytes: &[u8]) -> Result<UploadReceipt, CohortError> {
        let name = name.to_string();
        match self.cache.load(bytes) {
            Ok(CachedLoad {
                table,
                digest,
                outcome,
            }) => {
                let receipt = UploadReceipt {
                    name: name.clone(),
                    digest: digest.to_hex(),
                    size: bytes.len(),
                    rows: table.row_count(),
                    columns: table.columns().to_vec(),
                    cache: outcome,
                };
                self.upload = Some(UploadState::Loaded(LoadedUpload {
                    name,
                    digest,
                    size: bytes.len(),
                    table,
                }));
                Ok(receipt)
            }
            Err(error) => {
                self.upload = Some(UploadState::Rejected {
                    name,
                    error: error.clone(),
                });
                Err(error)
            }
        }
    }

    /// The current upload, if any.
    #[must_use]
    pub fn upload_state(&self) -> Option<&UploadState> {
        self.upload.as_ref()
    }

    /// The loaded upload, if the last one parsed.
    #[must_use]
    pub fn loaded(&self) -> Option<&LoadedUpload> {
        match &self.upload {
            Some(UploadState::Loaded(loaded)) => Some(loaded),
            _ => None,
        }
    }

    /// Forget the current upload. The cache entry is dropped too.
    pub fn clear_upload(&mut self) {
        self.upload = None;
        self.cache.clear();
    }

    /// Clean the loaded table into a cohort.
    ///
    /// `None` when nothing is loaded; `Some(Err)` when the table fails
    /// validation (e.g. missing required columns).
    #[must_use]
    pub fn cohort(&self) -> Option<Result<Cohort, CohortError>> {
        self.loaded().map(|loaded| Ingestor::clean(&loaded.table))
    }

    /// The message describing the upload state.
    #[must_use]
    pub fn upload_notice(&self) -> Notice {
        match &self.upload {
            Some(UploadState::Loaded(loaded)) => {
                Notice::success(format!("File uploaded: {}", loaded.name))
            }
            Some(UploadState::Rejected { name, error }) => {
                Notice::error(format!("Could not read {}: {}", name, error))
            }
            None => Notice::info("Upload a CSV file to start the analysis."),
        }
    }

    /// Cache counters.
    #[must_use]
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NoticeLevel;

    const CSV: &[u8] = b"Age,Gender,Weight\n3 months,M,10\n6 months,F,20\n";

    #[test]
    fn new_session_has_no_upload() {
        let session = Session::new();
        assert_eq!(session.current_page(), Page::Home);
        assert!(session.upload_state().is_none());
        assert!(session.cohort().is_none());
        assert_eq!(session.upload_notice().level, NoticeLevel::Info);
    }

    #[test]
    fn upload_then_cohort() {
        let mut session = Session::new();
        let receipt = session.upload("cohort.csv", CSV).expect("upload");
        assert_eq!(receipt.rows, 2);
        assert_eq!(receipt.cache, CacheOutcome::Miss);

        let cohort = session.cohort().expect("loaded").expect("clean");
        assert_eq!(cohort.distinct_ages(), vec![3.0, 6.0]);
        assert_eq!(session.upload_notice().level, NoticeLevel::Success);
    }

    #[test]
    fn reupload_hits_cache() {
        let mut session = Session::new();
        session.upload("a.csv", CSV).expect("upload");
        let receipt = session.upload("a.csv", CSV).expect("upload");
        assert_eq!(receipt.cache, CacheOutcome::Hit);
        assert_eq!(receipt.digest, Digest::of(CSV).to_hex());
        assert_eq!(session.cache_stats().hits, 1);
        assert_eq!(session.loaded().map(|l| l.digest), Some(Digest::of(CSV)));
    }

    #[test]
    fn rejected_upload_replaces_previous() {
        let mut session = Session::new();
        session.upload("a.csv", CSV).expect("upload");
        assert!(session.upload("b.csv", b"").is_err());
        assert!(session.loaded().is_none());
        assert!(session.cohort().is_none());
        assert_eq!(session.upload_notice().level, NoticeLevel::Error);
    }

    #[test]
    fn navigation_is_independent_of_upload() {
        let mut session = Session::new();
        session.select_page(Page::Metrics);
        session.upload("a.csv", CSV).expect("upload");
        session.select_page(Page::Team);
        assert_eq!(session.current_page(), Page::Team);
        assert!(session.loaded().is_some());
    }

    #[test]
    fn clear_upload_forgets_file() {
        let mut session = Session::new();
        session.upload("a.csv", CSV).expect("upload");
        session.clear_upload();
        assert!(session.upload_state().is_none());
        assert!(session.cache_stats().cached.is_none());
    }
}
