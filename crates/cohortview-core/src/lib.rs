//! # cohortview-core
//!
//! The data engine for cohortview - THE LOGIC.
//!
//! This crate turns an uploaded CSV of biochemical measurements into the
//! views of the cohort dashboard:
//!
//! ```text
//! bytes ──► LoadCache/Ingestor::load ──► Table
//!                                          │
//!                    Ingestor::clean ◄─────┘  (required columns, age normalization)
//!                          │
//!                          ▼
//!                        Cohort ──► SelectionOptions ──► Selection
//!                                                            │
//!                          Compositor ◄──────────────────────┘
//!                              │
//!                              ▼
//!                 MetricsView { BoxChart, FilteredTable }
//! ```
//!
//! ## Architectural Constraints
//!
//! - Has NO async, NO network dependencies (pure Rust)
//! - Holds no global state; the [`Session`] is passed explicitly
//! - Never panics; every failure is a [`CohortError`] that maps to a [`Notice`]

// =============================================================================
// MODULES
// =============================================================================

pub mod age;
pub mod cache;
pub mod chart;
pub mod cohort;
pub mod compositor;
pub mod ingestor;
pub mod navigation;
pub mod primitives;
pub mod selection;
pub mod session;
pub mod table;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{Cell, CohortError, GroupingMode, Notice, NoticeLevel, format_number};

// =============================================================================
// RE-EXPORTS: Data Pipeline
// =============================================================================

pub use age::{normalize_age, normalize_age_text};
pub use cache::{CacheOutcome, CacheStats, CachedLoad, Digest, LoadCache};
pub use chart::{BoxChart, BoxStats, BoxTrace, Figure};
pub use cohort::Cohort;
pub use compositor::{Compositor, MetricsView};
pub use ingestor::Ingestor;
pub use selection::{
    FilteredTable, Selection, SelectionOptions, SelectionRequest, default_age_selection,
    filter_by_ages,
};
pub use table::Table;

// =============================================================================
// RE-EXPORTS: Session & Navigation
// =============================================================================

pub use navigation::{NavigationState, Page};
pub use session::{LoadedUpload, Session, UploadReceipt, UploadState};
