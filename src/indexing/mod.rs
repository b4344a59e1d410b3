//! Indexing core
//!
//! # Components
//!
//! - `LemmaExtractor`: turns page content into lemma counts
//! - `IndexWriter`: persists a page and its lemmas
//! - `SiteLifecycle`: site creation and status transitions
//! - `IndexingService`: starts, stops and single-page re-indexing

mod lemmas;
mod service;
mod sites;
mod writer;

pub use lemmas::{LemmaCounts, LemmaExtractor, WordLemmaExtractor};
pub use service::IndexingService;
pub use sites::{SiteLifecycle, INTERRUPTED_MESSAGE};
pub use writer::IndexWriter;
