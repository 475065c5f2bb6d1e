//! Index implementations.
//!
//! [`InMemoryIndex`] is the build-time staging area; [`PersistentHashedIndex`]
//! commits it to a fixed-slot dictionary file plus a data heap and serves
//! point lookups against those files.

pub mod docmeta;
pub mod memory;
pub mod persistent;

pub use docmeta::DocMeta;
pub use memory::InMemoryIndex;
pub use persistent::{CommitStats, IndexConfig, PersistentHashedIndex};

use crate::error::Result;
use crate::postings::PostingsList;

/// Trait for term → postings indexes.
///
/// The query resolver and the ranker operate on any implementation through
/// this trait, so tests can run against the in-memory index and production
/// against the persistent one.
pub trait Index {
    /// Record an occurrence of `token` at word `offset` in `doc_id`.
    fn insert(&mut self, token: &str, doc_id: u32, offset: u32) -> Result<()>;

    /// Record a document's name and length.
    fn register_doc(&mut self, doc_id: u32, name: &str, length: u32) -> Result<()>;

    /// Get the postings for a term, or `None` if the term is not indexed.
    fn postings(&self, token: &str) -> Result<Option<PostingsList>>;

    /// Document metadata (names and lengths).
    fn doc_meta(&self) -> &DocMeta;
}
