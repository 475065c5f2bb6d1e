//! In-memory index: the build-time staging area before a disk commit.

use ahash::AHashMap;

use crate::error::Result;
use crate::index::docmeta::DocMeta;
use crate::index::Index;
use crate::postings::PostingsList;

/// A term → postings map held entirely in memory.
///
/// This is the staging area a corpus is ingested into before the persistent
/// index commits it to disk. It holds the whole vocabulary and collection in
/// memory; scalability is bounded by available memory, which is an accepted
/// limitation of the design.
#[derive(Debug, Default)]
pub struct InMemoryIndex {
    terms: AHashMap<String, PostingsList>,
    docs: DocMeta,
}

impl InMemoryIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        InMemoryIndex::default()
    }

    /// Number of distinct terms in the index.
    pub fn vocab_size(&self) -> usize {
        self.terms.len()
    }

    /// Iterate over `(term, postings)` pairs in arbitrary order.
    pub fn terms(&self) -> impl Iterator<Item = (&str, &PostingsList)> {
        self.terms.iter().map(|(t, pl)| (t.as_str(), pl))
    }

    /// Discard all terms and postings, keeping document metadata.
    pub(crate) fn clear_terms(&mut self) {
        self.terms = AHashMap::new();
    }

    pub(crate) fn doc_meta_mut(&mut self) -> &mut DocMeta {
        &mut self.docs
    }
}

impl Index for InMemoryIndex {
    fn insert(&mut self, token: &str, doc_id: u32, offset: u32) -> Result<()> {
        self.terms
            .entry(token.to_string())
            .or_default()
            .insert_or_merge(doc_id, offset);
        Ok(())
    }

    fn register_doc(&mut self, doc_id: u32, name: &str, length: u32) -> Result<()> {
        self.docs.register(doc_id, name, length);
        Ok(())
    }

    fn postings(&self, token: &str) -> Result<Option<PostingsList>> {
        Ok(self.terms.get(token).cloned())
    }

    fn doc_meta(&self) -> &DocMeta {
        &self.docs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_lookup() {
        let mut index = InMemoryIndex::new();
        index.insert("cat", 1, 0).unwrap();
        index.insert("hat", 1, 1).unwrap();
        index.insert("cat", 2, 5).unwrap();

        assert_eq!(index.vocab_size(), 2);

        let cat = index.postings("cat").unwrap().unwrap();
        let ids: Vec<u32> = cat.iter().map(|e| e.doc_id).collect();
        assert_eq!(ids, vec![1, 2]);

        assert!(index.postings("dog").unwrap().is_none());
    }

    #[test]
    fn test_repeated_occurrences_merge_offsets() {
        let mut index = InMemoryIndex::new();
        index.insert("cat", 1, 0).unwrap();
        index.insert("cat", 1, 4).unwrap();
        index.insert("cat", 1, 9).unwrap();

        let cat = index.postings("cat").unwrap().unwrap();
        assert_eq!(cat.len(), 1);
        assert_eq!(cat.get(0).unwrap().offsets, vec![0, 4, 9]);
    }

    #[test]
    fn test_register_doc() {
        let mut index = InMemoryIndex::new();
        index.register_doc(1, "a.txt", 10).unwrap();
        index.register_doc(2, "b.txt", 20).unwrap();

        assert_eq!(index.doc_meta().doc_count(), 2);
        assert_eq!(index.doc_meta().name(2), Some("b.txt"));
    }
}
