//! Postings model: per-document occurrence data and ordered postings lists.
//!
//! A [`PostingEntry`] records one document's occurrences of a term; a
//! [`PostingsList`] is the ordered collection of entries for one term,
//! unique by document ID and kept in ascending document-ID order so the
//! linear merge algorithms in the query resolver stay O(n).

use crate::error::{FalcataError, Result};

/// One document's occurrence data for a term.
///
/// Term frequency is the number of recorded offsets. The score field is
/// only populated by ranked retrieval; it plays no role in boolean or
/// phrase resolution.
#[derive(Debug, Clone, Default)]
pub struct PostingEntry {
    /// The document identifier.
    pub doc_id: u32,

    /// Relevance score assigned by the ranker.
    pub score: f64,

    /// Word offsets of the term within the document, in insertion order.
    pub offsets: Vec<u32>,
}

impl PostingEntry {
    /// Create an entry with no offsets and a zero score.
    pub fn new(doc_id: u32) -> Self {
        PostingEntry {
            doc_id,
            score: 0.0,
            offsets: Vec::new(),
        }
    }

    /// Create an entry carrying a single offset.
    pub fn with_offset(doc_id: u32, offset: u32) -> Self {
        PostingEntry {
            doc_id,
            score: 0.0,
            offsets: vec![offset],
        }
    }

    /// Create an entry carrying only a score.
    pub fn with_score(doc_id: u32, score: f64) -> Self {
        PostingEntry {
            doc_id,
            score,
            offsets: Vec::new(),
        }
    }

    /// Record another occurrence of the term in this document.
    pub fn add_offset(&mut self, offset: u32) {
        self.offsets.push(offset);
    }

    /// The term frequency in this document.
    pub fn term_freq(&self) -> usize {
        self.offsets.len()
    }

    /// Render this entry in the on-disk text form `docID:off1,...,offN,score`.
    fn encode_into(&self, out: &mut String) {
        out.push_str(&self.doc_id.to_string());
        out.push(':');
        for offset in &self.offsets {
            out.push_str(&offset.to_string());
            out.push(',');
        }
        out.push_str(&self.score.to_string());
    }

    fn decode(text: &str) -> Result<Self> {
        let (doc_part, rest) = text
            .split_once(':')
            .ok_or_else(|| FalcataError::decode(format!("posting entry missing ':': {text:?}")))?;

        let doc_id: u32 = doc_part
            .parse()
            .map_err(|_| FalcataError::decode(format!("unparsable docID: {doc_part:?}")))?;

        let fields: Vec<&str> = rest.split(',').collect();
        // The last field is the score; everything before it is an offset.
        if fields.len() < 2 {
            return Err(FalcataError::decode(format!(
                "posting entry has no offset fields: {text:?}"
            )));
        }

        let score: f64 = fields[fields.len() - 1]
            .parse()
            .map_err(|_| FalcataError::decode(format!("unparsable score: {text:?}")))?;

        let mut offsets = Vec::with_capacity(fields.len() - 1);
        for field in &fields[..fields.len() - 1] {
            let offset: u32 = field
                .parse()
                .map_err(|_| FalcataError::decode(format!("unparsable offset: {field:?}")))?;
            offsets.push(offset);
        }

        Ok(PostingEntry {
            doc_id,
            score,
            offsets,
        })
    }
}

// Entry identity is defined by document ID only; offsets and scores do not
// participate in equality.
impl PartialEq for PostingEntry {
    fn eq(&self, other: &Self) -> bool {
        self.doc_id == other.doc_id
    }
}

impl Eq for PostingEntry {}

/// An ordered sequence of [`PostingEntry`] values for one term.
///
/// Canonical order is ascending document ID with no duplicates. Ranked
/// retrieval re-sorts a copy by descending score before returning it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PostingsList {
    entries: Vec<PostingEntry>,
}

impl PostingsList {
    /// Create an empty postings list.
    pub fn new() -> Self {
        PostingsList::default()
    }

    /// Number of postings in this list (the term's document frequency).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check whether the list is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Get the entry at position `i`.
    pub fn get(&self, i: usize) -> Option<&PostingEntry> {
        self.entries.get(i)
    }

    /// The entries as a slice, in list order.
    pub fn entries(&self) -> &[PostingEntry] {
        &self.entries
    }

    /// Iterate over the entries in list order.
    pub fn iter(&self) -> std::slice::Iter<'_, PostingEntry> {
        self.entries.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> std::slice::IterMut<'_, PostingEntry> {
        self.entries.iter_mut()
    }

    /// Check whether the list contains an entry for `doc_id`.
    pub fn contains(&self, doc_id: u32) -> bool {
        self.entries.iter().any(|e| e.doc_id == doc_id)
    }

    /// Record an occurrence of the term at `offset` in `doc_id`.
    ///
    /// If the document already has an entry, the offset is appended to it;
    /// otherwise a new entry is inserted in ascending document-ID order.
    /// Single linear pass.
    pub fn insert_or_merge(&mut self, doc_id: u32, offset: u32) {
        match self.entries.iter().position(|e| e.doc_id >= doc_id) {
            Some(i) if self.entries[i].doc_id == doc_id => self.entries[i].add_offset(offset),
            Some(i) => self
                .entries
                .insert(i, PostingEntry::with_offset(doc_id, offset)),
            None => self.entries.push(PostingEntry::with_offset(doc_id, offset)),
        }
    }

    /// Append an entry, assuming ascending document-ID order.
    ///
    /// Used by the merge algorithms, which produce entries in order.
    pub(crate) fn push(&mut self, entry: PostingEntry) {
        debug_assert!(
            self.entries
                .last()
                .is_none_or(|last| last.doc_id < entry.doc_id)
        );
        self.entries.push(entry);
    }

    /// Sort entries by descending score. Ties keep their current order.
    pub fn sort_by_score_desc(&mut self) {
        self.entries.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
    }

    /// Render the list in the on-disk text form: entries separated by `;`
    /// with no trailing separator.
    pub fn encode(&self) -> String {
        let mut out = String::new();
        for (i, entry) in self.entries.iter().enumerate() {
            if i > 0 {
                out.push(';');
            }
            entry.encode_into(&mut out);
        }
        out
    }

    /// Decode the text form produced by [`PostingsList::encode`].
    ///
    /// The encoder is the only producer of this format, so any malformed
    /// field is a storage-integrity violation and decoding fails.
    pub fn decode(text: &str) -> Result<Self> {
        if text.is_empty() {
            return Err(FalcataError::decode("empty postings payload"));
        }

        let mut entries = Vec::new();
        for part in text.split(';') {
            entries.push(PostingEntry::decode(part)?);
        }

        Ok(PostingsList { entries })
    }
}

impl<'a> IntoIterator for &'a PostingsList {
    type Item = &'a PostingEntry;
    type IntoIter = std::slice::Iter<'a, PostingEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
