//! Query resolution over postings lists.
//!
//! All merge algorithms here assume their inputs are in ascending
//! document-ID order, which the postings model guarantees, and run in a
//! single linear pass over both lists.

use crate::error::Result;
use crate::index::Index;
use crate::postings::{PostingEntry, PostingsList};
use crate::query::{Query, QueryKind};
use crate::ranking;

/// Resolves queries against an index.
pub struct Searcher<'a> {
    index: &'a dyn Index,
}

impl<'a> Searcher<'a> {
    /// Create a searcher over the given index.
    pub fn new(index: &'a dyn Index) -> Self {
        Searcher { index }
    }

    /// Resolve a query and return the matching postings.
    ///
    /// Multi-term intersection and phrase queries reduce left-to-right over
    /// the term list; if any term has no postings the result is empty.
    /// Ranked queries score the union of the terms' postings and return it
    /// in descending score order.
    pub fn search(&self, query: &Query, kind: &QueryKind) -> Result<PostingsList> {
        if query.is_empty() {
            return Ok(PostingsList::new());
        }

        match kind {
            QueryKind::Intersection => self.reduce(query, intersect),
            QueryKind::Phrase => self.reduce(query, phrase),
            QueryKind::Ranked(params) => {
                let candidates = self.candidates(query)?;
                ranking::cosine_score(self.index, query, &candidates, params)
            }
        }
    }

    /// Left-to-right pairwise reduction with the given merge.
    fn reduce(
        &self,
        query: &Query,
        merge: fn(&PostingsList, &PostingsList) -> PostingsList,
    ) -> Result<PostingsList> {
        let mut result: Option<PostingsList> = None;

        for term in &query.terms {
            let Some(postings) = self.index.postings(&term.term)? else {
                return Ok(PostingsList::new());
            };

            result = Some(match result {
                None => postings,
                Some(acc) => merge(&acc, &postings),
            });
        }

        Ok(result.unwrap_or_default())
    }

    /// The union of all query terms' postings, used as the candidate set
    /// for ranked retrieval. Terms missing from the index contribute
    /// nothing.
    fn candidates(&self, query: &Query) -> Result<PostingsList> {
        let mut result = PostingsList::new();

        for term in &query.terms {
            if let Some(postings) = self.index.postings(&term.term)? {
                result = union(&result, &postings);
            }
        }

        Ok(result)
    }
}

/// Documents present in both lists.
///
/// Two-pointer merge: advance the pointer at the smaller document ID, emit
/// on equality. Result entries carry the document ID only. O(|a|+|b|).
pub fn intersect(a: &PostingsList, b: &PostingsList) -> PostingsList {
    let (ea, eb) = (a.entries(), b.entries());
    let mut result = PostingsList::new();

    let (mut i, mut j) = (0, 0);
    while i < ea.len() && j < eb.len() {
        let (doc_i, doc_j) = (ea[i].doc_id, eb[j].doc_id);

        if doc_i == doc_j {
            result.push(PostingEntry::new(doc_i));
            i += 1;
            j += 1;
        } else if doc_i < doc_j {
            i += 1;
        } else {
            j += 1;
        }
    }

    result
}

/// Documents where a term from `b` directly follows a term from `a`.
///
/// On a document-ID match, every offset pair `(oa, ob)` with `ob == oa + 1`
/// emits the document with offset `ob`. Keeping the right-hand offsets makes
/// the result chainable against the next term of a longer phrase.
pub fn phrase(a: &PostingsList, b: &PostingsList) -> PostingsList {
    let (ea, eb) = (a.entries(), b.entries());
    let mut result = PostingsList::new();

    let (mut i, mut j) = (0, 0);
    while i < ea.len() && j < eb.len() {
        let (doc_i, doc_j) = (ea[i].doc_id, eb[j].doc_id);

        if doc_i == doc_j {
            for &oa in &ea[i].offsets {
                for &ob in &eb[j].offsets {
                    if ob == oa + 1 {
                        result.insert_or_merge(doc_j, ob);
                        break;
                    }
                }
            }
            i += 1;
            j += 1;
        } else if doc_i < doc_j {
            i += 1;
        } else {
            j += 1;
        }
    }

    result
}

/// Documents present in either list. Entries from `a` win on a tie, which
/// is irrelevant to ranking since result entries carry document IDs only.
pub fn union(a: &PostingsList, b: &PostingsList) -> PostingsList {
    let (ea, eb) = (a.entries(), b.entries());
    let mut result = PostingsList::new();

    let (mut i, mut j) = (0, 0);
    while i < ea.len() || j < eb.len() {
        if j >= eb.len() || (i < ea.len() && ea[i].doc_id < eb[j].doc_id) {
            result.push(PostingEntry::new(ea[i].doc_id));
            i += 1;
        } else if i >= ea.len() || eb[j].doc_id < ea[i].doc_id {
            result.push(PostingEntry::new(eb[j].doc_id));
            j += 1;
        } else {
            result.push(PostingEntry::new(ea[i].doc_id));
            i += 1;
            j += 1;
        }
    }

    result
}
