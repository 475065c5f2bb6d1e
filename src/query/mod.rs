//! Query representation and resolution.

pub mod resolver;

pub use resolver::Searcher;

use crate::ranking::RankParams;

/// One term of a query, with its weight in the query.
///
/// The weight is the query-side term frequency used by cosine scoring;
/// plain queries weigh every term 1.0.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryTerm {
    /// The normalized token to look up.
    pub term: String,

    /// The term's weight within the query.
    pub weight: f64,
}

impl QueryTerm {
    /// Create a query term with the default weight of 1.0.
    pub fn new<S: Into<String>>(term: S) -> Self {
        QueryTerm {
            term: term.into(),
            weight: 1.0,
        }
    }
}

/// A parsed query: an ordered list of terms.
///
/// Term order matters for phrase queries, where adjacent terms must occur
/// at adjacent offsets.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    /// The query terms, in query order.
    pub terms: Vec<QueryTerm>,
}

impl Query {
    /// Create a query from already-built terms.
    pub fn new(terms: Vec<QueryTerm>) -> Self {
        Query { terms }
    }

    /// Build a query from whitespace-separated tokens, each weighted 1.0.
    ///
    /// Tokens are taken as-is; normalization (case folding, stemming) is the
    /// tokenizer's job and happens before text reaches this crate.
    pub fn parse(text: &str) -> Self {
        Query {
            terms: text.split_whitespace().map(QueryTerm::new).collect(),
        }
    }

    /// Number of terms in the query.
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// Check whether the query has no terms.
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

/// How a query's terms combine into a result set.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryKind {
    /// Documents containing every term.
    Intersection,

    /// Documents containing the terms at consecutive offsets.
    Phrase,

    /// Documents containing any term, scored and ordered by relevance.
    Ranked(RankParams),
}
