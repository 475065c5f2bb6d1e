//! Relevance ranking: tf/idf weighting schemes, cosine scoring, and blending
//! with externally computed importance scores.
//!
//! Weighting schemes are closed enums mapped to pure scoring functions, so
//! adding a scheme means adding a variant rather than threading strings
//! through the scoring loop.

use std::fs;
use std::path::Path;

use ahash::AHashMap;

use crate::error::{FalcataError, Result};
use crate::index::Index;
use crate::postings::PostingsList;
use crate::query::Query;

/// Term-frequency weighting schemes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TfScheme {
    /// The raw term frequency.
    #[default]
    Raw,

    /// Logarithmic damping: `1 + ln(tf)`.
    Log,
}

impl TfScheme {
    /// The weight of a term frequency under this scheme. A zero frequency
    /// always weighs zero.
    pub fn weight(&self, tf: f64) -> f64 {
        if tf <= 0.0 {
            return 0.0;
        }
        match self {
            TfScheme::Raw => tf,
            TfScheme::Log => 1.0 + tf.ln(),
        }
    }
}

/// Document-frequency weighting schemes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DfScheme {
    /// Inverse document frequency: `ln(totalDocs / df)`.
    #[default]
    Idf,
}

impl DfScheme {
    /// The weight of a document frequency under this scheme.
    pub fn weight(&self, df: usize, total_docs: usize) -> f64 {
        if df == 0 || total_docs == 0 {
            return 0.0;
        }
        match self {
            DfScheme::Idf => (total_docs as f64 / df as f64).ln(),
        }
    }
}

/// Document-length normalization applied to accumulated cosine scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LengthNorm {
    /// No normalization.
    None,

    /// Divide by the document's raw word count.
    #[default]
    WordCount,

    /// Divide by the Euclidean norm of the document's per-term weights,
    /// computed at commit time.
    Euclidean,
}

/// Parameters for cosine scoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RankParams {
    /// Term-frequency scheme applied to both query and document sides.
    pub tf: TfScheme,

    /// Document-frequency scheme applied to both query and document sides.
    pub df: DfScheme,

    /// Document-length normalization.
    pub norm: LengthNorm,
}

/// Score a candidate result set against a query with cosine-style tf/idf
/// weighting.
///
/// For every query term, the term's weight in the query (from the query-side
/// term frequency) is multiplied by its weight in each candidate document
/// (from the document-side term frequency), and the products accumulate per
/// document. Accumulated scores are normalized by the configured length
/// factor, and the result is returned in descending score order.
pub fn cosine_score(
    index: &dyn Index,
    query: &Query,
    candidates: &PostingsList,
    params: &RankParams,
) -> Result<PostingsList> {
    let mut result = candidates.clone();
    if result.is_empty() {
        return Ok(result);
    }

    let total_docs = index.doc_meta().doc_count();
    let mut scores = vec![0.0f64; result.len()];

    for query_term in &query.terms {
        let Some(postings) = index.postings(&query_term.term)? else {
            continue;
        };

        let df = postings.len();
        let df_weight = params.df.weight(df, total_docs);
        let query_weight = params.tf.weight(query_term.weight) * df_weight;

        let mut term_freqs: AHashMap<u32, usize> = AHashMap::with_capacity(postings.len());
        for entry in postings.iter() {
            term_freqs.insert(entry.doc_id, entry.term_freq());
        }

        for (slot, entry) in result.iter().enumerate() {
            let tf = term_freqs.get(&entry.doc_id).copied().unwrap_or(0);
            if tf == 0 {
                continue;
            }
            let doc_weight = params.tf.weight(tf as f64) * df_weight;
            scores[slot] += doc_weight * query_weight;
        }
    }

    let meta = index.doc_meta();
    for (slot, entry) in result.iter_mut().enumerate() {
        let norm = match params.norm {
            LengthNorm::None => 1.0,
            LengthNorm::WordCount => f64::from(meta.length(entry.doc_id).ok_or_else(|| {
                FalcataError::index(format!("no length recorded for doc {}", entry.doc_id))
            })?),
            LengthNorm::Euclidean => meta.euclidean_length(entry.doc_id).ok_or_else(|| {
                FalcataError::index(format!(
                    "no euclidean length recorded for doc {}",
                    entry.doc_id
                ))
            })?,
        };

        entry.score = if norm > 0.0 {
            scores[slot] / norm
        } else {
            0.0
        };
    }

    result.sort_by_score_desc();
    Ok(result)
}

/// Static per-document importance scores supplied by an external
/// computation (for example a PageRank estimator), keyed by document name.
#[derive(Debug, Clone, Default)]
pub struct ImportanceScores {
    scores: AHashMap<String, f64>,
}

impl ImportanceScores {
    /// Load scores from a line-oriented `docName score` file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::parse(&text)
    }

    /// Parse the `docName score` line format.
    pub fn parse(text: &str) -> Result<Self> {
        let mut scores = AHashMap::new();

        for line in text.lines() {
            if line.trim().is_empty() {
                continue;
            }
            let (name, score_part) = line.split_once(char::is_whitespace).ok_or_else(|| {
                FalcataError::decode(format!("malformed importance line: {line:?}"))
            })?;
            let score: f64 = score_part.trim().parse().map_err(|_| {
                FalcataError::decode(format!("unparsable importance score: {line:?}"))
            })?;
            scores.insert(name.to_string(), score);
        }

        Ok(ImportanceScores { scores })
    }

    /// The importance of a document, if present.
    pub fn get(&self, doc_name: &str) -> Option<f64> {
        self.scores.get(doc_name).copied()
    }

    /// Number of documents with a recorded score.
    pub fn len(&self) -> usize {
        self.scores.len()
    }

    /// Check whether any scores were loaded.
    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }
}

/// Coefficients of the linear cosine/importance blend.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlendWeights {
    /// Weight of the cosine relevance score.
    pub alpha: f64,

    /// Weight of the static importance score. Importance scores are
    /// typically small probabilities, hence the large default.
    pub beta: f64,
}

impl Default for BlendWeights {
    fn default() -> Self {
        BlendWeights {
            alpha: 0.5,
            beta: 1000.0,
        }
    }
}

/// Blend a ranked result set with static importance scores:
/// `alpha · cosine + beta · importance` per document, re-sorted descending.
///
/// Documents absent from the importance file contribute 0 importance.
pub fn blend_importance(
    index: &dyn Index,
    ranked: &PostingsList,
    importance: &ImportanceScores,
    weights: &BlendWeights,
) -> Result<PostingsList> {
    let meta = index.doc_meta();
    let mut result = ranked.clone();

    for entry in result.iter_mut() {
        let name = meta.name(entry.doc_id).ok_or_else(|| {
            FalcataError::index(format!("no name recorded for doc {}", entry.doc_id))
        })?;
        let static_score = importance.get(name).unwrap_or(0.0);
        entry.score = weights.alpha * entry.score + weights.beta * static_score;
    }

    result.sort_by_score_desc();
    Ok(result)
}
