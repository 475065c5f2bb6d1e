//! # Falcata
//!
//! An inverted-index search core: builds a term→document index in memory,
//! commits it to disk as a fixed-slot hashed dictionary plus a data heap,
//! and answers boolean, phrase, and ranked queries against it.
//!
//! ## Features
//!
//! - Pure Rust implementation
//! - Open-addressing on-disk dictionary with linear probing
//! - Point lookups without loading the index into memory
//! - Two-pointer intersection and phrase merges
//! - Pluggable tf/idf weighting and cosine scoring
//! - Optional blending with externally computed importance scores
//! - Pluggable storage backends

pub mod error;
pub mod index;
pub mod postings;
pub mod query;
pub mod ranking;
pub mod storage;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
