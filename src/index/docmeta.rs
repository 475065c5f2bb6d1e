//! Document metadata: names, lengths, and Euclidean lengths.

use std::io::{Read, Write};

use ahash::AHashMap;

use crate::error::{FalcataError, Result};
use crate::storage::traits::{Storage, StorageOutput};

/// Name of the document-info file: one `docID;docName;docLength` line per
/// document.
pub const DOC_INFO_FILE: &str = "docinfo";

/// Name of the Euclidean document-length file: one `docID;length` line per
/// document.
pub const EUCLIDEAN_FILE: &str = "euclidean";

/// Per-document metadata consulted by the ranker for length normalization.
///
/// Populated during ingestion, persisted at commit, loaded at index-open
/// time.
#[derive(Debug, Clone, Default)]
pub struct DocMeta {
    names: AHashMap<u32, String>,
    lengths: AHashMap<u32, u32>,
    euclidean: AHashMap<u32, f64>,
}

impl DocMeta {
    /// Create empty document metadata.
    pub fn new() -> Self {
        DocMeta::default()
    }

    /// Record a document's name and word count.
    pub fn register(&mut self, doc_id: u32, name: &str, length: u32) {
        self.names.insert(doc_id, name.to_string());
        self.lengths.insert(doc_id, length);
    }

    /// Number of registered documents.
    pub fn doc_count(&self) -> usize {
        self.names.len()
    }

    /// The document's name, if registered.
    pub fn name(&self, doc_id: u32) -> Option<&str> {
        self.names.get(&doc_id).map(String::as_str)
    }

    /// The document's length in words, if registered.
    pub fn length(&self, doc_id: u32) -> Option<u32> {
        self.lengths.get(&doc_id).copied()
    }

    /// The document's Euclidean length, if computed.
    pub fn euclidean_length(&self, doc_id: u32) -> Option<f64> {
        self.euclidean.get(&doc_id).copied()
    }

    pub(crate) fn set_euclidean_length(&mut self, doc_id: u32, length: f64) {
        self.euclidean.insert(doc_id, length);
    }

    /// Write the metadata files to storage.
    ///
    /// Lines are ordered by document ID so repeated commits of the same
    /// corpus produce identical files.
    pub fn write_to(&self, storage: &dyn Storage) -> Result<()> {
        let mut doc_ids: Vec<u32> = self.names.keys().copied().collect();
        doc_ids.sort_unstable();

        let mut output = storage.create_output(DOC_INFO_FILE)?;
        for doc_id in &doc_ids {
            let name = &self.names[doc_id];
            let length = self.lengths.get(doc_id).copied().unwrap_or(0);
            output.write_all(format!("{doc_id};{name};{length}\n").as_bytes())?;
        }
        output.close()?;

        let mut doc_ids: Vec<u32> = self.euclidean.keys().copied().collect();
        doc_ids.sort_unstable();

        let mut output = storage.create_output(EUCLIDEAN_FILE)?;
        for doc_id in &doc_ids {
            let length = self.euclidean[doc_id];
            output.write_all(format!("{doc_id};{length}\n").as_bytes())?;
        }
        output.close()?;

        Ok(())
    }

    /// Read the metadata files back from storage.
    pub fn read_from(storage: &dyn Storage) -> Result<Self> {
        let mut meta = DocMeta::new();

        for line in read_lines(storage, DOC_INFO_FILE)? {
            // The name may itself contain ';', so take the ID from the front
            // and the length from the back.
            let (id_part, rest) = line.split_once(';').ok_or_else(|| {
                FalcataError::decode(format!("malformed docinfo line: {line:?}"))
            })?;
            let (name, length_part) = rest.rsplit_once(';').ok_or_else(|| {
                FalcataError::decode(format!("malformed docinfo line: {line:?}"))
            })?;

            let doc_id: u32 = id_part
                .parse()
                .map_err(|_| FalcataError::decode(format!("unparsable docID: {id_part:?}")))?;
            let length: u32 = length_part.parse().map_err(|_| {
                FalcataError::decode(format!("unparsable doc length: {length_part:?}"))
            })?;

            meta.register(doc_id, name, length);
        }

        for line in read_lines(storage, EUCLIDEAN_FILE)? {
            let (id_part, length_part) = line.split_once(';').ok_or_else(|| {
                FalcataError::decode(format!("malformed euclidean line: {line:?}"))
            })?;

            let doc_id: u32 = id_part
                .parse()
                .map_err(|_| FalcataError::decode(format!("unparsable docID: {id_part:?}")))?;
            let length: f64 = length_part.parse().map_err(|_| {
                FalcataError::decode(format!("unparsable euclidean length: {length_part:?}"))
            })?;

            meta.set_euclidean_length(doc_id, length);
        }

        Ok(meta)
    }
}

fn read_lines(storage: &dyn Storage, name: &str) -> Result<Vec<String>> {
    let mut input = storage.open_input(name)?;
    let mut text = String::new();
    input.read_to_string(&mut text)?;

    Ok(text.lines().map(str::to_string).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::memory::MemoryStorage;

    #[test]
    fn test_register_and_lookup() {
        let mut meta = DocMeta::new();
        meta.register(1, "d1.txt", 120);
        meta.register(2, "d2.txt", 45);

        assert_eq!(meta.doc_count(), 2);
        assert_eq!(meta.name(1), Some("d1.txt"));
        assert_eq!(meta.length(2), Some(45));
        assert_eq!(meta.name(3), None);
        assert_eq!(meta.euclidean_length(1), None);
    }

    #[test]
    fn test_write_read_round_trip() {
        let storage = MemoryStorage::new_default();

        let mut meta = DocMeta::new();
        meta.register(1, "alpha.txt", 10);
        meta.register(7, "beta.txt", 300);
        meta.set_euclidean_length(1, 3.5);
        meta.set_euclidean_length(7, 12.25);

        meta.write_to(&storage).unwrap();
        let restored = DocMeta::read_from(&storage).unwrap();

        assert_eq!(restored.doc_count(), 2);
        assert_eq!(restored.name(1), Some("alpha.txt"));
        assert_eq!(restored.length(7), Some(300));
        assert_eq!(restored.euclidean_length(1), Some(3.5));
        assert_eq!(restored.euclidean_length(7), Some(12.25));
    }

    #[test]
    fn test_name_containing_separator_survives() {
        let storage = MemoryStorage::new_default();

        let mut meta = DocMeta::new();
        meta.register(3, "odd;name.txt", 9);

        meta.write_to(&storage).unwrap();
        let restored = DocMeta::read_from(&storage).unwrap();

        assert_eq!(restored.name(3), Some("odd;name.txt"));
        assert_eq!(restored.length(3), Some(9));
    }

    #[test]
    fn test_malformed_docinfo_is_decode_error() {
        let storage = MemoryStorage::new_default();

        let mut output = storage.create_output(DOC_INFO_FILE).unwrap();
        std::io::Write::write_all(&mut output, b"1;only-one-separator\n").unwrap();
        output.close().unwrap();
        let mut output = storage.create_output(EUCLIDEAN_FILE).unwrap();
        output.close().unwrap();

        let result = DocMeta::read_from(&storage);
        assert!(matches!(result, Err(FalcataError::Decode(_))));
    }
}
