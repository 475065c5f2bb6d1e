//! Persistent hashed index: an inverted index as a hash table on disk.
//!
//! The dictionary is a fixed-capacity open-addressing hash table stored as a
//! file of 20-byte records; the postings themselves live in an append-only
//! data file addressed by `(pointer, size)` pairs recorded in the dictionary.
//! Terms are staged in an [`InMemoryIndex`] while a corpus is ingested, then
//! written out in one shot by [`PersistentHashedIndex::commit`]. Lookups seek
//! directly into the two files, so serving queries never requires loading
//! the index into memory.

use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;
use std::sync::Arc;

use byteorder::{ByteOrder, LittleEndian};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{FalcataError, Result};
use crate::index::docmeta::DocMeta;
use crate::index::memory::InMemoryIndex;
use crate::index::Index;
use crate::postings::PostingsList;
use crate::storage::file::FileStorage;
use crate::storage::traits::{Storage, StorageConfig, StorageInput, StorageOutput};

/// The dictionary hash table file name.
pub const DICTIONARY_FILE: &str = "dictionary";

/// The postings data heap file name.
pub const DATA_FILE: &str = "data";

/// The index metadata file name.
pub const METADATA_FILE: &str = "metadata.json";

/// Configuration for building and opening a persistent index.
#[derive(Debug, Clone)]
pub struct IndexConfig {
    /// Number of slots in the dictionary hash table.
    ///
    /// The table never grows: this must exceed the expected vocabulary size
    /// by a comfortable margin to keep probe chains short. The same value
    /// must be used at build and lookup time, since it participates in the
    /// hash reduction.
    pub table_size: u64,
}

impl Default for IndexConfig {
    fn default() -> Self {
        IndexConfig {
            table_size: 611_953,
        }
    }
}

/// Build-time diagnostics reported by [`PersistentHashedIndex::commit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommitStats {
    /// Number of distinct terms written.
    pub terms: u64,

    /// Number of linear-probing steps taken to resolve collisions.
    pub collisions: u64,

    /// Total bytes written to the data file.
    pub data_bytes: u64,
}

/// Metadata about a committed index.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct IndexMetadata {
    /// Version of the index format.
    version: u32,

    /// Dictionary table size the index was built with.
    table_size: u64,

    /// Number of documents indexed.
    doc_count: u64,

    /// Number of distinct terms indexed.
    term_count: u64,

    /// Creation time (seconds since epoch).
    created: u64,

    /// Last modified time (seconds since epoch).
    modified: u64,
}

/// One record in the on-disk dictionary hash table.
///
/// `hash` is the slot index originally computed for the key, before any
/// probing displacement, which lets lookups skip payload reads for records
/// that cannot belong to the probed term. An all-zero record marks an empty
/// slot; real records always have `size > 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct DictRecord {
    /// Byte offset of the payload in the data file.
    ptr: u64,

    /// The key's original slot index.
    hash: u64,

    /// Payload length in bytes.
    size: u32,
}

impl DictRecord {
    /// Fixed on-disk record size: two 64-bit fields plus one 32-bit field.
    const BYTE_SIZE: u64 = 20;

    fn is_empty(&self) -> bool {
        self.ptr == 0 && self.hash == 0 && self.size == 0
    }

    fn write_into(&self, buf: &mut [u8]) {
        LittleEndian::write_u64(&mut buf[0..8], self.ptr);
        LittleEndian::write_u64(&mut buf[8..16], self.hash);
        LittleEndian::write_u32(&mut buf[16..20], self.size);
    }

    fn read_from(buf: &[u8]) -> Self {
        DictRecord {
            ptr: LittleEndian::read_u64(&buf[0..8]),
            hash: LittleEndian::read_u64(&buf[8..16]),
            size: LittleEndian::read_u32(&buf[16..20]),
        }
    }
}

/// An inverted index persisted as a hashed dictionary file plus a data heap.
///
/// Lifecycle: [`create`](Self::create) an empty builder, `insert` and
/// `register_doc` the corpus, [`commit`](Self::commit) once, then query; or
/// [`open`](Self::open) previously committed files and query directly. The
/// files are written exactly once per commit and treated as read-only
/// afterwards.
#[derive(Debug)]
pub struct PersistentHashedIndex {
    /// The storage backend owning the index files.
    storage: Arc<dyn Storage>,

    /// Index configuration.
    config: IndexConfig,

    /// The build cache; terms are dropped after commit, document metadata
    /// stays resident.
    cache: InMemoryIndex,

    /// Read handle on the dictionary file, present once committed/opened.
    dictionary: Option<Mutex<Box<dyn StorageInput>>>,

    /// Read handle on the data file, present once committed/opened.
    data: Option<Mutex<Box<dyn StorageInput>>>,

    /// Whether the on-disk files are authoritative.
    committed: bool,
}

impl PersistentHashedIndex {
    /// Create a new, empty index builder in the given storage.
    pub fn create(storage: Arc<dyn Storage>, config: IndexConfig) -> Result<Self> {
        if config.table_size == 0 {
            return Err(FalcataError::invalid_argument("table_size must be > 0"));
        }

        Ok(PersistentHashedIndex {
            storage,
            config,
            cache: InMemoryIndex::new(),
            dictionary: None,
            data: None,
            committed: false,
        })
    }

    /// Open a previously committed index from storage.
    ///
    /// Fails if the recorded table size differs from `config.table_size`,
    /// since the table size participates in the hash reduction and a
    /// mismatch would misplace every lookup.
    pub fn open(storage: Arc<dyn Storage>, config: IndexConfig) -> Result<Self> {
        if !storage.file_exists(METADATA_FILE) {
            return Err(FalcataError::index("index does not exist"));
        }

        let metadata = Self::read_metadata(storage.as_ref())?;
        if metadata.table_size != config.table_size {
            return Err(FalcataError::index(format!(
                "table size mismatch: index built with {}, opened with {}",
                metadata.table_size, config.table_size
            )));
        }

        let mut index = PersistentHashedIndex {
            storage,
            config,
            cache: InMemoryIndex::new(),
            dictionary: None,
            data: None,
            committed: true,
        };

        *index.cache.doc_meta_mut() = DocMeta::read_from(index.storage.as_ref())?;
        index.open_readers()?;

        debug!(
            doc_count = metadata.doc_count,
            term_count = metadata.term_count,
            table_size = metadata.table_size,
            "opened persistent index"
        );

        Ok(index)
    }

    /// Create an index builder backed by files in a directory.
    pub fn create_in_dir<P: AsRef<Path>>(dir: P, config: IndexConfig) -> Result<Self> {
        let storage = Arc::new(FileStorage::new(dir, StorageConfig::default())?);
        Self::create(storage, config)
    }

    /// Open a committed index from a directory.
    pub fn open_dir<P: AsRef<Path>>(dir: P, config: IndexConfig) -> Result<Self> {
        let storage = Arc::new(FileStorage::new(dir, StorageConfig::default())?);
        Self::open(storage, config)
    }

    /// Check if a committed index exists in the given storage.
    pub fn exists_in(storage: &dyn Storage) -> bool {
        storage.file_exists(METADATA_FILE)
    }

    /// Whether the on-disk files are authoritative for this index.
    pub fn is_committed(&self) -> bool {
        self.committed
    }

    /// Number of distinct terms still staged in the build cache.
    pub fn staged_terms(&self) -> usize {
        self.cache.vocab_size()
    }

    /// The stable hash of a term, reduced to a dictionary slot index.
    ///
    /// A 31-base polynomial over the term's UTF-8 bytes. Must be identical
    /// at build and lookup time, so no per-process randomized hasher can be
    /// used here.
    fn slot_for(&self, term: &str) -> u64 {
        let mut h: u64 = 0;
        for byte in term.bytes() {
            h = h.wrapping_mul(31).wrapping_add(u64::from(byte));
        }
        h % self.config.table_size
    }

    /// Serialize the build cache to the dictionary and data files.
    ///
    /// Writes document metadata, the data heap, the dictionary table, and
    /// the index metadata, then switches the index over to serving reads
    /// from the files. Returns build diagnostics.
    pub fn commit(&mut self) -> Result<CommitStats> {
        if self.committed {
            return Err(FalcataError::index("index is already committed"));
        }

        let table_size = self.config.table_size;
        if self.cache.vocab_size() as u64 >= table_size {
            return Err(FalcataError::index(format!(
                "vocabulary size {} exceeds dictionary capacity {}",
                self.cache.vocab_size(),
                table_size
            )));
        }

        self.compute_euclidean_lengths();
        self.cache.doc_meta().write_to(self.storage.as_ref())?;

        // Zero-filled dictionary image; an all-zero record is an empty slot.
        let mut dictionary = vec![0u8; (table_size * DictRecord::BYTE_SIZE) as usize];

        // Sorted commit order makes repeated builds of the same corpus
        // byte-identical.
        let mut terms: Vec<(&str, &PostingsList)> = self.cache.terms().collect();
        terms.sort_unstable_by_key(|(term, _)| *term);

        let mut data = self.storage.create_output(DATA_FILE)?;
        let mut free: u64 = 0;
        let mut collisions: u64 = 0;

        for (term, postings) in &terms {
            let initial_slot = self.slot_for(term);

            let mut slot = initial_slot;
            loop {
                let at = (slot * DictRecord::BYTE_SIZE) as usize;
                let occupied = dictionary[at..at + DictRecord::BYTE_SIZE as usize]
                    .iter()
                    .any(|&b| b != 0);
                if !occupied {
                    break;
                }
                collisions += 1;
                slot = (slot + 1) % table_size;
            }

            let payload = format!("{term}>{}", postings.encode());
            let size = payload.len() as u32;
            data.write_all(payload.as_bytes())?;

            let record = DictRecord {
                ptr: free,
                hash: initial_slot,
                size,
            };
            let at = (slot * DictRecord::BYTE_SIZE) as usize;
            record.write_into(&mut dictionary[at..at + DictRecord::BYTE_SIZE as usize]);

            free += u64::from(size);
        }

        data.close()?;

        let mut output = self.storage.create_output(DICTIONARY_FILE)?;
        output.write_all(&dictionary)?;
        output.close()?;

        let stats = CommitStats {
            terms: terms.len() as u64,
            collisions,
            data_bytes: free,
        };

        self.write_metadata(stats.terms)?;

        info!(
            terms = stats.terms,
            collisions = stats.collisions,
            data_bytes = stats.data_bytes,
            "committed index"
        );

        self.cache.clear_terms();
        self.open_readers()?;
        self.committed = true;

        Ok(stats)
    }

    fn open_readers(&mut self) -> Result<()> {
        self.dictionary = Some(Mutex::new(self.storage.open_input(DICTIONARY_FILE)?));
        self.data = Some(Mutex::new(self.storage.open_input(DATA_FILE)?));
        Ok(())
    }

    fn write_metadata(&self, term_count: u64) -> Result<()> {
        let now = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();

        let metadata = IndexMetadata {
            version: 1,
            table_size: self.config.table_size,
            doc_count: self.cache.doc_meta().doc_count() as u64,
            term_count,
            created: now,
            modified: now,
        };

        let json = serde_json::to_string_pretty(&metadata)?;
        let mut output = self.storage.create_output(METADATA_FILE)?;
        output.write_all(json.as_bytes())?;
        output.close()?;

        Ok(())
    }

    fn read_metadata(storage: &dyn Storage) -> Result<IndexMetadata> {
        let mut input = storage.open_input(METADATA_FILE)?;
        let mut json = String::new();
        input.read_to_string(&mut json)?;

        let metadata: IndexMetadata = serde_json::from_str(&json)?;
        Ok(metadata)
    }

    /// Compute per-document Euclidean lengths from the staged postings:
    /// `sqrt(Σ_t (tf_{t,d} · ln(N / df_t))²)`.
    fn compute_euclidean_lengths(&mut self) {
        let total_docs = self.cache.doc_meta().doc_count() as f64;
        let mut squared: ahash::AHashMap<u32, f64> = ahash::AHashMap::new();

        for (_, postings) in self.cache.terms() {
            let df = postings.len() as f64;
            if df == 0.0 || total_docs == 0.0 {
                continue;
            }
            let idf = (total_docs / df).ln();

            for entry in postings.iter() {
                let weight = entry.term_freq() as f64 * idf;
                *squared.entry(entry.doc_id).or_insert(0.0) += weight * weight;
            }
        }

        let meta = self.cache.doc_meta_mut();
        for (doc_id, sum) in squared {
            meta.set_euclidean_length(doc_id, sum.sqrt());
        }
    }

    /// Read the dictionary record at `slot`.
    fn read_record(&self, slot: u64) -> Result<DictRecord> {
        let dictionary = self
            .dictionary
            .as_ref()
            .ok_or_else(|| FalcataError::index("index has no committed files"))?;

        let mut buf = [0u8; DictRecord::BYTE_SIZE as usize];
        let mut input = dictionary.lock();
        input.seek(SeekFrom::Start(slot * DictRecord::BYTE_SIZE))?;
        input.read_exact(&mut buf)?;

        Ok(DictRecord::read_from(&buf))
    }

    /// Read `size` bytes of payload at `ptr` in the data file.
    fn read_payload(&self, ptr: u64, size: u32) -> Result<String> {
        let data = self
            .data
            .as_ref()
            .ok_or_else(|| FalcataError::index("index has no committed files"))?;

        let mut buf = vec![0u8; size as usize];
        let mut input = data.lock();
        input.seek(SeekFrom::Start(ptr))?;
        input.read_exact(&mut buf)?;

        String::from_utf8(buf)
            .map_err(|_| FalcataError::decode("data payload is not valid UTF-8"))
    }

    /// Look a term up in the on-disk dictionary.
    ///
    /// Probes linearly from the term's initial slot. An empty slot is
    /// conclusive absence, because slots are never deleted between builds.
    /// Occupied slots whose stored hash differs from the initial slot belong
    /// to other terms' probe chains and are skipped without reading their
    /// payloads.
    fn lookup(&self, token: &str) -> Result<Option<PostingsList>> {
        let table_size = self.config.table_size;
        let initial_slot = self.slot_for(token);

        let mut slot = initial_slot;
        for _ in 0..table_size {
            let record = self.read_record(slot)?;

            if record.is_empty() {
                return Ok(None);
            }

            if record.hash == initial_slot {
                let payload = self.read_payload(record.ptr, record.size)?;
                if let Some(encoded) = payload
                    .strip_prefix(token)
                    .and_then(|rest| rest.strip_prefix('>'))
                {
                    return Ok(Some(PostingsList::decode(encoded)?));
                }
            }

            slot = (slot + 1) % table_size;
        }

        // Every slot in a full table was probed without a match.
        Ok(None)
    }
}

impl Index for PersistentHashedIndex {
    fn insert(&mut self, token: &str, doc_id: u32, offset: u32) -> Result<()> {
        if self.committed {
            return Err(FalcataError::index(
                "cannot insert into a committed index",
            ));
        }
        self.cache.insert(token, doc_id, offset)
    }

    fn register_doc(&mut self, doc_id: u32, name: &str, length: u32) -> Result<()> {
        if self.committed {
            return Err(FalcataError::index(
                "cannot register documents in a committed index",
            ));
        }
        self.cache.register_doc(doc_id, name, length)
    }

    fn postings(&self, token: &str) -> Result<Option<PostingsList>> {
        if self.committed {
            self.lookup(token)
        } else {
            self.cache.postings(token)
        }
    }

    fn doc_meta(&self) -> &DocMeta {
        self.cache.doc_meta()
    }
}
