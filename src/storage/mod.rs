//! Storage backends for index files.
//!
//! The index reads and writes its files through the [`Storage`] trait so the
//! same engine can run against the file system in production and against an
//! in-memory map in tests.

pub mod file;
pub mod memory;
pub mod traits;

pub use file::FileStorage;
pub use memory::MemoryStorage;
pub use traits::{Storage, StorageConfig, StorageError, StorageInput, StorageOutput};
