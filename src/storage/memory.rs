//! In-memory storage implementation for testing.

use std::collections::HashMap;
use std::io::{Cursor, Read, Seek, SeekFrom, Write};
use std::sync::{Arc, Mutex};

use crate::error::Result;
use crate::storage::traits::{Storage, StorageConfig, StorageError, StorageInput, StorageOutput};

/// An in-memory storage implementation.
///
/// This is useful for testing and for creating temporary indexes in memory.
#[derive(Debug)]
pub struct MemoryStorage {
    /// The files stored in memory.
    files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    /// Storage configuration.
    #[allow(dead_code)]
    config: StorageConfig,
    /// Whether the storage is closed.
    closed: bool,
}

impl MemoryStorage {
    /// Create a new memory storage.
    pub fn new(config: StorageConfig) -> Self {
        MemoryStorage {
            files: Arc::new(Mutex::new(HashMap::new())),
            config,
            closed: false,
        }
    }

    /// Create a new memory storage with default configuration.
    pub fn new_default() -> Self {
        Self::new(StorageConfig::default())
    }

    /// Check if the storage is closed.
    fn check_closed(&self) -> Result<()> {
        if self.closed {
            Err(StorageError::StorageClosed.into())
        } else {
            Ok(())
        }
    }

    /// Get the number of files stored.
    pub fn file_count(&self) -> usize {
        self.files.lock().unwrap().len()
    }

    /// Get the total size of all files.
    pub fn total_size(&self) -> u64 {
        let files = self.files.lock().unwrap();
        files.values().map(|data| data.len() as u64).sum()
    }
}

impl Storage for MemoryStorage {
    fn open_input(&self, name: &str) -> Result<Box<dyn StorageInput>> {
        self.check_closed()?;

        let files = self.files.lock().unwrap();
        let data = files
            .get(name)
            .ok_or_else(|| StorageError::FileNotFound(name.to_string()))?;

        Ok(Box::new(MemoryInput::new(data.clone())))
    }

    fn create_output(&self, name: &str) -> Result<Box<dyn StorageOutput>> {
        self.check_closed()?;

        Ok(Box::new(MemoryOutput::new(
            name.to_string(),
            Arc::clone(&self.files),
        )))
    }

    fn file_exists(&self, name: &str) -> bool {
        if self.closed {
            return false;
        }

        let files = self.files.lock().unwrap();
        files.contains_key(name)
    }

    fn delete_file(&self, name: &str) -> Result<()> {
        self.check_closed()?;

        let mut files = self.files.lock().unwrap();
        files.remove(name);
        Ok(())
    }

    fn list_files(&self) -> Result<Vec<String>> {
        self.check_closed()?;

        let files = self.files.lock().unwrap();
        let mut file_names: Vec<String> = files.keys().cloned().collect();
        file_names.sort();
        Ok(file_names)
    }

    fn file_size(&self, name: &str) -> Result<u64> {
        self.check_closed()?;

        let files = self.files.lock().unwrap();
        let data = files
            .get(name)
            .ok_or_else(|| StorageError::FileNotFound(name.to_string()))?;

        Ok(data.len() as u64)
    }

    fn sync(&self) -> Result<()> {
        self.check_closed()?;
        // For memory storage, sync is a no-op
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.closed = true;
        Ok(())
    }
}

/// A memory-based input implementation.
#[derive(Debug)]
pub struct MemoryInput {
    cursor: Cursor<Vec<u8>>,
    size: u64,
}

impl MemoryInput {
    fn new(data: Vec<u8>) -> Self {
        let size = data.len() as u64;
        MemoryInput {
            cursor: Cursor::new(data),
            size,
        }
    }
}

impl Read for MemoryInput {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.cursor.read(buf)
    }
}

impl Seek for MemoryInput {
    fn seek(&mut self, pos: SeekFrom) -> std::io::Result<u64> {
        self.cursor.seek(pos)
    }
}

impl StorageInput for MemoryInput {
    fn size(&self) -> Result<u64> {
        Ok(self.size)
    }

    fn close(&mut self) -> Result<()> {
        // Nothing to close for memory input
        Ok(())
    }
}

/// A memory-based output implementation.
///
/// Writes honor the seek position, since the index rewrites fixed-offset
/// dictionary records.
#[derive(Debug)]
pub struct MemoryOutput {
    name: String,
    buffer: Vec<u8>,
    files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    position: u64,
    closed: bool,
}

impl MemoryOutput {
    fn new(name: String, files: Arc<Mutex<HashMap<String, Vec<u8>>>>) -> Self {
        MemoryOutput {
            name,
            buffer: Vec::new(),
            files,
            position: 0,
            closed: false,
        }
    }

    fn set_position(&mut self, pos: u64) -> u64 {
        self.position = pos;
        pos
    }
}

impl Write for MemoryOutput {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        if self.closed {
            return Err(std::io::Error::other("Output is closed"));
        }

        let start = self.position as usize;
        let end = start + buf.len();
        if end > self.buffer.len() {
            self.buffer.resize(end, 0);
        }
        self.buffer[start..end].copy_from_slice(buf);
        self.position = end as u64;
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        // For memory output, flushing is a no-op
        Ok(())
    }
}

impl Seek for MemoryOutput {
    fn seek(&mut self, pos: SeekFrom) -> std::io::Result<u64> {
        if self.closed {
            return Err(std::io::Error::other("Output is closed"));
        }

        let base = match pos {
            SeekFrom::Start(offset) => return Ok(self.set_position(offset)),
            SeekFrom::End(offset) => (self.buffer.len() as u64, offset),
            SeekFrom::Current(offset) => (self.position, offset),
        };

        let (anchor, offset) = base;
        let new_pos = if offset < 0 {
            anchor.checked_sub(offset.unsigned_abs()).ok_or_else(|| {
                std::io::Error::new(std::io::ErrorKind::InvalidInput, "Invalid seek position")
            })?
        } else {
            anchor + offset as u64
        };

        Ok(self.set_position(new_pos))
    }
}

impl StorageOutput for MemoryOutput {
    fn flush_and_sync(&mut self) -> Result<()> {
        // For memory output, sync is a no-op
        Ok(())
    }

    fn position(&self) -> Result<u64> {
        Ok(self.position)
    }

    fn close(&mut self) -> Result<()> {
        if !self.closed {
            let mut files = self.files.lock().unwrap();
            files.insert(self.name.clone(), self.buffer.clone());
            self.closed = true;
        }
        Ok(())
    }
}

impl Drop for MemoryOutput {
    fn drop(&mut self) {
        // Ensure the file is stored when the output is dropped
        let _ = self.close();
    }
}
