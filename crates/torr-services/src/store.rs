//! Content-addressed file store.
//!
//! Files are split into 1024-byte chunks and kept in memory, keyed by the
//! digest of their full byte stream. Entries are immutable: once a hash is
//! present it maps to the same fully-assembled file for the life of the
//! process. If the hash exists, the content is whatever was stored first.

use std::sync::Arc;

use bytes::Bytes;
use dashmap::DashMap;
use torr_core::message::{ChunkInfo, FileInfo};
use torr_core::{digest, Digest};

/// Chunk payload size. Every chunk but the last is exactly this long.
pub const CHUNK_SIZE: usize = 1024;

/// One stored chunk: its descriptor and payload.
#[derive(Debug, Clone)]
pub struct StoredChunk {
    pub info: ChunkInfo,
    pub data: Bytes,
}

/// A fully-assembled file. Only ever constructed whole.
#[derive(Debug)]
pub struct StoredFile {
    info: FileInfo,
    chunks: Vec<StoredChunk>,
}

impl StoredFile {
    pub fn info(&self) -> &FileInfo {
        &self.info
    }

    pub fn chunks(&self) -> &[StoredChunk] {
        &self.chunks
    }

    /// The chunk carrying `index`, if any.
    pub fn chunk(&self, index: u32) -> Option<&StoredChunk> {
        self.chunks
            .get(index as usize)
            .filter(|chunk| chunk.info.index == index)
    }

    /// Concatenated payloads in index order.
    pub fn contents(&self) -> Vec<u8> {
        reassemble(&self.chunks)
    }
}

/// Split bytes into indexed, digested chunks. Empty input yields no chunks.
pub fn segment(data: &[u8]) -> Vec<StoredChunk> {
    data.chunks(CHUNK_SIZE)
        .enumerate()
        .map(|(index, piece)| StoredChunk {
            info: ChunkInfo {
                index: index as u32,
                size: piece.len() as u32,
                hash: digest(piece).to_vec(),
            },
            data: Bytes::copy_from_slice(piece),
        })
        .collect()
}

/// Concatenate chunk payloads in the order given.
pub fn reassemble(chunks: &[StoredChunk]) -> Vec<u8> {
    let total = chunks.iter().map(|c| c.data.len()).sum();
    let mut out = Vec::with_capacity(total);
    for chunk in chunks {
        out.extend_from_slice(&chunk.data);
    }
    out
}

/// Process-wide content store.
#[derive(Clone, Default)]
pub struct ContentStore {
    /// content hash -> file
    files: Arc<DashMap<Digest, Arc<StoredFile>>>,
}

impl ContentStore {
    pub fn new() -> Self {
        Self {
            files: Arc::new(DashMap::new()),
        }
    }

    /// Store an uploaded file and return its descriptor.
    ///
    /// Idempotent: if the content hash is already present the existing
    /// descriptor is returned unchanged, filename included.
    pub fn ingest(&self, filename: &str, data: &[u8]) -> FileInfo {
        let hash = digest(data);
        if let Some(existing) = self.files.get(&hash) {
            tracing::debug!(hash = hex::encode(hash), filename, "file already stored");
            return existing.info().clone();
        }

        let chunks = segment(data);
        let info = FileInfo {
            hash: hash.to_vec(),
            size: data.len() as u64,
            filename: filename.to_string(),
            chunks: chunks.iter().map(|c| c.info.clone()).collect(),
        };
        self.commit(hash, StoredFile { info, chunks }).info().clone()
    }

    /// Store replicated bytes under a descriptor received from elsewhere.
    ///
    /// The bytes are re-segmented locally. `hash` is taken as given.
    pub fn ingest_replica(&self, hash: Digest, info: FileInfo, data: &[u8]) -> Arc<StoredFile> {
        let chunks = segment(data);
        self.commit(hash, StoredFile { info, chunks })
    }

    /// Publish a fully-built file. First writer wins; later writers get the
    /// stored entry back.
    fn commit(&self, hash: Digest, file: StoredFile) -> Arc<StoredFile> {
        let entry = self.files.entry(hash).or_insert_with(|| {
            tracing::info!(
                hash = hex::encode(hash),
                filename = %file.info.filename,
                bytes = file.info.size,
                chunks = file.chunks.len(),
                "file stored"
            );
            Arc::new(file)
        });
        Arc::clone(entry.value())
    }

    pub fn lookup(&self, hash: &Digest) -> Option<Arc<StoredFile>> {
        self.files.get(hash).map(|f| Arc::clone(f.value()))
    }

    pub fn lookup_chunk(&self, hash: &Digest, index: u32) -> Option<StoredChunk> {
        self.files
            .get(hash)
            .and_then(|file| file.chunk(index).cloned())
    }

    pub fn contains(&self, hash: &Digest) -> bool {
        self.files.contains_key(hash)
    }

    /// Snapshot of every stored file.
    pub fn files(&self) -> Vec<Arc<StoredFile>> {
        self.files.iter().map(|f| Arc::clone(f.value())).collect()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}
