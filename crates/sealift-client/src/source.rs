use std::io::SeekFrom;
use std::path::PathBuf;

use async_trait::async_trait;
use bytes::Bytes;
use sealift_common::error::Result;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};

use crate::chunk::Chunk;

/// Where chunk bytes come from. Reads are chunk-granular so the whole file is
/// never resident in memory.
#[async_trait]
pub trait ChunkSource: Send + Sync {
    async fn read_chunk(&self, chunk: &Chunk) -> Result<Bytes>;
}

/// Reads chunks from a file on disk. Each read opens its own handle, so
/// concurrent parts never contend on a shared file position.
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl ChunkSource for FileSource {
    async fn read_chunk(&self, chunk: &Chunk) -> Result<Bytes> {
        let mut file = File::open(&self.path).await?;
        file.seek(SeekFrom::Start(chunk.offset)).await?;
        let mut buf = vec![0u8; chunk.len as usize];
        file.read_exact(&mut buf).await?;
        Ok(Bytes::from(buf))
    }
}
