use sealift_common::error::{MAX_PARTS, Result, SealiftError};

/// One byte range of the file, computed once up front and never mutated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk {
    /// 0-based position in the chunk sequence.
    pub index: usize,
    pub offset: u64,
    pub len: u64,
}

impl Chunk {
    /// The store's 1-based part number for this chunk.
    pub fn part_number(&self) -> i32 {
        self.index as i32 + 1
    }
}

/// Partitions `[0, size)` into ordered chunks of `chunk_size` bytes, the last
/// one shorter when `size` is not a multiple. Fails before any network call
/// when the part count would exceed the store's ceiling.
pub fn plan_chunks(size: u64, chunk_size: u64) -> Result<Vec<Chunk>> {
    if chunk_size == 0 {
        return Err(SealiftError::Validation(
            "chunk size must be at least one byte".to_string(),
        ));
    }

    let count = size.div_ceil(chunk_size) as usize;
    if count > MAX_PARTS {
        return Err(SealiftError::TooManyParts {
            parts: count,
            max_parts: MAX_PARTS,
        });
    }

    let mut chunks = Vec::with_capacity(count);
    let mut offset = 0;
    while offset < size {
        let len = chunk_size.min(size - offset);
        chunks.push(Chunk {
            index: chunks.len(),
            offset,
            len,
        });
        offset += len;
    }
    Ok(chunks)
}
