//! Content hashing
//!
//! A file's identity key is its ED2K hash. [`ContentHasher`] streams a reader
//! block by block, reporting progress after every block and checking for
//! cancellation between blocks.

use crate::progress::{ProgressProvider, ProgressUpdate, SharedProvider};
use crate::shutdown::Shutdown;
use crate::{
    Error, Result,
    error::{IoError, ValidationError},
};
use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tokio::io::{AsyncRead, AsyncReadExt};

pub mod ed2k;

pub use ed2k::{BLOCK_SIZE, Ed2kHasher};

/// 128-bit ED2K digest
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContentHash([u8; ContentHash::LEN]);

impl ContentHash {
    pub const LEN: usize = 16;

    pub fn from_bytes(bytes: [u8; Self::LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; Self::LEN] {
        &self.0
    }

    /// Uppercase hex, the form sent on the wire
    pub fn to_upper_hex(&self) -> String {
        self.0.iter().map(|byte| format!("{byte:02X}")).collect()
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({self})")
    }
}

impl FromStr for ContentHash {
    type Err = ValidationError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        if s.len() != Self::LEN * 2 || !s.is_ascii() {
            return Err(ValidationError::invalid_parameter(
                "ed2k",
                "expected 32 hexadecimal characters",
            ));
        }

        let mut bytes = [0u8; Self::LEN];
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = u8::from_str_radix(&s[i * 2..i * 2 + 2], 16).map_err(|_| {
                ValidationError::invalid_parameter("ed2k", "expected 32 hexadecimal characters")
            })?;
        }
        Ok(Self(bytes))
    }
}

impl TryFrom<String> for ContentHash {
    type Error = ValidationError;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ContentHash> for String {
    fn from(hash: ContentHash) -> Self {
        hash.to_string()
    }
}

/// Hash and length of a fully read stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashOutput {
    pub hash: ContentHash,
    pub size: u64,
}

/// Streams readers through [`Ed2kHasher`]
#[derive(Debug, Clone)]
pub struct ContentHasher {
    progress: SharedProvider,
    shutdown: Shutdown,
    read_buffer_size: usize,
}

impl ContentHasher {
    const DEFAULT_READ_BUFFER: usize = 1024 * 1024;

    pub fn new(progress: SharedProvider, shutdown: Shutdown) -> Self {
        Self {
            progress,
            shutdown,
            read_buffer_size: Self::DEFAULT_READ_BUFFER,
        }
    }

    pub fn with_read_buffer_size(mut self, size: usize) -> Self {
        self.read_buffer_size = size.max(1);
        self
    }

    /// Hash a file on disk
    pub async fn hash_file(&self, path: &Path) -> Result<HashOutput> {
        let mut file = tokio::fs::File::open(path)
            .await
            .map_err(|e| Error::Io(IoError::from_std(e).with_path(path)))?;
        let total_bytes = file
            .metadata()
            .await
            .map_err(|e| Error::Io(IoError::from_std(e).with_path(path)))?
            .len();

        debug!("Hashing {} ({total_bytes} bytes)", path.display());
        self.hash_reader(&mut file, path, total_bytes).await
    }

    /// Hash any async reader. `path` and `total_bytes` are only used for progress.
    pub async fn hash_reader<R>(
        &self,
        reader: &mut R,
        path: &Path,
        total_bytes: u64,
    ) -> Result<HashOutput>
    where
        R: AsyncRead + Unpin,
    {
        let mut hasher = Ed2kHasher::new();
        let mut buffer = vec![0u8; self.read_buffer_size];

        loop {
            if self.shutdown.is_triggered() {
                debug!("Hashing of {} cancelled", path.display());
                return Err(Error::Cancelled);
            }

            let (read, eof) = read_block(reader, &mut hasher, &mut buffer)
                .await
                .map_err(|e| Error::Io(IoError::from_std(e).with_path(path)))?;

            if read > 0 {
                self.progress.report(ProgressUpdate::HashProgress {
                    path: PathBuf::from(path),
                    bytes_processed: hasher.bytes_processed(),
                    total_bytes: total_bytes.max(hasher.bytes_processed()),
                });
            }

            if eof {
                break;
            }
        }

        let size = hasher.bytes_processed();
        Ok(HashOutput {
            hash: hasher.finalize(),
            size,
        })
    }
}

/// Feed the hasher until the current block is complete or the reader is exhausted
async fn read_block<R>(
    reader: &mut R,
    hasher: &mut Ed2kHasher,
    buffer: &mut [u8],
) -> std::io::Result<(usize, bool)>
where
    R: AsyncRead + Unpin,
{
    let mut remaining = hasher.remaining_in_block();
    let mut read_total = 0;

    while remaining > 0 {
        let want = remaining.min(buffer.len());
        let read = reader.read(&mut buffer[..want]).await?;
        if read == 0 {
            return Ok((read_total, true));
        }
        hasher.update(&buffer[..read]);
        remaining -= read;
        read_total += read;
    }

    Ok((read_total, false))
}
