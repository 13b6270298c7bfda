//! ED2K block-chained MD4 hashing

use super::ContentHash;
use md4::{Digest, Md4};

/// Size of one ED2K block
pub const BLOCK_SIZE: usize = 9_728_000;

/// Incremental ED2K hasher.
///
/// Each block is fed straight into its own MD4 state, so memory use does not
/// depend on the block size. A stream of one block (including an empty or
/// partial one) hashes to that block's digest; longer streams hash to the MD4
/// of all block digests concatenated in order. No trailing empty-block digest
/// is appended when the length is an exact multiple of the block size.
#[derive(Clone)]
pub struct Ed2kHasher {
    current: Md4,
    block_fill: usize,
    block_digests: Vec<u8>,
    bytes_processed: u64,
}

impl Ed2kHasher {
    pub fn new() -> Self {
        Self {
            current: Md4::new(),
            block_fill: 0,
            block_digests: Vec::new(),
            bytes_processed: 0,
        }
    }

    /// Hash an in-memory buffer in one go
    pub fn hash_bytes(data: &[u8]) -> ContentHash {
        let mut hasher = Self::new();
        hasher.update(data);
        hasher.finalize()
    }

    pub fn update(&mut self, data: &[u8]) {
        let mut remaining = data;

        while !remaining.is_empty() {
            let take = remaining.len().min(self.remaining_in_block());
            self.current.update(&remaining[..take]);
            self.block_fill += take;
            remaining = &remaining[take..];

            if self.block_fill == BLOCK_SIZE {
                let digest = self.current.finalize_reset();
                self.block_digests.extend_from_slice(&digest);
                self.block_fill = 0;
            }
        }

        self.bytes_processed += data.len() as u64;
    }

    /// Bytes still needed to complete the current block
    pub fn remaining_in_block(&self) -> usize {
        BLOCK_SIZE - self.block_fill
    }

    pub fn bytes_processed(&self) -> u64 {
        self.bytes_processed
    }

    pub fn finalize(mut self) -> ContentHash {
        if self.block_fill > 0 || self.block_digests.is_empty() {
            let digest = self.current.finalize_reset();
            self.block_digests.extend_from_slice(&digest);
        }

        if self.block_digests.len() == ContentHash::LEN {
            let mut bytes = [0u8; ContentHash::LEN];
            bytes.copy_from_slice(&self.block_digests);
            return ContentHash::from_bytes(bytes);
        }

        let mut root = Md4::new();
        root.update(&self.block_digests);
        ContentHash::from_bytes(root.finalize().into())
    }
}

impl Default for Ed2kHasher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn md4(data: &[u8]) -> [u8; 16] {
        Md4::digest(data).into()
    }

    #[test]
    fn test_empty_input_is_md4_of_nothing() {
        let hash = Ed2kHasher::hash_bytes(b"");
        assert_eq!(hash.to_string(), "31d6cfe0d16ae931b73c59d7e0c089c0");
    }

    #[test]
    fn test_small_input_is_bare_digest() {
        let hash = Ed2kHasher::hash_bytes(b"abc");
        assert_eq!(hash.to_string(), "a448017aaf21d8525fc10ae87aa6729d");
    }

    #[test]
    fn test_exactly_one_block_is_bare_digest() {
        let data = vec![0x5au8; BLOCK_SIZE];
        assert_eq!(Ed2kHasher::hash_bytes(&data).as_bytes(), &md4(&data));
    }

    #[test]
    fn test_two_blocks_chain_block_digests() {
        let mut data = vec![0x11u8; BLOCK_SIZE];
        data.extend(std::iter::repeat_n(0x22u8, 1000));

        let mut chained = Vec::new();
        chained.extend_from_slice(&md4(&data[..BLOCK_SIZE]));
        chained.extend_from_slice(&md4(&data[BLOCK_SIZE..]));

        assert_eq!(Ed2kHasher::hash_bytes(&data).as_bytes(), &md4(&chained));
    }

    #[test]
    fn test_exact_multiple_has_no_trailing_empty_block() {
        let data = vec![0x33u8; BLOCK_SIZE * 2];

        let mut chained = Vec::new();
        chained.extend_from_slice(&md4(&data[..BLOCK_SIZE]));
        chained.extend_from_slice(&md4(&data[BLOCK_SIZE..]));

        assert_eq!(Ed2kHasher::hash_bytes(&data).as_bytes(), &md4(&chained));
    }

    #[test]
    fn test_split_updates_match_single_update() {
        let data: Vec<u8> = (0..BLOCK_SIZE + 4096).map(|i| (i % 251) as u8).collect();

        let mut hasher = Ed2kHasher::new();
        for chunk in data.chunks(65_537) {
            hasher.update(chunk);
        }

        assert_eq!(hasher.bytes_processed(), data.len() as u64);
        assert_eq!(hasher.finalize(), Ed2kHasher::hash_bytes(&data));
    }

    #[test]
    fn test_remaining_in_block_tracks_fill() {
        let mut hasher = Ed2kHasher::new();
        assert_eq!(hasher.remaining_in_block(), BLOCK_SIZE);
        hasher.update(&[0u8; 100]);
        assert_eq!(hasher.remaining_in_block(), BLOCK_SIZE - 100);
    }
}
