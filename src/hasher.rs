//! Cryptographic state hashing using Blake3

use blake3::Hasher as Blake3Hasher;

use crate::checksum::{ChecksumSink, Persist};
use crate::types::StateHash;

/// Checksum sink feeding a Blake3 hasher through a small buffer
struct Blake3Sink {
    hasher: Blake3Hasher,
    buffer: Vec<u8>,
}

impl Blake3Sink {
    const FLUSH_AT: usize = 4096;

    fn new() -> Self {
        Self {
            hasher: Blake3Hasher::new(),
            buffer: Vec::with_capacity(Self::FLUSH_AT),
        }
    }

    fn finish(mut self) -> StateHash {
        self.hasher.update(&self.buffer);
        StateHash(*self.hasher.finalize().as_bytes())
    }
}

impl ChecksumSink for Blake3Sink {
    fn put(&mut self, octet: u8) {
        self.buffer.push(octet);
        if self.buffer.len() >= Self::FLUSH_AT {
            self.hasher.update(&self.buffer);
            self.buffer.clear();
        }
    }
}

/// StateHasher reduces the checksum stream of a value to a 32 byte Blake3 hash
///
/// The stream comes from [`Persist::checksum`], so the hash is independent of
/// serde representations and identical for bit-identical values.
#[derive(Debug, Clone, Default)]
pub struct StateHasher;

impl StateHasher {
    /// Create a new StateHasher
    pub fn new() -> Self {
        Self
    }

    /// Compute the hash of any persisted value
    pub fn hash<T: Persist>(&self, value: &T) -> StateHash {
        let mut sink = Blake3Sink::new();
        value.checksum(&mut sink);
        sink.finish()
    }

    /// Compute a hash chain from a sequence of step hashes
    ///
    /// The chain represents the whole timeline; changing any step or the
    /// order of steps changes the chain.
    pub fn hash_chain(&self, hashes: &[StateHash]) -> StateHash {
        let mut hasher = Blake3Hasher::new();
        for hash in hashes {
            hasher.update(&hash.0);
        }
        StateHash(*hasher.finalize().as_bytes())
    }

    /// Extend an existing chain hash by one step hash
    pub fn extend_chain(&self, previous_chain_hash: &StateHash, new_hash: &StateHash) -> StateHash {
        let mut hasher = Blake3Hasher::new();
        hasher.update(&previous_chain_hash.0);
        hasher.update(&new_hash.0);
        StateHash(*hasher.finalize().as_bytes())
    }
}
