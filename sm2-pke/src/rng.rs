//! Deterministic randomness replay for reproducing encryption test vectors.
//!
//! Published SM2 test vectors fix the ephemeral scalar, so reproducing them
//! requires feeding the exact bytes the reference implementation drew into
//! the rejection sampler. [`ReplayRng`] hands out a preloaded byte string
//! and fails once it runs dry. It is gated behind the `replay-rng` feature
//! and must never be used outside tests.

use alloc::vec::Vec;
use core::fmt;

use rand_core::{TryCryptoRng, TryRngCore};

/// The preloaded bytes ran out.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ReplayExhausted;

impl fmt::Display for ReplayExhausted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("replayed randomness exhausted")
    }
}

impl core::error::Error for ReplayExhausted {}

/// Randomness source that replays a fixed byte string.
#[derive(Clone, Debug)]
pub struct ReplayRng {
    bytes: Vec<u8>,
    pos: usize,
}

impl ReplayRng {
    /// Preload the bytes to hand out.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
            pos: 0,
        }
    }

    /// Preload from a hex string.
    pub fn from_hex(hex: &str) -> Result<Self, hex::FromHexError> {
        Ok(Self::new(hex::decode(hex)?))
    }

    /// Number of unconsumed bytes.
    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }
}

impl TryRngCore for ReplayRng {
    type Error = ReplayExhausted;

    fn try_next_u32(&mut self) -> Result<u32, Self::Error> {
        let mut buf = [0u8; 4];
        self.try_fill_bytes(&mut buf)?;
        Ok(u32::from_be_bytes(buf))
    }

    fn try_next_u64(&mut self) -> Result<u64, Self::Error> {
        let mut buf = [0u8; 8];
        self.try_fill_bytes(&mut buf)?;
        Ok(u64::from_be_bytes(buf))
    }

    fn try_fill_bytes(&mut self, dst: &mut [u8]) -> Result<(), Self::Error> {
        if self.remaining() < dst.len() {
            return Err(ReplayExhausted);
        }
        dst.copy_from_slice(&self.bytes[self.pos..self.pos + dst.len()]);
        self.pos += dst.len();
        Ok(())
    }
}

// Not cryptographic; the marker is what lets the replayed bytes reach the
// scalar sampler.
impl TryCryptoRng for ReplayRng {}
