//! Key derivation function from GB/T 32918.4 § 5.4.3 / GM/T 0003-2012.
//!
//! Hash blocks of `seed ‖ counter` are concatenated until `out_len` bytes
//! have been produced, with a big-endian 32-bit counter starting at 1.

use alloc::vec::Vec;
use core::cmp::min;

use digest::{Digest, FixedOutputReset, Output};
use zeroize::{Zeroize, Zeroizing};

use crate::error::{Error, Result};

/// Derive `out_len` bytes of key material from `seed` using digest `D`.
///
/// Returns [`Error::InvalidLength`] if `out_len` would exhaust the 32-bit
/// block counter.
pub fn kdf<D>(seed: &[u8], out_len: usize) -> Result<Zeroizing<Vec<u8>>>
where
    D: Digest + FixedOutputReset,
{
    let digest_size = <D as Digest>::output_size();
    let mut out = Zeroizing::new(Vec::with_capacity(out_len));
    let mut hasher = D::new();
    let mut block = Output::<D>::default();
    let mut counter: u32 = 1;

    while out.len() < out_len {
        Digest::update(&mut hasher, seed);
        Digest::update(&mut hasher, counter.to_be_bytes());
        Digest::finalize_into_reset(&mut hasher, &mut block);

        let take = min(digest_size, out_len - out.len());
        out.extend_from_slice(&block[..take]);

        counter = match counter.checked_add(1) {
            Some(next) => next,
            None => {
                if out.len() < out_len {
                    block.zeroize();
                    return Err(Error::InvalidLength);
                }
                break;
            }
        };
    }

    block.zeroize();
    Ok(out)
}
