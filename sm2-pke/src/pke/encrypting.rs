//! Encryption side of the scheme.

use alloc::vec::Vec;

use der::Encode;
use digest::{Digest, FixedOutputReset, Output};
use rand_core::TryCryptoRng;
use zeroize::Zeroizing;

#[cfg(feature = "sm3")]
use sm3::Sm3;

use super::{MAX_ATTEMPTS, sample_scalar, xor};
use crate::{
    arithmetic::{AffinePoint, Curve},
    cipher::{Cipher, worst_case_len},
    error::{Error, Result},
    kdf::kdf,
};

/// SM2 public key bound to its curve, used to produce ciphertexts.
#[derive(Clone, Debug)]
pub struct EncryptingKey {
    curve: Curve,
    public_point: AffinePoint,
}

impl EncryptingKey {
    /// Initialize from a curve and a public point already known to be valid
    /// for it.
    ///
    /// Returns [`Error::InvalidCurvePoint`] if the point does not satisfy the
    /// curve equation.
    pub fn new(curve: Curve, public_point: AffinePoint) -> Result<Self> {
        if !bool::from(curve.is_on_curve(&public_point)) {
            return Err(Error::InvalidCurvePoint);
        }
        Ok(Self {
            curve,
            public_point,
        })
    }

    /// Initialize from big-endian coordinate bytes of the public point.
    pub fn from_be_coordinates(curve: Curve, x: &[u8], y: &[u8]) -> Result<Self> {
        let public_point = curve.point_from_be_bytes(x, y)?;
        Ok(Self {
            curve,
            public_point,
        })
    }

    /// Borrow the curve this key lives on.
    pub fn curve(&self) -> &Curve {
        &self.curve
    }

    /// Borrow the public point.
    pub fn as_affine(&self) -> &AffinePoint {
        &self.public_point
    }

    /// Upper bound on the ciphertext size for a message of `msg_len` bytes
    /// under digest `D`.
    ///
    /// The DER integers encoding the ephemeral point vary in size with the
    /// drawn scalar, so this is a bound, not the exact length; the value
    /// returned by the encrypt functions is authoritative.
    pub fn ciphertext_len<D: Digest>(&self, msg_len: usize) -> Result<usize> {
        worst_case_len(self.curve.field_len(), <D as Digest>::output_size(), msg_len)
    }

    /// Encrypt `msg` with the SM3 digest, returning the DER ciphertext
    /// record.
    #[cfg(feature = "sm3")]
    pub fn encrypt<R: TryCryptoRng + ?Sized>(&self, rng: &mut R, msg: &[u8]) -> Result<Vec<u8>> {
        self.encrypt_digest::<R, Sm3>(rng, msg)
    }

    /// Encrypt `msg` with the SM3 digest into `out`, returning the number of
    /// bytes written.
    #[cfg(feature = "sm3")]
    pub fn encrypt_into<R: TryCryptoRng + ?Sized>(
        &self,
        rng: &mut R,
        msg: &[u8],
        out: &mut [u8],
    ) -> Result<usize> {
        self.encrypt_digest_into::<R, Sm3>(rng, msg, out)
    }

    /// Encrypt `msg` with digest `D`, returning the DER ciphertext record.
    ///
    /// Draws a fresh ephemeral scalar per attempt and retries on the rare
    /// degenerate outcomes (shared point at infinity, all-zero mask), up to
    /// a bounded number of rounds.
    pub fn encrypt_digest<R, D>(&self, rng: &mut R, msg: &[u8]) -> Result<Vec<u8>>
    where
        R: TryCryptoRng + ?Sized,
        D: Digest + FixedOutputReset,
    {
        let field_len = self.curve.field_len();
        let mut hasher = D::new();
        let mut tag = Output::<D>::default();

        for _ in 0..MAX_ATTEMPTS {
            let k = Zeroizing::new(sample_scalar(rng, self.curve.order())?);
            // k in [1, n-1], so [k]G is finite
            let c1 = self.curve.multiply_generator(&k)?;
            let shared = match self.curve.multiply(&self.public_point, &k) {
                Ok(point) => point,
                Err(Error::PointAtInfinity) => continue,
                Err(err) => return Err(err),
            };

            let x2 = shared.x_be_bytes(field_len);
            let y2 = shared.y_be_bytes(field_len);
            let mut seed = Zeroizing::new(Vec::with_capacity(field_len * 2));
            seed.extend_from_slice(&x2);
            seed.extend_from_slice(&y2);

            let t = kdf::<D>(&seed, msg.len())?;
            if !msg.is_empty() && t.iter().all(|&b| b == 0) {
                continue;
            }
            let mut body = Zeroizing::new(msg.to_vec());
            xor(&mut body, &t);

            Digest::update(&mut hasher, &*x2);
            Digest::update(&mut hasher, msg);
            Digest::update(&mut hasher, &*y2);
            Digest::finalize_into_reset(&mut hasher, &mut tag);

            let x1 = c1.x_be_bytes(field_len);
            let y1 = c1.y_be_bytes(field_len);
            return Ok(Cipher::new(&x1, &y1, &tag, &body)?.to_der()?);
        }

        Err(Error::RandomnessExhausted)
    }

    /// Encrypt `msg` with digest `D` into `out`, returning the number of
    /// bytes written.
    ///
    /// `out` must hold at least [`ciphertext_len`][Self::ciphertext_len]
    /// bytes, otherwise [`Error::BufferTooSmall`] is returned before any
    /// randomness is consumed.
    pub fn encrypt_digest_into<R, D>(
        &self,
        rng: &mut R,
        msg: &[u8],
        out: &mut [u8],
    ) -> Result<usize>
    where
        R: TryCryptoRng + ?Sized,
        D: Digest + FixedOutputReset,
    {
        if out.len() < self.ciphertext_len::<D>(msg.len())? {
            return Err(Error::BufferTooSmall);
        }
        let record = self.encrypt_digest::<R, D>(rng, msg)?;
        out[..record.len()].copy_from_slice(&record);
        Ok(record.len())
    }
}
