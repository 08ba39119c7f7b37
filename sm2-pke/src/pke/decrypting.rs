//! Decryption side of the scheme.

use alloc::vec::Vec;
use core::fmt::{self, Debug};

use crypto_bigint::BoxedUint;
use der::Decode;
use digest::{Digest, FixedOutputReset, Output};
use subtle::ConstantTimeEq;
use zeroize::{Zeroize, Zeroizing};

#[cfg(feature = "sm3")]
use sm3::Sm3;

use super::{encrypting::EncryptingKey, xor};
use crate::{
    arithmetic::{Curve, uint_from_be_bytes},
    cipher::Cipher,
    error::{Error, Result},
    kdf::kdf,
};

/// SM2 private key bound to its curve.
///
/// Holds the secret scalar and the derived [`EncryptingKey`]; the scalar is
/// zeroized on drop and never printed.
#[derive(Clone)]
pub struct DecryptingKey {
    secret: Zeroizing<BoxedUint>,
    encrypting_key: EncryptingKey,
}

impl DecryptingKey {
    /// Parse a private key from a big-endian encoded secret scalar.
    ///
    /// Returns [`Error::InvalidScalar`] unless the scalar is in `[1, n-1]`.
    /// The public point is derived as `[d]G`.
    pub fn new(curve: Curve, secret: &[u8]) -> Result<Self> {
        let secret = uint_from_be_bytes(secret, curve.order().bits_precision())
            .ok_or(Error::InvalidScalar)?;
        if bool::from(secret.is_zero()) || secret >= *curve.order() {
            return Err(Error::InvalidScalar);
        }
        let public_point = curve.multiply_generator(&secret)?;
        Ok(Self {
            secret: Zeroizing::new(secret),
            encrypting_key: EncryptingKey::new(curve, public_point)?,
        })
    }

    /// Get the [`EncryptingKey`] which corresponds to this [`DecryptingKey`].
    pub fn encrypting_key(&self) -> &EncryptingKey {
        &self.encrypting_key
    }

    /// Borrow the curve this key lives on.
    pub fn curve(&self) -> &Curve {
        self.encrypting_key.curve()
    }

    /// Plaintext size in bytes of the given DER ciphertext record.
    pub fn plaintext_len(&self, ciphertext: &[u8]) -> Result<usize> {
        Ok(Cipher::from_der(ciphertext)?.body().len())
    }

    /// Decrypt a DER ciphertext record produced with the SM3 digest.
    #[cfg(feature = "sm3")]
    pub fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>> {
        self.decrypt_digest::<Sm3>(ciphertext)
    }

    /// Decrypt a DER ciphertext record produced with the SM3 digest into
    /// `out`, returning the number of bytes written.
    #[cfg(feature = "sm3")]
    pub fn decrypt_into(&self, ciphertext: &[u8], out: &mut [u8]) -> Result<usize> {
        self.decrypt_digest_into::<Sm3>(ciphertext, out)
    }

    /// Decrypt a DER ciphertext record produced with digest `D`.
    ///
    /// Structurally malformed records fail with [`Error::InvalidEncoding`].
    /// Everything that requires the secret to observe, including invalid
    /// ephemeral points, fails with [`Error::AuthenticationFailed`]; the tag
    /// comparison is constant time.
    pub fn decrypt_digest<D>(&self, ciphertext: &[u8]) -> Result<Vec<u8>>
    where
        D: Digest + FixedOutputReset,
    {
        let record = Cipher::from_der(ciphertext)?;
        if record.tag().len() != <D as Digest>::output_size() {
            return Err(Error::InvalidEncoding);
        }
        let curve = self.curve();
        let field_len = curve.field_len();
        if record.x1().len() > field_len || record.y1().len() > field_len {
            return Err(Error::InvalidEncoding);
        }

        let c1 = curve
            .point_from_be_bytes(record.x1(), record.y1())
            .map_err(|_| Error::AuthenticationFailed)?;
        if curve.cofactor() > 1 {
            // S = [h]C1 must be a finite point
            let cofactor = uint_from_be_bytes(&[curve.cofactor()], curve.order().bits_precision())
                .ok_or(Error::AuthenticationFailed)?;
            curve
                .multiply(&c1, &cofactor)
                .map_err(|_| Error::AuthenticationFailed)?;
        }
        let shared = curve
            .multiply(&c1, &self.secret)
            .map_err(|_| Error::AuthenticationFailed)?;

        let x2 = shared.x_be_bytes(field_len);
        let y2 = shared.y_be_bytes(field_len);
        let mut seed = Zeroizing::new(Vec::with_capacity(field_len * 2));
        seed.extend_from_slice(&x2);
        seed.extend_from_slice(&y2);

        let t = kdf::<D>(&seed, record.body().len())?;
        if !record.body().is_empty() && t.iter().all(|&b| b == 0) {
            return Err(Error::AuthenticationFailed);
        }
        let mut msg = record.body().to_vec();
        xor(&mut msg, &t);

        let mut hasher = D::new();
        let mut tag = Output::<D>::default();
        Digest::update(&mut hasher, &*x2);
        Digest::update(&mut hasher, &msg);
        Digest::update(&mut hasher, &*y2);
        Digest::finalize_into_reset(&mut hasher, &mut tag);

        if !bool::from(tag.as_slice().ct_eq(record.tag())) {
            msg.zeroize();
            return Err(Error::AuthenticationFailed);
        }
        Ok(msg)
    }

    /// Decrypt a DER ciphertext record produced with digest `D` into `out`,
    /// returning the number of bytes written.
    ///
    /// `out` must hold at least [`plaintext_len`][Self::plaintext_len]
    /// bytes.
    pub fn decrypt_digest_into<D>(&self, ciphertext: &[u8], out: &mut [u8]) -> Result<usize>
    where
        D: Digest + FixedOutputReset,
    {
        if out.len() < self.plaintext_len(ciphertext)? {
            return Err(Error::BufferTooSmall);
        }
        let mut msg = self.decrypt_digest::<D>(ciphertext)?;
        out[..msg.len()].copy_from_slice(&msg);
        let written = msg.len();
        msg.zeroize();
        Ok(written)
    }
}

impl AsRef<EncryptingKey> for DecryptingKey {
    fn as_ref(&self) -> &EncryptingKey {
        &self.encrypting_key
    }
}

impl Debug for DecryptingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecryptingKey")
            .field("encrypting_key", &self.encrypting_key)
            .finish_non_exhaustive()
    }
}
