//! SM2 public-key encryption as defined in GM/T 0003-2012 part 4.
//!
//! Encryption draws an ephemeral scalar `k`, computes the point `C1 = [k]G`
//! and the shared point `(x2, y2) = [k]Q`, masks the message with
//! `KDF(x2 ‖ y2, len(msg))` and authenticates it with
//! `C3 = H(x2 ‖ msg ‖ y2)`. Decryption recovers `(x2, y2)` as `[d]C1` and
//! verifies the tag in constant time. Ciphertexts are the DER record from
//! [`crate::cipher`].
//!
//! ## Usage
//!
//! ```
//! use hex_literal::hex;
//! use rand_core::OsRng;
//! use sm2_pke::{Curve, pke::DecryptingKey};
//!
//! let curve = Curve::new(
//!     &hex!("8542D69E4C044F18E8B92435BF6FF7DE457283915C45517D722EDB8B08F1DFC3"),
//!     &hex!("787968B4FA32C3FD2417842E73BBFEFF2F3C848B6831D7E0EC65228B3937E498"),
//!     &hex!("63E4C6D3B23B0C849CF84241484BFE48F61D59A5B16BA06E6E12D1DA27C5249A"),
//!     &hex!("421DEBD61B62EAB6746434EBC3CC315E32220B3BADD50BDC4C4E6C147FEDD43D"),
//!     &hex!("0680512BCBB42C07D47349D2153B70C4E5D7FDFCBFA36EA1A85841B9E46E09A2"),
//!     &hex!("8542D69E4C044F18E8B92435BF6FF7DD297720630485628D5AE74EE7C32E79B7"),
//!     1,
//! )?;
//! let decrypting_key = DecryptingKey::new(
//!     curve,
//!     &hex!("1649AB77A00637BD5E2EFE283FBF353534AA7F7CB89463F208DDBC2920BB0DA0"),
//! )?;
//! let encrypting_key = decrypting_key.encrypting_key();
//!
//! let ciphertext = encrypting_key.encrypt(&mut OsRng, b"plaintext")?;
//! assert_eq!(decrypting_key.decrypt(&ciphertext)?, b"plaintext");
//! # Ok::<(), sm2_pke::Error>(())
//! ```

use alloc::vec;

use crypto_bigint::BoxedUint;
use rand_core::TryCryptoRng;
use zeroize::Zeroizing;

use crate::{
    arithmetic::uint_from_be_bytes,
    error::{Error, Result},
};

mod decrypting;
mod encrypting;

pub use self::{decrypting::DecryptingKey, encrypting::EncryptingKey};

/// Bound on rejection-sampling rounds before giving up on the randomness
/// source.
const MAX_ATTEMPTS: usize = 100;

/// Draw a uniform scalar in `[1, n-1]` by rejection sampling.
///
/// When the two bits below the order's top bit are both clear (the order is
/// barely above a power of two and plain rejection would discard most draws),
/// one extra bit is drawn and the order is conditionally subtracted up to
/// twice. Each round consumes `ceil(draw_bits / 8)` bytes from `rng`, big
/// endian, with excess top bits masked off.
pub(crate) fn sample_scalar<R>(rng: &mut R, order: &BoxedUint) -> Result<BoxedUint>
where
    R: TryCryptoRng + ?Sized,
{
    let order_bits = order.bits();
    if order_bits < 2 {
        return Err(Error::InvalidScalar);
    }
    let widened = order_bits >= 3
        && !bool::from(order.bit(order_bits - 2))
        && !bool::from(order.bit(order_bits - 3));
    let draw_bits = if widened { order_bits + 1 } else { order_bits };
    let byte_len = (draw_bits as usize).div_ceil(8);
    let top_mask = 0xffu8 >> (7 - (draw_bits - 1) % 8);

    let precision = u32::try_from(byte_len * 8)
        .map_err(|_| Error::InvalidScalar)?
        .max(order.bits_precision());
    let wide_order = order.widen(precision);

    let mut buf = Zeroizing::new(vec![0u8; byte_len]);
    for _ in 0..MAX_ATTEMPTS {
        rng.try_fill_bytes(&mut buf)
            .map_err(|_| Error::RandomnessExhausted)?;
        buf[0] &= top_mask;
        let mut candidate =
            uint_from_be_bytes(&buf, precision).ok_or(Error::RandomnessExhausted)?;
        if widened {
            if candidate >= wide_order {
                candidate = candidate.wrapping_sub(&wide_order);
            }
            if candidate >= wide_order {
                candidate = candidate.wrapping_sub(&wide_order);
            }
        }
        if bool::from(candidate.is_zero()) || candidate >= wide_order {
            continue;
        }
        return Ok(candidate.shorten(order.bits_precision()));
    }
    Err(Error::RandomnessExhausted)
}

/// XOR `mask` into `buf` byte by byte.
pub(crate) fn xor(buf: &mut [u8], mask: &[u8]) {
    for (b, m) in buf.iter_mut().zip(mask) {
        *b ^= m;
    }
}

#[cfg(all(test, feature = "replay-rng"))]
mod tests {
    use alloc::vec;

    use super::sample_scalar;
    use crate::{arithmetic::uint_from_be_bytes, error::Error, rng::ReplayRng};
    use hex_literal::hex;

    const ORDER: [u8; 32] = hex!("8542D69E4C044F18E8B92435BF6FF7DD297720630485628D5AE74EE7C32E79B7");

    #[test]
    fn replays_known_ephemeral_scalar() {
        // the order's bits 254 and 253 are clear, so a 257-bit draw is used
        let order = uint_from_be_bytes(&ORDER, 256).expect("order fits");
        let mut rng = ReplayRng::new(
            hex!("004C62EEFD6ECFC2B95B92FD6C3D9575148AFA17425546D49018E5388D49DD7B4F").to_vec(),
        );
        let k = sample_scalar(&mut rng, &order).expect("scalar");
        let expected =
            uint_from_be_bytes(
                &hex!("4C62EEFD6ECFC2B95B92FD6C3D9575148AFA17425546D49018E5388D49DD7B4F"),
                256,
            )
            .expect("fits");
        assert_eq!(k, expected);
        assert_eq!(rng.remaining(), 0);
    }

    #[test]
    fn rejects_zero_draw_and_retries() {
        let order = uint_from_be_bytes(&ORDER, 256).expect("order fits");
        let mut bytes = vec![0u8; 33];
        bytes.extend_from_slice(&hex!(
            "004C62EEFD6ECFC2B95B92FD6C3D9575148AFA17425546D49018E5388D49DD7B4F"
        ));
        let mut rng = ReplayRng::new(bytes);
        let k = sample_scalar(&mut rng, &order).expect("scalar");
        let expected =
            uint_from_be_bytes(
                &hex!("4C62EEFD6ECFC2B95B92FD6C3D9575148AFA17425546D49018E5388D49DD7B4F"),
                256,
            )
            .expect("fits");
        assert_eq!(k, expected);
    }

    #[test]
    fn reduces_oversized_draw_into_range() {
        let order = uint_from_be_bytes(&ORDER, 256).expect("order fits");
        // draw = order + 1 after masking; one subtraction leaves 1
        let mut bytes = vec![0u8; 33];
        bytes[0] = 0x00;
        bytes[1..].copy_from_slice(&ORDER);
        *bytes.last_mut().expect("non-empty") += 1;
        let mut rng = ReplayRng::new(bytes);
        let k = sample_scalar(&mut rng, &order).expect("scalar");
        assert_eq!(k, uint_from_be_bytes(&[0x01], 256).expect("fits"));
    }

    #[test]
    fn bounded_attempts_exhaust() {
        let order = uint_from_be_bytes(&ORDER, 256).expect("order fits");
        // every draw masks to ~2^257 - 1, which stays >= order even after
        // two subtractions
        let mut rng = ReplayRng::new(vec![0xFF; 33 * 100]);
        assert_eq!(
            sample_scalar(&mut rng, &order).map(|_| ()),
            Err(Error::RandomnessExhausted)
        );
    }

    #[test]
    fn failing_rng_is_reported() {
        let order = uint_from_be_bytes(&ORDER, 256).expect("order fits");
        let mut rng = ReplayRng::new(vec![0u8; 16]);
        assert_eq!(
            sample_scalar(&mut rng, &order).map(|_| ()),
            Err(Error::RandomnessExhausted)
        );
    }
}
