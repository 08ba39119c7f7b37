//! Error types.

use core::fmt;

/// Result type with the `sm2-pke` crate's [`Error`] type.
pub type Result<T> = core::result::Result<T, Error>;

/// SM2 encryption errors.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum Error {
    /// Recomputed hash does not match the authentication tag of the
    /// ciphertext record, or an equivalent failure occurred while processing
    /// the record.
    ///
    /// Decryption deliberately reports invalid ephemeral points the same way
    /// as tag mismatches so the two cases cannot be used as an oracle.
    AuthenticationFailed,

    /// Caller-provided output buffer is smaller than the size reported by
    /// [`ciphertext_len`][crate::pke::EncryptingKey::ciphertext_len] or
    /// [`plaintext_len`][crate::pke::DecryptingKey::plaintext_len].
    BufferTooSmall,

    /// Point does not satisfy the curve equation.
    InvalidCurvePoint,

    /// Malformed or truncated ciphertext record.
    InvalidEncoding,

    /// Requested length cannot be produced (e.g. KDF output beyond the
    /// counter space, or a size overflowing the DER length type).
    InvalidLength,

    /// Domain parameters are unusable: even prime, zero order, or
    /// coefficients outside the field.
    InvalidParameters,

    /// Scalar outside the range `[1, n-1]`.
    InvalidScalar,

    /// A finite point was required but the point at infinity was produced.
    PointAtInfinity,

    /// The randomness source failed, or could not supply a usable scalar
    /// within the bounded number of attempts.
    RandomnessExhausted,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Error::AuthenticationFailed => "ciphertext authentication failed",
            Error::BufferTooSmall => "output buffer too small",
            Error::InvalidCurvePoint => "point is not on the curve",
            Error::InvalidEncoding => "malformed ciphertext record",
            Error::InvalidLength => "invalid length",
            Error::InvalidParameters => "invalid domain parameters",
            Error::InvalidScalar => "scalar out of range",
            Error::PointAtInfinity => "unexpected point at infinity",
            Error::RandomnessExhausted => "randomness source exhausted",
        };
        f.write_str(msg)
    }
}

impl core::error::Error for Error {}

impl From<der::Error> for Error {
    fn from(_: der::Error) -> Error {
        Error::InvalidEncoding
    }
}
