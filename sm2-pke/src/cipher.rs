//! ASN.1 DER ciphertext record for SM2 public-key encryption.
//!
//! GM/T 0003-2012 serializes a ciphertext as:
//!
//! ```text
//! SM2Cipher ::= SEQUENCE {
//!     XCoordinate  INTEGER,       -- x1, ephemeral point
//!     YCoordinate  INTEGER,       -- y1, ephemeral point
//!     HASH         OCTET STRING,  -- C3, authentication tag
//!     CipherText   OCTET STRING   -- C2, masked message
//! }
//! ```
//!
//! i.e. C1 ‖ C3 ‖ C2 ordering. The coordinates are DER `INTEGER`s, so their
//! encoded size varies with the numeric value: a leading zero byte is added
//! when the high bit is set and leading zero bytes of the value are dropped.

use der::{
    Decode, DecodeValue, Encode, EncodeValue, Header, Length, Reader, Sequence, Writer,
    asn1::{OctetStringRef, UintRef},
};

use crate::error::{Error, Result};

/// Borrowed form of the `SM2Cipher` DER record.
///
/// Use [`der::Decode::from_der`] / [`der::Encode::to_der`] to convert to and
/// from bytes.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Cipher<'a> {
    x: UintRef<'a>,
    y: UintRef<'a>,
    tag: OctetStringRef<'a>,
    body: OctetStringRef<'a>,
}

impl<'a> Cipher<'a> {
    /// Assemble a record from raw field bytes.
    ///
    /// `x1` and `y1` are unsigned big-endian coordinates; leading zero bytes
    /// are stripped during encoding, so zero-padded fixed-width input is
    /// fine. `tag` is the hash output and `body` the masked message.
    pub fn new(x1: &'a [u8], y1: &'a [u8], tag: &'a [u8], body: &'a [u8]) -> Result<Self> {
        Ok(Self {
            x: UintRef::new(x1)?,
            y: UintRef::new(y1)?,
            tag: OctetStringRef::new(tag)?,
            body: OctetStringRef::new(body)?,
        })
    }

    /// The x-coordinate of the ephemeral point, leading zeroes stripped.
    pub fn x1(&self) -> &'a [u8] {
        self.x.as_bytes()
    }

    /// The y-coordinate of the ephemeral point, leading zeroes stripped.
    pub fn y1(&self) -> &'a [u8] {
        self.y.as_bytes()
    }

    /// The authentication tag (C3).
    pub fn tag(&self) -> &'a [u8] {
        self.tag.as_bytes()
    }

    /// The masked message (C2).
    pub fn body(&self) -> &'a [u8] {
        self.body.as_bytes()
    }
}

impl EncodeValue for Cipher<'_> {
    fn value_len(&self) -> der::Result<Length> {
        ((self.x.encoded_len()? + self.y.encoded_len()?)? + self.tag.encoded_len()?)?
            + self.body.encoded_len()?
    }

    fn encode_value(&self, encoder: &mut impl Writer) -> der::Result<()> {
        self.x.encode(encoder)?;
        self.y.encode(encoder)?;
        self.tag.encode(encoder)?;
        self.body.encode(encoder)?;
        Ok(())
    }
}

impl<'a> DecodeValue<'a> for Cipher<'a> {
    fn decode_value<R: Reader<'a>>(reader: &mut R, header: Header) -> der::Result<Self> {
        // bound the field reads by the SEQUENCE length so an overstated
        // prefix cannot decode
        reader.read_nested(header.length, |reader| {
            Ok(Self {
                x: UintRef::decode(reader)?,
                y: UintRef::decode(reader)?,
                tag: OctetStringRef::decode(reader)?,
                body: OctetStringRef::decode(reader)?,
            })
        })
    }
}

impl<'a> Sequence<'a> for Cipher<'a> {}

/// Length in bytes of one encoded TLV whose value occupies `value` bytes.
fn tlv_len(value: Length) -> der::Result<Length> {
    (Length::ONE + value.encoded_len()?)? + value
}

/// Upper bound on the encoded record size for a curve with `field_len`-byte
/// coordinates, a `tag_len`-byte hash and a `body_len`-byte message.
///
/// Budgets every coordinate at `field_len + 1` bytes (value plus sign pad),
/// so the actual encoding is never longer and usually a little shorter.
pub fn worst_case_len(field_len: usize, tag_len: usize, body_len: usize) -> Result<usize> {
    let coord_value = field_len.checked_add(1).ok_or(Error::InvalidLength)?;
    let total = (|| {
        let coord = tlv_len(Length::try_from(coord_value)?)?;
        let tag = tlv_len(Length::try_from(tag_len)?)?;
        let body = tlv_len(Length::try_from(body_len)?)?;
        let content = (((coord + coord)? + tag)? + body)?;
        tlv_len(content)
    })()
    .map_err(|_| Error::InvalidLength)?;
    usize::try_from(u32::from(total)).map_err(|_| Error::InvalidLength)
}
