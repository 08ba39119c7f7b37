//! Prime-field Weierstrass curve arithmetic over caller-supplied domain
//! parameters.
//!
//! Unlike fixed-curve implementations, the modulus is only known at runtime,
//! so field elements are arbitrary-precision [`BoxedUint`] values operated on
//! in Montgomery form. Point addition and doubling use the complete formulas
//! of Renes–Costello–Batina (<https://eprint.iacr.org/2015/1060>, Algorithms
//! 1 and 3), which have no exceptional cases for the identity or equal
//! operands, and scalar multiplication runs a fixed-length ladder over the
//! scalar's full precision rather than its actual bit length.

use alloc::{vec, vec::Vec};

use crypto_bigint::{
    BoxedUint, ConstantTimeSelect, Integer,
    modular::{BoxedMontyForm, BoxedMontyParams},
};
use subtle::{Choice, ConstantTimeEq};
use zeroize::Zeroizing;

use crate::error::{Error, Result};

/// A finite point on a [`Curve`] in affine coordinates.
///
/// Values are only constructed by curve operations or by
/// [`Curve::point_from_be_bytes`], which validates the curve equation; the
/// point at infinity has no affine representation and surfaces as
/// [`Error::PointAtInfinity`] instead.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AffinePoint {
    x: BoxedUint,
    y: BoxedUint,
}

impl AffinePoint {
    /// Borrow the x-coordinate.
    pub fn x(&self) -> &BoxedUint {
        &self.x
    }

    /// Borrow the y-coordinate.
    pub fn y(&self) -> &BoxedUint {
        &self.y
    }

    /// x-coordinate as big-endian bytes, zero-padded to `len`.
    pub(crate) fn x_be_bytes(&self, len: usize) -> Zeroizing<Vec<u8>> {
        be_bytes(&self.x, len)
    }

    /// y-coordinate as big-endian bytes, zero-padded to `len`.
    pub(crate) fn y_be_bytes(&self, len: usize) -> Zeroizing<Vec<u8>> {
        be_bytes(&self.y, len)
    }
}

/// A point in projective coordinates, in Montgomery form.
///
/// The identity is `(0 : 1 : 0)`.
#[derive(Clone, Debug)]
struct ProjectivePoint {
    x: BoxedMontyForm,
    y: BoxedMontyForm,
    z: BoxedMontyForm,
}

/// Domain parameters of an elliptic curve `y² ≡ x³ + ax + b (mod p)`.
///
/// Immutable once constructed and shared by all operations on the curve.
/// Construction checks that `p` is odd, that `a`, `b` and the base point
/// coordinates are reduced field elements, and that the base point satisfies
/// the curve equation; that the base point has order `n` is the caller's
/// responsibility.
#[derive(Clone, Debug)]
pub struct Curve {
    prime: BoxedUint,
    monty: BoxedMontyParams,
    a: BoxedMontyForm,
    b: BoxedMontyForm,
    b3: BoxedMontyForm,
    generator: AffinePoint,
    order: BoxedUint,
    cofactor: u8,
    field_len: usize,
}

impl Curve {
    /// Build a curve from big-endian encodings of the domain parameters:
    /// prime `p`, coefficients `a` and `b`, base point coordinates `gx` and
    /// `gy`, group order `n`, and the cofactor `h`.
    pub fn new(
        p: &[u8],
        a: &[u8],
        b: &[u8],
        gx: &[u8],
        gy: &[u8],
        n: &[u8],
        cofactor: u8,
    ) -> Result<Self> {
        if cofactor == 0 {
            return Err(Error::InvalidParameters);
        }
        let p = strip_leading_zeroes(p);
        if p.is_empty() {
            return Err(Error::InvalidParameters);
        }
        let field_len = p.len();
        let prime = uint_from_be_slice(p, bit_length(field_len)?)?;
        if !bool::from(prime.is_odd()) {
            return Err(Error::InvalidParameters);
        }
        let precision = prime.bits_precision();

        let a = reduced_element(a, &prime, precision).ok_or(Error::InvalidParameters)?;
        let b = reduced_element(b, &prime, precision).ok_or(Error::InvalidParameters)?;
        let gx = reduced_element(gx, &prime, precision).ok_or(Error::InvalidCurvePoint)?;
        let gy = reduced_element(gy, &prime, precision).ok_or(Error::InvalidCurvePoint)?;

        let order = strip_leading_zeroes(n);
        let order = uint_from_be_slice(order, bit_length(order.len().max(1))?)?;
        if order.bits() < 2 {
            return Err(Error::InvalidParameters);
        }

        let odd_prime = Option::from(prime.to_odd()).ok_or(Error::InvalidParameters)?;
        let monty = BoxedMontyParams::new(odd_prime);
        let a = BoxedMontyForm::new(a, monty.clone());
        let b = BoxedMontyForm::new(b, monty.clone());
        let b3 = &(&b + &b) + &b;

        let curve = Self {
            prime,
            monty,
            a,
            b,
            b3,
            generator: AffinePoint { x: gx, y: gy },
            order,
            cofactor,
            field_len,
        };
        if !bool::from(curve.is_on_curve(&curve.generator)) {
            return Err(Error::InvalidCurvePoint);
        }
        Ok(curve)
    }

    /// The field prime `p`.
    pub fn prime(&self) -> &BoxedUint {
        &self.prime
    }

    /// The base point `G`.
    pub fn generator(&self) -> &AffinePoint {
        &self.generator
    }

    /// The order `n` of the base point.
    pub fn order(&self) -> &BoxedUint {
        &self.order
    }

    /// The cofactor `h`.
    pub fn cofactor(&self) -> u8 {
        self.cofactor
    }

    /// Serialized length of one field element in bytes.
    pub fn field_len(&self) -> usize {
        self.field_len
    }

    /// Whether `(x, y)` satisfies `y² ≡ x³ + ax + b (mod p)`.
    pub fn is_on_curve(&self, point: &AffinePoint) -> Choice {
        let x = BoxedMontyForm::new(point.x.clone(), self.monty.clone());
        let y = BoxedMontyForm::new(point.y.clone(), self.monty.clone());
        let lhs = y.square();
        let x_cubed = &x.square() * &x;
        let rhs = &(&x_cubed + &(&self.a * &x)) + &self.b;
        lhs.retrieve().ct_eq(&rhs.retrieve())
    }

    /// Reconstruct a point from untrusted big-endian coordinate bytes,
    /// rejecting coordinates outside the field and points not on the curve.
    pub fn point_from_be_bytes(&self, x: &[u8], y: &[u8]) -> Result<AffinePoint> {
        let precision = self.prime.bits_precision();
        let x = reduced_element(x, &self.prime, precision).ok_or(Error::InvalidCurvePoint)?;
        let y = reduced_element(y, &self.prime, precision).ok_or(Error::InvalidCurvePoint)?;
        let point = AffinePoint { x, y };
        if bool::from(self.is_on_curve(&point)) {
            Ok(point)
        } else {
            Err(Error::InvalidCurvePoint)
        }
    }

    /// Compute `[scalar]point` and return the affine result.
    ///
    /// Scalar range validation ([1, n-1]) happens in the callers; a result of
    /// the point at infinity is reported as [`Error::PointAtInfinity`].
    pub fn multiply(&self, point: &AffinePoint, scalar: &BoxedUint) -> Result<AffinePoint> {
        let mut acc = self.identity();
        let mut addend = self.to_projective(point);
        // Fixed ladder over the scalar's precision; the sum and the doubling
        // are computed on every iteration and the accumulator is updated by
        // limb-wise constant-time selection.
        for i in 0..scalar.bits_precision() {
            let sum = self.add_points(&acc, &addend);
            acc = self.select_point(&acc, &sum, scalar.bit(i));
            addend = self.double_point(&addend);
        }
        self.to_affine(&acc)
    }

    /// Compute `[scalar]G` and return the affine result.
    pub fn multiply_generator(&self, scalar: &BoxedUint) -> Result<AffinePoint> {
        self.multiply(&self.generator, scalar)
    }

    /// `a` if `choice` is unset, `b` if it is set, without branching on the
    /// choice.
    fn select_point(&self, a: &ProjectivePoint, b: &ProjectivePoint, choice: Choice) -> ProjectivePoint {
        ProjectivePoint {
            x: self.select_element(&a.x, &b.x, choice),
            y: self.select_element(&a.y, &b.y, choice),
            z: self.select_element(&a.z, &b.z, choice),
        }
    }

    fn select_element(
        &self,
        a: &BoxedMontyForm,
        b: &BoxedMontyForm,
        choice: Choice,
    ) -> BoxedMontyForm {
        BoxedMontyForm::from_montgomery(
            BoxedUint::ct_select(a.as_montgomery(), b.as_montgomery(), choice),
            self.monty.clone(),
        )
    }

    fn identity(&self) -> ProjectivePoint {
        ProjectivePoint {
            x: BoxedMontyForm::zero(self.monty.clone()),
            y: BoxedMontyForm::one(self.monty.clone()),
            z: BoxedMontyForm::zero(self.monty.clone()),
        }
    }

    fn to_projective(&self, point: &AffinePoint) -> ProjectivePoint {
        ProjectivePoint {
            x: BoxedMontyForm::new(point.x.clone(), self.monty.clone()),
            y: BoxedMontyForm::new(point.y.clone(), self.monty.clone()),
            z: BoxedMontyForm::one(self.monty.clone()),
        }
    }

    fn to_affine(&self, point: &ProjectivePoint) -> Result<AffinePoint> {
        let inverse =
            Option::<BoxedMontyForm>::from(point.z.invert()).ok_or(Error::PointAtInfinity)?;
        Ok(AffinePoint {
            x: (&point.x * &inverse).retrieve(),
            y: (&point.y * &inverse).retrieve(),
        })
    }

    /// Complete addition (Renes–Costello–Batina, Algorithm 1).
    fn add_points(&self, lhs: &ProjectivePoint, rhs: &ProjectivePoint) -> ProjectivePoint {
        let mut t0 = &lhs.x * &rhs.x;
        let mut t1 = &lhs.y * &rhs.y;
        let mut t2 = &lhs.z * &rhs.z;
        let mut t3 = &(&lhs.x + &lhs.y) * &(&rhs.x + &rhs.y);
        let mut t4 = &t0 + &t1;
        t3 = &t3 - &t4;
        t4 = &(&lhs.x + &lhs.z) * &(&rhs.x + &rhs.z);
        let mut t5 = &t0 + &t2;
        t4 = &t4 - &t5;
        t5 = &(&lhs.y + &lhs.z) * &(&rhs.y + &rhs.z);
        let mut x3 = &t1 + &t2;
        t5 = &t5 - &x3;
        let mut z3 = &self.a * &t4;
        x3 = &self.b3 * &t2;
        z3 = &x3 + &z3;
        x3 = &t1 - &z3;
        z3 = &t1 + &z3;
        let mut y3 = &x3 * &z3;
        t1 = &t0 + &t0;
        t1 = &t1 + &t0;
        t2 = &self.a * &t2;
        t4 = &self.b3 * &t4;
        t1 = &t1 + &t2;
        t2 = &t0 - &t2;
        t2 = &self.a * &t2;
        t4 = &t4 + &t2;
        t0 = &t1 * &t4;
        y3 = &y3 + &t0;
        t0 = &t5 * &t4;
        x3 = &(&t3 * &x3) - &t0;
        t0 = &t3 * &t1;
        z3 = &(&t5 * &z3) + &t0;
        ProjectivePoint {
            x: x3,
            y: y3,
            z: z3,
        }
    }

    /// Complete doubling (Renes–Costello–Batina, Algorithm 3).
    fn double_point(&self, point: &ProjectivePoint) -> ProjectivePoint {
        let mut t0 = point.x.square();
        let t1 = point.y.square();
        let mut t2 = point.z.square();
        let mut t3 = &point.x * &point.y;
        t3 = &t3 + &t3;
        let mut z3 = &point.x * &point.z;
        z3 = &z3 + &z3;
        let mut x3 = &self.a * &z3;
        let mut y3 = &(&self.b3 * &t2) + &x3;
        x3 = &t1 - &y3;
        y3 = &t1 + &y3;
        y3 = &x3 * &y3;
        x3 = &t3 * &x3;
        z3 = &self.b3 * &z3;
        t2 = &self.a * &t2;
        t3 = &(&t0 - &t2) * &self.a;
        t3 = &t3 + &z3;
        z3 = &t0 + &t0;
        t0 = &(&z3 + &t0) + &t2;
        t0 = &t0 * &t3;
        y3 = &y3 + &t0;
        t2 = &point.y * &point.z;
        t2 = &t2 + &t2;
        t0 = &t2 * &t3;
        x3 = &x3 - &t0;
        z3 = &t2 * &t1;
        z3 = &z3 + &z3;
        z3 = &z3 + &z3;
        ProjectivePoint {
            x: x3,
            y: y3,
            z: z3,
        }
    }
}

/// Number of bits in `len` bytes, guarding against overflow.
fn bit_length(len: usize) -> Result<u32> {
    len.checked_mul(8)
        .and_then(|bits| u32::try_from(bits).ok())
        .ok_or(Error::InvalidParameters)
}

/// Strip leading zero bytes from a big-endian encoding.
pub(crate) fn strip_leading_zeroes(mut bytes: &[u8]) -> &[u8] {
    while let [0, rest @ ..] = bytes {
        bytes = rest;
    }
    bytes
}

/// Decode big-endian bytes into a [`BoxedUint`] of the given precision, or
/// `None` if the value does not fit.
pub(crate) fn uint_from_be_bytes(bytes: &[u8], bits_precision: u32) -> Option<BoxedUint> {
    let bytes = strip_leading_zeroes(bytes);
    let bits = u32::try_from(bytes.len().checked_mul(8)?).ok()?;
    if bits > bits_precision {
        return None;
    }
    BoxedUint::from_be_slice(bytes, bits_precision).ok()
}

fn uint_from_be_slice(bytes: &[u8], bits_precision: u32) -> Result<BoxedUint> {
    uint_from_be_bytes(bytes, bits_precision).ok_or(Error::InvalidParameters)
}

/// Decode a fully reduced field element, i.e. a value strictly below the
/// modulus.
fn reduced_element(bytes: &[u8], modulus: &BoxedUint, bits_precision: u32) -> Option<BoxedUint> {
    let value = uint_from_be_bytes(bytes, bits_precision)?;
    if value < *modulus { Some(value) } else { None }
}

/// Big-endian encoding of `value`, zero-padded (or trimmed of excess zero
/// limbs) to exactly `len` bytes.
pub(crate) fn be_bytes(value: &BoxedUint, len: usize) -> Zeroizing<Vec<u8>> {
    let raw = Zeroizing::new(value.to_be_bytes());
    let mut out = Zeroizing::new(vec![0u8; len]);
    if raw.len() >= len {
        out.copy_from_slice(&raw[raw.len() - len..]);
    } else {
        out[len - raw.len()..].copy_from_slice(&raw);
    }
    out
}
