//! Bit-vector constant values of arbitrary width
//!
//! A `BvConstant` is an unsigned value reduced modulo 2^width. All
//! arithmetic stays in that residue ring; signed comparisons reinterpret
//! the top bit as a sign. The stack uses a packed `u64` for widths up to
//! 64 and switches to this representation above that, but the operations
//! here accept any width >= 1.

use num_bigint::{BigInt, BigUint};
use num_traits::{One, Zero};

use crate::error::{CoreError, CoreResult};

/// Largest supported bit-vector width
pub const MAX_BV_WIDTH: u32 = u32::MAX >> 5;

/// Reduce `value` modulo 2^width
#[must_use]
pub fn normalize(value: BigUint, width: u32) -> BigUint {
    let mask = (BigUint::one() << width) - BigUint::one();
    value & mask
}

/// Reduce a 64-bit value modulo 2^width (width in 1..=64)
#[inline]
#[must_use]
pub fn normalize64(value: u64, width: u32) -> u64 {
    debug_assert!(1 <= width && width <= 64);
    if width == 64 {
        value
    } else {
        value & ((1u64 << width) - 1)
    }
}

/// A bit-vector constant: width plus value, normalized mod 2^width
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BvConstant {
    width: u32,
    value: BigUint,
}

impl BvConstant {
    /// Create a constant, reducing `value` modulo 2^width
    ///
    /// # Errors
    ///
    /// Fails if `width` is zero or larger than [`MAX_BV_WIDTH`].
    pub fn new(width: u32, value: BigUint) -> CoreResult<Self> {
        if width == 0 || width > MAX_BV_WIDTH {
            return Err(CoreError::InvalidBvWidth(u64::from(width)));
        }
        Ok(BvConstant {
            width,
            value: normalize(value, width),
        })
    }

    /// The all-zero constant of the given width
    #[must_use]
    pub fn zero(width: u32) -> Self {
        debug_assert!(width >= 1);
        BvConstant {
            width,
            value: BigUint::zero(),
        }
    }

    /// Parse from binary digits, most significant first
    ///
    /// The width is the digit count. Returns `None` on a non-binary
    /// character or an empty string.
    #[must_use]
    pub fn from_binary(digits: &str) -> Option<Self> {
        if digits.is_empty() || digits.len() > MAX_BV_WIDTH as usize {
            return None;
        }
        let value = BigUint::parse_bytes(digits.as_bytes(), 2)?;
        Some(BvConstant {
            width: digits.len() as u32,
            value,
        })
    }

    /// Parse from hexadecimal digits, most significant first
    ///
    /// The width is four times the digit count.
    #[must_use]
    pub fn from_hex(digits: &str) -> Option<Self> {
        if digits.is_empty() || digits.len() > (MAX_BV_WIDTH / 4) as usize {
            return None;
        }
        let value = BigUint::parse_bytes(digits.as_bytes(), 16)?;
        Some(BvConstant {
            width: 4 * digits.len() as u32,
            value,
        })
    }

    /// Width in bits
    #[inline]
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// The value as an unsigned integer
    #[inline]
    #[must_use]
    pub fn value(&self) -> &BigUint {
        &self.value
    }

    /// Consume and return the unsigned value
    #[must_use]
    pub fn into_value(self) -> BigUint {
        self.value
    }

    /// The value reinterpreted as a two's-complement signed integer
    #[must_use]
    pub fn signed_value(&self) -> BigInt {
        if self.bit(self.width - 1) {
            BigInt::from(self.value.clone()) - (BigInt::one() << self.width)
        } else {
            BigInt::from(self.value.clone())
        }
    }

    /// Bit `i` (0 = least significant)
    #[must_use]
    pub fn bit(&self, i: u32) -> bool {
        debug_assert!(i < self.width);
        self.value.bit(u64::from(i))
    }

    fn reduced(&self, value: BigUint) -> Self {
        BvConstant {
            width: self.width,
            value: normalize(value, self.width),
        }
    }

    /// Wrapping addition
    #[must_use]
    pub fn add(&self, other: &Self) -> Self {
        debug_assert_eq!(self.width, other.width);
        self.reduced(&self.value + &other.value)
    }

    /// Wrapping subtraction
    #[must_use]
    pub fn sub(&self, other: &Self) -> Self {
        debug_assert_eq!(self.width, other.width);
        let modulus = BigUint::one() << self.width;
        self.reduced(&self.value + modulus - &other.value)
    }

    /// Wrapping multiplication
    #[must_use]
    pub fn mul(&self, other: &Self) -> Self {
        debug_assert_eq!(self.width, other.width);
        self.reduced(&self.value * &other.value)
    }

    /// Two's-complement negation
    #[must_use]
    pub fn neg(&self) -> Self {
        if self.value.is_zero() {
            self.clone()
        } else {
            let modulus = BigUint::one() << self.width;
            self.reduced(modulus - &self.value)
        }
    }

    /// Wrapping exponentiation
    #[must_use]
    pub fn pow(&self, exponent: u32) -> Self {
        let modulus = BigUint::one() << self.width;
        self.reduced(self.value.modpow(&BigUint::from(exponent), &modulus))
    }

    /// Bitwise complement
    #[must_use]
    pub fn not(&self) -> Self {
        let mask = (BigUint::one() << self.width) - BigUint::one();
        self.reduced(mask ^ &self.value)
    }

    /// Bitwise and
    #[must_use]
    pub fn and(&self, other: &Self) -> Self {
        debug_assert_eq!(self.width, other.width);
        self.reduced(&self.value & &other.value)
    }

    /// Bitwise or
    #[must_use]
    pub fn or(&self, other: &Self) -> Self {
        debug_assert_eq!(self.width, other.width);
        self.reduced(&self.value | &other.value)
    }

    /// Bitwise xor
    #[must_use]
    pub fn xor(&self, other: &Self) -> Self {
        debug_assert_eq!(self.width, other.width);
        self.reduced(&self.value ^ &other.value)
    }

    /// Shift left by `k`, filling with zeros; saturates at the width
    #[must_use]
    pub fn shl(&self, k: u32) -> Self {
        if k >= self.width {
            BvConstant::zero(self.width)
        } else {
            self.reduced(&self.value << k)
        }
    }

    /// Logical shift right by `k`; saturates at the width
    #[must_use]
    pub fn lshr(&self, k: u32) -> Self {
        if k >= self.width {
            BvConstant::zero(self.width)
        } else {
            self.reduced(&self.value >> k)
        }
    }

    /// Arithmetic shift right by `k`; fills with the sign bit
    #[must_use]
    pub fn ashr(&self, k: u32) -> Self {
        let sign = self.bit(self.width - 1);
        let k = k.min(self.width);
        let mut v = &self.value >> k;
        if sign {
            let fill =
                ((BigUint::one() << k) - BigUint::one()) << (self.width - k);
            v |= fill;
        }
        self.reduced(v)
    }

    /// Unsigned quotient; `None` when `other` is zero
    #[must_use]
    pub fn udiv(&self, other: &Self) -> Option<Self> {
        debug_assert_eq!(self.width, other.width);
        if other.value.is_zero() {
            None
        } else {
            Some(self.reduced(&self.value / &other.value))
        }
    }

    /// Unsigned remainder; `None` when `other` is zero
    #[must_use]
    pub fn urem(&self, other: &Self) -> Option<Self> {
        debug_assert_eq!(self.width, other.width);
        if other.value.is_zero() {
            None
        } else {
            Some(self.reduced(&self.value % &other.value))
        }
    }

    /// Unsigned comparison
    #[must_use]
    pub fn ucmp(&self, other: &Self) -> std::cmp::Ordering {
        debug_assert_eq!(self.width, other.width);
        self.value.cmp(&other.value)
    }

    /// Two's-complement signed comparison
    #[must_use]
    pub fn scmp(&self, other: &Self) -> std::cmp::Ordering {
        debug_assert_eq!(self.width, other.width);
        self.signed_value().cmp(&other.signed_value())
    }
}
