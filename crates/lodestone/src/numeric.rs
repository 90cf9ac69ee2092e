//! The unified numeric stack: arbitrary-precision [`Integer`] plus fixed-width
//! primitive integers and floats.
//!
//! `Integer` treats its magnitude kernel as an external collaborator per the
//! core's scope (spec: "the `LargeInteger` bignum arithmetic kernel... its
//! contract is used; its implementation is not specified here") — we depend
//! on `num_bigint::BigInt` for that kernel rather than hand-rolling a limb
//! vector, exposing only the contract: sign-first-then-magnitude ordering,
//! truncating division, and width-truncating conversions.

use std::{cmp::Ordering, fmt};

use num_bigint::BigInt;
use num_integer::Integer as _;
use num_traits::{Signed, ToPrimitive, Zero};

/// An arbitrary-precision integer. Comparison is sign-first then magnitude
/// (delegated to `BigInt`'s own total order, which already does this).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Integer(pub BigInt);

/// Division by a zero divisor. Carried as a distinguished failure rather than
/// folded into a generic arithmetic error so callers can attach the call
/// site's `SourcePosition` without losing the distinction spec.md §4.5/§7
/// asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DivisionByZero;

impl Integer {
    pub fn from_i64(value: i64) -> Self {
        Self(BigInt::from(value))
    }

    pub fn zero() -> Self {
        Self(BigInt::zero())
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn sign(&self) -> i32 {
        if self.0.is_zero() {
            0
        } else if self.0.is_negative() {
            -1
        } else {
            1
        }
    }

    /// Parses a decimal literal, or `NNNrDDDD...` radix literal (radix digits
    /// A-Z/a-z map to 10..35, case-insensitively), exactly as the scanner's
    /// `Nat` token shape allows. Never fails on a well-formed `Nat` token.
    pub fn parse_literal(text: &str) -> Option<Self> {
        if let Some(r_index) = text.find(|c| c == 'r' || c == 'R') {
            let (radix_part, digits_part) = (&text[..r_index], &text[r_index + 1..]);
            let radix: u32 = radix_part.parse().ok()?;
            if !(2..=36).contains(&radix) || digits_part.is_empty() {
                return None;
            }
            let mut acc = BigInt::zero();
            let base = BigInt::from(radix);
            for c in digits_part.chars() {
                let digit = c.to_digit(36)?;
                if digit >= radix {
                    return None;
                }
                acc = acc * &base + BigInt::from(digit);
            }
            Some(Self(acc))
        } else {
            text.parse::<BigInt>().ok().map(Self)
        }
    }

    pub fn add(&self, other: &Self) -> Self {
        Self(&self.0 + &other.0)
    }

    pub fn sub(&self, other: &Self) -> Self {
        Self(&self.0 - &other.0)
    }

    pub fn mul(&self, other: &Self) -> Self {
        Self(&self.0 * &other.0)
    }

    pub fn negated(&self) -> Self {
        Self(-&self.0)
    }

    /// `divisionAndRemainder`: truncating division (rounds toward zero), with
    /// `sign(remainder) == sign(self)` when the remainder is nonzero — i.e.
    /// Rust's native `/`/`%` on `BigInt`, not Euclidean `div_rem_floor`.
    pub fn division_and_remainder(&self, divisor: &Self) -> Result<(Self, Self), DivisionByZero> {
        if divisor.is_zero() {
            return Err(DivisionByZero);
        }
        let (q, r) = self.0.div_rem(&divisor.0);
        Ok((Self(q), Self(r)))
    }

    pub fn to_f64(&self) -> f64 {
        self.0.to_f64().unwrap_or(f64::NAN)
    }

    /// Truncating `f64 -> Integer`. `BigInt` has no native `f64` conversion,
    /// so values that fit an `i64` go through that; larger magnitudes go
    /// through a formatted decimal round trip.
    pub fn from_f64_truncated(value: f64) -> Option<Self> {
        if !value.is_finite() {
            return None;
        }
        let truncated = value.trunc();
        if truncated.abs() < 9.0e18 {
            return Some(Self(BigInt::from(truncated as i64)));
        }
        format!("{truncated:.0}").parse::<BigInt>().ok().map(Self)
    }

    /// Truncates to a signed/unsigned fixed width modulo 2^bits, per spec.md
    /// §3: "Conversions to primitive widths truncate modulo 2ⁿ with sign
    /// applied."
    pub fn truncate_to_width(&self, bits: u32, signed: bool) -> i128 {
        debug_assert!(bits > 0 && bits <= 128);
        let modulus = BigInt::from(1u8) << bits;
        let mut reduced = &self.0 % &modulus;
        if reduced.is_negative() {
            reduced += &modulus;
        }
        // `reduced` is now in [0, 2^bits).
        let unsigned = reduced.to_u128().unwrap_or(0);
        if !signed {
            return unsigned as i128;
        }
        let half = 1u128 << (bits - 1);
        if bits == 128 {
            unsigned as i128
        } else if unsigned >= half {
            (unsigned as i128) - (1i128 << bits)
        } else {
            unsigned as i128
        }
    }

    pub fn from_primitive(value: i128) -> Self {
        Self(BigInt::from(value))
    }
}

impl fmt::Display for Integer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl PartialEq<i64> for Integer {
    fn eq(&self, other: &i64) -> bool {
        self.0 == BigInt::from(*other)
    }
}

impl PartialOrd<i64> for Integer {
    fn partial_cmp(&self, other: &i64) -> Option<Ordering> {
        self.0.partial_cmp(&BigInt::from(*other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn division_rounds_toward_zero_and_remainder_follows_dividend_sign() {
        for (a, b) in [(7, 2), (-7, 2), (7, -2), (-7, -2)] {
            let (q, r) = Integer::from_i64(a).division_and_remainder(&Integer::from_i64(b)).unwrap();
            assert_eq!(q.mul(&Integer::from_i64(b)).add(&r), Integer::from_i64(a));
            if !r.is_zero() {
                assert_eq!(r.sign(), a.signum() as i32);
            }
        }
    }

    #[test]
    fn division_by_zero_is_distinguished() {
        assert!(Integer::from_i64(1).division_and_remainder(&Integer::zero()).is_err());
    }

    #[test]
    fn radix_literal_parses_case_insensitively() {
        assert_eq!(Integer::parse_literal("16rFF"), Some(Integer::from_i64(255)));
        assert_eq!(Integer::parse_literal("16rff"), Some(Integer::from_i64(255)));
        assert_eq!(Integer::parse_literal("2r1010"), Some(Integer::from_i64(10)));
    }

    #[test]
    fn truncation_wraps_modulo_2_to_the_n_with_sign() {
        assert_eq!(Integer::from_i64(256).truncate_to_width(8, false), 0);
        assert_eq!(Integer::from_i64(255).truncate_to_width(8, true), -1);
        assert_eq!(Integer::from_i64(-1).truncate_to_width(8, false), 255);
    }
}
