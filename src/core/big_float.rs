use std::cmp::Ordering;
use std::ops::{Add, Div, Mul, Neg, Sub};

use num::bigint::Sign;
use num::{BigInt, BigUint, Integer, One, ToPrimitive, Zero};

use super::scalar::Scalar;

/**
 * Binary floating point number with a configurable significand width.
 *
 * The value is `mantissa * 2^exponent`, where `mantissa` never holds more than
 * `precision_bits` significant bits. Every arithmetic result is rounded to nearest,
 * ties to even, at the larger precision of its two operands. With 53 bits this
 * reproduces IEEE-754 double arithmetic exactly (inside the normal range), which is
 * what lets a high precision render be checked against an `f64` render.
 *
 * The exponent is unbounded in practice, so deep zooms never underflow.
 */
#[derive(Clone, Debug)]
pub struct BigFloat {
    mantissa: BigInt,
    exponent: i64,
    precision_bits: u32,
}

impl BigFloat {
    pub fn zero(precision_bits: u32) -> BigFloat {
        assert!(precision_bits > 0, "BigFloat precision must be positive");
        BigFloat {
            mantissa: BigInt::zero(),
            exponent: 0,
            precision_bits,
        }
    }

    pub fn precision_bits(&self) -> u32 {
        self.precision_bits
    }

    pub fn is_zero(&self) -> bool {
        self.mantissa.is_zero()
    }

    /// One past the position of the most significant bit: |value| is on [2^(top-1), 2^top).
    fn top(&self) -> i64 {
        self.exponent + self.mantissa.bits() as i64
    }

    /**
     * Round `mantissa * 2^exponent` to `precision_bits` significant bits, ties to even.
     */
    fn round(mantissa: BigInt, exponent: i64, precision_bits: u32) -> BigFloat {
        assert!(precision_bits > 0, "BigFloat precision must be positive");
        if mantissa.is_zero() {
            return BigFloat::zero(precision_bits);
        }
        let limit = u64::from(precision_bits);
        let length = mantissa.bits();
        if length <= limit {
            return BigFloat {
                mantissa,
                exponent,
                precision_bits,
            };
        }

        let shift = (length - limit) as usize;
        let (sign, magnitude) = mantissa.into_parts();
        let mut kept = &magnitude >> shift;
        let dropped = magnitude - (&kept << shift);
        let half = BigUint::one() << (shift - 1);
        let round_up = match dropped.cmp(&half) {
            Ordering::Greater => true,
            Ordering::Equal => kept.is_odd(),
            Ordering::Less => false,
        };

        let mut exponent = exponent + shift as i64;
        if round_up {
            kept += 1u32;
            // Carry out of the top bit: the significand is now exactly 2^limit.
            if kept.bits() > limit {
                kept >>= 1usize;
                exponent += 1;
            }
        }
        BigFloat {
            mantissa: BigInt::from_biguint(sign, kept),
            exponent,
            precision_bits,
        }
    }

    fn compare(&self, other: &BigFloat) -> Ordering {
        let sign_order = self.mantissa.sign().cmp(&other.mantissa.sign());
        if sign_order != Ordering::Equal || self.is_zero() {
            return sign_order;
        }
        let magnitude_order = match self.top().cmp(&other.top()) {
            Ordering::Equal => {
                let exponent = self.exponent.min(other.exponent);
                let lhs = self.mantissa.magnitude() << (self.exponent - exponent) as usize;
                let rhs = other.mantissa.magnitude() << (other.exponent - exponent) as usize;
                lhs.cmp(&rhs)
            }
            order => order,
        };
        if self.mantissa.sign() == Sign::Minus {
            magnitude_order.reverse()
        } else {
            magnitude_order
        }
    }
}

impl Scalar for BigFloat {
    type Precision = u32;

    fn from_u32(value: u32, precision_bits: u32) -> BigFloat {
        BigFloat::round(BigInt::from(value), 0, precision_bits)
    }

    fn from_f64(value: f64, precision_bits: u32) -> BigFloat {
        assert!(value.is_finite(), "BigFloat cannot represent {}", value);
        let (mantissa, exponent, sign) = num_traits::Float::integer_decode(value);
        let mantissa = if sign < 0 {
            -BigInt::from(mantissa)
        } else {
            BigInt::from(mantissa)
        };
        BigFloat::round(mantissa, i64::from(exponent), precision_bits)
    }

    fn with_precision(&self, precision_bits: u32) -> BigFloat {
        BigFloat::round(self.mantissa.clone(), self.exponent, precision_bits)
    }

    fn to_f64(&self) -> f64 {
        if self.is_zero() {
            return 0.0;
        }
        // Keep the leading 64 bits; f64 conversion rounds them again.
        let drop = self.mantissa.bits().saturating_sub(64) as usize;
        let leading = (self.mantissa.magnitude() >> drop)
            .to_f64()
            .unwrap_or(f64::INFINITY);
        let magnitude = scale_by_power_of_two(leading, self.exponent + drop as i64);
        if self.mantissa.sign() == Sign::Minus {
            -magnitude
        } else {
            magnitude
        }
    }
}

/// `value * 2^exponent`, stepping so no intermediate power of two overflows.
fn scale_by_power_of_two(mut value: f64, mut exponent: i64) -> f64 {
    const STEP: i64 = 1000;
    while exponent > STEP && value.is_finite() {
        value *= 2f64.powi(STEP as i32);
        exponent -= STEP;
    }
    while exponent < -STEP && value != 0.0 {
        value *= 2f64.powi(-STEP as i32);
        exponent += STEP;
    }
    value * 2f64.powi(exponent as i32)
}

impl PartialEq for BigFloat {
    fn eq(&self, other: &BigFloat) -> bool {
        self.compare(other) == Ordering::Equal
    }
}

impl PartialOrd for BigFloat {
    fn partial_cmp(&self, other: &BigFloat) -> Option<Ordering> {
        Some(self.compare(other))
    }
}

impl Neg for BigFloat {
    type Output = BigFloat;

    fn neg(self) -> BigFloat {
        BigFloat {
            mantissa: -self.mantissa,
            exponent: self.exponent,
            precision_bits: self.precision_bits,
        }
    }
}

impl Add for BigFloat {
    type Output = BigFloat;

    fn add(self, other: BigFloat) -> BigFloat {
        let precision_bits = self.precision_bits.max(other.precision_bits);
        if self.is_zero() {
            return other.with_precision(precision_bits);
        }
        if other.is_zero() {
            return self.with_precision(precision_bits);
        }

        // An operand below a quarter ulp of the other cannot change the rounded sum.
        let gap = i64::from(precision_bits) + 2;
        if other.top() <= self.top() - gap {
            return self.with_precision(precision_bits);
        }
        if self.top() <= other.top() - gap {
            return other.with_precision(precision_bits);
        }

        let exponent = self.exponent.min(other.exponent);
        let sum = (self.mantissa << (self.exponent - exponent) as usize)
            + (other.mantissa << (other.exponent - exponent) as usize);
        BigFloat::round(sum, exponent, precision_bits)
    }
}

impl Sub for BigFloat {
    type Output = BigFloat;

    fn sub(self, other: BigFloat) -> BigFloat {
        self + (-other)
    }
}

impl Mul for BigFloat {
    type Output = BigFloat;

    fn mul(self, other: BigFloat) -> BigFloat {
        let precision_bits = self.precision_bits.max(other.precision_bits);
        BigFloat::round(
            self.mantissa * other.mantissa,
            self.exponent + other.exponent,
            precision_bits,
        )
    }
}

impl Div for BigFloat {
    type Output = BigFloat;

    fn div(self, other: BigFloat) -> BigFloat {
        assert!(!other.is_zero(), "BigFloat division by zero");
        let precision_bits = self.precision_bits.max(other.precision_bits);
        if self.is_zero() {
            return BigFloat::zero(precision_bits);
        }

        let sign = self.mantissa.sign() * other.mantissa.sign();
        let (_, numerator) = self.mantissa.into_parts();
        let (_, denominator) = other.mantissa.into_parts();

        // Two guard bits beyond the target width, plus a sticky bit for any remainder.
        let shift = (u64::from(precision_bits) + 2 + denominator.bits())
            .saturating_sub(numerator.bits()) as usize;
        let (quotient, remainder) = (numerator << shift).div_rem(&denominator);
        let mut exponent = self.exponent - other.exponent - shift as i64;
        let quotient = if remainder.is_zero() {
            quotient
        } else {
            exponent -= 1;
            (quotient << 1usize) + 1u32
        };
        BigFloat::round(BigInt::from_biguint(sign, quotient), exponent, precision_bits)
    }
}

impl std::fmt::Display for BigFloat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:e}", self.to_f64())
    }
}
