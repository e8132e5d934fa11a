use std::fmt::Debug;
use std::ops::{Add, Div, Mul, Sub};

use serde::{Deserialize, Serialize};

/**
 * Arithmetic used by the viewport mapping and the escape-time iteration. The same
 * algorithm is instantiated once for machine floats and once for `BigFloat`, so
 * everything here is expressed in terms of the operations both can provide.
 *
 * The `Precision` context carries whatever a backend needs in order to create new
 * values (nothing for `f64`, the significand bit count for `BigFloat`).
 */
pub trait Scalar:
    Clone
    + Debug
    + Send
    + Sync
    + PartialOrd
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
{
    type Precision: Copy + Debug + Send + Sync;

    fn from_u32(value: u32, precision: Self::Precision) -> Self;

    fn from_f64(value: f64, precision: Self::Precision) -> Self;

    /// Re-express this value at another precision (used when rescaling bounds).
    fn with_precision(&self, precision: Self::Precision) -> Self;

    /// Lossy conversion, only used for display and logging.
    fn to_f64(&self) -> f64;
}

impl Scalar for f64 {
    type Precision = ();

    fn from_u32(value: u32, _: ()) -> f64 {
        value as f64
    }

    fn from_f64(value: f64, _: ()) -> f64 {
        value
    }

    fn with_precision(&self, _: ()) -> f64 {
        *self
    }

    fn to_f64(&self) -> f64 {
        *self
    }
}

/**
 * Runtime selection of the arithmetic backend for a render.
 */
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precision {
    FixedWidth,
    ArbitraryPrecision { bits: u32 },
}

impl Default for Precision {
    fn default() -> Self {
        Precision::FixedWidth
    }
}

impl std::fmt::Display for Precision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Precision::FixedWidth => write!(f, "fixed-width (f64)"),
            Precision::ArbitraryPrecision { bits } => write!(f, "arbitrary precision ({} bits)", bits),
        }
    }
}
