use serde::{Deserialize, Serialize};

use crate::core::scalar::Scalar;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EscapeResult {
    /// Iteration index (on `[0, max_iter_count)`) at which the orbit left the cutoff radius.
    Escaped(u32),
    InSet,
}

/**
 * Iteration limits shared by every pixel of a render.
 */
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RenderConfig {
    pub max_iter_count: u32,
    /// Squared magnitude beyond which an orbit is considered escaped.
    pub escape_radius_squared: f64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        RenderConfig {
            max_iter_count: 500,
            escape_radius_squared: 5.0,
        }
    }
}

impl RenderConfig {
    pub fn is_valid(&self) -> bool {
        self.max_iter_count > 0
            && self.escape_radius_squared.is_finite()
            && self.escape_radius_squared > 0.0
    }
}

/**
 * Data structure for storing the internal state of the mandelbrot sequence calculation.
 * The squares of both components are cached between steps, which saves a
 * multiplication per iteration without changing any intermediate value.
 */
pub struct MandelbrotSequence<T: Scalar> {
    pub real_0: T,
    pub imag_0: T,
    pub real: T,
    pub imag: T,
    pub real_sqr: T,
    pub imag_sqr: T,
}

impl<T: Scalar> MandelbrotSequence<T> {
    pub fn new(real_0: T, imag_0: T) -> MandelbrotSequence<T> {
        MandelbrotSequence {
            real_sqr: real_0.clone() * real_0.clone(),
            imag_sqr: imag_0.clone() * imag_0.clone(),
            real: real_0.clone(),
            imag: imag_0.clone(),
            real_0,
            imag_0,
        }
    }

    pub fn radius_squared(&self) -> T {
        self.real_sqr.clone() + self.imag_sqr.clone()
    }

    // Z = Z*Z + C
    pub fn step(&mut self) {
        let new_real = (self.real_sqr.clone() - self.imag_sqr.clone()) + self.real_0.clone();
        let product = self.real.clone() * self.imag.clone();
        self.imag = (product.clone() + product) + self.imag_0.clone();
        self.real = new_real;
        self.real_sqr = self.real.clone() * self.real.clone();
        self.imag_sqr = self.imag.clone() * self.imag.clone();
    }

    /// Runs the bounded iteration; the cutoff must already be expressed in `T`.
    pub fn escape(mut self, escape_radius_squared: &T, max_iter_count: u32) -> EscapeResult {
        for iteration in 0..max_iter_count {
            self.step();
            if self.radius_squared() > *escape_radius_squared {
                return EscapeResult::Escaped(iteration);
            }
        }
        EscapeResult::InSet
    }
}

/// Classify the point `real_0 + i * imag_0`.
pub fn evaluate<T: Scalar>(
    real_0: T,
    imag_0: T,
    escape_radius_squared: &T,
    max_iter_count: u32,
) -> EscapeResult {
    MandelbrotSequence::new(real_0, imag_0).escape(escape_radius_squared, max_iter_count)
}

/// Convenience wrapper that converts the cutoff from the render config.
pub fn evaluate_with_config<T: Scalar>(
    real_0: T,
    imag_0: T,
    config: &RenderConfig,
    precision: T::Precision,
) -> EscapeResult {
    let cutoff = T::from_f64(config.escape_radius_squared, precision);
    evaluate(real_0, imag_0, &cutoff, config.max_iter_count)
}
