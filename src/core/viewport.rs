use serde::{Deserialize, Serialize};

use super::scalar::Scalar;

/**
 * Rectangular region of the complex plane that is mapped onto the output image.
 * Pixel `(0, 0)` maps to `(real_min, imag_min)`; pixel coordinates grow toward the
 * max bounds, so the image is not flipped relative to the plane.
 */
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PlaneBounds<T> {
    pub real_min: T,
    pub real_max: T,
    pub imag_min: T,
    pub imag_max: T,
}

impl<T: Scalar> PlaneBounds<T> {
    pub fn new(real_min: T, real_max: T, imag_min: T, imag_max: T) -> PlaneBounds<T> {
        let bounds = PlaneBounds {
            real_min,
            real_max,
            imag_min,
            imag_max,
        };
        assert!(bounds.is_valid(), "Invalid plane bounds: {:?}", bounds);
        bounds
    }

    pub fn is_valid(&self) -> bool {
        self.real_max > self.real_min && self.imag_max > self.imag_min
    }

    pub fn real_range(&self) -> T {
        self.real_max.clone() - self.real_min.clone()
    }

    pub fn imag_range(&self) -> T {
        self.imag_max.clone() - self.imag_min.clone()
    }

    pub fn with_precision(&self, precision: T::Precision) -> PlaneBounds<T> {
        PlaneBounds {
            real_min: self.real_min.with_precision(precision),
            real_max: self.real_max.with_precision(precision),
            imag_min: self.imag_min.with_precision(precision),
            imag_max: self.imag_max.with_precision(precision),
        }
    }

    pub fn from_f64_bounds(bounds: &PlaneBounds<f64>, precision: T::Precision) -> PlaneBounds<T> {
        PlaneBounds {
            real_min: T::from_f64(bounds.real_min, precision),
            real_max: T::from_f64(bounds.real_max, precision),
            imag_min: T::from_f64(bounds.imag_min, precision),
            imag_max: T::from_f64(bounds.imag_max, precision),
        }
    }

    pub fn to_f64_bounds(&self) -> PlaneBounds<f64> {
        PlaneBounds {
            real_min: self.real_min.to_f64(),
            real_max: self.real_max.to_f64(),
            imag_min: self.imag_min.to_f64(),
            imag_max: self.imag_max.to_f64(),
        }
    }

    /**
     * Build the per-render pixel mapper: ranges are computed once, then every pixel
     * is mapped with the same arithmetic sequence.
     */
    pub fn pixel_mapper(&self, width: u32, height: u32, precision: T::Precision) -> PixelMapper<T> {
        PixelMapper {
            width: LinearPixelMap::new(width, self.real_min.clone(), self.real_range(), precision),
            height: LinearPixelMap::new(height, self.imag_min.clone(), self.imag_range(), precision),
        }
    }

    /**
     * New bounds covering the pixel rectangle spanned by two (unordered) corners of a
     * drag selection on a `width` x `height` image of these bounds. Returns `None`
     * for a selection with no area.
     */
    pub fn zoom_to_selection(
        &self,
        corner_a: (u32, u32),
        corner_b: (u32, u32),
        width: u32,
        height: u32,
        precision: T::Precision,
    ) -> Option<PlaneBounds<T>> {
        let (x_low, x_span) = (corner_a.0.min(corner_b.0), corner_a.0.max(corner_b.0) - corner_a.0.min(corner_b.0));
        let (y_low, y_span) = (corner_a.1.min(corner_b.1), corner_a.1.max(corner_b.1) - corner_a.1.min(corner_b.1));
        if x_span == 0 || y_span == 0 {
            return None;
        }
        let (real_min, real_max) = rescale_axis(
            &self.real_min,
            self.real_range(),
            width,
            x_low,
            x_span,
            precision,
        );
        let (imag_min, imag_max) = rescale_axis(
            &self.imag_min,
            self.imag_range(),
            height,
            y_low,
            y_span,
            precision,
        );
        let bounds = PlaneBounds {
            real_min,
            real_max,
            imag_min,
            imag_max,
        };
        // At the resolution limit the rescaled bounds can collapse onto each other.
        if bounds.is_valid() {
            Some(bounds)
        } else {
            None
        }
    }
}

fn rescale_axis<T: Scalar>(
    min: &T,
    range: T,
    pixel_count: u32,
    low: u32,
    span: u32,
    precision: T::Precision,
) -> (T, T) {
    let scale = range / T::from_u32(pixel_count, precision);
    let new_min = min.clone() + T::from_u32(low, precision) * scale.clone();
    let new_max = new_min.clone() + T::from_u32(span, precision) * scale;
    (new_min, new_max)
}

/**
 * Maps a pixel index on one axis into the plane: `(index / n) * range + min`.
 * The division happens in the scalar's own arithmetic.
 */
#[derive(Clone, Debug)]
pub struct LinearPixelMap<T: Scalar> {
    pixel_count: T,
    offset: T,
    range: T,
    precision: T::Precision,
}

impl<T: Scalar> LinearPixelMap<T> {
    pub fn new(n: u32, offset: T, range: T, precision: T::Precision) -> LinearPixelMap<T> {
        more_asserts::assert_gt!(n, 0);
        LinearPixelMap {
            pixel_count: T::from_u32(n, precision),
            offset,
            range,
            precision,
        }
    }

    pub fn map(&self, index: u32) -> T {
        (T::from_u32(index, self.precision) / self.pixel_count.clone()) * self.range.clone()
            + self.offset.clone()
    }
}

#[derive(Clone, Debug)]
pub struct PixelMapper<T: Scalar> {
    pub width: LinearPixelMap<T>,
    pub height: LinearPixelMap<T>,
}

impl<T: Scalar> PixelMapper<T> {
    /// Pixel coordinate to plane coordinate: `(real_0, imag_0)`.
    pub fn map(&self, point: &(u32, u32)) -> (T, T) {
        let (x, y) = point;
        (self.width.map(*x), self.height.map(*y))
    }
}

/// Stand-alone form of the pixel-to-plane mapping.
pub fn to_plane<T: Scalar>(
    x: u32,
    y: u32,
    width: u32,
    height: u32,
    bounds: &PlaneBounds<T>,
    precision: T::Precision,
) -> (T, T) {
    bounds.pixel_mapper(width, height, precision).map(&(x, y))
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaneAxis {
    Real,
    Imaginary,
}

/**
 * Two adjacent pixels mapped onto the same plane coordinate: the active precision
 * can no longer resolve the viewport. `pixel_index` is the second of the pair.
 */
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrecisionExhausted {
    pub axis: PlaneAxis,
    pub pixel_index: u32,
}

impl std::fmt::Display for PrecisionExhausted {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "adjacent pixels {} and {} share the same {:?} coordinate",
            self.pixel_index - 1,
            self.pixel_index,
            self.axis
        )
    }
}

fn first_repeated_sample<T: Scalar>(map: &LinearPixelMap<T>, n: u32) -> Option<u32> {
    let mut previous = map.map(0);
    for index in 1..n {
        let current = map.map(index);
        if current == previous {
            return Some(index);
        }
        previous = current;
    }
    None
}

/**
 * Best-effort check for precision exhaustion. Every row shares the same sequence of
 * `real_0` values (and every column the same `imag_0` values), so a single pass per
 * axis covers the whole image. A `None` result is not a guarantee that the render is
 * free of round-off artifacts.
 */
pub fn find_precision_exhaustion<T: Scalar>(
    bounds: &PlaneBounds<T>,
    width: u32,
    height: u32,
    precision: T::Precision,
) -> Option<PrecisionExhausted> {
    let mapper = bounds.pixel_mapper(width, height, precision);
    if let Some(pixel_index) = first_repeated_sample(&mapper.width, width) {
        return Some(PrecisionExhausted {
            axis: PlaneAxis::Real,
            pixel_index,
        });
    }
    first_repeated_sample(&mapper.height, height).map(|pixel_index| PrecisionExhausted {
        axis: PlaneAxis::Imaginary,
        pixel_index,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::big_float::BigFloat;
    use approx::assert_relative_eq;

    fn default_bounds() -> PlaneBounds<f64> {
        PlaneBounds::new(-1.5, 0.5, -1.0, 1.0)
    }

    #[test]
    fn test_to_plane_corners_and_center() {
        let bounds = default_bounds();
        assert_eq!(to_plane(0, 0, 840, 840, &bounds, ()), (-1.5, -1.0));
        assert_eq!(to_plane(420, 420, 840, 840, &bounds, ()), (-0.5, 0.0));
        let (real, imag) = to_plane(839, 839, 840, 840, &bounds, ());
        assert_relative_eq!(real, 0.5 - 2.0 / 840.0, epsilon = 1e-12);
        assert_relative_eq!(imag, 1.0 - 2.0 / 840.0, epsilon = 1e-12);
    }

    #[test]
    fn test_to_plane_matches_formula_in_big_float() {
        let bounds = PlaneBounds::<BigFloat>::from_f64_bounds(&default_bounds(), 53);
        for x in [0u32, 1, 17, 333, 839].iter() {
            let (real, _) = to_plane(*x, 0, 840, 840, &bounds, 53);
            let expected = (*x as f64 / 840.0) * 2.0 + -1.5;
            assert_eq!(real.to_f64(), expected);
        }
    }

    #[test]
    #[should_panic(expected = "Invalid plane bounds")]
    fn test_inverted_bounds_panic() {
        PlaneBounds::new(0.5, -1.5, -1.0, 1.0);
    }

    #[test]
    fn test_zoom_to_selection() {
        let bounds = default_bounds();
        // Drag from bottom-right to top-left: corner order does not matter.
        let zoomed = bounds
            .zoom_to_selection((630, 420), (210, 210), 840, 840, ())
            .unwrap();
        assert_relative_eq!(zoomed.real_min, -1.0, epsilon = 1e-12);
        assert_relative_eq!(zoomed.real_max, 0.0, epsilon = 1e-12);
        assert_relative_eq!(zoomed.imag_min, -0.5, epsilon = 1e-12);
        assert_relative_eq!(zoomed.imag_max, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_zoom_to_selection_without_area() {
        let bounds = default_bounds();
        assert!(bounds.zoom_to_selection((10, 10), (10, 50), 840, 840, ()).is_none());
        assert!(bounds.zoom_to_selection((10, 10), (50, 10), 840, 840, ()).is_none());
    }

    #[test]
    fn test_zoom_to_selection_at_resolution_limit() {
        let bounds = PlaneBounds::new(0.3, 0.3 + 4.0 * f64::EPSILON, 0.0, 1.0);
        assert!(bounds.zoom_to_selection((1, 0), (2, 100), 840, 840, ()).is_none());
    }

    #[test]
    fn test_no_precision_exhaustion_at_default_zoom() {
        assert_eq!(find_precision_exhaustion(&default_bounds(), 840, 840, ()), None);
    }

    #[test]
    fn test_precision_exhaustion_detected_for_f64() {
        let bounds = PlaneBounds::new(0.3, 0.3 + 2.0 * f64::EPSILON, -1.0, 1.0);
        let warning = find_precision_exhaustion(&bounds, 64, 64, ()).unwrap();
        assert_eq!(warning.axis, PlaneAxis::Real);
        assert!(warning.pixel_index > 0 && warning.pixel_index < 64);
    }

    #[test]
    fn test_precision_exhaustion_detected_on_imaginary_axis() {
        let bounds = PlaneBounds::new(-1.0, 1.0, 0.3, 0.3 + 2.0 * f64::EPSILON);
        let warning = find_precision_exhaustion(&bounds, 64, 64, ()).unwrap();
        assert_eq!(warning.axis, PlaneAxis::Imaginary);
    }

    #[test]
    fn test_extra_bits_resolve_the_same_viewport() {
        let bits = 128;
        let real_min = BigFloat::from_f64(0.3, bits);
        let real_max = real_min.clone() + BigFloat::from_f64(2.0 * f64::EPSILON, bits);
        let bounds = PlaneBounds::new(
            real_min,
            real_max,
            BigFloat::from_f64(-1.0, bits),
            BigFloat::from_f64(1.0, bits),
        );
        assert_eq!(find_precision_exhaustion(&bounds, 64, 64, bits), None);
    }
}
