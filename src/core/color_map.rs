use image::Rgb;

use crate::fractals::escape_time::EscapeResult;

pub const IN_SET_COLOR: Rgb<u8> = Rgb([0, 0, 0]);

/**
 * Hue in degrees on [0, 360), saturation and value on [0, 1].
 */
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hsv {
    pub hue: f64,
    pub saturation: f64,
    pub value: f64,
}

/**
 * Standard sector-based HSV to RGB conversion: the hue circle is split into six
 * sectors of 60 degrees, each of which holds one channel at `value`, one at the
 * minimum `p`, and one ramping through `q` or `t`. Channels are on [0, 1].
 */
pub fn hsv_to_rgb(color: &Hsv) -> [f64; 3] {
    let value = color.value;
    if color.saturation <= 0.0 {
        return [value, value, value];
    }
    let mut sector_position = color.hue;
    if sector_position >= 360.0 {
        sector_position = 0.0;
    }
    sector_position /= 60.0;
    let sector = sector_position.floor();
    let fraction = sector_position - sector;

    let p = value * (1.0 - color.saturation);
    let q = value * (1.0 - color.saturation * fraction);
    let t = value * (1.0 - color.saturation * (1.0 - fraction));

    match sector as u32 {
        0 => [value, t, p],
        1 => [q, value, p],
        2 => [p, value, t],
        3 => [p, q, value],
        4 => [t, p, value],
        _ => [value, p, q],
    }
}

fn to_pixel(rgb: [f64; 3]) -> Rgb<u8> {
    let channel = |x: f64| (255.0 * x).round().clamp(0.0, 255.0) as u8;
    Rgb([channel(rgb[0]), channel(rgb[1]), channel(rgb[2])])
}

/**
 * Gradient used for points that escape: blue (hue 240) for points that escape right
 * away, darkening toward red as the escape iteration approaches the cap.
 */
pub fn escape_hsv(iteration: u32, max_iter_count: u32) -> Hsv {
    let fraction = f64::from(iteration) / f64::from(max_iter_count);
    Hsv {
        hue: 240.0 - 240.0 * fraction,
        saturation: 1.0,
        value: 1.0 - fraction,
    }
}

pub fn escape_color(result: EscapeResult, max_iter_count: u32) -> Rgb<u8> {
    match result {
        EscapeResult::InSet => IN_SET_COLOR,
        EscapeResult::Escaped(iteration) => to_pixel(hsv_to_rgb(&escape_hsv(iteration, max_iter_count))),
    }
}

pub trait ColorMapper {
    fn compute_pixel(&self, result: EscapeResult) -> Rgb<u8>;
}

/// Evaluates the HSV gradient on every query.
#[derive(Debug, Clone, Copy)]
pub struct HsvEscapeColorMap {
    pub max_iter_count: u32,
}

impl ColorMapper for HsvEscapeColorMap {
    fn compute_pixel(&self, result: EscapeResult) -> Rgb<u8> {
        escape_color(result, self.max_iter_count)
    }
}

/**
 * Wrapper around a color map that precomputes one color per escape iteration.
 * The escape result is discrete, so the table is exact rather than interpolated.
 */
#[derive(Debug, Clone)]
pub struct ColorMapLookUpTable {
    table: Vec<Rgb<u8>>,
    in_set_color: Rgb<u8>,
}

impl ColorMapLookUpTable {
    pub fn from_color_map<F: ColorMapper>(color_map: &F, max_iter_count: u32) -> ColorMapLookUpTable {
        ColorMapLookUpTable {
            table: (0..max_iter_count)
                .map(|iteration| color_map.compute_pixel(EscapeResult::Escaped(iteration)))
                .collect(),
            in_set_color: color_map.compute_pixel(EscapeResult::InSet),
        }
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

impl ColorMapper for ColorMapLookUpTable {
    fn compute_pixel(&self, result: EscapeResult) -> Rgb<u8> {
        match result {
            EscapeResult::InSet => self.in_set_color,
            EscapeResult::Escaped(iteration) => self.table[iteration as usize],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_in_set_is_black() {
        assert_eq!(escape_color(EscapeResult::InSet, 500), Rgb([0, 0, 0]));
    }

    #[test]
    fn test_primary_sectors() {
        let full = |hue: f64| {
            to_pixel(hsv_to_rgb(&Hsv {
                hue,
                saturation: 1.0,
                value: 1.0,
            }))
        };
        assert_eq!(full(0.0), Rgb([255, 0, 0]));
        assert_eq!(full(60.0), Rgb([255, 255, 0]));
        assert_eq!(full(120.0), Rgb([0, 255, 0]));
        assert_eq!(full(180.0), Rgb([0, 255, 255]));
        assert_eq!(full(240.0), Rgb([0, 0, 255]));
        assert_eq!(full(300.0), Rgb([255, 0, 255]));
        assert_eq!(full(360.0), Rgb([255, 0, 0]));
        assert_eq!(full(30.0), Rgb([255, 128, 0]));
    }

    #[test]
    fn test_zero_saturation_is_grey() {
        let rgb = hsv_to_rgb(&Hsv {
            hue: 123.0,
            saturation: 0.0,
            value: 0.25,
        });
        assert_eq!(rgb, [0.25, 0.25, 0.25]);
    }

    #[test]
    fn test_gradient_direction() {
        let first = escape_hsv(0, 500);
        assert_eq!(first.hue, 240.0);
        assert_eq!(first.value, 1.0);
        assert_eq!(escape_color(EscapeResult::Escaped(0), 500), Rgb([0, 0, 255]));

        let last = escape_hsv(499, 500);
        assert_relative_eq!(last.hue, 240.0 / 500.0, epsilon = 1e-9);
        assert_relative_eq!(last.value, 1.0 / 500.0, epsilon = 1e-12);
        // Nearly black, with what is left in the red channel.
        assert_eq!(escape_color(EscapeResult::Escaped(499), 500), Rgb([1, 0, 0]));
    }

    #[test]
    fn test_color_is_deterministic() {
        for iteration in [0, 1, 77, 250, 499].iter() {
            let result = EscapeResult::Escaped(*iteration);
            assert_eq!(escape_color(result, 500), escape_color(result, 500));
        }
    }

    #[test]
    fn test_color_map_lookup_table() {
        let color_map = HsvEscapeColorMap { max_iter_count: 500 };
        let table = ColorMapLookUpTable::from_color_map(&color_map, 500);
        assert_eq!(table.len(), 500);
        assert_eq!(table.compute_pixel(EscapeResult::InSet), IN_SET_COLOR);
        for iteration in 0..500 {
            let result = EscapeResult::Escaped(iteration);
            assert_eq!(table.compute_pixel(result), color_map.compute_pixel(result));
        }
    }
}
