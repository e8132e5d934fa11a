use image::{Rgb, RgbImage};

pub const SELECTION_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
pub const SELECTION_THICKNESS: u32 = 2;

/**
 * Copy an RGB image into an RGBA frame buffer of the same resolution (as used by the
 * `pixels` crate), with an opaque alpha channel.
 */
pub fn copy_image_to_rgba_frame(image: &RgbImage, frame: &mut [u8]) {
    debug_assert_eq!(
        frame.len(),
        4 * (image.width() as usize) * (image.height() as usize)
    );
    for (pixel, target) in image.pixels().zip(frame.chunks_exact_mut(4)) {
        target.copy_from_slice(&[pixel[0], pixel[1], pixel[2], 255]);
    }
}

/**
 * Draw the outline of the axis-aligned rectangle spanned by two (unordered) corners
 * into an RGBA frame of width `frame_width`. The outline is drawn inward from the
 * rectangle edges and clipped to the frame.
 */
pub fn draw_selection_rectangle(
    frame: &mut [u8],
    frame_width: u32,
    corner_a: (u32, u32),
    corner_b: (u32, u32),
) {
    let frame_height = (frame.len() / 4) as u32 / frame_width.max(1);
    if frame_width == 0 || frame_height == 0 {
        return;
    }
    let x_min = corner_a.0.min(corner_b.0).min(frame_width - 1);
    let x_max = corner_a.0.max(corner_b.0).min(frame_width - 1);
    let y_min = corner_a.1.min(corner_b.1).min(frame_height - 1);
    let y_max = corner_a.1.max(corner_b.1).min(frame_height - 1);

    let on_outline = |x: u32, y: u32| {
        x < x_min + SELECTION_THICKNESS
            || x + SELECTION_THICKNESS > x_max
            || y < y_min + SELECTION_THICKNESS
            || y + SELECTION_THICKNESS > y_max
    };
    for y in y_min..=y_max {
        for x in x_min..=x_max {
            if on_outline(x, y) {
                let offset = 4 * (y as usize * frame_width as usize + x as usize);
                frame[offset..offset + 4].copy_from_slice(&[
                    SELECTION_COLOR[0],
                    SELECTION_COLOR[1],
                    SELECTION_COLOR[2],
                    255,
                ]);
            }
        }
    }
}

pub fn write_image_to_file(
    filename: &std::path::Path,
    image: &RgbImage,
) -> Result<(), image::ImageError> {
    image.save(filename)?;
    log::info!("Wrote image file to: {}", filename.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pixel_at(frame: &[u8], width: u32, x: u32, y: u32) -> [u8; 4] {
        let offset = 4 * (y * width + x) as usize;
        [frame[offset], frame[offset + 1], frame[offset + 2], frame[offset + 3]]
    }

    #[test]
    fn test_copy_image_to_rgba_frame() {
        let mut image = RgbImage::new(3, 2);
        image.put_pixel(2, 1, Rgb([10, 20, 30]));
        let mut frame = vec![7u8; 4 * 3 * 2];
        copy_image_to_rgba_frame(&image, &mut frame);
        assert_eq!(pixel_at(&frame, 3, 0, 0), [0, 0, 0, 255]);
        assert_eq!(pixel_at(&frame, 3, 2, 1), [10, 20, 30, 255]);
    }

    #[test]
    fn test_draw_selection_rectangle() {
        let (width, height) = (20u32, 10u32);
        let mut frame = vec![0u8; (4 * width * height) as usize];
        draw_selection_rectangle(&mut frame, width, (15, 8), (3, 1));

        let green = [0, 255, 0, 255];
        assert_eq!(pixel_at(&frame, width, 3, 1), green);
        assert_eq!(pixel_at(&frame, width, 15, 8), green);
        assert_eq!(pixel_at(&frame, width, 9, 2), green); // second row of the top edge
        assert_eq!(pixel_at(&frame, width, 9, 4), [0, 0, 0, 0]); // interior
        assert_eq!(pixel_at(&frame, width, 1, 1), [0, 0, 0, 0]); // outside
        assert_eq!(pixel_at(&frame, width, 16, 8), [0, 0, 0, 0]); // outside
    }

    #[test]
    fn test_draw_selection_rectangle_is_clipped() {
        let (width, height) = (8u32, 8u32);
        let mut frame = vec![0u8; (4 * width * height) as usize];
        draw_selection_rectangle(&mut frame, width, (2, 2), (100, 100));
        assert_eq!(pixel_at(&frame, width, 7, 7), [0, 255, 0, 255]);
    }
}
