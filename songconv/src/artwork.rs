use crate::error::{ConvertError, Result};
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, ImageReader};
use std::path::Path;

/// Banner output size in pixels.
pub const BANNER_SIZE: (u32, u32) = (256, 80);
/// Background output size in pixels.
pub const BACKGROUND_SIZE: (u32, u32) = (320, 240);

/// A crop region in source pixel space, `x1`/`y1` exclusive.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CropBox {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl CropBox {
    pub fn width(&self) -> f64 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f64 {
        self.y1 - self.y0
    }

    /// Snap to whole pixels as `(x, y, width, height)`, clamped to the source.
    fn to_pixels(self, source_width: u32, source_height: u32) -> (u32, u32, u32, u32) {
        let x = (self.x0.round() as u32).min(source_width.saturating_sub(1));
        let y = (self.y0.round() as u32).min(source_height.saturating_sub(1));
        let width = (self.width().round() as u32).clamp(1, source_width.saturating_sub(x).max(1));
        let height = (self.height().round() as u32).clamp(1, source_height.saturating_sub(y).max(1));
        (x, y, width, height)
    }
}

/// Largest centered box of the source with the target aspect ratio.
///
/// A source that is relatively wider than the target loses its sides, any
/// other source loses its top and bottom.
pub fn fit_crop(source_width: u32, source_height: u32, target_width: u32, target_height: u32) -> CropBox {
    let (sw, sh) = (source_width as f64, source_height as f64);
    let (tw, th) = (target_width as f64, target_height as f64);

    // sw / sh > tw / th, compared without rounding
    if source_width as u64 * target_height as u64 > target_width as u64 * source_height as u64 {
        let width = sh * tw / th;
        let x0 = (sw - width) / 2.0;
        CropBox {
            x0,
            y0: 0.0,
            x1: x0 + width,
            y1: sh,
        }
    } else {
        let height = sw * th / tw;
        let y0 = (sh - height) / 2.0;
        CropBox {
            x0: 0.0,
            y0,
            x1: sw,
            y1: y0 + height,
        }
    }
}

/// Crop `image` to the target aspect ratio and scale it to exactly the target size.
///
/// The crop box is rounded to whole pixels first, so the kept region matches
/// the target aspect ratio only up to that rounding.
pub fn scale_crop_resize(image: &DynamicImage, target_width: u32, target_height: u32) -> DynamicImage {
    let crop = fit_crop(image.width(), image.height(), target_width, target_height);
    let (x, y, width, height) = crop.to_pixels(image.width(), image.height());

    image
        .crop_imm(x, y, width, height)
        .resize_exact(target_width, target_height, FilterType::Triangle)
}

/// Decode `input`, aspect-fit it to `size` and write it out as PNG.
pub fn convert_image(input: &Path, output: &Path, size: (u32, u32)) -> Result<()> {
    let image_error = |source| ConvertError::Image {
        path: input.to_path_buf(),
        source,
    };

    let image = ImageReader::open(input)
        .and_then(|reader| reader.with_guessed_format())
        .map_err(|e| image_error(image::ImageError::IoError(e)))?
        .decode()
        .map_err(image_error)?;

    // nothing is written unless the resized image is complete
    let resized = scale_crop_resize(&image, size.0, size.1);
    resized
        .save_with_format(output, ImageFormat::Png)
        .map_err(|source| ConvertError::Image {
            path: output.to_path_buf(),
            source,
        })
}

pub fn convert_banner(input: &Path, output: &Path) -> Result<()> {
    convert_image(input, output, BANNER_SIZE)
}

pub fn convert_background(input: &Path, output: &Path) -> Result<()> {
    convert_image(input, output, BACKGROUND_SIZE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn ratio(crop: &CropBox) -> f64 {
        crop.width() / crop.height()
    }

    #[test]
    fn test_fit_crop_wide_source_loses_sides() {
        let crop = fit_crop(4000, 1000, 256, 80);
        assert_eq!(crop, CropBox { x0: 400.0, y0: 0.0, x1: 3600.0, y1: 1000.0 });
        assert!((ratio(&crop) - 3.2).abs() < 1e-12);
    }

    #[test]
    fn test_fit_crop_narrow_source_loses_top_and_bottom() {
        let crop = fit_crop(1000, 4000, 320, 240);
        assert_eq!(crop, CropBox { x0: 0.0, y0: 1625.0, x1: 1000.0, y1: 2375.0 });

        // 2:1 is still narrower than a 256x80 banner
        let crop = fit_crop(4000, 2000, 256, 80);
        assert_eq!(crop, CropBox { x0: 0.0, y0: 375.0, x1: 4000.0, y1: 1625.0 });
        assert!((ratio(&crop) - 3.2).abs() < 1e-12);
    }

    #[test]
    fn test_fit_crop_same_ratio_keeps_everything() {
        let crop = fit_crop(640, 480, 320, 240);
        assert_eq!(crop, CropBox { x0: 0.0, y0: 0.0, x1: 640.0, y1: 480.0 });
    }

    #[test]
    fn test_fit_crop_stays_inside_source() {
        for &(w, h) in &[(1, 1), (7, 3), (300, 1000), (1920, 1080), (257, 79)] {
            for &(tw, th) in &[BANNER_SIZE, BACKGROUND_SIZE] {
                let crop = fit_crop(w, h, tw, th);
                assert!(crop.x0 >= 0.0 && crop.y0 >= 0.0);
                assert!(crop.x1 <= w as f64 + 1e-9 && crop.y1 <= h as f64 + 1e-9);
            }
        }
    }

    #[test]
    fn test_crop_rounds_to_nearest_pixel() {
        // 257x79 against 256:80 keeps a 252.8 pixel wide box starting at 2.1
        let crop = fit_crop(257, 79, 256, 80);
        assert_eq!(crop.to_pixels(257, 79), (2, 0, 253, 79));

        for &(w, h) in &[(257, 79), (1000, 333), (333, 1000), (7, 3)] {
            for &(tw, th) in &[BANNER_SIZE, BACKGROUND_SIZE] {
                let crop = fit_crop(w, h, tw, th);
                let (_, _, pw, ph) = crop.to_pixels(w, h);
                assert!((pw as f64 - crop.width()).abs() <= 0.5, "{}x{}", w, h);
                assert!((ph as f64 - crop.height()).abs() <= 0.5, "{}x{}", w, h);
            }
        }
    }

    #[test]
    fn test_scale_crop_resize_output_size() {
        for &(w, h) in &[(1000, 200), (200, 1000), (640, 480), (3, 2)] {
            let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(w, h, Rgb([10, 20, 30])));
            for &(tw, th) in &[BANNER_SIZE, BACKGROUND_SIZE] {
                let resized = scale_crop_resize(&image, tw, th);
                assert_eq!((resized.width(), resized.height()), (tw, th));
            }
        }
    }

    #[test]
    fn test_scale_crop_resize_keeps_center() {
        // red sides, green middle: a square crop of a 3:1 image is all green
        let image = RgbImage::from_fn(300, 100, |x, _| {
            if (100..200).contains(&x) {
                Rgb([0, 255, 0])
            } else {
                Rgb([255, 0, 0])
            }
        });
        let resized = scale_crop_resize(&DynamicImage::ImageRgb8(image), 10, 10).to_rgb8();
        assert_eq!(*resized.get_pixel(5, 5), Rgb([0, 255, 0]));
        assert_eq!(*resized.get_pixel(0, 0), Rgb([0, 255, 0]));
    }

    #[test]
    fn test_convert_image_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("banner.png");
        std::fs::write(&input, b"not an image").unwrap();

        let err = convert_banner(&input, &dir.path().join("bn.png")).unwrap_err();
        assert!(matches!(err, ConvertError::Image { .. }));
        assert!(!dir.path().join("bn.png").exists());
    }
}
