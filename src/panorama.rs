// panorama.rs — equirectangular image preparation before GPU upload

use image::{imageops::FilterType, DynamicImage, GenericImage, Rgba, RgbaImage};
use log::info;

/// Prepare a decoded panorama for upload: shrink it below the device texture
/// limit, then pad partial panoramas up to the 2:1 equirectangular aspect.
pub fn prepare_panorama(img: RgbaImage, max_dimension: u32) -> RgbaImage {
    pad_to_equirect(downscale_to_limit(img, max_dimension))
}

/// Scale the image down (Lanczos3, aspect preserved) if either dimension
/// exceeds what the GPU can sample.
fn downscale_to_limit(img: RgbaImage, max_dimension: u32) -> RgbaImage {
    let (src_w, src_h) = img.dimensions();
    if src_w <= max_dimension && src_h <= max_dimension {
        return img;
    }
    let scale = max_dimension as f32 / src_w.max(src_h) as f32;
    let new_w = ((src_w as f32 * scale) as u32).max(1);
    let new_h = ((src_h as f32 * scale) as u32).max(1);
    info!("panorama {src_w}x{src_h} exceeds texture limit {max_dimension}, scaling to {new_w}x{new_h}");
    DynamicImage::ImageRgba8(img)
        .resize(new_w, new_h, FilterType::Lanczos3)
        .to_rgba8()
}

/// Pad a partial panorama to the full 2:1 equirectangular frame: black rows
/// fill the sky, the source lands at the bottom. The shader then samples
/// v = 0..1 with the missing upper band naturally black.
fn pad_to_equirect(img: RgbaImage) -> RgbaImage {
    let (src_w, src_h) = img.dimensions();
    let target_h = src_w / 2;
    if target_h == 0 || src_h >= target_h {
        return img;
    }
    let mut canvas = RgbaImage::from_pixel(src_w, target_h, Rgba([0, 0, 0, 255]));
    let y_offset = target_h - src_h;
    // y_offset keeps the copy in bounds, so this cannot fail
    let _ = canvas.copy_from(&img, 0, y_offset);
    canvas
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(w: u32, h: u32, px: [u8; 4]) -> RgbaImage {
        RgbaImage::from_pixel(w, h, Rgba(px))
    }

    #[test]
    fn full_equirect_passes_through() {
        let img = solid(1024, 512, [10, 20, 30, 255]);
        let out = prepare_panorama(img.clone(), 4096);
        assert_eq!(out.dimensions(), (1024, 512));
        assert_eq!(out, img);
    }

    #[test]
    fn partial_panorama_is_padded_to_two_to_one() {
        let img = solid(1000, 300, [200, 0, 0, 255]);
        let out = prepare_panorama(img, 4096);
        assert_eq!(out.dimensions(), (1000, 500));
        // Top band is black sky, the source sits at the bottom.
        assert_eq!(*out.get_pixel(500, 0), Rgba([0, 0, 0, 255]));
        assert_eq!(*out.get_pixel(500, 199), Rgba([0, 0, 0, 255]));
        assert_eq!(*out.get_pixel(500, 200), Rgba([200, 0, 0, 255]));
        assert_eq!(*out.get_pixel(500, 499), Rgba([200, 0, 0, 255]));
    }

    #[test]
    fn oversized_image_is_scaled_into_the_limit() {
        let img = solid(4096, 2048, [0, 50, 0, 255]);
        let out = prepare_panorama(img, 2048);
        let (w, h) = out.dimensions();
        assert!(w <= 2048 && h <= 2048);
        assert_eq!(w, 2 * h, "aspect preserved");
    }

    #[test]
    fn taller_than_wide_input_is_left_alone() {
        // Degenerate input, but it must not panic or get padded.
        let img = solid(100, 400, [1, 2, 3, 255]);
        let out = prepare_panorama(img, 4096);
        assert_eq!(out.dimensions(), (100, 400));
    }
}
