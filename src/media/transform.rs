use image::imageops::FilterType;
use image::DynamicImage;
use tracing::{debug, warn};

/// Images wider than this are scaled down; narrower ones are left at their
/// original size (but still re-encoded).
pub const MAX_WIDTH: u32 = 640;
pub const WEBP_QUALITY: f32 = 80.0;

/// Resize to at most `max_width` preserving aspect ratio, then re-encode as
/// lossy WebP. Re-encoding is unconditional; resizing is not. None on any
/// decode/encode failure.
pub fn optimize_image(bytes: &[u8], max_width: u32) -> Option<Vec<u8>> {
    let img = match image::load_from_memory(bytes) {
        Ok(i) => i,
        Err(e) => {
            warn!(error = %e, "image decode failed");
            return None;
        }
    };

    let img = if img.width() > max_width {
        let ratio = max_width as f64 / img.width() as f64;
        let new_height = (img.height() as f64 * ratio) as u32;
        debug!(
            from_width = img.width(),
            to_width = max_width,
            to_height = new_height,
            "resizing image"
        );
        img.resize_exact(max_width, new_height.max(1), FilterType::Lanczos3)
    } else {
        debug!(width = img.width(), max_width, "width within limit; skipping resize");
        img
    };

    // The webp encoder only accepts RGB8/RGBA8 buffers.
    let rgba = DynamicImage::ImageRgba8(img.to_rgba8());
    let encoder = match webp::Encoder::from_image(&rgba) {
        Ok(enc) => enc,
        Err(e) => {
            warn!(error = e, "webp encoder rejected image");
            return None;
        }
    };
    Some(encoder.encode(WEBP_QUALITY).to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::probe::image_dimensions;
    use image::RgbImage;
    use std::io::Cursor;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::new(width, height);
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn wide_images_scale_to_max_width_preserving_aspect() {
        let out = optimize_image(&png_bytes(800, 400), MAX_WIDTH).unwrap();
        assert_eq!(image_dimensions(&out), Some((640, 320)));
        assert_eq!(image::guess_format(&out).unwrap(), image::ImageFormat::WebP);
    }

    #[test]
    fn narrow_images_keep_their_size_but_change_format() {
        let out = optimize_image(&png_bytes(320, 200), MAX_WIDTH).unwrap();
        assert_eq!(image_dimensions(&out), Some((320, 200)));
        assert_eq!(image::guess_format(&out).unwrap(), image::ImageFormat::WebP);
    }

    #[test]
    fn garbage_bytes_yield_none() {
        assert_eq!(optimize_image(b"not an image", MAX_WIDTH), None);
    }
}
