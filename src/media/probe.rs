use std::io::Cursor;
use tracing::warn;

/// Pixel width/height of an encoded image, or None when the bytes don't
/// decode as any known format.
pub fn image_dimensions(bytes: &[u8]) -> Option<(u32, u32)> {
    let reader = match image::ImageReader::new(Cursor::new(bytes)).with_guessed_format() {
        Ok(r) => r,
        Err(e) => {
            warn!(error = %e, "image format probe failed");
            return None;
        }
    };
    match reader.into_dimensions() {
        Ok(dims) => Some(dims),
        Err(e) => {
            warn!(error = %e, "image dimension probe failed");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::new(width, height);
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn reads_dimensions_from_encoded_bytes() {
        assert_eq!(image_dimensions(&png_bytes(3, 2)), Some((3, 2)));
    }

    #[test]
    fn undecodable_bytes_yield_none() {
        assert_eq!(image_dimensions(b"definitely not an image"), None);
    }
}
