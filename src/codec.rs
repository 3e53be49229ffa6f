use crate::{Error, Result};
use image::{ColorType, DynamicImage, ImageFormat, RgbaImage};
use std::io::Cursor;

/// Decode an uploaded buffer. Anything the image crate cannot read is the
/// client's fault and surfaces as a validation error.
pub fn decode(data: &[u8]) -> Result<DynamicImage> {
    if data.is_empty() {
        return Err(Error::validation("Unreadable image: empty upload"));
    }
    image::load_from_memory(data).map_err(|e| Error::validation(format!("Unreadable image: {e}")))
}

pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>> {
    let mut buffer = Cursor::new(Vec::new());
    image
        .write_to(&mut buffer, ImageFormat::Png)
        .map_err(|e| Error::processing(format!("Failed to encode PNG: {e}")))?;
    Ok(buffer.into_inner())
}

/// Short PIL-style mode name used in logs.
pub fn mode_name(color: ColorType) -> &'static str {
    match color {
        ColorType::L8 | ColorType::L16 => "L",
        ColorType::La8 | ColorType::La16 => "LA",
        ColorType::Rgb8 | ColorType::Rgb16 | ColorType::Rgb32F => "RGB",
        ColorType::Rgba8 | ColorType::Rgba16 | ColorType::Rgba32F => "RGBA",
        _ => "unknown",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_png_round_trip() {
        let mut original = RgbaImage::new(3, 2);
        original.put_pixel(0, 0, Rgba([255, 0, 0, 255]));
        original.put_pixel(2, 1, Rgba([10, 20, 30, 40]));

        let bytes = encode_png(&original).unwrap();
        let decoded = decode(&bytes).unwrap();

        assert_eq!(decoded.color(), ColorType::Rgba8);
        assert_eq!(decoded.to_rgba8(), original);
    }

    #[test]
    fn test_decode_garbage_is_validation_error() {
        let err = decode(b"definitely not an image").unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert!(err.to_string().starts_with("Unreadable image"));
    }

    #[test]
    fn test_decode_empty_is_validation_error() {
        assert!(matches!(decode(&[]), Err(Error::Validation(_))));
    }
}
