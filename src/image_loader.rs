//! # Image Sources
//!
//! Image elements name their picture by a `src` string: a `data:` URI, a
//! relative or absolute file path, or bare base64. The loader resolves the
//! bytes, reads the intrinsic pixel size (which image-dimension formatting
//! needs) and keeps the data in a form a surface can embed. JPEG stays
//! encoded; PNG is decoded to RGB with a separate alpha plane.

use std::io::Cursor;

use base64::Engine;

use crate::error::{PlumeError, Result};

#[derive(Debug, Clone)]
pub struct LoadedImage {
    pub pixel_data: ImagePixels,
    pub width_px: u32,
    pub height_px: u32,
}

#[derive(Debug, Clone)]
pub enum ImagePixels {
    /// Encoded JPEG, embeddable as-is.
    Jpeg { data: Vec<u8>, grayscale: bool },
    /// `width * height * 3` RGB bytes and, for translucent images, one alpha
    /// byte per pixel.
    Decoded { rgb: Vec<u8>, alpha: Option<Vec<u8>> },
}

impl LoadedImage {
    /// Width over height.
    pub fn aspect_ratio(&self) -> f64 {
        self.width_px as f64 / self.height_px.max(1) as f64
    }
}

/// Resolve `src` and decode the image behind it.
pub fn load_image(src: &str) -> Result<LoadedImage> {
    let bytes = source_bytes(src)?;
    decode(&bytes)
        .map_err(|e| PlumeError::Image(format!("{} ({})", e, describe(src))))
}

/// Keeps error messages short when `src` is a large inline payload.
fn describe(src: &str) -> String {
    if src.len() > 48 {
        format!("{}...", &src[..src.char_indices().nth(45).map_or(src.len(), |(i, _)| i)])
    } else {
        src.to_string()
    }
}

pub(crate) fn source_bytes(src: &str) -> Result<Vec<u8>> {
    if let Some(rest) = src.strip_prefix("data:") {
        let (_, payload) = rest
            .split_once(',')
            .ok_or_else(|| PlumeError::Image("data URI without a payload".to_string()))?;
        return decode_base64(payload);
    }

    if src.starts_with('/') || src.starts_with("./") || src.starts_with("../") {
        #[cfg(not(target_arch = "wasm32"))]
        {
            return std::fs::read(src)
                .map_err(|e| PlumeError::Image(format!("cannot read \"{}\": {}", src, e)));
        }
        #[cfg(target_arch = "wasm32")]
        {
            return Err(PlumeError::Image(format!(
                "file images are unavailable in the browser build: \"{}\"",
                src
            )));
        }
    }

    decode_base64(src)
}

fn decode_base64(payload: &str) -> Result<Vec<u8>> {
    base64::engine::general_purpose::STANDARD
        .decode(payload.trim())
        .map_err(|e| PlumeError::Image(format!("invalid base64 image data: {}", e)))
}

fn decode(data: &[u8]) -> Result<LoadedImage> {
    match data {
        [0xFF, 0xD8, ..] => decode_jpeg(data),
        [0x89, b'P', b'N', b'G', ..] => decode_png(data),
        _ if data.len() < 4 => Err(PlumeError::Image("image data too short".to_string())),
        _ => Err(PlumeError::Image(
            "unsupported image format, expected JPEG or PNG".to_string(),
        )),
    }
}

fn decode_jpeg(data: &[u8]) -> Result<LoadedImage> {
    let reader = image::io::Reader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| PlumeError::Image(e.to_string()))?;
    let (width_px, height_px) = reader
        .into_dimensions()
        .map_err(|e| PlumeError::Image(format!("unreadable JPEG header: {}", e)))?;

    Ok(LoadedImage {
        pixel_data: ImagePixels::Jpeg {
            data: data.to_vec(),
            grayscale: jpeg_components(data) == Some(1),
        },
        width_px,
        height_px,
    })
}

/// Component count from the first start-of-frame segment.
fn jpeg_components(data: &[u8]) -> Option<u8> {
    let mut i = 2;
    while i + 3 < data.len() && data[i] == 0xFF {
        let marker = data[i + 1];
        if matches!(marker, 0xC0..=0xC3 | 0xC5..=0xC7 | 0xC9..=0xCB | 0xCD..=0xCF) {
            return data.get(i + 9).copied();
        }
        let length = u16::from_be_bytes([data[i + 2], data[i + 3]]) as usize;
        i += 2 + length;
    }
    None
}

fn decode_png(data: &[u8]) -> Result<LoadedImage> {
    let decoded = image::load_from_memory_with_format(data, image::ImageFormat::Png)
        .map_err(|e| PlumeError::Image(format!("failed to decode PNG: {}", e)))?;
    let rgba = decoded.to_rgba8();
    let (width_px, height_px) = rgba.dimensions();

    let pixels = (width_px * height_px) as usize;
    let mut rgb = Vec::with_capacity(pixels * 3);
    let mut alpha = Vec::with_capacity(pixels);
    for pixel in rgba.pixels() {
        rgb.extend_from_slice(&pixel.0[..3]);
        alpha.push(pixel.0[3]);
    }
    let translucent = alpha.iter().any(|&a| a != u8::MAX);

    Ok(LoadedImage {
        pixel_data: ImagePixels::Decoded {
            rgb,
            alpha: translucent.then_some(alpha),
        },
        width_px,
        height_px,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png(pixel: [u8; 4]) -> Vec<u8> {
        let mut img = image::RgbaImage::new(2, 1);
        img.put_pixel(0, 0, image::Rgba(pixel));
        img.put_pixel(1, 0, image::Rgba(pixel));
        let mut buf = Vec::new();
        let encoder = image::codecs::png::PngEncoder::new(&mut buf);
        image::ImageEncoder::write_image(encoder, img.as_raw(), 2, 1, image::ColorType::Rgba8)
            .unwrap();
        buf
    }

    #[test]
    fn opaque_png_has_no_alpha() {
        let loaded = decode(&png([255, 0, 0, 255])).unwrap();
        assert_eq!((loaded.width_px, loaded.height_px), (2, 1));
        assert_eq!(loaded.aspect_ratio(), 2.0);
        match loaded.pixel_data {
            ImagePixels::Decoded { rgb, alpha } => {
                assert_eq!(rgb, vec![255, 0, 0, 255, 0, 0]);
                assert!(alpha.is_none());
            }
            other => panic!("unexpected pixels {:?}", other),
        }
    }

    #[test]
    fn translucent_png_keeps_alpha() {
        let loaded = decode(&png([0, 0, 255, 128])).unwrap();
        match loaded.pixel_data {
            ImagePixels::Decoded { alpha, .. } => assert_eq!(alpha, Some(vec![128, 128])),
            other => panic!("unexpected pixels {:?}", other),
        }
    }

    #[test]
    fn jpeg_passes_through() {
        let img = image::RgbImage::from_fn(4, 2, |_, _| image::Rgb([10, 20, 30]));
        let mut buf = Vec::new();
        let encoder = image::codecs::jpeg::JpegEncoder::new(&mut buf);
        image::ImageEncoder::write_image(encoder, img.as_raw(), 4, 2, image::ColorType::Rgb8)
            .unwrap();

        let loaded = decode(&buf).unwrap();
        assert_eq!((loaded.width_px, loaded.height_px), (4, 2));
        match loaded.pixel_data {
            ImagePixels::Jpeg { data, grayscale } => {
                assert!(data.starts_with(&[0xFF, 0xD8]));
                assert!(!grayscale);
            }
            other => panic!("unexpected pixels {:?}", other),
        }
    }

    #[test]
    fn data_uri_source() {
        let uri = format!(
            "data:image/png;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(png([0, 255, 0, 255]))
        );
        assert_eq!(load_image(&uri).unwrap().width_px, 2);
    }

    #[test]
    fn bad_sources_are_image_errors() {
        assert!(matches!(load_image("data:image/png;base64"), Err(PlumeError::Image(_))));
        assert!(matches!(decode(&[0, 1]), Err(PlumeError::Image(_))));
        assert!(matches!(decode(&[0, 1, 2, 3, 4]), Err(PlumeError::Image(_))));
        assert!(matches!(load_image("./missing.png"), Err(PlumeError::Image(_))));
    }
}
