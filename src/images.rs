use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use image::{ColorType, ImageFormat};

use crate::error::Error;
use crate::model::Element;
use crate::services::ImageFetcher;

pub(crate) enum PixelData {
    /// Baseline JPEG passed through with DCTDecode.
    Jpeg(Vec<u8>),
    Rgb {
        rgb: Vec<u8>,
        alpha: Option<Vec<u8>>,
    },
}

pub(crate) struct DecodedImage {
    pub(crate) width: u32,
    pub(crate) height: u32,
    pub(crate) pixels: PixelData,
}

/// Decode inline base64, tolerating line breaks and a `data:` URI prefix.
pub(crate) fn decode_base64(data: &str) -> Result<Vec<u8>, Error> {
    let payload = match data.find("base64,") {
        Some(pos) if data.starts_with("data:") => &data[pos + "base64,".len()..],
        _ => data,
    };
    let cleaned: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    Ok(BASE64.decode(cleaned.as_bytes())?)
}

/// Raw image bytes for an image element: inline `image_data` wins over `image_url`.
pub(crate) fn resolve_source(
    element: &Element,
    fetcher: &dyn ImageFetcher,
) -> Result<Option<Vec<u8>>, Error> {
    if let Some(data) = element.style_str("image_data").filter(|d| !d.is_empty()) {
        return decode_base64(data).map(Some);
    }
    if let Some(url) = element.style_str("image_url").filter(|u| !u.is_empty()) {
        return fetcher.fetch(url).map(Some);
    }
    Ok(None)
}

pub(crate) fn decode(bytes: &[u8]) -> Result<DecodedImage, Error> {
    let format = image::guess_format(bytes)?;
    let img = image::load_from_memory_with_format(bytes, format)?;
    let (width, height) = (img.width(), img.height());

    if format == ImageFormat::Jpeg && img.color() == ColorType::Rgb8 {
        return Ok(DecodedImage {
            width,
            height,
            pixels: PixelData::Jpeg(bytes.to_vec()),
        });
    }

    let pixels = if img.color().has_alpha() {
        let rgba = img.to_rgba8();
        let mut rgb = Vec::with_capacity((width * height * 3) as usize);
        let mut alpha = Vec::with_capacity((width * height) as usize);
        for px in rgba.pixels() {
            let [r, g, b, a] = px.0;
            rgb.extend_from_slice(&[r, g, b]);
            alpha.push(a);
        }
        PixelData::Rgb {
            rgb,
            alpha: Some(alpha),
        }
    } else {
        PixelData::Rgb {
            rgb: img.to_rgb8().into_raw(),
            alpha: None,
        }
    };

    Ok(DecodedImage {
        width,
        height,
        pixels,
    })
}
