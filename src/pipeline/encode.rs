//! Raster encode/decode: bytes ⇄ `DynamicImage`.
//!
//! JPEG has no alpha channel, so translucent pixels are composited onto
//! white before encoding, the way a browser canvas export does.

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use std::io::Cursor;
use tracing::debug;

/// Target raster encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RasterFormat {
    Jpeg,
    Png,
}

impl RasterFormat {
    pub fn extension(self) -> &'static str {
        match self {
            RasterFormat::Jpeg => "jpg",
            RasterFormat::Png => "png",
        }
    }
}

/// Decode image bytes, sniffing the container from its magic number.
pub fn decode_image(bytes: &[u8]) -> Result<DynamicImage, image::ImageError> {
    let img = image::load_from_memory(bytes)?;
    debug!("Decoded image → {}x{} px", img.width(), img.height());
    Ok(img)
}

/// Encode an image as JPEG (at `jpeg_quality`) or PNG.
pub fn encode_image(
    img: &DynamicImage,
    format: RasterFormat,
    jpeg_quality: u8,
) -> Result<Vec<u8>, image::ImageError> {
    let mut buf = Vec::new();
    match format {
        RasterFormat::Png => {
            img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)?;
        }
        RasterFormat::Jpeg => {
            let rgb = flatten_on_white(img);
            let encoder = JpegEncoder::new_with_quality(&mut buf, jpeg_quality.clamp(1, 100));
            rgb.write_with_encoder(encoder)?;
        }
    }
    debug!("Encoded {:?} → {} bytes", format, buf.len());
    Ok(buf)
}

/// Composite onto an opaque white background.
pub fn flatten_on_white(img: &DynamicImage) -> RgbImage {
    if !img.color().has_alpha() {
        return img.to_rgb8();
    }
    let rgba = img.to_rgba8();
    RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        let blend = |c: u8| ((c as u32 * a as u32 + 255 * (255 - a as u32) + 127) / 255) as u8;
        Rgb([blend(r), blend(g), blend(b)])
    })
}
