//! Conversions between tile payloads and RGB565 pixels.

use image::{ImageError, ImageFormat, RgbaImage};
use serde::Deserialize;

/// Order of the two bytes of each RGB565 pixel.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ByteOrder {
    /// Most significant byte first.
    #[default]
    Big,
    /// Least significant byte first.
    Little,
}

impl ByteOrder {
    /// Encodes a pixel.
    fn to_bytes(self, value: u16) -> [u8; 2] {
        match self {
            ByteOrder::Big => value.to_be_bytes(),
            ByteOrder::Little => value.to_le_bytes(),
        }
    }

    /// Decodes a pixel.
    fn from_bytes(self, bytes: [u8; 2]) -> u16 {
        match self {
            ByteOrder::Big => u16::from_be_bytes(bytes),
            ByteOrder::Little => u16::from_le_bytes(bytes),
        }
    }
}

/// Packs an 8-bit-per-channel color into RGB565.
pub fn rgb565(r: u8, g: u8, b: u8) -> u16 {
    ((r as u16 & 0xF8) << 8) | ((g as u16 & 0xFC) << 3) | (b as u16 >> 3)
}

/// Converts an image into RGB565 pixels, dropping the alpha channel.
pub fn rgba_to_rgb565(image: &RgbaImage, order: ByteOrder) -> Vec<u8> {
    let mut result = Vec::with_capacity(image.width() as usize * image.height() as usize * 2);
    for pixel in image.pixels() {
        let [r, g, b, _] = pixel.0;
        result.extend_from_slice(&order.to_bytes(rgb565(r, g, b)));
    }
    result
}

/// Converts RGB565 pixels into an opaque image, or returns `None` if the
/// number of bytes doesn't match the dimensions.
pub fn rgb565_to_rgba(
    pixels: &[u8],
    width: u32,
    height: u32,
    order: ByteOrder,
) -> Option<RgbaImage> {
    if pixels.len() != width as usize * height as usize * 2 {
        return None;
    }
    let rgba = pixels
        .chunks_exact(2)
        .flat_map(|bytes| {
            let value = order.from_bytes([bytes[0], bytes[1]]);
            let r = (value >> 11) as u8 & 0x1F;
            let g = (value >> 5) as u8 & 0x3F;
            let b = value as u8 & 0x1F;
            [(r << 3) | (r >> 2), (g << 2) | (g >> 4), (b << 3) | (b >> 2), 0xFF]
        })
        .collect();
    RgbaImage::from_raw(width, height, rgba)
}

/// Decode an image in RGBA format from PNG data.
pub fn decode_png(bytes: &[u8]) -> Result<RgbaImage, ImageError> {
    let dynamic_image =
        image::ImageReader::with_format(std::io::Cursor::new(bytes), ImageFormat::Png).decode()?;
    Ok(dynamic_image.to_rgba8())
}
