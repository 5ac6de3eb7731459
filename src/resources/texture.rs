use anyhow::Context as _;
use cgmath::Vector3;
use image::{ImageFormat, load_from_memory_with_format};

use crate::resources::{Asset, Bounds};

/**
 * A decoded sprite texture.
 *
 * Sprites are drawn as camera-facing unit quads centered on the effect, so
 * their bounds only depend on the quad, not on the pixel size.
 */
#[derive(Clone, Debug)]
pub struct Sprite {
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub pixels: image::RgbaImage,
}

impl Sprite {
    pub fn from_image(name: &str, image: image::RgbaImage) -> Self {
        Self {
            name: name.to_owned(),
            width: image.width(),
            height: image.height(),
            pixels: image,
        }
    }

    pub fn bounds(&self) -> Bounds {
        Bounds::new(Vector3::new(0.0, 0.0, 0.0), std::f32::consts::FRAC_1_SQRT_2)
    }
}

/// Decodes image bytes. `format` is a file extension hint; auto-detect if `None`.
pub fn decode_sprite(name: &str, bytes: &[u8], format: Option<&str>) -> anyhow::Result<Asset> {
    let img = match format.and_then(ImageFormat::from_extension) {
        Some(fmt) => load_from_memory_with_format(bytes, fmt),
        None => image::load_from_memory(bytes),
    }
    .with_context(|| format!("`{name}` is not a decodable image"))?;
    Ok(Asset::Sprite(Sprite::from_image(name, img.to_rgba8())))
}
