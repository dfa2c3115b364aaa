use std::path::Path;

use anyhow::Context;

use crate::foundation::error::AvmixResult;
use crate::render::Texture;

/// Decode an encoded image into a premultiplied texture.
pub fn decode_image(bytes: &[u8]) -> AvmixResult<Texture> {
    let dyn_img = image::load_from_memory(bytes).context("decode image from memory")?;
    to_texture(dyn_img)
}

pub fn load_image(path: &Path) -> AvmixResult<Texture> {
    let dyn_img = image::open(path).with_context(|| format!("open image {}", path.display()))?;
    to_texture(dyn_img)
}

fn to_texture(img: image::DynamicImage) -> AvmixResult<Texture> {
    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();
    let mut data = rgba.into_raw();
    premultiply_rgba8_in_place(&mut data);
    Texture::new(width, height, data)
}

fn premultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = u16::from(px[3]);
        if a == 0 {
            px[..3].fill(0);
            continue;
        }
        for c in &mut px[..3] {
            *c = ((u16::from(*c) * a + 127) / 255) as u8;
        }
    }
}

/// Undo premultiplication for encoders that expect straight alpha.
pub fn unpremultiply_rgba8(rgba: &[u8]) -> Vec<u8> {
    let mut out = rgba.to_vec();
    for px in out.chunks_exact_mut(4) {
        let a = u16::from(px[3]);
        if a == 0 || a == 255 {
            continue;
        }
        for c in &mut px[..3] {
            *c = ((u16::from(*c) * 255 + a / 2) / a).min(255) as u8;
        }
    }
    out
}
