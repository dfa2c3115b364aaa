use kurbo::Shape;

use crate::foundation::core::{Affine, BezPath, Point, Rect, Rgba8Premul};
use crate::foundation::error::{AvmixError, AvmixResult};
use crate::render::canvas::{Brush, Canvas};
use crate::render::composite::{over, to_u8};
use crate::render::texture::Texture;

/// Reference software canvas: premultiplied RGBA8, pixel-centre coverage.
#[derive(Clone, Debug)]
pub struct CpuCanvas {
    width: u32,
    height: u32,
    data: Vec<u8>,
    clip: Option<Rect>,
}

impl CpuCanvas {
    pub fn new(width: u32, height: u32) -> AvmixResult<Self> {
        let len = (width as usize)
            .checked_mul(height as usize)
            .and_then(|v| v.checked_mul(4))
            .ok_or_else(|| AvmixError::evaluation("canvas size overflow"))?;
        Ok(Self {
            width,
            height,
            data: vec![0; len],
            clip: None,
        })
    }

    /// Canvas space (centred, y up) to pixel space (top-left origin, y down).
    pub fn to_device(&self) -> Affine {
        Affine::new([
            1.0,
            0.0,
            0.0,
            -1.0,
            f64::from(self.width) / 2.0,
            f64::from(self.height) / 2.0,
        ])
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let idx = self.idx(x, y);
        [
            self.data[idx],
            self.data[idx + 1],
            self.data[idx + 2],
            self.data[idx + 3],
        ]
    }

    fn idx(&self, x: u32, y: u32) -> usize {
        ((y as usize) * (self.width as usize) + (x as usize)) * 4
    }

    fn device_bounds(&self) -> Rect {
        let full = Rect::new(0.0, 0.0, f64::from(self.width), f64::from(self.height));
        match self.clip {
            Some(c) => full.intersect(self.to_device().transform_rect_bbox(c)),
            None => full,
        }
    }
}

impl Canvas for CpuCanvas {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn clear(&mut self, color: Rgba8Premul) {
        let px = color.to_array();
        for d in self.data.chunks_exact_mut(4) {
            d.copy_from_slice(&px);
        }
    }

    fn set_clip(&mut self, clip: Option<Rect>) {
        self.clip = clip;
    }

    fn fill_path(
        &mut self,
        path: &BezPath,
        matrix: Affine,
        brush: Brush<'_>,
        opacity: f32,
    ) -> AvmixResult<()> {
        if opacity <= 0.0 {
            return Ok(());
        }
        let full = self.to_device() * matrix;
        if full.determinant().abs() < 1e-12 {
            return Ok(());
        }
        let inv = full.inverse();

        let local = path.bounding_box();
        if local.width() <= 0.0 || local.height() <= 0.0 {
            return Ok(());
        }
        let area = full.transform_rect_bbox(local).intersect(self.device_bounds());
        if area.width() <= 0.0 || area.height() <= 0.0 {
            return Ok(());
        }

        let x0 = area.x0.floor().max(0.0) as u32;
        let y0 = area.y0.floor().max(0.0) as u32;
        let x1 = (area.x1.ceil() as u32).min(self.width);
        let y1 = (area.y1.ceil() as u32).min(self.height);

        for y in y0..y1 {
            for x in x0..x1 {
                let centre = Point::new(f64::from(x) + 0.5, f64::from(y) + 0.5);
                if !area.contains(centre) {
                    continue;
                }
                let p = inv * centre;
                if !path.contains(p) {
                    continue;
                }
                // Path-local y is up; texture rows run top to bottom.
                let uv = Point::new(
                    (p.x - local.x0) / local.width(),
                    (local.y1 - p.y) / local.height(),
                );
                let src = match brush {
                    Brush::Solid(c) => c.to_array(),
                    Brush::Texture(t) => to_u8(t.sample(uv)),
                    Brush::Shader(f) => to_u8(f(uv)),
                };
                let idx = self.idx(x, y);
                let dst = [
                    self.data[idx],
                    self.data[idx + 1],
                    self.data[idx + 2],
                    self.data[idx + 3],
                ];
                self.data[idx..idx + 4].copy_from_slice(&over(dst, src, opacity));
            }
        }
        Ok(())
    }

    fn snapshot(&self) -> Texture {
        Texture::from_parts(self.width, self.height, self.data.clone())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/cpu.rs"]
mod tests;
