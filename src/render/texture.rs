use std::sync::Arc;

use crate::foundation::core::{Point, Rgba8Premul};
use crate::foundation::error::{AvmixError, AvmixResult};

/// An opaque decoded frame: premultiplied RGBA8, row-major, top row first.
#[derive(Clone, Debug)]
pub struct Texture {
    pub width: u32,
    pub height: u32,
    /// Presentation time of the frame in media seconds.
    pub pts: f64,
    data: Arc<[u8]>,
}

impl PartialEq for Texture {
    fn eq(&self, other: &Self) -> bool {
        self.width == other.width && self.height == other.height && self.data == other.data
    }
}

impl Texture {
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> AvmixResult<Self> {
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|v| v.checked_mul(4))
            .ok_or_else(|| AvmixError::evaluation("texture size overflow"))?;
        if data.len() != expected {
            return Err(AvmixError::evaluation(format!(
                "texture {width}x{height} expects {expected} bytes, got {}",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            pts: 0.0,
            data: data.into(),
        })
    }

    /// Wrap a buffer already known to be `width * height * 4` bytes.
    pub(crate) fn from_parts(width: u32, height: u32, data: Vec<u8>) -> Self {
        debug_assert_eq!(data.len(), (width as usize) * (height as usize) * 4);
        Self {
            width,
            height,
            pts: 0.0,
            data: data.into(),
        }
    }

    pub fn solid(width: u32, height: u32, color: Rgba8Premul) -> Self {
        let px = color.to_array();
        let n = (width as usize) * (height as usize);
        let mut data = Vec::with_capacity(n * 4);
        for _ in 0..n {
            data.extend_from_slice(&px);
        }
        Self {
            width,
            height,
            pts: 0.0,
            data: data.into(),
        }
    }

    pub fn with_pts(mut self, pts: f64) -> Self {
        self.pts = pts;
        self
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let idx = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        [
            self.data[idx],
            self.data[idx + 1],
            self.data[idx + 2],
            self.data[idx + 3],
        ]
    }

    /// Nearest-neighbour sample at `uv` (`(0,0)` top-left, `(1,1)` bottom-right), clamped to
    /// the edges. Returns premultiplied components in `[0, 1]`.
    pub fn sample(&self, uv: Point) -> [f32; 4] {
        if self.width == 0 || self.height == 0 {
            return [0.0; 4];
        }
        let x = (uv.x * f64::from(self.width)).floor();
        let y = (uv.y * f64::from(self.height)).floor();
        let x = x.clamp(0.0, f64::from(self.width - 1)) as u32;
        let y = y.clamp(0.0, f64::from(self.height - 1)) as u32;
        let px = self.pixel(x, y);
        [
            f32::from(px[0]) / 255.0,
            f32::from(px[1]) / 255.0,
            f32::from(px[2]) / 255.0,
            f32::from(px[3]) / 255.0,
        ]
    }

    /// Keep alpha and replace RGB by luma, for `mask` offscreen groups.
    pub fn to_luma_mask(&self) -> Self {
        let mut data = self.data.to_vec();
        for px in data.chunks_exact_mut(4) {
            let y = (u32::from(px[0]) * 54 + u32::from(px[1]) * 183 + u32::from(px[2]) * 19) / 256;
            let y = y.min(u32::from(px[3])) as u8;
            px[0] = y;
            px[1] = y;
            px[2] = y;
        }
        Self {
            width: self.width,
            height: self.height,
            pts: self.pts,
            data: data.into(),
        }
    }
}
