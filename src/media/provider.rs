use std::path::PathBuf;

use tracing::debug;

use crate::foundation::core::{Color, Rgba8Premul};
use crate::foundation::error::{AvmixError, AvmixResult};
use crate::media::decode::load_image;
use crate::media::request::OpenRequest;
use crate::render::Texture;

/// Result of a non-blocking frame pull.
#[derive(Clone, Debug)]
pub enum FramePoll {
    Ready(Texture),
    /// Not decoded yet; try again later.
    Pending,
    /// No more frames.
    Ended,
}

/// One opened source URL, pulled by media time.
pub trait FrameSource: std::fmt::Debug {
    /// Frame for `media_time` seconds after the source start. Must not block.
    fn poll(&mut self, media_time: f64) -> FramePoll;

    /// Known media duration in seconds.
    fn duration(&self) -> Option<f64>;

    /// Whether the source has audio.
    fn has_audio(&self) -> bool {
        false
    }
}

/// Opens source URLs. The mixer holds one provider for its lifetime.
pub trait MediaProvider {
    fn open(&self, req: &OpenRequest) -> AvmixResult<Box<dyn FrameSource>>;
}

/// Provider for synthetic and still-image sources.
///
/// - `color://<color>`: solid frames.
/// - `testsrc://`: scrolling color bars.
/// - anything else: a still image file (`file://` prefix optional).
///
/// Synthetic URLs accept a `?dur=<seconds>` suffix to bound their duration.
#[derive(Clone, Debug, Default)]
pub struct BuiltinProvider;

impl MediaProvider for BuiltinProvider {
    fn open(&self, req: &OpenRequest) -> AvmixResult<Box<dyn FrameSource>> {
        let (base, query) = match req.url.split_once('?') {
            Some((b, q)) => (b, Some(q)),
            None => (req.url.as_str(), None),
        };
        let duration = match query.and_then(|q| query_value(q, "dur")) {
            None => None,
            Some(d) => Some(d.parse::<f64>().map_err(|_| {
                AvmixError::resource(format!("invalid dur in '{}'", req.url))
            })?),
        };
        let (w, h) = (req.width.max(1), req.height.max(1));

        if let Some(color) = base.strip_prefix("color://") {
            let color = Color::parse(color)?;
            return Ok(Box::new(SolidSource {
                frame: Texture::solid(w, h, color.to_premul()),
                duration,
            }));
        }
        if base.starts_with("testsrc://") {
            return Ok(Box::new(TestSource {
                width: w,
                height: h,
                duration,
            }));
        }
        let path = PathBuf::from(base.strip_prefix("file://").unwrap_or(base));
        let frame = load_image(&path)
            .map_err(|e| AvmixError::resource(format!("cannot open '{}': {e}", req.url)))?;
        debug!(url = %req.url, width = frame.width, height = frame.height, "opened still image");
        Ok(Box::new(SolidSource {
            frame,
            duration: None,
        }))
    }
}

fn query_value<'a>(query: &'a str, key: &str) -> Option<&'a str> {
    query
        .split('&')
        .filter_map(|kv| kv.split_once('='))
        .find(|(k, _)| *k == key)
        .map(|(_, v)| v)
}

fn ended(duration: Option<f64>, t: f64) -> bool {
    duration.is_some_and(|d| t >= d)
}

#[derive(Debug)]
struct SolidSource {
    frame: Texture,
    duration: Option<f64>,
}

impl FrameSource for SolidSource {
    fn poll(&mut self, media_time: f64) -> FramePoll {
        if ended(self.duration, media_time) {
            return FramePoll::Ended;
        }
        FramePoll::Ready(self.frame.clone().with_pts(media_time))
    }

    fn duration(&self) -> Option<f64> {
        self.duration
    }
}

const BARS: [Color; 7] = [
    Color::rgba(0.75, 0.75, 0.75, 1.0),
    Color::rgba(0.75, 0.75, 0.0, 1.0),
    Color::rgba(0.0, 0.75, 0.75, 1.0),
    Color::rgba(0.0, 0.75, 0.0, 1.0),
    Color::rgba(0.75, 0.0, 0.75, 1.0),
    Color::rgba(0.75, 0.0, 0.0, 1.0),
    Color::rgba(0.0, 0.0, 0.75, 1.0),
];

/// Vertical bars scrolling left by one frame width every 7 seconds.
#[derive(Debug)]
struct TestSource {
    width: u32,
    height: u32,
    duration: Option<f64>,
}

impl FrameSource for TestSource {
    fn poll(&mut self, media_time: f64) -> FramePoll {
        if ended(self.duration, media_time) {
            return FramePoll::Ended;
        }
        let w = self.width as usize;
        let shift = ((media_time / 7.0).fract() * w as f64) as usize;
        let row: Vec<Rgba8Premul> = (0..w)
            .map(|x| BARS[((x + shift) % w) * BARS.len() / w].to_premul())
            .collect();
        let mut data = Vec::with_capacity(w * self.height as usize * 4);
        for _ in 0..self.height {
            for px in &row {
                data.extend_from_slice(&px.to_array());
            }
        }
        match Texture::new(self.width, self.height, data) {
            Ok(t) => FramePoll::Ready(t.with_pts(media_time)),
            Err(_) => FramePoll::Ended,
        }
    }

    fn duration(&self) -> Option<f64> {
        self.duration
    }
}

#[cfg(test)]
#[path = "../../tests/unit/media/provider.rs"]
mod tests;
