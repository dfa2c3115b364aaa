//! Media capability: opening source URLs and pulling decoded frames.
//!
//! Real decoding lives outside the mixer; [`BuiltinProvider`] covers synthetic sources and
//! still images.

mod decode;
mod provider;
mod request;

pub use decode::{decode_image, load_image, unpremultiply_rgba8};
pub use provider::{BuiltinProvider, FramePoll, FrameSource, MediaProvider};
pub use request::{MediaFilter, OpenRequest, Port};
