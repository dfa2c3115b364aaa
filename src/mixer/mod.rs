//! The mixer driver: owns the live playlist objects and composes one frame per tick.

mod config;
mod driver;
mod objects;

pub use config::MixerConfig;
pub use driver::{Frame, FrameOutcome, Mixer, ReloadReport};
