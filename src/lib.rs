#![forbid(unsafe_code)]

//! Playlist-driven audio/video mixer.
//!
//! A JSON playlist declares sequences of media sources, a scene graph of scenes and groups
//! that consume them, transitions, timers and scripts. The [`Mixer`] keeps those objects
//! alive across playlist reloads and incremental updates, and composes one frame per tick.

pub mod expression;
pub mod foundation;
pub mod media;
pub mod mixer;
pub mod playlist;
pub mod props;
pub mod render;
pub mod scene;
pub mod sequence;
pub mod timer;
pub mod timing;
pub mod transition;
pub mod units;

pub use foundation::core::{Color, ReferenceSpace, Rgba8Premul};
pub use foundation::error::{AvmixError, AvmixResult};
pub use media::{BuiltinProvider, MediaProvider};
pub use mixer::{Frame, FrameOutcome, Mixer, MixerConfig, ReloadReport};
pub use playlist::Playlist;
pub use scene::{FrameStats, SceneGraph};
pub use sequence::{Sequence, SequenceState, SequenceStatus};
