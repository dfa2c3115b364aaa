//! Transition effects: blending two frames by a ratio in `[0, 1]`.
//!
//! Every module has a software path (a per-pixel `shade` function drawn through a canvas
//! shader brush) and a GPU path (a gl-transitions style fragment shader), except `gltrans`,
//! which is GPU-only.

mod cut;
mod fade;
mod gl;
mod gltrans;
mod instance;
mod mix;
mod module;
mod registry;
mod spec;
mod swipe;

pub use cut::HardCut;
pub use fade::Fade;
pub use gl::GlProgram;
pub use gltrans::{DeclaredUniform, GlTrans, UniformKind, parse_uniforms};
pub use instance::Transition;
pub use mix::Mix;
pub use module::{OptionDecl, TransitionInputs, TransitionModule};
pub use registry::{TransitionFactory, TransitionOptions, TransitionRegistry};
pub use spec::TransitionSpec;
pub use swipe::{Swipe, SwipeMode, SwipeOrigin};
