//! Timers: keyframed animations written into live object properties.

mod decl;
mod engine;

pub use decl::{AnimMode, AnimationDecl, EndPolicy, TimerDecl};
pub use engine::{Timer, TimerState, sample};
