//! Typed, named properties shared by timers, scripts and the update protocol.

mod target;
mod value;

pub use target::{PropTarget, PropertyGraph, graph_read, graph_write, read_target, write_target};
pub use value::{PropType, PropValue, PropertyHost};
