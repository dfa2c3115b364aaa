//! Sandboxed expression hooks.
//!
//! Playlist hooks (`fun`, `mode`, `postfun`, `mxjs`, `script`) are small expressions compiled
//! against a declared list of inputs. They cannot reach any other mixer state.

mod ast;
mod error;
mod eval;
mod hook;
mod lexer;
mod parser;

pub use eval::Value;
pub use hook::{
    Hook, HookMap, MATRIX_INPUTS, POSTFUN_INPUTS, RATIO_INPUTS, SCRIPT_INPUTS,
};
