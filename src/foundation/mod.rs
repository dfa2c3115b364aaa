pub mod core;
pub mod error;
pub(crate) mod json;
pub(crate) mod math;
