//! Rendering capabilities: textures, the software canvas, and the GPU context interface.

pub mod canvas;
pub mod composite;
pub mod cpu;
pub mod gpu;
pub mod texture;

pub use canvas::{Brush, Canvas, ShaderFn};
pub use cpu::CpuCanvas;
pub use gpu::{GpuContext, ProgramId, UniformLocation, UniformValue, assemble_fragment_shader};
pub use texture::Texture;
