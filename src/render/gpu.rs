use crate::foundation::error::AvmixResult;
use crate::render::texture::Texture;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ProgramId(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct UniformLocation(pub i32);

#[derive(Clone, Debug, PartialEq)]
pub enum UniformValue {
    Float(f32),
    Int(i32),
    Bool(bool),
    Vec2([f32; 2]),
    Vec3([f32; 3]),
    Vec4([f32; 4]),
    IVec2([i32; 2]),
}

/// GPU capability consumed by shader-path transitions. Implemented by the embedding host.
pub trait GpuContext {
    fn compile_program(&mut self, fragment_src: &str) -> AvmixResult<ProgramId>;

    fn uniform_location(&mut self, program: ProgramId, name: &str) -> Option<UniformLocation>;

    fn set_uniform(
        &mut self,
        program: ProgramId,
        location: UniformLocation,
        value: &UniformValue,
    ) -> AvmixResult<()>;

    fn bind_texture(&mut self, program: ProgramId, unit: u32, texture: &Texture)
    -> AvmixResult<()>;
}

/// Texture sampler names bound to units 0 and 1.
pub const FROM_SAMPLER: &str = "_from";
pub const TO_SAMPLER: &str = "_to";
/// Ratio uniform, following the gl-transitions naming.
pub const PROGRESS_UNIFORM: &str = "progress";

/// Wrap a gl-transitions style body (defining `vec4 transition(vec2 uv)`) into a complete
/// fragment shader.
pub fn assemble_fragment_shader(body: &str) -> String {
    let mut s = String::with_capacity(body.len() + 512);
    s.push_str("#version 100\nprecision mediump float;\n");
    s.push_str("varying vec2 _uv;\n");
    s.push_str(&format!("uniform sampler2D {FROM_SAMPLER};\n"));
    s.push_str(&format!("uniform sampler2D {TO_SAMPLER};\n"));
    s.push_str(&format!("uniform float {PROGRESS_UNIFORM};\n"));
    s.push_str("uniform float ratio;\n");
    s.push_str(&format!(
        "vec4 getFromColor(vec2 uv) {{ return texture2D({FROM_SAMPLER}, uv); }}\n"
    ));
    s.push_str(&format!(
        "vec4 getToColor(vec2 uv) {{ return texture2D({TO_SAMPLER}, uv); }}\n"
    ));
    s.push_str(body);
    if !body.ends_with('\n') {
        s.push('\n');
    }
    s.push_str("void main() { gl_FragColor = transition(_uv); }\n");
    s
}

#[cfg(test)]
#[path = "../../tests/unit/render/gpu.rs"]
mod tests;
