use crate::foundation::core::{Affine, BezPath, Point};
use crate::foundation::error::AvmixResult;
use crate::props::{PropType, PropValue};
use crate::render::{Brush, Canvas, GpuContext, ProgramId, Texture, assemble_fragment_shader};

/// The (up to) two frames a transition blends. Missing inputs sample as transparent.
#[derive(Clone, Copy, Debug, Default)]
pub struct TransitionInputs<'a> {
    pub from: Option<&'a Texture>,
    pub to: Option<&'a Texture>,
}

impl<'a> TransitionInputs<'a> {
    pub fn new(from: Option<&'a Texture>, to: Option<&'a Texture>) -> Self {
        Self { from, to }
    }

    pub fn from_color(&self, uv: Point) -> [f32; 4] {
        self.from.map_or([0.0; 4], |t| t.sample(uv))
    }

    pub fn to_color(&self, uv: Point) -> [f32; 4] {
        self.to.map_or([0.0; 4], |t| t.sample(uv))
    }
}

/// A declared module option: exposed as a property on the owning transition.
#[derive(Clone, Debug, PartialEq)]
pub struct OptionDecl {
    pub name: String,
    pub ty: PropType,
    pub default: PropValue,
}

/// Effect contract shared by sequence transitions and scene mixes.
///
/// `ratio` is always in `[0, 1]`: 0 shows only `from`, 1 shows only `to`. Implementations keep
/// no per-frame state, so calling `apply` twice with the same arguments draws the same pixels.
pub trait TransitionModule: std::fmt::Debug {
    fn name(&self) -> &str;

    /// Options this module understands, with their types and defaults.
    fn options(&self) -> Vec<OptionDecl> {
        Vec::new()
    }

    /// Whether the software canvas path is implemented.
    fn supports_software(&self) -> bool {
        true
    }

    /// One-time software setup.
    fn setup(&mut self) -> AvmixResult<()> {
        Ok(())
    }

    /// One-time GPU setup once the program built from [`Self::get_shader_src`] is linked.
    fn setup_gl(&mut self, _ctx: &mut dyn GpuContext, _program: ProgramId) -> AvmixResult<()> {
        Ok(())
    }

    /// Upload module-specific uniforms before a GPU draw.
    fn upload_uniforms(&self, _ctx: &mut dyn GpuContext, _program: ProgramId) -> AvmixResult<()> {
        Ok(())
    }

    /// Premultiplied output color at `uv` for the software path.
    fn shade(&self, uv: Point, ratio: f64, inputs: &TransitionInputs<'_>) -> [f32; 4];

    /// Draw one blended frame into `path` on the canvas.
    fn apply(
        &self,
        canvas: &mut dyn Canvas,
        ratio: f64,
        path: &BezPath,
        matrix: Affine,
        inputs: TransitionInputs<'_>,
    ) -> AvmixResult<()> {
        let ratio = ratio.clamp(0.0, 1.0);
        let shader = |uv: Point| self.shade(uv, ratio, &inputs);
        canvas.fill_path(path, matrix, Brush::Shader(&shader), 1.0)
    }

    /// GLSL body defining `vec4 transition(vec2 uv)` in gl-transitions convention.
    fn shader_body(&self) -> Option<String>;

    /// Complete fragment shader for the GPU path.
    fn get_shader_src(&self) -> Option<String> {
        self.shader_body().map(|b| assemble_fragment_shader(&b))
    }
}
