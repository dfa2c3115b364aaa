use crate::foundation::error::{AvmixError, AvmixResult};
use crate::render::gpu::PROGRESS_UNIFORM;
use crate::render::{GpuContext, ProgramId, UniformLocation, UniformValue};
use crate::transition::module::{TransitionInputs, TransitionModule};

/// A linked transition program with its host-bound uniforms resolved.
#[derive(Clone, Debug)]
pub struct GlProgram {
    program: ProgramId,
    progress: Option<UniformLocation>,
    aspect: Option<UniformLocation>,
}

impl GlProgram {
    /// Compile `module`'s shader and let it resolve its own uniforms.
    pub fn build(module: &mut dyn TransitionModule, ctx: &mut dyn GpuContext) -> AvmixResult<Self> {
        let src = module.get_shader_src().ok_or_else(|| {
            AvmixError::resource(format!("transition '{}' has no shader path", module.name()))
        })?;
        let program = ctx.compile_program(&src)?;
        let progress = ctx.uniform_location(program, PROGRESS_UNIFORM);
        let aspect = ctx.uniform_location(program, "ratio");
        module.setup_gl(ctx, program)?;
        Ok(Self {
            program,
            progress,
            aspect,
        })
    }

    pub fn program(&self) -> ProgramId {
        self.program
    }

    /// Bind inputs and uniforms for one draw. Missing inputs are left unbound.
    pub fn bind(
        &self,
        module: &dyn TransitionModule,
        ctx: &mut dyn GpuContext,
        ratio: f64,
        aspect: f64,
        inputs: TransitionInputs<'_>,
    ) -> AvmixResult<()> {
        if let Some(from) = inputs.from {
            ctx.bind_texture(self.program, 0, from)?;
        }
        if let Some(to) = inputs.to {
            ctx.bind_texture(self.program, 1, to)?;
        }
        if let Some(loc) = self.progress {
            let r = ratio.clamp(0.0, 1.0) as f32;
            ctx.set_uniform(self.program, loc, &UniformValue::Float(r))?;
        }
        // gl-transitions names the output aspect ratio `ratio`.
        if let Some(loc) = self.aspect {
            ctx.set_uniform(self.program, loc, &UniformValue::Float(aspect as f32))?;
        }
        module.upload_uniforms(ctx, self.program)
    }
}
