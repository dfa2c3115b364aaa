use crate::foundation::core::{Color, Point};
use crate::foundation::error::{AvmixError, AvmixResult};
use crate::props::{PropType, PropValue};
use crate::render::composite::{mix_f32, to_f32};
use crate::render::{GpuContext, ProgramId, UniformLocation, UniformValue};
use crate::transition::module::{OptionDecl, TransitionInputs, TransitionModule};

/// Fade through a solid color: `from` to color over the first half, color to `to` after.
#[derive(Debug)]
pub struct Fade {
    color: Color,
    color_loc: Option<UniformLocation>,
}

impl Fade {
    pub fn new(opts: &serde_json::Map<String, serde_json::Value>) -> AvmixResult<Self> {
        let color = match opts.get("color") {
            None => Color::BLACK,
            Some(v) => {
                let s = v
                    .as_str()
                    .ok_or_else(|| AvmixError::config("fade.color must be a color string"))?;
                Color::parse(s)?
            }
        };
        Ok(Self {
            color,
            color_loc: None,
        })
    }

    fn premul(&self) -> [f32; 4] {
        to_f32(self.color.to_premul().to_array())
    }
}

impl TransitionModule for Fade {
    fn name(&self) -> &str {
        "fade"
    }

    fn options(&self) -> Vec<OptionDecl> {
        vec![OptionDecl {
            name: "color".to_owned(),
            ty: PropType::Color,
            default: PropValue::Color(Color::BLACK),
        }]
    }

    fn setup_gl(&mut self, ctx: &mut dyn GpuContext, program: ProgramId) -> AvmixResult<()> {
        self.color_loc = ctx.uniform_location(program, "color");
        Ok(())
    }

    fn upload_uniforms(&self, ctx: &mut dyn GpuContext, program: ProgramId) -> AvmixResult<()> {
        if let Some(loc) = self.color_loc {
            ctx.set_uniform(program, loc, &UniformValue::Vec4(self.premul()))?;
        }
        Ok(())
    }

    fn shade(&self, uv: Point, ratio: f64, inputs: &TransitionInputs<'_>) -> [f32; 4] {
        let c = self.premul();
        if ratio < 0.5 {
            mix_f32(inputs.from_color(uv), c, (ratio * 2.0) as f32)
        } else {
            mix_f32(c, inputs.to_color(uv), ((ratio - 0.5) * 2.0) as f32)
        }
    }

    fn shader_body(&self) -> Option<String> {
        Some(
            "uniform vec4 color;\n\
             vec4 transition(vec2 uv) {\n\
             \x20 if (progress < 0.5) return mix(getFromColor(uv), color, progress * 2.0);\n\
             \x20 return mix(color, getToColor(uv), (progress - 0.5) * 2.0);\n\
             }\n"
                .to_owned(),
        )
    }
}
