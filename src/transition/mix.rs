use crate::foundation::core::Point;
use crate::render::composite::mix_f32;
use crate::transition::module::{TransitionInputs, TransitionModule};

/// Linear cross-fade.
#[derive(Debug, Default)]
pub struct Mix;

impl TransitionModule for Mix {
    fn name(&self) -> &str {
        "mix"
    }

    fn shade(&self, uv: Point, ratio: f64, inputs: &TransitionInputs<'_>) -> [f32; 4] {
        mix_f32(inputs.from_color(uv), inputs.to_color(uv), ratio as f32)
    }

    fn shader_body(&self) -> Option<String> {
        Some(
            "vec4 transition(vec2 uv) {\n  return mix(getFromColor(uv), getToColor(uv), progress);\n}\n"
                .to_owned(),
        )
    }
}
