use crate::foundation::core::Point;
use crate::transition::module::{TransitionInputs, TransitionModule};

/// No blend: `from` until the midpoint, `to` after. Used when a module fails to load.
#[derive(Debug, Default)]
pub struct HardCut;

impl TransitionModule for HardCut {
    fn name(&self) -> &str {
        "cut"
    }

    fn shade(&self, uv: Point, ratio: f64, inputs: &TransitionInputs<'_>) -> [f32; 4] {
        if ratio < 0.5 {
            inputs.from_color(uv)
        } else {
            inputs.to_color(uv)
        }
    }

    fn shader_body(&self) -> Option<String> {
        Some(
            "vec4 transition(vec2 uv) {\n  return progress < 0.5 ? getFromColor(uv) : getToColor(uv);\n}\n"
                .to_owned(),
        )
    }
}
