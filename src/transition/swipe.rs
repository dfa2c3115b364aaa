use crate::foundation::core::Point;
use crate::foundation::error::{AvmixError, AvmixResult};
use crate::props::{PropType, PropValue};
use crate::transition::module::{OptionDecl, TransitionInputs, TransitionModule};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SwipeMode {
    /// `to` is revealed by a moving edge.
    Swipe,
    /// `to` pushes `from` out.
    Push,
    /// `to` grows while `from` is compressed.
    Squeeze,
    /// `to` scales up from the origin over `from`.
    Grow,
    /// `from` slides out over a static `to`.
    Swap,
}

impl SwipeMode {
    pub fn parse(s: &str) -> AvmixResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "swipe" | "wipe" => Ok(Self::Swipe),
            "push" => Ok(Self::Push),
            "squeeze" => Ok(Self::Squeeze),
            "grow" => Ok(Self::Grow),
            "swap" => Ok(Self::Swap),
            other => Err(AvmixError::config(format!("unknown swipe mode '{other}'"))),
        }
    }
}

/// Edge or corner the effect starts from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SwipeOrigin {
    Left,
    Right,
    Top,
    Bottom,
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl SwipeOrigin {
    pub fn parse(s: &str) -> AvmixResult<Self> {
        match s.trim().to_ascii_lowercase().replace(['-', '_'], "").as_str() {
            "left" => Ok(Self::Left),
            "right" => Ok(Self::Right),
            "top" => Ok(Self::Top),
            "bottom" => Ok(Self::Bottom),
            "topleft" => Ok(Self::TopLeft),
            "topright" => Ok(Self::TopRight),
            "bottomleft" => Ok(Self::BottomLeft),
            "bottomright" => Ok(Self::BottomRight),
            other => Err(AvmixError::config(format!("unknown swipe origin '{other}'"))),
        }
    }

    /// Active axes, as `[u, v]` weights.
    fn axis(self) -> [f64; 2] {
        match self {
            Self::Left | Self::Right => [1.0, 0.0],
            Self::Top | Self::Bottom => [0.0, 1.0],
            _ => [1.0, 1.0],
        }
    }

    /// Whether each axis is mirrored so that the origin sits at 0.
    fn flip(self) -> [bool; 2] {
        match self {
            Self::Left | Self::Top | Self::TopLeft => [false, false],
            Self::Right | Self::TopRight => [true, false],
            Self::Bottom | Self::BottomLeft => [false, true],
            Self::BottomRight => [true, true],
        }
    }
}

/// Directional wipes. All modes work in origin space: `s = 0` at the origin edge, `s = 1`
/// at the opposite one.
#[derive(Debug)]
pub struct Swipe {
    mode: SwipeMode,
    origin: SwipeOrigin,
}

impl Swipe {
    pub fn new(opts: &serde_json::Map<String, serde_json::Value>) -> AvmixResult<Self> {
        let text = |key: &str, default: &str| -> AvmixResult<String> {
            match opts.get(key) {
                None => Ok(default.to_owned()),
                Some(v) => v
                    .as_str()
                    .map(str::to_owned)
                    .ok_or_else(|| AvmixError::config(format!("swipe.{key} must be a string"))),
            }
        };
        Ok(Self {
            mode: SwipeMode::parse(&text("mode", "swipe")?)?,
            origin: SwipeOrigin::parse(&text("from", "left")?)?,
        })
    }

    pub fn with(mode: SwipeMode, origin: SwipeOrigin) -> Self {
        Self { mode, origin }
    }

    fn flip(&self, p: [f64; 2]) -> Point {
        let f = self.origin.flip();
        Point::new(
            if f[0] { 1.0 - p[0] } else { p[0] },
            if f[1] { 1.0 - p[1] } else { p[1] },
        )
    }

    /// Replace active components of `s` by those of `t`.
    fn select(&self, s: [f64; 2], t: [f64; 2]) -> [f64; 2] {
        let a = self.origin.axis();
        [
            if a[0] > 0.0 { t[0] } else { s[0] },
            if a[1] > 0.0 { t[1] } else { s[1] },
        ]
    }

    fn below(&self, s: [f64; 2], r: f64) -> bool {
        let a = self.origin.axis();
        (a[0] == 0.0 || s[0] < r) && (a[1] == 0.0 || s[1] < r)
    }

    fn above(&self, s: [f64; 2], r: f64) -> bool {
        let a = self.origin.axis();
        (a[0] == 0.0 || s[0] >= r) && (a[1] == 0.0 || s[1] >= r)
    }

    fn measure(&self, s: [f64; 2]) -> f64 {
        let a = self.origin.axis();
        (s[0] * a[0] + s[1] * a[1]) / (a[0] + a[1])
    }

    fn inside_grow(&self, s: [f64; 2], r: f64) -> bool {
        let a = self.origin.axis();
        let test = |i: usize| {
            if a[i] > 0.0 {
                s[i] < r
            } else {
                (s[i] - 0.5).abs() < r * 0.5
            }
        };
        test(0) && test(1)
    }

    fn glsl_helpers(&self) -> String {
        let a = self.origin.axis();
        let f = self.origin.flip();
        let comp = |flip: bool, c: &str| {
            if flip {
                format!("1.0 - p.{c}")
            } else {
                format!("p.{c}")
            }
        };
        format!(
            "const vec2 _axis = vec2({:.1}, {:.1});\n\
             vec2 _flip(vec2 p) {{ return vec2({}, {}); }}\n\
             bool _below(vec2 s, float r) {{ return (_axis.x == 0.0 || s.x < r) && (_axis.y == 0.0 || s.y < r); }}\n\
             bool _above(vec2 s, float r) {{ return (_axis.x == 0.0 || s.x >= r) && (_axis.y == 0.0 || s.y >= r); }}\n\
             float _m(vec2 s) {{ return dot(s, _axis) / (_axis.x + _axis.y); }}\n\
             bool _grow(vec2 s, float r) {{\n\
             \x20 bool x = _axis.x > 0.0 ? s.x < r : abs(s.x - 0.5) < r * 0.5;\n\
             \x20 bool y = _axis.y > 0.0 ? s.y < r : abs(s.y - 0.5) < r * 0.5;\n\
             \x20 return x && y;\n\
             }}\n",
            a[0],
            a[1],
            comp(f[0], "x"),
            comp(f[1], "y"),
        )
    }
}

impl TransitionModule for Swipe {
    fn name(&self) -> &str {
        "swipe"
    }

    fn options(&self) -> Vec<OptionDecl> {
        vec![
            OptionDecl {
                name: "mode".to_owned(),
                ty: PropType::String,
                default: PropValue::Str("swipe".to_owned()),
            },
            OptionDecl {
                name: "from".to_owned(),
                ty: PropType::String,
                default: PropValue::Str("left".to_owned()),
            },
        ]
    }

    fn shade(&self, uv: Point, ratio: f64, inputs: &TransitionInputs<'_>) -> [f32; 4] {
        let r = ratio;
        if r <= 0.0 {
            return inputs.from_color(uv);
        }
        if r >= 1.0 {
            return inputs.to_color(uv);
        }
        let sp = self.flip([uv.x, uv.y]);
        let s = [sp.x, sp.y];
        match self.mode {
            SwipeMode::Swipe => {
                if self.measure(s) < r {
                    inputs.to_color(uv)
                } else {
                    inputs.from_color(uv)
                }
            }
            SwipeMode::Push => {
                if self.below(s, r) {
                    let t = self.select(s, [s[0] - r + 1.0, s[1] - r + 1.0]);
                    inputs.to_color(self.flip(t))
                } else if self.above(s, r) {
                    let t = self.select(s, [s[0] - r, s[1] - r]);
                    inputs.from_color(self.flip(t))
                } else {
                    [0.0; 4]
                }
            }
            SwipeMode::Squeeze => {
                if self.below(s, r) {
                    let t = self.select(s, [s[0] / r, s[1] / r]);
                    inputs.to_color(self.flip(t))
                } else if self.above(s, r) {
                    let t = self.select(s, [(s[0] - r) / (1.0 - r), (s[1] - r) / (1.0 - r)]);
                    inputs.from_color(self.flip(t))
                } else {
                    [0.0; 4]
                }
            }
            SwipeMode::Grow => {
                if self.inside_grow(s, r) {
                    let centred = [(s[0] - 0.5) / r + 0.5, (s[1] - 0.5) / r + 0.5];
                    let t = self.select(centred, [s[0] / r, s[1] / r]);
                    inputs.to_color(self.flip(t))
                } else {
                    inputs.from_color(uv)
                }
            }
            SwipeMode::Swap => {
                let q = self.select(s, [s[0] + r, s[1] + r]);
                if self.below(q, 1.0) {
                    inputs.from_color(self.flip(q))
                } else {
                    inputs.to_color(uv)
                }
            }
        }
    }

    fn shader_body(&self) -> Option<String> {
        let main = match self.mode {
            SwipeMode::Swipe => "  return _m(s) < progress ? getToColor(uv) : getFromColor(uv);\n",
            SwipeMode::Push => {
                "  if (_below(s, progress)) return getToColor(_flip(s - progress * _axis + _axis));\n\
                 \x20 if (_above(s, progress)) return getFromColor(_flip(s - progress * _axis));\n\
                 \x20 return vec4(0.0);\n"
            }
            SwipeMode::Squeeze => {
                "  if (_below(s, progress)) return getToColor(_flip(mix(s, s / progress, _axis)));\n\
                 \x20 if (_above(s, progress)) return getFromColor(_flip(mix(s, (s - progress) / (1.0 - progress), _axis)));\n\
                 \x20 return vec4(0.0);\n"
            }
            SwipeMode::Grow => {
                "  if (_grow(s, progress)) return getToColor(_flip(mix((s - 0.5) / progress + 0.5, s / progress, _axis)));\n\
                 \x20 return getFromColor(uv);\n"
            }
            SwipeMode::Swap => {
                "  vec2 q = s + progress * _axis;\n\
                 \x20 if (_below(q, 1.0)) return getFromColor(_flip(q));\n\
                 \x20 return getToColor(uv);\n"
            }
        };
        Some(format!(
            "{}vec4 transition(vec2 uv) {{\n\
             \x20 if (progress <= 0.0) return getFromColor(uv);\n\
             \x20 if (progress >= 1.0) return getToColor(uv);\n\
             \x20 vec2 s = _flip(uv);\n\
             {main}}}\n",
            self.glsl_helpers()
        ))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/transition/swipe.rs"]
mod tests;
