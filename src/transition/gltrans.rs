use std::path::Path;

use tracing::warn;

use crate::foundation::core::Point;
use crate::foundation::error::{AvmixError, AvmixResult};
use crate::props::{PropType, PropValue};
use crate::render::{GpuContext, ProgramId, UniformLocation, UniformValue};
use crate::transition::module::{OptionDecl, TransitionInputs, TransitionModule};

/// Uniform types understood in gl-transitions sources.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UniformKind {
    Float,
    Int,
    Bool,
    Vec2,
    Vec3,
    Vec4,
    IVec2,
}

impl UniformKind {
    fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "float" => Self::Float,
            "int" => Self::Int,
            "bool" => Self::Bool,
            "vec2" => Self::Vec2,
            "vec3" => Self::Vec3,
            "vec4" => Self::Vec4,
            "ivec2" => Self::IVec2,
            _ => return None,
        })
    }

    fn components(self) -> usize {
        match self {
            Self::Float | Self::Int | Self::Bool => 1,
            Self::Vec2 | Self::IVec2 => 2,
            Self::Vec3 => 3,
            Self::Vec4 => 4,
        }
    }

    fn prop_type(self) -> PropType {
        match self {
            Self::Float => PropType::Number,
            Self::Int => PropType::Integer,
            Self::Bool => PropType::Bool,
            _ => PropType::NumberArray,
        }
    }

    fn zero(self) -> UniformValue {
        match self {
            Self::Float => UniformValue::Float(0.0),
            Self::Int => UniformValue::Int(0),
            Self::Bool => UniformValue::Bool(false),
            Self::Vec2 => UniformValue::Vec2([0.0; 2]),
            Self::Vec3 => UniformValue::Vec3([0.0; 3]),
            Self::Vec4 => UniformValue::Vec4([0.0; 4]),
            Self::IVec2 => UniformValue::IVec2([0; 2]),
        }
    }

    /// Build a value from `components` numbers (booleans as 0/1).
    fn from_components(self, c: &[f64]) -> Option<UniformValue> {
        if c.len() != self.components() {
            return None;
        }
        Some(match self {
            Self::Float => UniformValue::Float(c[0] as f32),
            Self::Int => UniformValue::Int(c[0] as i32),
            Self::Bool => UniformValue::Bool(c[0] != 0.0),
            Self::Vec2 => UniformValue::Vec2([c[0] as f32, c[1] as f32]),
            Self::Vec3 => UniformValue::Vec3([c[0] as f32, c[1] as f32, c[2] as f32]),
            Self::Vec4 => {
                UniformValue::Vec4([c[0] as f32, c[1] as f32, c[2] as f32, c[3] as f32])
            }
            Self::IVec2 => UniformValue::IVec2([c[0] as i32, c[1] as i32]),
        })
    }
}

/// A `uniform` declared by the shader body, with its `// = default` annotation.
#[derive(Clone, Debug, PartialEq)]
pub struct DeclaredUniform {
    pub name: String,
    pub kind: UniformKind,
    pub value: UniformValue,
}

/// Names the host binds itself; never exposed as options.
const RESERVED: &[&str] = &["progress", "ratio", "_from", "_to"];

/// Scan GLSL source for `uniform <type> <name>; // = <default>` declarations.
pub fn parse_uniforms(src: &str) -> Vec<DeclaredUniform> {
    let mut out = Vec::new();
    for line in src.lines() {
        let line = line.trim();
        let Some(rest) = line.strip_prefix("uniform ") else {
            continue;
        };
        let (decl, comment) = match rest.split_once("//") {
            Some((d, c)) => (d.trim(), Some(c.trim())),
            None => (rest.trim(), None),
        };
        let decl = decl.trim_end_matches(';').trim();
        let mut words = decl.split_whitespace();
        let (Some(ty), Some(name)) = (words.next(), words.next()) else {
            continue;
        };
        if RESERVED.contains(&name) {
            continue;
        }
        let Some(kind) = UniformKind::parse(ty) else {
            warn!(uniform = name, ty, "unsupported uniform type in transition shader");
            continue;
        };
        let value = comment
            .and_then(|c| c.strip_prefix('='))
            .and_then(|d| parse_default(kind, d.trim()))
            .unwrap_or_else(|| kind.zero());
        out.push(DeclaredUniform {
            name: name.to_owned(),
            kind,
            value,
        });
    }
    out
}

fn parse_default(kind: UniformKind, text: &str) -> Option<UniformValue> {
    let text = text.trim_end_matches(';').trim();
    let inner = match text.find('(') {
        Some(open) => text[open + 1..].trim_end_matches(')'),
        None => text,
    };
    let comps = inner
        .split(',')
        .map(|p| match p.trim() {
            "true" => Some(1.0),
            "false" => Some(0.0),
            n => n.parse::<f64>().ok(),
        })
        .collect::<Option<Vec<_>>>()?;
    // `vec2(1.0)` splats in GLSL.
    if comps.len() == 1 && kind.components() > 1 {
        return kind.from_components(&vec![comps[0]; kind.components()]);
    }
    kind.from_components(&comps)
}

fn value_from_json(kind: UniformKind, v: &serde_json::Value) -> Option<UniformValue> {
    match v {
        serde_json::Value::Bool(b) => kind.from_components(&[if *b { 1.0 } else { 0.0 }]),
        serde_json::Value::Number(n) => kind.from_components(&[n.as_f64()?]),
        serde_json::Value::Array(items) => {
            let c = items
                .iter()
                .map(serde_json::Value::as_f64)
                .collect::<Option<Vec<_>>>()?;
            kind.from_components(&c)
        }
        _ => None,
    }
}

fn uniform_to_prop(v: &UniformValue) -> PropValue {
    let arr = |c: &[f32]| {
        PropValue::Array(c.iter().map(|x| PropValue::Number(f64::from(*x))).collect())
    };
    match v {
        UniformValue::Float(x) => PropValue::Number(f64::from(*x)),
        UniformValue::Int(x) => PropValue::Number(f64::from(*x)),
        UniformValue::Bool(b) => PropValue::Bool(*b),
        UniformValue::Vec2(c) => arr(c.as_slice()),
        UniformValue::Vec3(c) => arr(c.as_slice()),
        UniformValue::Vec4(c) => arr(c.as_slice()),
        UniformValue::IVec2(c) => {
            PropValue::Array(c.iter().map(|x| PropValue::Number(f64::from(*x))).collect())
        }
    }
}

/// Arbitrary gl-transitions shader. GPU only.
#[derive(Debug)]
pub struct GlTrans {
    body: String,
    uniforms: Vec<DeclaredUniform>,
    locations: Vec<Option<UniformLocation>>,
}

impl GlTrans {
    /// Build from options: `src` is shader text or a path to a `.glsl` file; other keys
    /// override declared uniform defaults.
    pub fn new(opts: &serde_json::Map<String, serde_json::Value>) -> AvmixResult<Self> {
        let src = opts
            .get("src")
            .and_then(serde_json::Value::as_str)
            .ok_or_else(|| AvmixError::config("gltrans requires a 'src' option"))?;
        Self::from_source(src, opts)
    }

    /// Load a `.glsl` file named directly as a transition type.
    pub fn from_file(
        path: &Path,
        opts: &serde_json::Map<String, serde_json::Value>,
    ) -> AvmixResult<Self> {
        let body = std::fs::read_to_string(path).map_err(|e| {
            AvmixError::resource(format!("read shader {}: {e}", path.display()))
        })?;
        Self::from_body(body, opts)
    }

    fn from_source(
        src: &str,
        opts: &serde_json::Map<String, serde_json::Value>,
    ) -> AvmixResult<Self> {
        if !src.contains('\n') && src.trim().ends_with(".glsl") {
            return Self::from_file(Path::new(src.trim()), opts);
        }
        Self::from_body(src.to_owned(), opts)
    }

    fn from_body(
        body: String,
        opts: &serde_json::Map<String, serde_json::Value>,
    ) -> AvmixResult<Self> {
        if !body.contains("transition(") {
            return Err(AvmixError::config(
                "gltrans source does not define vec4 transition(vec2 uv)",
            ));
        }
        let mut uniforms = parse_uniforms(&body);
        for u in &mut uniforms {
            if let Some(v) = opts.get(&u.name) {
                u.value = value_from_json(u.kind, v).ok_or_else(|| {
                    AvmixError::config(format!("invalid value {v} for uniform '{}'", u.name))
                })?;
            }
        }
        let locations = vec![None; uniforms.len()];
        Ok(Self {
            body,
            uniforms,
            locations,
        })
    }

    pub fn uniforms(&self) -> &[DeclaredUniform] {
        &self.uniforms
    }
}

impl TransitionModule for GlTrans {
    fn name(&self) -> &str {
        "gltrans"
    }

    fn options(&self) -> Vec<OptionDecl> {
        let mut out = vec![OptionDecl {
            name: "src".to_owned(),
            ty: PropType::String,
            default: PropValue::Str(String::new()),
        }];
        out.extend(self.uniforms.iter().map(|u| OptionDecl {
            name: u.name.clone(),
            ty: u.kind.prop_type(),
            default: uniform_to_prop(&u.value),
        }));
        out
    }

    fn supports_software(&self) -> bool {
        false
    }

    fn setup_gl(&mut self, ctx: &mut dyn GpuContext, program: ProgramId) -> AvmixResult<()> {
        self.locations = self
            .uniforms
            .iter()
            .map(|u| ctx.uniform_location(program, &u.name))
            .collect();
        Ok(())
    }

    fn upload_uniforms(&self, ctx: &mut dyn GpuContext, program: ProgramId) -> AvmixResult<()> {
        for (u, loc) in self.uniforms.iter().zip(&self.locations) {
            if let Some(loc) = loc {
                ctx.set_uniform(program, *loc, &u.value)?;
            }
        }
        Ok(())
    }

    fn shade(&self, _uv: Point, _ratio: f64, _inputs: &TransitionInputs<'_>) -> [f32; 4] {
        [0.0; 4]
    }

    fn shader_body(&self) -> Option<String> {
        Some(self.body.clone())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/transition/gltrans.rs"]
mod tests;
