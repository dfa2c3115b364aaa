use std::sync::Arc;

use tracing::{debug, warn};

use crate::expression::{Hook, RATIO_INPUTS};
use crate::foundation::core::{Affine, BezPath};
use crate::foundation::error::{AvmixError, AvmixResult};
use crate::props::{PropType, PropValue, PropertyHost};
use crate::render::{Canvas, GpuContext};
use crate::transition::cut::HardCut;
use crate::transition::gl::GlProgram;
use crate::transition::module::{TransitionInputs, TransitionModule};
use crate::transition::registry::TransitionRegistry;
use crate::transition::spec::TransitionSpec;

/// A live transition: its declaration, the loaded module (or the hard-cut fallback), and the
/// compiled `fun` hook.
#[derive(Debug)]
pub struct Transition {
    spec: TransitionSpec,
    module: Box<dyn TransitionModule>,
    loaded: bool,
    fun: Option<Hook>,
    registry: Arc<TransitionRegistry>,
    gl: Option<GlProgram>,
}

impl Transition {
    /// Never fails: load errors leave a hard cut in place and log a warning.
    pub fn new(spec: TransitionSpec, registry: Arc<TransitionRegistry>) -> Self {
        let mut t = Self {
            spec,
            module: Box::new(HardCut),
            loaded: false,
            fun: None,
            registry,
            gl: None,
        };
        t.load_module();
        t.compile_fun();
        t
    }

    fn load_module(&mut self) {
        self.gl = None;
        match self.registry.create(&self.spec.kind, &self.spec.options) {
            Ok(module) => {
                let declared = module.options();
                for key in self.spec.options.keys() {
                    if !declared.iter().any(|o| &o.name == key) {
                        warn!(id = ?self.spec.id, property = %key, kind = %self.spec.kind, "unknown transition option");
                    }
                }
                if !module.supports_software() {
                    warn!(id = ?self.spec.id, kind = %self.spec.kind, "transition is GPU-only; software output uses a hard cut");
                }
                self.module = module;
                self.loaded = true;
            }
            Err(err) => {
                warn!(id = ?self.spec.id, kind = %self.spec.kind, error = %err, "transition failed to load, using hard cut");
                self.module = Box::new(HardCut);
                self.loaded = false;
            }
        }
    }

    fn compile_fun(&mut self) {
        self.fun = self
            .spec
            .fun
            .as_deref()
            .and_then(|src| match Hook::compile(src, RATIO_INPUTS) {
                Ok(h) => Some(h),
                Err(err) => {
                    warn!(id = ?self.spec.id, property = "fun", error = %err, "dropping transition hook");
                    None
                }
            });
    }

    pub fn spec(&self) -> &TransitionSpec {
        &self.spec
    }

    pub fn id(&self) -> Option<&str> {
        self.spec.id.as_deref()
    }

    pub fn dur(&self) -> f64 {
        self.spec.dur
    }

    pub fn module(&self) -> &dyn TransitionModule {
        self.module.as_ref()
    }

    /// Whether software output is a hard cut (load failure or GPU-only module).
    pub fn is_hard_cut(&self) -> bool {
        !self.loaded || !self.module.supports_software()
    }

    /// Replace the declaration on reload. The module is rebuilt only when it changed.
    pub fn update_spec(&mut self, spec: TransitionSpec) {
        if spec == self.spec {
            return;
        }
        let reload = spec.kind != self.spec.kind || spec.options != self.spec.options;
        let refun = spec.fun != self.spec.fun;
        self.spec = spec;
        if reload {
            self.load_module();
        }
        if refun {
            self.compile_fun();
        }
    }

    /// Apply the `fun` hook. Evaluation failures keep the input ratio for this frame.
    pub fn remap(&self, ratio: f64) -> f64 {
        let ratio = ratio.clamp(0.0, 1.0);
        match &self.fun {
            None => ratio,
            Some(hook) => hook.remap_ratio(ratio).unwrap_or_else(|err| {
                debug!(id = ?self.spec.id, error = %err, "transition hook failed");
                ratio
            }),
        }
    }

    /// Software blend of one frame into `path`.
    pub fn render(
        &self,
        canvas: &mut dyn Canvas,
        ratio: f64,
        path: &BezPath,
        matrix: Affine,
        inputs: TransitionInputs<'_>,
    ) -> AvmixResult<()> {
        let ratio = self.remap(ratio);
        if self.module.supports_software() {
            self.module.apply(canvas, ratio, path, matrix, inputs)
        } else {
            HardCut.apply(canvas, ratio, path, matrix, inputs)
        }
    }

    /// Compile the shader program once for a GPU host.
    pub fn prepare_gl(&mut self, ctx: &mut dyn GpuContext) -> AvmixResult<()> {
        if self.gl.is_none() {
            self.gl = Some(GlProgram::build(self.module.as_mut(), ctx)?);
        }
        Ok(())
    }

    /// Bind textures and uniforms for a GPU draw; the host issues the draw call.
    pub fn bind_gl(
        &self,
        ctx: &mut dyn GpuContext,
        ratio: f64,
        aspect: f64,
        inputs: TransitionInputs<'_>,
    ) -> AvmixResult<()> {
        let gl = self
            .gl
            .as_ref()
            .ok_or_else(|| AvmixError::resource("transition program not prepared"))?;
        gl.bind(self.module.as_ref(), ctx, self.remap(ratio), aspect, inputs)
    }
}

impl PropertyHost for Transition {
    fn prop_type(&self, name: &str) -> Option<PropType> {
        match name {
            "id" | "type" | "fun" => Some(PropType::String),
            "dur" => Some(PropType::Number),
            _ => self
                .module
                .options()
                .into_iter()
                .find(|o| o.name == name)
                .map(|o| o.ty)
                .or_else(|| self.spec.options.contains_key(name).then_some(PropType::Any)),
        }
    }

    fn get_property(&self, name: &str) -> Option<PropValue> {
        match name {
            "id" => self.spec.id.clone().map(PropValue::Str),
            "type" => Some(PropValue::Str(self.spec.kind.clone())),
            "dur" => Some(PropValue::Number(self.spec.dur)),
            "fun" => Some(PropValue::Str(self.spec.fun.clone().unwrap_or_default())),
            _ => {
                let declared = self.module.options().into_iter().find(|o| o.name == name);
                match self.spec.options.get(name) {
                    Some(v) => match declared {
                        Some(d) => d.ty.coerce(v).ok(),
                        None => PropValue::from_json(v).ok(),
                    },
                    None => declared.map(|d| d.default),
                }
            }
        }
    }

    fn set_property(&mut self, name: &str, value: PropValue) -> AvmixResult<()> {
        let Some(ty) = self.prop_type(name) else {
            return Err(AvmixError::update(format!(
                "transition has no property '{name}'"
            )));
        };
        if !ty.accepts(&value) {
            return Err(AvmixError::update(format!(
                "property '{name}' expects {ty:?}, got {value:?}"
            )));
        }
        match name {
            "id" => return Err(AvmixError::update("'id' is not updatable")),
            "type" => {
                let mut spec = self.spec.clone();
                spec.kind = value.as_str().unwrap_or_default().to_owned();
                self.update_spec(spec);
            }
            "dur" => {
                let dur = value.as_f64().unwrap_or_default();
                if !dur.is_finite() || dur < 0.0 {
                    return Err(AvmixError::update(format!("invalid transition dur {dur}")));
                }
                self.spec.dur = dur;
            }
            "fun" => {
                let mut spec = self.spec.clone();
                spec.fun = value.as_str().filter(|s| !s.trim().is_empty()).map(str::to_owned);
                self.update_spec(spec);
            }
            _ => {
                let mut spec = self.spec.clone();
                spec.options.insert(name.to_owned(), value.to_json());
                self.update_spec(spec);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/transition/instance.rs"]
mod tests;
