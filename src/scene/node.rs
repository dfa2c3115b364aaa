use std::sync::Arc;

use tracing::warn;

use crate::foundation::core::Color;
use crate::foundation::error::{AvmixError, AvmixResult};
use crate::foundation::json::{Object, as_object, is_skipped, opt_str, str_or};
use crate::props::{PropType, PropValue, PropertyHost};
use crate::scene::module::{SceneModule, SceneModuleRegistry, SceneOptions};
use crate::scene::transform::{NodeTransform, TRANSFORM_KEYS};
use crate::sequence::FadePolicy;
use crate::transition::{Transition, TransitionRegistry, TransitionSpec};

const GROUP_KEYS: &[&str] = &[
    "id",
    "type",
    "scenes",
    "opacity",
    "offscreen",
    "scaler",
    "back_color",
    "use",
    "use_depth",
    "reverse",
    "reference",
    "clip",
];

/// Stable arena index of a live node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeHandle(pub(crate) u32);

impl NodeHandle {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// A scene or group as declared in the playlist.
#[derive(Clone, Debug, PartialEq)]
pub struct NodeDecl {
    pub id: Option<String>,
    /// Declared properties, without `scenes`.
    pub object: Object,
    pub kind: NodeDeclKind,
}

#[derive(Clone, Debug, PartialEq)]
pub enum NodeDeclKind {
    Scene { js: String },
    Group { children: Vec<NodeDecl> },
}

impl NodeDecl {
    /// Parse a scene or group. Without a `type`, an object with `scenes` is a group.
    pub fn from_json(v: &serde_json::Value) -> AvmixResult<Self> {
        let obj = as_object(v, "scene")?;
        let id = opt_str(obj, "id")?;
        let is_group = match opt_str(obj, "type")?.as_deref() {
            Some("group") => true,
            Some("scene") => false,
            None => obj.contains_key("scenes"),
            Some(other) => {
                return Err(AvmixError::config(format!(
                    "expected a scene or group, got type '{other}'"
                )));
            }
        };

        let kind = if is_group {
            let mut children = Vec::new();
            match obj.get("scenes") {
                None | Some(serde_json::Value::Null) => {}
                Some(serde_json::Value::Array(items)) => {
                    for item in items {
                        if item.as_object().is_some_and(is_skipped) {
                            continue;
                        }
                        match Self::from_json(item) {
                            Ok(child) => children.push(child),
                            Err(err) => {
                                warn!(id = id.as_deref().unwrap_or(""), property = "scenes", error = %err, "dropping group child");
                            }
                        }
                    }
                }
                Some(other) => {
                    return Err(AvmixError::config(format!(
                        "'scenes' must be an array, got {other}"
                    )));
                }
            }
            NodeDeclKind::Group { children }
        } else {
            NodeDeclKind::Scene {
                js: str_or(obj, "js", "")?,
            }
        };

        let mut object = obj.clone();
        object.remove("scenes");
        Ok(Self { id, object, kind })
    }

    pub fn is_group(&self) -> bool {
        matches!(self.kind, NodeDeclKind::Group { .. })
    }

    /// Ids of this node and its descendants, depth first.
    pub fn ids(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_ids(&mut out);
        out
    }

    fn collect_ids<'a>(&'a self, out: &mut Vec<&'a str>) {
        if let Some(id) = &self.id {
            out.push(id);
        }
        if let NodeDeclKind::Group { children } = &self.kind {
            for c in children {
                c.collect_ids(out);
            }
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OffscreenMode {
    #[default]
    None,
    /// Alpha and luma only.
    Mask,
    /// Alpha and RGB, cleared to `back_color`.
    Color,
    /// Like `Color`, and also drawn in place.
    Dual,
}

impl OffscreenMode {
    pub fn parse(s: &str) -> AvmixResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "none" => Ok(Self::None),
            "mask" => Ok(Self::Mask),
            "color" => Ok(Self::Color),
            "dual" => Ok(Self::Dual),
            other => Err(AvmixError::config(format!("unknown offscreen mode '{other}'"))),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Mask => "mask",
            Self::Color => "color",
            Self::Dual => "dual",
        }
    }
}

#[derive(Debug)]
pub struct ScenePayload {
    js: String,
    module: Option<Box<dyn SceneModule>>,
    pub options: SceneOptions,
    /// Sequence or offscreen group ids, in blend order.
    pub sources: Vec<String>,
    pub mix: Option<Transition>,
    pub mix_ratio: f64,
    pub volume: f64,
    pub fade: FadePolicy,
    transitions: Arc<TransitionRegistry>,
}

impl ScenePayload {
    pub fn js(&self) -> &str {
        &self.js
    }

    /// `None` when the module failed to load; the scene then draws nothing.
    pub fn module(&self) -> Option<&dyn SceneModule> {
        self.module.as_deref()
    }

    fn set_mix(&mut self, value: &PropValue) -> AvmixResult<()> {
        let spec = match value {
            PropValue::Str(s) if s.trim().is_empty() => {
                self.mix = None;
                return Ok(());
            }
            PropValue::Str(kind) => TransitionSpec {
                kind: kind.trim().to_owned(),
                ..TransitionSpec::default()
            },
            PropValue::Json(v) => TransitionSpec::from_json(v)?,
            other => {
                return Err(AvmixError::update(format!(
                    "'mix' expects a transition object or type name, got {other:?}"
                )));
            }
        };
        match &mut self.mix {
            Some(t) => t.update_spec(spec),
            None => self.mix = Some(Transition::new(spec, self.transitions.clone())),
        }
        Ok(())
    }
}

#[derive(Clone, Debug)]
pub struct GroupPayload {
    pub(crate) children: Vec<NodeHandle>,
    pub opacity: f64,
    pub offscreen: OffscreenMode,
    /// Offscreen surfaces are allocated at `1/scaler` resolution.
    pub scaler: f64,
    pub back_color: Color,
    pub use_id: Option<String>,
    /// Bound on nested `use` expansions; negative uses the mixer's `maxdepth`.
    pub use_depth: i64,
    pub reverse: bool,
    pub reference: bool,
    /// Clip descendants to the group rectangle. Needs an explicit size.
    pub clip: bool,
}

impl Default for GroupPayload {
    fn default() -> Self {
        Self {
            children: Vec::new(),
            opacity: 1.0,
            offscreen: OffscreenMode::None,
            scaler: 1.0,
            back_color: Color::TRANSPARENT,
            use_id: None,
            use_depth: -1,
            reverse: false,
            reference: false,
            clip: false,
        }
    }
}

impl GroupPayload {
    pub fn children(&self) -> &[NodeHandle] {
        &self.children
    }

    /// Whether children are drawn through an offscreen surface.
    pub fn renders_offscreen(&self) -> bool {
        self.offscreen != OffscreenMode::None || self.opacity < 1.0
    }
}

#[derive(Debug)]
pub enum NodeKind {
    Scene(ScenePayload),
    Group(GroupPayload),
}

/// Registries a node needs to instantiate its scene module or mix transition.
#[derive(Clone, Debug, Default)]
pub struct NodeFactory {
    pub modules: Arc<SceneModuleRegistry>,
    pub transitions: Arc<TransitionRegistry>,
}

/// A live scene-graph node.
#[derive(Debug)]
pub struct Node {
    id: Option<String>,
    marker: u64,
    pub transform: NodeTransform,
    pub kind: NodeKind,
}

impl Node {
    /// Build a node from its declaration. Children are attached by the graph.
    ///
    /// Invalid properties are dropped with a warning; the node keeps their defaults.
    pub fn build(decl: &NodeDecl, factory: &NodeFactory, marker: u64) -> Self {
        let id = decl.id.clone();
        let kind = match &decl.kind {
            NodeDeclKind::Scene { js } => {
                let module = match factory.modules.create(js) {
                    Ok(m) => Some(m),
                    Err(err) => {
                        warn!(id = id.as_deref().unwrap_or(""), property = "js", error = %err, "scene is inert");
                        None
                    }
                };
                let options = module
                    .as_ref()
                    .map(|m| m.options().into_iter().map(|o| (o.name, o.default)).collect())
                    .unwrap_or_default();
                NodeKind::Scene(ScenePayload {
                    js: js.clone(),
                    module,
                    options,
                    sources: Vec::new(),
                    mix: None,
                    mix_ratio: 0.0,
                    volume: 1.0,
                    fade: FadePolicy::None,
                    transitions: factory.transitions.clone(),
                })
            }
            NodeDeclKind::Group { .. } => NodeKind::Group(GroupPayload::default()),
        };

        let mut node = Self {
            id,
            marker,
            transform: NodeTransform::default(),
            kind,
        };
        for (key, value) in &decl.object {
            if key.starts_with('_') || matches!(key.as_str(), "id" | "type" | "js" | "scenes" | "skip") {
                continue;
            }
            let Some(ty) = node.prop_type(key) else {
                warn!(id = node.id().unwrap_or(""), property = %key, "unknown property ignored");
                continue;
            };
            let value = match (ty, value) {
                (PropType::StringArray, serde_json::Value::String(_)) => {
                    serde_json::Value::Array(vec![value.clone()])
                }
                _ => value.clone(),
            };
            if let Err(err) = ty.coerce(&value).and_then(|v| node.set_property(key, v)) {
                warn!(id = node.id().unwrap_or(""), property = %key, error = %err, "invalid property ignored");
            }
        }
        node
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub(crate) fn clear_id(&mut self) {
        self.id = None;
    }

    /// Instance marker: unchanged for as long as this node lives, unique per graph.
    pub fn marker(&self) -> u64 {
        self.marker
    }

    pub fn is_group(&self) -> bool {
        matches!(self.kind, NodeKind::Group(_))
    }

    pub fn as_scene(&self) -> Option<&ScenePayload> {
        match &self.kind {
            NodeKind::Scene(s) => Some(s),
            NodeKind::Group(_) => None,
        }
    }

    pub fn as_scene_mut(&mut self) -> Option<&mut ScenePayload> {
        match &mut self.kind {
            NodeKind::Scene(s) => Some(s),
            NodeKind::Group(_) => None,
        }
    }

    pub fn as_group(&self) -> Option<&GroupPayload> {
        match &self.kind {
            NodeKind::Group(g) => Some(g),
            NodeKind::Scene(_) => None,
        }
    }

    pub(crate) fn as_group_mut(&mut self) -> Option<&mut GroupPayload> {
        match &mut self.kind {
            NodeKind::Group(g) => Some(g),
            NodeKind::Scene(_) => None,
        }
    }

    /// Every writable property, used to diff a node against its reloaded declaration.
    pub fn property_names(&self) -> Vec<String> {
        let mut names: Vec<String> = TRANSFORM_KEYS.iter().map(|k| (*k).to_owned()).collect();
        match &self.kind {
            NodeKind::Scene(s) => {
                names.extend(
                    ["sources", "mix", "mix_ratio", "volume", "fade"]
                        .iter()
                        .map(|k| (*k).to_owned()),
                );
                names.extend(s.options.keys().cloned());
            }
            NodeKind::Group(_) => {
                names.extend(GROUP_KEYS[3..].iter().map(|k| (*k).to_owned()));
            }
        }
        names
    }
}

fn number(name: &str, value: &PropValue) -> AvmixResult<f64> {
    value
        .as_f64()
        .filter(|v| v.is_finite())
        .ok_or_else(|| AvmixError::update(format!("'{name}' expects a finite number, got {value:?}")))
}

fn flag(name: &str, value: &PropValue) -> AvmixResult<bool> {
    value
        .as_bool()
        .ok_or_else(|| AvmixError::update(format!("'{name}' expects a boolean, got {value:?}")))
}

impl PropertyHost for Node {
    fn prop_type(&self, name: &str) -> Option<PropType> {
        if name == "id" {
            return Some(PropType::String);
        }
        if let Some(ty) = NodeTransform::prop_type(name) {
            return Some(ty);
        }
        match &self.kind {
            NodeKind::Scene(s) => match name {
                "js" | "fade" => Some(PropType::String),
                "sources" => Some(PropType::StringArray),
                "mix" => Some(PropType::Any),
                "mix_ratio" | "volume" => Some(PropType::Number),
                _ => s
                    .module
                    .as_ref()
                    .and_then(|m| m.options().into_iter().find(|o| o.name == name))
                    .map(|o| o.ty),
            },
            NodeKind::Group(_) => match name {
                "opacity" | "scaler" => Some(PropType::Number),
                "offscreen" | "use" => Some(PropType::String),
                "back_color" => Some(PropType::Color),
                "use_depth" => Some(PropType::Integer),
                "reverse" | "reference" | "clip" => Some(PropType::Bool),
                _ => None,
            },
        }
    }

    fn get_property(&self, name: &str) -> Option<PropValue> {
        if name == "id" {
            return self.id.clone().map(PropValue::Str);
        }
        if let Some(v) = self.transform.get(name) {
            return Some(v);
        }
        match &self.kind {
            NodeKind::Scene(s) => match name {
                "js" => Some(PropValue::Str(s.js.clone())),
                "sources" => Some(PropValue::Array(
                    s.sources.iter().cloned().map(PropValue::Str).collect(),
                )),
                "mix" => Some(match &s.mix {
                    Some(t) => PropValue::Json(t.spec().to_json()),
                    None => PropValue::Str(String::new()),
                }),
                "mix_ratio" => Some(PropValue::Number(s.mix_ratio)),
                "volume" => Some(PropValue::Number(s.volume)),
                "fade" => Some(PropValue::Str(s.fade.as_str().to_owned())),
                _ => s.options.get(name).cloned(),
            },
            NodeKind::Group(g) => match name {
                "opacity" => Some(PropValue::Number(g.opacity)),
                "scaler" => Some(PropValue::Number(g.scaler)),
                "offscreen" => Some(PropValue::Str(g.offscreen.as_str().to_owned())),
                "use" => Some(PropValue::Str(g.use_id.clone().unwrap_or_default())),
                "back_color" => Some(PropValue::Color(g.back_color)),
                "use_depth" => Some(PropValue::Number(g.use_depth as f64)),
                "reverse" => Some(PropValue::Bool(g.reverse)),
                "reference" => Some(PropValue::Bool(g.reference)),
                "clip" => Some(PropValue::Bool(g.clip)),
                _ => None,
            },
        }
    }

    fn set_property(&mut self, name: &str, value: PropValue) -> AvmixResult<()> {
        let ty = self.prop_type(name).ok_or_else(|| {
            AvmixError::update(format!(
                "'{}' has no property '{name}'",
                self.id().unwrap_or("<anonymous>")
            ))
        })?;
        if !ty.accepts(&value) {
            return Err(AvmixError::update(format!(
                "property '{name}' expects {ty:?}, got {value:?}"
            )));
        }
        if name == "id" {
            return Err(AvmixError::update("'id' is not updatable"));
        }
        if NodeTransform::prop_type(name).is_some() {
            return self.transform.set(name, value);
        }

        match &mut self.kind {
            NodeKind::Scene(s) => match name {
                "js" => return Err(AvmixError::update("'js' cannot change after creation")),
                "sources" => {
                    let PropValue::Array(items) = value else {
                        return Err(AvmixError::update("'sources' expects a list of ids"));
                    };
                    s.sources = items
                        .iter()
                        .filter_map(|i| i.as_str().map(str::to_owned))
                        .collect();
                }
                "mix" => s.set_mix(&value)?,
                "mix_ratio" => s.mix_ratio = number(name, &value)?.clamp(0.0, 1.0),
                "volume" => {
                    let v = number(name, &value)?;
                    if v < 0.0 {
                        return Err(AvmixError::update(format!("volume must be >= 0, got {v}")));
                    }
                    s.volume = v;
                }
                "fade" => s.fade = FadePolicy::parse(value.as_str().unwrap_or_default())?,
                _ => {
                    s.options.insert(name.to_owned(), value);
                }
            },
            NodeKind::Group(g) => match name {
                "opacity" => g.opacity = number(name, &value)?.clamp(0.0, 1.0),
                "scaler" => {
                    let v = number(name, &value)?;
                    if v < 1.0 {
                        return Err(AvmixError::update(format!("scaler must be >= 1, got {v}")));
                    }
                    g.scaler = v;
                }
                "offscreen" => {
                    g.offscreen = OffscreenMode::parse(value.as_str().unwrap_or_default())?;
                }
                "use" => {
                    g.use_id = value
                        .as_str()
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(str::to_owned);
                }
                "back_color" => {
                    g.back_color = value
                        .as_color()
                        .ok_or_else(|| AvmixError::update("'back_color' expects a color"))?;
                }
                "use_depth" => g.use_depth = number(name, &value)? as i64,
                "reverse" => g.reverse = flag(name, &value)?,
                "reference" => g.reference = flag(name, &value)?,
                "clip" => g.clip = flag(name, &value)?,
                _ => {
                    return Err(AvmixError::update(format!("group has no property '{name}'")));
                }
            },
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/node.rs"]
mod tests;
