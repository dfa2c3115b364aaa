use std::collections::BTreeMap;

use crate::foundation::core::{Affine, BezPath, Color, Ellipse, Point, Rect, RoundedRect, Shape};
use crate::foundation::error::{AvmixError, AvmixResult};
use crate::props::{PropType, PropValue};
use crate::render::{Brush, Canvas, Texture};
use crate::transition::{HardCut, OptionDecl, Transition, TransitionInputs, TransitionModule};

const PATH_TOLERANCE: f64 = 0.1;

/// Live module option values keyed by option name.
pub type SceneOptions = BTreeMap<String, PropValue>;

/// What a scene fills its path with this frame.
#[derive(Clone, Copy, Debug)]
pub enum SceneInput<'a> {
    /// No source resolved.
    None,
    Single(&'a Texture),
    /// Two frames blended by a transition; `None` transition means a hard cut.
    Blend {
        from: Option<&'a Texture>,
        to: Option<&'a Texture>,
        ratio: f64,
        transition: Option<&'a Transition>,
    },
}

/// Everything a module needs to draw one scene instance.
pub struct SceneDrawCtx<'a> {
    pub canvas: &'a mut dyn Canvas,
    /// Scene-local to canvas space. The scene rectangle is centred on the local origin.
    pub matrix: Affine,
    pub width: f64,
    pub height: f64,
    pub options: &'a SceneOptions,
    pub input: SceneInput<'a>,
    /// Whether the scene declares any sources, resolved or not.
    pub has_sources: bool,
}

impl SceneDrawCtx<'_> {
    pub fn option(&self, name: &str) -> Option<&PropValue> {
        self.options.get(name)
    }
}

/// Drawing behaviour selected by a scene's `js`.
pub trait SceneModule: std::fmt::Debug {
    fn name(&self) -> &str;

    fn options(&self) -> Vec<OptionDecl>;

    /// Outline of a `width` x `height` scene centred on the origin.
    fn path(&self, width: f64, height: f64, _options: &SceneOptions) -> BezPath {
        Rect::from_center_size(Point::ORIGIN, (width, height)).to_path(PATH_TOLERANCE)
    }

    /// Fill the scene path with its input.
    fn draw(&self, ctx: &mut SceneDrawCtx<'_>) -> AvmixResult<()> {
        let path = self.path(ctx.width, ctx.height, ctx.options);
        fill_input(ctx, &path)
    }
}

/// Fill `path` with the scene input: a texture, a transition blend, or nothing.
pub fn fill_input(ctx: &mut SceneDrawCtx<'_>, path: &BezPath) -> AvmixResult<()> {
    match ctx.input {
        SceneInput::None => Ok(()),
        SceneInput::Single(tex) => ctx.canvas.fill_path(path, ctx.matrix, Brush::Texture(tex), 1.0),
        SceneInput::Blend {
            from,
            to,
            ratio,
            transition,
        } => {
            let inputs = TransitionInputs::new(from, to);
            match transition {
                Some(t) => t.render(ctx.canvas, ratio, path, ctx.matrix, inputs),
                None => HardCut.apply(ctx.canvas, ratio, path, ctx.matrix, inputs),
            }
        }
    }
}

fn decl(name: &str, ty: PropType, default: PropValue) -> OptionDecl {
    OptionDecl {
        name: name.to_owned(),
        ty,
        default,
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShapeKind {
    Rect,
    Ellipse,
    Rounded,
}

impl ShapeKind {
    pub fn parse(s: &str) -> AvmixResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rect" | "" => Ok(Self::Rect),
            "ellipse" | "circle" => Ok(Self::Ellipse),
            "rounded" | "rrect" => Ok(Self::Rounded),
            other => Err(AvmixError::config(format!("unknown shape '{other}'"))),
        }
    }
}

/// Default scene module: a rectangle, ellipse or rounded rectangle textured with the scene
/// input, or filled with `fill` when the scene has no sources.
#[derive(Debug, Default)]
pub struct ShapeModule;

impl SceneModule for ShapeModule {
    fn name(&self) -> &str {
        "shape"
    }

    fn options(&self) -> Vec<OptionDecl> {
        vec![
            decl("shape", PropType::String, PropValue::Str("rect".to_owned())),
            decl("radius", PropType::Number, PropValue::Number(0.0)),
            decl("fill", PropType::Color, PropValue::Color(Color::TRANSPARENT)),
            decl("img_fit", PropType::String, PropValue::Str("stretch".to_owned())),
        ]
    }

    fn path(&self, width: f64, height: f64, options: &SceneOptions) -> BezPath {
        let kind = options
            .get("shape")
            .and_then(PropValue::as_str)
            .and_then(|s| ShapeKind::parse(s).ok())
            .unwrap_or(ShapeKind::Rect);
        let rect = Rect::from_center_size(Point::ORIGIN, (width, height));
        match kind {
            ShapeKind::Rect => rect.to_path(PATH_TOLERANCE),
            ShapeKind::Ellipse => {
                Ellipse::from_rect(rect).to_path(PATH_TOLERANCE)
            }
            ShapeKind::Rounded => {
                // Percent of the smaller side, capped at a half-side.
                let pct = options
                    .get("radius")
                    .and_then(PropValue::as_f64)
                    .unwrap_or(0.0)
                    .clamp(0.0, 50.0);
                let r = pct * width.abs().min(height.abs()) / 100.0;
                RoundedRect::from_rect(rect, r).to_path(PATH_TOLERANCE)
            }
        }
    }

    fn draw(&self, ctx: &mut SceneDrawCtx<'_>) -> AvmixResult<()> {
        let path = self.path(ctx.width, ctx.height, ctx.options);
        if matches!(ctx.input, SceneInput::None) {
            if ctx.has_sources {
                return Ok(());
            }
            let fill = ctx
                .option("fill")
                .and_then(PropValue::as_color)
                .unwrap_or(Color::TRANSPARENT);
            if fill.a <= 0.0 {
                return Ok(());
            }
            return ctx
                .canvas
                .fill_path(&path, ctx.matrix, Brush::Solid(fill.to_premul()), 1.0);
        }
        fill_input(ctx, &path)
    }
}

/// Fills the scene rectangle with `color` and ignores sources.
#[derive(Debug, Default)]
pub struct ClearModule;

impl SceneModule for ClearModule {
    fn name(&self) -> &str {
        "clear"
    }

    fn options(&self) -> Vec<OptionDecl> {
        vec![decl("color", PropType::Color, PropValue::Color(Color::BLACK))]
    }

    fn draw(&self, ctx: &mut SceneDrawCtx<'_>) -> AvmixResult<()> {
        let color = ctx
            .option("color")
            .and_then(PropValue::as_color)
            .unwrap_or(Color::BLACK);
        let path = self.path(ctx.width, ctx.height, ctx.options);
        ctx.canvas
            .fill_path(&path, ctx.matrix, Brush::Solid(color.to_premul()), 1.0)
    }
}

/// Constructor for one scene module.
pub type SceneModuleFactory = fn() -> Box<dyn SceneModule>;

/// Scene modules keyed by `js` name.
#[derive(Clone, Debug)]
pub struct SceneModuleRegistry {
    factories: BTreeMap<String, SceneModuleFactory>,
}

impl Default for SceneModuleRegistry {
    fn default() -> Self {
        let mut r = Self::empty();
        r.register("shape", || Box::new(ShapeModule));
        r.register("clear", || Box::new(ClearModule));
        r
    }
}

impl SceneModuleRegistry {
    /// Module used when a scene has no `js`.
    pub const DEFAULT: &'static str = "shape";

    pub fn empty() -> Self {
        Self {
            factories: BTreeMap::new(),
        }
    }

    pub fn register(&mut self, name: &str, factory: SceneModuleFactory) {
        self.factories
            .insert(name.trim().to_ascii_lowercase(), factory);
    }

    pub fn create(&self, js: &str) -> AvmixResult<Box<dyn SceneModule>> {
        let key = js.trim().to_ascii_lowercase();
        let key = if key.is_empty() { Self::DEFAULT.to_owned() } else { key };
        self.factories
            .get(&key)
            .map(|f| f())
            .ok_or_else(|| AvmixError::resource(format!("unknown scene module '{js}'")))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/module.rs"]
mod tests;
