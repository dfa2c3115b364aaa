use std::collections::{HashMap, HashSet};

use tracing::{debug, warn};

use crate::foundation::core::{Affine, Point, Rect, ReferenceSpace, Rgba8Premul, Shape};
use crate::foundation::error::AvmixResult;
use crate::render::{Brush, Canvas, CpuCanvas, Texture};
use crate::scene::graph::SceneGraph;
use crate::scene::module::{SceneDrawCtx, SceneInput};
use crate::scene::node::{GroupPayload, Node, NodeHandle, NodeKind, OffscreenMode};
use crate::transition::Transition;

/// Frames a sequence offers to the scenes that consume it this frame.
#[derive(Clone, Debug, Default)]
pub struct SourceView<'a> {
    pub current: Option<Texture>,
    /// Incoming frame while the sequence is transitioning.
    pub next: Option<Texture>,
    pub ratio: f64,
    pub transition: Option<&'a Transition>,
}

/// Per-frame inputs to a scene-graph walk.
pub struct RenderEnv<'a> {
    /// Output reference space.
    pub space: ReferenceSpace,
    /// Clock time, passed to `mxjs` hooks.
    pub t: f64,
    pub maxdepth: u32,
    /// Sequence frames by sequence id.
    pub sources: &'a HashMap<String, SourceView<'a>>,
}

/// Counters from one rendered frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub drawn_scenes: u32,
    /// `use` expansions performed.
    pub use_instances: u32,
    /// `use` expansions (or offscreen cycles) cut off by the depth bound.
    pub skipped_depth: u32,
    pub offscreen_groups: u32,
    /// Sources shown as a placeholder ("no signal" or "signal lost").
    pub placeholders: u32,
    /// Placeholders for sources that delivered frames before going quiet.
    pub signal_lost: u32,
}

#[derive(Debug)]
enum ItemKind {
    Scene {
        handle: NodeHandle,
        width: f64,
        height: f64,
    },
    Surface {
        texture: Texture,
        bounds: Rect,
        opacity: f32,
    },
}

/// One entry of a surface's display list.
#[derive(Debug)]
struct DrawItem {
    z: f64,
    order: usize,
    matrix: Affine,
    /// Clip rectangle in the coordinates of the enclosing surface.
    clip: Option<Rect>,
    kind: ItemKind,
}

impl DrawItem {
    fn local_rect(&self) -> Rect {
        match &self.kind {
            ItemKind::Scene { width, height, .. } => {
                Rect::from_center_size(Point::ORIGIN, (*width, *height))
            }
            ItemKind::Surface { bounds, .. } => *bounds,
        }
    }

    fn bounds(&self) -> Rect {
        self.matrix.transform_rect_bbox(self.local_rect())
    }
}

/// A resolved scene source: a sequence's frames or an offscreen group's pixels.
enum Resolved<'a> {
    View(&'a SourceView<'a>),
    Group(Texture),
}

impl Resolved<'_> {
    fn primary(&self) -> Option<&Texture> {
        match self {
            Self::View(v) => v.current.as_ref().or(v.next.as_ref()),
            Self::Group(t) => Some(t),
        }
    }
}

struct Walker<'g, 'e> {
    graph: &'g SceneGraph,
    env: &'e RenderEnv<'e>,
    surfaces: HashMap<NodeHandle, CpuCanvas>,
    used_surfaces: HashSet<NodeHandle>,
    textures: HashMap<NodeHandle, (Texture, Rect)>,
    in_progress: HashSet<NodeHandle>,
    /// `use` expansions spent this frame, per `use` group.
    expansions: HashMap<NodeHandle, u32>,
    exhausted: HashSet<NodeHandle>,
    stats: FrameStats,
}

/// Longest side, in pixels, of an offscreen surface: twice the output's longest side.
fn surface_limit(space: ReferenceSpace) -> u32 {
    (space.width.max(space.height) * 2.0).ceil().clamp(64.0, 16384.0) as u32
}

impl SceneGraph {
    /// Draw every root into `canvas`.
    ///
    /// Nodes are collected into one display list per surface (the output, or the nearest
    /// offscreen group) and drawn in ascending `zorder`, ties in traversal order. Offscreen
    /// groups used as scene sources are rendered first, in declaration order.
    pub fn render(&mut self, canvas: &mut dyn Canvas, env: &RenderEnv<'_>) -> AvmixResult<FrameStats> {
        let surfaces = std::mem::take(&mut self.surfaces);
        let mut walker = Walker {
            graph: &*self,
            env,
            surfaces,
            used_surfaces: HashSet::new(),
            textures: HashMap::new(),
            in_progress: HashSet::new(),
            expansions: HashMap::new(),
            exhausted: HashSet::new(),
            stats: FrameStats::default(),
        };
        let result = walker.run(canvas);
        let Walker {
            mut surfaces,
            used_surfaces,
            stats,
            ..
        } = walker;
        surfaces.retain(|h, _| used_surfaces.contains(h));
        self.surfaces = surfaces;
        result.map(|()| stats)
    }
}

impl<'g, 'e> Walker<'g, 'e> {
    fn run(&mut self, canvas: &mut dyn Canvas) -> AvmixResult<()> {
        let graph = self.graph;
        for h in graph.walk_order() {
            let Some(scene) = graph.get(h).and_then(Node::as_scene) else {
                continue;
            };
            for src in &scene.sources {
                if self.env.sources.contains_key(src) {
                    continue;
                }
                if let Some(gh) = graph.handle(src) {
                    if graph.get(gh).is_some_and(Node::is_group) {
                        self.group_texture(gh, self.env.space, 0);
                    }
                }
            }
        }

        let mut items = Vec::new();
        for &root in graph.roots() {
            self.collect(root, Affine::IDENTITY, self.env.space, 0, None, &mut items);
        }
        self.draw_items(canvas, items, Affine::IDENTITY)
    }

    fn collect(
        &mut self,
        h: NodeHandle,
        parent: Affine,
        space: ReferenceSpace,
        depth: u32,
        clip: Option<Rect>,
        items: &mut Vec<DrawItem>,
    ) {
        let graph: &'g SceneGraph = self.graph;
        let Some(node) = graph.get(h) else {
            return;
        };
        let tf = &node.transform;
        if !tf.active {
            return;
        }
        let rc = match tf.resolve(space) {
            Ok(rc) => rc,
            Err(err) => {
                debug!(id = node.id().unwrap_or(""), error = %err, "unresolvable coordinates; node skipped");
                return;
            }
        };
        let mut local = tf.local_matrix(&rc, space);
        if tf.has_mxjs() {
            match tf.eval_hook(self.env.t, &rc, space, node.id()) {
                Some(hooked) => local = hooked * local,
                None => return,
            }
        }
        let base = if tf.untransform { Affine::IDENTITY } else { parent };
        let matrix = base * local;

        match &node.kind {
            NodeKind::Scene(_) => items.push(DrawItem {
                z: tf.zorder,
                order: items.len(),
                matrix,
                clip,
                kind: ItemKind::Scene {
                    handle: h,
                    width: rc.width,
                    height: rc.height,
                },
            }),
            NodeKind::Group(g) if g.renders_offscreen() => {
                // `mask` and `color` surfaces are only visible through scenes using them.
                if matches!(g.offscreen, OffscreenMode::Mask | OffscreenMode::Color) {
                    return;
                }
                if let Some((texture, bounds)) = self.group_texture(h, space, depth) {
                    items.push(DrawItem {
                        z: tf.zorder,
                        order: items.len(),
                        matrix,
                        clip,
                        kind: ItemKind::Surface {
                            texture,
                            bounds,
                            opacity: g.opacity as f32,
                        },
                    });
                }
            }
            NodeKind::Group(g) => {
                let child_space = if g.reference {
                    ReferenceSpace::new(rc.width, rc.height)
                } else {
                    space
                };
                let clip = if g.clip {
                    self.group_clip(node, matrix, rc.width, rc.height, clip)
                } else {
                    clip
                };
                self.collect_children(h, node, g, matrix, child_space, depth, clip, items);
            }
        }
    }

    /// `clip` narrowed to the group rectangle under `matrix`.
    fn group_clip(
        &self,
        node: &Node,
        matrix: Affine,
        width: f64,
        height: f64,
        clip: Option<Rect>,
    ) -> Option<Rect> {
        if !node.transform.has_explicit_size() {
            debug!(id = node.id().unwrap_or(""), property = "clip", "clip needs an explicit width and height");
            return clip;
        }
        let own = matrix.transform_rect_bbox(Rect::from_center_size(Point::ORIGIN, (width, height)));
        Some(clip.map_or(own, |c| c.intersect(own)))
    }

    #[allow(clippy::too_many_arguments)]
    fn collect_children(
        &mut self,
        h: NodeHandle,
        node: &'g Node,
        g: &'g GroupPayload,
        matrix: Affine,
        space: ReferenceSpace,
        depth: u32,
        clip: Option<Rect>,
        items: &mut Vec<DrawItem>,
    ) {
        if g.reverse {
            for &c in g.children().iter().rev() {
                self.collect(c, matrix, space, depth, clip, items);
            }
        } else {
            for &c in g.children() {
                self.collect(c, matrix, space, depth, clip, items);
            }
        }

        let Some(target) = g.use_id.as_deref() else {
            return;
        };
        let bound = u32::try_from(g.use_depth).unwrap_or(self.env.maxdepth);
        if depth >= bound {
            self.stats.skipped_depth += 1;
            debug!(id = node.id().unwrap_or(""), depth, "use depth reached");
            return;
        }
        // Sibling `use`s of a common ancestor would otherwise expand exponentially.
        let spent = self.expansions.entry(h).or_default();
        if *spent >= bound {
            self.stats.skipped_depth += 1;
            if self.exhausted.insert(h) {
                warn!(id = node.id().unwrap_or(""), property = "use", budget = bound, "use expansion budget exhausted for this frame");
            }
            return;
        }
        *spent += 1;
        match self.graph.handle(target) {
            Some(t) => {
                self.stats.use_instances += 1;
                self.collect(t, matrix, space, depth + 1, clip, items);
            }
            None => debug!(id = node.id().unwrap_or(""), property = "use", target, "use target not found"),
        }
    }

    /// Render (or fetch this frame's cached render of) an offscreen group.
    fn group_texture(
        &mut self,
        h: NodeHandle,
        space: ReferenceSpace,
        depth: u32,
    ) -> Option<(Texture, Rect)> {
        if let Some(done) = self.textures.get(&h) {
            return Some(done.clone());
        }
        let graph: &'g SceneGraph = self.graph;
        let node = graph.get(h)?;
        let g = node.as_group()?;
        if !self.in_progress.insert(h) {
            self.stats.skipped_depth += 1;
            return None;
        }
        let result = self.render_surface(h, node, g, space, depth);
        self.in_progress.remove(&h);
        match result {
            Ok(Some(done)) => {
                self.textures.insert(h, done.clone());
                Some(done)
            }
            Ok(None) => None,
            Err(err) => {
                warn!(id = node.id().unwrap_or(""), error = %err, "offscreen group not rendered");
                None
            }
        }
    }

    fn render_surface(
        &mut self,
        h: NodeHandle,
        node: &'g Node,
        g: &'g GroupPayload,
        space: ReferenceSpace,
        depth: u32,
    ) -> AvmixResult<Option<(Texture, Rect)>> {
        let tf = &node.transform;
        let rc = tf.resolve(space)?;
        let child_space = if g.reference {
            ReferenceSpace::new(rc.width, rc.height)
        } else {
            space
        };
        let mut items = Vec::new();
        self.collect_children(h, node, g, Affine::IDENTITY, child_space, depth, None, &mut items);

        let bounds = if tf.has_explicit_size() {
            Rect::from_center_size(Point::ORIGIN, (rc.width, rc.height))
        } else {
            match items.iter().map(DrawItem::bounds).reduce(|a, b| a.union(b)) {
                Some(b) => b,
                None => return Ok(None),
            }
        };
        if !bounds.is_finite() || bounds.width() <= 0.0 || bounds.height() <= 0.0 {
            return Ok(None);
        }

        let mut scaler = g.scaler.max(1.0);
        let limit = surface_limit(self.env.space);
        let longest = bounds.width().max(bounds.height());
        if longest / scaler > f64::from(limit) {
            warn!(
                id = node.id().unwrap_or(""),
                width = bounds.width(),
                height = bounds.height(),
                limit,
                "offscreen surface too large; rendering at reduced resolution"
            );
            scaler = longest / f64::from(limit);
        }
        let pw = (bounds.width() / scaler).ceil().max(1.0) as u32;
        let ph = (bounds.height() / scaler).ceil().max(1.0) as u32;
        let mut surface = match self.surfaces.remove(&h) {
            Some(s) if s.width() == pw && s.height() == ph => s,
            _ => CpuCanvas::new(pw, ph)?,
        };
        surface.clear(match g.offscreen {
            OffscreenMode::Color | OffscreenMode::Dual => g.back_color.to_premul(),
            OffscreenMode::None | OffscreenMode::Mask => Rgba8Premul::transparent(),
        });

        let view = Affine::scale(1.0 / scaler) * Affine::translate(-bounds.center().to_vec2());
        let drawn = self.draw_items(&mut surface, items, view);
        let texture = surface.snapshot();
        self.surfaces.insert(h, surface);
        self.used_surfaces.insert(h);
        drawn?;

        self.stats.offscreen_groups += 1;
        let texture = if g.offscreen == OffscreenMode::Mask {
            texture.to_luma_mask()
        } else {
            texture
        };
        Ok(Some((texture, bounds)))
    }

    fn draw_items(
        &mut self,
        canvas: &mut dyn Canvas,
        mut items: Vec<DrawItem>,
        view: Affine,
    ) -> AvmixResult<()> {
        items.sort_by(|a, b| a.z.total_cmp(&b.z).then(a.order.cmp(&b.order)));
        let drawn = self.draw_sorted(canvas, &items, view);
        canvas.set_clip(None);
        drawn
    }

    fn draw_sorted(
        &mut self,
        canvas: &mut dyn Canvas,
        items: &[DrawItem],
        view: Affine,
    ) -> AvmixResult<()> {
        for item in items {
            let matrix = view * item.matrix;
            canvas.set_clip(item.clip.map(|c| view.transform_rect_bbox(c)));
            match &item.kind {
                ItemKind::Surface {
                    texture,
                    bounds,
                    opacity,
                } => {
                    canvas.fill_path(&bounds.to_path(0.1), matrix, Brush::Texture(texture), *opacity)?;
                }
                ItemKind::Scene {
                    handle,
                    width,
                    height,
                } => self.draw_scene(canvas, *handle, matrix, *width, *height),
            }
        }
        Ok(())
    }

    fn draw_scene(
        &mut self,
        canvas: &mut dyn Canvas,
        h: NodeHandle,
        matrix: Affine,
        width: f64,
        height: f64,
    ) {
        let graph: &'g SceneGraph = self.graph;
        let Some(node) = graph.get(h) else {
            return;
        };
        let Some(scene) = node.as_scene() else {
            return;
        };
        let Some(module) = scene.module() else {
            return;
        };

        let env: &'e RenderEnv<'e> = self.env;
        let mut resolved = Vec::with_capacity(scene.sources.len());
        for id in &scene.sources {
            if let Some(view) = env.sources.get(id) {
                resolved.push(Resolved::View(view));
            } else if let Some((tex, _)) = graph.handle(id).and_then(|gh| self.textures.get(&gh)) {
                resolved.push(Resolved::Group(tex.clone()));
            }
        }

        let input = match resolved.as_slice() {
            [] => SceneInput::None,
            [Resolved::View(v)] => match (&v.current, &v.next) {
                (Some(from), Some(to)) => SceneInput::Blend {
                    from: Some(from),
                    to: Some(to),
                    ratio: v.ratio,
                    transition: v.transition,
                },
                (Some(t), None) | (None, Some(t)) => SceneInput::Single(t),
                (None, None) => SceneInput::None,
            },
            [Resolved::Group(t)] => SceneInput::Single(t),
            [a, b, ..] => SceneInput::Blend {
                from: a.primary(),
                to: b.primary(),
                ratio: scene.mix_ratio,
                transition: scene.mix.as_ref(),
            },
        };

        let mut ctx = SceneDrawCtx {
            canvas,
            matrix,
            width,
            height,
            options: &scene.options,
            input,
            has_sources: !scene.sources.is_empty(),
        };
        match module.draw(&mut ctx) {
            Ok(()) => self.stats.drawn_scenes += 1,
            Err(err) => warn!(id = node.id().unwrap_or(""), error = %err, "scene draw failed"),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/render.rs"]
mod tests;
