use crate::foundation::core::{Affine, BezPath, Point, Rect, Rgba8Premul};
use crate::foundation::error::AvmixResult;
use crate::render::texture::Texture;

/// Per-pixel color function over path-local `uv` (`(0,0)` top-left of the path bounds).
pub type ShaderFn<'a> = &'a dyn Fn(Point) -> [f32; 4];

/// What a path is filled with.
#[derive(Clone, Copy)]
pub enum Brush<'a> {
    Solid(Rgba8Premul),
    /// Texture stretched over the path's bounding box.
    Texture(&'a Texture),
    /// Premultiplied color computed per pixel; used by software transitions.
    Shader(ShaderFn<'a>),
}

/// Software canvas capability.
///
/// Canvas space is centred on the surface with y pointing up, matching playlist coordinates.
pub trait Canvas {
    fn width(&self) -> u32;

    fn height(&self) -> u32;

    fn clear(&mut self, color: Rgba8Premul);

    /// Restrict subsequent fills to `clip` (canvas space), or lift the restriction.
    fn set_clip(&mut self, clip: Option<Rect>);

    fn fill_path(
        &mut self,
        path: &BezPath,
        matrix: Affine,
        brush: Brush<'_>,
        opacity: f32,
    ) -> AvmixResult<()>;

    /// Copy the current pixels out as a texture.
    fn snapshot(&self) -> Texture;
}
