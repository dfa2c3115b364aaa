//! The scene graph: scenes (drawable leaves) and groups (containers, offscreen surfaces,
//! `use` references), stored in an arena keyed by stable handles.

mod graph;
mod module;
mod node;
mod render;
mod transform;

pub use graph::{NodeChanges, SceneGraph};
pub use module::{
    ClearModule, SceneDrawCtx, SceneInput, SceneModule, SceneModuleFactory, SceneModuleRegistry,
    SceneOptions, ShapeKind, ShapeModule, fill_input,
};
pub use node::{
    GroupPayload, Node, NodeDecl, NodeDeclKind, NodeFactory, NodeHandle, NodeKind, OffscreenMode,
    ScenePayload,
};
pub use render::{FrameStats, RenderEnv, SourceView};
pub use transform::{MXJS_OUTPUTS, NodeTransform, TRANSFORM_KEYS};
