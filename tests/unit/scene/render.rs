use std::sync::Arc;

use serde_json::json;

use super::*;
use crate::props::{PropValue, PropertyHost};
use crate::scene::node::{NodeDecl, NodeFactory};
use crate::transition::{TransitionRegistry, TransitionSpec};

const RED: [u8; 4] = [255, 0, 0, 255];
const GREEN: [u8; 4] = [0, 255, 0, 255];
const BLUE: [u8; 4] = [0, 0, 255, 255];
const CLEAR: [u8; 4] = [0, 0, 0, 0];

fn graph(v: serde_json::Value) -> SceneGraph {
    let decls: Vec<NodeDecl> = v
        .as_array()
        .unwrap()
        .iter()
        .map(|d| NodeDecl::from_json(d).unwrap())
        .collect();
    let mut g = SceneGraph::new(NodeFactory::default());
    g.apply_roots(&decls);
    g
}

fn render_with(
    g: &mut SceneGraph,
    sources: &HashMap<String, SourceView<'_>>,
    maxdepth: u32,
) -> (CpuCanvas, FrameStats) {
    let mut canvas = CpuCanvas::new(40, 40).unwrap();
    let env = RenderEnv {
        space: ReferenceSpace::new(40.0, 40.0),
        t: 0.0,
        maxdepth,
        sources,
    };
    let stats = g.render(&mut canvas, &env).unwrap();
    (canvas, stats)
}

fn render(g: &mut SceneGraph) -> (CpuCanvas, FrameStats) {
    render_with(g, &HashMap::new(), 100)
}

fn solid(px: [u8; 4]) -> Texture {
    Texture::solid(4, 4, Rgba8Premul::from_array(px))
}

fn square(id: &str, fill: &str) -> serde_json::Value {
    json!({"id": id, "units": "pix", "width": 10, "height": 10, "fill": fill})
}

#[test]
fn cyclic_use_stops_at_maxdepth() {
    let mut g = graph(json!([
        {"id": "g", "use": "g", "scenes": [square("s", "red")]}
    ]));
    let (canvas, stats) = render_with(&mut g, &HashMap::new(), 5);
    assert_eq!(stats.use_instances, 5);
    assert_eq!(stats.skipped_depth, 1);
    assert_eq!(stats.drawn_scenes, 6);
    assert_eq!(canvas.pixel(20, 20), RED);
}

#[test]
fn use_depth_overrides_maxdepth() {
    let mut g = graph(json!([
        {"id": "g", "use": "g", "use_depth": 2, "scenes": [square("s", "red")]}
    ]));
    let (_, stats) = render_with(&mut g, &HashMap::new(), 5);
    assert_eq!(stats.use_instances, 2);
    assert_eq!(stats.drawn_scenes, 3);
}

#[test]
fn use_draws_another_subtree_in_place() {
    let mut g = graph(json!([
        {"id": "a", "units": "pix", "x": -10, "scenes": [square("s", "blue")]},
        {"id": "b", "units": "pix", "x": 20, "use": "a", "scenes": []}
    ]));
    let (canvas, stats) = render(&mut g);
    assert_eq!(stats.use_instances, 1);
    assert_eq!(canvas.pixel(10, 20), BLUE);
    // 20 + -10 from the referenced group's own offset.
    assert_eq!(canvas.pixel(30, 20), BLUE);
}

#[test]
fn zorder_beats_declaration_order() {
    let mut g = graph(json!([
        {"id": "top", "units": "pix", "width": 10, "height": 10, "fill": "red", "zorder": 1},
        {"id": "under", "units": "pix", "width": 10, "height": 10, "fill": "green"}
    ]));
    assert_eq!(render(&mut g).0.pixel(20, 20), RED);
}

#[test]
fn zorder_is_scoped_to_the_nearest_offscreen_group() {
    let tree = |offscreen: &str| {
        json!([
            {"id": "g", "offscreen": offscreen, "scenes": [
                {"id": "inner", "units": "pix", "width": 10, "height": 10, "fill": "green", "zorder": 10}
            ]},
            {"id": "outer", "units": "pix", "width": 10, "height": 10, "fill": "red", "zorder": 5}
        ])
    };
    // A plain group does not scope z-order: the child competes with the root scene.
    assert_eq!(render(&mut graph(tree("none"))).0.pixel(20, 20), GREEN);
    // A dual group is drawn as one surface at its own zorder.
    let mut g = graph(tree("dual"));
    let (canvas, stats) = render(&mut g);
    assert_eq!(canvas.pixel(20, 20), RED);
    assert_eq!(stats.offscreen_groups, 1);
}

#[test]
fn inactive_nodes_and_hooks_skip_subtrees() {
    let mut g = graph(json!([
        {"id": "g", "active": false, "scenes": [square("a", "red")]},
        {"id": "b", "units": "pix", "width": 10, "height": 10, "fill": "blue",
         "mxjs": {"active": "t > 1"}}
    ]));
    let (canvas, stats) = render(&mut g);
    assert_eq!(stats.drawn_scenes, 0);
    assert_eq!(canvas.pixel(20, 20), CLEAR);
}

#[test]
fn sequence_frames_fill_the_scene() {
    let mut g = graph(json!([
        {"id": "s", "units": "pix", "width": 10, "height": 10, "sources": ["seq"]}
    ]));
    let mut sources = HashMap::new();
    sources.insert(
        "seq".to_owned(),
        SourceView {
            current: Some(solid(BLUE)),
            ..SourceView::default()
        },
    );
    let (canvas, stats) = render_with(&mut g, &sources, 100);
    assert_eq!(stats.drawn_scenes, 1);
    assert_eq!(canvas.pixel(20, 20), BLUE);
    assert_eq!(canvas.pixel(2, 2), CLEAR);
}

#[test]
fn transitioning_sequence_blends_through_its_transition() {
    let mix = Transition::new(
        TransitionSpec::default(),
        Arc::new(TransitionRegistry::default()),
    );
    let mut g = graph(json!([
        {"id": "s", "units": "pix", "width": 10, "height": 10, "sources": "seq"}
    ]));
    let mut sources = HashMap::new();
    sources.insert(
        "seq".to_owned(),
        SourceView {
            current: Some(solid(RED)),
            next: Some(solid(GREEN)),
            ratio: 0.5,
            transition: Some(&mix),
        },
    );
    let px = render_with(&mut g, &sources, 100).0.pixel(20, 20);
    assert!((i32::from(px[0]) - 128).abs() <= 1, "{px:?}");
    assert!((i32::from(px[1]) - 128).abs() <= 1, "{px:?}");
    assert_eq!(px[3], 255);
}

#[test]
fn two_sources_use_the_scene_mix_ratio() {
    let mut g = graph(json!([
        {"id": "s", "units": "pix", "width": 10, "height": 10,
         "sources": ["a", "b"], "mix_ratio": 1.0}
    ]));
    let mut sources = HashMap::new();
    sources.insert("a".to_owned(), SourceView { current: Some(solid(RED)), ..SourceView::default() });
    sources.insert("b".to_owned(), SourceView { current: Some(solid(BLUE)), ..SourceView::default() });
    assert_eq!(render_with(&mut g, &sources, 100).0.pixel(20, 20), BLUE);
}

#[test]
fn offscreen_color_group_is_only_visible_as_a_source() {
    let mut g = graph(json!([
        {"id": "off", "offscreen": "color", "back_color": "white", "units": "pix",
         "x": -12, "width": 10, "height": 10, "scenes": []},
        {"id": "s", "units": "pix", "x": 10, "width": 10, "height": 10, "sources": ["off"]}
    ]));
    let (canvas, stats) = render(&mut g);
    assert_eq!(stats.offscreen_groups, 1);
    assert_eq!(canvas.pixel(30, 20), [255, 255, 255, 255]);
    assert_eq!(canvas.pixel(8, 20), CLEAR);
}

#[test]
fn mask_groups_keep_alpha_and_luma() {
    let mut g = graph(json!([
        {"id": "m", "offscreen": "mask", "scenes": [square("r", "red")]},
        {"id": "s", "units": "pix", "width": 10, "height": 10, "sources": ["m"]}
    ]));
    let px = render(&mut g).0.pixel(20, 20);
    assert_eq!(px[0], px[1]);
    assert_eq!(px[1], px[2]);
    assert_eq!(px[3], 255);
}

#[test]
fn group_opacity_composites_a_surface() {
    let mut g = graph(json!([
        {"id": "g", "opacity": 0.5, "scenes": [square("s", "white")]}
    ]));
    let (canvas, _) = render(&mut g);
    let px = canvas.pixel(20, 20);
    assert!((i32::from(px[3]) - 128).abs() <= 1, "{px:?}");
    assert_eq!(g.surfaces.len(), 1);

    g.by_id_mut("g")
        .unwrap()
        .set_property("opacity", PropValue::Number(1.0))
        .unwrap();
    let (canvas, _) = render(&mut g);
    assert_eq!(canvas.pixel(20, 20), [255, 255, 255, 255]);
    assert!(g.surfaces.is_empty());
}

#[test]
fn reference_groups_rescale_relative_children() {
    let mut g = graph(json!([
        {"id": "g", "reference": true, "units": "pix", "width": 20, "height": 20, "scenes": [
            {"id": "s", "x": 50, "width": 10, "height": 10, "fill": "red"}
        ]}
    ]));
    let (canvas, _) = render(&mut g);
    // x=50% of the 20px group space is 10px right of centre: pixels 29..31.
    assert_eq!(canvas.pixel(30, 20), RED);
    assert_eq!(canvas.pixel(20, 20), CLEAR);
}

#[test]
fn scaler_reduces_surface_resolution() {
    let mut g = graph(json!([
        {"id": "g", "offscreen": "dual", "scaler": 2, "scenes": [square("s", "green")]}
    ]));
    let (canvas, _) = render(&mut g);
    assert_eq!(canvas.pixel(20, 20), GREEN);
    let h = g.handle("g").unwrap();
    assert_eq!(g.surfaces[&h].width(), 5);
}

#[test]
fn sibling_uses_share_a_per_frame_budget() {
    let mut g = graph(json!([
        {"id": "g", "scenes": [
            square("s", "red"),
            {"id": "a", "use": "g", "scenes": []},
            {"id": "b", "use": "g", "scenes": []}
        ]}
    ]));
    let (_, stats) = render_with(&mut g, &HashMap::new(), 3);
    assert_eq!(stats.use_instances, 6);
    assert_eq!(stats.drawn_scenes, 7);
    assert!(stats.skipped_depth > 0);

    // Linear in maxdepth, so the default bound finishes.
    let (canvas, stats) = render(&mut g);
    assert_eq!(stats.use_instances, 200);
    assert_eq!(stats.drawn_scenes, 201);
    assert_eq!(canvas.pixel(20, 20), RED);
}

#[test]
fn oversized_offscreen_surface_is_downscaled() {
    let mut g = graph(json!([
        {"id": "g", "opacity": 0.5, "scenes": [
            {"id": "huge", "units": "pix", "width": 100000, "height": 100000, "fill": "white"}
        ]}
    ]));
    let (canvas, stats) = render(&mut g);
    assert_eq!(stats.offscreen_groups, 1);
    let h = g.handle("g").unwrap();
    assert!(g.surfaces[&h].width() <= 80);
    assert!(g.surfaces[&h].height() <= 80);
    let px = canvas.pixel(20, 20);
    assert!((i32::from(px[3]) - 128).abs() <= 1, "{px:?}");
}

#[test]
fn clip_groups_restrict_descendants_to_their_rectangle() {
    let tree = |clip: bool| {
        json!([
            {"id": "g", "units": "pix", "width": 10, "height": 10, "clip": clip, "scenes": [
                {"id": "s", "units": "pix", "width": 30, "height": 30, "fill": "red"}
            ]}
        ])
    };
    let (canvas, _) = render(&mut graph(tree(true)));
    assert_eq!(canvas.pixel(24, 20), RED);
    assert_eq!(canvas.pixel(26, 20), CLEAR);
    assert_eq!(canvas.pixel(20, 13), CLEAR);

    let (canvas, _) = render(&mut graph(tree(false)));
    assert_eq!(canvas.pixel(26, 20), RED);
}
