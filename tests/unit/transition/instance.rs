use super::*;
use crate::foundation::core::{Point, Rect, Rgba8Premul, Shape};
use crate::render::{CpuCanvas, ProgramId, Texture, UniformLocation, UniformValue};

fn registry() -> Arc<TransitionRegistry> {
    Arc::new(TransitionRegistry::default())
}

fn spec(v: serde_json::Value) -> TransitionSpec {
    TransitionSpec::from_json(&v).unwrap()
}

fn frame_path() -> BezPath {
    Rect::new(-2.0, -2.0, 2.0, 2.0).to_path(0.1)
}

fn draw(t: &Transition, ratio: f64, a: &Texture, b: &Texture) -> CpuCanvas {
    let mut c = CpuCanvas::new(4, 4).unwrap();
    t.render(
        &mut c,
        ratio,
        &frame_path(),
        Affine::IDENTITY,
        TransitionInputs::new(Some(a), Some(b)),
    )
    .unwrap();
    c
}

fn red() -> Texture {
    Texture::solid(4, 4, Rgba8Premul::from_straight_rgba(255, 0, 0, 255))
}

fn blue() -> Texture {
    Texture::solid(4, 4, Rgba8Premul::from_straight_rgba(0, 0, 255, 255))
}

#[derive(Default)]
struct RecordingGpu {
    programs: Vec<String>,
    uniforms: Vec<(i32, UniformValue)>,
    textures: Vec<u32>,
}

impl GpuContext for RecordingGpu {
    fn compile_program(&mut self, fragment_src: &str) -> AvmixResult<ProgramId> {
        self.programs.push(fragment_src.to_owned());
        Ok(ProgramId(self.programs.len() as u32))
    }

    fn uniform_location(&mut self, _program: ProgramId, name: &str) -> Option<UniformLocation> {
        match name {
            "progress" => Some(UniformLocation(0)),
            "ratio" => Some(UniformLocation(1)),
            "color" => Some(UniformLocation(2)),
            _ => None,
        }
    }

    fn set_uniform(
        &mut self,
        _program: ProgramId,
        location: UniformLocation,
        value: &UniformValue,
    ) -> AvmixResult<()> {
        self.uniforms.push((location.0, value.clone()));
        Ok(())
    }

    fn bind_texture(
        &mut self,
        _program: ProgramId,
        unit: u32,
        _texture: &Texture,
    ) -> AvmixResult<()> {
        self.textures.push(unit);
        Ok(())
    }
}

#[test]
fn mix_endpoints_reproduce_inputs() {
    let t = Transition::new(spec(serde_json::json!({ "type": "mix" })), registry());
    let (a, b) = (red(), blue());
    assert_eq!(draw(&t, 0.0, &a, &b).data(), a.data());
    assert_eq!(draw(&t, 1.0, &a, &b).data(), b.data());
}

#[test]
fn mix_midpoint_blends_evenly() {
    let t = Transition::new(spec(serde_json::json!({ "type": "mix" })), registry());
    let c = draw(&t, 0.5, &red(), &blue());
    let px = c.pixel(1, 1);
    assert!((i32::from(px[0]) - 128).abs() <= 1);
    assert!((i32::from(px[2]) - 128).abs() <= 1);
    assert_eq!(px[3], 255);
}

#[test]
fn software_path_matches_shade_function() {
    let t = Transition::new(spec(serde_json::json!({ "type": "mix" })), registry());
    let (a, b) = (red(), blue());
    let inputs = TransitionInputs::new(Some(&a), Some(&b));
    for ratio in [0.0, 0.25, 0.5, 0.75, 1.0] {
        let c = draw(&t, ratio, &a, &b);
        let want = crate::render::composite::to_u8(t.module().shade(
            Point::new(0.5, 0.5),
            ratio,
            &inputs,
        ));
        assert_eq!(c.pixel(2, 2), want, "ratio {ratio}");
    }
}

#[test]
fn fade_passes_through_color() {
    let t = Transition::new(
        spec(serde_json::json!({ "type": "fade", "color": "white" })),
        registry(),
    );
    let c = draw(&t, 0.5, &red(), &blue());
    assert_eq!(c.pixel(0, 0), [255, 255, 255, 255]);
    assert_eq!(draw(&t, 0.0, &red(), &blue()).pixel(3, 3), [255, 0, 0, 255]);
}

#[test]
fn unknown_type_falls_back_to_hard_cut() {
    let t = Transition::new(spec(serde_json::json!({ "type": "nope" })), registry());
    assert!(t.is_hard_cut());
    assert_eq!(t.module().name(), "cut");
    assert_eq!(draw(&t, 0.49, &red(), &blue()).pixel(0, 0), [255, 0, 0, 255]);
    assert_eq!(draw(&t, 0.5, &red(), &blue()).pixel(0, 0), [0, 0, 255, 255]);
}

#[test]
fn gpu_only_module_cuts_in_software() {
    let src = "vec4 transition(vec2 uv) { return getToColor(uv); }";
    let t = Transition::new(
        spec(serde_json::json!({ "type": "gltrans", "src": src })),
        registry(),
    );
    assert!(t.is_hard_cut());
    assert_eq!(t.module().name(), "gltrans");
    assert_eq!(draw(&t, 0.2, &red(), &blue()).pixel(0, 0), [255, 0, 0, 255]);
}

#[test]
fn fun_hook_remaps_ratio() {
    let t = Transition::new(
        spec(serde_json::json!({ "type": "mix", "fun": "ratio * ratio" })),
        registry(),
    );
    assert!((t.remap(0.5) - 0.25).abs() < 1e-12);
    assert_eq!(t.remap(2.0), 1.0);
}

#[test]
fn broken_fun_hook_is_dropped() {
    let t = Transition::new(
        spec(serde_json::json!({ "type": "mix", "fun": "ratio +" })),
        registry(),
    );
    assert_eq!(t.remap(0.3), 0.3);
}

#[test]
fn gpu_path_uploads_progress_and_module_uniforms() {
    let mut t = Transition::new(
        spec(serde_json::json!({ "type": "fade", "color": "white" })),
        registry(),
    );
    let mut gpu = RecordingGpu::default();
    let (a, b) = (red(), blue());
    assert!(t.bind_gl(&mut gpu, 0.5, 1.0, TransitionInputs::default()).is_err());

    t.prepare_gl(&mut gpu).unwrap();
    t.prepare_gl(&mut gpu).unwrap();
    assert_eq!(gpu.programs.len(), 1);
    assert!(gpu.programs[0].contains("uniform vec4 color;"));
    assert!(gpu.programs[0].contains("void main()"));

    t.bind_gl(&mut gpu, 0.25, 2.0, TransitionInputs::new(Some(&a), Some(&b)))
        .unwrap();
    assert_eq!(gpu.textures, [0, 1]);
    assert_eq!(gpu.uniforms[0], (0, UniformValue::Float(0.25)));
    assert_eq!(gpu.uniforms[1], (1, UniformValue::Float(2.0)));
    assert_eq!(gpu.uniforms[2], (2, UniformValue::Vec4([1.0; 4])));
}

#[test]
fn properties_follow_declared_types() {
    let mut t = Transition::new(
        spec(serde_json::json!({ "id": "tr", "type": "swipe", "dur": 2 })),
        registry(),
    );
    assert_eq!(t.get_property("dur"), Some(PropValue::Number(2.0)));
    assert_eq!(t.get_property("from"), Some(PropValue::Str("left".into())));
    assert_eq!(t.prop_type("mode"), Some(PropType::String));

    t.set_property("from", PropValue::Str("right".into())).unwrap();
    assert_eq!(t.spec().options["from"], "right");
    assert!(t.set_property("dur", PropValue::Bool(true)).is_err());
    assert!(t.set_property("id", PropValue::Str("other".into())).is_err());
    assert!(t.set_property("missing", PropValue::Number(1.0)).is_err());

    t.set_property("type", PropValue::Str("mix".into())).unwrap();
    assert_eq!(t.module().name(), "mix");
}

#[test]
fn reload_keeps_module_when_only_dur_changes() {
    let mut t = Transition::new(spec(serde_json::json!({ "type": "mix" })), registry());
    t.update_spec(spec(serde_json::json!({ "type": "mix", "dur": 3 })));
    assert_eq!(t.dur(), 3.0);
    t.update_spec(spec(serde_json::json!({ "type": "swipe", "dur": 3 })));
    assert_eq!(t.module().name(), "swipe");
}

#[test]
fn glsl_type_loads_from_file() {
    let r = registry();
    let err = r
        .create("/nonexistent/effect.glsl", &serde_json::Map::new())
        .unwrap_err();
    assert!(err.to_string().starts_with("resource error:"));
    assert!(r.names().any(|n| n == "swipe"));
}

#[test]
fn spec_defaults_and_option_split() {
    let s = spec(serde_json::json!({ "color": "red", "_note": "x" }));
    assert_eq!(s.kind, "mix");
    assert_eq!(s.dur, 1.0);
    assert_eq!(s.options.len(), 1);
    assert!(TransitionSpec::from_json(&serde_json::json!({ "dur": -1 })).is_err());
    assert!(TransitionSpec::from_json(&serde_json::json!(3)).is_err());
}
