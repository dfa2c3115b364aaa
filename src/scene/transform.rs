use tracing::debug;

use crate::expression::{HookMap, MATRIX_INPUTS};
use crate::foundation::core::{Affine, Point, ReferenceSpace};
use crate::foundation::error::{AvmixError, AvmixResult};
use crate::props::{PropType, PropValue};
use crate::units::{
    Axis, Coord, CoordField, CoordSet, ResolvedCoords, Units, resolve_coords, resolve_position,
};

/// Property names shared by scenes and groups.
pub const TRANSFORM_KEYS: &[&str] = &[
    "active",
    "x",
    "y",
    "width",
    "height",
    "cx",
    "cy",
    "units",
    "rotation",
    "hscale",
    "vscale",
    "hskew",
    "vskew",
    "zorder",
    "untransform",
    "mxjs",
];

/// Outputs an `mxjs` hook may define.
pub const MXJS_OUTPUTS: &[&str] = &[
    "active", "tx", "ty", "rotation", "hscale", "vscale", "hskew", "vskew",
];

/// Placement of a node in its parent: position, size, pivot and the affine parameters.
#[derive(Clone, Debug)]
pub struct NodeTransform {
    pub active: bool,
    pub coords: CoordSet,
    pub cx: f64,
    pub cy: f64,
    pub units: Units,
    /// Degrees, counter-clockwise.
    pub rotation: f64,
    pub hscale: f64,
    pub vscale: f64,
    pub hskew: f64,
    pub vskew: f64,
    pub zorder: f64,
    pub untransform: bool,
    mxjs: Option<(serde_json::Value, HookMap)>,
}

impl Default for NodeTransform {
    fn default() -> Self {
        Self {
            active: true,
            coords: CoordSet::default(),
            cx: 0.0,
            cy: 0.0,
            units: Units::Rel,
            rotation: 0.0,
            hscale: 1.0,
            vscale: 1.0,
            hskew: 0.0,
            vskew: 0.0,
            zorder: 0.0,
            untransform: false,
            mxjs: None,
        }
    }
}

fn coord_field(name: &str) -> Option<CoordField> {
    match name {
        "x" => Some(CoordField::X),
        "y" => Some(CoordField::Y),
        "width" => Some(CoordField::Width),
        "height" => Some(CoordField::Height),
        _ => None,
    }
}

fn finite(name: &str, value: &PropValue) -> AvmixResult<f64> {
    value
        .as_f64()
        .filter(|v| v.is_finite())
        .ok_or_else(|| AvmixError::update(format!("'{name}' expects a finite number, got {value:?}")))
}

impl NodeTransform {
    pub fn prop_type(name: &str) -> Option<PropType> {
        if let Some(field) = coord_field(name) {
            return Some(PropType::Coord(field));
        }
        Some(match name {
            "active" | "untransform" => PropType::Bool,
            "cx" | "cy" | "rotation" | "hscale" | "vscale" | "hskew" | "vskew" | "zorder" => {
                PropType::Number
            }
            "units" => PropType::String,
            "mxjs" => PropType::Any,
            _ => return None,
        })
    }

    pub fn get(&self, name: &str) -> Option<PropValue> {
        if let Some(field) = coord_field(name) {
            return Some(match self.coords.get(field) {
                Coord::Value(v) => PropValue::Number(v),
                r @ Coord::Ref { .. } => PropValue::Str(r.to_json().as_str().unwrap_or_default().to_owned()),
            });
        }
        Some(match name {
            "active" => PropValue::Bool(self.active),
            "untransform" => PropValue::Bool(self.untransform),
            "cx" => PropValue::Number(self.cx),
            "cy" => PropValue::Number(self.cy),
            "rotation" => PropValue::Number(self.rotation),
            "hscale" => PropValue::Number(self.hscale),
            "vscale" => PropValue::Number(self.vscale),
            "hskew" => PropValue::Number(self.hskew),
            "vskew" => PropValue::Number(self.vskew),
            "zorder" => PropValue::Number(self.zorder),
            "units" => PropValue::Str(self.units.as_str().to_owned()),
            "mxjs" => match &self.mxjs {
                Some((src, _)) => PropValue::Json(src.clone()),
                None => PropValue::Str(String::new()),
            },
            _ => return None,
        })
    }

    /// Write one transform property. The caller has already checked the name exists.
    pub fn set(&mut self, name: &str, value: PropValue) -> AvmixResult<()> {
        if let Some(field) = coord_field(name) {
            let coord = Coord::parse(&value.to_json(), field)?;
            let mut coords = self.coords;
            coords.set(field, coord);
            coords.validate()?;
            self.coords = coords;
            return Ok(());
        }
        match name {
            "active" | "untransform" => {
                let b = value
                    .as_bool()
                    .ok_or_else(|| AvmixError::update(format!("'{name}' expects a boolean")))?;
                if name == "active" {
                    self.active = b;
                } else {
                    self.untransform = b;
                }
            }
            "units" => {
                self.units = Units::parse(value.as_str().unwrap_or_default())?;
            }
            "mxjs" => self.set_mxjs(&value)?,
            _ => {
                let v = finite(name, &value)?;
                match name {
                    "cx" => self.cx = v,
                    "cy" => self.cy = v,
                    "rotation" => self.rotation = v,
                    "hscale" => self.hscale = v,
                    "vscale" => self.vscale = v,
                    "hskew" => self.hskew = v,
                    "vskew" => self.vskew = v,
                    "zorder" => self.zorder = v,
                    _ => {
                        return Err(AvmixError::update(format!(
                            "no transform property '{name}'"
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    fn set_mxjs(&mut self, value: &PropValue) -> AvmixResult<()> {
        match value {
            PropValue::Str(s) if s.trim().is_empty() => {
                self.mxjs = None;
                Ok(())
            }
            PropValue::Json(src @ serde_json::Value::Object(obj)) => {
                let hooks = HookMap::compile(obj, MATRIX_INPUTS, Some(MXJS_OUTPUTS))?;
                self.mxjs = (!hooks.is_empty()).then(|| (src.clone(), hooks));
                Ok(())
            }
            other => Err(AvmixError::update(format!(
                "'mxjs' expects an object of expressions, got {other:?}"
            ))),
        }
    }

    pub fn has_mxjs(&self) -> bool {
        self.mxjs.is_some()
    }

    pub fn resolve(&self, space: ReferenceSpace) -> AvmixResult<ResolvedCoords> {
        resolve_coords(self.units, &self.coords, space)
    }

    /// Whether both `width` and `height` are explicit non-negative sizes.
    pub fn has_explicit_size(&self) -> bool {
        let explicit = |c: Coord| match c {
            Coord::Value(v) => v >= 0.0,
            Coord::Ref { .. } => true,
        };
        explicit(self.coords.width) && explicit(self.coords.height)
    }

    /// `translate(x, y) * scale * skew * rotate_about(cx, cy)`: rotation applies first.
    pub fn local_matrix(&self, rc: &ResolvedCoords, space: ReferenceSpace) -> Affine {
        let cx = resolve_position(self.units, Axis::Horizontal, self.cx, space);
        let cy = resolve_position(self.units, Axis::Vertical, self.cy, space);
        Affine::translate((rc.x, rc.y))
            * Affine::scale_non_uniform(self.hscale, self.vscale)
            * Affine::skew(self.hskew, self.vskew)
            * Affine::rotate_about(self.rotation.to_radians(), Point::new(cx, cy))
    }

    /// Evaluate the `mxjs` hook. `None` means the hook switched the node off for this frame.
    ///
    /// Outputs that fail to evaluate keep their neutral value.
    pub fn eval_hook(
        &self,
        t: f64,
        rc: &ResolvedCoords,
        space: ReferenceSpace,
        id: Option<&str>,
    ) -> Option<Affine> {
        let Some((_, hooks)) = &self.mxjs else {
            return Some(Affine::IDENTITY);
        };
        let inputs = [t, rc.x, rc.y, rc.width, rc.height, space.width, space.height];

        if let Some(h) = hooks.get("active") {
            match h.eval(&inputs).and_then(|v| Ok(v.as_bool()?)) {
                Ok(false) => return None,
                Ok(true) => {}
                Err(err) => debug!(id = id.unwrap_or(""), property = "mxjs", error = %err, "matrix hook failed"),
            }
        }
        let out = |name: &str, neutral: f64| -> f64 {
            hooks
                .get(name)
                .map(|h| {
                    h.eval_f64(&inputs).unwrap_or_else(|err| {
                        debug!(id = id.unwrap_or(""), property = "mxjs", output = name, error = %err, "matrix hook failed");
                        neutral
                    })
                })
                .unwrap_or(neutral)
        };
        Some(
            Affine::translate((out("tx", 0.0), out("ty", 0.0)))
                * Affine::scale_non_uniform(out("hscale", 1.0), out("vscale", 1.0))
                * Affine::skew(out("hskew", 0.0), out("vskew", 0.0))
                * Affine::rotate(out("rotation", 0.0).to_radians()),
        )
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/transform.rs"]
mod tests;
