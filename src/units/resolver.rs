use crate::foundation::core::ReferenceSpace;
use crate::foundation::error::{AvmixError, AvmixResult};

/// Unit system for a node's coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    /// Percent of the reference space, origin at its centre, y up.
    #[default]
    Rel,
    /// Pixels, origin at the reference space centre, y up.
    Pix,
}

impl Units {
    pub fn parse(s: &str) -> AvmixResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rel" => Ok(Self::Rel),
            "pix" => Ok(Self::Pix),
            other => Err(AvmixError::config(format!("unknown units '{other}'"))),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Rel => "rel",
            Self::Pix => "pix",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis {
    Horizontal,
    Vertical,
}

impl Axis {
    fn extent(self, space: ReferenceSpace) -> f64 {
        match self {
            Self::Horizontal => space.width,
            Self::Vertical => space.height,
        }
    }
}

/// Resolve an `x`/`y`/`cx`/`cy` value to pixels relative to the reference space centre.
pub fn resolve_position(units: Units, axis: Axis, v: f64, space: ReferenceSpace) -> f64 {
    match units {
        Units::Rel => v * axis.extent(space) / 100.0,
        Units::Pix => v,
    }
}

/// Inverse of [`resolve_position`].
pub fn unresolve_position(units: Units, axis: Axis, px: f64, space: ReferenceSpace) -> f64 {
    match units {
        Units::Rel => {
            let ext = axis.extent(space);
            if ext == 0.0 { 0.0 } else { px * 100.0 / ext }
        }
        Units::Pix => px,
    }
}

/// Resolve a `width`/`height` value to pixels. Negative values inherit the reference extent.
pub fn resolve_size(units: Units, axis: Axis, v: f64, space: ReferenceSpace) -> f64 {
    if v < 0.0 {
        return axis.extent(space);
    }
    match units {
        Units::Rel => v * axis.extent(space) / 100.0,
        Units::Pix => v,
    }
}

/// Inverse of [`resolve_size`] for non-negative sizes.
pub fn unresolve_size(units: Units, axis: Axis, px: f64, space: ReferenceSpace) -> f64 {
    unresolve_position(units, axis, px, space)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CoordField {
    X,
    Y,
    Width,
    Height,
}

impl CoordField {
    pub fn name(self) -> &'static str {
        match self {
            Self::X => "x",
            Self::Y => "y",
            Self::Width => "width",
            Self::Height => "height",
        }
    }

    /// The only field this one may reference through a sentinel.
    fn partner(self) -> Self {
        match self {
            Self::X => Self::Y,
            Self::Y => Self::X,
            Self::Width => Self::Height,
            Self::Height => Self::Width,
        }
    }
}

/// A coordinate as written in a playlist: a number, or a reference to another computed field.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Coord {
    Value(f64),
    Ref { field: CoordField, negate: bool },
}

impl Default for Coord {
    fn default() -> Self {
        Self::Value(0.0)
    }
}

impl Coord {
    /// Parse a playlist value for `field`. Strings must name the field's partner
    /// (`width`<->`height`, `x`<->`y`, with `-` allowed on positions).
    pub fn parse(v: &serde_json::Value, field: CoordField) -> AvmixResult<Self> {
        if let Some(n) = v.as_f64() {
            return Ok(Self::Value(n));
        }
        let Some(s) = v.as_str() else {
            return Err(AvmixError::config(format!(
                "{} must be a number or a field reference, got {v}",
                field.name()
            )));
        };
        let s = s.trim();
        let (negate, name) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s),
        };
        let target = match name {
            "x" => CoordField::X,
            "y" => CoordField::Y,
            "width" => CoordField::Width,
            "height" => CoordField::Height,
            _ => {
                return s.parse::<f64>().map(Self::Value).map_err(|_| {
                    AvmixError::config(format!("invalid {} value '{s}'", field.name()))
                });
            }
        };
        if target != field.partner() {
            return Err(AvmixError::config(format!(
                "{} cannot reference '{name}'",
                field.name()
            )));
        }
        if negate && matches!(field, CoordField::Width | CoordField::Height) {
            return Err(AvmixError::config(format!(
                "{} cannot use a negated reference",
                field.name()
            )));
        }
        Ok(Self::Ref {
            field: target,
            negate,
        })
    }

    pub fn to_json(self) -> serde_json::Value {
        match self {
            Self::Value(v) => serde_json::json!(v),
            Self::Ref { field, negate } => {
                let sign = if negate { "-" } else { "" };
                serde_json::Value::String(format!("{sign}{}", field.name()))
            }
        }
    }
}

/// The four sentinel-capable coordinates of a node.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CoordSet {
    pub x: Coord,
    pub y: Coord,
    pub width: Coord,
    pub height: Coord,
}

impl Default for CoordSet {
    fn default() -> Self {
        Self {
            x: Coord::Value(0.0),
            y: Coord::Value(0.0),
            width: Coord::Value(-1.0),
            height: Coord::Value(-1.0),
        }
    }
}

impl CoordSet {
    pub fn get(&self, field: CoordField) -> Coord {
        match field {
            CoordField::X => self.x,
            CoordField::Y => self.y,
            CoordField::Width => self.width,
            CoordField::Height => self.height,
        }
    }

    pub fn set(&mut self, field: CoordField, c: Coord) {
        match field {
            CoordField::X => self.x = c,
            CoordField::Y => self.y = c,
            CoordField::Width => self.width = c,
            CoordField::Height => self.height = c,
        }
    }

    /// Reject reference cycles (`width: "height", height: "width"`) and chains longer than
    /// one hop; both would need more than the single secondary pass.
    pub fn validate(&self) -> AvmixResult<()> {
        for field in [
            CoordField::X,
            CoordField::Y,
            CoordField::Width,
            CoordField::Height,
        ] {
            if let Coord::Ref { field: target, .. } = self.get(field) {
                match self.get(target) {
                    Coord::Ref { field: back, .. } if back == field => {
                        return Err(AvmixError::config(format!(
                            "reference cycle: {} <- {} <- {}",
                            field.name(),
                            target.name(),
                            field.name()
                        )));
                    }
                    Coord::Ref { .. } => {
                        return Err(AvmixError::config(format!(
                            "{} references {} which is itself a reference",
                            field.name(),
                            target.name()
                        )));
                    }
                    Coord::Value(_) => {}
                }
            }
        }
        Ok(())
    }
}

/// Pixel values for a node's position and size in its reference space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ResolvedCoords {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Resolve all four coordinates: numeric fields first, then sentinels in one extra pass.
pub fn resolve_coords(
    units: Units,
    set: &CoordSet,
    space: ReferenceSpace,
) -> AvmixResult<ResolvedCoords> {
    set.validate()?;

    let primary = |c: Coord, field: CoordField| -> Option<f64> {
        let Coord::Value(v) = c else {
            return None;
        };
        Some(match field {
            CoordField::X => resolve_position(units, Axis::Horizontal, v, space),
            CoordField::Y => resolve_position(units, Axis::Vertical, v, space),
            CoordField::Width => resolve_size(units, Axis::Horizontal, v, space),
            CoordField::Height => resolve_size(units, Axis::Vertical, v, space),
        })
    };

    let mut out = [
        primary(set.x, CoordField::X),
        primary(set.y, CoordField::Y),
        primary(set.width, CoordField::Width),
        primary(set.height, CoordField::Height),
    ];
    let idx = |f: CoordField| match f {
        CoordField::X => 0usize,
        CoordField::Y => 1,
        CoordField::Width => 2,
        CoordField::Height => 3,
    };

    for field in [
        CoordField::X,
        CoordField::Y,
        CoordField::Width,
        CoordField::Height,
    ] {
        if let Coord::Ref {
            field: target,
            negate,
        } = set.get(field)
        {
            let v = out[idx(target)].ok_or_else(|| {
                AvmixError::config(format!("{} is unresolved", target.name()))
            })?;
            out[idx(field)] = Some(if negate { -v } else { v });
        }
    }

    Ok(ResolvedCoords {
        x: out[0].unwrap_or(0.0),
        y: out[1].unwrap_or(0.0),
        width: out[2].unwrap_or(space.width),
        height: out[3].unwrap_or(space.height),
    })
}

#[cfg(test)]
#[path = "../../tests/unit/units/resolver.rs"]
mod tests;
