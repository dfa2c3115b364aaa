use tracing::warn;

use crate::expression::{Hook, POSTFUN_INPUTS, RATIO_INPUTS};
use crate::foundation::core::Color;
use crate::foundation::error::{AvmixError, AvmixResult};
use crate::foundation::json::{self, Object};
use crate::props::{PropTarget, PropValue};
use crate::timing::{LoopCount, TimeSpec};

/// How the local ratio between two keys is shaped.
#[derive(Clone, Debug, PartialEq)]
pub enum AnimMode {
    Linear,
    /// Snap to the nearest key.
    Discrete,
    /// Custom `{ratio}` remap.
    Hook(Hook),
}

/// What happens to targets when the timer ends.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EndPolicy {
    Freeze,
    Restore,
}

#[derive(Clone, Debug, PartialEq)]
pub struct AnimationDecl {
    /// One value per timer key.
    pub values: Vec<PropValue>,
    pub color: bool,
    /// Values are degrees; results are written in radians.
    pub angle: bool,
    pub mode: AnimMode,
    pub postfun: Option<Hook>,
    pub end: EndPolicy,
    pub targets: Vec<PropTarget>,
}

const ANIM_KEYS: &[&str] = &["values", "color", "angle", "mode", "postfun", "end", "targets"];

impl AnimationDecl {
    pub fn from_json(v: &serde_json::Value, timer_id: Option<&str>) -> AvmixResult<Self> {
        let obj = json::as_object(v, "animation")?;
        json::warn_unknown(obj, ANIM_KEYS, "animation", timer_id);
        let color = json::bool_or(obj, "color", false)?;
        let angle = json::bool_or(obj, "angle", false)?;

        let raw = obj
            .get("values")
            .and_then(serde_json::Value::as_array)
            .ok_or_else(|| AvmixError::config("animation requires a 'values' array"))?;
        let values = raw
            .iter()
            .map(|v| {
                if color {
                    let s = v.as_str().ok_or_else(|| {
                        AvmixError::config(format!("color animation value {v} is not a string"))
                    })?;
                    Ok(PropValue::Color(Color::parse(s)?))
                } else {
                    PropValue::from_json(v)
                }
            })
            .collect::<AvmixResult<Vec<_>>>()?;

        let mode = match json::opt_str(obj, "mode")?.as_deref().map(str::trim) {
            None | Some("linear") | Some("") => AnimMode::Linear,
            Some("discrete") => AnimMode::Discrete,
            Some(src) => match Hook::compile(src, RATIO_INPUTS) {
                Ok(h) => AnimMode::Hook(h),
                Err(err) => {
                    warn!(id = timer_id.unwrap_or(""), property = "mode", error = %err, "dropping animation mode hook");
                    AnimMode::Linear
                }
            },
        };

        let postfun = json::opt_str(obj, "postfun")?.and_then(|src| {
            Hook::compile(&src, POSTFUN_INPUTS)
                .inspect_err(|err| {
                    warn!(id = timer_id.unwrap_or(""), property = "postfun", error = %err, "dropping animation postfun hook");
                })
                .ok()
        });

        let end = match json::str_or(obj, "end", "freeze")?.trim() {
            "freeze" => EndPolicy::Freeze,
            "restore" => EndPolicy::Restore,
            other => {
                return Err(AvmixError::config(format!("unknown animation end '{other}'")));
            }
        };

        let targets = json::str_list(obj, "targets")?
            .iter()
            .map(|t| PropTarget::parse(t))
            .collect::<AvmixResult<Vec<_>>>()?;
        if targets.is_empty() {
            warn!(id = timer_id.unwrap_or(""), "animation has no targets");
        }

        Ok(Self {
            values,
            color,
            angle,
            mode,
            postfun,
            end,
            targets,
        })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct TimerDecl {
    pub id: Option<String>,
    /// Seconds per iteration.
    pub dur: f64,
    pub looping: LoopCount,
    pub start: TimeSpec,
    pub stop: TimeSpec,
    /// Ascending breakpoints in `[0, 1]`.
    pub keys: Vec<f64>,
    pub anims: Vec<AnimationDecl>,
}

const TIMER_KEYS: &[&str] = &[
    "id", "type", "dur", "loop", "start", "stop", "keys", "anims",
];

impl TimerDecl {
    pub fn from_json(v: &serde_json::Value) -> AvmixResult<Self> {
        let obj = json::as_object(v, "timer")?;
        let id = json::opt_str(obj, "id")?;
        json::warn_unknown(obj, TIMER_KEYS, "timer", id.as_deref());

        let dur = json::f64_or(obj, "dur", 1.0)?;
        if dur < 0.0 {
            return Err(AvmixError::config(format!("timer dur must be >= 0, got {dur}")));
        }
        let looping = match obj.get("loop") {
            Some(v) => LoopCount::parse_json(v)?,
            None => LoopCount::Once,
        };
        let start = time_field(obj, "start", TimeSpec::Offset(0.0))?;
        let stop = time_field(obj, "stop", TimeSpec::Inactive)?;

        let keys = obj
            .get("keys")
            .and_then(serde_json::Value::as_array)
            .ok_or_else(|| AvmixError::config("timer requires a 'keys' array"))?
            .iter()
            .map(|k| {
                k.as_f64()
                    .filter(|k| (0.0..=1.0).contains(k))
                    .ok_or_else(|| AvmixError::config(format!("timer key {k} must be in [0, 1]")))
            })
            .collect::<AvmixResult<Vec<_>>>()?;
        if keys.is_empty() {
            return Err(AvmixError::config("timer 'keys' must not be empty"));
        }
        if !keys.windows(2).all(|w| w[0] <= w[1]) {
            return Err(AvmixError::config("timer keys must be ascending"));
        }

        let mut anims = Vec::new();
        if let Some(list) = obj.get("anims").and_then(serde_json::Value::as_array) {
            for a in list {
                let anim = AnimationDecl::from_json(a, id.as_deref())?;
                if anim.values.len() != keys.len() {
                    return Err(AvmixError::config(format!(
                        "animation has {} values for {} keys",
                        anim.values.len(),
                        keys.len()
                    )));
                }
                anims.push(anim);
            }
        }

        Ok(Self {
            id,
            dur,
            looping,
            start,
            stop,
            keys,
            anims,
        })
    }
}

fn time_field(obj: &Object, key: &str, default: TimeSpec) -> AvmixResult<TimeSpec> {
    obj.get(key).map_or(Ok(default), TimeSpec::parse_json)
}
