use serde_json::Value;
use tracing::warn;

use crate::foundation::core::Color;
use crate::foundation::error::{AvmixError, AvmixResult};
use crate::foundation::json::Object;
use crate::sequence::SchedulerSettings;

/// Mixer output and scheduling settings.
///
/// Built from CLI flags, then overridden by the playlist `config` object at initial load.
#[derive(Clone, Debug, PartialEq)]
pub struct MixerConfig {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    /// Live sources show a placeholder instead of blocking output.
    pub live: bool,
    /// Bound on `use` expansions along one branch.
    pub maxdepth: u32,
    pub wait_timeout_ms: u64,
    pub prefetch_ms: u64,
    pub back_color: Color,
    /// Playlists cycled through every `reload_timeout` seconds, for reload testing.
    pub reload_tests: Vec<String>,
    pub reload_timeout: f64,
    /// Extra passes over `reload_tests`.
    pub reload_loop: u32,
}

impl Default for MixerConfig {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
            fps: 25.0,
            live: false,
            maxdepth: 100,
            wait_timeout_ms: 1000,
            prefetch_ms: 500,
            back_color: Color::BLACK,
            reload_tests: Vec::new(),
            reload_timeout: 1.0,
            reload_loop: 0,
        }
    }
}

const CONFIG_KEYS: &[&str] = &[
    "width",
    "height",
    "fps",
    "live",
    "maxdepth",
    "wait_timeout_ms",
    "prefetch_ms",
    "back_color",
    "reload_tests",
    "reload_timeout",
    "reload_loop",
];

impl MixerConfig {
    pub fn validate(&self) -> AvmixResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(AvmixError::config("output width/height must be > 0"));
        }
        if !self.fps.is_finite() || self.fps <= 0.0 {
            return Err(AvmixError::config(format!("fps must be > 0, got {}", self.fps)));
        }
        if !self.reload_timeout.is_finite() || self.reload_timeout <= 0.0 {
            return Err(AvmixError::config("reload_timeout must be > 0"));
        }
        Ok(())
    }

    /// Apply a playlist `config` object. Invalid or unknown entries warn and are ignored.
    pub fn apply_object(&mut self, obj: &Object) {
        for (key, v) in obj {
            if key.starts_with('_') || key == "id" {
                continue;
            }
            if !CONFIG_KEYS.contains(&key.as_str()) {
                warn!(kind = "config", property = %key, "unknown property ignored");
                continue;
            }
            let mut next = self.clone();
            if let Err(err) = next.set(key, v).and_then(|()| next.validate()) {
                warn!(kind = "config", property = %key, error = %err, "config value rejected");
                continue;
            }
            *self = next;
        }
    }

    fn set(&mut self, key: &str, v: &Value) -> AvmixResult<()> {
        match key {
            "width" => self.width = uint(key, v)?,
            "height" => self.height = uint(key, v)?,
            "fps" => self.fps = number(key, v)?,
            "live" => {
                self.live = v
                    .as_bool()
                    .ok_or_else(|| AvmixError::config(format!("'{key}' must be a boolean")))?
            }
            "maxdepth" => self.maxdepth = uint(key, v)?,
            "wait_timeout_ms" => self.wait_timeout_ms = u64::from(uint(key, v)?),
            "prefetch_ms" => self.prefetch_ms = u64::from(uint(key, v)?),
            "back_color" => {
                let s = v
                    .as_str()
                    .ok_or_else(|| AvmixError::config(format!("'{key}' must be a color string")))?;
                self.back_color = Color::parse(s)?;
            }
            "reload_tests" => {
                self.reload_tests = match v {
                    Value::String(s) => vec![s.clone()],
                    Value::Array(items) => items
                        .iter()
                        .map(|i| {
                            i.as_str().map(str::to_owned).ok_or_else(|| {
                                AvmixError::config("'reload_tests' entries must be strings")
                            })
                        })
                        .collect::<AvmixResult<_>>()?,
                    _ => return Err(AvmixError::config("'reload_tests' must be a list of paths")),
                }
            }
            "reload_timeout" => self.reload_timeout = number(key, v)?,
            "reload_loop" => self.reload_loop = uint(key, v)?,
            _ => return Err(AvmixError::config(format!("unknown config key '{key}'"))),
        }
        Ok(())
    }

    pub fn frame_dur(&self) -> f64 {
        1.0 / self.fps
    }

    pub fn scheduler(&self) -> SchedulerSettings {
        SchedulerSettings {
            prefetch: self.prefetch_ms as f64 / 1000.0,
            frame_dur: self.frame_dur(),
            width: self.width,
            height: self.height,
        }
    }
}

fn number(key: &str, v: &Value) -> AvmixResult<f64> {
    v.as_f64()
        .filter(|n| n.is_finite())
        .ok_or_else(|| AvmixError::config(format!("'{key}' must be a number, got {v}")))
}

fn uint(key: &str, v: &Value) -> AvmixResult<u32> {
    let n = number(key, v)?;
    if n < 0.0 || n.fract() != 0.0 || n > f64::from(u32::MAX) {
        return Err(AvmixError::config(format!(
            "'{key}' must be a non-negative integer, got {v}"
        )));
    }
    Ok(n as u32)
}

#[cfg(test)]
#[path = "../../tests/unit/mixer/config.rs"]
mod tests;
