//! Mixer clock and `start`/`stop` time specifications.

use chrono::{DateTime, NaiveDateTime, Utc};

use crate::foundation::error::{AvmixError, AvmixResult};
use crate::props::PropValue;

/// Seconds since the mixer started, anchored to a UTC origin for date specs.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Clock {
    pub now: f64,
    pub frame: u64,
    origin: DateTime<Utc>,
}

impl Clock {
    pub fn new(origin: DateTime<Utc>) -> Self {
        Self {
            now: 0.0,
            frame: 0,
            origin,
        }
    }

    pub fn at(self, now: f64, frame: u64) -> Self {
        Self { now, frame, ..self }
    }

    pub fn origin(&self) -> DateTime<Utc> {
        self.origin
    }

    /// Mixer time of a wall-clock date.
    pub fn date_to_clock(&self, date: DateTime<Utc>) -> f64 {
        (date - self.origin).num_milliseconds() as f64 / 1000.0
    }
}

/// A `start`/`stop` value.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TimeSpec {
    /// Negative number: never fires.
    Inactive,
    Now,
    /// Seconds after the moment the value is applied.
    Offset(f64),
    Date(DateTime<Utc>),
}

impl TimeSpec {
    pub fn parse_json(v: &serde_json::Value) -> AvmixResult<Self> {
        match v {
            serde_json::Value::Number(n) => Ok(Self::from_number(n.as_f64().unwrap_or(-1.0))),
            serde_json::Value::String(s) => Self::parse_str(s),
            serde_json::Value::Null => Ok(Self::Inactive),
            other => Err(AvmixError::config(format!("invalid time value {other}"))),
        }
    }

    pub fn from_prop(v: &PropValue) -> AvmixResult<Self> {
        match v {
            PropValue::Number(n) => Ok(Self::from_number(*n)),
            PropValue::Str(s) => Self::parse_str(s),
            other => Err(AvmixError::update(format!("invalid time value {other:?}"))),
        }
    }

    fn from_number(n: f64) -> Self {
        if n < 0.0 || !n.is_finite() {
            Self::Inactive
        } else {
            Self::Offset(n)
        }
    }

    fn parse_str(s: &str) -> AvmixResult<Self> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("now") {
            return Ok(Self::Now);
        }
        if let Ok(n) = s.parse::<f64>() {
            return Ok(Self::from_number(n));
        }
        if let Ok(d) = DateTime::parse_from_rfc3339(s) {
            return Ok(Self::Date(d.with_timezone(&Utc)));
        }
        for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
            if let Ok(d) = NaiveDateTime::parse_from_str(s, fmt) {
                return Ok(Self::Date(d.and_utc()));
            }
        }
        Err(AvmixError::config(format!("invalid time value '{s}'")))
    }

    pub fn to_prop(&self) -> PropValue {
        match self {
            Self::Inactive => PropValue::Number(-1.0),
            Self::Now => PropValue::Str("now".to_owned()),
            Self::Offset(o) => PropValue::Number(*o),
            Self::Date(d) => PropValue::Str(d.to_rfc3339()),
        }
    }

    pub fn is_active(&self) -> bool {
        !matches!(self, Self::Inactive)
    }

    /// Absolute mixer time when applied at `clock`, or `None` when inactive.
    pub fn resolve(&self, clock: &Clock) -> Option<f64> {
        match self {
            Self::Inactive => None,
            Self::Now => Some(clock.now),
            Self::Offset(o) => Some(clock.now + o),
            Self::Date(d) => Some(clock.date_to_clock(*d)),
        }
    }
}

/// Repeat policy for timers and sequences.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoopCount {
    /// Play once.
    Once,
    /// Play `n` additional times.
    Repeat(u32),
    Forever,
}

impl LoopCount {
    /// Accepts `true`/`false`, `-1` (forever) or a repeat count.
    pub fn parse_json(v: &serde_json::Value) -> AvmixResult<Self> {
        match v {
            serde_json::Value::Bool(true) => Ok(Self::Forever),
            serde_json::Value::Bool(false) | serde_json::Value::Null => Ok(Self::Once),
            serde_json::Value::Number(n) => Self::from_number(n.as_f64().unwrap_or(0.0)),
            other => Err(AvmixError::config(format!("invalid loop value {other}"))),
        }
    }

    pub fn from_number(n: f64) -> AvmixResult<Self> {
        if n < 0.0 {
            Ok(Self::Forever)
        } else if n.fract() != 0.0 || n > f64::from(u32::MAX) {
            Err(AvmixError::config(format!("invalid loop count {n}")))
        } else if n == 0.0 {
            Ok(Self::Once)
        } else {
            Ok(Self::Repeat(n as u32))
        }
    }

    pub fn as_number(&self) -> f64 {
        match self {
            Self::Once => 0.0,
            Self::Repeat(n) => f64::from(*n),
            Self::Forever => -1.0,
        }
    }

    /// Whether iteration `i` (0-based) is still allowed.
    pub fn allows(&self, i: u64) -> bool {
        match self {
            Self::Once => i == 0,
            Self::Repeat(n) => i <= u64::from(*n),
            Self::Forever => true,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/timing/mod.rs"]
mod tests;
