use std::collections::BTreeSet;
use std::f64::consts::PI;

use tracing::{debug, warn};

use crate::expression::Hook;
use crate::foundation::core::Color;
use crate::foundation::error::AvmixResult;
use crate::props::{PropValue, PropertyGraph, graph_read, graph_write};
use crate::timer::decl::{AnimMode, AnimationDecl, EndPolicy, TimerDecl};
use crate::timing::Clock;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimerState {
    /// `start` is inactive.
    Idle,
    /// Waiting for `start`.
    Armed,
    Running,
    Terminal(EndPolicy),
}

/// A live timer driving its animations' targets.
#[derive(Debug)]
pub struct Timer {
    decl: TimerDecl,
    state: TimerState,
    start: Option<f64>,
    stop: Option<f64>,
    /// Pre-animation values, per animation and target.
    snapshots: Vec<Vec<Option<PropValue>>>,
    reported: BTreeSet<String>,
}

impl Timer {
    /// Resolve `start`/`stop` against the clock at creation.
    pub fn new(decl: TimerDecl, clock: &Clock) -> Self {
        let start = decl.start.resolve(clock);
        let stop = decl.stop.resolve(clock);
        let state = if start.is_some() {
            TimerState::Armed
        } else {
            TimerState::Idle
        };
        Self {
            decl,
            state,
            start,
            stop,
            snapshots: Vec::new(),
            reported: BTreeSet::new(),
        }
    }

    pub fn id(&self) -> Option<&str> {
        self.decl.id.as_deref()
    }

    pub fn decl(&self) -> &TimerDecl {
        &self.decl
    }

    pub fn state(&self) -> TimerState {
        self.state
    }

    /// Advance to `clock.now`, writing animated values into `graph`.
    pub fn tick(&mut self, clock: &Clock, graph: &mut dyn PropertyGraph) {
        let now = clock.now;
        let Some(start) = self.start else {
            return;
        };
        if self.state == TimerState::Armed {
            if now < start {
                return;
            }
            self.snapshot(graph);
            self.state = TimerState::Running;
            debug!(id = self.id().unwrap_or(""), "timer started");
        }
        if self.state != TimerState::Running {
            return;
        }
        if self.stop.is_some_and(|stop| now >= stop) {
            self.finish(graph);
            return;
        }

        let elapsed = now - start;
        let (pos, done) = if self.decl.dur <= 0.0 {
            (1.0, true)
        } else {
            let cycles = elapsed / self.decl.dur;
            let iter = cycles.floor() as u64;
            if self.decl.looping.allows(iter) {
                (cycles - cycles.floor(), false)
            } else {
                (1.0, true)
            }
        };
        self.apply(pos, graph);
        if done {
            self.finish(graph);
        }
    }

    fn snapshot(&mut self, graph: &dyn PropertyGraph) {
        self.snapshots = self
            .decl
            .anims
            .iter()
            .map(|a| match a.end {
                EndPolicy::Restore => a.targets.iter().map(|t| graph_read(graph, t)).collect(),
                EndPolicy::Freeze => Vec::new(),
            })
            .collect();
    }

    fn finish(&mut self, graph: &mut dyn PropertyGraph) {
        let all_restore = !self.decl.anims.is_empty()
            && self.decl.anims.iter().all(|a| a.end == EndPolicy::Restore);
        let snapshots = std::mem::take(&mut self.snapshots);
        for (anim, snap) in self.decl.anims.iter().zip(&snapshots) {
            if anim.end != EndPolicy::Restore {
                continue;
            }
            for (target, value) in anim.targets.iter().zip(snap) {
                if let Some(value) = value {
                    if let Err(err) = graph_write(graph, target, value.clone()) {
                        warn!(id = self.decl.id.as_deref().unwrap_or(""), target = %target, error = %err, "restore failed");
                    }
                }
            }
        }
        self.state = TimerState::Terminal(if all_restore {
            EndPolicy::Restore
        } else {
            EndPolicy::Freeze
        });
        debug!(id = self.id().unwrap_or(""), state = ?self.state, "timer ended");
    }

    fn apply(&mut self, pos: f64, graph: &mut dyn PropertyGraph) {
        for anim in &self.decl.anims {
            let Some(value) = sample(&self.decl.keys, anim, pos) else {
                continue;
            };
            for target in &anim.targets {
                if let Err(err) = graph_write(graph, target, value.clone()) {
                    let key = target.to_string();
                    // Each broken target is reported once.
                    if self.reported.insert(key) {
                        let missing = graph.host(&target.id).is_none();
                        warn!(
                            id = self.decl.id.as_deref().unwrap_or(""),
                            target = %target,
                            missing,
                            error = %err,
                            "timer target not written"
                        );
                    }
                }
            }
        }
    }
}

/// Value of `anim` at normalized timer position `pos`.
pub fn sample(keys: &[f64], anim: &AnimationDecl, pos: f64) -> Option<PropValue> {
    let n = keys.len().min(anim.values.len());
    if n == 0 {
        return None;
    }
    let (a, b, local) = if pos <= keys[0] || n == 1 {
        (0, 0, 0.0)
    } else if pos >= keys[n - 1] {
        (n - 1, n - 1, 0.0)
    } else {
        let idx = keys[..n].partition_point(|k| *k <= pos);
        let (ka, kb) = (keys[idx - 1], keys[idx]);
        let local = if kb > ka { (pos - ka) / (kb - ka) } else { 1.0 };
        (idx - 1, idx, local)
    };

    let ratio = match &anim.mode {
        AnimMode::Linear => local,
        AnimMode::Discrete => {
            if local < 0.5 {
                0.0
            } else {
                1.0
            }
        }
        AnimMode::Hook(h) => h.eval_f64(&[local]).unwrap_or(local),
    };

    let mut value = interpolate(&anim.values[a], &anim.values[b], ratio);
    if anim.angle {
        value = scale_numbers(value, PI / 180.0);
    }
    if let Some(post) = &anim.postfun {
        match apply_postfun(post, value.clone(), ratio) {
            Ok(out) => value = out,
            Err(err) => warn!(property = "postfun", error = %err, "postfun failed; keeping the interpolated value"),
        }
    }
    Some(value)
}

/// Run `postfun` on every number in `v`. Colors pass their RGB channels (0..1) through it
/// and keep their alpha.
fn apply_postfun(post: &Hook, v: PropValue, ratio: f64) -> AvmixResult<PropValue> {
    Ok(match v {
        PropValue::Number(n) => PropValue::Number(post.eval_f64(&[n, ratio])?),
        PropValue::Array(items) => PropValue::Array(
            items
                .into_iter()
                .map(|i| apply_postfun(post, i, ratio))
                .collect::<AvmixResult<Vec<_>>>()?,
        ),
        PropValue::Color(c) => {
            let channel =
                |x: f32| -> AvmixResult<f32> { Ok(post.eval_f64(&[f64::from(x), ratio])?.clamp(0.0, 1.0) as f32) };
            PropValue::Color(Color::rgba(channel(c.r)?, channel(c.g)?, channel(c.b)?, c.a))
        }
        other => other,
    })
}

fn interpolate(a: &PropValue, b: &PropValue, r: f64) -> PropValue {
    match (a, b) {
        (PropValue::Number(x), PropValue::Number(y)) => PropValue::Number(x + (y - x) * r),
        (PropValue::Color(x), PropValue::Color(y)) => PropValue::Color(x.lerp(*y, r)),
        (PropValue::Array(x), PropValue::Array(y)) if x.len() == y.len() => PropValue::Array(
            x.iter()
                .zip(y)
                .map(|(x, y)| interpolate(x, y, r))
                .collect(),
        ),
        _ => {
            if r < 1.0 {
                a.clone()
            } else {
                b.clone()
            }
        }
    }
}

fn scale_numbers(v: PropValue, k: f64) -> PropValue {
    match v {
        PropValue::Number(n) => PropValue::Number(n * k),
        PropValue::Array(items) => {
            PropValue::Array(items.into_iter().map(|i| scale_numbers(i, k)).collect())
        }
        other => other,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/timer/engine.rs"]
mod tests;
