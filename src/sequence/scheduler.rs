use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::foundation::error::{AvmixError, AvmixResult};
use crate::media::{FramePoll, FrameSource, MediaProvider};
use crate::props::{PropType, PropValue, PropertyHost};
use crate::render::Texture;
use crate::sequence::decl::{SequenceDecl, SourceDecl};
use crate::timing::{Clock, LoopCount, TimeSpec};
use crate::transition::{Transition, TransitionRegistry};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SequenceState {
    Inactive,
    /// The first source is open but not yet playing.
    Prefetching,
    Playing,
    /// Current and next sources both active.
    Transitioning,
    Stopped,
}

/// Settings shared by all sequences of a mixer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SchedulerSettings {
    /// Default source prefetch, seconds.
    pub prefetch: f64,
    /// Output frame duration, used for audio fade ramps.
    pub frame_dur: f64,
    pub width: u32,
    pub height: u32,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            prefetch: 0.5,
            frame_dur: 1.0 / 25.0,
            width: 1920,
            height: 1080,
        }
    }
}

/// A source that has been opened for playback.
#[derive(Debug)]
struct ActiveSource {
    index: usize,
    /// Copy of the declaration at activation; later edits apply to the next activation.
    decl: SourceDecl,
    /// Clock time where media time `decl.start` plays.
    begin: f64,
    /// Clock time where the source ends (`f64::INFINITY` when unbounded).
    end: f64,
    inputs: Vec<Box<dyn FrameSource>>,
    frame: Option<Texture>,
    pending: bool,
    ended: bool,
}

impl ActiveSource {
    fn media_time(&self, now: f64) -> f64 {
        (now - self.begin).max(0.0) + self.decl.start
    }
}

/// Per-source playback report for a frame.
#[derive(Clone, Debug, PartialEq)]
pub struct SourceStatus {
    pub index: usize,
    pub id: Option<String>,
    pub media_time: f64,
    pub audio_gain: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SequenceStatus {
    pub id: Option<String>,
    pub state: SequenceState,
    pub current: Option<SourceStatus>,
    pub next: Option<SourceStatus>,
    /// Transition ratio, 0 outside transitions.
    pub ratio: f64,
}

/// Current frames of a sequence, as consumed by scenes.
#[derive(Clone, Debug, Default)]
pub struct SequenceFrames {
    pub current: Option<Texture>,
    pub next: Option<Texture>,
    pub ratio: f64,
}

/// Playback timeline over an ordered list of sources.
#[derive(Debug)]
pub struct Sequence {
    decl: SequenceDecl,
    transition: Option<Transition>,
    registry: Arc<TransitionRegistry>,
    state: SequenceState,
    start: Option<f64>,
    stop: Option<f64>,
    clock: Clock,
    current: Option<ActiveSource>,
    next: Option<ActiveSource>,
    /// Completed passes over the source list.
    iteration: u64,
    /// Pass number of the prefetched next source.
    pending_iteration: u64,
    ratio: f64,
}

impl Sequence {
    pub fn new(decl: SequenceDecl, registry: Arc<TransitionRegistry>, clock: &Clock) -> Self {
        let transition = decl
            .transition
            .clone()
            .map(|spec| Transition::new(spec, registry.clone()));
        let start = decl.start.resolve(clock);
        let stop = decl.stop.resolve(clock);
        Self {
            decl,
            transition,
            registry,
            state: SequenceState::Inactive,
            start,
            stop,
            clock: *clock,
            current: None,
            next: None,
            iteration: 0,
            pending_iteration: 0,
            ratio: 0.0,
        }
    }

    pub fn id(&self) -> Option<&str> {
        self.decl.id.as_deref()
    }

    pub fn decl(&self) -> &SequenceDecl {
        &self.decl
    }

    pub fn state(&self) -> SequenceState {
        self.state
    }

    pub fn transition(&self) -> Option<&Transition> {
        self.transition.as_ref()
    }

    pub fn transition_mut(&mut self) -> Option<&mut Transition> {
        self.transition.as_mut()
    }

    /// Resolved start time, if active.
    pub fn start_time(&self) -> Option<f64> {
        self.start
    }

    /// Whether `start` has been reached and the sequence is not stopped.
    pub fn is_active(&self) -> bool {
        matches!(
            self.state,
            SequenceState::Prefetching | SequenceState::Playing | SequenceState::Transitioning
        )
    }

    /// Whether an active source is waiting for its first frame.
    pub fn is_waiting(&self) -> bool {
        let waiting = |s: &Option<ActiveSource>| s.as_ref().is_some_and(|s| s.pending && s.frame.is_none());
        match self.state {
            SequenceState::Playing => waiting(&self.current),
            SequenceState::Transitioning => waiting(&self.current) || waiting(&self.next),
            _ => false,
        }
    }

    /// Whether an active source has a pending poll (its prior frame is being reused).
    pub fn has_stale_frame(&self) -> bool {
        self.current.as_ref().is_some_and(|s| s.pending && s.frame.is_some())
    }

    /// Clock used when properties are written between frames.
    pub fn sync_clock(&mut self, clock: &Clock) {
        self.clock = *clock;
    }

    /// Apply a reloaded declaration. `start` is kept while active; the playing source keeps
    /// its old declaration until the next activation.
    pub fn update_decl(&mut self, decl: SequenceDecl) {
        if decl == self.decl {
            return;
        }
        let active = self.is_active();
        if decl.stop != self.decl.stop {
            self.stop = decl.stop.resolve(&self.clock);
        }
        let restart = !active && decl.start != self.decl.start;
        if restart {
            self.start = decl.start.resolve(&self.clock);
            self.reset();
        }
        match (&mut self.transition, decl.transition.clone()) {
            (Some(t), Some(spec)) => t.update_spec(spec),
            (slot, spec) => {
                *slot = spec.map(|s| Transition::new(s, self.registry.clone()));
            }
        }
        let start = if active {
            self.decl.start
        } else {
            decl.start
        };
        self.decl = SequenceDecl { start, ..decl };
    }

    /// Release all sources and go back to waiting for `start`.
    fn reset(&mut self) {
        self.current = None;
        self.next = None;
        self.iteration = 0;
        self.ratio = 0.0;
        self.state = SequenceState::Inactive;
    }

    fn stop_now(&mut self, why: &str) {
        if self.state != SequenceState::Stopped {
            debug!(id = self.id().unwrap_or(""), why, "sequence stopped");
        }
        self.current = None;
        self.next = None;
        self.ratio = 0.0;
        self.state = SequenceState::Stopped;
    }

    fn prefetch_for(&self, decl: &SourceDecl, settings: &SchedulerSettings) -> f64 {
        decl.prefetch.unwrap_or(settings.prefetch)
    }

    fn transition_dur(&self) -> f64 {
        self.transition.as_ref().map_or(0.0, Transition::dur)
    }

    /// Index and pass number of the source after `index`, honoring `loop`.
    fn successor(&self, index: usize, iteration: u64) -> Option<(usize, u64)> {
        let n = self.decl.sources.len();
        if n == 0 {
            return None;
        }
        if index + 1 < n {
            return Some((index + 1, iteration));
        }
        self.decl
            .looping
            .allows(iteration + 1)
            .then_some((0, iteration + 1))
    }

    /// Open the first openable source at or after `index`. Failures are skipped with a
    /// warning; gives up after one full pass over the list.
    fn open_from(
        &self,
        index: usize,
        iteration: u64,
        begin: f64,
        provider: &dyn MediaProvider,
        settings: &SchedulerSettings,
    ) -> Option<(ActiveSource, u64)> {
        let mut idx = index;
        let mut iter = iteration;
        for _ in 0..self.decl.sources.len() {
            let decl = self.decl.sources[idx].clone();
            match open_source(idx, decl, begin, provider, settings) {
                Ok(src) => return Some((src, iter)),
                Err(err) => {
                    warn!(
                        id = self.id().unwrap_or(""),
                        source = self.decl.sources[idx].id.as_deref().unwrap_or(""),
                        error = %err,
                        "skipping source"
                    );
                }
            }
            (idx, iter) = self.successor(idx, iter)?;
        }
        None
    }

    /// Advance the timeline to `clock.now` and pull frames.
    pub fn tick(
        &mut self,
        clock: &Clock,
        provider: &dyn MediaProvider,
        settings: &SchedulerSettings,
    ) {
        self.clock = *clock;
        let now = clock.now;

        if self.stop.is_some_and(|stop| now >= stop) && self.state != SequenceState::Stopped {
            self.stop_now("stop time reached");
            return;
        }

        match self.state {
            SequenceState::Stopped => return,
            SequenceState::Inactive => {
                let Some(start) = self.start else {
                    return;
                };
                let Some(first) = self.decl.sources.first() else {
                    return;
                };
                if now < start - self.prefetch_for(first, settings) {
                    return;
                }
                match self.open_from(0, 0, start, provider, settings) {
                    Some((src, iter)) => {
                        self.iteration = iter;
                        self.current = Some(src);
                        self.state = SequenceState::Prefetching;
                        debug!(id = self.id().unwrap_or(""), "sequence prefetching");
                    }
                    None => {
                        self.stop_now("no playable source");
                        return;
                    }
                }
            }
            _ => {}
        }

        if self.state == SequenceState::Prefetching {
            let begin = self.current.as_ref().map_or(now, |c| c.begin);
            if now < begin {
                self.poll_frames(now);
                return;
            }
            self.state = SequenceState::Playing;
            debug!(id = self.id().unwrap_or(""), "sequence playing");
        }

        self.advance(now, provider, settings);
        self.poll_frames(now);
        self.handle_early_end(now, provider, settings);
    }

    fn advance(&mut self, now: f64, provider: &dyn MediaProvider, settings: &SchedulerSettings) {
        // Promotion can cascade when ticks are sparse.
        for _ in 0..=self.decl.sources.len() {
            let Some(cur) = self.current.as_ref() else {
                self.stop_now("no current source");
                return;
            };
            let (index, end) = (cur.index, cur.end);
            let dur = self.transition_dur();

            if self.next.is_none() && end.is_finite() {
                if let Some((next_idx, next_iter)) = self.successor(index, self.iteration) {
                    let next_decl = &self.decl.sources[next_idx];
                    let single_loop = self.decl.sources.len() == 1;
                    let begin = if single_loop { end } else { end - dur };
                    if now >= begin - self.prefetch_for(next_decl, settings) {
                        if let Some((src, iter)) =
                            self.open_from(next_idx, next_iter, begin, provider, settings)
                        {
                            self.next = Some(src);
                            self.pending_iteration = iter;
                        }
                    }
                }
            }

            if now < end {
                let window_start = match &self.next {
                    Some(n) => n.begin,
                    None => end,
                };
                if self.next.is_some() && now >= window_start && window_start < end {
                    self.state = SequenceState::Transitioning;
                    self.ratio = ((now - window_start) / (end - window_start)).clamp(0.0, 1.0);
                } else {
                    self.state = SequenceState::Playing;
                    self.ratio = 0.0;
                }
                return;
            }

            // Current source is over.
            match self.next.take() {
                Some(next) => {
                    debug!(
                        id = self.id().unwrap_or(""),
                        from = index,
                        to = next.index,
                        "source switch"
                    );
                    self.iteration = self.pending_iteration;
                    self.current = Some(next);
                    self.state = SequenceState::Playing;
                    self.ratio = 0.0;
                }
                None => {
                    self.stop_now("sources exhausted");
                    return;
                }
            }
        }
    }

    fn poll_frames(&mut self, now: f64) {
        for src in [&mut self.current, &mut self.next].into_iter().flatten() {
            let t = src.media_time(now);
            if now < src.begin {
                continue;
            }
            poll_source(src, t);
        }
    }

    /// Sources without a known duration end when their inputs end. Process-backed sources
    /// with `keep_alive` are restarted instead.
    fn handle_early_end(
        &mut self,
        now: f64,
        provider: &dyn MediaProvider,
        settings: &SchedulerSettings,
    ) {
        let id = self.decl.id.clone().unwrap_or_default();
        let Some(cur) = self.current.as_mut() else {
            return;
        };
        if !cur.ended || now >= cur.end {
            return;
        }
        if cur.decl.keep_alive && cur.decl.is_process_backed() {
            let seek = if cur.decl.seek {
                cur.media_time(now)
            } else {
                cur.decl.start
            };
            info!(id = %id, source = cur.index, seek, "restarting process-backed source");
            match open_inputs(&cur.decl, seek, provider, settings) {
                Ok(inputs) => {
                    cur.inputs = inputs;
                    cur.ended = false;
                    cur.begin = now - (seek - cur.decl.start);
                }
                Err(err) => {
                    warn!(id = %id, source = cur.index, error = %err, "restart failed");
                    cur.end = now;
                }
            }
        } else {
            cur.end = now;
        }
    }

    /// Frames for scene composition.
    pub fn frames(&self) -> SequenceFrames {
        match self.state {
            SequenceState::Playing => SequenceFrames {
                current: self.current.as_ref().and_then(|c| c.frame.clone()),
                next: None,
                ratio: 0.0,
            },
            SequenceState::Transitioning => SequenceFrames {
                current: self.current.as_ref().and_then(|c| c.frame.clone()),
                next: self.next.as_ref().and_then(|c| c.frame.clone()),
                ratio: self.ratio,
            },
            _ => SequenceFrames::default(),
        }
    }

    pub fn status(&self, settings: &SchedulerSettings) -> SequenceStatus {
        let now = self.clock.now;
        let transitioning = self.state == SequenceState::Transitioning;
        let report = |s: &ActiveSource, share: f64| SourceStatus {
            index: s.index,
            id: s.decl.id.clone(),
            media_time: s.media_time(now),
            audio_gain: audio_gain(s, now, share, settings.frame_dur),
        };
        let playing = matches!(
            self.state,
            SequenceState::Playing | SequenceState::Transitioning
        );
        SequenceStatus {
            id: self.decl.id.clone(),
            state: self.state,
            current: self
                .current
                .as_ref()
                .filter(|_| playing)
                .map(|c| report(c, if transitioning { 1.0 - self.ratio } else { 1.0 })),
            next: self
                .next
                .as_ref()
                .filter(|_| transitioning)
                .map(|n| report(n, self.ratio)),
            ratio: if transitioning { self.ratio } else { 0.0 },
        }
    }

    /// Index of the current source.
    pub fn current_index(&self) -> Option<usize> {
        self.current.as_ref().map(|c| c.index)
    }

    pub fn next_index(&self) -> Option<usize> {
        self.next.as_ref().map(|c| c.index)
    }
}

fn audio_gain(s: &ActiveSource, now: f64, share: f64, frame_dur: f64) -> f64 {
    let mut gain = s.decl.volume;
    if s.decl.mix {
        gain *= share;
    }
    if frame_dur > 0.0 {
        if s.decl.fade.fades_in() {
            gain *= ((now - s.begin) / frame_dur).clamp(0.0, 1.0);
        }
        if s.decl.fade.fades_out() && s.end.is_finite() {
            gain *= ((s.end - now) / frame_dur).clamp(0.0, 1.0);
        }
    }
    gain
}

fn open_inputs(
    decl: &SourceDecl,
    start: f64,
    provider: &dyn MediaProvider,
    settings: &SchedulerSettings,
) -> AvmixResult<Vec<Box<dyn FrameSource>>> {
    decl.urls
        .iter()
        .map(|u| provider.open(&u.request(start, settings.width, settings.height)))
        .collect()
}

fn open_source(
    index: usize,
    decl: SourceDecl,
    begin: f64,
    provider: &dyn MediaProvider,
    settings: &SchedulerSettings,
) -> AvmixResult<ActiveSource> {
    let inputs = open_inputs(&decl, decl.start, provider, settings)?;
    let media_end = match decl.stop {
        Some(stop) => Some(stop),
        None => inputs
            .iter()
            .filter_map(|i| i.duration())
            .reduce(f64::max),
    };
    let length = media_end.map_or(f64::INFINITY, |e| e - decl.start);
    if length <= 0.0 {
        return Err(AvmixError::resource(format!(
            "source {index} has no media after start {}",
            decl.start
        )));
    }
    Ok(ActiveSource {
        index,
        decl,
        begin,
        end: begin + length,
        inputs,
        frame: None,
        pending: false,
        ended: false,
    })
}

fn poll_source(src: &mut ActiveSource, media_time: f64) {
    let mut got = None;
    let mut all_ended = !src.inputs.is_empty();
    let mut pending = false;
    for (input, url) in src.inputs.iter_mut().zip(&src.decl.urls) {
        match input.poll(media_time) {
            FramePoll::Ready(frame) => {
                all_ended = false;
                if got.is_none() && url.media.has_video() {
                    got = Some(frame);
                }
            }
            FramePoll::Pending => {
                all_ended = false;
                pending = true;
            }
            FramePoll::Ended => {}
        }
    }
    src.pending = got.is_none() && pending;
    if let Some(frame) = got {
        src.frame = Some(frame);
    }
    src.ended = all_ended;
}

impl PropertyHost for Sequence {
    fn prop_type(&self, name: &str) -> Option<PropType> {
        match name {
            "id" => Some(PropType::String),
            "loop" => Some(PropType::Integer),
            "start" | "stop" => Some(PropType::Time),
            _ => None,
        }
    }

    fn get_property(&self, name: &str) -> Option<PropValue> {
        match name {
            "id" => self.decl.id.clone().map(PropValue::Str),
            "loop" => Some(PropValue::Number(self.decl.looping.as_number())),
            "start" => Some(self.decl.start.to_prop()),
            "stop" => Some(self.decl.stop.to_prop()),
            _ => None,
        }
    }

    fn set_property(&mut self, name: &str, value: PropValue) -> AvmixResult<()> {
        match name {
            "id" => Err(AvmixError::update("'id' is not updatable")),
            "loop" => {
                let n = value
                    .as_f64()
                    .ok_or_else(|| AvmixError::update("loop expects a number"))?;
                self.decl.looping = LoopCount::from_number(n)
                    .map_err(|e| AvmixError::update(e.to_string()))?;
                Ok(())
            }
            "start" => {
                let spec = TimeSpec::from_prop(&value)?;
                self.decl.start = spec;
                self.start = spec.resolve(&self.clock);
                // A new start time restarts playback from the first source.
                self.reset();
                debug!(id = self.id().unwrap_or(""), start = ?self.start, "sequence start changed");
                Ok(())
            }
            "stop" => {
                let spec = TimeSpec::from_prop(&value)?;
                self.decl.stop = spec;
                self.stop = spec.resolve(&self.clock);
                Ok(())
            }
            _ => Err(AvmixError::update(format!(
                "sequence has no property '{name}'"
            ))),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/sequence/scheduler.rs"]
mod tests;
