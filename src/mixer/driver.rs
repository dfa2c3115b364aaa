use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::foundation::core::{ReferenceSpace, Rgba8Premul};
use crate::foundation::error::{AvmixError, AvmixResult};
use crate::media::MediaProvider;
use crate::mixer::config::MixerConfig;
use crate::mixer::objects::LiveObjects;
use crate::playlist::{FileWatch, Playlist, Script, apply_updates, parse_updates};
use crate::render::{Canvas, CpuCanvas, Texture};
use crate::scene::{FrameStats, NodeChanges, NodeFactory, RenderEnv, SceneGraph, SceneModuleRegistry, SourceView};
use crate::sequence::{Sequence, SequenceStatus};
use crate::timer::Timer;
use crate::timing::Clock;
use crate::transition::TransitionRegistry;

/// What a playlist load or reload changed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReloadReport {
    pub nodes: NodeChanges,
    pub sequences_added: Vec<Option<String>>,
    pub sequences_updated: Vec<String>,
    pub sequences_removed: Vec<Option<String>>,
    pub timers: usize,
    pub scripts: usize,
    /// Root objects dropped while parsing.
    pub rejected: usize,
}

/// One composed output frame.
#[derive(Clone, Debug)]
pub struct Frame {
    /// Premultiplied RGBA8, row-major, top row first.
    pub pixels: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// Clock time of the frame, seconds.
    pub time: f64,
    pub index: u64,
    pub stats: FrameStats,
}

#[derive(Clone, Debug)]
pub enum FrameOutcome {
    Ready(Frame),
    /// Offline mode: a source has no frame yet. Call again with the same time.
    NotReady,
}

#[derive(Debug)]
enum Pending {
    Reload { text: String, file: Option<String> },
    Updates { text: String, file: Option<String> },
}

/// Playlist-driven compositor.
///
/// All playlist reloads, updates, scripts and timers are applied at the start of
/// [`render_frame`](Self::render_frame), before any node is drawn.
pub struct Mixer {
    config: MixerConfig,
    provider: Box<dyn MediaProvider>,
    transitions: Arc<TransitionRegistry>,
    graph: SceneGraph,
    sequences: Vec<Sequence>,
    timers: Vec<Timer>,
    scripts: Vec<Script>,
    clock: Clock,
    frame_index: u64,
    /// Whether a playlist has been applied; `config` objects are read only before that.
    loaded: bool,
    pending: Vec<Pending>,
    playlist_watch: Option<FileWatch>,
    updates_watch: Option<FileWatch>,
    /// Clock time each sequence id started waiting for a frame (live mode).
    waiting_since: HashMap<String, f64>,
    /// Wall time the current offline wait started.
    blocked_since: Option<Instant>,
    /// Last `reload_tests` step applied.
    reload_step: Option<u64>,
    /// Sequence ids that have shown at least one decoded frame.
    delivered: HashSet<String>,
    /// Shown for a live source that never delivered a frame.
    no_signal: Texture,
    /// Shown for a live source whose frames stopped arriving.
    signal_lost: Texture,
}

impl std::fmt::Debug for Mixer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mixer")
            .field("config", &self.config)
            .field("nodes", &self.graph.len())
            .field("sequences", &self.sequences.len())
            .field("timers", &self.timers.len())
            .field("scripts", &self.scripts.len())
            .field("frame_index", &self.frame_index)
            .finish_non_exhaustive()
    }
}

impl Mixer {
    pub fn new(config: MixerConfig, provider: Box<dyn MediaProvider>) -> AvmixResult<Self> {
        Self::with_registries(
            config,
            provider,
            Arc::new(SceneModuleRegistry::default()),
            Arc::new(TransitionRegistry::default()),
        )
    }

    /// Mixer with custom scene modules and transition types.
    pub fn with_registries(
        config: MixerConfig,
        provider: Box<dyn MediaProvider>,
        modules: Arc<SceneModuleRegistry>,
        transitions: Arc<TransitionRegistry>,
    ) -> AvmixResult<Self> {
        config.validate()?;
        let factory = NodeFactory {
            modules,
            transitions: transitions.clone(),
        };
        Ok(Self {
            config,
            provider,
            transitions,
            graph: SceneGraph::new(factory),
            sequences: Vec::new(),
            timers: Vec::new(),
            scripts: Vec::new(),
            clock: Clock::new(Utc::now()),
            frame_index: 0,
            loaded: false,
            pending: Vec::new(),
            playlist_watch: None,
            updates_watch: None,
            waiting_since: HashMap::new(),
            blocked_since: None,
            reload_step: None,
            delivered: HashSet::new(),
            no_signal: Texture::solid(16, 16, Rgba8Premul::from_straight_rgba(48, 48, 48, 255)),
            signal_lost: Texture::solid(16, 16, Rgba8Premul::from_straight_rgba(96, 24, 24, 255)),
        })
    }

    /// Anchor the clock at a fixed wall-clock origin, for reproducible date specs.
    pub fn set_clock_origin(&mut self, origin: chrono::DateTime<Utc>) {
        self.clock = Clock::new(origin).at(self.clock.now, self.clock.frame);
    }

    pub fn config(&self) -> &MixerConfig {
        &self.config
    }

    pub fn graph(&self) -> &SceneGraph {
        &self.graph
    }

    pub fn sequences(&self) -> &[Sequence] {
        &self.sequences
    }

    pub fn sequence(&self, id: &str) -> Option<&Sequence> {
        self.sequences.iter().find(|s| s.id() == Some(id))
    }

    pub fn timers(&self) -> &[Timer] {
        &self.timers
    }

    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    /// Load playlist text now. At initial load the playlist `config` object is applied.
    ///
    /// Malformed JSON fails and leaves the live objects untouched, so a failed initial load
    /// leaves an empty scene.
    pub fn load_playlist_str(&mut self, text: &str, file: Option<&str>) -> AvmixResult<ReloadReport> {
        let playlist = Playlist::parse(text, file)?;
        Ok(self.apply_playlist(playlist, file))
    }

    /// Load a playlist file now and watch it for changes.
    pub fn load_playlist_file(&mut self, path: impl AsRef<Path>) -> AvmixResult<ReloadReport> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| AvmixError::resource(format!("read '{}': {e}", path.display())))?;
        self.playlist_watch = Some(FileWatch::primed(path));
        self.load_playlist_str(&text, Some(&path.display().to_string()))
    }

    /// Watch an updates file; its current contents are applied on the next poll.
    pub fn watch_updates_file(&mut self, path: impl AsRef<Path>) {
        self.updates_watch = Some(FileWatch::new(path.as_ref()));
    }

    /// Queue a full reload for the next frame.
    pub fn queue_reload_str(&mut self, text: impl Into<String>, file: Option<&str>) {
        self.pending.push(Pending::Reload {
            text: text.into(),
            file: file.map(str::to_owned),
        });
    }

    /// Queue an updates document for the next frame.
    pub fn queue_updates_str(&mut self, text: impl Into<String>, file: Option<&str>) {
        self.pending.push(Pending::Updates {
            text: text.into(),
            file: file.map(str::to_owned),
        });
    }

    /// Check watched files and queue their new contents. Returns the number queued.
    pub fn poll_files(&mut self) -> usize {
        let mut queued = 0;
        if let Some(w) = &mut self.playlist_watch {
            let file = w.path().display().to_string();
            match w.poll() {
                Ok(Some(text)) => {
                    info!(file = %file, "playlist changed; reload queued");
                    self.pending.push(Pending::Reload {
                        text,
                        file: Some(file),
                    });
                    queued += 1;
                }
                Ok(None) => {}
                Err(err) => warn!(file = %file, error = %err, "playlist poll failed"),
            }
        }
        if let Some(w) = &mut self.updates_watch {
            let file = w.path().display().to_string();
            match w.poll() {
                Ok(Some(text)) => {
                    debug!(file = %file, "updates changed");
                    self.pending.push(Pending::Updates {
                        text,
                        file: Some(file),
                    });
                    queued += 1;
                }
                Ok(None) => {}
                Err(err) => warn!(file = %file, error = %err, "updates poll failed"),
            }
        }
        queued
    }

    fn apply_playlist(&mut self, playlist: Playlist, file: Option<&str>) -> ReloadReport {
        let initial = !self.loaded;
        self.loaded = true;
        if let Some(cfg) = &playlist.config {
            if initial {
                self.config.apply_object(cfg);
            } else {
                debug!(file = file.unwrap_or(""), "config ignored after initial load");
            }
        }

        let mut report = ReloadReport {
            rejected: playlist.rejected,
            ..ReloadReport::default()
        };
        report.nodes = self.graph.apply_roots(&playlist.nodes);

        let mut old = std::mem::take(&mut self.sequences);
        for decl in playlist.sequences {
            let matched = decl
                .id
                .as_deref()
                .and_then(|id| old.iter().position(|s| s.id() == Some(id)));
            match matched {
                Some(i) => {
                    let mut seq = old.swap_remove(i);
                    if seq.decl() != &decl {
                        report.sequences_updated.extend(decl.id.clone());
                    }
                    seq.sync_clock(&self.clock);
                    seq.update_decl(decl);
                    self.sequences.push(seq);
                }
                None => {
                    report.sequences_added.push(decl.id.clone());
                    self.sequences
                        .push(Sequence::new(decl, self.transitions.clone(), &self.clock));
                }
            }
        }
        report.sequences_removed = old.iter().map(|s| s.id().map(str::to_owned)).collect();
        drop(old);

        self.timers = playlist
            .timers
            .into_iter()
            .map(|d| Timer::new(d, &self.clock))
            .collect();
        self.scripts = playlist.scripts.into_iter().map(Script::new).collect();
        report.timers = self.timers.len();
        report.scripts = self.scripts.len();
        self.waiting_since.clear();
        let sequences = &self.sequences;
        self.delivered
            .retain(|id| sequences.iter().any(|s| s.id() == Some(id.as_str())));

        info!(
            file = file.unwrap_or(""),
            added = report.nodes.added.len(),
            updated = report.nodes.updated.len(),
            removed = report.nodes.removed.len(),
            sequences = self.sequences.len(),
            timers = report.timers,
            "playlist applied"
        );
        report
    }

    fn apply_pending(&mut self) {
        for p in std::mem::take(&mut self.pending) {
            match p {
                Pending::Reload { text, file } => {
                    if let Err(err) = self.load_playlist_str(&text, file.as_deref()) {
                        warn!(file = file.as_deref().unwrap_or(""), error = %err, "reload failed; keeping current playlist");
                    }
                }
                Pending::Updates { text, file } => match parse_updates(&text, file.as_deref()) {
                    Ok(entries) => {
                        let mut objects = LiveObjects {
                            graph: &mut self.graph,
                            sequences: &mut self.sequences,
                        };
                        apply_updates(&mut objects, &entries, file.as_deref());
                    }
                    Err(err) => warn!(file = file.as_deref().unwrap_or(""), error = %err, "updates ignored"),
                },
            }
        }
    }

    /// Cycle through `reload_tests` playlists, one every `reload_timeout` seconds.
    fn queue_reload_tests(&mut self, now: f64) {
        let tests = &self.config.reload_tests;
        if tests.is_empty() {
            return;
        }
        let step = (now / self.config.reload_timeout).floor().max(0.0) as u64;
        if self.reload_step == Some(step) {
            return;
        }
        let n = tests.len() as u64;
        if step / n > u64::from(self.config.reload_loop) {
            return;
        }
        self.reload_step = Some(step);
        let path = &tests[(step % n) as usize];
        match std::fs::read_to_string(path) {
            Ok(text) => {
                debug!(file = %path, step, "reload test");
                let file = path.clone();
                self.queue_reload_str(text, Some(&file));
            }
            Err(err) => warn!(file = %path, error = %err, "reload test playlist unreadable"),
        }
    }

    /// Compose the frame at clock time `now` (seconds since the mixer started).
    #[tracing::instrument(level = "debug", skip(self), fields(frame = self.frame_index))]
    pub fn render_frame(&mut self, now: f64) -> AvmixResult<FrameOutcome> {
        self.clock = self.clock.at(now, self.frame_index);
        let clock = self.clock;

        for s in &mut self.sequences {
            s.sync_clock(&clock);
        }

        // Mutations first; nothing below changes node properties.
        self.queue_reload_tests(now);
        self.apply_pending();
        {
            let mut objects = LiveObjects {
                graph: &mut self.graph,
                sequences: &mut self.sequences,
            };
            for s in &mut self.scripts {
                s.run(&clock, &mut objects);
            }
            for t in &mut self.timers {
                t.tick(&clock, &mut objects);
            }
        }

        let settings = self.config.scheduler();
        for s in &mut self.sequences {
            s.tick(&clock, self.provider.as_ref(), &settings);
        }

        let waiting: Vec<String> = self
            .sequences
            .iter()
            .filter(|s| s.is_waiting())
            .map(|s| s.id().unwrap_or("").to_owned())
            .collect();
        let timeout = self.config.wait_timeout_ms as f64 / 1000.0;
        if !self.config.live && !waiting.is_empty() {
            match self.blocked_since {
                None => self.blocked_since = Some(Instant::now()),
                Some(since) if since.elapsed().as_secs_f64() > 10.0 * timeout => {
                    return Err(AvmixError::resource(format!(
                        "no frame from sequence(s) {} after {:.1}s",
                        waiting.join(", "),
                        10.0 * timeout
                    )));
                }
                Some(_) => {}
            }
            debug!(sequences = ?waiting, "waiting for source frames");
            return Ok(FrameOutcome::NotReady);
        }
        self.blocked_since = None;
        // Live sources also stall when a delivering input stops producing frames.
        let stalled: Vec<String> = if self.config.live {
            self.sequences
                .iter()
                .filter(|s| s.is_waiting() || s.has_stale_frame())
                .map(|s| s.id().unwrap_or("").to_owned())
                .collect()
        } else {
            Vec::new()
        };
        self.waiting_since.retain(|id, _| stalled.contains(id));
        for id in &stalled {
            self.waiting_since.entry(id.clone()).or_insert(now);
        }

        let mut placeholders = 0;
        let mut signal_lost = 0;
        let mut sources = HashMap::new();
        for s in &self.sequences {
            let Some(id) = s.id() else {
                continue;
            };
            let frames = s.frames();
            let mut view = SourceView {
                current: frames.current,
                next: frames.next,
                ratio: frames.ratio,
                transition: s.transition(),
            };
            let late = self
                .waiting_since
                .get(id)
                .is_some_and(|since| now - since >= timeout);
            if late {
                if self.delivered.contains(id) {
                    view.current = Some(self.signal_lost.clone());
                    signal_lost += 1;
                } else {
                    view.current = Some(self.no_signal.clone());
                }
                placeholders += 1;
            } else if view.current.is_some() && !stalled.iter().any(|s| s == id) {
                self.delivered.insert(id.to_owned());
            }
            sources.insert(id.to_owned(), view);
        }

        let (w, h) = (self.config.width, self.config.height);
        let mut canvas = CpuCanvas::new(w, h)?;
        canvas.clear(self.config.back_color.to_premul());
        let env = RenderEnv {
            space: ReferenceSpace::new(f64::from(w), f64::from(h)),
            t: now,
            maxdepth: self.config.maxdepth,
            sources: &sources,
        };
        let mut stats = self.graph.render(&mut canvas, &env)?;
        stats.placeholders = placeholders;
        stats.signal_lost = signal_lost;

        let frame = Frame {
            pixels: canvas.into_data(),
            width: w,
            height: h,
            time: now,
            index: self.frame_index,
            stats,
        };
        self.frame_index += 1;
        Ok(FrameOutcome::Ready(frame))
    }

    /// Playback and audio gain report for every sequence.
    pub fn sequence_status(&self) -> Vec<SequenceStatus> {
        let settings = self.config.scheduler();
        self.sequences.iter().map(|s| s.status(&settings)).collect()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/mixer/driver.rs"]
mod tests;
