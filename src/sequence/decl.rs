use crate::foundation::error::{AvmixError, AvmixResult};
use crate::foundation::json::{self, Object};
use crate::media::{MediaFilter, OpenRequest, Port};
use crate::timing::{LoopCount, TimeSpec};
use crate::transition::TransitionSpec;

/// One input endpoint of a source. Re-evaluated on every activation.
#[derive(Clone, Debug, PartialEq)]
pub struct SourceUrl {
    pub url: String,
    pub port: Port,
    pub media: MediaFilter,
    pub opts: Option<String>,
}

impl SourceUrl {
    pub fn from_json(v: &serde_json::Value) -> AvmixResult<Self> {
        match v {
            serde_json::Value::String(s) => Ok(Self {
                url: s.clone(),
                port: Port::InProcess,
                media: MediaFilter::All,
                opts: None,
            }),
            serde_json::Value::Object(obj) => {
                json::warn_unknown(obj, &["in", "url", "port", "media", "opts"], "source url", None);
                let url = json::opt_str(obj, "in")?
                    .or(json::opt_str(obj, "url")?)
                    .ok_or_else(|| AvmixError::config("source url requires 'in'"))?;
                Ok(Self {
                    url,
                    port: Port::parse(&json::str_or(obj, "port", "")?)?,
                    media: MediaFilter::parse(&json::str_or(obj, "media", "all")?)?,
                    opts: json::opt_str(obj, "opts")?,
                })
            }
            other => Err(AvmixError::config(format!("invalid source url {other}"))),
        }
    }

    pub fn request(&self, start: f64, width: u32, height: u32) -> OpenRequest {
        OpenRequest {
            url: self.url.clone(),
            port: self.port.clone(),
            media: self.media,
            start,
            opts: self.opts.clone(),
            width,
            height,
        }
    }
}

/// Audio gain ramp at the edges of a source's activation window.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum FadePolicy {
    #[default]
    None,
    In,
    Out,
    InOut,
}

impl FadePolicy {
    pub fn parse(s: &str) -> AvmixResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "none" => Ok(Self::None),
            "in" => Ok(Self::In),
            "out" => Ok(Self::Out),
            "inout" | "in_out" => Ok(Self::InOut),
            other => Err(AvmixError::config(format!("unknown fade '{other}'"))),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::In => "in",
            Self::Out => "out",
            Self::InOut => "inout",
        }
    }

    pub fn fades_in(&self) -> bool {
        matches!(self, Self::In | Self::InOut)
    }

    pub fn fades_out(&self) -> bool {
        matches!(self, Self::Out | Self::InOut)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SourceDecl {
    pub id: Option<String>,
    pub urls: Vec<SourceUrl>,
    /// Media offset where playback begins, seconds.
    pub start: f64,
    /// Media offset where playback ends; `None` plays to the media end.
    pub stop: Option<f64>,
    /// Transition ratio modulates audio volume.
    pub mix: bool,
    pub fade: FadePolicy,
    pub volume: f64,
    /// Seconds before activation to open the source; `None` uses the mixer default.
    pub prefetch: Option<f64>,
    /// Restart process-backed inputs that end early.
    pub keep_alive: bool,
    /// On restart, resume at the current media time instead of `start`.
    pub seek: bool,
}

const SOURCE_KEYS: &[&str] = &[
    "id", "type", "src", "start", "stop", "mix", "fade", "volume", "prefetch", "keep_alive",
    "seek",
];

impl SourceDecl {
    pub fn from_json(v: &serde_json::Value) -> AvmixResult<Self> {
        let obj = json::as_object(v, "source")?;
        let id = json::opt_str(obj, "id")?;
        json::warn_unknown(obj, SOURCE_KEYS, "source", id.as_deref());
        Self::from_object(obj, id)
    }

    pub(crate) fn from_object(obj: &Object, id: Option<String>) -> AvmixResult<Self> {
        let urls = match obj.get("src") {
            Some(serde_json::Value::Array(items)) => items
                .iter()
                .map(SourceUrl::from_json)
                .collect::<AvmixResult<Vec<_>>>()?,
            Some(v) => vec![SourceUrl::from_json(v)?],
            None => Vec::new(),
        };
        if urls.is_empty() {
            return Err(AvmixError::config("source requires at least one 'src'"));
        }
        let start = json::f64_or(obj, "start", 0.0)?.max(0.0);
        let stop = match json::f64_or(obj, "stop", -1.0)? {
            s if s < 0.0 => None,
            s if s <= start => {
                return Err(AvmixError::config(format!(
                    "source stop {s} must be after start {start}"
                )));
            }
            s => Some(s),
        };
        let prefetch = match obj.get("prefetch") {
            None => None,
            Some(_) => Some(json::f64_or(obj, "prefetch", 0.0)?.max(0.0)),
        };
        Ok(Self {
            id,
            urls,
            start,
            stop,
            mix: json::bool_or(obj, "mix", true)?,
            fade: FadePolicy::parse(&json::str_or(obj, "fade", "none")?)?,
            volume: json::f64_or(obj, "volume", 1.0)?.max(0.0),
            prefetch,
            keep_alive: json::bool_or(obj, "keep_alive", false)?,
            seek: json::bool_or(obj, "seek", false)?,
        })
    }

    pub fn is_process_backed(&self) -> bool {
        self.urls.iter().any(|u| u.port.is_process_backed())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SequenceDecl {
    pub id: Option<String>,
    pub looping: LoopCount,
    pub start: TimeSpec,
    pub stop: TimeSpec,
    pub transition: Option<TransitionSpec>,
    pub sources: Vec<SourceDecl>,
}

const SEQUENCE_KEYS: &[&str] = &[
    "id", "type", "loop", "start", "stop", "transition", "seq",
];

impl SequenceDecl {
    pub fn from_json(v: &serde_json::Value) -> AvmixResult<Self> {
        let obj = json::as_object(v, "sequence")?;
        let id = json::opt_str(obj, "id")?;
        json::warn_unknown(obj, SEQUENCE_KEYS, "sequence", id.as_deref());

        let mut sources = Vec::new();
        if let Some(list) = obj.get("seq").and_then(serde_json::Value::as_array) {
            for s in list {
                if s.as_object().is_some_and(json::is_skipped) {
                    continue;
                }
                sources.push(SourceDecl::from_json(s)?);
            }
        }
        let transition = match obj.get("transition") {
            None | Some(serde_json::Value::Null) => None,
            Some(t) => Some(TransitionSpec::from_json(t)?),
        };
        Ok(Self {
            id,
            looping: obj
                .get("loop")
                .map_or(Ok(LoopCount::Once), LoopCount::parse_json)?,
            start: obj
                .get("start")
                .map_or(Ok(TimeSpec::Offset(0.0)), TimeSpec::parse_json)?,
            stop: obj
                .get("stop")
                .map_or(Ok(TimeSpec::Inactive), TimeSpec::parse_json)?,
            transition,
            sources,
        })
    }

    /// Root-level `source` shorthand: a sequence playing that single source.
    pub fn from_source_root(v: &serde_json::Value) -> AvmixResult<Self> {
        let obj = json::as_object(v, "source")?;
        let id = json::opt_str(obj, "id")?;
        json::warn_unknown(obj, SOURCE_KEYS, "source", id.as_deref());
        let source = SourceDecl::from_object(obj, None)?;
        Ok(Self {
            id,
            looping: LoopCount::Once,
            start: TimeSpec::Offset(0.0),
            stop: TimeSpec::Inactive,
            transition: None,
            sources: vec![source],
        })
    }
}
