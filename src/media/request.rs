use crate::foundation::error::{AvmixError, AvmixResult};

/// Transport between the mixer and a source's producer.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub enum Port {
    /// Decoded in the mixer's own pipeline.
    #[default]
    InProcess,
    /// Spawned process writing to a pipe.
    Pipe,
    /// Spawned process serving TCP; `addr` is `HOST:PORT` when given.
    Tcp { addr: Option<String> },
    /// Spawned process on a unix-domain socket.
    TcpUnix,
}

impl Port {
    pub fn parse(s: &str) -> AvmixResult<Self> {
        let s = s.trim();
        match s {
            "" => Ok(Self::InProcess),
            "pipe" => Ok(Self::Pipe),
            "tcp" => Ok(Self::Tcp { addr: None }),
            "tcpu" => Ok(Self::TcpUnix),
            _ => match s.strip_prefix("tcp:") {
                Some(addr) if addr.contains(':') => Ok(Self::Tcp {
                    addr: Some(addr.to_owned()),
                }),
                _ => Err(AvmixError::config(format!("unknown port '{s}'"))),
            },
        }
    }

    /// Whether a separate process produces the media.
    pub fn is_process_backed(&self) -> bool {
        !matches!(self, Self::InProcess)
    }
}

/// Which media types a source URL contributes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum MediaFilter {
    #[default]
    All,
    Audio,
    Video,
}

impl MediaFilter {
    pub fn parse(s: &str) -> AvmixResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "all" => Ok(Self::All),
            "audio" | "a" => Ok(Self::Audio),
            "video" | "v" => Ok(Self::Video),
            other => Err(AvmixError::config(format!("unknown media filter '{other}'"))),
        }
    }

    pub fn has_video(&self) -> bool {
        !matches!(self, Self::Audio)
    }
}

/// Everything a provider needs to open one source URL.
#[derive(Clone, Debug, PartialEq)]
pub struct OpenRequest {
    pub url: String,
    pub port: Port,
    pub media: MediaFilter,
    /// Media time to start from, in seconds.
    pub start: f64,
    /// Extra options passed through to the producer.
    pub opts: Option<String>,
    /// Preferred frame size for synthetic sources.
    pub width: u32,
    pub height: u32,
}

impl OpenRequest {
    pub fn new(url: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            url: url.into(),
            port: Port::InProcess,
            media: MediaFilter::All,
            start: 0.0,
            opts: None,
            width,
            height,
        }
    }
}
