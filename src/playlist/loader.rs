use std::collections::HashSet;

use serde_json::Value;
use tracing::{debug, warn};

use crate::foundation::error::{AvmixError, AvmixResult};
use crate::foundation::json::{self, Object};
use crate::playlist::script::ScriptDecl;
use crate::scene::{NodeDecl, NodeDeclKind, OffscreenMode};
use crate::sequence::SequenceDecl;
use crate::timer::TimerDecl;

/// Kind of a playlist root object.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RootKind {
    Sequence,
    /// A single source, played as a one-entry sequence.
    Source,
    Scene,
    Group,
    Timer,
    Script,
    Config,
}

impl RootKind {
    pub fn parse(s: &str) -> AvmixResult<Self> {
        match s.trim() {
            "sequence" => Ok(Self::Sequence),
            "source" => Ok(Self::Source),
            "scene" => Ok(Self::Scene),
            "group" => Ok(Self::Group),
            "timer" => Ok(Self::Timer),
            "script" => Ok(Self::Script),
            "config" => Ok(Self::Config),
            other => Err(AvmixError::config(format!("unknown root type '{other}'"))),
        }
    }

    /// Explicit `type`, or the kind implied by the object's keys.
    pub fn of(obj: &Object) -> AvmixResult<Self> {
        if let Some(t) = json::opt_str(obj, "type")? {
            return Self::parse(&t);
        }
        let has = |k: &str| obj.contains_key(k);
        Ok(if has("seq") {
            Self::Sequence
        } else if has("src") {
            Self::Source
        } else if has("scenes") {
            Self::Group
        } else if has("keys") || has("anims") {
            Self::Timer
        } else if has("script") {
            Self::Script
        } else {
            Self::Scene
        })
    }
}

/// A parsed playlist, split by root kind in declaration order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Playlist {
    pub sequences: Vec<SequenceDecl>,
    /// Root scenes and groups.
    pub nodes: Vec<NodeDecl>,
    pub timers: Vec<TimerDecl>,
    pub scripts: Vec<ScriptDecl>,
    /// Merged `config` objects.
    pub config: Option<Object>,
    /// Root objects dropped because they failed to parse.
    pub rejected: usize,
}

impl Playlist {
    /// Parse playlist text. Only malformed JSON fails; bad root objects are logged and dropped.
    #[tracing::instrument(level = "debug", skip(text))]
    pub fn parse(text: &str, file: Option<&str>) -> AvmixResult<Self> {
        let root: Value = serde_json::from_str(text).map_err(|e| {
            AvmixError::config(format!("{}: invalid JSON: {e}", file.unwrap_or("playlist")))
        })?;
        let items = match root {
            Value::Array(items) => items,
            obj @ Value::Object(_) => vec![obj],
            other => {
                return Err(AvmixError::config(format!(
                    "playlist root must be an object or array, got {other}"
                )));
            }
        };

        let mut out = Self::default();
        let mut loader = Loader {
            file: file.unwrap_or(""),
            sources: HashSet::new(),
            sequence_ids: HashSet::new(),
        };
        for item in &items {
            let id = item.get("id").and_then(Value::as_str).unwrap_or("");
            if item.as_object().is_some_and(json::is_skipped) {
                debug!(file = loader.file, id, "skipped root object");
                continue;
            }
            if let Err(err) = loader.push(&mut out, item) {
                warn!(file = loader.file, id, error = %err, "playlist object rejected");
                out.rejected += 1;
            }
        }
        Ok(out)
    }

    /// Number of valid root objects.
    pub fn len(&self) -> usize {
        self.sequences.len()
            + self.nodes.len()
            + self.timers.len()
            + self.scripts.len()
            + usize::from(self.config.is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

struct Loader<'f> {
    file: &'f str,
    /// Ids a scene may consume: sequences and offscreen groups declared so far.
    sources: HashSet<String>,
    sequence_ids: HashSet<String>,
}

impl Loader<'_> {
    fn push(&mut self, out: &mut Playlist, item: &Value) -> AvmixResult<()> {
        let obj = json::as_object(item, "root object")?;
        match RootKind::of(obj)? {
            RootKind::Sequence => self.push_sequence(out, SequenceDecl::from_json(item)?),
            RootKind::Source => self.push_sequence(out, SequenceDecl::from_source_root(item)?),
            RootKind::Scene | RootKind::Group => {
                let mut decl = NodeDecl::from_json(item)?;
                self.check_sources(&mut decl);
                out.nodes.push(decl);
                Ok(())
            }
            RootKind::Timer => {
                out.timers.push(TimerDecl::from_json(item)?);
                Ok(())
            }
            RootKind::Script => {
                out.scripts.push(ScriptDecl::from_json(item)?);
                Ok(())
            }
            RootKind::Config => {
                let cfg = out.config.get_or_insert_with(Object::new);
                for (k, v) in obj {
                    if k != "type" {
                        cfg.insert(k.clone(), v.clone());
                    }
                }
                Ok(())
            }
        }
    }

    fn push_sequence(&mut self, out: &mut Playlist, decl: SequenceDecl) -> AvmixResult<()> {
        if let Some(id) = &decl.id {
            if !self.sequence_ids.insert(id.clone()) {
                return Err(AvmixError::config(format!("duplicate sequence id '{id}'")));
            }
            self.sources.insert(id.clone());
        }
        out.sequences.push(decl);
        Ok(())
    }

    /// Drop scene sources that are not an already declared sequence or offscreen group.
    fn check_sources(&mut self, decl: &mut NodeDecl) {
        match &mut decl.kind {
            NodeDeclKind::Scene { .. } => {
                let id = decl.id.as_deref().unwrap_or("");
                let declared = match json::str_list(&decl.object, "sources") {
                    Ok(list) => list,
                    Err(err) => {
                        warn!(file = self.file, id, property = "sources", error = %err, "invalid sources");
                        decl.object.remove("sources");
                        return;
                    }
                };
                if declared.is_empty() {
                    return;
                }
                let kept: Vec<Value> = declared
                    .into_iter()
                    .filter(|s| {
                        let ok = self.sources.contains(s);
                        if !ok {
                            warn!(file = self.file, id, property = "sources", source = %s, "source is not a previously declared sequence or offscreen group");
                        }
                        ok
                    })
                    .map(Value::String)
                    .collect();
                decl.object.insert("sources".to_owned(), Value::Array(kept));
            }
            NodeDeclKind::Group { children } => {
                for c in children.iter_mut() {
                    self.check_sources(c);
                }
                let offscreen = decl
                    .object
                    .get("offscreen")
                    .and_then(Value::as_str)
                    .and_then(|m| OffscreenMode::parse(m).ok())
                    .is_some_and(|m| m != OffscreenMode::None);
                if let (true, Some(id)) = (offscreen, &decl.id) {
                    self.sources.insert(id.clone());
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/playlist/loader.rs"]
mod tests;
