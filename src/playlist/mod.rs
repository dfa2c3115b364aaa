//! Playlist documents: root object parsing, `script` roots, the update protocol, and file
//! change polling.

mod loader;
mod script;
mod update;
mod watch;

pub use loader::{Playlist, RootKind};
pub use script::{Script, ScriptDecl};
pub use update::{UpdateEntry, apply_updates, parse_updates};
pub use watch::FileWatch;
