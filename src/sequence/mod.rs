//! Sequences: timelines of sources with transitions between them.

mod decl;
mod scheduler;

pub use decl::{FadePolicy, SequenceDecl, SourceDecl, SourceUrl};
pub use scheduler::{
    SchedulerSettings, Sequence, SequenceFrames, SequenceState, SequenceStatus, SourceStatus,
};
