//! Generation timeline
//!
//! Orders the commits of the target repository into generations, resolves the
//! tracked file at each one and keeps everything in step with a repository
//! that changes underneath the running process.

pub mod classify;
pub mod content;
pub mod engine;
pub mod generation;

pub use classify::{classify, detect_style, CodeStyle, Language, LanguageFamily};
pub use content::{AbsentReason, ContentResult};
pub use engine::{
    Comparison, EngineFault, EngineStatus, FaultKind, Pane, RefreshJob, TimelineEngine,
    TimelineSnapshot, Walk,
};
pub use generation::{Generation, Position};
