pub mod catalog;
pub mod kind;
pub mod outcome;

pub use catalog::{DecodeRule, TaskSpec, task_spec};
pub use kind::TaskKind;
pub use outcome::{BoundingBox, PromptType, TaskOutcome};
