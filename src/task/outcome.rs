use serde::{Deserialize, Serialize};

use crate::task::TaskKind;

/// Label produced by `ClassifyUserPrompt`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PromptType {
    /// The prompt names concrete objects or properties.
    TypeI,
    /// The prompt is abstract ("clear the table").
    TypeII,
}

/// Bounding-box record produced by `MarkBoundingBox`.
///
/// Coordinates are passed through as the model gave them; range checks
/// against the image belong to the consumer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub bbox_2d: [f64; 4],

    #[serde(default)]
    pub label: String,

    #[serde(default)]
    pub description: String,
}

/// Decoded result of one task, one variant per task kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "task", content = "result", rename_all = "snake_case")]
pub enum TaskOutcome {
    PromptType(PromptType),
    GraspSequence(Vec<String>),
    Target(String),
    BoundingBox(BoundingBox),
    GraspSuccess(bool),
    InstructionComplete(bool),
    UserPromptComplete(bool),
}

impl TaskOutcome {
    /// The task kind that produces this outcome shape.
    pub fn kind(&self) -> TaskKind {
        match self {
            TaskOutcome::PromptType(_) => TaskKind::ClassifyUserPrompt,
            TaskOutcome::GraspSequence(_) => TaskKind::DecomposeUserPrompt,
            TaskOutcome::Target(_) => TaskKind::GenerateInstruction,
            TaskOutcome::BoundingBox(_) => TaskKind::MarkBoundingBox,
            TaskOutcome::GraspSuccess(_) => TaskKind::CheckGraspSuccess,
            TaskOutcome::InstructionComplete(_) => TaskKind::CheckInstructionComplete,
            TaskOutcome::UserPromptComplete(_) => TaskKind::CheckUserPromptComplete,
        }
    }

    /// The boolean determination of the three check tasks.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            TaskOutcome::GraspSuccess(v)
            | TaskOutcome::InstructionComplete(v)
            | TaskOutcome::UserPromptComplete(v) => Some(*v),
            _ => None,
        }
    }
}
