use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::TaskError;

/// The closed set of sub-tasks the planner can ask the model service for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    ClassifyUserPrompt,
    DecomposeUserPrompt,
    GenerateInstruction,
    MarkBoundingBox,
    CheckGraspSuccess,
    CheckInstructionComplete,
    CheckUserPromptComplete,
}

impl TaskKind {
    pub const ALL: [TaskKind; 7] = [
        TaskKind::ClassifyUserPrompt,
        TaskKind::DecomposeUserPrompt,
        TaskKind::GenerateInstruction,
        TaskKind::MarkBoundingBox,
        TaskKind::CheckGraspSuccess,
        TaskKind::CheckInstructionComplete,
        TaskKind::CheckUserPromptComplete,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskKind::ClassifyUserPrompt => "classify_user_prompt",
            TaskKind::DecomposeUserPrompt => "decompose_user_prompt",
            TaskKind::GenerateInstruction => "generate_instruction",
            TaskKind::MarkBoundingBox => "mark_bounding_box",
            TaskKind::CheckGraspSuccess => "check_grasp_success",
            TaskKind::CheckInstructionComplete => "check_instruction_complete",
            TaskKind::CheckUserPromptComplete => "check_user_prompt_complete",
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TaskKind {
    type Err = TaskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TaskKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| TaskError::UnknownTaskKind(s.to_string()))
    }
}
