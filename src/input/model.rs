use serde::{Deserialize, Serialize};

use crate::{input::ImageRef, task::TaskKind};

/// Inputs of one dispatch call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskRequest {
    /// Which sub-task to ask the model for.
    pub kind: TaskKind,

    /// Natural-language instruction, e.g. "the red cup on the left".
    /// Required by tasks whose prompt embeds it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instruction: Option<String>,

    /// Scene image attached to the user turn.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<ImageRef>,

    /// Response budget override for this request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

impl TaskRequest {
    pub fn new(kind: TaskKind) -> Self {
        Self {
            kind,
            instruction: None,
            image: None,
            max_tokens: None,
        }
    }

    pub fn with_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.instruction = Some(instruction.into());
        self
    }

    pub fn with_image(mut self, image: ImageRef) -> Self {
        self.image = Some(image);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}
