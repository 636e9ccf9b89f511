use crate::{llm::LlmError, task::TaskKind};

/// Failures of one build → complete → decode cycle.
///
/// Decode failures carry the task kind and the raw model text so the caller
/// can log it and decide whether to re-issue the request.
#[derive(Debug, thiserror::Error)]
pub enum TaskError {
    #[error("unknown task kind: {0}")]
    UnknownTaskKind(String),

    #[error("task {task} requires a non-empty instruction")]
    MissingInstruction { task: TaskKind },

    #[error("task {task}: response contains neither 'true' nor 'false': {raw}")]
    MalformedBoolean { task: TaskKind, raw: String },

    #[error("task {task}: response is not a list of strings: {raw}")]
    MalformedList { task: TaskKind, raw: String },

    #[error("task {task}: response does not contain usable JSON: {raw}")]
    MalformedJson { task: TaskKind, raw: String },

    #[error("task {task}: field '{field}' is missing or has the wrong type: {raw}")]
    MalformedField {
        task: TaskKind,
        field: &'static str,
        raw: String,
    },

    #[error("image attachment error: {0}")]
    Image(String),

    #[error(transparent)]
    UpstreamFailure(#[from] LlmError),
}

impl TaskError {
    /// Whether re-issuing the whole request may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            TaskError::MalformedBoolean { .. }
                | TaskError::MalformedList { .. }
                | TaskError::MalformedJson { .. }
                | TaskError::MalformedField { .. }
                | TaskError::UpstreamFailure(_)
        )
    }

    /// The raw model response that failed to decode, if any.
    pub fn raw_response(&self) -> Option<&str> {
        match self {
            TaskError::MalformedBoolean { raw, .. }
            | TaskError::MalformedList { raw, .. }
            | TaskError::MalformedJson { raw, .. }
            | TaskError::MalformedField { raw, .. } => Some(raw),
            _ => None,
        }
    }
}
