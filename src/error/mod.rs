pub mod task_error;

use std::io;

use thiserror::Error as ThisError;

pub use crate::error::task_error::TaskError;
use crate::llm::LlmError;

#[derive(ThisError, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("serde_json error: {0}")]
    SerdeJsonError(#[from] serde_json::Error),

    #[error("config error: {0}")]
    Config(String),

    #[error("llm error: {0}")]
    LlmError(#[from] LlmError),

    #[error("task error: {0}")]
    TaskError(#[from] TaskError),
}

pub type Result<T> = core::result::Result<T, Error>;
