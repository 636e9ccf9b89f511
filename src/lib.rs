pub mod config;
pub mod decode;
pub mod error;
pub mod input;
pub mod llm;
pub mod message;
pub mod planner;
pub mod prompt;
pub mod task;
pub mod utils;

pub use config::PlannerConfig;
pub use error::{Error, Result, TaskError};
pub use input::{ImageRef, TaskRequest};
pub use llm::{LlmClient, LlmError, OpenAiClient};
pub use message::Conversation;
pub use planner::GraspPlanner;
pub use task::{BoundingBox, PromptType, TaskKind, TaskOutcome};
