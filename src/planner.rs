use futures::future::join_all;
use tracing::{Instrument, debug, info, info_span};
use uuid::Uuid;

use crate::{
    config::PlannerConfig,
    decode::decode,
    error::{self, TaskError},
    input::{ImageRef, TaskRequest},
    llm::{LlmClient, OpenAiClient},
    prompt::build,
    task::{BoundingBox, PromptType, TaskKind, TaskOutcome, task_spec},
    utils::truncate_for_log,
};

const MAX_PROMPT_LOG_CHARS: usize = 4_000;
const MAX_LLM_OUTPUT_LOG_CHARS: usize = 8_000;

/// Front end that asks the model service for one sub-task at a time.
pub struct GraspPlanner<C: LlmClient> {
    client: C,
    max_tokens: Option<u32>,
}

impl<C: LlmClient> GraspPlanner<C> {
    pub fn new(client: C) -> Self {
        Self {
            client,
            max_tokens: None,
        }
    }

    /// Overrides the catalog response budget for every task.
    pub fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Builds the prompt, asks the model and decodes its answer.
    ///
    /// Nothing is retried here: the model is non-deterministic, so callers
    /// that want a retry re-issue the whole request.
    pub async fn request_task(&self, request: TaskRequest) -> Result<TaskOutcome, TaskError> {
        let kind = request.kind;
        let span = info_span!(
            "request_task",
            request_id = %Uuid::new_v4().simple(),
            task = %kind,
            model = %self.client.model()
        );
        self.run(request).instrument(span).await
    }

    /// Same as [`request_task`](Self::request_task), with the task given by its wire name.
    pub async fn request_task_by_name(
        &self,
        name: &str,
        instruction: Option<&str>,
        image: Option<ImageRef>,
        max_tokens: Option<u32>,
    ) -> Result<TaskOutcome, TaskError> {
        let kind: TaskKind = name.parse()?;
        let request = TaskRequest {
            kind,
            instruction: instruction.map(str::to_string),
            image,
            max_tokens,
        };
        self.request_task(request).await
    }

    /// Runs independent requests concurrently; results keep the input order.
    pub async fn request_tasks(
        &self,
        requests: Vec<TaskRequest>,
    ) -> Vec<Result<TaskOutcome, TaskError>> {
        join_all(requests.into_iter().map(|request| self.request_task(request))).await
    }

    async fn run(&self, request: TaskRequest) -> Result<TaskOutcome, TaskError> {
        let kind = request.kind;
        let conversation = build(kind, request.instruction.as_deref(), request.image.as_ref())?;
        if tracing::enabled!(tracing::Level::DEBUG) {
            debug!(
                prompt = %truncate_for_log(&conversation.user.text(), MAX_PROMPT_LOG_CHARS),
                "task prompt"
            );
        }

        let max_tokens = request
            .max_tokens
            .or(self.max_tokens)
            .unwrap_or(task_spec(kind).max_tokens);
        let raw = self.client.complete(&conversation, max_tokens).await?;
        if tracing::enabled!(tracing::Level::DEBUG) {
            debug!(
                llm_output = %truncate_for_log(&raw, MAX_LLM_OUTPUT_LOG_CHARS),
                "task raw llm output"
            );
        }

        let outcome = decode(kind, &raw)?;
        info!(outcome = ?outcome, "task completed");
        Ok(outcome)
    }

    pub async fn classify_user_prompt(&self, instruction: &str) -> Result<PromptType, TaskError> {
        let request = TaskRequest::new(TaskKind::ClassifyUserPrompt).with_instruction(instruction);
        match self.request_task(request).await? {
            TaskOutcome::PromptType(label) => Ok(label),
            other => Err(unexpected(TaskKind::ClassifyUserPrompt, other)),
        }
    }

    /// Returns the objects named by `instruction` in grasp order.
    pub async fn decompose_user_prompt(
        &self,
        instruction: &str,
        image: Option<ImageRef>,
    ) -> Result<Vec<String>, TaskError> {
        let request = with_image(
            TaskRequest::new(TaskKind::DecomposeUserPrompt).with_instruction(instruction),
            image,
        );
        match self.request_task(request).await? {
            TaskOutcome::GraspSequence(sequence) => Ok(sequence),
            other => Err(unexpected(TaskKind::DecomposeUserPrompt, other)),
        }
    }

    /// Describes the next object to grasp.
    pub async fn generate_instruction(&self, image: Option<ImageRef>) -> Result<String, TaskError> {
        let request = with_image(TaskRequest::new(TaskKind::GenerateInstruction), image);
        match self.request_task(request).await? {
            TaskOutcome::Target(target) => Ok(target),
            other => Err(unexpected(TaskKind::GenerateInstruction, other)),
        }
    }

    pub async fn mark_bounding_box(
        &self,
        instruction: &str,
        image: Option<ImageRef>,
    ) -> Result<BoundingBox, TaskError> {
        let request = with_image(
            TaskRequest::new(TaskKind::MarkBoundingBox).with_instruction(instruction),
            image,
        );
        match self.request_task(request).await? {
            TaskOutcome::BoundingBox(bbox) => Ok(bbox),
            other => Err(unexpected(TaskKind::MarkBoundingBox, other)),
        }
    }

    pub async fn check_grasp_success(&self, image: Option<ImageRef>) -> Result<bool, TaskError> {
        let request = with_image(TaskRequest::new(TaskKind::CheckGraspSuccess), image);
        self.request_bool(request).await
    }

    /// True once the object described by `instruction` is gone from the table.
    pub async fn check_instruction_complete(
        &self,
        instruction: &str,
        image: Option<ImageRef>,
    ) -> Result<bool, TaskError> {
        let request = with_image(
            TaskRequest::new(TaskKind::CheckInstructionComplete).with_instruction(instruction),
            image,
        );
        self.request_bool(request).await
    }

    /// True once the table holds no 3D objects.
    pub async fn check_user_prompt_complete(
        &self,
        image: Option<ImageRef>,
    ) -> Result<bool, TaskError> {
        let request = with_image(TaskRequest::new(TaskKind::CheckUserPromptComplete), image);
        self.request_bool(request).await
    }

    async fn request_bool(&self, request: TaskRequest) -> Result<bool, TaskError> {
        let kind = request.kind;
        let outcome = self.request_task(request).await?;
        outcome.as_bool().ok_or_else(|| unexpected(kind, outcome))
    }
}

impl GraspPlanner<OpenAiClient> {
    /// Connects to the configured OpenAI-compatible server.
    pub async fn connect(config: PlannerConfig) -> error::Result<Self> {
        let max_tokens = config.max_tokens;
        let client = OpenAiClient::connect(config).await?;
        Ok(Self::new(client).with_max_tokens(max_tokens))
    }
}

fn with_image(request: TaskRequest, image: Option<ImageRef>) -> TaskRequest {
    match image {
        Some(image) => request.with_image(image),
        None => request,
    }
}

// The decode table maps each kind to exactly one outcome shape, so this only
// fires if the table and the typed helpers disagree.
fn unexpected(kind: TaskKind, outcome: TaskOutcome) -> TaskError {
    TaskError::MalformedField {
        task: kind,
        field: "outcome",
        raw: format!("{outcome:?}"),
    }
}
