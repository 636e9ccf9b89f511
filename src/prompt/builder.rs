use tracing::debug;

use crate::{
    error::TaskError,
    input::ImageRef,
    message::{Conversation, Turn},
    task::{
        TaskKind,
        catalog::{INSTRUCTION_PLACEHOLDER, SYSTEM_PROMPT},
        task_spec,
    },
};

/// Builds the conversation for one task request.
///
/// Tasks whose prompt embeds the instruction reject a missing or blank one
/// instead of interpolating a placeholder word. The image, when given, is
/// attached after the prompt text of the user turn.
pub fn build(
    kind: TaskKind,
    instruction: Option<&str>,
    image: Option<&ImageRef>,
) -> Result<Conversation, TaskError> {
    let prompt = build_user_prompt(kind, instruction)?;

    let mut user = Turn::user(&prompt);
    if let Some(image) = image {
        user = user.with_image_url(image.to_url()?);
    }

    debug!(
        task = %kind,
        prompt_len = prompt.len(),
        has_image = image.is_some(),
        "built task conversation"
    );
    Ok(Conversation::new(Turn::system(SYSTEM_PROMPT), user))
}

/// Renders the user-turn text of a task.
pub fn build_user_prompt(kind: TaskKind, instruction: Option<&str>) -> Result<String, TaskError> {
    let spec = task_spec(kind);
    if !spec.requires_instruction {
        return Ok(spec.template.trim().to_string());
    }

    let instruction = instruction
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or(TaskError::MissingInstruction { task: kind })?;

    Ok(spec
        .template
        .replace(INSTRUCTION_PLACEHOLDER, instruction)
        .trim()
        .to_string())
}
