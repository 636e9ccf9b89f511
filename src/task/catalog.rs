//! Prompt templates and decode rules for every task kind.
//!
//! The templates are the main tuning surface of the planner: editing one changes
//! how the model answers, so any change must bump [`PROMPT_TEMPLATE_VERSION`].

use crate::task::TaskKind;

pub const PROMPT_TEMPLATE_VERSION: &str = "2025.1";

/// Fixed text of the system turn, shared by every task.
pub const SYSTEM_PROMPT: &str = "You are a helpful assistant.";

/// Marker replaced by the caller's instruction when a prompt is built.
pub const INSTRUCTION_PLACEHOLDER: &str = "{instruction}";

/// Response budget the planner has always used for every task.
pub const DEFAULT_MAX_TOKENS: u32 = 218;

/// How the raw response text of a task is turned into a typed outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeRule {
    /// Boolean substring rule mapped onto `PromptType`.
    Label,
    /// Bracketed list literal of strings, order preserved.
    StringList,
    /// JSON object whose `target` field must be a string.
    JsonTarget,
    /// JSON object read as a bounding-box record.
    JsonBoundingBox,
    /// Boolean substring rule returned as a plain bool.
    Boolean,
}

#[derive(Debug, Clone)]
pub struct TaskSpec {
    pub kind: TaskKind,
    pub template: &'static str,
    pub requires_instruction: bool,
    pub decode_rule: DecodeRule,
    pub max_tokens: u32,
}

impl TaskSpec {
    const fn new(
        kind: TaskKind,
        template: &'static str,
        requires_instruction: bool,
        decode_rule: DecodeRule,
    ) -> Self {
        Self {
            kind,
            template,
            requires_instruction,
            decode_rule,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }
}

static CLASSIFY_USER_PROMPT_SPEC: TaskSpec = TaskSpec::new(
    TaskKind::ClassifyUserPrompt,
    CLASSIFY_USER_PROMPT,
    true,
    DecodeRule::Label,
);
static DECOMPOSE_USER_PROMPT_SPEC: TaskSpec = TaskSpec::new(
    TaskKind::DecomposeUserPrompt,
    DECOMPOSE_USER_PROMPT,
    true,
    DecodeRule::StringList,
);
static GENERATE_INSTRUCTION_SPEC: TaskSpec = TaskSpec::new(
    TaskKind::GenerateInstruction,
    GENERATE_INSTRUCTION,
    false,
    DecodeRule::JsonTarget,
);
static MARK_BOUNDING_BOX_SPEC: TaskSpec = TaskSpec::new(
    TaskKind::MarkBoundingBox,
    MARK_BOUNDING_BOX,
    true,
    DecodeRule::JsonBoundingBox,
);
static CHECK_GRASP_SUCCESS_SPEC: TaskSpec = TaskSpec::new(
    TaskKind::CheckGraspSuccess,
    CHECK_GRASP_SUCCESS,
    false,
    DecodeRule::Boolean,
);
static CHECK_INSTRUCTION_COMPLETE_SPEC: TaskSpec = TaskSpec::new(
    TaskKind::CheckInstructionComplete,
    CHECK_INSTRUCTION_COMPLETE,
    true,
    DecodeRule::Boolean,
);
static CHECK_USER_PROMPT_COMPLETE_SPEC: TaskSpec = TaskSpec::new(
    TaskKind::CheckUserPromptComplete,
    CHECK_USER_PROMPT_COMPLETE,
    false,
    DecodeRule::Boolean,
);

/// Looks up the catalog entry of a task kind.
pub fn task_spec(kind: TaskKind) -> &'static TaskSpec {
    match kind {
        TaskKind::ClassifyUserPrompt => &CLASSIFY_USER_PROMPT_SPEC,
        TaskKind::DecomposeUserPrompt => &DECOMPOSE_USER_PROMPT_SPEC,
        TaskKind::GenerateInstruction => &GENERATE_INSTRUCTION_SPEC,
        TaskKind::MarkBoundingBox => &MARK_BOUNDING_BOX_SPEC,
        TaskKind::CheckGraspSuccess => &CHECK_GRASP_SUCCESS_SPEC,
        TaskKind::CheckInstructionComplete => &CHECK_INSTRUCTION_COMPLETE_SPEC,
        TaskKind::CheckUserPromptComplete => &CHECK_USER_PROMPT_COMPLETE_SPEC,
    }
}

const CLASSIFY_USER_PROMPT: &str = r#"
Analyze the following user prompt: {instruction}

User prompt types:
- Type I (return True): User prompts with any specific descriptions
Examples:
* Color-based: "green objects"
* Position-based: "objects from the right"
* Property-based: "all cups"
* Combination: "the red cup on the left"

- Type II (return False): Abstract prompts without any object descriptions
Examples: "clear the table", "clean up", "remove everything"

Please determine:
- Is this a Type I prompt? (True/False)
- Provide your reasoning

Return format:
True/False: your reasoning

Examples:
- "grab the green cup" -> True: Contains specific object (cup) and property (green)
- "clear the table" -> False: No specific object characteristics mentioned
"#;

const DECOMPOSE_USER_PROMPT: &str = r#"
For user prompt: {instruction}
Process:
1. Analyze the user prompt and image together:
- Match user prompt descriptions with visible objects in the image
- If a description (e.g., "green objects") matches multiple objects, include all matching objects
- Verify each mentioned object actually exists in the image

2. Based on the robot arm's position (right edge of the screen) and table layout
3. Determine the most efficient grasping sequence
4. Generate a reordered list of objects to grasp

Requirements:
- Only include objects mentioned in the original user prompt
- Keep position information for each object
- Return as a list, ordered by grasping sequence

Expected output format:
["object with position 1", "object with position 2", ...]
"#;

const GENERATE_INSTRUCTION: &str = r#"
Analyze the current desktop layout and select the most suitable object to grasp, considering the following factors:

Grasping Strategy:
1. The robotic arm is positioned on the far right (outside the frame)
2. Grasping Priority Order:
   - Prioritize objects on the right to avoid knocking over other objects during later operations
   - Then consider objects in the middle
   - Finally, consider objects on the left
3. Accessibility Analysis:
   - Relative positions between objects
   - Potential obstacles
   - Whether the grasping path might interfere with other objects

Please provide your response in the following JSON format:
{
    "analysis": {
        "priority_consideration": "Explanation of why this object has priority",
        "accessibility": "Analysis of object's accessibility",
        "risk_assessment": "Potential risks in grasping this object"
    },
    "target": "A comprehensive description of the target object
    (e.g., 'the blue cube on the far right of the desktop, next to the red cylinder')"
}

Ensure the output is in valid JSON format.
Note: The 'target' field should ONLY contain the object's color, shape, and position in a natural, flowing sentence. Do not include any analysis or reasoning in this field.
"#;

const MARK_BOUNDING_BOX: &str = r#"
Analyze the image and identify the best matching object with the description: {instruction}.
Instructions for object analysis:
1. Select ONE object that best matches the description
2. For the selected object, provide:
- A concise label, object name (3-4 words max)
- A detailed description (position, color, shape, context)
- Accurate bbox coordinates

Required JSON format with an example:
```json
{
    "bbox_2d": [x1, y1, x2, y2],
    "label": "green cup",  # Keep this very brief (3-4 words)
    "description": "A cylindrical green ceramic cup located on the right side of the wooden table, next to the laptop"  # Detailed description
}
```

Critical requirements:
- Return EXACTLY ONE object
- "label": Must be brief (3-4 words) for quick reference
- "description": Must be detailed and include spatial context
- Use single JSON object format, not an array
- Ensure bbox coordinates are within image boundaries
"#;

const CHECK_GRASP_SUCCESS: &str = r#"
Analyze the image and determine if the robotic arm has successfully grasped an object:
1. Observe the spatial relationship between the robotic hand and the object
2. Output format: explain your reasoning, then conclude with a boolean value (True=grasped, False=not grasped)
"#;

const CHECK_INSTRUCTION_COMPLETE: &str = r#"
Please check whether {instruction} exists on the desktop. If it does not exist, output True; otherwise, output False.
"#;

const CHECK_USER_PROMPT_COMPLETE: &str = r#"
Please analyze the table in the image:

Requirements:
- Only detect physical objects with noticeable height/thickness (3D objects)
- Exclude from consideration:
* Flat items (papers, tablecloths, mats)
* Light projections
* Shadows
* Surface patterns or textures

Return format:
- True: if the table is empty of 3D objects
- False: if there are any 3D objects, followed by their names

Example responses:
True  (for empty table)
False: cup, bottle, plate  (for table with objects)
"#;
