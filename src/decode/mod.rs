//! Turns the raw text of a model response into a typed task outcome.
//!
//! Each task kind is decoded by the rule its catalog entry names. Every rule
//! is a pure function of the raw text and fails instead of guessing.

use serde_json::Value;
use tracing::{debug, warn};

use crate::{
    error::TaskError,
    task::{BoundingBox, DecodeRule, PromptType, TaskKind, TaskOutcome, task_spec},
    utils::{extract_json, extract_list, repair_json, truncate_for_log},
};

const MAX_RAW_LOG_CHARS: usize = 2_000;

pub fn decode(kind: TaskKind, raw: &str) -> Result<TaskOutcome, TaskError> {
    let outcome = match task_spec(kind).decode_rule {
        DecodeRule::Label => decode_label(kind, raw),
        DecodeRule::StringList => decode_string_list(kind, raw).map(TaskOutcome::GraspSequence),
        DecodeRule::JsonTarget => decode_target(kind, raw).map(TaskOutcome::Target),
        DecodeRule::JsonBoundingBox => decode_bounding_box(kind, raw).map(TaskOutcome::BoundingBox),
        DecodeRule::Boolean => decode_check(kind, raw),
    };

    match &outcome {
        Ok(result) => debug!(task = %kind, ?result, "decoded task response"),
        Err(e) => warn!(
            task = %kind,
            error = %e,
            raw = %truncate_for_log(raw, MAX_RAW_LOG_CHARS),
            "failed to decode task response"
        ),
    }
    outcome
}

/// Boolean substring rule shared by every true/false task.
///
/// `"true"` anywhere in the lower-cased text wins over `"false"`, wherever
/// each occurs.
pub fn decode_boolean(kind: TaskKind, raw: &str) -> Result<bool, TaskError> {
    let lowered = raw.to_lowercase();
    if lowered.contains("true") {
        Ok(true)
    } else if lowered.contains("false") {
        Ok(false)
    } else {
        Err(TaskError::MalformedBoolean {
            task: kind,
            raw: raw.to_string(),
        })
    }
}

fn decode_check(kind: TaskKind, raw: &str) -> Result<TaskOutcome, TaskError> {
    let wrap: fn(bool) -> TaskOutcome = match kind {
        TaskKind::CheckGraspSuccess => TaskOutcome::GraspSuccess,
        TaskKind::CheckInstructionComplete => TaskOutcome::InstructionComplete,
        TaskKind::CheckUserPromptComplete => TaskOutcome::UserPromptComplete,
        TaskKind::ClassifyUserPrompt
        | TaskKind::DecomposeUserPrompt
        | TaskKind::GenerateInstruction
        | TaskKind::MarkBoundingBox => {
            return Err(TaskError::MalformedField {
                task: kind,
                field: "outcome",
                raw: raw.to_string(),
            });
        }
    };
    decode_boolean(kind, raw).map(wrap)
}

fn decode_label(kind: TaskKind, raw: &str) -> Result<TaskOutcome, TaskError> {
    let label = if decode_boolean(kind, raw)? {
        PromptType::TypeI
    } else {
        PromptType::TypeII
    };
    Ok(TaskOutcome::PromptType(label))
}

pub fn decode_string_list(kind: TaskKind, raw: &str) -> Result<Vec<String>, TaskError> {
    extract_list(raw).ok_or_else(|| TaskError::MalformedList {
        task: kind,
        raw: raw.to_string(),
    })
}

/// Extracts and repairs the JSON value embedded in a response.
fn decode_json(kind: TaskKind, raw: &str) -> Result<Value, TaskError> {
    extract_json(raw)
        .and_then(|json| repair_json(&json).ok())
        .ok_or_else(|| TaskError::MalformedJson {
            task: kind,
            raw: raw.to_string(),
        })
}

pub fn decode_target(kind: TaskKind, raw: &str) -> Result<String, TaskError> {
    match decode_json(kind, raw)?.get("target") {
        Some(Value::String(target)) => Ok(target.clone()),
        _ => Err(TaskError::MalformedField {
            task: kind,
            field: "target",
            raw: raw.to_string(),
        }),
    }
}

pub fn decode_bounding_box(kind: TaskKind, raw: &str) -> Result<BoundingBox, TaskError> {
    let value = decode_json(kind, raw)?;
    serde_json::from_value(value).map_err(|e| {
        debug!(task = %kind, error = %e, "bounding box record has the wrong shape");
        TaskError::MalformedField {
            task: kind,
            field: "bbox_2d",
            raw: raw.to_string(),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_maps_booleans_to_prompt_types() {
        assert_eq!(
            decode(TaskKind::ClassifyUserPrompt, "True: contains a color").unwrap(),
            TaskOutcome::PromptType(PromptType::TypeI)
        );
        assert_eq!(
            decode(TaskKind::ClassifyUserPrompt, "False: no specifics").unwrap(),
            TaskOutcome::PromptType(PromptType::TypeII)
        );
        assert!(matches!(
            decode(TaskKind::ClassifyUserPrompt, "unclear"),
            Err(TaskError::MalformedBoolean { task: TaskKind::ClassifyUserPrompt, raw }) if raw == "unclear"
        ));
    }

    #[test]
    fn true_wins_over_an_earlier_false() {
        let raw = "FALSE at first glance, but on reflection this is True";
        assert!(decode_boolean(TaskKind::CheckGraspSuccess, raw).unwrap());
        assert_eq!(
            decode(TaskKind::ClassifyUserPrompt, raw).unwrap(),
            TaskOutcome::PromptType(PromptType::TypeI)
        );
        // Substring match, not word match.
        assert!(decode_boolean(TaskKind::CheckGraspSuccess, "untrue, so false").unwrap());
    }

    #[test]
    fn check_tasks_return_their_own_variant() {
        assert_eq!(
            decode(TaskKind::CheckGraspSuccess, "The hand holds the cup. True").unwrap(),
            TaskOutcome::GraspSuccess(true)
        );
        assert_eq!(
            decode(TaskKind::CheckInstructionComplete, "False").unwrap(),
            TaskOutcome::InstructionComplete(false)
        );
        assert_eq!(
            decode(TaskKind::CheckUserPromptComplete, "False: cup, bottle, plate").unwrap(),
            TaskOutcome::UserPromptComplete(false)
        );
        assert!(matches!(
            decode(TaskKind::CheckUserPromptComplete, "cup, bottle"),
            Err(TaskError::MalformedBoolean { .. })
        ));
    }

    #[test]
    fn decompose_preserves_order() {
        let outcome = decode(
            TaskKind::DecomposeUserPrompt,
            r#"["red cup on left", "blue bowl on right"]"#,
        )
        .unwrap();
        assert_eq!(
            outcome,
            TaskOutcome::GraspSequence(vec![
                "red cup on left".to_string(),
                "blue bowl on right".to_string()
            ])
        );
    }

    #[test]
    fn decompose_skips_bracketed_prose() {
        let raw = "[Note] Grasp order from right to left: ['red cup on right', 'blue bowl on left']";
        assert_eq!(
            decode(TaskKind::DecomposeUserPrompt, raw).unwrap(),
            TaskOutcome::GraspSequence(vec![
                "red cup on right".to_string(),
                "blue bowl on left".to_string()
            ])
        );

        let raw = "I see [2] cups. Order: ['red cup on right', 'blue bowl on left']";
        assert_eq!(
            decode(TaskKind::DecomposeUserPrompt, raw).unwrap(),
            TaskOutcome::GraspSequence(vec![
                "red cup on right".to_string(),
                "blue bowl on left".to_string()
            ])
        );
    }

    #[test]
    fn boolean_kinds_decode_only_through_their_own_variant() {
        assert!(matches!(
            decode_check(TaskKind::GenerateInstruction, "True"),
            Err(TaskError::MalformedField { field: "outcome", .. })
        ));
    }

    #[test]
    fn decompose_rejects_missing_or_non_string_lists() {
        assert!(matches!(
            decode(TaskKind::DecomposeUserPrompt, "no list here"),
            Err(TaskError::MalformedList { .. })
        ));
        assert!(matches!(
            decode(TaskKind::DecomposeUserPrompt, "[1, 2, 3]"),
            Err(TaskError::MalformedList { .. })
        ));
    }

    #[test]
    fn bounding_box_from_fenced_json() {
        let raw = "```json\n{\"bbox_2d\":[1,2,3,4],\"label\":\"green cup\",\"description\":\"...\"}\n```";
        let TaskOutcome::BoundingBox(bbox) = decode(TaskKind::MarkBoundingBox, raw).unwrap() else {
            panic!("expected a bounding box");
        };
        assert_eq!(bbox.bbox_2d, [1.0, 2.0, 3.0, 4.0]);
        assert_eq!(bbox.label, "green cup");
        assert_eq!(bbox.description, "...");
    }

    #[test]
    fn bounding_box_is_not_range_checked() {
        let raw = r#"{"bbox_2d": [-5, 0, 99999, 12.5], "label": "cup"}"#;
        let bbox = decode_bounding_box(TaskKind::MarkBoundingBox, raw).unwrap();
        assert_eq!(bbox.bbox_2d, [-5.0, 0.0, 99999.0, 12.5]);
        assert_eq!(bbox.description, "");
    }

    #[test]
    fn bounding_box_with_bad_coordinates_names_the_field() {
        let raw = r#"{"bbox_2d": [x1, y1, x2, y2], "label": "cup"}"#;
        assert!(matches!(
            decode(TaskKind::MarkBoundingBox, raw),
            Err(TaskError::MalformedField { field: "bbox_2d", .. })
        ));
    }

    #[test]
    fn target_is_returned_as_string() {
        let raw = r#"Here you go:
{
    "analysis": {
        "priority_consideration": "rightmost",
        "accessibility": "clear path",
        "risk_assessment": "low"
    },
    "target": "the blue cube on the far right of the desktop"
}"#;
        assert_eq!(
            decode(TaskKind::GenerateInstruction, raw).unwrap(),
            TaskOutcome::Target("the blue cube on the far right of the desktop".to_string())
        );
    }

    #[test]
    fn non_string_target_is_a_malformed_field() {
        let raw = r#"{"analysis": {"accessibility": "ok"}, "target": 42}"#;
        assert!(matches!(
            decode(TaskKind::GenerateInstruction, raw),
            Err(TaskError::MalformedField { task: TaskKind::GenerateInstruction, field: "target", .. })
        ));
        assert!(matches!(
            decode(TaskKind::GenerateInstruction, r#"{"analysis": {}}"#),
            Err(TaskError::MalformedField { field: "target", .. })
        ));
    }

    #[test]
    fn target_found_after_brace_in_prose() {
        let raw = r#"Considering {layout}, here it is: {"analysis": {}, "target": "the red cup"}"#;
        assert_eq!(
            decode(TaskKind::GenerateInstruction, raw).unwrap(),
            TaskOutcome::Target("the red cup".to_string())
        );
    }

    #[test]
    fn missing_json_is_malformed_json() {
        assert!(matches!(
            decode(TaskKind::GenerateInstruction, "the blue cube"),
            Err(TaskError::MalformedJson { .. })
        ));
        assert!(matches!(
            decode(TaskKind::MarkBoundingBox, "I cannot see any cup"),
            Err(TaskError::MalformedJson { .. })
        ));
    }

    #[test]
    fn decoding_is_idempotent() {
        let raw = r#"{"bbox_2d": [1, 2, 3, 4], "label": "cup", "description": "a cup"}"#;
        for kind in TaskKind::ALL {
            let first = decode(kind, raw);
            let second = decode(kind, raw);
            assert_eq!(format!("{first:?}"), format!("{second:?}"));
        }
    }
}
