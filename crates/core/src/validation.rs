//! Local validation of user input, run before anything reaches the
//! network. A rejected payload never leaves the client.

use validator::Validate;

use crate::error::CoreError;
use crate::job::{JobDraft, JobEdits};

/// Validate creation parameters against the server's documented bounds
/// (topic and style 3-255 characters, length above 30 seconds).
pub fn validate_draft(draft: &JobDraft) -> Result<(), CoreError> {
    draft
        .validate()
        .map_err(|errors| CoreError::Validation(flatten_errors(&errors)))?;

    if let Some(prompts) = &draft.image_prompts {
        ensure_prompts_object(prompts)?;
    }
    Ok(())
}

/// Validate an edit payload before the save+rerender flow starts.
///
/// An empty patch is rejected locally (the server would answer 400),
/// and `image_prompts` must be a JSON object keyed by section.
pub fn validate_edits(edits: &JobEdits) -> Result<(), CoreError> {
    if edits.is_empty() {
        return Err(CoreError::Validation("No changes provided".to_string()));
    }
    if let Some(prompts) = &edits.image_prompts {
        ensure_prompts_object(prompts)?;
    }
    Ok(())
}

/// Parse a prompt-override string from the edit surface into the
/// structured form the server expects.
pub fn parse_image_prompts(raw: &str) -> Result<serde_json::Value, CoreError> {
    let value: serde_json::Value = serde_json::from_str(raw)
        .map_err(|e| CoreError::Validation(format!("Image prompts are not valid JSON: {e}")))?;
    ensure_prompts_object(&value)?;
    Ok(value)
}

fn ensure_prompts_object(value: &serde_json::Value) -> Result<(), CoreError> {
    if value.is_object() {
        Ok(())
    } else {
        Err(CoreError::Validation(
            "Image prompts must be a JSON object keyed by section".to_string(),
        ))
    }
}

/// Render a `validator` error set as one human-readable line.
fn flatten_errors(errors: &validator::ValidationErrors) -> String {
    let mut parts: Vec<String> = errors
        .field_errors()
        .iter()
        .map(|(field, field_errors)| {
            let detail = field_errors
                .iter()
                .filter_map(|e| e.message.as_ref())
                .map(|m| m.to_string())
                .collect::<Vec<_>>()
                .join(", ");
            if detail.is_empty() {
                format!("{field} is invalid")
            } else {
                format!("{field} {detail}")
            }
        })
        .collect();
    parts.sort();
    parts.join("; ")
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::error::CoreError;

    fn draft(topic: &str, style: &str, length: i64) -> JobDraft {
        JobDraft {
            topic: topic.into(),
            style: style.into(),
            length,
            image_prompts: None,
        }
    }

    #[test]
    fn accepts_a_well_formed_draft() {
        assert!(validate_draft(&draft("Rise of AI", "Documentary", 180)).is_ok());
    }

    #[test]
    fn rejects_short_topic() {
        let err = validate_draft(&draft("AI", "Documentary", 180)).unwrap_err();
        assert_matches!(err, CoreError::Validation(msg) => {
            assert!(msg.contains("topic"), "unexpected message: {msg}");
        });
    }

    #[test]
    fn rejects_length_at_or_below_thirty_seconds() {
        assert!(validate_draft(&draft("Rise of AI", "Documentary", 30)).is_err());
        assert!(validate_draft(&draft("Rise of AI", "Documentary", 31)).is_ok());
    }

    #[test]
    fn rejects_non_object_image_prompts() {
        let mut d = draft("Rise of AI", "Documentary", 180);
        d.image_prompts = Some(serde_json::json!(["a list", "of prompts"]));
        assert!(validate_draft(&d).is_err());

        d.image_prompts = Some(serde_json::json!({"intro": ["skyline at dawn"]}));
        assert!(validate_draft(&d).is_ok());
    }

    #[test]
    fn rejects_empty_edit_payload() {
        let err = validate_edits(&JobEdits::default()).unwrap_err();
        assert_matches!(err, CoreError::Validation(msg) => {
            assert_eq!(msg, "No changes provided");
        });
    }

    #[test]
    fn parse_image_prompts_surfaces_json_errors() {
        assert!(parse_image_prompts("{not json").is_err());
        assert!(parse_image_prompts("[1, 2]").is_err());
        let value = parse_image_prompts(r#"{"intro": ["city skyline"]}"#).expect("valid object");
        assert!(value.is_object());
    }
}
