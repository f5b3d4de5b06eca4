// src/services/prompt_validator.rs
use crate::errors::ValidationError;
use serde_json::Value;

pub const MAX_PROMPT_LENGTH: usize = 1000;

/// Checks a raw JSON value before anything is sent to the generation API.
pub fn validate_prompt(candidate: Option<&Value>) -> Result<bool, ValidationError> {
    match candidate {
        Some(Value::String(prompt)) => validate_prompt_str(prompt),
        _ => Err(ValidationError::NotAString),
    }
}

pub fn validate_prompt_str(prompt: &str) -> Result<bool, ValidationError> {
    let trimmed = prompt.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyPrompt);
    }

    let length = trimmed.chars().count();
    if length > MAX_PROMPT_LENGTH {
        return Err(ValidationError::TooLong {
            max: MAX_PROMPT_LENGTH,
            actual: length,
        });
    }

    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn accepts_normal_prompt() {
        assert_eq!(
            validate_prompt(Some(&json!("A cosmic dragon flying through space"))),
            Ok(true)
        );
    }

    #[test]
    fn accepts_boundary_lengths() {
        assert_eq!(validate_prompt_str("a"), Ok(true));
        assert_eq!(validate_prompt_str(&"x".repeat(1000)), Ok(true));
        // surrounding whitespace does not count
        let padded = format!("   {}   ", "x".repeat(1000));
        assert_eq!(validate_prompt_str(&padded), Ok(true));
    }

    #[test]
    fn rejects_missing_and_non_strings() {
        assert_eq!(validate_prompt(None), Err(ValidationError::NotAString));
        assert_eq!(validate_prompt(Some(&Value::Null)), Err(ValidationError::NotAString));
        assert_eq!(validate_prompt(Some(&json!(42))), Err(ValidationError::NotAString));
        assert_eq!(validate_prompt(Some(&json!(["a"]))), Err(ValidationError::NotAString));
    }

    #[test]
    fn rejects_empty_and_whitespace() {
        assert_eq!(validate_prompt_str(""), Err(ValidationError::EmptyPrompt));
        assert_eq!(validate_prompt_str(" \t\n "), Err(ValidationError::EmptyPrompt));
    }

    #[test]
    fn rejects_too_long() {
        assert_eq!(
            validate_prompt_str(&"x".repeat(1001)),
            Err(ValidationError::TooLong {
                max: 1000,
                actual: 1001
            })
        );
    }

    #[test]
    fn counts_characters_not_bytes() {
        // 1000 two-byte characters are still within the limit
        assert_eq!(validate_prompt_str(&"é".repeat(1000)), Ok(true));
    }
}
