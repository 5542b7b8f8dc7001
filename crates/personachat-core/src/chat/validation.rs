//! Request validation for chat and persona payloads.
//!
//! Validation is pure: it never touches storage. Existence checks (persona
//! found, name unique) happen in the services.

use personachat_types::chat::{HistoryMessage, SendMessageRequest};
use personachat_types::config::ChatConfig;
use personachat_types::llm::{SUPPORTED_MODELS, is_supported_model};
use personachat_types::persona::{CreatePersonaRequest, UpdatePersonaRequest};

/// A chat request that passed validation. `message` is trimmed.
#[derive(Debug, Clone)]
pub struct ValidatedChat {
    pub message: String,
    pub persona_id: String,
    pub model: String,
    pub user_id: Option<String>,
    pub chat_history: Option<Vec<HistoryMessage>>,
}

/// Validate `POST /chat`. Errors carry the user-facing message.
pub fn validate_send_message(
    req: SendMessageRequest,
    limits: &ChatConfig,
) -> Result<ValidatedChat, String> {
    let raw = req.message.as_deref().unwrap_or_default();
    let message = raw.trim();
    if message.is_empty() {
        return Err("Message is required and cannot be empty".to_string());
    }

    let persona_id = req.persona_id.as_deref().map(str::trim).unwrap_or_default();
    if persona_id.is_empty() {
        return Err("PersonaId is required".to_string());
    }

    // Length is measured before trimming, so padding counts.
    if raw.chars().count() > limits.max_message_length {
        return Err(format!(
            "Message too long. Maximum {} characters allowed.",
            limits.max_message_length
        ));
    }

    let model = match req.model.as_deref().map(str::trim) {
        None | Some("") => limits.default_model.clone(),
        Some(m) if is_supported_model(m) => m.to_string(),
        Some(m) => {
            return Err(format!(
                "Unsupported model: {m}. Supported models: {}",
                SUPPORTED_MODELS.join(", ")
            ));
        }
    };

    let user_id = normalize_user_id(req.user_id.as_deref()).map(str::to_string);

    Ok(ValidatedChat {
        message: message.to_string(),
        persona_id: persona_id.to_string(),
        model,
        user_id,
        chat_history: req.chat_history,
    })
}

/// Trim a user id; blank or absent means the anonymous user.
pub fn normalize_user_id(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|u| !u.is_empty())
}

/// Trimmed fields of a valid create request.
#[derive(Debug, Clone)]
pub struct ValidatedPersona {
    pub name: String,
    pub description: String,
    pub system_prompt: String,
    pub avatar_url: Option<String>,
    pub created_by_id: Option<String>,
}

fn required(value: Option<&str>, field: &str) -> Result<String, String> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(format!("{field} is required")),
    }
}

pub fn validate_create_persona(req: &CreatePersonaRequest) -> Result<ValidatedPersona, String> {
    Ok(ValidatedPersona {
        name: required(req.name.as_deref(), "Name")?,
        description: required(req.description.as_deref(), "Description")?,
        system_prompt: required(req.system_prompt.as_deref(), "System prompt")?,
        avatar_url: req
            .avatar_url
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string),
        created_by_id: req.created_by_id.clone(),
    })
}

/// Provided fields must not be blank; absent fields are left untouched.
pub fn validate_update_persona(req: &UpdatePersonaRequest) -> Result<(), String> {
    let checks = [
        (req.name.as_deref(), "Name"),
        (req.description.as_deref(), "Description"),
        (req.system_prompt.as_deref(), "System prompt"),
    ];
    for (value, field) in checks {
        if value.is_some_and(|v| v.trim().is_empty()) {
            return Err(format!("{field} cannot be empty"));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(message: &str) -> SendMessageRequest {
        SendMessageRequest {
            message: Some(message.to_string()),
            persona_id: Some("yoda".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_request_uses_default_model() {
        let v = validate_send_message(request("  Hello  "), &ChatConfig::default()).unwrap();
        assert_eq!(v.message, "Hello");
        assert_eq!(v.model, "gpt-4o");
        assert!(v.user_id.is_none());
    }

    #[test]
    fn test_blank_message_rejected() {
        let err = validate_send_message(request("   "), &ChatConfig::default()).unwrap_err();
        assert_eq!(err, "Message is required and cannot be empty");

        let missing = SendMessageRequest {
            persona_id: Some("yoda".into()),
            ..Default::default()
        };
        assert!(validate_send_message(missing, &ChatConfig::default()).is_err());
    }

    #[test]
    fn test_missing_persona_rejected() {
        let req = SendMessageRequest {
            message: Some("hi".into()),
            ..Default::default()
        };
        let err = validate_send_message(req, &ChatConfig::default()).unwrap_err();
        assert_eq!(err, "PersonaId is required");
    }

    #[test]
    fn test_length_limit_counts_characters() {
        let limits = ChatConfig::default();
        let at_limit = "a".repeat(4000);
        assert!(validate_send_message(request(&at_limit), &limits).is_ok());

        let over = "a".repeat(4001);
        let err = validate_send_message(request(&over), &limits).unwrap_err();
        assert_eq!(err, "Message too long. Maximum 4000 characters allowed.");

        // 4000 multi-byte characters are still within the limit.
        let wide = "é".repeat(4000);
        assert!(validate_send_message(request(&wide), &limits).is_ok());
    }

    #[test]
    fn test_length_limit_counts_padding() {
        let limits = ChatConfig::default();
        let padded = format!("  {}  ", "a".repeat(3998));
        let err = validate_send_message(request(&padded), &limits).unwrap_err();
        assert_eq!(err, "Message too long. Maximum 4000 characters allowed.");

        let fits = format!(" {} ", "a".repeat(3998));
        let v = validate_send_message(request(&fits), &limits).unwrap();
        assert_eq!(v.message.len(), 3998);
    }

    #[test]
    fn test_normalize_user_id() {
        assert_eq!(normalize_user_id(Some(" u1 ")), Some("u1"));
        assert_eq!(normalize_user_id(Some("   ")), None);
        assert_eq!(normalize_user_id(None), None);
    }

    #[test]
    fn test_unsupported_model() {
        let mut req = request("hi");
        req.model = Some("gpt-5".into());
        let err = validate_send_message(req, &ChatConfig::default()).unwrap_err();
        assert!(err.starts_with("Unsupported model: gpt-5. Supported models: gpt-4o,"));
    }

    #[test]
    fn test_explicit_model_kept() {
        let mut req = request("hi");
        req.model = Some("mistral-small-latest".into());
        req.user_id = Some("  ".into());
        let v = validate_send_message(req, &ChatConfig::default()).unwrap();
        assert_eq!(v.model, "mistral-small-latest");
        assert!(v.user_id.is_none());
    }

    #[test]
    fn test_create_persona_field_messages() {
        let mut req = CreatePersonaRequest {
            name: Some("Pirate".into()),
            description: Some("Arr".into()),
            system_prompt: None,
            ..Default::default()
        };
        assert_eq!(validate_create_persona(&req).unwrap_err(), "System prompt is required");

        req.system_prompt = Some("You are a pirate.".into());
        req.name = Some("   ".into());
        assert_eq!(validate_create_persona(&req).unwrap_err(), "Name is required");

        req.name = Some(" Pirate ".into());
        req.avatar_url = Some("".into());
        let v = validate_create_persona(&req).unwrap();
        assert_eq!(v.name, "Pirate");
        assert!(v.avatar_url.is_none());
    }

    #[test]
    fn test_update_persona_blank_field() {
        let req = UpdatePersonaRequest {
            description: Some("".into()),
            ..Default::default()
        };
        assert_eq!(validate_update_persona(&req).unwrap_err(), "Description cannot be empty");
        assert!(validate_update_persona(&UpdatePersonaRequest::default()).is_ok());
    }
}
