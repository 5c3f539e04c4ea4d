use serde_json::Value;

use crate::errors::ValidationError;

/// Raw registration fields, not yet trimmed or validated
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerRequest {
    pub name: String,
    pub email: String,
}

pub fn parse_player_request(body: &Value) -> Result<PlayerRequest, ValidationError> {
    let name = required_text(body, "name").ok_or(ValidationError::MissingPlayerFields)?;
    let email = required_text(body, "email").ok_or(ValidationError::MissingPlayerFields)?;

    Ok(PlayerRequest {
        name: name.to_string(),
        email: email.to_string(),
    })
}

fn required_text<'a>(body: &'a Value, field: &str) -> Option<&'a str> {
    body.get(field)
        .and_then(Value::as_str)
        .filter(|text| !text.is_empty())
}
