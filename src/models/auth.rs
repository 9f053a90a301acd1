use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Deserialize, Debug, Validate, JsonSchema)]
pub struct LoginRequest {
    #[serde(default)]
    #[validate(required(message = "Missing password"), length(min = 1, message = "Missing password"))]
    pub password: Option<String>,
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, JsonSchema)]
pub struct AuthStatus {
    pub authenticated: bool,
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, JsonSchema)]
pub struct SweepResponse {
    pub removed: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_password_fails_validation() {
        let request: LoginRequest = serde_json::from_str("{}").unwrap();
        assert!(request.validate().is_err());
    }

    #[test]
    fn null_or_empty_password_fails_validation() {
        let null: LoginRequest = serde_json::from_str(r#"{"password": null}"#).unwrap();
        assert!(null.validate().is_err());
        let empty: LoginRequest = serde_json::from_str(r#"{"password": ""}"#).unwrap();
        assert!(empty.validate().is_err());
    }

    #[test]
    fn present_password_passes_validation() {
        let request: LoginRequest = serde_json::from_str(r#"{"password": "hunter2"}"#).unwrap();
        assert!(request.validate().is_ok());
    }
}
