use schemars::JsonSchema;
use serde::Serialize;

/// Envelope shared by every JSON response: `{ok, data?}` on success and `{ok: false, error}` on failure.
#[derive(Serialize, Debug, JsonSchema)]
pub struct ApiResponse<T> {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn data(data: T) -> Self {
        Self {
            ok: true,
            data: Some(data),
            error: None,
        }
    }
}

impl ApiResponse<()> {
    pub fn empty() -> Self {
        Self {
            ok: true,
            data: None,
            error: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn failure_omits_data() {
        let body = serde_json::to_value(ApiResponse::failure("Unauthorized")).unwrap();
        assert_eq!(body, json!({"ok": false, "error": "Unauthorized"}));
    }

    #[test]
    fn empty_success_is_just_ok() {
        let body = serde_json::to_value(ApiResponse::empty()).unwrap();
        assert_eq!(body, json!({"ok": true}));
    }
}
