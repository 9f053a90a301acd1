use schemars::JsonSchema;
use serde::Serialize;

#[derive(Serialize, Debug, JsonSchema)]
pub struct HealthResponse {
    pub status: &'static str,
}
