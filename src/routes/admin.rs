use crate::auth::AdminSession;
use crate::database::session::SharedSessionStore;
use crate::error::app_error::AppError;
use crate::models::api_response::ApiResponse;
use crate::models::auth::SweepResponse;
use crate::service::session::sweep_expired_sessions;
use chrono::Utc;
use rocket::serde::json::Json;
use rocket::{State, delete};
use rocket_okapi::openapi;

/// Delete expired sessions now instead of waiting for the scheduled sweep
#[openapi(tag = "Admin")]
#[delete("/sessions/expired")]
pub async fn delete_expired_sessions(_session: AdminSession, store: &State<SharedSessionStore>) -> Result<Json<ApiResponse<SweepResponse>>, AppError> {
    let removed = sweep_expired_sessions(store.inner().as_ref(), Utc::now()).await?;
    Ok(Json(ApiResponse::data(SweepResponse { removed })))
}

pub fn routes() -> (Vec<rocket::Route>, okapi::openapi3::OpenApi) {
    rocket_okapi::openapi_get_routes_spec![delete_expired_sessions]
}
