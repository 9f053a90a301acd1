use crate::auth::AdminSession;
use crate::database::session::SharedSessionStore;
use crate::error::app_error::AppError;
use crate::middleware::rate_limit::AuthRateLimit;
use crate::models::api_response::ApiResponse;
use crate::models::auth::{AuthStatus, LoginRequest};
use crate::service::auth::AdminCredentials;
use crate::service::session::{SESSION_COOKIE, SessionAuthenticator};
use chrono::Utc;
use rocket::http::CookieJar;
use rocket::serde::json::{self, Json};
use rocket::{State, get, post};
use rocket_okapi::openapi;
use tracing::{info, warn};
use validator::Validate;

/// Log in as the admin and receive the session cookie
#[openapi(tag = "Authentication")]
#[post("/login", data = "<payload>")]
pub async fn post_login(
    authenticator: &State<SessionAuthenticator>,
    store: &State<SharedSessionStore>,
    credentials: &State<AdminCredentials>,
    cookies: &CookieJar<'_>,
    _rate_limit: AuthRateLimit,
    payload: Result<Json<LoginRequest>, json::Error<'_>>,
) -> Result<Json<ApiResponse<AuthStatus>>, AppError> {
    // Unreadable bodies, absent or non-string passwords all answer the same way.
    let Ok(Json(request)) = payload else {
        return Err(AppError::MissingPassword);
    };
    request.validate().map_err(|_| AppError::MissingPassword)?;
    let password = request.password.unwrap_or_default();

    if let Err(err) = credentials.verify_password(&password) {
        warn!("admin login rejected");
        return Err(err);
    }

    let session_cookie = authenticator.issue(store.inner().as_ref(), Utc::now()).await?;
    cookies.add(session_cookie);
    info!("admin logged in");

    Ok(Json(ApiResponse::data(AuthStatus { authenticated: true })))
}

/// End the current admin session and clear the cookie
#[openapi(tag = "Authentication")]
#[post("/logout")]
pub async fn post_logout(
    authenticator: &State<SessionAuthenticator>,
    store: &State<SharedSessionStore>,
    cookies: &CookieJar<'_>,
) -> Json<ApiResponse<()>> {
    let token = cookies.get(SESSION_COOKIE).map(|cookie| cookie.value().to_string());
    let cleared = authenticator.revoke(store.inner().as_ref(), token.as_deref()).await;
    cookies.add(cleared);

    Json(ApiResponse::empty())
}

/// Report whether the caller holds a valid admin session
#[openapi(tag = "Authentication")]
#[get("/me")]
pub async fn get_me(_session: AdminSession) -> Json<ApiResponse<AuthStatus>> {
    Json(ApiResponse::data(AuthStatus { authenticated: true }))
}

pub fn routes() -> (Vec<rocket::Route>, okapi::openapi3::OpenApi) {
    rocket_okapi::openapi_get_routes_spec![post_login, post_logout, get_me]
}
