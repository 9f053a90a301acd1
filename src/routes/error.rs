use crate::middleware::rate_limit::RateLimitRetryAfter;
use crate::models::api_response::ApiResponse;
use rocket::http::Header;
use rocket::serde::json::Json;
use rocket::{Request, Responder, catch};

#[catch(400)]
pub fn bad_request(_: &Request) -> Json<ApiResponse<()>> {
    Json(ApiResponse::failure("Bad request"))
}

#[catch(401)]
pub fn unauthorized(_: &Request) -> Json<ApiResponse<()>> {
    Json(ApiResponse::failure("Unauthorized"))
}

#[catch(404)]
pub fn not_found(_: &Request) -> Json<ApiResponse<()>> {
    Json(ApiResponse::failure("Not found"))
}

#[catch(422)]
pub fn unprocessable_entity(_: &Request) -> Json<ApiResponse<()>> {
    Json(ApiResponse::failure("Invalid request body"))
}

#[derive(Responder)]
#[response(status = 429)]
pub struct TooManyRequests {
    body: Json<ApiResponse<()>>,
    retry_after: Header<'static>,
}

#[catch(429)]
pub fn too_many_requests(req: &Request) -> TooManyRequests {
    let retry_after = req.local_cache(|| None::<RateLimitRetryAfter>).as_ref().map(|r| r.0).unwrap_or(1);

    TooManyRequests {
        body: Json(ApiResponse::failure("Too Many Requests")),
        retry_after: Header::new("Retry-After", retry_after.to_string()),
    }
}

#[catch(500)]
pub fn internal_error(_: &Request) -> Json<ApiResponse<()>> {
    Json(ApiResponse::failure("Internal server error"))
}
