use crate::database::session::SharedSessionStore;
use crate::error::app_error::AppError;
use crate::middleware::RequestId;
use crate::service::session::{SESSION_COOKIE, SessionAuthenticator};
use chrono::Utc;
use rocket::http::Status;
use rocket::outcome::Outcome;
use rocket::request::{FromRequest, Outcome as RequestOutcome, Request};
use rocket_okapi::r#gen::OpenApiGenerator;
use rocket_okapi::okapi::openapi3::{Object, Responses, SecurityRequirement, SecurityScheme, SecuritySchemeData};
use rocket_okapi::request::{OpenApiFromRequest, RequestHeaderInput};
use tracing::error;

/// Gate for administrative routes: present only when the request carries a valid admin session.
///
/// Every failure, including a store error, is a uniform 401. Nothing about the
/// principal is carried forward since there is exactly one admin.
#[derive(Debug, Clone, Copy)]
pub struct AdminSession;

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AdminSession {
    type Error = AppError;

    async fn from_request(req: &'r Request<'_>) -> RequestOutcome<Self, Self::Error> {
        let (Some(authenticator), Some(store)) = (req.rocket().state::<SessionAuthenticator>(), req.rocket().state::<SharedSessionStore>()) else {
            error!("session authenticator or session store is not managed");
            return Outcome::Error((Status::Unauthorized, AppError::Unauthorized));
        };

        let cookie = req.cookies().get(SESSION_COOKIE).map(|cookie| cookie.value());
        match authenticator.verify(store.as_ref(), cookie, Utc::now()).await {
            Ok(true) => Outcome::Success(AdminSession),
            Ok(false) => Outcome::Error((Status::Unauthorized, AppError::Unauthorized)),
            Err(err) => {
                error!(
                    error = ?err,
                    request_id = %RequestId::of(req),
                    uri = %req.uri(),
                    "session verification failed, rejecting request"
                );
                Outcome::Error((Status::Unauthorized, AppError::Unauthorized))
            }
        }
    }
}

impl<'a> OpenApiFromRequest<'a> for AdminSession {
    fn from_request_input(_gen: &mut OpenApiGenerator, _name: String, _required: bool) -> rocket_okapi::Result<RequestHeaderInput> {
        let security_scheme = SecurityScheme {
            description: Some("Cookie-based admin session. Log in via POST /api/auth/login to obtain the session cookie.".to_string()),
            data: SecuritySchemeData::ApiKey {
                name: SESSION_COOKIE.to_string(),
                location: "cookie".to_string(),
            },
            extensions: Object::default(),
        };

        let mut security_req = SecurityRequirement::new();
        security_req.insert("cookieAuth".to_string(), Vec::new());

        Ok(RequestHeaderInput::Security("cookieAuth".to_string(), security_scheme, security_req))
    }

    fn get_responses(_gen: &mut OpenApiGenerator) -> rocket_okapi::Result<Responses> {
        use rocket_okapi::okapi::openapi3::{RefOr, Response};
        let mut responses = Responses::default();
        responses.responses.insert(
            "401".to_string(),
            RefOr::Object(Response {
                description: "Unauthorized - admin session required".to_string(),
                ..Default::default()
            }),
        );
        Ok(responses)
    }
}
