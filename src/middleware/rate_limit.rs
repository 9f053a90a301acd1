use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::RateLimitConfig;
use crate::middleware::RequestId;
use rocket::http::Status;
use rocket::request::{FromRequest, Outcome, Request};
use rocket_okapi::r#gen::OpenApiGenerator;
use rocket_okapi::okapi::openapi3::{RefOr, Response as OpenApiResponse, Responses};
use rocket_okapi::request::{OpenApiFromRequest, RequestHeaderInput};
use tokio::sync::Mutex;
use tracing::warn;

#[derive(Debug, Clone)]
struct Counter {
    window_start: Instant,
    count: u32,
}

/// Fixed-window login attempt counter keyed by client IP.
#[derive(Debug)]
pub(crate) struct RateLimiter {
    config: RateLimitConfig,
    window: Duration,
    cleanup_interval: Duration,
    counters: Mutex<HashMap<String, Counter>>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        let window = Duration::from_secs(config.window_seconds.max(1));
        let cleanup_interval = Duration::from_secs(config.cleanup_interval_seconds.max(1));

        Self {
            config,
            window,
            cleanup_interval,
            counters: Mutex::new(HashMap::new()),
        }
    }

    pub fn spawn_cleanup_task(self: Arc<Self>) {
        let cleanup_interval = self.cleanup_interval;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(cleanup_interval);
            loop {
                ticker.tick().await;
                let now = Instant::now();
                let window = self.window;
                let mut counters = self.counters.lock().await;
                counters.retain(|_, counter| now.duration_since(counter.window_start) < window);
            }
        });
    }

    async fn check(&self, identity: &str) -> RateLimitDecision {
        // NOTE: fixed window; bursts can exceed the limit near window boundaries.
        let now = Instant::now();
        let mut counters = self.counters.lock().await;
        let counter = counters.entry(identity.to_string()).or_insert_with(|| Counter { window_start: now, count: 0 });

        if now.duration_since(counter.window_start) >= self.window {
            counter.window_start = now;
            counter.count = 0;
        }

        if counter.count >= self.config.login_limit {
            let elapsed = now.duration_since(counter.window_start);
            return RateLimitDecision::Limited {
                retry_after: self.window.saturating_sub(elapsed),
            };
        }

        counter.count += 1;
        RateLimitDecision::Allow
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RateLimitDecision {
    Allow,
    Limited { retry_after: Duration },
}

/// Address the throttle is keyed on: the configured proxy header when one is trusted,
/// otherwise the peer address. Client-supplied headers are ignored unless configured.
fn client_identity(request: &Request<'_>, config: &RateLimitConfig) -> Option<IpAddr> {
    let forwarded = config
        .trusted_ip_header
        .as_deref()
        .and_then(|name| request.headers().get_one(name))
        .and_then(|value| value.split(',').next())
        .and_then(|ip| ip.trim().parse::<IpAddr>().ok());

    forwarded.or_else(|| request.remote().map(|addr| addr.ip()))
}

/// Guard for the login route.
#[derive(Debug, Clone, Copy)]
pub(crate) struct AuthRateLimit;

#[derive(Debug, Clone, Copy)]
pub(crate) struct RateLimitRetryAfter(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RateLimitError {
    TooManyRequests,
    MissingClientIp,
}

impl RateLimitError {
    fn status(self) -> Status {
        match self {
            RateLimitError::TooManyRequests => Status::TooManyRequests,
            RateLimitError::MissingClientIp => Status::BadRequest,
        }
    }
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AuthRateLimit {
    type Error = RateLimitError;

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let limiter = match request.rocket().state::<Arc<RateLimiter>>() {
            Some(limiter) => limiter,
            None => return Outcome::Success(AuthRateLimit),
        };

        let request_id = RequestId::of(request);

        let identity = match client_identity(request, &limiter.config) {
            Some(ip) => ip.to_string(),
            None => {
                warn!(
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    "client ip unavailable for rate limiting"
                );
                if limiter.config.require_client_ip {
                    return Outcome::Error((RateLimitError::MissingClientIp.status(), RateLimitError::MissingClientIp));
                }
                "missing-ip".to_string()
            }
        };

        match limiter.check(&identity).await {
            RateLimitDecision::Allow => Outcome::Success(AuthRateLimit),
            RateLimitDecision::Limited { retry_after } => {
                let retry_after_secs = retry_after.as_secs().max(1);
                request.local_cache(|| Some(RateLimitRetryAfter(retry_after_secs)));
                warn!(
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    retry_after_secs = %retry_after_secs,
                    "login rate limit exceeded"
                );
                Outcome::Error((RateLimitError::TooManyRequests.status(), RateLimitError::TooManyRequests))
            }
        }
    }
}

impl<'a> OpenApiFromRequest<'a> for AuthRateLimit {
    fn from_request_input(_gen: &mut OpenApiGenerator, _name: String, _required: bool) -> rocket_okapi::Result<RequestHeaderInput> {
        Ok(RequestHeaderInput::None)
    }

    fn get_responses(_gen: &mut OpenApiGenerator) -> rocket_okapi::Result<Responses> {
        let mut responses = Responses::default();
        responses.responses.insert(
            "429".to_string(),
            RefOr::Object(OpenApiResponse {
                description: "Too Many Requests".to_string(),
                ..Default::default()
            }),
        );
        Ok(responses)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::error::too_many_requests;
    use rocket::http::{ContentType, Header};
    use rocket::local::asynchronous::Client;
    use std::net::SocketAddr;
    use rocket::{catchers, post, routes};

    #[post("/login")]
    async fn login(_rate_limit: AuthRateLimit) -> Status {
        Status::Ok
    }

    fn config(login_limit: u32, window_seconds: u64) -> RateLimitConfig {
        RateLimitConfig {
            login_limit,
            window_seconds,
            cleanup_interval_seconds: 60,
            require_client_ip: false,
            trusted_ip_header: None,
        }
    }

    fn peer(last_octet: u8) -> SocketAddr {
        SocketAddr::from(([192, 0, 2, last_octet], 40_000))
    }

    #[rocket::async_test]
    async fn rate_limiter_blocks_after_limit() {
        let limiter = RateLimiter::new(config(2, 60));

        assert_eq!(limiter.check("127.0.0.1").await, RateLimitDecision::Allow);
        assert_eq!(limiter.check("127.0.0.1").await, RateLimitDecision::Allow);
        assert!(matches!(limiter.check("127.0.0.1").await, RateLimitDecision::Limited { .. }));
    }

    #[rocket::async_test]
    async fn rate_limiter_tracks_ips_separately() {
        let limiter = RateLimiter::new(config(1, 60));

        assert_eq!(limiter.check("10.0.0.1").await, RateLimitDecision::Allow);
        assert_eq!(limiter.check("10.0.0.2").await, RateLimitDecision::Allow);
        assert!(matches!(limiter.check("10.0.0.1").await, RateLimitDecision::Limited { .. }));
    }

    #[rocket::async_test]
    async fn rate_limiter_resets_after_window() {
        let limiter = RateLimiter::new(config(1, 1));

        assert_eq!(limiter.check("127.0.0.1").await, RateLimitDecision::Allow);
        assert!(matches!(limiter.check("127.0.0.1").await, RateLimitDecision::Limited { .. }));

        tokio::time::sleep(Duration::from_millis(1100)).await;

        assert_eq!(limiter.check("127.0.0.1").await, RateLimitDecision::Allow);
    }

    #[rocket::async_test]
    async fn retry_after_header_is_set() {
        let limiter = Arc::new(RateLimiter::new(config(0, 60)));

        let rocket = rocket::build()
            .manage(limiter)
            .mount("/", routes![login])
            .register("/", catchers![too_many_requests]);

        let client = Client::tracked(rocket).await.expect("valid rocket instance");
        let response = client.post("/login").dispatch().await;

        assert_eq!(response.status(), Status::TooManyRequests);
        assert_eq!(response.headers().get_one("Retry-After"), Some("60"));
        assert_eq!(response.content_type(), Some(ContentType::JSON));
    }

    #[rocket::async_test]
    async fn rotating_forwarding_headers_does_not_reset_the_limit() {
        let limiter = Arc::new(RateLimiter::new(config(1, 60)));
        let rocket = rocket::build()
            .manage(limiter)
            .mount("/", routes![login])
            .register("/", catchers![too_many_requests]);
        let client = Client::untracked(rocket).await.expect("valid rocket instance");

        let mut statuses = Vec::new();
        for octet in 0..5u8 {
            let response = client
                .post("/login")
                .remote(peer(7))
                .header(Header::new("X-Real-IP", format!("10.0.0.{octet}")))
                .header(Header::new("X-Forwarded-For", format!("10.0.1.{octet}")))
                .dispatch()
                .await;
            statuses.push(response.status());
        }

        assert_eq!(statuses[0], Status::Ok);
        assert!(statuses[1..].iter().all(|status| *status == Status::TooManyRequests));
    }

    #[rocket::async_test]
    async fn distinct_peers_have_separate_budgets() {
        let limiter = Arc::new(RateLimiter::new(config(1, 60)));
        let client = Client::untracked(rocket::build().manage(limiter).mount("/", routes![login]))
            .await
            .expect("valid rocket instance");

        assert_eq!(client.post("/login").remote(peer(1)).dispatch().await.status(), Status::Ok);
        assert_eq!(client.post("/login").remote(peer(2)).dispatch().await.status(), Status::Ok);
        assert_eq!(client.post("/login").remote(peer(1)).dispatch().await.status(), Status::TooManyRequests);
    }

    #[rocket::async_test]
    async fn trusted_proxy_header_is_used_when_configured() {
        let mut proxied = config(1, 60);
        proxied.trusted_ip_header = Some("CF-Connecting-IP".to_string());
        let limiter = Arc::new(RateLimiter::new(proxied));
        let client = Client::untracked(rocket::build().manage(limiter).mount("/", routes![login]))
            .await
            .expect("valid rocket instance");

        let from = |ip: &'static str| client.post("/login").remote(peer(9)).header(Header::new("CF-Connecting-IP", ip));

        assert_eq!(from("203.0.113.1").dispatch().await.status(), Status::Ok);
        assert_eq!(from("203.0.113.2").dispatch().await.status(), Status::Ok);
        assert_eq!(from("203.0.113.1").dispatch().await.status(), Status::TooManyRequests);
    }

    #[rocket::async_test]
    async fn unmanaged_limiter_allows_requests() {
        let client = Client::tracked(rocket::build().mount("/", routes![login])).await.expect("valid rocket instance");
        let response = client.post("/login").dispatch().await;
        assert_eq!(response.status(), Status::Ok);
    }
}
