/*!
 * 认证接口限流中间件
 *
 * 按客户端 IP 做固定窗口计数，窗口内超过上限返回 429 并带上 Retry-After。
 * 上限与窗口长度来自 `server.rate_limit` 配置。
 *
 * ```rust,ignore
 * web::resource("/login")
 *     .wrap(RateLimit::login())
 *     .route(web::post().to(login))
 * ```
 */

use actix_service::{Service, Transform};
use actix_web::{
    Error, HttpResponse,
    body::EitherBody,
    dev::{ServiceRequest, ServiceResponse},
};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use moka::future::Cache;
use once_cell::sync::Lazy;
use std::net::IpAddr;
use std::rc::Rc;
use std::time::Duration;
use tracing::warn;

use crate::config::AppConfig;
use crate::models::{ApiResponse, ErrorCode};

const MAX_WINDOW_SECS: u64 = 3600;

// 计数键为 "作用域:IP:窗口序号"，条目最多存活一个最长窗口
static ATTEMPTS: Lazy<Cache<String, u32>> = Lazy::new(|| {
    Cache::builder()
        .time_to_live(Duration::from_secs(MAX_WINDOW_SECS))
        .max_capacity(50_000)
        .build()
});

#[derive(Clone)]
pub struct RateLimit {
    scope: &'static str,
    max_requests: u32,
    window_secs: u64,
}

impl RateLimit {
    pub fn new(scope: &'static str, max_requests: u32, window_secs: u64) -> Self {
        Self {
            scope,
            max_requests: max_requests.max(1),
            window_secs: window_secs.clamp(1, MAX_WINDOW_SECS),
        }
    }

    pub fn login() -> Self {
        let limits = &AppConfig::get().server.rate_limit;
        Self::new("login", limits.login_max_requests, limits.window_secs)
    }

    pub fn refresh_token() -> Self {
        let limits = &AppConfig::get().server.rate_limit;
        Self::new("refresh", limits.refresh_max_requests, limits.window_secs)
    }

    fn counter_key(&self, client: &str, now_secs: u64) -> String {
        format!("{}:{}:{}", self.scope, client, now_secs / self.window_secs)
    }

    fn seconds_until_reset(&self, now_secs: u64) -> u64 {
        self.window_secs - now_secs % self.window_secs
    }
}

/// 客户端地址：连接信息优先，其次 X-Real-IP
///
/// 连接信息已经考虑了 Forwarded / X-Forwarded-For，服务直接暴露在公网时这些头可以伪造。
fn client_address(req: &ServiceRequest) -> String {
    let info = req.connection_info();
    let candidates = [
        info.realip_remote_addr().map(str::to_string),
        req.headers()
            .get("X-Real-IP")
            .and_then(|v| v.to_str().ok())
            .map(|v| v.trim().to_string()),
    ];

    candidates
        .into_iter()
        .flatten()
        .find(|ip| ip.parse::<IpAddr>().is_ok())
        .unwrap_or_else(|| "unknown".to_string())
}

fn too_many_requests(retry_after: u64) -> HttpResponse {
    HttpResponse::TooManyRequests()
        .insert_header(("Retry-After", retry_after.to_string()))
        .json(ApiResponse::<()>::error_empty(
            ErrorCode::RateLimitExceeded,
            "Too many attempts, please try again later",
        ))
}

impl<S, B> Transform<S, ServiceRequest> for RateLimit
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = RateLimitMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RateLimitMiddleware {
            service: Rc::new(service),
            limit: self.clone(),
        }))
    }
}

pub struct RateLimitMiddleware<S> {
    service: Rc<S>,
    limit: RateLimit,
}

impl<S, B> Service<ServiceRequest> for RateLimitMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    actix_service::forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let srv = self.service.clone();
        let limit = self.limit.clone();

        Box::pin(async move {
            let now_secs = chrono::Utc::now().timestamp().max(0) as u64;
            let key = limit.counter_key(&client_address(&req), now_secs);

            let attempts = ATTEMPTS.get(&key).await.unwrap_or(0);
            if attempts >= limit.max_requests {
                warn!("Rate limit hit on {} ({} attempts)", key, attempts);
                let response = too_many_requests(limit.seconds_until_reset(now_secs));
                return Ok(req.into_response(response.map_into_right_body()));
            }
            ATTEMPTS.insert(key, attempts + 1).await;

            srv.call(req).await.map(ServiceResponse::map_into_left_body)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;
    use actix_web::{App, HttpResponse, test, web};

    #[::core::prelude::v1::test]
    fn test_presets_follow_config() {
        let limits = &AppConfig::get().server.rate_limit;
        let login = RateLimit::login();
        assert_eq!(login.scope, "login");
        assert_eq!(login.max_requests, limits.login_max_requests.max(1));

        let refresh = RateLimit::refresh_token();
        assert_eq!(refresh.scope, "refresh");
        assert_eq!(refresh.max_requests, limits.refresh_max_requests.max(1));
    }

    #[::core::prelude::v1::test]
    fn test_counter_key_per_window() {
        let limit = RateLimit::new("login", 5, 60);
        assert_eq!(limit.counter_key("10.0.0.1", 120), "login:10.0.0.1:2");
        assert_eq!(limit.counter_key("10.0.0.1", 179), "login:10.0.0.1:2");
        assert_eq!(limit.counter_key("10.0.0.1", 180), "login:10.0.0.1:3");
        assert_eq!(limit.seconds_until_reset(150), 30);
    }

    #[::core::prelude::v1::test]
    fn test_bounds_are_clamped() {
        let limit = RateLimit::new("x", 0, 0);
        assert_eq!(limit.max_requests, 1);
        assert_eq!(limit.window_secs, 1);
        assert_eq!(RateLimit::new("x", 1, 999_999).window_secs, MAX_WINDOW_SECS);
    }

    #[actix_rt::test]
    async fn test_blocks_after_limit() {
        let app = test::init_service(
            App::new().service(
                web::resource("/ping")
                    .wrap(RateLimit::new("test-block", 2, 3600))
                    .route(web::post().to(HttpResponse::Ok)),
            ),
        )
        .await;

        let call = |ip: &str| {
            test::TestRequest::post()
                .uri("/ping")
                .insert_header(("X-Forwarded-For", ip.to_string()))
                .to_request()
        };

        for _ in 0..2 {
            let resp = test::call_service(&app, call("203.0.113.7")).await;
            assert_eq!(resp.status(), StatusCode::OK);
        }
        let resp = test::call_service(&app, call("203.0.113.7")).await;
        assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
        assert!(resp.headers().contains_key("Retry-After"));

        // 其他地址不受影响
        let resp = test::call_service(&app, call("203.0.113.8")).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }
}
