/*!
 * JWT 认证中间件
 *
 * 客户端在请求头中携带 `Authorization: Bearer <access_token>`。
 * 令牌校验通过后按令牌查缓存，未命中时从存储加载用户，只有 active 状态的用户可以继续，
 * 用户写入请求扩展供后续中间件与处理程序使用。
 *
 * ```rust,ignore
 * web::scope("/api/alunos")
 *     .wrap(RequireJWT)
 *     .route("", web::get().to(list_students))
 * ```
 */

use crate::cache::{CacheResult, ObjectCache, user_cache_key};
use crate::models::ErrorCode;
use crate::models::users::entities::{User, UserRole};
use crate::storage::Storage;
use crate::utils::jwt::JwtUtils;
use actix_service::{Service, Transform};
use actix_web::{
    Error, HttpMessage,
    body::EitherBody,
    dev::{ServiceRequest, ServiceResponse},
    http::StatusCode,
};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use std::{rc::Rc, sync::Arc};
use tracing::{debug, info};

use super::create_error_response;

const BEARER_PREFIX: &str = "Bearer ";
const AUTHORIZATION_HEADER: &str = "Authorization";

#[derive(Clone)]
pub struct RequireJWT;

/// 认证失败原因
enum AuthFailure {
    MissingToken,
    InvalidToken,
    UserUnavailable,
    AccountDisabled,
}

impl AuthFailure {
    fn code(&self) -> ErrorCode {
        match self {
            AuthFailure::MissingToken => ErrorCode::Unauthorized,
            AuthFailure::InvalidToken => ErrorCode::TokenInvalid,
            AuthFailure::UserUnavailable => ErrorCode::Unauthorized,
            AuthFailure::AccountDisabled => ErrorCode::AccountDisabled,
        }
    }

    fn message(&self) -> &'static str {
        match self {
            AuthFailure::MissingToken => "Missing or invalid Authorization header",
            AuthFailure::InvalidToken => "Invalid or expired access token",
            AuthFailure::UserUnavailable => "User not found",
            AuthFailure::AccountDisabled => "Account is not active",
        }
    }
}

fn bearer_token(req: &ServiceRequest) -> Option<String> {
    req.headers()
        .get(AUTHORIZATION_HEADER)
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.strip_prefix(BEARER_PREFIX))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

async fn extract_and_validate_jwt(req: &ServiceRequest) -> Result<User, AuthFailure> {
    let token = bearer_token(req).ok_or(AuthFailure::MissingToken)?;

    let claims = JwtUtils::verify_access_token(&token).map_err(|err| {
        info!("JWT token validation failed: {}", err);
        AuthFailure::InvalidToken
    })?;

    let cache = req
        .app_data::<actix_web::web::Data<Arc<dyn ObjectCache>>>()
        .expect("Cache not found in app data")
        .get_ref()
        .clone();

    let cache_key = user_cache_key(&token);
    match cache.get::<User>(&cache_key).await {
        CacheResult::Found(user) => return Ok(user),
        CacheResult::ExistsButNoValue => cache.remove(&cache_key).await,
        CacheResult::NotFound => {}
    }

    let user_id = claims.user_id().ok_or(AuthFailure::InvalidToken)?;

    let storage = req
        .app_data::<actix_web::web::Data<Arc<dyn Storage>>>()
        .expect("Storage not found in app data")
        .get_ref()
        .clone();

    let user = storage
        .get_user_by_id(user_id)
        .await
        .map_err(|e| {
            info!("Failed to load user {} for JWT: {}", user_id, e);
            AuthFailure::UserUnavailable
        })?
        .ok_or(AuthFailure::UserUnavailable)?;

    if !user.is_active() {
        return Err(AuthFailure::AccountDisabled);
    }

    cache.insert(cache_key, &user, 0).await;

    Ok(user)
}

impl<S, B> Transform<S, ServiceRequest> for RequireJWT
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = RequireJWTMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequireJWTMiddleware {
            service: Rc::new(service),
        }))
    }
}

pub struct RequireJWTMiddleware<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for RequireJWTMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &self,
        ctx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let srv = self.service.clone();
        Box::pin(async move {
            // 预检请求直接放行
            if req.method() == actix_web::http::Method::OPTIONS {
                return Ok(req.into_response(
                    create_error_response(StatusCode::NO_CONTENT, ErrorCode::Success, "")
                        .map_into_right_body(),
                ));
            }

            match extract_and_validate_jwt(&req).await {
                Ok(user) => {
                    debug!("JWT authentication successful for ID: {}", user.id);
                    req.extensions_mut().insert(user);
                    let res = srv.call(req).await?.map_into_left_body();
                    Ok(res)
                }
                Err(failure) => {
                    info!(
                        "JWT authentication failed for request to {}: {}",
                        req.path(),
                        failure.message()
                    );
                    let status = match failure {
                        AuthFailure::AccountDisabled => StatusCode::FORBIDDEN,
                        _ => StatusCode::UNAUTHORIZED,
                    };
                    Ok(req.into_response(
                        create_error_response(status, failure.code(), failure.message())
                            .map_into_right_body(),
                    ))
                }
            }
        })
    }
}

impl RequireJWT {
    /// 当前认证用户，需在 RequireJWT 之后调用
    pub fn extract_user_claims(req: &actix_web::HttpRequest) -> Option<User> {
        req.extensions().get::<User>().cloned()
    }

    pub fn extract_user_id(req: &actix_web::HttpRequest) -> Option<i64> {
        req.extensions().get::<User>().map(|user| user.id)
    }

    pub fn extract_user_role(req: &actix_web::HttpRequest) -> Option<UserRole> {
        req.extensions().get::<User>().map(|user| user.role)
    }
}
