use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use crate::cache::user_cache_key;
use crate::models::ApiResponse;
use crate::services::cache_from_request;
use crate::utils::jwt::JwtUtils;

use super::AuthService;

/// 登出：清除 refresh cookie，并丢弃当前 access token 对应的用户缓存
pub async fn handle_logout(
    _service: &AuthService,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let bearer = request
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(str::trim);

    if let (Some(token), Some(cache)) = (bearer, cache_from_request(request)) {
        cache.remove(&user_cache_key(token)).await;
    }

    Ok(HttpResponse::Ok()
        .cookie(JwtUtils::create_empty_refresh_token_cookie())
        .json(ApiResponse::<()>::success_empty("Logged out")))
}
