//! 认证相关端点

use actix_governor::{Governor, GovernorConfigBuilder, KeyExtractor, SimpleKeyExtractionError};
use actix_web::dev::ServiceRequest;
use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, Responder, Result as ActixResult, web};
use governor::middleware::NoOpMiddleware;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::api::jwt::get_jwt_service;
use crate::api::middleware::AuthUser;
use crate::api::constants;
use crate::config::get_config;
use crate::services::UserService;
use crate::services::user_service::{RegisterRequest, UserProfile};

use super::error_code::{ApiDomain, ErrorCode};
use super::helpers::{
    CookieBuilder, error_from_travelbook, error_response, json_response, scoped_result,
    success_response,
};
use super::types::{AuthSuccessResponse, LoginCredentials, MessageResponse, RefreshRequest};

/// 基于连接 IP 的限流 key 提取器
#[derive(Clone, Copy)]
pub struct LoginKeyExtractor;

impl KeyExtractor for LoginKeyExtractor {
    type Key = String;
    type KeyExtractionError = SimpleKeyExtractionError<&'static str>;

    fn extract(&self, req: &ServiceRequest) -> Result<Self::Key, Self::KeyExtractionError> {
        req.connection_info()
            .peer_addr()
            .map(|ip| ip.to_string())
            .ok_or_else(|| SimpleKeyExtractionError::new("Unable to extract peer IP"))
    }
}

/// 创建登录限流器：每秒补充 1 个令牌，突发最多 5 次
pub fn login_rate_limiter() -> Governor<LoginKeyExtractor, NoOpMiddleware> {
    let config = GovernorConfigBuilder::default()
        .seconds_per_request(1)
        .burst_size(5)
        .key_extractor(LoginKeyExtractor)
        .finish()
        .expect("Invalid rate limit config");

    debug!("Login rate limiter created: 1 req/s, burst 5");
    Governor::new(&config)
}

/// 签发 access/refresh token 并写入 cookie
fn issue_tokens(user: UserProfile, message: &str, status: StatusCode) -> HttpResponse {
    let jwt_service = get_jwt_service();
    let tokens = jwt_service
        .generate_access_token(user.id, &user.username)
        .and_then(|access| {
            jwt_service
                .generate_refresh_token(user.id, &user.username)
                .map(|refresh| (access, refresh))
        });

    let (access_token, refresh_token) = match tokens {
        Ok(tokens) => tokens,
        Err(e) => {
            error!("Failed to generate tokens for user {}: {}", user.id, e);
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorCode::InternalServerError,
                "Failed to generate token",
            );
        }
    };

    let cookie_builder = CookieBuilder::from_config();
    let mut response = json_response(
        status,
        ErrorCode::Success,
        message,
        Some(AuthSuccessResponse {
            access_token: access_token.clone(),
            refresh_token: refresh_token.clone(),
            expires_in: cookie_builder.access_token_minutes() * 60,
            user,
        }),
    );
    for cookie in [
        cookie_builder.build_access_cookie(access_token),
        cookie_builder.build_refresh_cookie(refresh_token),
    ] {
        if let Err(e) = response.add_cookie(&cookie) {
            warn!("Failed to set auth cookie: {}", e);
        }
    }
    response
}

/// 注册新用户
pub async fn register(
    body: web::Json<RegisterRequest>,
    users: web::Data<Arc<UserService>>,
) -> ActixResult<impl Responder> {
    if !get_config().auth.allow_registration {
        return Ok(error_response(
            StatusCode::FORBIDDEN,
            ErrorCode::RegistrationDisabled,
            "Registration is disabled",
        ));
    }

    Ok(match users.register(body.into_inner()).await {
        Ok(user) => issue_tokens(user, "Registration successful", StatusCode::CREATED),
        Err(e) => error_from_travelbook(&e, ApiDomain::Auth),
    })
}

/// 用户名密码登录
pub async fn login(
    body: web::Json<LoginCredentials>,
    users: web::Data<Arc<UserService>>,
) -> ActixResult<impl Responder> {
    Ok(match users.authenticate(&body.username, &body.password).await {
        Ok(user) => {
            info!("User {} logged in", user.username);
            issue_tokens(user, "Login successful", StatusCode::OK)
        }
        Err(e) => {
            warn!("Login failed for '{}': {}", body.username, e);
            error_from_travelbook(&e, ApiDomain::Auth)
        }
    })
}

/// 刷新 token（请求体或 refresh cookie）
pub async fn refresh_token(
    req: HttpRequest,
    body: Option<web::Json<RefreshRequest>>,
    users: web::Data<Arc<UserService>>,
) -> ActixResult<impl Responder> {
    let token = body
        .and_then(|b| b.into_inner().refresh_token)
        .or_else(|| {
            req.cookie(constants::REFRESH_COOKIE_NAME)
                .map(|c| c.value().to_string())
        });

    let Some(token) = token else {
        return Ok(error_response(
            StatusCode::UNAUTHORIZED,
            ErrorCode::TokenInvalid,
            "Refresh token not found",
        ));
    };

    let user_id = match get_jwt_service()
        .validate_refresh_token(&token)
        .map_err(|e| e.to_string())
        .and_then(|claims| claims.user_id().map_err(|e| e.to_string()))
    {
        Ok(id) => id,
        Err(e) => {
            warn!("Invalid refresh token: {}", e);
            return Ok(error_response(
                StatusCode::UNAUTHORIZED,
                ErrorCode::TokenInvalid,
                "Invalid refresh token",
            ));
        }
    };

    // 用户可能已被删除
    Ok(match users.get_profile(user_id).await {
        Ok(user) => issue_tokens(user, "Token refreshed", StatusCode::OK),
        Err(_) => error_response(
            StatusCode::UNAUTHORIZED,
            ErrorCode::TokenInvalid,
            "Invalid refresh token",
        ),
    })
}

/// 登出：清除 cookie
pub async fn logout() -> ActixResult<impl Responder> {
    let cookie_builder = CookieBuilder::from_config();
    let mut response = success_response(MessageResponse {
        message: "Logout successful".to_string(),
    });
    for cookie in [
        cookie_builder.build_expired_access_cookie(),
        cookie_builder.build_expired_refresh_cookie(),
    ] {
        if let Err(e) = response.add_cookie(&cookie) {
            warn!("Failed to clear auth cookie: {}", e);
        }
    }
    Ok(response)
}

/// 当前用户信息
pub async fn me(
    user: AuthUser,
    users: web::Data<Arc<UserService>>,
) -> ActixResult<impl Responder> {
    Ok(scoped_result(ApiDomain::Auth, users.get_profile(user.id).await))
}
