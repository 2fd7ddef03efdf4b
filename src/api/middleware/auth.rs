//! User authentication middleware
//!
//! 校验 Bearer token 或 access cookie 中的 JWT，成功后把 [`AuthUser`] 放入
//! request extensions；认证类接口（注册、登录、刷新、登出）直接放行。

use actix_service::{Service, Transform};
use actix_web::{
    Error, FromRequest, HttpMessage, HttpRequest, HttpResponse,
    body::EitherBody,
    dev::{Payload, ServiceRequest, ServiceResponse},
    http::{Method, StatusCode},
};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use std::rc::Rc;
use tracing::{debug, info, trace};

use crate::api::constants;
use crate::api::jwt::get_jwt_service;
use crate::api::services::v1::{ErrorCode, error_response};
use crate::errors::TravelbookError;

/// 已认证的用户
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthUser {
    pub id: i32,
    pub username: String,
}

impl FromRequest for AuthUser {
    type Error = TravelbookError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<AuthUser>()
                .cloned()
                .ok_or_else(|| TravelbookError::unauthorized("Authentication required")),
        )
    }
}

/// 不需要 access token 的接口（相对 API 前缀）
const PUBLIC_PATHS: [&str; 4] = ["/auth/register", "/auth/login", "/auth/refresh", "/auth/logout"];

/// User authentication middleware
#[derive(Clone)]
pub struct UserAuth;

impl<S, B> Transform<S, ServiceRequest> for UserAuth
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = UserAuthMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(UserAuthMiddleware {
            service: Rc::new(service),
        }))
    }
}

pub struct UserAuthMiddleware<S> {
    service: Rc<S>,
}

impl<S, B> UserAuthMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    fn handle_unauthorized(req: ServiceRequest, message: &str) -> ServiceResponse<EitherBody<B>> {
        info!("Authentication failed for {}: {}", req.path(), message);
        req.into_response(
            error_response(StatusCode::UNAUTHORIZED, ErrorCode::Unauthorized, message)
                .map_into_right_body(),
        )
    }

    fn is_public_endpoint(req: &ServiceRequest) -> bool {
        req.path()
            .strip_prefix(constants::API_PREFIX)
            .is_some_and(|rest| PUBLIC_PATHS.contains(&rest))
    }

    /// 从 Authorization header 提取 Bearer token
    fn extract_bearer_token(req: &ServiceRequest) -> Option<String> {
        req.headers()
            .get("Authorization")
            .and_then(|h| h.to_str().ok())
            .and_then(|s| s.strip_prefix("Bearer "))
            .map(|s| s.trim().to_string())
    }

    /// Bearer 优先，其次 access cookie
    fn authenticate(req: &ServiceRequest) -> Result<AuthUser, &'static str> {
        let token = Self::extract_bearer_token(req)
            .or_else(|| {
                req.cookie(constants::ACCESS_COOKIE_NAME)
                    .map(|c| c.value().to_string())
            })
            .ok_or("Unauthorized: missing token")?;

        let claims = get_jwt_service()
            .validate_access_token(&token)
            .map_err(|e| {
                debug!("Access token validation failed: {}", e);
                "Unauthorized: invalid or expired token"
            })?;
        let id = claims
            .user_id()
            .map_err(|_| "Unauthorized: invalid token subject")?;

        Ok(AuthUser {
            id,
            username: claims.username,
        })
    }
}

impl<S, B> Service<ServiceRequest> for UserAuthMiddleware<S>
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
            // CORS 预检由 Cors 中间件处理
            if req.method() == Method::OPTIONS {
                return Ok(req.into_response(HttpResponse::NoContent().finish().map_into_right_body()));
            }

            if Self::is_public_endpoint(&req) {
                trace!("Public endpoint {} - bypassing authentication", req.path());
                return Ok(srv.call(req).await?.map_into_left_body());
            }

            match Self::authenticate(&req) {
                Ok(user) => {
                    trace!("Authenticated user {} ({})", user.username, user.id);
                    req.extensions_mut().insert(user);
                    Ok(srv.call(req).await?.map_into_left_body())
                }
                Err(message) => Ok(Self::handle_unauthorized(req, message)),
            }
        })
    }
}
