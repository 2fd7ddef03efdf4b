//! API 模块常量定义

/// Access Token Cookie 名称
pub const ACCESS_COOKIE_NAME: &str = "travelbook_access";

/// Refresh Token Cookie 名称
pub const REFRESH_COOKIE_NAME: &str = "travelbook_refresh";

/// API 路由前缀
pub const API_PREFIX: &str = "/api/v1";

/// 健康检查路由前缀
pub const HEALTH_PREFIX: &str = "/health";
