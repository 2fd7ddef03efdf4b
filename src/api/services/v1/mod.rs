//! API v1 服务模块
//!
//! 所有业务端点都挂载在 `/api/v1` 下，除认证入口外均需要用户登录：
//! - 认证（注册、登录、登出、token 刷新）
//! - 地理数据与城市详情
//! - 访问记录、国家标记与导出
//! - 用户设置
//! - 集合与个人集合
//! - 个人统计

pub mod auth;
mod collections;
pub mod error_code;
mod geography;
mod helpers;
mod personal_collections;
pub mod routes;
mod settings;
mod stats;
pub mod types;
mod visited_cities;
mod visited_countries;

// 重新导出类型
pub use types::*;

// 重新导出帮助函数
pub use helpers::{
    CookieBuilder, api_result, error_from_travelbook, error_response, paginated_response,
    scoped_result, success_response,
};

// 重新导出错误码
pub use error_code::{ApiDomain, ErrorCode};

pub use routes::api_v1_routes;
