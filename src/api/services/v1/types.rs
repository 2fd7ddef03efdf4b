//! API 类型定义

use serde::{Deserialize, Serialize};

use crate::services::user_service::UserProfile;

/// 统一响应信封
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ApiResponse<T> {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct PaginatedResponse<T> {
    pub code: i32,
    pub message: String,
    pub data: T,
    pub pagination: PaginationInfo,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct PaginationInfo {
    pub page: u64,
    pub page_size: u64,
    pub total: u64,
    pub total_pages: u64,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct LoginCredentials {
    pub username: String,
    pub password: String,
}

/// 刷新 token 的请求体（也可以只依赖 refresh cookie）
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct RefreshRequest {
    #[serde(default)]
    pub refresh_token: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct AuthSuccessResponse {
    pub access_token: String,
    pub refresh_token: String,
    /// access token 有效期（秒）
    pub expires_in: u64,
    pub user: UserProfile,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct MessageResponse {
    pub message: String,
}

/// 列表的筛选/排序参数
#[derive(Deserialize, Clone, Debug, Default)]
pub struct FilterSortQuery {
    pub filter: Option<String>,
    pub sort: Option<String>,
}

#[derive(Deserialize, Clone, Debug, Default)]
pub struct CountryQuery {
    pub country_id: Option<i32>,
}

#[derive(Deserialize, Clone, Debug, Default)]
pub struct ExportQuery {
    pub format: Option<String>,
}

#[derive(Deserialize, Clone, Debug)]
pub struct AddCountryRequest {
    pub code: String,
}

#[derive(Deserialize, Clone, Debug)]
pub struct PublicFlagRequest {
    pub is_public: bool,
}
