//! 统一 API 错误码定义

use serde_repr::{Deserialize_repr, Serialize_repr};

use crate::errors::TravelbookError;

/// API 错误码枚举
///
/// 使用 serde_repr 序列化为数字，按千位分域：
/// - 0: 成功
/// - 1000-1099: 通用错误
/// - 2000-2099: 认证错误
/// - 3000-3099: 访问记录错误
/// - 4000-4099: 用户设置错误
/// - 5000-5099: 集合错误
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize_repr, Deserialize_repr)]
#[repr(i32)]
pub enum ErrorCode {
    // 成功
    Success = 0,

    // 通用错误 1000-1099
    BadRequest = 1000,
    Unauthorized = 1001,
    Forbidden = 1003,
    NotFound = 1004,
    InternalServerError = 1005,
    UnknownParameter = 1006,
    Conflict = 1009,
    InvalidDateFormat = 1012,
    ServiceUnavailable = 1030,

    // 认证错误 2000-2099
    AuthFailed = 2000,
    TokenInvalid = 2002,
    RateLimitExceeded = 2004,
    RegistrationDisabled = 2005,
    UsernameTaken = 2006,

    // 访问记录错误 3000-3099
    VisitNotFound = 3000,
    VisitAlreadyExists = 3001,
    VisitInvalid = 3002,
    CountryNotFound = 3010,
    CountryAlreadyVisited = 3011,

    // 用户设置错误 4000-4099
    SettingNotFound = 4000,
    SettingInvalidValue = 4001,

    // 集合错误 5000-5099
    CollectionNotFound = 5000,
    CollectionForbidden = 5001,
    CollectionInvalid = 5002,
}

/// 接口所属业务域，决定业务错误落在哪个错误码段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiDomain {
    General,
    Auth,
    Visits,
    Countries,
    Settings,
    Collections,
}

impl ErrorCode {
    pub fn for_error(err: &TravelbookError, domain: ApiDomain) -> Self {
        use ApiDomain as D;
        use TravelbookError as E;

        match (domain, err) {
            (D::Auth, E::Unauthorized(_)) => ErrorCode::AuthFailed,
            (D::Auth, E::Conflict(_)) => ErrorCode::UsernameTaken,
            (D::Auth, E::Forbidden(_)) => ErrorCode::RegistrationDisabled,

            (D::Visits, E::NotFound(_)) => ErrorCode::VisitNotFound,
            (D::Visits, E::Conflict(_)) => ErrorCode::VisitAlreadyExists,
            (D::Visits, E::Validation(_)) => ErrorCode::VisitInvalid,

            (D::Countries, E::NotFound(_)) => ErrorCode::CountryNotFound,
            (D::Countries, E::Conflict(_)) => ErrorCode::CountryAlreadyVisited,

            (D::Settings, E::NotFound(_)) => ErrorCode::SettingNotFound,
            (D::Settings, E::Validation(_) | E::UnknownParameter(_)) => {
                ErrorCode::SettingInvalidValue
            }

            (D::Collections, E::NotFound(_)) => ErrorCode::CollectionNotFound,
            (D::Collections, E::Forbidden(_)) => ErrorCode::CollectionForbidden,
            (D::Collections, E::Validation(_)) => ErrorCode::CollectionInvalid,

            (_, err) => ErrorCode::from(err),
        }
    }
}

impl From<&TravelbookError> for ErrorCode {
    fn from(err: &TravelbookError) -> Self {
        match err {
            TravelbookError::Validation(_) | TravelbookError::Serialization(_) => {
                ErrorCode::BadRequest
            }
            TravelbookError::DateParse(_) => ErrorCode::InvalidDateFormat,
            TravelbookError::NotFound(_) => ErrorCode::NotFound,
            TravelbookError::Conflict(_) => ErrorCode::Conflict,
            TravelbookError::Forbidden(_) => ErrorCode::Forbidden,
            TravelbookError::Unauthorized(_) => ErrorCode::Unauthorized,
            TravelbookError::UnknownParameter(_) => ErrorCode::UnknownParameter,
            TravelbookError::DatabaseConnection(_) => ErrorCode::ServiceUnavailable,
            TravelbookError::DatabaseConfig(_)
            | TravelbookError::DatabaseOperation(_)
            | TravelbookError::FileOperation(_)
            | TravelbookError::Internal(_) => ErrorCode::InternalServerError,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_as_number() {
        assert_eq!(serde_json::to_string(&ErrorCode::VisitAlreadyExists).unwrap(), "3001");
        assert_eq!(serde_json::to_string(&ErrorCode::Success).unwrap(), "0");
    }

    #[test]
    fn test_domain_mapping() {
        let not_found = TravelbookError::not_found("x");
        assert_eq!(ErrorCode::for_error(&not_found, ApiDomain::Visits), ErrorCode::VisitNotFound);
        assert_eq!(
            ErrorCode::for_error(&not_found, ApiDomain::Collections),
            ErrorCode::CollectionNotFound
        );
        assert_eq!(ErrorCode::for_error(&not_found, ApiDomain::General), ErrorCode::NotFound);

        let unknown = TravelbookError::unknown_parameter("sort");
        assert_eq!(ErrorCode::for_error(&unknown, ApiDomain::Visits), ErrorCode::UnknownParameter);
        assert_eq!(
            ErrorCode::for_error(&unknown, ApiDomain::Settings),
            ErrorCode::SettingInvalidValue
        );
    }
}
