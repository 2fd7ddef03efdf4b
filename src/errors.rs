use std::fmt;

use actix_web::http::StatusCode;

#[derive(Debug, Clone)]
pub enum TravelbookError {
    DatabaseConfig(String),
    DatabaseConnection(String),
    DatabaseOperation(String),
    FileOperation(String),
    Validation(String),
    NotFound(String),
    Conflict(String),
    Forbidden(String),
    Unauthorized(String),
    UnknownParameter(String),
    Serialization(String),
    DateParse(String),
    Internal(String),
}

impl TravelbookError {
    /// 获取错误代码
    pub fn code(&self) -> &'static str {
        match self {
            TravelbookError::DatabaseConfig(_) => "E001",
            TravelbookError::DatabaseConnection(_) => "E002",
            TravelbookError::DatabaseOperation(_) => "E003",
            TravelbookError::FileOperation(_) => "E004",
            TravelbookError::Validation(_) => "E005",
            TravelbookError::NotFound(_) => "E006",
            TravelbookError::Conflict(_) => "E007",
            TravelbookError::Forbidden(_) => "E008",
            TravelbookError::Unauthorized(_) => "E009",
            TravelbookError::UnknownParameter(_) => "E010",
            TravelbookError::Serialization(_) => "E011",
            TravelbookError::DateParse(_) => "E012",
            TravelbookError::Internal(_) => "E013",
        }
    }

    /// 获取错误类型名称
    pub fn error_type(&self) -> &'static str {
        match self {
            TravelbookError::DatabaseConfig(_) => "Database Configuration Error",
            TravelbookError::DatabaseConnection(_) => "Database Connection Error",
            TravelbookError::DatabaseOperation(_) => "Database Operation Error",
            TravelbookError::FileOperation(_) => "File Operation Error",
            TravelbookError::Validation(_) => "Validation Error",
            TravelbookError::NotFound(_) => "Resource Not Found",
            TravelbookError::Conflict(_) => "Conflict",
            TravelbookError::Forbidden(_) => "Forbidden",
            TravelbookError::Unauthorized(_) => "Unauthorized",
            TravelbookError::UnknownParameter(_) => "Unknown Parameter",
            TravelbookError::Serialization(_) => "Serialization Error",
            TravelbookError::DateParse(_) => "Date Parse Error",
            TravelbookError::Internal(_) => "Internal Error",
        }
    }

    /// 获取错误详情
    pub fn message(&self) -> &str {
        match self {
            TravelbookError::DatabaseConfig(msg)
            | TravelbookError::DatabaseConnection(msg)
            | TravelbookError::DatabaseOperation(msg)
            | TravelbookError::FileOperation(msg)
            | TravelbookError::Validation(msg)
            | TravelbookError::NotFound(msg)
            | TravelbookError::Conflict(msg)
            | TravelbookError::Forbidden(msg)
            | TravelbookError::Unauthorized(msg)
            | TravelbookError::UnknownParameter(msg)
            | TravelbookError::Serialization(msg)
            | TravelbookError::DateParse(msg)
            | TravelbookError::Internal(msg) => msg,
        }
    }

    /// 映射到 HTTP 状态码
    pub fn http_status(&self) -> StatusCode {
        match self {
            TravelbookError::Validation(_)
            | TravelbookError::UnknownParameter(_)
            | TravelbookError::DateParse(_)
            | TravelbookError::Serialization(_) => StatusCode::BAD_REQUEST,
            TravelbookError::NotFound(_) => StatusCode::NOT_FOUND,
            TravelbookError::Conflict(_) => StatusCode::CONFLICT,
            TravelbookError::Forbidden(_) => StatusCode::FORBIDDEN,
            TravelbookError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            TravelbookError::DatabaseConnection(_) => StatusCode::SERVICE_UNAVAILABLE,
            TravelbookError::DatabaseConfig(_)
            | TravelbookError::DatabaseOperation(_)
            | TravelbookError::FileOperation(_)
            | TravelbookError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// 格式化为彩色输出（用于 Server 模式）
    pub fn format_colored(&self) -> String {
        use colored::Colorize;
        format!(
            "{} {} {}\n  {}",
            "[ERROR]".red().bold(),
            self.code().yellow(),
            self.error_type().red(),
            self.message().white()
        )
    }

    /// 格式化为简洁输出（用于 CLI 模式）
    pub fn format_simple(&self) -> String {
        format!("{}: {}", self.error_type(), self.message())
    }
}

impl fmt::Display for TravelbookError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for TravelbookError {}

// 便捷的构造函数
impl TravelbookError {
    pub fn database_config<T: Into<String>>(msg: T) -> Self {
        TravelbookError::DatabaseConfig(msg.into())
    }

    pub fn database_connection<T: Into<String>>(msg: T) -> Self {
        TravelbookError::DatabaseConnection(msg.into())
    }

    pub fn database_operation<T: Into<String>>(msg: T) -> Self {
        TravelbookError::DatabaseOperation(msg.into())
    }

    pub fn file_operation<T: Into<String>>(msg: T) -> Self {
        TravelbookError::FileOperation(msg.into())
    }

    pub fn validation<T: Into<String>>(msg: T) -> Self {
        TravelbookError::Validation(msg.into())
    }

    pub fn not_found<T: Into<String>>(msg: T) -> Self {
        TravelbookError::NotFound(msg.into())
    }

    pub fn conflict<T: Into<String>>(msg: T) -> Self {
        TravelbookError::Conflict(msg.into())
    }

    pub fn forbidden<T: Into<String>>(msg: T) -> Self {
        TravelbookError::Forbidden(msg.into())
    }

    pub fn unauthorized<T: Into<String>>(msg: T) -> Self {
        TravelbookError::Unauthorized(msg.into())
    }

    pub fn unknown_parameter<T: Into<String>>(msg: T) -> Self {
        TravelbookError::UnknownParameter(msg.into())
    }

    pub fn serialization<T: Into<String>>(msg: T) -> Self {
        TravelbookError::Serialization(msg.into())
    }

    pub fn date_parse<T: Into<String>>(msg: T) -> Self {
        TravelbookError::DateParse(msg.into())
    }

    pub fn internal<T: Into<String>>(msg: T) -> Self {
        TravelbookError::Internal(msg.into())
    }

    /// 唯一索引冲突转为 Conflict，其余按数据库错误处理
    pub fn conflict_on_unique<T: Into<String>>(err: sea_orm::DbErr, msg: T) -> Self {
        match err.sql_err() {
            Some(sea_orm::SqlErr::UniqueConstraintViolation(_)) => {
                TravelbookError::Conflict(msg.into())
            }
            _ => err.into(),
        }
    }
}

// 为常见的错误类型实现 From trait
impl From<sea_orm::DbErr> for TravelbookError {
    fn from(err: sea_orm::DbErr) -> Self {
        TravelbookError::DatabaseOperation(err.to_string())
    }
}

impl From<std::io::Error> for TravelbookError {
    fn from(err: std::io::Error) -> Self {
        TravelbookError::FileOperation(err.to_string())
    }
}

impl From<serde_json::Error> for TravelbookError {
    fn from(err: serde_json::Error) -> Self {
        TravelbookError::Serialization(err.to_string())
    }
}

impl From<chrono::ParseError> for TravelbookError {
    fn from(err: chrono::ParseError) -> Self {
        TravelbookError::DateParse(err.to_string())
    }
}

impl From<csv::Error> for TravelbookError {
    fn from(err: csv::Error) -> Self {
        TravelbookError::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, TravelbookError>;
