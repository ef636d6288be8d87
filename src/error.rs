use crate::models::DocumentId;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 存储相关错误
    #[error("存储错误: {0}")]
    Store(#[from] StoreError),
    /// 请求参数错误
    #[error("请求参数错误: {0}")]
    BadRequest(String),
    /// 已有批处理在运行
    #[error("已有批处理正在运行，请稍后再试")]
    Busy,
}

/// 存储错误
#[derive(Debug, Error)]
pub enum StoreError {
    /// 连接丢失或连接池不可用
    #[error("存储不可用: {0}")]
    Unavailable(String),
    /// 记录在读取后被并发修改
    #[error("提交冲突: 文档 {id} 已被并发修改")]
    CommitConflict { id: DocumentId },
    /// 其他查询错误
    #[error("查询失败: {0}")]
    Query(String),
}

/// 增强服务客户端错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// 超时、连接失败、5xx 等可在下次调用时重试的错误
    #[error("{service} 暂时性错误: {message}")]
    Transient { service: String, message: String },
    /// 4xx、响应格式错误等重试也不会成功的错误
    #[error("{service} 永久性错误: {message}")]
    Permanent { service: String, message: String },
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 环境变量解析失败
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
    /// 必填配置缺失
    #[error("缺少配置项: {field}")]
    Missing { field: String },
    /// 配置值不合法
    #[error("配置项 {field} 不合法: {reason}")]
    Invalid { field: String, reason: String },
    /// 读取配置文件失败
    #[error("读取配置文件失败 ({path}): {source}")]
    FileReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// TOML 解析失败
    #[error("TOML解析失败 ({path}): {source}")]
    TomlParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

// ========== 从常见错误类型转换 ==========

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed => StoreError::Unavailable(err.to_string()),
            sqlx::Error::Database(db_err) => match db_err.code().as_deref() {
                // 08xxx: connection exception; 57P01: admin shutdown
                Some(code) if code.starts_with("08") || code == "57P01" => {
                    StoreError::Unavailable(err.to_string())
                }
                _ => StoreError::Query(err.to_string()),
            },
            _ => StoreError::Query(err.to_string()),
        }
    }
}

// ========== 便捷构造函数 ==========

impl ClientError {
    pub fn transient(service: impl Into<String>, message: impl Into<String>) -> Self {
        ClientError::Transient {
            service: service.into(),
            message: message.into(),
        }
    }

    pub fn permanent(service: impl Into<String>, message: impl Into<String>) -> Self {
        ClientError::Permanent {
            service: service.into(),
            message: message.into(),
        }
    }

    pub fn is_transient(&self) -> bool {
        matches!(self, ClientError::Transient { .. })
    }
}

impl ConfigError {
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

// ========== HTTP 响应 ==========

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Store(StoreError::Unavailable(_)) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Store(StoreError::CommitConflict { .. }) => StatusCode::CONFLICT,
            AppError::Store(StoreError::Query(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Busy => StatusCode::CONFLICT,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;

/// 存储结果类型
pub type StoreResult<T> = Result<T, StoreError>;
