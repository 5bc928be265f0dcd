use actix_web::{HttpResponse, http::StatusCode};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::errors::PlannerError;
use crate::models::ErrorCode;

// 统一的API响应结构
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/api.ts")]
pub struct ApiResponse<T: TS> {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl<T: TS> ApiResponse<T> {
    pub fn success(data: T, message: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::Success as i32,
            message: message.into(),
            data: Some(data),
            timestamp: chrono::Utc::now(),
        }
    }

    pub fn error(code: ErrorCode, data: T, message: impl Into<String>) -> Self {
        Self {
            code: code as i32,
            message: message.into(),
            data: Some(data),
            timestamp: chrono::Utc::now(),
        }
    }
}

impl ApiResponse<()> {
    pub fn success_empty(message: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::Success as i32,
            message: message.into(),
            data: None,
            timestamp: chrono::Utc::now(),
        }
    }

    pub fn error_empty(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code: code as i32,
            message: message.into(),
            data: None,
            timestamp: chrono::Utc::now(),
        }
    }
}

/// 服务层错误到 HTTP 状态与业务码的映射
pub fn status_for(err: &PlannerError) -> (StatusCode, ErrorCode) {
    match err {
        PlannerError::Validation(_) => (StatusCode::BAD_REQUEST, ErrorCode::BadRequest),
        PlannerError::NotFound(_) => (StatusCode::NOT_FOUND, ErrorCode::NotFound),
        PlannerError::Authentication(_) => (StatusCode::UNAUTHORIZED, ErrorCode::Unauthorized),
        PlannerError::Authorization(_) => (StatusCode::FORBIDDEN, ErrorCode::Forbidden),
        PlannerError::RateLimited(_) => {
            (StatusCode::TOO_MANY_REQUESTS, ErrorCode::RateLimitExceeded)
        }
        _ => (
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorCode::InternalServerError,
        ),
    }
}

/// 将错误写成统一响应；`code` 为 None 时使用映射得到的业务码
pub fn error_response(err: &PlannerError, code: Option<ErrorCode>) -> HttpResponse {
    let (status, mapped) = status_for(err);
    HttpResponse::build(status).json(ApiResponse::error_empty(
        code.unwrap_or(mapped),
        err.message(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            status_for(&PlannerError::validation("x")).0,
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_for(&PlannerError::authorization("x")).0,
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            status_for(&PlannerError::database_operation("x")),
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorCode::InternalServerError
            )
        );
    }

    #[test]
    fn test_success_envelope() {
        let json = serde_json::to_value(ApiResponse::success(3, "ok")).unwrap();
        assert_eq!(json["code"], 0);
        assert_eq!(json["data"], 3);

        let json = serde_json::to_value(ApiResponse::error_empty(ErrorCode::NotFound, "gone"))
            .unwrap();
        assert_eq!(json["code"], 1004);
        assert!(json.get("data").is_none());
    }
}
