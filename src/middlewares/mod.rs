pub mod rate_limit;
pub mod require_class;
pub mod require_jwt;

pub use rate_limit::RateLimit;
pub use require_class::RequireClass;
pub use require_jwt::RequireJWT;

use actix_web::{HttpResponse, http::StatusCode, http::header::CONTENT_TYPE};

use crate::models::{ApiResponse, ErrorCode};

// 中间件共用的错误响应
pub(crate) fn create_error_response(
    status: StatusCode,
    code: ErrorCode,
    message: &str,
) -> HttpResponse {
    HttpResponse::build(status)
        .insert_header((CONTENT_TYPE, "application/json; charset=utf-8"))
        .json(ApiResponse::<()>::error_empty(code, message))
}
