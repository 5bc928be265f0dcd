//! API 数据模型
//!
//! 对外的请求、响应与业务实体，均派生 `TS` 以生成前端类型。

pub mod announcements;
pub mod audit;
pub mod auth;
pub mod classes;
pub mod common;
pub mod gate;
pub mod homework;
pub mod notifications;
pub mod profiles;
pub mod reports;

pub use common::response::ApiResponse;

/// 响应体中的业务错误码
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ErrorCode {
    Success = 0,

    // 通用错误
    BadRequest = 1000,
    Unauthorized = 1001,
    Forbidden = 1003,
    NotFound = 1004,
    RateLimitExceeded = 1029,
    InternalServerError = 1500,

    // 认证
    AuthFailed = 2000,
    PasswordTooWeak = 2001,
    CaptchaRequired = 2002,
    CaptchaInvalid = 2003,
    EmailRequired = 2004,

    // 班级
    ClassNotFound = 3000,
    ClassCodeInvalid = 3001,
    ClassRequired = 3002,
    ClassMismatch = 3003,
    ProfileNotFound = 3004,

    // 作业
    HomeworkNotFound = 4000,
    HomeworkInvalid = 4001,

    // 附件
    FileUploadFailed = 5000,
    FileTypeNotAllowed = 5001,
    FileSizeExceeded = 5002,
    FileNotFound = 5003,
    FileSignatureInvalid = 5004,

    // 公告、通知、举报
    AnnouncementNotFound = 6000,
    AnnouncementInvalid = 6001,
    NotificationNotFound = 6100,
    ReportInvalid = 6200,
}
