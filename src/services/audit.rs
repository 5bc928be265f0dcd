//! 审计日志
//!
//! 写日志失败不影响调用方，只记录 warn。

use actix_web::HttpRequest;
use actix_web::http::header::USER_AGENT;
use tracing::warn;

use crate::models::audit::NewAuditLog;
use crate::storage::Storage;

/// 一条待写入的审计事件
#[derive(Debug, Clone, Default)]
pub struct AuditEvent<'a> {
    pub action: &'a str,
    pub resource_type: Option<&'a str>,
    pub resource_id: Option<&'a str>,
    pub details: Option<serde_json::Value>,
}

impl<'a> AuditEvent<'a> {
    pub fn new(action: &'a str) -> Self {
        Self {
            action,
            ..Default::default()
        }
    }

    pub fn resource(mut self, resource_type: &'a str, resource_id: &'a str) -> Self {
        self.resource_type = Some(resource_type);
        self.resource_id = Some(resource_id);
        self
    }

    pub fn details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}

/// 客户端地址与 UA
pub(crate) fn client_info(req: &HttpRequest) -> (Option<String>, Option<String>) {
    let ip = req.peer_addr().map(|addr| addr.ip().to_string());
    let user_agent = req
        .headers()
        .get(USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    (ip, user_agent)
}

pub async fn log_audit_event(
    storage: &dyn Storage,
    req: &HttpRequest,
    user_id: Option<&str>,
    event: AuditEvent<'_>,
) {
    let (ip_address, user_agent) = client_info(req);
    let log = NewAuditLog {
        user_id: user_id.map(str::to_string),
        action: event.action.to_string(),
        resource_type: event.resource_type.map(str::to_string),
        resource_id: event.resource_id.map(str::to_string),
        details: event.details,
        ip_address,
        user_agent,
    };

    if let Err(e) = storage.create_audit_log(log).await {
        warn!("Failed to write audit log '{}': {}", event.action, e);
    }
}
