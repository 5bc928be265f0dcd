use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use crate::models::reports::{CreateReportRequest, NewContentReport, REPORT_REASONS};
use crate::models::{ApiResponse, ErrorCode};
use crate::services::audit::{AuditEvent, log_audit_event};
use crate::services::homework::update::{find_class_homework, homework_not_found};
use crate::services::{class_from, session_from, storage_error, try_or_respond};
use crate::storage::Storage;
use crate::utils::content_filter::filter_content;

/// 校验原因并过滤描述
pub fn prepare_report(
    body: CreateReportRequest,
    reported_by: &str,
) -> Result<NewContentReport, &'static str> {
    if !REPORT_REASONS.contains(&body.reason.as_str()) {
        return Err("Please select a reason");
    }
    let description = body
        .description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
        .map(|d| filter_content(&d).filtered);

    Ok(NewContentReport {
        homework_id: body.homework_id,
        reported_by: reported_by.to_string(),
        reason: body.reason,
        description,
    })
}

pub struct ReportService {
    storage: Option<Arc<dyn Storage>>,
}

impl ReportService {
    pub fn new_lazy() -> Self {
        Self { storage: None }
    }

    pub(crate) fn get_storage(&self, request: &HttpRequest) -> Result<Arc<dyn Storage>, HttpResponse> {
        match &self.storage {
            Some(storage) => Ok(storage.clone()),
            None => super::storage_from(request),
        }
    }

    // 举报作业内容
    pub async fn create(
        &self,
        request: &HttpRequest,
        body: CreateReportRequest,
    ) -> ActixResult<HttpResponse> {
        let storage = try_or_respond!(self.get_storage(request));
        let user = try_or_respond!(session_from(request));
        let class = try_or_respond!(class_from(request));

        let report = match prepare_report(body, &user.id) {
            Ok(report) => report,
            Err(message) => {
                return Ok(HttpResponse::BadRequest()
                    .json(ApiResponse::error_empty(ErrorCode::ReportInvalid, message)));
            }
        };

        match find_class_homework(storage.as_ref(), &class.class_id, &report.homework_id).await {
            Ok(Some(_)) => {}
            Ok(None) => return Ok(homework_not_found()),
            Err(e) => return Ok(storage_error(e, None)),
        }

        let created = match storage.create_report(report).await {
            Ok(created) => created,
            Err(e) => return Ok(storage_error(e, None)),
        };

        log_audit_event(
            storage.as_ref(),
            request,
            Some(&user.id),
            AuditEvent::new("content_reported")
                .resource("homework", &created.homework_id)
                .details(serde_json::json!({ "reason": created.reason })),
        )
        .await;

        Ok(HttpResponse::Created().json(ApiResponse::success(
            created,
            "Report submitted. Thank you for helping keep the class safe.",
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(reason: &str, description: Option<&str>) -> CreateReportRequest {
        CreateReportRequest {
            homework_id: "h1".into(),
            reason: reason.into(),
            description: description.map(str::to_string),
        }
    }

    #[test]
    fn test_reason_must_be_listed() {
        assert_eq!(
            prepare_report(body("", None), "u1").unwrap_err(),
            "Please select a reason"
        );
        assert!(prepare_report(body("Because", None), "u1").is_err());
        assert!(prepare_report(body("Spam or misleading", None), "u1").is_ok());
    }

    #[test]
    fn test_description_is_filtered() {
        let report = prepare_report(body("Other", Some(" this is badword1 stuff ")), "u1").unwrap();
        assert_eq!(report.description.as_deref(), Some("this is *** stuff"));
        assert_eq!(report.reported_by, "u1");

        let blank = prepare_report(body("Other", Some("   ")), "u1").unwrap();
        assert_eq!(blank.description, None);
    }
}
