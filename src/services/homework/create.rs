use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::info;

use super::{HomeworkService, publish_change};
use crate::models::homework::entities::Homework;
use crate::models::homework::requests::{HomeworkForm, NewHomework};
use crate::models::notifications::entities::HOMEWORK_CREATED;
use crate::models::{ApiResponse, ErrorCode};
use crate::realtime::{ChangeKind, Table};
use crate::services::audit::{AuditEvent, log_audit_event};
use crate::services::notifications::notify_class_members;
use crate::services::{class_from, session_from, storage_error, try_or_respond};
use crate::utils::validate::validate_homework_form;

pub async fn create_homework(
    service: &HomeworkService,
    request: &HttpRequest,
    form: HomeworkForm,
) -> ActixResult<HttpResponse> {
    let storage = try_or_respond!(service.get_storage(request));
    let user = try_or_respond!(session_from(request));
    let class = try_or_respond!(class_from(request));

    let form = match validate_homework_form(form) {
        Ok(form) => form,
        Err(message) => {
            return Ok(HttpResponse::BadRequest()
                .json(ApiResponse::error_empty(ErrorCode::HomeworkInvalid, message)));
        }
    };

    let homework = match storage
        .create_homework(NewHomework {
            class_id: class.class_id.clone(),
            title: form.title,
            description: form.description,
            subject: form.subject,
            due_date: form.due_date,
            created_by: Some(user.id.clone()),
        })
        .await
    {
        Ok(homework) => homework,
        Err(e) => return Ok(storage_error(e, None)),
    };
    info!("User {} created homework {}", user.id, homework.id);

    publish_change::<Homework>(
        Table::Homework,
        ChangeKind::Insert,
        &class.class_id,
        Some(&homework),
        None,
    );

    notify_class_members(
        storage.as_ref(),
        &class.class_id,
        &user.id,
        HOMEWORK_CREATED,
        format!("New homework: {}", homework.title),
        Some(format!(
            "Due {}",
            homework.due_date.format("%a, %b %-d at %H:%M UTC")
        )),
    )
    .await;

    log_audit_event(
        storage.as_ref(),
        request,
        Some(&user.id),
        AuditEvent::new("homework_created").resource("homework", &homework.id),
    )
    .await;

    Ok(HttpResponse::Created().json(ApiResponse::success(homework, "Homework created")))
}
