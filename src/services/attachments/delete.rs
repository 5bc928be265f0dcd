use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::info;

use super::{AttachmentService, attachment_not_found, find_class_attachment};
use crate::models::ApiResponse;
use crate::models::homework::entities::Attachment;
use crate::realtime::{ChangeKind, Table};
use crate::services::homework::publish_change;
use crate::services::{class_from, session_from, storage_error, try_or_respond};

/// 先删对象，再删附件行
pub async fn handle_delete(
    service: &AttachmentService,
    req: &HttpRequest,
    attachment_id: String,
) -> ActixResult<HttpResponse> {
    let storage = try_or_respond!(service.get_storage(req));
    let objects = try_or_respond!(service.get_objects(req));
    let user = try_or_respond!(session_from(req));
    let class = try_or_respond!(class_from(req));

    let attachment =
        match find_class_attachment(storage.as_ref(), &class.class_id, &attachment_id).await {
            Ok(Some((attachment, _))) => attachment,
            Ok(None) => return Ok(attachment_not_found()),
            Err(e) => return Ok(storage_error(e, None)),
        };

    if let Err(e) = objects.delete(&attachment.storage_path).await {
        return Ok(storage_error(e, None));
    }

    match storage.delete_attachment(&attachment_id).await {
        Ok(true) => {}
        Ok(false) => return Ok(attachment_not_found()),
        Err(e) => return Ok(storage_error(e, None)),
    }

    info!("User {} removed attachment {}", user.id, attachment_id);
    publish_change::<Attachment>(
        Table::HomeworkAttachments,
        ChangeKind::Delete,
        &class.class_id,
        None,
        Some(&attachment),
    );

    Ok(HttpResponse::Ok().json(ApiResponse::<()>::success_empty("Attachment deleted")))
}
