use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::{info, warn};

use super::update::{find_class_homework, homework_not_found};
use super::{HomeworkService, publish_change};
use crate::models::ApiResponse;
use crate::models::homework::entities::Homework;
use crate::realtime::{ChangeKind, Table};
use crate::services::{class_from, object_store_from, session_from, storage_error, try_or_respond};

pub async fn delete_homework(
    service: &HomeworkService,
    request: &HttpRequest,
    homework_id: String,
) -> ActixResult<HttpResponse> {
    let storage = try_or_respond!(service.get_storage(request));
    let user = try_or_respond!(session_from(request));
    let class = try_or_respond!(class_from(request));

    let homework = match find_class_homework(storage.as_ref(), &class.class_id, &homework_id).await
    {
        Ok(Some(hw)) => hw,
        Ok(None) => return Ok(homework_not_found()),
        Err(e) => return Ok(storage_error(e, None)),
    };

    // 附件行随作业级联删除，这里先清理对象
    let attachments = storage.list_attachments(&homework_id).await.unwrap_or_default();

    match storage.delete_homework(&homework_id).await {
        Ok(true) => {}
        Ok(false) => return Ok(homework_not_found()),
        Err(e) => return Ok(storage_error(e, None)),
    }

    if let Ok(objects) = object_store_from(request) {
        for attachment in &attachments {
            if let Err(e) = objects.delete(&attachment.storage_path).await {
                warn!("Failed to delete object {}: {}", attachment.storage_path, e);
            }
        }
    }

    info!("User {} deleted homework {}", user.id, homework_id);
    publish_change::<Homework>(
        Table::Homework,
        ChangeKind::Delete,
        &class.class_id,
        None,
        Some(&homework),
    );

    Ok(HttpResponse::Ok().json(ApiResponse::<()>::success_empty("Homework deleted")))
}
