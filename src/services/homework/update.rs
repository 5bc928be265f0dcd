use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::{HomeworkService, publish_change};
use crate::errors::Result;
use crate::models::homework::entities::Homework;
use crate::models::homework::requests::HomeworkForm;
use crate::models::{ApiResponse, ErrorCode};
use crate::realtime::{ChangeKind, Table};
use crate::services::{class_from, storage_error, try_or_respond};
use crate::storage::Storage;
use crate::utils::validate::validate_homework_form;

/// 只返回属于该班级的作业
pub(crate) async fn find_class_homework(
    storage: &dyn Storage,
    class_id: &str,
    homework_id: &str,
) -> Result<Option<Homework>> {
    Ok(storage
        .get_homework(homework_id)
        .await?
        .filter(|hw| hw.class_id == class_id))
}

pub(crate) fn homework_not_found() -> HttpResponse {
    HttpResponse::NotFound().json(ApiResponse::error_empty(
        ErrorCode::HomeworkNotFound,
        "Homework not found",
    ))
}

pub async fn update_homework(
    service: &HomeworkService,
    request: &HttpRequest,
    homework_id: String,
    form: HomeworkForm,
) -> ActixResult<HttpResponse> {
    let storage = try_or_respond!(service.get_storage(request));
    let class = try_or_respond!(class_from(request));

    let form = match validate_homework_form(form) {
        Ok(form) => form,
        Err(message) => {
            return Ok(HttpResponse::BadRequest()
                .json(ApiResponse::error_empty(ErrorCode::HomeworkInvalid, message)));
        }
    };

    let old = match find_class_homework(storage.as_ref(), &class.class_id, &homework_id).await {
        Ok(Some(hw)) => hw,
        Ok(None) => return Ok(homework_not_found()),
        Err(e) => return Ok(storage_error(e, None)),
    };

    match storage.update_homework(&homework_id, form).await {
        Ok(Some(homework)) => {
            publish_change(
                Table::Homework,
                ChangeKind::Update,
                &class.class_id,
                Some(&homework),
                Some(&old),
            );
            Ok(HttpResponse::Ok().json(ApiResponse::success(homework, "Homework updated")))
        }
        Ok(None) => Ok(homework_not_found()),
        Err(e) => Ok(storage_error(e, None)),
    }
}
