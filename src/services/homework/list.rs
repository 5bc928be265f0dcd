use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::HomeworkService;
use super::search::{distinct_subjects, filter_and_sort};
use crate::errors::Result;
use crate::models::ApiResponse;
use crate::models::homework::entities::HomeworkWithRelations;
use crate::models::homework::requests::HomeworkListQuery;
use crate::models::homework::responses::HomeworkListResponse;
use crate::services::{class_from, session_from, storage_error, try_or_respond};
use crate::storage::Storage;
use crate::sync::normalize::normalize_rows;

/// 读取并规范化班级的全部作业
pub async fn load_class_homework(
    storage: &dyn Storage,
    class_id: &str,
) -> Result<Vec<HomeworkWithRelations>> {
    let rows = storage.list_homework_rows(class_id).await?;
    normalize_rows(rows)
}

pub async fn list_homework(
    service: &HomeworkService,
    request: &HttpRequest,
    query: HomeworkListQuery,
) -> ActixResult<HttpResponse> {
    let storage = try_or_respond!(service.get_storage(request));
    let user = try_or_respond!(session_from(request));
    let class = try_or_respond!(class_from(request));

    let items = match load_class_homework(storage.as_ref(), &class.class_id).await {
        Ok(items) => items,
        Err(e) => return Ok(storage_error(e, None)),
    };

    // 科目列表取自筛选前的全部作业
    let subjects = distinct_subjects(&items);
    let homework = filter_and_sort(items, &user.id, &query);
    Ok(HttpResponse::Ok().json(ApiResponse::success(
        HomeworkListResponse { homework, subjects },
        "ok",
    )))
}
