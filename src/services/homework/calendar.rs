use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use chrono::Utc;

use super::HomeworkService;
use super::list::load_class_homework;
use crate::models::homework::requests::CalendarQuery;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::{class_from, storage_error, try_or_respond};
use crate::utils::calendar::month_grid;

pub async fn handle_calendar(
    service: &HomeworkService,
    request: &HttpRequest,
    query: CalendarQuery,
) -> ActixResult<HttpResponse> {
    let storage = try_or_respond!(service.get_storage(request));
    let class = try_or_respond!(class_from(request));

    let items = match load_class_homework(storage.as_ref(), &class.class_id).await {
        Ok(items) => items,
        Err(e) => return Ok(storage_error(e, None)),
    };

    let due = items
        .iter()
        .map(|hw| (hw.id(), hw.homework.due_date));
    match month_grid(query.year, query.month, Utc::now().date_naive(), due) {
        Ok(grid) => Ok(HttpResponse::Ok().json(ApiResponse::success(grid, "ok"))),
        Err(e) => Ok(HttpResponse::BadRequest()
            .json(ApiResponse::error_empty(ErrorCode::BadRequest, e.message()))),
    }
}
