use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares;
use crate::models::homework::requests::{
    CalendarQuery, HomeworkForm, HomeworkListQuery, ToggleCompletionRequest,
};
use crate::routes::attachments::upload_attachment;
use crate::services::HomeworkService;

// 懒加载的全局 HomeworkService 实例
static HOMEWORK_SERVICE: Lazy<HomeworkService> = Lazy::new(HomeworkService::new_lazy);

pub async fn list_homework(
    req: HttpRequest,
    query: web::Query<HomeworkListQuery>,
) -> ActixResult<HttpResponse> {
    HOMEWORK_SERVICE.list_homework(&req, query.into_inner()).await
}

pub async fn create_homework(
    req: HttpRequest,
    form: web::Json<HomeworkForm>,
) -> ActixResult<HttpResponse> {
    HOMEWORK_SERVICE.create_homework(&req, form.into_inner()).await
}

pub async fn update_homework(
    req: HttpRequest,
    path: web::Path<String>,
    form: web::Json<HomeworkForm>,
) -> ActixResult<HttpResponse> {
    HOMEWORK_SERVICE
        .update_homework(&req, path.into_inner(), form.into_inner())
        .await
}

pub async fn delete_homework(req: HttpRequest, path: web::Path<String>) -> ActixResult<HttpResponse> {
    HOMEWORK_SERVICE.delete_homework(&req, path.into_inner()).await
}

pub async fn toggle_completion(
    req: HttpRequest,
    path: web::Path<String>,
    body: web::Json<ToggleCompletionRequest>,
) -> ActixResult<HttpResponse> {
    HOMEWORK_SERVICE
        .toggle_completion(&req, path.into_inner(), body.into_inner())
        .await
}

pub async fn due_soon(req: HttpRequest) -> ActixResult<HttpResponse> {
    HOMEWORK_SERVICE.due_soon(&req).await
}

pub async fn digest(req: HttpRequest) -> ActixResult<HttpResponse> {
    HOMEWORK_SERVICE.digest(&req).await
}

pub async fn calendar(req: HttpRequest, query: web::Query<CalendarQuery>) -> ActixResult<HttpResponse> {
    HOMEWORK_SERVICE.calendar(&req, query.into_inner()).await
}

// 配置路由
pub fn configure_homework_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/homework")
            .wrap(middlewares::RequireClass)
            .wrap(middlewares::RequireJWT)
            // 固定路径需在 /{id} 之前注册
            .route("", web::get().to(list_homework))
            .route("", web::post().to(create_homework))
            .route("/due-soon", web::get().to(due_soon))
            .route("/digest", web::get().to(digest))
            .route("/calendar", web::get().to(calendar))
            .route("/{id}", web::put().to(update_homework))
            .route("/{id}", web::delete().to(delete_homework))
            .route("/{id}/completion", web::put().to(toggle_completion))
            .service(
                web::resource("/{id}/attachments")
                    .wrap(middlewares::RateLimit::upload())
                    .route(web::post().to(upload_attachment)),
            ),
    );
}
