use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};

use crate::middlewares::{self, RequireClass, RequireJWT};
use crate::services::storage_from;
use crate::services::websocket::WebSocketService;

/// 升级为 WebSocket；令牌与班级 ID 通过查询参数传入
pub async fn connect(req: HttpRequest, body: web::Payload) -> ActixResult<HttpResponse> {
    let (Some(user_id), Some(class_id)) = (
        RequireJWT::extract_user_id(&req),
        RequireClass::extract_class_id(&req),
    ) else {
        return Ok(HttpResponse::Unauthorized().finish());
    };
    let storage = match storage_from(&req) {
        Ok(storage) => storage,
        Err(resp) => return Ok(resp),
    };

    let (response, session, stream) = actix_ws::handle(&req, body)?;
    actix_web::rt::spawn(WebSocketService::handle_connection(
        user_id, class_id, storage, session, stream,
    ));
    Ok(response)
}

// 配置路由
pub fn configure_ws_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/api/v1/ws")
            .wrap(middlewares::RequireClass)
            .wrap(middlewares::RequireJWT)
            .route(web::get().to(connect)),
    );
}
