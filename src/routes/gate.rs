use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};

use crate::models::gate::GateQuery;
use crate::services::gate;

pub async fn resolve(req: HttpRequest, query: web::Query<GateQuery>) -> ActixResult<HttpResponse> {
    gate::handle_resolve(&req, &query.path).await
}

// 配置路由
pub fn configure_gate_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/api/v1/gate", web::get().to(resolve));
}
