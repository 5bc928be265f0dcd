//! 顶层页面路由判定

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use crate::cache::CacheResult;
use crate::middlewares::require_class::class_id_from;
use crate::middlewares::require_jwt::revoked_key;
use crate::models::ApiResponse;
use crate::models::gate::{GateDecision, Screen};
use crate::utils::jwt::JwtUtils;

fn render(screen: Screen) -> GateDecision {
    GateDecision::Render { screen }
}

fn redirect(to: &str) -> GateDecision {
    GateDecision::Redirect { to: to.to_string() }
}

pub fn resolve(path: &str, has_class: bool, signed_in: bool) -> GateDecision {
    let protected = match path {
        "/" => {
            return match (has_class, signed_in) {
                (false, _) => render(Screen::ClassCodeEntry),
                (true, false) => redirect("/auth"),
                (true, true) => redirect("/app"),
            };
        }
        "/auth" => {
            return if !has_class {
                redirect("/")
            } else if signed_in {
                redirect("/app")
            } else {
                render(Screen::AuthGate)
            };
        }
        "/app" => Screen::MainApp,
        "/settings" => Screen::Settings,
        "/terms" => Screen::Terms,
        "/privacy" => Screen::Privacy,
        "/announcements" => Screen::Announcements,
        _ => return redirect("/"),
    };

    if !has_class {
        redirect("/")
    } else if !signed_in {
        redirect("/auth")
    } else {
        render(protected)
    }
}

/// 令牌有效且未被注销
async fn is_signed_in(req: &HttpRequest) -> bool {
    let Some(token) = JwtUtils::extract_bearer_token(req) else {
        return false;
    };
    if JwtUtils::verify_access_token(&token).is_err() {
        return false;
    }
    match super::cache_from(req) {
        Ok(cache) => !matches!(cache.get_raw(&revoked_key(&token)).await, CacheResult::Found(_)),
        Err(_) => true,
    }
}

pub async fn handle_resolve(req: &HttpRequest, path: &str) -> ActixResult<HttpResponse> {
    let has_class = class_id_from(req).is_some();
    let signed_in = is_signed_in(req).await;
    let decision = resolve(path, has_class, signed_in);
    Ok(HttpResponse::Ok().json(ApiResponse::success(decision, "ok")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root() {
        assert_eq!(resolve("/", false, false), render(Screen::ClassCodeEntry));
        assert_eq!(resolve("/", false, true), render(Screen::ClassCodeEntry));
        assert_eq!(resolve("/", true, false), redirect("/auth"));
        assert_eq!(resolve("/", true, true), redirect("/app"));
    }

    #[test]
    fn test_auth_page() {
        assert_eq!(resolve("/auth", false, false), redirect("/"));
        assert_eq!(resolve("/auth", true, true), redirect("/app"));
        assert_eq!(resolve("/auth", true, false), render(Screen::AuthGate));
    }

    #[test]
    fn test_protected_pages() {
        assert_eq!(resolve("/settings", false, true), redirect("/"));
        assert_eq!(resolve("/app", true, false), redirect("/auth"));
        assert_eq!(resolve("/app", true, true), render(Screen::MainApp));
        assert_eq!(
            resolve("/announcements", true, true),
            render(Screen::Announcements)
        );
        assert_eq!(resolve("/privacy", true, true), render(Screen::Privacy));
    }

    #[test]
    fn test_unknown_path_goes_home() {
        assert_eq!(resolve("/nowhere", true, true), redirect("/"));
        assert_eq!(resolve("", false, false), redirect("/"));
    }

    #[actix_web::test]
    async fn test_handler_reads_class_header() {
        let req = actix_web::test::TestRequest::default()
            .insert_header(("X-Class-Id", "c1"))
            .to_http_request();
        let resp = handle_resolve(&req, "/").await.unwrap();
        let body = actix_web::body::to_bytes(resp.into_body()).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["data"]["action"], "redirect");
        assert_eq!(json["data"]["to"], "/auth");
    }
}
