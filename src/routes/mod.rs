pub mod announcements;

pub mod attachments;

pub mod auth;

pub mod classes;

pub mod gate;

pub mod homework;

pub mod notifications;

pub mod profile;

pub mod reports;

pub mod ws;

pub use announcements::configure_announcement_routes;
pub use attachments::configure_attachment_routes;
pub use auth::configure_auth_routes;
pub use classes::configure_classes_routes;
pub use gate::configure_gate_routes;
pub use homework::configure_homework_routes;
pub use notifications::configure_notification_routes;
pub use profile::configure_profile_routes;
pub use reports::configure_report_routes;
pub use ws::configure_ws_routes;

use actix_web::web;

/// 注册全部路由
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.configure(configure_auth_routes)
        .configure(configure_classes_routes)
        .configure(configure_gate_routes)
        .configure(configure_homework_routes)
        .configure(configure_attachment_routes)
        .configure(configure_announcement_routes)
        .configure(configure_notification_routes)
        .configure(configure_profile_routes)
        .configure(configure_report_routes)
        .configure(configure_ws_routes);
}
