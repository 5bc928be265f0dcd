use actix_web::{HttpResponse, Result as ActixResult};

use crate::models::ApiResponse;
use crate::models::auth::requests::ExplainErrorRequest;
use crate::models::auth::responses::ExplainedError;

/// 把认证服务的报错换成给用户看的提示
pub fn explain_provider_error(raw: &str) -> ExplainedError {
    let (message, show_captcha) = if raw.contains("Invalid login credentials") {
        (
            "Invalid email or password. If you just signed up, please confirm your email first.",
            true,
        )
    } else if raw.contains("Email not confirmed") {
        ("Please confirm your email address before logging in.", false)
    } else if raw.contains("User already registered") {
        ("This email is already registered. Please sign in instead.", false)
    } else if raw.trim().is_empty() {
        ("An error occurred", false)
    } else {
        (raw, false)
    };

    ExplainedError {
        message: message.to_string(),
        show_captcha,
    }
}

pub async fn handle_explain(body: ExplainErrorRequest) -> ActixResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(ApiResponse::success(
        explain_provider_error(&body.message),
        "ok",
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_errors_are_remapped() {
        let e = explain_provider_error("AuthApiError: Invalid login credentials");
        assert!(e.show_captcha);
        assert!(e.message.starts_with("Invalid email or password."));

        assert_eq!(
            explain_provider_error("Email not confirmed").message,
            "Please confirm your email address before logging in."
        );
        assert_eq!(
            explain_provider_error("User already registered").message,
            "This email is already registered. Please sign in instead."
        );
    }

    #[test]
    fn test_other_errors_pass_through() {
        assert_eq!(explain_provider_error("Network down").message, "Network down");
        assert_eq!(explain_provider_error("").message, "An error occurred");
    }
}
