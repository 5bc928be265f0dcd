use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::debug;

use super::{AuthService, captcha};
use crate::cache::ObjectCache;
use crate::middlewares::rate_limit::create_rate_limit_response;
use crate::models::auth::requests::{AuthMode, PasswordStrengthRequest, PrecheckRequest};
use crate::models::auth::responses::{PasswordStrength, PrecheckResponse, RateLimitInfo};
use crate::models::{ApiResponse, ErrorCode};
use crate::services::try_or_respond;
use crate::utils::password::check_password_strength;
use crate::utils::rate_limiter::{self, RateLimiter};
use crate::utils::validate::validate_email;

pub const WEAK_PASSWORD: &str = "Password is too weak. Please use a stronger password.";
pub const CAPTCHA_REQUIRED: &str = "Please complete the CAPTCHA verification";

/// 预检结论
#[derive(Debug, Clone, PartialEq)]
pub enum PrecheckOutcome {
    Proceed(PrecheckResponse),
    /// 需要先显示验证码，不算错误
    ShowCaptcha(PrecheckResponse),
    Rejected {
        code: ErrorCode,
        message: String,
        strength: Option<PasswordStrength>,
    },
    Throttled(RateLimitInfo),
}

fn rejected(code: ErrorCode, message: &str) -> PrecheckOutcome {
    PrecheckOutcome::Rejected {
        code,
        message: message.to_string(),
        strength: None,
    }
}

/// 依次检查邮箱、频率、密码强度（注册）与验证码
pub async fn run_precheck(
    limiter: &RateLimiter,
    cache: &dyn ObjectCache,
    body: &PrecheckRequest,
) -> PrecheckOutcome {
    let email = body.email.trim();
    if let Err(message) = validate_email(email) {
        let code = if email.is_empty() {
            ErrorCode::EmailRequired
        } else {
            ErrorCode::BadRequest
        };
        return rejected(code, message);
    }

    let rate_limit = limiter
        .check(&format!("auth:{}", email.to_lowercase()))
        .await;
    if !rate_limit.allowed {
        return PrecheckOutcome::Throttled(rate_limit);
    }

    let password_strength = match body.mode {
        AuthMode::SignUp => {
            let strength = check_password_strength(body.password.as_deref().unwrap_or_default());
            if !strength.is_strong {
                return PrecheckOutcome::Rejected {
                    code: ErrorCode::PasswordTooWeak,
                    message: WEAK_PASSWORD.to_string(),
                    strength: Some(strength),
                };
            }
            Some(strength)
        }
        _ => None,
    };

    let response = |proceed: bool, show_captcha: bool| PrecheckResponse {
        proceed,
        show_captcha,
        rate_limit: rate_limit.clone(),
        password_strength: password_strength.clone(),
    };

    // 魔法链接不走验证码
    if body.mode == AuthMode::MagicLink {
        return PrecheckOutcome::Proceed(response(true, false));
    }

    let verified = match body.captcha_token.as_deref() {
        Some(token) if !token.is_empty() => captcha::consume_token(cache, token).await,
        _ => false,
    };

    if verified {
        PrecheckOutcome::Proceed(response(true, false))
    } else if !body.captcha_required {
        debug!("Asking {} to solve a captcha first", email);
        PrecheckOutcome::ShowCaptcha(response(false, true))
    } else {
        rejected(ErrorCode::CaptchaRequired, CAPTCHA_REQUIRED)
    }
}

pub async fn handle_precheck(
    service: &AuthService,
    body: PrecheckRequest,
    req: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let cache = try_or_respond!(service.get_cache(req));
    let limiter = rate_limiter::shared("auth", &service.get_config().rate_limit.auth);

    Ok(match run_precheck(&limiter, cache.as_ref(), &body).await {
        PrecheckOutcome::Proceed(resp) => HttpResponse::Ok().json(ApiResponse::success(resp, "ok")),
        PrecheckOutcome::ShowCaptcha(resp) => {
            HttpResponse::Ok().json(ApiResponse::success(resp, "Please solve the captcha"))
        }
        PrecheckOutcome::Rejected {
            code,
            message,
            strength: Some(strength),
        } => HttpResponse::BadRequest().json(ApiResponse::error(code, strength, message)),
        PrecheckOutcome::Rejected { code, message, .. } => {
            HttpResponse::BadRequest().json(ApiResponse::error_empty(code, message))
        }
        PrecheckOutcome::Throttled(info) => create_rate_limit_response(&info),
    })
}

pub async fn handle_password_strength(body: PasswordStrengthRequest) -> ActixResult<HttpResponse> {
    let strength = check_password_strength(&body.password);
    Ok(HttpResponse::Ok().json(ApiResponse::success(strength, "ok")))
}
