//! 算术验证码的签发与校验
//!
//! 答案存在对象缓存中 5 分钟，校验通过后换成一次性令牌供预检使用。

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::AuthService;
use crate::cache::{CacheResult, ObjectCache};
use crate::models::ApiResponse;
use crate::models::auth::requests::CaptchaAnswerRequest;
use crate::models::auth::responses::{CaptchaChallenge, CaptchaVerification};
use crate::services::try_or_respond;
use crate::utils::captcha::{MathChallenge, parse_answer};

pub const CAPTCHA_TTL_SECS: u64 = 300;

fn challenge_key(id: &str) -> String {
    format!("captcha:{id}")
}

fn token_key(token: &str) -> String {
    format!("captcha_ok:{token}")
}

pub async fn issue_challenge(cache: &dyn ObjectCache) -> CaptchaChallenge {
    store_challenge(cache, MathChallenge::generate()).await
}

async fn store_challenge(cache: &dyn ObjectCache, challenge: MathChallenge) -> CaptchaChallenge {
    let id = uuid::Uuid::new_v4().to_string();
    cache
        .insert_raw(
            challenge_key(&id),
            challenge.answer.to_string(),
            CAPTCHA_TTL_SECS,
        )
        .await;
    CaptchaChallenge {
        id,
        question: challenge.question,
    }
}

fn failed(error: &str, next_challenge: Option<CaptchaChallenge>) -> CaptchaVerification {
    CaptchaVerification {
        verified: false,
        token: None,
        error: Some(error.to_string()),
        next_challenge,
    }
}

/// 校验答案；无法解析时保留原题，答错则作废并换一道
pub async fn verify_answer(cache: &dyn ObjectCache, id: &str, answer: &str) -> CaptchaVerification {
    let Some(given) = parse_answer(answer) else {
        return failed("Please enter a number", None);
    };

    let key = challenge_key(id);
    let expected = match cache.get_raw(&key).await {
        CacheResult::Found(value) => value.parse::<i64>().ok(),
        _ => None,
    };
    cache.remove(&key).await;

    match expected {
        Some(expected) if expected == given => {
            let token = uuid::Uuid::new_v4().to_string();
            cache
                .insert_raw(token_key(&token), "1".into(), CAPTCHA_TTL_SECS)
                .await;
            CaptchaVerification {
                verified: true,
                token: Some(token),
                error: None,
                next_challenge: None,
            }
        }
        Some(_) => failed(
            "Incorrect answer. Try again.",
            Some(issue_challenge(cache).await),
        ),
        None => failed(
            "Challenge expired. Try again.",
            Some(issue_challenge(cache).await),
        ),
    }
}

/// 使用一次已通过的验证码令牌
pub async fn consume_token(cache: &dyn ObjectCache, token: &str) -> bool {
    let key = token_key(token);
    match cache.get_raw(&key).await {
        CacheResult::Found(_) => {
            cache.remove(&key).await;
            true
        }
        _ => false,
    }
}

pub async fn handle_issue(service: &AuthService, req: &HttpRequest) -> ActixResult<HttpResponse> {
    let cache = try_or_respond!(service.get_cache(req));
    let challenge = issue_challenge(cache.as_ref()).await;
    Ok(HttpResponse::Ok().json(ApiResponse::success(challenge, "ok")))
}

pub async fn handle_verify(
    service: &AuthService,
    body: CaptchaAnswerRequest,
    req: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let cache = try_or_respond!(service.get_cache(req));
    let result = verify_answer(cache.as_ref(), &body.id, &body.answer).await;
    let message = if result.verified { "Verified" } else { "Verification failed" };
    Ok(HttpResponse::Ok().json(ApiResponse::success(result, message)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::object_cache::moka::MokaCacheWrapper;
    use crate::utils::captcha::Operation;

    #[tokio::test]
    async fn test_correct_answer_yields_single_use_token() {
        let cache = MokaCacheWrapper::with_capacity(100, 60);
        let challenge =
            store_challenge(&cache, MathChallenge::from_parts(3, 9, Operation::Subtract)).await;
        assert_eq!(challenge.question, "9 - 3");

        let result = verify_answer(&cache, &challenge.id, " 6").await;
        assert!(result.verified);
        let token = result.token.unwrap();

        assert!(consume_token(&cache, &token).await);
        assert!(!consume_token(&cache, &token).await);
    }

    #[tokio::test]
    async fn test_wrong_answer_consumes_challenge() {
        let cache = MokaCacheWrapper::with_capacity(100, 60);
        let challenge =
            store_challenge(&cache, MathChallenge::from_parts(2, 3, Operation::Multiply)).await;

        let result = verify_answer(&cache, &challenge.id, "5").await;
        assert!(!result.verified);
        assert_eq!(result.error.as_deref(), Some("Incorrect answer. Try again."));
        assert!(result.next_challenge.is_some());

        // 同一题不能再答
        let retry = verify_answer(&cache, &challenge.id, "6").await;
        assert!(!retry.verified);
    }

    #[tokio::test]
    async fn test_non_numeric_answer_keeps_challenge() {
        let cache = MokaCacheWrapper::with_capacity(100, 60);
        let challenge =
            store_challenge(&cache, MathChallenge::from_parts(4, 4, Operation::Add)).await;

        let result = verify_answer(&cache, &challenge.id, "eight").await;
        assert_eq!(result.error.as_deref(), Some("Please enter a number"));
        assert!(result.next_challenge.is_none());

        assert!(verify_answer(&cache, &challenge.id, "8").await.verified);
    }
}
