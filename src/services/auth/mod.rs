pub mod captcha;
pub mod explain;
pub mod precheck;
pub mod session;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use crate::cache::ObjectCache;
use crate::config::AppConfig;
use crate::models::auth::requests::{
    CaptchaAnswerRequest, ExplainErrorRequest, PasswordStrengthRequest, PrecheckRequest,
};
use crate::storage::Storage;

pub struct AuthService {
    storage: Option<Arc<dyn Storage>>,
}

impl AuthService {
    pub fn new_lazy() -> Self {
        Self { storage: None }
    }

    pub(crate) fn get_storage(&self, request: &HttpRequest) -> Result<Arc<dyn Storage>, HttpResponse> {
        match &self.storage {
            Some(storage) => Ok(storage.clone()),
            None => super::storage_from(request),
        }
    }

    pub(crate) fn get_cache(&self, request: &HttpRequest) -> Result<Arc<dyn ObjectCache>, HttpResponse> {
        super::cache_from(request)
    }

    pub(crate) fn get_config(&self) -> &AppConfig {
        AppConfig::get()
    }

    // 提交到认证服务前的检查
    pub async fn precheck(
        &self,
        body: PrecheckRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        precheck::handle_precheck(self, body, request).await
    }

    pub async fn issue_captcha(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        captcha::handle_issue(self, request).await
    }

    pub async fn verify_captcha(
        &self,
        body: CaptchaAnswerRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        captcha::handle_verify(self, body, request).await
    }

    pub async fn explain_error(&self, body: ExplainErrorRequest) -> ActixResult<HttpResponse> {
        explain::handle_explain(body).await
    }

    pub async fn password_strength(
        &self,
        body: PasswordStrengthRequest,
    ) -> ActixResult<HttpResponse> {
        precheck::handle_password_strength(body).await
    }

    // 当前会话用户
    pub async fn session(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        session::handle_session(request).await
    }

    // 首次登录时创建资料
    pub async fn ensure_profile(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        session::handle_ensure_profile(self, request).await
    }

    pub async fn sign_out(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        session::handle_sign_out(self, request).await
    }
}
