pub mod validate;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use crate::models::classes::requests::ClassCodeRequest;
use crate::storage::Storage;

pub struct ClassService {
    storage: Option<Arc<dyn Storage>>,
}

impl ClassService {
    pub fn new_lazy() -> Self {
        Self { storage: None }
    }

    pub(crate) fn get_storage(&self, request: &HttpRequest) -> Result<Arc<dyn Storage>, HttpResponse> {
        match &self.storage {
            Some(storage) => Ok(storage.clone()),
            None => super::storage_from(request),
        }
    }

    // 校验加入码并写入班级 Cookie
    pub async fn lookup(
        &self,
        request: &HttpRequest,
        body: ClassCodeRequest,
    ) -> ActixResult<HttpResponse> {
        validate::handle_lookup(self, request, body).await
    }
}
