pub mod calendar;
pub mod completion;
pub mod create;
pub mod delete;
pub mod list;
pub mod reminders;
pub mod search;
pub mod update;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use serde::Serialize;
use std::sync::Arc;
use tracing::warn;

use crate::models::homework::requests::{
    CalendarQuery, HomeworkForm, HomeworkListQuery, ToggleCompletionRequest,
};
use crate::realtime::{ChangeEvent, ChangeFeed, ChangeKind, Table};
use crate::storage::Storage;

pub struct HomeworkService {
    storage: Option<Arc<dyn Storage>>,
}

impl HomeworkService {
    pub fn new_lazy() -> Self {
        Self { storage: None }
    }

    pub(crate) fn get_storage(&self, request: &HttpRequest) -> Result<Arc<dyn Storage>, HttpResponse> {
        match &self.storage {
            Some(storage) => Ok(storage.clone()),
            None => super::storage_from(request),
        }
    }

    // 班级作业列表（含附件、完成状态与创建者），支持搜索、筛选与排序
    pub async fn list_homework(
        &self,
        request: &HttpRequest,
        query: HomeworkListQuery,
    ) -> ActixResult<HttpResponse> {
        list::list_homework(self, request, query).await
    }

    pub async fn create_homework(
        &self,
        request: &HttpRequest,
        form: HomeworkForm,
    ) -> ActixResult<HttpResponse> {
        create::create_homework(self, request, form).await
    }

    pub async fn update_homework(
        &self,
        request: &HttpRequest,
        homework_id: String,
        form: HomeworkForm,
    ) -> ActixResult<HttpResponse> {
        update::update_homework(self, request, homework_id, form).await
    }

    pub async fn delete_homework(
        &self,
        request: &HttpRequest,
        homework_id: String,
    ) -> ActixResult<HttpResponse> {
        delete::delete_homework(self, request, homework_id).await
    }

    pub async fn toggle_completion(
        &self,
        request: &HttpRequest,
        homework_id: String,
        body: ToggleCompletionRequest,
    ) -> ActixResult<HttpResponse> {
        completion::toggle_completion(self, request, homework_id, body).await
    }

    // 明天结束前到期且未完成
    pub async fn due_soon(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        reminders::handle_due_soon(self, request).await
    }

    pub async fn digest(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        reminders::handle_digest(self, request).await
    }

    pub async fn calendar(
        &self,
        request: &HttpRequest,
        query: CalendarQuery,
    ) -> ActixResult<HttpResponse> {
        calendar::handle_calendar(self, request, query).await
    }
}

/// 发布一条行变更，序列化失败只记录
pub(crate) fn publish_change<T: Serialize>(
    table: Table,
    kind: ChangeKind,
    class_id: &str,
    new: Option<&T>,
    old: Option<&T>,
) {
    match ChangeEvent::from_rows(table, kind, class_id, new, old) {
        Ok(event) => {
            ChangeFeed::global().publish(event);
        }
        Err(e) => warn!("Failed to publish {} change: {}", table, e),
    }
}
