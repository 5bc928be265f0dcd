use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::models::notifications::entities::NewNotification;
use crate::models::notifications::responses::MarkAllReadResponse;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::websocket::push_notifications;
use crate::services::{session_from, storage_error, try_or_respond};
use crate::storage::Storage;

/// 通知列表的条数
pub const RECENT_LIMIT: u64 = 10;

/// 给班级里除 `exclude_user` 外的成员发通知并推送到在线连接；失败只记录
pub async fn notify_class_members(
    storage: &dyn Storage,
    class_id: &str,
    exclude_user: &str,
    notification_type: &str,
    title: String,
    message: Option<String>,
) {
    let members = match storage.list_class_member_ids(class_id).await {
        Ok(members) => members,
        Err(e) => {
            warn!("Failed to list members of class {}: {}", class_id, e);
            return;
        }
    };

    let batch: Vec<NewNotification> = members
        .into_iter()
        .filter(|id| id != exclude_user)
        .map(|user_id| NewNotification {
            user_id: Some(user_id),
            class_id: Some(class_id.to_string()),
            notification_type: notification_type.to_string(),
            title: title.clone(),
            message: message.clone(),
        })
        .collect();
    if batch.is_empty() {
        return;
    }

    match storage.create_notifications(batch).await {
        Ok(created) => {
            debug!("Sent {} '{}' notifications", created.len(), notification_type);
            push_notifications(&created);
        }
        Err(e) => warn!("Failed to create notifications: {}", e),
    }
}

pub struct NotificationService {
    storage: Option<Arc<dyn Storage>>,
}

impl NotificationService {
    pub fn new_lazy() -> Self {
        Self { storage: None }
    }

    pub(crate) fn get_storage(&self, request: &HttpRequest) -> Result<Arc<dyn Storage>, HttpResponse> {
        match &self.storage {
            Some(storage) => Ok(storage.clone()),
            None => super::storage_from(request),
        }
    }

    // 最近的通知
    pub async fn list_recent(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        let storage = try_or_respond!(self.get_storage(request));
        let user = try_or_respond!(session_from(request));

        match storage.list_recent_notifications(&user.id, RECENT_LIMIT).await {
            Ok(list) => Ok(HttpResponse::Ok().json(ApiResponse::success(list, "ok"))),
            Err(e) => Ok(storage_error(e, None)),
        }
    }

    // 只能标记自己的通知
    pub async fn mark_read(
        &self,
        request: &HttpRequest,
        notification_id: String,
    ) -> ActixResult<HttpResponse> {
        let storage = try_or_respond!(self.get_storage(request));
        let user = try_or_respond!(session_from(request));

        match storage.mark_notification_read(&notification_id, &user.id).await {
            Ok(true) => Ok(HttpResponse::Ok().json(ApiResponse::<()>::success_empty("Marked as read"))),
            Ok(false) => Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
                ErrorCode::NotificationNotFound,
                "Notification not found",
            ))),
            Err(e) => Ok(storage_error(e, None)),
        }
    }

    pub async fn mark_all_read(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        let storage = try_or_respond!(self.get_storage(request));
        let user = try_or_respond!(session_from(request));

        match storage.mark_all_notifications_read(&user.id).await {
            Ok(marked_count) => Ok(HttpResponse::Ok().json(ApiResponse::success(
                MarkAllReadResponse { marked_count },
                "All notifications marked as read",
            ))),
            Err(e) => Ok(storage_error(e, None)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::profiles::requests::CreateProfile;
    use crate::storage::sea_orm_storage::SeaOrmStorage;

    #[tokio::test]
    async fn test_notify_skips_author() {
        let storage = SeaOrmStorage::in_memory().await.unwrap();
        let class = storage.create_class("2BC1", None).await.unwrap();
        for id in ["author", "peer-1", "peer-2"] {
            storage
                .create_profile_if_absent(CreateProfile {
                    id: id.into(),
                    class_id: class.id.clone(),
                    display_name: None,
                    avatar_url: None,
                })
                .await
                .unwrap();
        }

        notify_class_members(
            &storage,
            &class.id,
            "author",
            "homework_created",
            "New homework: Essay".into(),
            None,
        )
        .await;

        assert!(storage.list_recent_notifications("author", 10).await.unwrap().is_empty());
        let peer = storage.list_recent_notifications("peer-1", 10).await.unwrap();
        assert_eq!(peer.len(), 1);
        assert_eq!(peer[0].title, "New homework: Essay");
        assert_eq!(peer[0].class_id.as_deref(), Some(class.id.as_str()));
    }
}
