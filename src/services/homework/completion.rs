use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::update::{find_class_homework, homework_not_found};
use super::{HomeworkService, publish_change};
use crate::errors::Result;
use crate::models::ApiResponse;
use crate::models::homework::entities::Completion;
use crate::models::homework::requests::ToggleCompletionRequest;
use crate::realtime::{ChangeKind, Table};
use crate::services::{class_from, session_from, storage_error, try_or_respond};
use crate::storage::Storage;

/// 原子写入完成状态并发布变更
pub async fn set_completion(
    storage: &dyn Storage,
    class_id: &str,
    homework_id: &str,
    user_id: &str,
    done: bool,
) -> Result<Completion> {
    let existed = storage.get_completion(homework_id, user_id).await?.is_some();

    let completion = storage.upsert_completion(homework_id, user_id, done).await?;

    let kind = if existed {
        ChangeKind::Update
    } else {
        ChangeKind::Insert
    };
    publish_change::<Completion>(Table::HomeworkCompletion, kind, class_id, Some(&completion), None);
    Ok(completion)
}

pub async fn toggle_completion(
    service: &HomeworkService,
    request: &HttpRequest,
    homework_id: String,
    body: ToggleCompletionRequest,
) -> ActixResult<HttpResponse> {
    let storage = try_or_respond!(service.get_storage(request));
    let user = try_or_respond!(session_from(request));
    let class = try_or_respond!(class_from(request));

    match find_class_homework(storage.as_ref(), &class.class_id, &homework_id).await {
        Ok(Some(_)) => {}
        Ok(None) => return Ok(homework_not_found()),
        Err(e) => return Ok(storage_error(e, None)),
    }

    match set_completion(
        storage.as_ref(),
        &class.class_id,
        &homework_id,
        &user.id,
        body.done,
    )
    .await
    {
        Ok(completion) => Ok(HttpResponse::Ok().json(ApiResponse::success(completion, "ok"))),
        Err(e) => Ok(storage_error(e, None)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::homework::requests::NewHomework;
    use crate::realtime::{ChangeFeed, SubscriptionSpec};
    use crate::storage::sea_orm_storage::SeaOrmStorage;

    #[tokio::test]
    async fn test_first_toggle_inserts_then_updates() {
        let storage = SeaOrmStorage::in_memory().await.unwrap();
        let class = storage.create_class("9ZZ9", None).await.unwrap();
        let hw = storage
            .create_homework(NewHomework {
                class_id: class.id.clone(),
                title: "Lab report".into(),
                description: None,
                subject: Some("Chemistry".into()),
                due_date: chrono::Utc::now(),
                created_by: None,
            })
            .await
            .unwrap();

        let mut sub = ChangeFeed::global()
            .subscribe(SubscriptionSpec::class(Table::HomeworkCompletion, class.id.clone()));

        // 其他作业上的完成记录不影响本条的插入判断
        let other = storage
            .create_homework(NewHomework {
                class_id: class.id.clone(),
                title: "Worksheet".into(),
                description: None,
                subject: None,
                due_date: chrono::Utc::now(),
                created_by: None,
            })
            .await
            .unwrap();
        storage.upsert_completion(&other.id, "u1", true).await.unwrap();

        let first = set_completion(&storage, &class.id, &hw.id, "u1", true).await.unwrap();
        let second = set_completion(&storage, &class.id, &hw.id, "u1", false).await.unwrap();
        assert_eq!(first.id, second.id);
        assert!(!second.done);

        assert_eq!(sub.recv().await.unwrap().kind, ChangeKind::Insert);
        assert_eq!(sub.recv().await.unwrap().kind, ChangeKind::Update);
        ChangeFeed::global().unsubscribe(sub).unwrap();
    }
}
