use actix_web::http::header::{ContentDisposition, DispositionParam, DispositionType};
use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::ProfileService;
use crate::errors::Result;
use crate::models::ApiResponse;
use crate::models::profiles::responses::AccountExport;
use crate::services::{session_from, storage_error, try_or_respond};
use crate::storage::Storage;

/// 汇总调用者的资料、创建的作业与完成记录
pub async fn collect_export(storage: &dyn Storage, user_id: &str) -> Result<AccountExport> {
    Ok(AccountExport {
        profile: storage.get_profile(user_id).await?,
        homework: storage.list_homework_by_creator(user_id).await?,
        completions: storage.list_completions_for_user(user_id).await?,
        exported_at: chrono::Utc::now(),
    })
}

pub async fn handle_export(
    service: &ProfileService,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = try_or_respond!(service.get_storage(request));
    let user = try_or_respond!(session_from(request));

    let export = match collect_export(storage.as_ref(), &user.id).await {
        Ok(export) => export,
        Err(e) => return Ok(storage_error(e, None)),
    };

    let filename = format!(
        "homework-planner-export-{}.json",
        export.exported_at.format("%Y-%m-%d")
    );
    Ok(HttpResponse::Ok()
        .insert_header(ContentDisposition {
            disposition: DispositionType::Attachment,
            parameters: vec![DispositionParam::Filename(filename)],
        })
        .json(ApiResponse::success(export, "Data exported successfully!")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::homework::requests::NewHomework;
    use crate::storage::sea_orm_storage::SeaOrmStorage;

    #[tokio::test]
    async fn test_export_contains_own_rows_only() {
        let storage = SeaOrmStorage::in_memory().await.unwrap();
        let class = storage.create_class("1HAT2", None).await.unwrap();
        let new = |by: &str| NewHomework {
            class_id: class.id.clone(),
            title: format!("by {by}"),
            description: None,
            subject: None,
            due_date: chrono::Utc::now(),
            created_by: Some(by.into()),
        };
        let mine = storage.create_homework(new("me")).await.unwrap();
        let theirs = storage.create_homework(new("them")).await.unwrap();
        storage.upsert_completion(&theirs.id, "me", true).await.unwrap();

        let export = collect_export(&storage, "me").await.unwrap();
        assert!(export.profile.is_none());
        assert_eq!(export.homework.len(), 1);
        assert_eq!(export.homework[0].id, mine.id);
        assert_eq!(export.completions.len(), 1);
        assert_eq!(export.completions[0].homework_id, theirs.id);
    }
}
