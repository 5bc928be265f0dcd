use actix_multipart::Multipart;
use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use futures_util::{StreamExt, TryStreamExt};
use tracing::{error, info, warn};

use super::AttachmentService;
use crate::config::AppConfig;
use crate::errors::PlannerError;
use crate::models::homework::entities::{Attachment, Homework};
use crate::models::homework::requests::NewAttachment;
use crate::models::{ApiResponse, ErrorCode};
use crate::object_store::{ObjectStore, attachment_path};
use crate::realtime::{ChangeKind, Table};
use crate::services::homework::publish_change;
use crate::services::homework::update::{find_class_homework, homework_not_found};
use crate::services::{class_from, session_from, storage_error, try_or_respond};
use crate::storage::Storage;
use crate::utils::file_magic::extension_for;
use crate::utils::validate_magic_bytes;

/// 上传失败的原因
#[derive(Debug)]
pub enum UploadError {
    TypeNotAllowed,
    TooLarge,
    SignatureInvalid,
    Failed(PlannerError),
}

impl UploadError {
    fn into_response(self) -> HttpResponse {
        let (code, message) = match self {
            UploadError::TypeNotAllowed => (
                ErrorCode::FileTypeNotAllowed,
                "Only JPEG, PNG, WebP images and PDF files are allowed".to_string(),
            ),
            UploadError::TooLarge => (
                ErrorCode::FileSizeExceeded,
                "File size exceeds the 10 MB limit".to_string(),
            ),
            UploadError::SignatureInvalid => (
                ErrorCode::FileSignatureInvalid,
                "File content does not match its type".to_string(),
            ),
            UploadError::Failed(e) => {
                error!("Attachment upload failed: {}", e);
                return HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                    ErrorCode::FileUploadFailed,
                    format!("Failed to upload file: {}", e.message()),
                ));
            }
        };
        HttpResponse::BadRequest().json(ApiResponse::error_empty(code, message))
    }
}

/// 上传限制
#[derive(Debug, Clone)]
pub struct UploadLimits {
    pub max_size: usize,
    pub allowed_types: Vec<String>,
}

impl UploadLimits {
    pub fn from_config() -> Self {
        let upload = &AppConfig::get().upload;
        Self {
            max_size: upload.max_size,
            allowed_types: upload.allowed_types.clone(),
        }
    }

    fn allows(&self, mime_type: &str) -> bool {
        self.allowed_types
            .iter()
            .any(|t| t.eq_ignore_ascii_case(mime_type))
    }
}

/// 一个待存储的文件
pub struct UploadedFile {
    pub filename: String,
    pub mime_type: String,
    pub data: Vec<u8>,
}

/// 校验后写入对象存储，再插入附件行；插入失败时删除对象
pub async fn store_attachment(
    storage: &dyn Storage,
    objects: &dyn ObjectStore,
    homework: &Homework,
    file: UploadedFile,
    uploaded_by: Option<String>,
    limits: &UploadLimits,
) -> Result<Attachment, UploadError> {
    if !limits.allows(&file.mime_type) {
        return Err(UploadError::TypeNotAllowed);
    }
    let Some(extension) = extension_for(&file.mime_type) else {
        return Err(UploadError::TypeNotAllowed);
    };
    if file.data.len() > limits.max_size {
        return Err(UploadError::TooLarge);
    }
    if !validate_magic_bytes(&file.data, &file.mime_type) {
        return Err(UploadError::SignatureInvalid);
    }

    let path = attachment_path(&homework.id, extension);
    objects
        .put(&path, &file.data)
        .await
        .map_err(UploadError::Failed)?;

    let row = NewAttachment {
        homework_id: homework.id.clone(),
        storage_path: path.clone(),
        filename: file.filename,
        mime_type: file.mime_type.to_ascii_lowercase(),
        uploaded_by,
    };
    match storage.create_attachment(row).await {
        Ok(attachment) => Ok(attachment),
        Err(e) => {
            if let Err(cleanup) = objects.delete(&path).await {
                warn!("Failed to remove orphaned object {}: {}", path, cleanup);
            }
            Err(UploadError::Failed(e))
        }
    }
}

/// 读出唯一的 `file` 字段，超过上限立即停止
async fn read_file_field(
    payload: &mut Multipart,
    max_size: usize,
) -> Result<Option<UploadedFile>, UploadError> {
    let mut file: Option<UploadedFile> = None;

    while let Ok(Some(mut field)) = payload.try_next().await {
        let content_disposition = field.content_disposition();
        let name = content_disposition
            .and_then(|cd| cd.get_name())
            .unwrap_or_default()
            .to_string();
        if name != "file" || file.is_some() {
            continue;
        }

        let filename = content_disposition
            .and_then(|cd| cd.get_filename())
            .map(|s| s.to_string())
            .unwrap_or_else(|| "attachment".to_string());
        let mime_type = field
            .content_type()
            .map(|ct| ct.essence_str().to_string())
            .unwrap_or_default();

        let mut data = Vec::new();
        while let Some(chunk) = field.next().await {
            let chunk = chunk.map_err(|e| {
                UploadError::Failed(PlannerError::file_operation(format!("读取上传内容失败: {e}")))
            })?;
            if data.len() + chunk.len() > max_size {
                return Err(UploadError::TooLarge);
            }
            data.extend_from_slice(&chunk);
        }

        file = Some(UploadedFile {
            filename,
            mime_type,
            data,
        });
    }

    Ok(file)
}

pub async fn handle_upload(
    service: &AttachmentService,
    req: &HttpRequest,
    homework_id: String,
    mut payload: Multipart,
) -> ActixResult<HttpResponse> {
    let storage = try_or_respond!(service.get_storage(req));
    let objects = try_or_respond!(service.get_objects(req));
    let user = try_or_respond!(session_from(req));
    let class = try_or_respond!(class_from(req));

    let homework = match find_class_homework(storage.as_ref(), &class.class_id, &homework_id).await
    {
        Ok(Some(hw)) => hw,
        Ok(None) => return Ok(homework_not_found()),
        Err(e) => return Ok(storage_error(e, None)),
    };

    let limits = UploadLimits::from_config();
    let file = match read_file_field(&mut payload, limits.max_size).await {
        Ok(Some(file)) => file,
        Ok(None) => {
            return Ok(HttpResponse::BadRequest().json(ApiResponse::error_empty(
                ErrorCode::FileNotFound,
                "No file found in upload payload",
            )));
        }
        Err(e) => return Ok(e.into_response()),
    };

    match store_attachment(
        storage.as_ref(),
        objects.as_ref(),
        &homework,
        file,
        Some(user.id.clone()),
        &limits,
    )
    .await
    {
        Ok(attachment) => {
            info!(
                "User {} attached {} to homework {}",
                user.id, attachment.filename, homework.id
            );
            publish_change::<Attachment>(
                Table::HomeworkAttachments,
                ChangeKind::Insert,
                &class.class_id,
                Some(&attachment),
                None,
            );
            Ok(HttpResponse::Created()
                .json(ApiResponse::success(attachment, "File uploaded successfully")))
        }
        Err(e) => Ok(e.into_response()),
    }
}
