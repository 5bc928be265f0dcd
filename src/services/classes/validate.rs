use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::{debug, error};

use super::ClassService;
use crate::errors::PlannerError;
use crate::models::ApiResponse;
use crate::models::classes::{requests::ClassCodeRequest, responses::ClassCodeValidation};
use crate::services::try_or_respond;
use crate::storage::ClassCodeLookup;
use crate::utils::jwt::JwtUtils;
use crate::utils::validate::{is_valid_class_code, normalize_class_code};

pub const EMPTY_CODE: &str = "Please enter your class code.";
pub const BAD_FORMAT: &str = "Invalid class code format. Example: 1HAT2";
pub const NOT_FOUND: &str = "Class code not found. Please check your code.";

/// 校验加入码；格式不对时不会查询后端
pub async fn validate_class_code<L>(lookup: &L, input: &str) -> ClassCodeValidation
where
    L: ClassCodeLookup + ?Sized,
{
    let code = normalize_class_code(input);
    if code.is_empty() {
        return ClassCodeValidation::rejected(EMPTY_CODE);
    }
    if !is_valid_class_code(&code) {
        return ClassCodeValidation::rejected(BAD_FORMAT);
    }

    match lookup.lookup_class_by_code(&code).await {
        Ok(rows) => match rows.first() {
            Some(row) => ClassCodeValidation::ok(row.resolved_class_id()),
            None => ClassCodeValidation::rejected(NOT_FOUND),
        },
        Err(PlannerError::NotFound(msg)) => {
            debug!("Class code {} not found: {}", code, msg);
            ClassCodeValidation::rejected(NOT_FOUND)
        }
        Err(e) if e.is_database() => {
            error!("Class code lookup failed: {}", e);
            ClassCodeValidation::rejected(format!("Server error: {}", e.message()))
        }
        Err(e) => {
            error!("Class code lookup failed unexpectedly: {}", e);
            ClassCodeValidation::rejected(format!("Unexpected error: {}", e.message()))
        }
    }
}

pub async fn handle_lookup(
    service: &ClassService,
    req: &HttpRequest,
    body: ClassCodeRequest,
) -> ActixResult<HttpResponse> {
    let storage = try_or_respond!(service.get_storage(req));
    let result = validate_class_code(storage.as_ref(), &body.code).await;

    match &result.class_id {
        Some(class_id) if result.valid => Ok(HttpResponse::Ok()
            .cookie(JwtUtils::create_class_cookie(class_id))
            .json(ApiResponse::success(result.clone(), "Class code accepted"))),
        // 结果本身带错误信息，前端按 valid 判断
        _ => Ok(HttpResponse::Ok().json(ApiResponse::success(result, "Class code rejected"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::Result;
    use crate::models::classes::entities::ClassLookupRow;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct MockLookup {
        response: Result<Vec<ClassLookupRow>>,
        calls: AtomicUsize,
    }

    impl MockLookup {
        fn new(response: Result<Vec<ClassLookupRow>>) -> Self {
            Self {
                response,
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait::async_trait]
    impl ClassCodeLookup for MockLookup {
        async fn lookup_class_by_code(&self, _code: &str) -> Result<Vec<ClassLookupRow>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.response.clone()
        }
    }

    fn row(id: &str, class_id: Option<&str>) -> ClassLookupRow {
        ClassLookupRow {
            id: id.into(),
            class_id: class_id.map(str::to_string),
            code: "3HT1".into(),
            name: None,
        }
    }

    #[tokio::test]
    async fn test_valid_code_uses_class_id() {
        let lookup = MockLookup::new(Ok(vec![row("row-1", Some("abc"))]));
        let result = validate_class_code(&lookup, " 3ht1 ").await;
        assert_eq!(result, ClassCodeValidation::ok("abc"));
        assert_eq!(lookup.calls(), 1);
    }

    #[tokio::test]
    async fn test_falls_back_to_row_id() {
        let lookup = MockLookup::new(Ok(vec![row("row-1", None)]));
        let result = validate_class_code(&lookup, "1HAT2").await;
        assert_eq!(result.class_id.as_deref(), Some("row-1"));
    }

    #[tokio::test]
    async fn test_bad_input_never_hits_backend() {
        let lookup = MockLookup::new(Ok(vec![row("row-1", None)]));
        assert_eq!(
            validate_class_code(&lookup, "   ").await,
            ClassCodeValidation::rejected(EMPTY_CODE)
        );
        assert_eq!(
            validate_class_code(&lookup, "HAT").await,
            ClassCodeValidation::rejected(BAD_FORMAT)
        );
        assert_eq!(
            validate_class_code(&lookup, "123ABC1").await,
            ClassCodeValidation::rejected(BAD_FORMAT)
        );
        assert_eq!(lookup.calls(), 0);
    }

    #[tokio::test]
    async fn test_lookup_failures() {
        let empty = MockLookup::new(Ok(vec![]));
        assert_eq!(
            validate_class_code(&empty, "3HT1").await,
            ClassCodeValidation::rejected(NOT_FOUND)
        );

        let missing = MockLookup::new(Err(PlannerError::not_found("no rows")));
        assert_eq!(validate_class_code(&missing, "3HT1").await.error.as_deref(), Some(NOT_FOUND));

        let db = MockLookup::new(Err(PlannerError::database_operation("timeout")));
        assert_eq!(
            validate_class_code(&db, "3HT1").await.error.as_deref(),
            Some("Server error: timeout")
        );

        let other = MockLookup::new(Err(PlannerError::serialization("bad row")));
        assert_eq!(
            validate_class_code(&other, "3HT1").await.error.as_deref(),
            Some("Unexpected error: bad row")
        );
    }
}
