//! 后端原始行 -> HomeworkWithRelations

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::errors::{PlannerError, Result};
use crate::models::homework::entities::{
    Attachment, Completion, Creator, Homework, HomeworkWithRelations,
};

/// 关联查询返回的原始行
#[derive(Debug, Deserialize)]
struct RawHomeworkRow {
    #[serde(flatten)]
    homework: Homework,
    #[serde(default)]
    homework_attachments: Option<Vec<Attachment>>,
    #[serde(default)]
    homework_completion: Option<Vec<Completion>>,
    #[serde(default)]
    creator: Option<Value>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

fn creator_from(value: Option<Value>) -> Option<Creator> {
    match value {
        Some(Value::Object(map)) => {
            let field = |key: &str| map.get(key).and_then(Value::as_str).map(str::to_string);
            Some(Creator {
                display_name: field("display_name"),
                avatar_url: field("avatar_url"),
            })
        }
        _ => None,
    }
}

pub fn normalize_row(row: Value) -> Result<HomeworkWithRelations> {
    let raw: RawHomeworkRow = serde_json::from_value(row)
        .map_err(|e| PlannerError::serialization(format!("作业数据格式错误: {e}")))?;

    Ok(HomeworkWithRelations {
        homework: raw.homework,
        attachments: raw.homework_attachments.unwrap_or_default(),
        completion: raw.homework_completion.unwrap_or_default(),
        creator: creator_from(raw.creator),
        extra: raw.extra,
    })
}

pub fn normalize_rows(rows: Vec<Value>) -> Result<Vec<HomeworkWithRelations>> {
    rows.into_iter().map(normalize_row).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn base_row() -> Value {
        json!({
            "id": "h1",
            "class_id": "c1",
            "title": "Essay",
            "description": null,
            "subject": "English",
            "due_date": "2026-03-02T12:00:00Z",
            "created_by": "u1",
            "created_at": "2026-03-01T08:00:00Z",
            "updated_at": "2026-03-01T08:00:00Z"
        })
    }

    #[test]
    fn test_relations_are_renamed() {
        let mut row = base_row();
        row["homework_attachments"] = json!([{
            "id": "a1",
            "homework_id": "h1",
            "storage_path": "h1/1-x.png",
            "filename": "x.png",
            "mime_type": "image/png",
            "uploaded_by": null,
            "created_at": "2026-03-01T08:00:00Z"
        }]);
        row["homework_completion"] = json!([{
            "id": "k1",
            "homework_id": "h1",
            "user_id": "u2",
            "done": true,
            "updated_at": "2026-03-01T09:00:00Z"
        }]);
        row["creator"] = json!({ "display_name": "ana", "avatar_url": null });

        let item = normalize_row(row).unwrap();
        assert_eq!(item.attachments.len(), 1);
        assert!(item.is_done_by("u2"));
        assert_eq!(
            item.creator,
            Some(Creator {
                display_name: Some("ana".into()),
                avatar_url: None
            })
        );

        let out = serde_json::to_value(&item).unwrap();
        assert!(out.get("homework_attachments").is_none());
        assert_eq!(out["attachments"][0]["id"], "a1");
        assert_eq!(out["subject"], "English");
    }

    #[test]
    fn test_missing_relations_default_to_empty() {
        let item = normalize_row(base_row()).unwrap();
        assert!(item.attachments.is_empty());
        assert!(item.completion.is_empty());
        assert_eq!(item.creator, None);

        let mut row = base_row();
        row["homework_attachments"] = Value::Null;
        row["creator"] = json!("not an object");
        let item = normalize_row(row).unwrap();
        assert!(item.attachments.is_empty());
        assert_eq!(item.creator, None);
    }

    #[test]
    fn test_unknown_fields_are_preserved() {
        let mut row = base_row();
        row["priority_hint"] = json!(3);
        let item = normalize_row(row).unwrap();
        assert_eq!(item.extra.get("priority_hint"), Some(&json!(3)));

        let out = serde_json::to_value(&item).unwrap();
        assert_eq!(out["priority_hint"], 3);
        assert_eq!(out["id"], "h1");
    }

    #[test]
    fn test_malformed_row_is_rejected() {
        let err = normalize_row(json!({ "id": "h1" })).unwrap_err();
        assert!(matches!(err, PlannerError::Serialization(_)));

        let mut row = base_row();
        row["homework_completion"] = json!("oops");
        assert!(normalize_row(row).is_err());
    }
}
