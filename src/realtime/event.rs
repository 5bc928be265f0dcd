use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

/// 可订阅的表
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "../frontend/src/types/generated/realtime.ts")]
pub enum Table {
    Homework,
    HomeworkAttachments,
    HomeworkCompletion,
}

impl Table {
    pub fn as_str(&self) -> &'static str {
        match self {
            Table::Homework => "homework",
            Table::HomeworkAttachments => "homework_attachments",
            Table::HomeworkCompletion => "homework_completion",
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "UPPERCASE")]
#[ts(export, export_to = "../frontend/src/types/generated/realtime.ts")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

/// 行级变更事件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/realtime.ts")]
pub struct ChangeEvent {
    pub table: Table,
    #[serde(rename = "type")]
    pub kind: ChangeKind,
    pub class_id: String,
    pub new: Option<serde_json::Value>,
    pub old: Option<serde_json::Value>,
    pub commit_timestamp: chrono::DateTime<chrono::Utc>,
}

impl ChangeEvent {
    pub fn new(
        table: Table,
        kind: ChangeKind,
        class_id: impl Into<String>,
        new: Option<serde_json::Value>,
        old: Option<serde_json::Value>,
    ) -> Self {
        Self {
            table,
            kind,
            class_id: class_id.into(),
            new,
            old,
            commit_timestamp: chrono::Utc::now(),
        }
    }

    /// 由写入后的行构造事件
    pub fn from_rows<T: Serialize>(
        table: Table,
        kind: ChangeKind,
        class_id: impl Into<String>,
        new: Option<&T>,
        old: Option<&T>,
    ) -> crate::errors::Result<Self> {
        let new = new.map(serde_json::to_value).transpose()?;
        let old = old.map(serde_json::to_value).transpose()?;
        Ok(Self::new(table, kind, class_id, new, old))
    }

    /// 事件涉及的行，删除事件取旧行
    pub fn row(&self) -> Option<&serde_json::Value> {
        match self.kind {
            ChangeKind::Delete => self.old.as_ref(),
            _ => self.new.as_ref(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EventFilter {
    #[default]
    All,
    Only(ChangeKind),
}

impl EventFilter {
    pub fn accepts(&self, kind: ChangeKind) -> bool {
        match self {
            EventFilter::All => true,
            EventFilter::Only(k) => *k == kind,
        }
    }
}

/// 订阅条件：表、事件类型、班级
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionSpec {
    pub table: Table,
    pub event: EventFilter,
    pub class_id: Option<String>,
}

impl SubscriptionSpec {
    /// 某班级在该表上的全部事件
    pub fn class(table: Table, class_id: impl Into<String>) -> Self {
        Self {
            table,
            event: EventFilter::All,
            class_id: Some(class_id.into()),
        }
    }

    pub fn matches(&self, event: &ChangeEvent) -> bool {
        event.table == self.table
            && self.event.accepts(event.kind)
            && self
                .class_id
                .as_deref()
                .is_none_or(|class_id| class_id == event.class_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_wire_shape() {
        let event = ChangeEvent::new(
            Table::HomeworkCompletion,
            ChangeKind::Update,
            "c1",
            Some(json!({ "done": true })),
            None,
        );
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["table"], "homework_completion");
        assert_eq!(value["type"], "UPDATE");
        assert_eq!(value["class_id"], "c1");
        assert!(value["commit_timestamp"].is_string());
    }

    #[test]
    fn test_event_filter() {
        let spec = SubscriptionSpec {
            table: Table::Homework,
            event: EventFilter::Only(ChangeKind::Delete),
            class_id: None,
        };
        let insert = ChangeEvent::new(Table::Homework, ChangeKind::Insert, "c1", None, None);
        let delete = ChangeEvent::new(Table::Homework, ChangeKind::Delete, "c9", None, None);
        assert!(!spec.matches(&insert));
        assert!(spec.matches(&delete));
        assert_eq!(delete.row(), None);
    }
}
