//! 变更事件合并到本地作业列表
//!
//! 全部为纯函数，不访问存储。

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::errors::{PlannerError, Result};
use crate::models::homework::entities::{
    Attachment, Completion, Homework, HomeworkWithRelations,
};
use crate::realtime::{ChangeEvent, ChangeKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    Changed,
    Unchanged,
    /// 本地状态无法增量更新，需要整体重新拉取
    NeedsRefetch,
}

/// 删除事件只保证带主键
#[derive(Debug, Deserialize)]
struct RowKey {
    id: String,
    #[serde(default)]
    homework_id: Option<String>,
}

fn parse<T: DeserializeOwned>(value: Option<&Value>) -> Result<T> {
    let value = value.ok_or_else(|| PlannerError::serialization("变更事件缺少行数据"))?;
    serde_json::from_value(value.clone())
        .map_err(|e| PlannerError::serialization(format!("变更事件数据格式错误: {e}")))
}

/// 按截止时间有序插入，相同时间排在已有项之后
fn insert_sorted(list: &mut Vec<HomeworkWithRelations>, item: HomeworkWithRelations) {
    let due = item.homework.due_date;
    let pos = list.partition_point(|h| h.homework.due_date <= due);
    list.insert(pos, item);
}

/// 有则替换，无则追加；返回是否有变化
fn upsert_by_id<T: PartialEq>(items: &mut Vec<T>, item: T, id_of: impl Fn(&T) -> &str) -> bool {
    match items.iter().position(|x| id_of(x) == id_of(&item)) {
        Some(i) if items[i] == item => false,
        Some(i) => {
            items[i] = item;
            true
        }
        None => {
            items.push(item);
            true
        }
    }
}

fn remove_by_id<T>(items: &mut Vec<T>, id: &str, id_of: impl Fn(&T) -> &str) -> bool {
    let before = items.len();
    items.retain(|x| id_of(x) != id);
    items.len() != before
}

/// 作业表事件
pub fn apply_homework_change(
    list: &mut Vec<HomeworkWithRelations>,
    event: &ChangeEvent,
    class_id: &str,
) -> Result<MergeOutcome> {
    match event.kind {
        ChangeKind::Insert => {
            let homework: Homework = parse(event.new.as_ref())?;
            if homework.class_id != class_id || list.iter().any(|h| h.id() == homework.id) {
                return Ok(MergeOutcome::Unchanged);
            }
            insert_sorted(list, HomeworkWithRelations::bare(homework));
            Ok(MergeOutcome::Changed)
        }
        ChangeKind::Update => {
            let homework: Homework = parse(event.new.as_ref())?;
            let Some(pos) = list.iter().position(|h| h.id() == homework.id) else {
                return Ok(MergeOutcome::Unchanged);
            };
            // 移到其他班级，等同删除
            if homework.class_id != class_id {
                list.remove(pos);
                return Ok(MergeOutcome::Changed);
            }
            if list[pos].homework == homework {
                return Ok(MergeOutcome::Unchanged);
            }
            let mut item = list.remove(pos);
            item.homework = homework;
            insert_sorted(list, item);
            Ok(MergeOutcome::Changed)
        }
        ChangeKind::Delete => {
            let key: RowKey = parse(event.old.as_ref())?;
            Ok(if remove_by_id(list, &key.id, |h| h.id()) {
                MergeOutcome::Changed
            } else {
                MergeOutcome::Unchanged
            })
        }
    }
}

/// 找到事件所属的作业；不在本地时返回 None
fn owner<'a>(
    list: &'a mut [HomeworkWithRelations],
    event: &ChangeEvent,
) -> Result<Option<&'a mut HomeworkWithRelations>> {
    let key: RowKey = parse(event.row())?;
    let Some(homework_id) = key.homework_id else {
        return Err(PlannerError::serialization("变更事件缺少 homework_id"));
    };
    Ok(list.iter_mut().find(|h| h.id() == homework_id))
}

/// 附件表事件
pub fn apply_attachment_change(
    list: &mut [HomeworkWithRelations],
    event: &ChangeEvent,
) -> Result<MergeOutcome> {
    let Some(item) = owner(list, event)? else {
        return Ok(MergeOutcome::NeedsRefetch);
    };

    let changed = match event.kind {
        ChangeKind::Insert | ChangeKind::Update => {
            let attachment: Attachment = parse(event.new.as_ref())?;
            upsert_by_id(&mut item.attachments, attachment, |a| &a.id)
        }
        ChangeKind::Delete => {
            let key: RowKey = parse(event.old.as_ref())?;
            remove_by_id(&mut item.attachments, &key.id, |a| &a.id)
        }
    };

    Ok(if changed {
        MergeOutcome::Changed
    } else {
        MergeOutcome::Unchanged
    })
}

/// 完成状态表事件
pub fn apply_completion_change(
    list: &mut [HomeworkWithRelations],
    event: &ChangeEvent,
) -> Result<MergeOutcome> {
    let Some(item) = owner(list, event)? else {
        return Ok(MergeOutcome::NeedsRefetch);
    };

    let changed = match event.kind {
        ChangeKind::Insert | ChangeKind::Update => {
            let completion: Completion = parse(event.new.as_ref())?;
            // 重新拉取后才到达的旧事件不能覆盖较新的行
            let stale = item.completion.iter().any(|c| {
                (c.id == completion.id || c.user_id == completion.user_id)
                    && c.updated_at > completion.updated_at
            });
            if stale {
                return Ok(MergeOutcome::Unchanged);
            }
            // 同一用户只保留一行
            item.completion
                .retain(|c| c.user_id != completion.user_id || c.id == completion.id);
            upsert_by_id(&mut item.completion, completion, |c| &c.id)
        }
        ChangeKind::Delete => {
            let key: RowKey = parse(event.old.as_ref())?;
            remove_by_id(&mut item.completion, &key.id, |c| &c.id)
        }
    };

    Ok(if changed {
        MergeOutcome::Changed
    } else {
        MergeOutcome::Unchanged
    })
}
