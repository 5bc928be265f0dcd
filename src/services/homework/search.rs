//! 作业列表的搜索、筛选与排序

use std::cmp::Ordering;
use std::collections::BTreeSet;

use crate::models::homework::entities::HomeworkWithRelations;
use crate::models::homework::requests::{
    HomeworkListQuery, HomeworkSortKey, HomeworkStatusFilter, SortOrder,
};

fn contains_ci(field: Option<&str>, needle: &str) -> bool {
    field.is_some_and(|f| f.to_lowercase().contains(needle))
}

fn compare_text(a: Option<&str>, b: Option<&str>) -> Ordering {
    let a = a.unwrap_or_default().to_lowercase();
    let b = b.unwrap_or_default().to_lowercase();
    a.cmp(&b)
}

fn compare(a: &HomeworkWithRelations, b: &HomeworkWithRelations, key: HomeworkSortKey) -> Ordering {
    let (a, b) = (&a.homework, &b.homework);
    match key {
        HomeworkSortKey::DueDate => a.due_date.cmp(&b.due_date),
        HomeworkSortKey::CreatedAt => a.created_at.cmp(&b.created_at),
        HomeworkSortKey::Subject => compare_text(a.subject.as_deref(), b.subject.as_deref()),
        HomeworkSortKey::Title => compare_text(Some(&a.title), Some(&b.title)),
    }
}

/// 依次按关键字、科目、完成状态（以 `user_id` 判断）筛选，再稳定排序
pub fn filter_and_sort(
    items: Vec<HomeworkWithRelations>,
    user_id: &str,
    query: &HomeworkListQuery,
) -> Vec<HomeworkWithRelations> {
    let needle = query
        .q
        .as_deref()
        .map(|q| q.trim().to_lowercase())
        .filter(|q| !q.is_empty());
    let subject = query.subject.as_deref().filter(|s| !s.is_empty());

    let mut filtered: Vec<HomeworkWithRelations> = items
        .into_iter()
        .filter(|hw| match &needle {
            Some(needle) => {
                let h = &hw.homework;
                contains_ci(Some(&h.title), needle)
                    || contains_ci(h.description.as_deref(), needle)
                    || contains_ci(h.subject.as_deref(), needle)
            }
            None => true,
        })
        .filter(|hw| subject.is_none_or(|s| hw.homework.subject.as_deref() == Some(s)))
        .filter(|hw| match query.status {
            HomeworkStatusFilter::All => true,
            HomeworkStatusFilter::Completed => hw.is_done_by(user_id),
            HomeworkStatusFilter::Pending => !hw.is_done_by(user_id),
        })
        .collect();

    filtered.sort_by(|a, b| {
        let ord = compare(a, b, query.sort_by);
        match query.order {
            SortOrder::Asc => ord,
            SortOrder::Desc => ord.reverse(),
        }
    });
    filtered
}

/// 非空科目，去重并排序
pub fn distinct_subjects(items: &[HomeworkWithRelations]) -> Vec<String> {
    items
        .iter()
        .filter_map(|hw| hw.homework.subject.clone())
        .filter(|s| !s.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::homework::entities::{Completion, Homework};
    use chrono::{TimeZone, Utc};

    fn item(id: &str, title: &str, subject: Option<&str>, due_day: u32, created_day: u32) -> HomeworkWithRelations {
        HomeworkWithRelations::bare(Homework {
            id: id.into(),
            class_id: "c1".into(),
            title: title.into(),
            description: None,
            subject: subject.map(str::to_string),
            due_date: Utc.with_ymd_and_hms(2025, 3, due_day, 12, 0, 0).unwrap(),
            created_by: None,
            created_at: Utc.with_ymd_and_hms(2025, 2, created_day, 8, 0, 0).unwrap(),
            updated_at: Utc.with_ymd_and_hms(2025, 2, created_day, 8, 0, 0).unwrap(),
        })
    }

    fn done(mut hw: HomeworkWithRelations, user_id: &str) -> HomeworkWithRelations {
        hw.completion.push(Completion {
            id: format!("{}-{user_id}", hw.homework.id),
            homework_id: hw.homework.id.clone(),
            user_id: user_id.into(),
            done: true,
            updated_at: Utc::now(),
        });
        hw
    }

    fn sample() -> Vec<HomeworkWithRelations> {
        let mut essay = item("h1", "Essay draft", Some("English"), 10, 3);
        essay.homework.description = Some("Chapter on fractions of poetry".into());
        vec![
            essay,
            done(item("h2", "algebra sheet", Some("Math"), 5, 1), "u1"),
            item("h3", "Lab report", Some("Biology"), 20, 2),
            item("h4", "Reading", None, 1, 4),
        ]
    }

    fn ids(items: &[HomeworkWithRelations]) -> Vec<&str> {
        items.iter().map(|h| h.id()).collect()
    }

    fn query() -> HomeworkListQuery {
        HomeworkListQuery::default()
    }

    #[test]
    fn test_default_sorts_by_due_date_ascending() {
        let out = filter_and_sort(sample(), "u1", &query());
        assert_eq!(ids(&out), vec!["h4", "h2", "h1", "h3"]);
    }

    #[test]
    fn test_search_matches_title_description_and_subject() {
        let mut q = query();
        q.q = Some("  MATH ".into());
        assert_eq!(ids(&filter_and_sort(sample(), "u1", &q)), vec!["h2"]);

        q.q = Some("fractions".into());
        assert_eq!(ids(&filter_and_sort(sample(), "u1", &q)), vec!["h1"]);

        q.q = Some("report".into());
        assert_eq!(ids(&filter_and_sort(sample(), "u1", &q)), vec!["h3"]);

        q.q = Some("   ".into());
        assert_eq!(filter_and_sort(sample(), "u1", &q).len(), 4);
    }

    #[test]
    fn test_subject_filter_is_exact() {
        let mut q = query();
        q.subject = Some("Biology".into());
        assert_eq!(ids(&filter_and_sort(sample(), "u1", &q)), vec!["h3"]);

        q.subject = Some("bio".into());
        assert!(filter_and_sort(sample(), "u1", &q).is_empty());

        q.subject = Some(String::new());
        assert_eq!(filter_and_sort(sample(), "u1", &q).len(), 4);
    }

    #[test]
    fn test_status_is_judged_per_caller() {
        let mut q = query();
        q.status = HomeworkStatusFilter::Completed;
        assert_eq!(ids(&filter_and_sort(sample(), "u1", &q)), vec!["h2"]);
        assert!(filter_and_sort(sample(), "u2", &q).is_empty());

        q.status = HomeworkStatusFilter::Pending;
        assert_eq!(ids(&filter_and_sort(sample(), "u1", &q)), vec!["h4", "h1", "h3"]);
        assert_eq!(filter_and_sort(sample(), "u2", &q).len(), 4);
    }

    #[test]
    fn test_sort_keys_and_order() {
        let mut q = query();
        q.sort_by = HomeworkSortKey::CreatedAt;
        assert_eq!(ids(&filter_and_sort(sample(), "u1", &q)), vec!["h2", "h3", "h1", "h4"]);

        // 无科目视为空串，排在最前
        q.sort_by = HomeworkSortKey::Subject;
        assert_eq!(ids(&filter_and_sort(sample(), "u1", &q)), vec!["h4", "h3", "h1", "h2"]);

        // 标题比较不区分大小写
        q.sort_by = HomeworkSortKey::Title;
        assert_eq!(ids(&filter_and_sort(sample(), "u1", &q)), vec!["h2", "h1", "h3", "h4"]);

        q.order = SortOrder::Desc;
        assert_eq!(ids(&filter_and_sort(sample(), "u1", &q)), vec!["h4", "h3", "h1", "h2"]);

        q.sort_by = HomeworkSortKey::DueDate;
        assert_eq!(ids(&filter_and_sort(sample(), "u1", &q)), vec!["h3", "h1", "h2", "h4"]);
    }

    #[test]
    fn test_distinct_subjects_sorted() {
        let mut items = sample();
        items.push(item("h5", "Quiz", Some("Math"), 2, 2));
        assert_eq!(distinct_subjects(&items), vec!["Biology", "English", "Math"]);
    }

    #[test]
    fn test_query_parses_from_url() {
        let q: HomeworkListQuery = parse_query("status=pending&sort_by=created_at&order=desc");
        assert_eq!(q.status, HomeworkStatusFilter::Pending);
        assert_eq!(q.sort_by, HomeworkSortKey::CreatedAt);
        assert_eq!(q.order, SortOrder::Desc);
        assert!(q.q.is_none());
    }

    fn parse_query(qs: &str) -> HomeworkListQuery {
        actix_web::web::Query::<HomeworkListQuery>::from_query(qs)
            .unwrap()
            .into_inner()
    }
}
