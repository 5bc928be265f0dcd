use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use chrono::{DateTime, TimeDelta, Utc};

use super::HomeworkService;
use super::list::load_class_homework;
use crate::models::ApiResponse;
use crate::models::homework::entities::HomeworkWithRelations;
use crate::models::homework::responses::HomeworkDigest;
use crate::services::{class_from, session_from, storage_error, try_or_respond};
use crate::utils::calendar::{end_of_tomorrow, start_of_day};

/// 现在到明天结束之间到期、调用者还没完成的作业
pub fn due_soon(
    items: &[HomeworkWithRelations],
    user_id: &str,
    now: DateTime<Utc>,
) -> Vec<HomeworkWithRelations> {
    let until = end_of_tomorrow(now);
    items
        .iter()
        .filter(|hw| hw.homework.due_date >= now && hw.homework.due_date <= until)
        .filter(|hw| !hw.is_done_by(user_id))
        .cloned()
        .collect()
}

/// 已完成的只计入 completed，其余按 UTC 日期归类
pub fn digest(items: &[HomeworkWithRelations], user_id: &str, now: DateTime<Utc>) -> HomeworkDigest {
    let today = start_of_day(now.date_naive());
    let tomorrow = today + TimeDelta::days(1);
    let day_after = today + TimeDelta::days(2);

    items.iter().fold(HomeworkDigest::default(), |mut d, hw| {
        let due = hw.homework.due_date;
        if hw.is_done_by(user_id) {
            d.completed += 1;
        } else if due >= today && due < tomorrow {
            d.due_today += 1;
        } else if due >= tomorrow && due < day_after {
            d.due_tomorrow += 1;
        } else if due < today {
            d.overdue += 1;
        }
        d
    })
}

pub async fn handle_due_soon(
    service: &HomeworkService,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = try_or_respond!(service.get_storage(request));
    let user = try_or_respond!(session_from(request));
    let class = try_or_respond!(class_from(request));

    match load_class_homework(storage.as_ref(), &class.class_id).await {
        Ok(items) => {
            let soon = due_soon(&items, &user.id, Utc::now());
            Ok(HttpResponse::Ok().json(ApiResponse::success(soon, "ok")))
        }
        Err(e) => Ok(storage_error(e, None)),
    }
}

pub async fn handle_digest(
    service: &HomeworkService,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = try_or_respond!(service.get_storage(request));
    let user = try_or_respond!(session_from(request));
    let class = try_or_respond!(class_from(request));

    match load_class_homework(storage.as_ref(), &class.class_id).await {
        Ok(items) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            digest(&items, &user.id, Utc::now()),
            "ok",
        ))),
        Err(e) => Ok(storage_error(e, None)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::homework::entities::{Completion, Homework};
    use chrono::TimeZone;

    fn item(id: &str, due: DateTime<Utc>, done_by: Option<&str>) -> HomeworkWithRelations {
        let mut hw = HomeworkWithRelations::bare(Homework {
            id: id.into(),
            class_id: "c".into(),
            title: id.into(),
            description: None,
            subject: None,
            due_date: due,
            created_by: None,
            created_at: due,
            updated_at: due,
        });
        if let Some(user) = done_by {
            hw.completion.push(Completion {
                id: format!("c-{id}"),
                homework_id: id.into(),
                user_id: user.into(),
                done: true,
                updated_at: due,
            });
        }
        hw
    }

    fn at(d: u32, h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, d, h, m, 0).unwrap()
    }

    #[test]
    fn test_due_soon_window() {
        let now = at(10, 12, 0);
        let items = vec![
            item("past", at(10, 11, 0), None),
            item("tonight", at(10, 20, 0), None),
            item("tomorrow-late", at(11, 23, 59), None),
            item("day-after", at(12, 0, 0), None),
            item("done", at(10, 18, 0), Some("u1")),
            item("done-by-other", at(11, 8, 0), Some("u2")),
        ];

        let ids: Vec<String> = due_soon(&items, "u1", now)
            .iter()
            .map(|h| h.id().to_string())
            .collect();
        assert_eq!(ids, vec!["tonight", "tomorrow-late", "done-by-other"]);
    }

    #[test]
    fn test_digest_buckets() {
        let now = at(10, 12, 0);
        let items = vec![
            item("earlier-today", at(10, 8, 0), None),
            item("today", at(10, 22, 0), None),
            item("tomorrow", at(11, 9, 0), None),
            item("yesterday", at(9, 9, 0), None),
            item("next-week", at(17, 9, 0), None),
            item("finished", at(9, 9, 0), Some("u1")),
        ];

        assert_eq!(
            digest(&items, "u1", now),
            HomeworkDigest {
                due_today: 2,
                due_tomorrow: 1,
                overdue: 1,
                completed: 1,
            }
        );
    }
}
