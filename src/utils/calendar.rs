//! 月历网格与 UTC 日期边界

use std::collections::HashMap;

use chrono::{DateTime, Datelike, Days, Months, NaiveDate, NaiveTime, TimeDelta, Utc};

use crate::errors::{PlannerError, Result};
use crate::models::homework::responses::{CalendarDay, CalendarMonth};

/// 某日 00:00:00 UTC
pub fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

/// 明天 23:59:59.999 UTC
pub fn end_of_tomorrow(now: DateTime<Utc>) -> DateTime<Utc> {
    start_of_day(now.date_naive()) + TimeDelta::days(2) - TimeDelta::milliseconds(1)
}

pub fn days_in_month(year: i32, month: u32) -> Option<u32> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = first.checked_add_months(Months::new(1))?;
    Some(next.signed_duration_since(first).num_days() as u32)
}

/// 周日开头的整周月历；`due` 为 (作业 ID, 截止时间)
pub fn month_grid<'a>(
    year: i32,
    month: u32,
    today: NaiveDate,
    due: impl IntoIterator<Item = (&'a str, DateTime<Utc>)>,
) -> Result<CalendarMonth> {
    let invalid = || PlannerError::validation(format!("Invalid month: {year}-{month}"));
    let first = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(invalid)?;
    let days = days_in_month(year, month).ok_or_else(invalid)?;

    let leading = first.weekday().num_days_from_sunday();
    let total = (days + leading).div_ceil(7) * 7;
    let start = first
        .checked_sub_days(Days::new(leading as u64))
        .ok_or_else(invalid)?;

    let mut by_day: HashMap<NaiveDate, Vec<String>> = HashMap::new();
    for (id, due_date) in due {
        by_day
            .entry(due_date.date_naive())
            .or_default()
            .push(id.to_string());
    }

    let cells: Vec<CalendarDay> = start
        .iter_days()
        .take(total as usize)
        .map(|date| CalendarDay {
            date,
            in_month: date.month() == month && date.year() == year,
            is_today: date == today,
            homework_ids: by_day.remove(&date).unwrap_or_default(),
        })
        .collect();

    Ok(CalendarMonth {
        year,
        month,
        weeks: cells.chunks(7).map(|w| w.to_vec()).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_days_in_month() {
        assert_eq!(days_in_month(2024, 2), Some(29));
        assert_eq!(days_in_month(2026, 2), Some(28));
        assert_eq!(days_in_month(2026, 12), Some(31));
        assert_eq!(days_in_month(2026, 13), None);
    }

    #[test]
    fn test_grid_shape() {
        // 2026-03-01 是周日
        let grid = month_grid(2026, 3, date(2026, 3, 18), []).unwrap();
        assert_eq!(grid.weeks.len(), 5);
        assert_eq!(grid.weeks[0][0].date, date(2026, 3, 1));
        assert!(grid.weeks[0][0].in_month);
        let last = &grid.weeks[4][6];
        assert_eq!(last.date, date(2026, 4, 4));
        assert!(!last.in_month);

        // 2026-10-01 是周四，前面补 4 天
        let grid = month_grid(2026, 10, date(2026, 10, 18), []).unwrap();
        assert_eq!(grid.weeks[0][0].date, date(2026, 9, 27));
        assert!(!grid.weeks[0][0].in_month);
        assert!(grid.weeks.iter().flatten().filter(|d| d.is_today).count() == 1);
        assert!(grid.weeks.iter().all(|w| w.len() == 7));
    }

    #[test]
    fn test_homework_lands_on_due_day() {
        let due = Utc.with_ymd_and_hms(2026, 3, 10, 23, 30, 0).unwrap();
        let grid = month_grid(2026, 3, date(2026, 3, 1), [("h1", due), ("h2", due)]).unwrap();
        let cell = grid
            .weeks
            .iter()
            .flatten()
            .find(|d| d.date == date(2026, 3, 10))
            .unwrap();
        assert_eq!(cell.homework_ids, vec!["h1", "h2"]);
    }

    #[test]
    fn test_invalid_month() {
        assert!(month_grid(2026, 0, date(2026, 1, 1), []).is_err());
    }

    #[test]
    fn test_end_of_tomorrow() {
        let now = Utc.with_ymd_and_hms(2026, 3, 10, 8, 0, 0).unwrap();
        let end = end_of_tomorrow(now);
        assert_eq!(end.date_naive(), date(2026, 3, 11));
        assert_eq!(end + TimeDelta::milliseconds(1), start_of_day(date(2026, 3, 12)));
    }
}
