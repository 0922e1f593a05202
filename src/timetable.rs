use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::Serialize;
use std::collections::BTreeMap;

pub const DAY_NAMES: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

/// The start and activity name of one session inside the timetable week.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct WeekSessionRow {
    pub start: NaiveDateTime,
    pub activity_name: String,
}

/// One activity's row in the weekly grid: a cell of comma-joined start
/// times for each day Monday through Sunday.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TimetableRow {
    pub activity: String,
    pub days: Vec<String>,
}

/// Half-open [Monday 00:00, next Monday 00:00) window containing `today`.
pub fn week_bounds(today: NaiveDate) -> (NaiveDateTime, NaiveDateTime) {
    let days_from_monday = today.weekday().num_days_from_monday() as i64;
    let monday = today - Duration::days(days_from_monday);
    let start = monday.and_hms_opt(0, 0, 0).unwrap_or_default();
    (start, start + Duration::days(7))
}

/// 12-hour clock without a leading zero, e.g. "9:00 AM".
pub fn format_time_12h(time: NaiveTime) -> String {
    let (is_pm, hour) = time.hour12();
    format!(
        "{}:{:02} {}",
        hour,
        time.minute(),
        if is_pm { "PM" } else { "AM" }
    )
}

/// Fold the week's sessions into one row per listed activity. Rows come
/// back sorted by activity name; an activity with no sessions this week
/// keeps a row of empty cells, a day with no sessions renders as an empty
/// cell, multiple sessions on one day join with ", " in start order.
pub fn build_timetable<'a>(
    activity_names: impl IntoIterator<Item = &'a str>,
    rows: &'a [WeekSessionRow],
) -> Vec<TimetableRow> {
    let mut by_activity: BTreeMap<&str, Vec<Vec<String>>> = activity_names
        .into_iter()
        .map(|name| (name, vec![Vec::new(); 7]))
        .collect();

    for row in rows {
        let cells = by_activity
            .entry(row.activity_name.as_str())
            .or_insert_with(|| vec![Vec::new(); 7]);
        let day = row.start.weekday().num_days_from_monday() as usize;
        cells[day].push(format_time_12h(row.start.time()));
    }

    by_activity
        .into_iter()
        .map(|(activity, cells)| TimetableRow {
            activity: activity.to_string(),
            days: cells.into_iter().map(|times| times.join(", ")).collect(),
        })
        .collect()
}
