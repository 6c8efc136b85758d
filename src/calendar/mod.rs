use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use serde_json::Value;
use thiserror::Error;

use crate::query::date_range::parse_record_date;
use crate::record::Fields;

/// One row of a month view, Sunday first. Cells outside the month are `None`.
pub type Week = [Option<NaiveDate>; 7];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CalendarError {
    #[error("invalid month {year}-{month:02}")]
    InvalidMonth { year: i32, month: u32 },
}

fn first_of_month(year: i32, month: u32) -> Result<NaiveDate, CalendarError> {
    NaiveDate::from_ymd_opt(year, month, 1).ok_or(CalendarError::InvalidMonth { year, month })
}

pub fn days_in_month(year: i32, month: u32) -> Result<u32, CalendarError> {
    let first = first_of_month(year, month)?;
    let next = if month == 12 {
        first_of_month(year + 1, 1)?
    } else {
        first_of_month(year, month + 1)?
    };
    Ok(next.signed_duration_since(first).num_days() as u32)
}

/// Lays out a month as 4 to 6 Sunday-first weeks.
pub fn month_grid(year: i32, month: u32) -> Result<Vec<Week>, CalendarError> {
    let first = first_of_month(year, month)?;
    let lead = first.weekday().num_days_from_sunday() as usize;
    let days = days_in_month(year, month)?;

    let mut cells: Vec<Option<NaiveDate>> = vec![None; lead];
    cells.extend((0..days).map(|offset| first.with_day(offset + 1)));
    while cells.len() % 7 != 0 {
        cells.push(None);
    }

    Ok(cells
        .chunks(7)
        .map(|chunk| {
            let mut week: Week = [None; 7];
            week.copy_from_slice(chunk);
            week
        })
        .collect())
}

/// Counts records per day of the given month using their `date_field`.
/// Records without a readable date are skipped.
pub fn bucket_by_day<'a, R: Fields + 'a>(
    records: impl IntoIterator<Item = &'a R>,
    date_field: &str,
    year: i32,
    month: u32,
) -> BTreeMap<NaiveDate, usize> {
    let mut counts = BTreeMap::new();
    for record in records {
        let Some(Value::String(raw)) = record.field(date_field) else {
            continue;
        };
        let Some(date) = parse_record_date(raw) else {
            continue;
        };
        if date.year() == year && date.month() == month {
            *counts.entry(date).or_insert(0) += 1;
        }
    }
    counts
}

const CELL_WIDTH: usize = 7;
const WEEKDAYS: [&str; 7] = ["Su", "Mo", "Tu", "We", "Th", "Fr", "Sa"];

/// Plain-text month view with the number of records on each day.
pub fn render_calendar(
    year: i32,
    month: u32,
    counts: &BTreeMap<NaiveDate, usize>,
) -> Result<String, CalendarError> {
    let grid = month_grid(year, month)?;
    let first = first_of_month(year, month)?;
    let width = CELL_WIDTH * 7;

    let mut out = String::new();
    let title = first.format("%B %Y").to_string();
    out.push_str(&format!("{title:^width$}"));
    out.push('\n');
    for name in WEEKDAYS {
        out.push_str(&format!("{name:<CELL_WIDTH$}"));
    }
    out.push('\n');

    for week in grid {
        let mut line = String::new();
        for cell in week {
            let text = match cell {
                Some(date) => match counts.get(&date) {
                    Some(n) => format!("{:>2}({n})", date.day()),
                    None => format!("{:>2}", date.day()),
                },
                None => String::new(),
            };
            line.push_str(&format!("{text:<CELL_WIDTH$}"));
        }
        out.push_str(line.trim_end());
        out.push('\n');
    }

    let total: usize = counts.values().sum();
    out.push_str(&format!("{total} scheduled in {title}\n"));
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Record;
    use serde_json::json;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn february_leap_year() {
        assert_eq!(days_in_month(2024, 2).unwrap(), 29);
        assert_eq!(days_in_month(2023, 2).unwrap(), 28);
        assert_eq!(days_in_month(2024, 12).unwrap(), 31);
    }

    #[test]
    fn grid_starts_on_sunday() {
        // 2024-09-01 is a Sunday and September has 30 days
        let grid = month_grid(2024, 9).unwrap();
        assert_eq!(grid.len(), 5);
        assert_eq!(grid[0][0], Some(day(2024, 9, 1)));
        assert_eq!(grid[4][1], Some(day(2024, 9, 30)));
        assert_eq!(grid[4][2], None);
    }

    #[test]
    fn six_week_month() {
        // 2024-03-01 is a Friday; 31 days spill into a sixth row
        let grid = month_grid(2024, 3).unwrap();
        assert_eq!(grid.len(), 6);
        assert_eq!(grid[0][4], None);
        assert_eq!(grid[0][5], Some(day(2024, 3, 1)));
        assert_eq!(grid[5][0], Some(day(2024, 3, 31)));
        let filled = grid.iter().flatten().filter(|c| c.is_some()).count();
        assert_eq!(filled, 31);
    }

    #[test]
    fn invalid_month_is_an_error() {
        assert_eq!(
            month_grid(2024, 13).unwrap_err(),
            CalendarError::InvalidMonth {
                year: 2024,
                month: 13
            }
        );
    }

    #[test]
    fn buckets_only_the_requested_month() {
        let records: Vec<Record> = [
            json!({"date": "2024-09-03"}),
            json!({"date": "2024-09-03T15:00:00Z"}),
            json!({"date": "2024-10-01"}),
            json!({"date": null}),
            json!({}),
        ]
        .iter()
        .map(|v| v.as_object().cloned().unwrap())
        .collect();
        let counts = bucket_by_day(&records, "date", 2024, 9);
        assert_eq!(counts.len(), 1);
        assert_eq!(counts.get(&day(2024, 9, 3)), Some(&2));
    }

    #[test]
    fn render_marks_busy_days() {
        let mut counts = BTreeMap::new();
        counts.insert(day(2024, 9, 3), 2);
        let text = render_calendar(2024, 9, &counts).unwrap();
        assert!(text.contains("September 2024"));
        assert!(text.contains(" 3(2)"));
        assert!(text.ends_with("2 scheduled in September 2024\n"));
    }
}
