use std::collections::HashSet;

use chrono::NaiveDate;

pub fn parse_date(value: &str) -> Result<NaiveDate, String> {
    let trimmed = value.trim();
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .map_err(|_| format!("invalid date '{trimmed}', expected YYYY-MM-DD"))
}

pub fn parse_month(value: &str) -> Result<(i32, u32), String> {
    let trimmed = value.trim();
    let (year, month) = trimmed
        .split_once('-')
        .ok_or_else(|| "expected format YYYY-MM".to_string())?;
    let year: i32 = year
        .trim()
        .parse()
        .map_err(|_| "invalid year".to_string())?;
    let month: u32 = month
        .trim()
        .parse()
        .map_err(|_| "invalid month".to_string())?;
    if !(1..=12).contains(&month) {
        return Err("month must be between 1 and 12".to_string());
    }
    Ok((year, month))
}

pub fn parse_columns_csv(value: &str) -> Result<Vec<String>, String> {
    let raw = value.trim();
    if raw.is_empty() {
        return Err("column list is empty".to_string());
    }
    let mut out: Vec<String> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    for part in raw.split(',') {
        let item = part.trim();
        if item.is_empty() {
            continue;
        }
        if seen.insert(item.to_string()) {
            out.push(item.to_string());
        }
    }
    if out.is_empty() {
        return Err("column list is empty".to_string());
    }
    Ok(out)
}

pub fn parse_category_csv(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}
