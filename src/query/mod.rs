//! Search, date-range filtering and pagination over in-memory records.
//!
//! Every list screen runs the same pipeline on the array it fetched:
//!
//! 1. exact-match filter on an identifier field, when one is given;
//! 2. substring search AND date range, when either is active;
//! 3. any extra predicates (category filters and the like);
//! 4. slice out the requested page and compute the pager window.
//!
//! The functions here are pure; the same input always yields the same page.

pub mod date_range;
pub mod pager;
pub mod predicate;
pub mod search;

use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

pub use date_range::DateRange;
pub use pager::page_window;
pub use predicate::{CategoryMatch, DateRangeMatch, ExactMatch, RecordPredicate, SearchMatch};

use crate::record::Fields;

pub const DEFAULT_PER_PAGE: usize = 10;
pub const DEFAULT_WINDOW: usize = 7;
pub const DEFAULT_DATE_FIELD: &str = "add_date";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueryError {
    #[error("items per page must be a positive integer")]
    ZeroPerPage,

    #[error("page window size must be a positive integer")]
    ZeroWindow,

    #[error("date range is inverted: {from} is after {to}")]
    InvertedRange { from: NaiveDate, to: NaiveDate },
}

#[derive(Debug)]
pub struct Query {
    pub search: String,
    /// 1-based; clamped to the available pages when the query runs.
    pub page: usize,
    pub per_page: usize,
    pub window: usize,
    pub range: DateRange,
    pub date_field: String,
    pub exact: Option<ExactMatch>,
    pub predicates: Vec<Box<dyn RecordPredicate>>,
}

impl Default for Query {
    fn default() -> Self {
        Self {
            search: String::new(),
            page: 1,
            per_page: DEFAULT_PER_PAGE,
            window: DEFAULT_WINDOW,
            range: DateRange::default(),
            date_field: DEFAULT_DATE_FIELD.to_string(),
            exact: None,
            predicates: Vec::new(),
        }
    }
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = search.into();
        self
    }

    pub fn with_page(mut self, page: usize) -> Self {
        self.page = page;
        self
    }

    pub fn with_per_page(mut self, per_page: usize) -> Self {
        self.per_page = per_page;
        self
    }

    pub fn with_window(mut self, window: usize) -> Self {
        self.window = window;
        self
    }

    pub fn with_from(mut self, from: NaiveDate) -> Self {
        self.range.from = Some(from);
        self
    }

    pub fn with_to(mut self, to: NaiveDate) -> Self {
        self.range.to = Some(to);
        self
    }

    pub fn with_date_field(mut self, field: impl Into<String>) -> Self {
        self.date_field = field.into();
        self
    }

    pub fn with_exact_match(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.exact = Some(ExactMatch::new(field, value));
        self
    }

    pub fn with_predicate<P: RecordPredicate + 'static>(mut self, predicate: P) -> Self {
        self.predicates.push(Box::new(predicate));
        self
    }

    pub fn validate(&self) -> Result<(), QueryError> {
        if self.per_page == 0 {
            return Err(QueryError::ZeroPerPage);
        }
        if self.window == 0 {
            return Err(QueryError::ZeroWindow);
        }
        self.range.validate()
    }

    /// Predicates in the order the pipeline applies them, for summaries.
    pub fn describe(&self) -> Vec<String> {
        let mut out = Vec::new();
        if let Some(exact) = self.exact.as_ref() {
            out.push(exact.describe());
        }
        if !search::normalize(&self.search).is_empty() {
            out.push(SearchMatch::new(&self.search).describe());
        }
        if self.range.is_bounded() {
            out.push(DateRangeMatch::new(self.date_field.clone(), self.range).describe());
        }
        out.extend(self.predicates.iter().map(|p| p.describe()));
        out
    }
}

/// One rendered page of a filtered list.
#[derive(Debug, Serialize)]
pub struct Page<'a, R> {
    pub items: Vec<&'a R>,
    /// Matches across all pages.
    pub total: usize,
    pub pages_count: usize,
    /// The page actually shown after clamping.
    pub page: usize,
    pub page_numbers: Vec<usize>,
}

impl<R> Page<'_, R> {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.pages_count
    }
}

fn clamp_page(page: usize, pages_count: usize) -> usize {
    page.clamp(1, pages_count.max(1))
}

/// Every record that passes the query's filters, in input order. Paging
/// settings are ignored.
pub fn filter<'a, R: Fields>(items: &'a [R], query: &Query) -> Result<Vec<&'a R>, QueryError> {
    query.range.validate()?;
    Ok(apply_filters(items, query))
}

fn apply_filters<'a, R: Fields>(items: &'a [R], query: &Query) -> Vec<&'a R> {
    let needle = search::normalize(&query.search);
    let search_or_dates = !needle.is_empty() || query.range.is_bounded();

    items
        .iter()
        .filter(|r| query.exact.as_ref().map_or(true, |m| m.matches(*r)))
        .filter(|r| {
            !search_or_dates
                || (search::matches(*r, &needle)
                    && date_range::record_in_range(*r, &query.date_field, &query.range))
        })
        .filter(|r| query.predicates.iter().all(|p| p.matches(*r)))
        .collect()
}

/// Filters `items` with `query` and returns the requested page.
///
/// Input order is preserved. A page past the end (the list shrank after a
/// delete, say) is pulled back to the last page instead of coming back empty.
pub fn filter_and_paginate<'a, R: Fields>(
    items: &'a [R],
    query: &Query,
) -> Result<Page<'a, R>, QueryError> {
    query.validate()?;
    let filtered = apply_filters(items, query);

    let total = filtered.len();
    let pages_count = total.div_ceil(query.per_page);
    let page = clamp_page(query.page, pages_count);
    if page != query.page {
        debug!(requested = query.page, page, pages_count, "page clamped");
    }

    let start = (page - 1) * query.per_page;
    let items: Vec<&R> = filtered
        .into_iter()
        .skip(start)
        .take(query.per_page)
        .collect();
    let page_numbers = pager::page_window(page, pages_count, query.window);

    debug!(shown = items.len(), total, pages_count, page, "filtered records");

    Ok(Page {
        items,
        total,
        pages_count,
        page,
        page_numbers,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Record;
    use serde_json::json;

    fn records(values: serde_json::Value) -> Vec<Record> {
        values
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_object().cloned().unwrap())
            .collect()
    }

    fn numbered(n: usize) -> Vec<Record> {
        (1..=n)
            .map(|i| json!({"id": i, "name": format!("lead {i}")}))
            .map(|v| v.as_object().cloned().unwrap())
            .collect()
    }

    fn ids(page: &Page<'_, Record>) -> Vec<u64> {
        page.items
            .iter()
            .map(|r| r.get("id").and_then(|v| v.as_u64()).unwrap())
            .collect()
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn no_filters_is_identity_modulo_paging() {
        let items = numbered(25);
        let page = filter_and_paginate(&items, &Query::new().with_per_page(10)).unwrap();
        assert_eq!(ids(&page), (1..=10).collect::<Vec<_>>());
        assert_eq!(page.pages_count, 3);
        assert_eq!(page.total, 25);
        assert_eq!(page.page_numbers, vec![1, 2, 3]);
    }

    #[test]
    fn last_partial_page() {
        let items = numbered(23);
        let page = filter_and_paginate(&items, &Query::new().with_page(3)).unwrap();
        assert_eq!(page.items.len(), 3);
        assert_eq!(page.pages_count, 3);
        assert!(!page.has_next());
        assert!(page.has_prev());
    }

    #[test]
    fn january_scenario() {
        let items = records(json!([
            {"name": "Alice", "add_date": "2024-01-05"},
            {"name": "Bob", "add_date": "2024-02-10"}
        ]));
        let query = Query::new()
            .with_from(day(2024, 1, 1))
            .with_to(day(2024, 1, 31));
        let page = filter_and_paginate(&items, &query).unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].get("name"), Some(&json!("Alice")));
        assert_eq!(page.pages_count, 1);
    }

    #[test]
    fn exact_match_runs_before_search() {
        let items = records(json!([
            {"id": 1, "external_id": "X1"},
            {"id": 2, "external_id": "X2"},
            {"id": 3, "external_id": "X1"}
        ]));
        let query = Query::new().with_exact_match("external_id", "X1");
        let page = filter_and_paginate(&items, &query).unwrap();
        assert_eq!(ids(&page), vec![1, 3]);

        let narrowed = Query::new()
            .with_exact_match("external_id", "X1")
            .with_search("3");
        let page = filter_and_paginate(&items, &narrowed).unwrap();
        assert_eq!(ids(&page), vec![3]);
    }

    #[test]
    fn date_bound_filters_even_without_search() {
        let items = records(json!([
            {"id": 1, "add_date": "2024-01-05"},
            {"id": 2, "add_date": "2023-06-01"},
            {"id": 3}
        ]));
        let query = Query::new().with_from(day(2024, 1, 1));
        let page = filter_and_paginate(&items, &query).unwrap();
        assert_eq!(ids(&page), vec![1, 3]);
    }

    #[test]
    fn search_and_dates_are_anded() {
        let items = records(json!([
            {"id": 1, "name": "Bob", "add_date": "2024-01-05"},
            {"id": 2, "name": "Bob", "add_date": "2024-03-05"},
            {"id": 3, "name": "Carol", "add_date": "2024-01-07"}
        ]));
        let query = Query::new()
            .with_search("bob")
            .with_to(day(2024, 1, 31));
        let page = filter_and_paginate(&items, &query).unwrap();
        assert_eq!(ids(&page), vec![1]);
    }

    #[test]
    fn custom_date_field() {
        let items = records(json!([
            {"id": 1, "created_at": "2024-05-01T08:00:00Z"},
            {"id": 2, "created_at": "2024-06-01T08:00:00Z"}
        ]));
        let query = Query::new()
            .with_date_field("created_at")
            .with_to(day(2024, 5, 31));
        let page = filter_and_paginate(&items, &query).unwrap();
        assert_eq!(ids(&page), vec![1]);
    }

    #[test]
    fn extra_predicates_are_anded() {
        let items = records(json!([
            {"id": 1, "status": "completed"},
            {"id": 2, "status": "failed"},
            {"id": 3, "status": "Completed"}
        ]));
        let query = Query::new().with_predicate(CategoryMatch::new("status", ["completed"]));
        let page = filter_and_paginate(&items, &query).unwrap();
        assert_eq!(ids(&page), vec![1, 3]);
    }

    #[test]
    fn page_past_the_end_is_clamped() {
        let items = numbered(12);
        let page = filter_and_paginate(&items, &Query::new().with_page(9)).unwrap();
        assert_eq!(page.page, 2);
        assert_eq!(ids(&page), vec![11, 12]);

        let first = filter_and_paginate(&items, &Query::new().with_page(0)).unwrap();
        assert_eq!(first.page, 1);
    }

    #[test]
    fn empty_result_has_no_pages() {
        let items = numbered(5);
        let page = filter_and_paginate(&items, &Query::new().with_search("zzz")).unwrap();
        assert!(page.is_empty());
        assert_eq!(page.pages_count, 0);
        assert_eq!(page.page, 1);
        assert!(page.page_numbers.is_empty());
    }

    #[test]
    fn invalid_queries_are_rejected() {
        let items = numbered(1);
        assert_eq!(
            filter_and_paginate(&items, &Query::new().with_per_page(0)).unwrap_err(),
            QueryError::ZeroPerPage
        );
        assert_eq!(
            filter_and_paginate(&items, &Query::new().with_window(0)).unwrap_err(),
            QueryError::ZeroWindow
        );
        let inverted = Query::new()
            .with_from(day(2024, 2, 1))
            .with_to(day(2024, 1, 1));
        assert!(matches!(
            filter_and_paginate(&items, &inverted),
            Err(QueryError::InvertedRange { .. })
        ));
    }

    #[test]
    fn oversized_window_on_a_single_page() {
        let items = numbered(1);
        let page = filter_and_paginate(&items, &Query::new().with_window(1 << 40)).unwrap();
        assert_eq!(page.page_numbers, vec![1]);
    }

    #[test]
    fn filter_ignores_paging() {
        let items = numbered(30);
        let query = Query::new().with_search("lead 1").with_per_page(0);
        let matched = filter(&items, &query).unwrap();
        // "lead 1" and "lead 10" through "lead 19"
        assert_eq!(matched.len(), 11);
    }

    #[test]
    fn works_over_raw_values() {
        let items = vec![json!({"name": "Alice"}), json!("stray"), json!({"name": "Alfred"})];
        let page = filter_and_paginate(&items, &Query::new().with_search("alf")).unwrap();
        assert_eq!(page.items, vec![&json!({"name": "Alfred"})]);
    }

    #[test]
    fn describe_lists_active_filters() {
        let query = Query::new()
            .with_exact_match("external_id", "X1")
            .with_search("bob")
            .with_from(day(2024, 1, 1));
        assert_eq!(
            query.describe(),
            vec![
                "external_id=X1".to_string(),
                "search~bob".to_string(),
                "add_date:2024-01-01..".to_string()
            ]
        );
    }
}
