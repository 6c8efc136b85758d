use chrono::NaiveDate;
use serde_json::json;

use crate::query::{filter_and_paginate, page_window, CategoryMatch, Query};
use crate::record::{parse_records, Record, Resource};

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn leads(n: usize) -> Vec<Record> {
    (1..=n)
        .map(|i| {
            json!({
                "id": i,
                "name": format!("Lead {i}"),
                "phone": format!("+1555000{i:04}"),
                "add_date": format!("2024-01-{:02}", (i % 28) + 1),
                "tags": ["imported"],
                "opted_in": true
            })
            .as_object()
            .cloned()
            .unwrap()
        })
        .collect()
}

#[test]
fn identity_modulo_paging() {
    let items = leads(37);
    for per_page in [1, 5, 10, 37, 50] {
        let page = filter_and_paginate(&items, &Query::new().with_per_page(per_page)).unwrap();
        assert_eq!(page.pages_count, 37usize.div_ceil(per_page));
        let expected: Vec<&Record> = items.iter().take(per_page).collect();
        assert_eq!(page.items, expected);
    }
}

#[test]
fn whitespace_padded_search_matches_mixed_case() {
    let items = parse_records(
        r#"[{"name":"bob smith"},{"name":"Alice"},{"name":"BOBBY"}]"#,
        Resource::Leads,
    )
    .unwrap();
    let page = filter_and_paginate(&items, &Query::new().with_search(" Bob ")).unwrap();
    assert_eq!(page.total, 2);
}

#[test]
fn january_leads_scenario() {
    let items = parse_records(
        r#"[{"name":"Alice","add_date":"2024-01-05"},{"name":"Bob","add_date":"2024-02-10"}]"#,
        Resource::Leads,
    )
    .unwrap();
    let query = Query::new()
        .with_from(day(2024, 1, 1))
        .with_to(day(2024, 1, 31))
        .with_per_page(10);
    let page = filter_and_paginate(&items, &query).unwrap();
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].get("name"), Some(&json!("Alice")));
    assert_eq!(page.pages_count, 1);
}

#[test]
fn twenty_three_items_third_page() {
    let items = leads(23);
    let page = filter_and_paginate(&items, &Query::new().with_page(3).with_per_page(10)).unwrap();
    assert_eq!(page.items.len(), 3);
    assert_eq!(page.pages_count, 3);
    assert_eq!(page.page_numbers, vec![1, 2, 3]);
}

#[test]
fn exact_match_before_search_and_dates() {
    let items = parse_records(
        r#"[
            {"ghl_id":"X1","name":"one","add_date":"2024-01-01"},
            {"ghl_id":"X2","name":"two","add_date":"2024-01-01"},
            {"ghl_id":"X1","name":"three","add_date":"2023-01-01"}
        ]"#,
        Resource::Generic,
    )
    .unwrap();
    let only_id = Query::new().with_exact_match("ghl_id", "X1");
    assert_eq!(filter_and_paginate(&items, &only_id).unwrap().total, 2);

    let with_dates = Query::new()
        .with_exact_match("ghl_id", "X1")
        .with_from(day(2024, 1, 1));
    let page = filter_and_paginate(&items, &with_dates).unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].get("name"), Some(&json!("one")));
}

#[test]
fn search_ignores_booleans_and_lists() {
    let items = leads(3);
    let page = filter_and_paginate(&items, &Query::new().with_search("imported")).unwrap();
    assert_eq!(page.total, 0);
    let page = filter_and_paginate(&items, &Query::new().with_search("true")).unwrap();
    assert_eq!(page.total, 0);
}

#[test]
fn search_can_hit_internal_ids() {
    let items = leads(12);
    let page = filter_and_paginate(&items, &Query::new().with_search("12")).unwrap();
    // lead 12 by its id, name and phone; lead 11 only through add_date 2024-01-12
    assert_eq!(page.total, 2);
}

#[test]
fn window_invariants_hold_across_sizes() {
    for window in 1..=9 {
        for pages_count in 0..=20 {
            for current in 1..=pages_count.max(1) {
                let pages = page_window(current, pages_count, window);
                assert!(pages.len() <= window);
                assert!(pages.len() <= pages_count);
                assert!(pages.iter().all(|p| *p >= 1 && *p <= pages_count));
                assert!(pages.windows(2).all(|w| w[1] == w[0] + 1));
                if pages_count >= window {
                    assert_eq!(pages.len(), window);
                }
                if pages_count > 0 {
                    assert!(pages.contains(&current));
                }
            }
        }
    }
}

#[test]
fn category_filter_is_just_another_predicate() {
    let items = parse_records(
        r#"[
            {"id":1,"status":"completed","created_at":"2024-05-01T10:00:00Z"},
            {"id":2,"status":"no-answer","created_at":"2024-05-02T10:00:00Z"},
            {"id":3,"status":"completed","created_at":"2024-06-01T10:00:00Z"}
        ]"#,
        Resource::CallLogs,
    )
    .unwrap();
    let query = Query::new()
        .with_date_field(Resource::CallLogs.date_field())
        .with_to(day(2024, 5, 31))
        .with_predicate(CategoryMatch::new("status", ["completed"]));
    let page = filter_and_paginate(&items, &query).unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].get("id"), Some(&json!(1)));
}
