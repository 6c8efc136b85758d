use callgrid::query::{filter_and_paginate, CategoryMatch, Query};
use callgrid::record::{parse_records, Resource};
use chrono::NaiveDate;
use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    let body = r#"{"call_logs": [
        {"id": 1, "assistant_id": "a-7", "phone_number": "+15550100", "status": "completed", "created_at": "2024-05-01T10:00:00Z"},
        {"id": 2, "assistant_id": "a-7", "phone_number": "+15550101", "status": "no-answer", "created_at": "2024-05-03T12:30:00Z"},
        {"id": 3, "assistant_id": "a-9", "phone_number": "+15550102", "status": "completed", "created_at": "2024-05-04T09:15:00Z"}
    ]}"#;
    let calls = parse_records(body, Resource::CallLogs)?;

    let from = NaiveDate::from_ymd_opt(2024, 5, 1).ok_or("bad date")?;
    let query = Query::new()
        .with_date_field(Resource::CallLogs.date_field())
        .with_from(from)
        .with_exact_match(Resource::CallLogs.match_field(), "a-7")
        .with_predicate(CategoryMatch::new("status", ["completed"]))
        .with_per_page(25);

    let page = filter_and_paginate(&calls, &query)?;
    println!("Matches: {}", page.total);
    println!("Pages:   {:?}", page.page_numbers);
    for call in page.items {
        println!("{} {}", call["id"], call["phone_number"]);
    }

    Ok(())
}
