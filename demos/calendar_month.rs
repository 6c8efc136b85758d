use callgrid::calendar::{bucket_by_day, render_calendar};
use callgrid::record::{parse_records, Resource};
use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    let appointments = parse_records(
        r#"[
            {"title": "Demo call", "date": "2024-09-03"},
            {"title": "Follow-up", "date": "2024-09-03T15:00:00Z"},
            {"title": "Onboarding", "date": "2024-09-17"}
        ]"#,
        Resource::Appointments,
    )?;

    let counts = bucket_by_day(&appointments, Resource::Appointments.date_field(), 2024, 9);
    print!("{}", render_calendar(2024, 9, &counts)?);
    Ok(())
}
