use crate::cli::args::CliArgs;

pub fn validate(args: &CliArgs) -> Result<(), String> {
    if let Some(page) = args.page {
        if page == 0 {
            return Err("invalid page, expected positive integer".to_string());
        }
    }
    if let Some(per_page) = args.per_page {
        if per_page == 0 {
            return Err("invalid per-page, expected positive integer".to_string());
        }
    }
    if let Some(window) = args.window {
        if window == 0 {
            return Err("invalid window, expected positive integer".to_string());
        }
    }
    if let Some(raw) = args.from.as_deref() {
        crate::utils::parse_date(raw).map_err(|e| format!("invalid --from '{raw}': {e}"))?;
    }
    if let Some(raw) = args.to.as_deref() {
        crate::utils::parse_date(raw).map_err(|e| format!("invalid --to '{raw}': {e}"))?;
    }
    if let Some(raw) = args.calendar.as_deref() {
        crate::utils::parse_month(raw).map_err(|e| format!("invalid --calendar '{raw}': {e}"))?;
    }
    if let Some(raw) = args.columns.as_deref() {
        crate::utils::parse_columns_csv(raw)
            .map_err(|e| format!("invalid --columns '{raw}': {e}"))?;
    }
    if let Some(raw) = args.resource.as_deref() {
        if crate::record::Resource::parse(raw).is_none() {
            return Err(format!("unknown --resource '{raw}'"));
        }
    }
    if let Some(raw) = args.output_format.as_deref() {
        if crate::output::OutputFormat::parse(raw).is_none() {
            return Err(format!("unknown --output-format '{raw}'"));
        }
    }
    if args.token.is_some() && args.logout {
        return Err("use either --token or --logout, not both".to_string());
    }
    if args.input.is_some() && !args.url.is_empty() {
        return Err("use either --input or --url, not both".to_string());
    }
    Ok(())
}
