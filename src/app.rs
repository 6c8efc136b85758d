use std::collections::HashMap;
use std::io::Read;
use std::path::PathBuf;
use std::time::Duration;

use clap::{error::ErrorKind, CommandFactory, Parser};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::calendar;
use crate::cli::args::CliArgs;
use crate::cli::validation;
use crate::client;
use crate::config::{self, ConfigFile};
use crate::output::{self, OutputFormat};
use crate::query::{self, CategoryMatch, DateRange, Query};
use crate::record::{self, Record, Resource};
use crate::session::SessionContext;

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "callgrid=debug",
        _ => "callgrid=trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn format_kv_line(label: &str, value: &str) {
    eprintln!(
        "{} {:<10}{} {}",
        "::".bold().blue(),
        label,
        ":".bold().blue(),
        value
    );
}

fn render_custom_help() -> String {
    let cmd = CliArgs::command();
    let mut out = String::new();

    out.push_str(cmd.get_name());
    if let Some(version) = cmd.get_version() {
        out.push(' ');
        out.push_str(version);
    }
    out.push('\n');
    if let Some(long_about) = cmd.get_long_about().or_else(|| cmd.get_about()) {
        out.push('\n');
        out.push_str(&long_about.to_string());
        out.push('\n');
    }
    out.push_str(&format!("\nUsage: {} [OPTIONS]\n\n", cmd.get_name()));

    let mut sections: Vec<(String, Vec<&clap::Arg>)> = Vec::new();
    let mut section_idx: HashMap<String, usize> = HashMap::new();
    for arg in cmd.get_arguments().filter(|a| !a.is_hide_set()) {
        let heading = arg.get_help_heading().unwrap_or("Options").to_string();
        let idx = *section_idx.entry(heading.clone()).or_insert_with(|| {
            sections.push((heading, Vec::new()));
            sections.len() - 1
        });
        sections[idx].1.push(arg);
    }

    for (heading, args) in sections {
        out.push_str(&format!("{heading}:\n"));
        for arg in args {
            let mut flags: Vec<String> = Vec::new();
            if let Some(short) = arg.get_short() {
                flags.push(format!("-{short}"));
            }
            if let Some(long) = arg.get_long() {
                flags.push(format!("--{long}"));
            }
            for alias in arg.get_visible_aliases().unwrap_or_default() {
                let rendered = format!("--{alias}");
                if !flags.contains(&rendered) {
                    flags.push(rendered);
                }
            }
            let mut line = flags.join(", ");
            if arg.get_action().takes_values() {
                let value_name = arg
                    .get_value_names()
                    .and_then(|names| names.first())
                    .map(|name| name.as_str())
                    .unwrap_or("VALUE");
                line.push_str(&format!(" <{value_name}>"));
            }
            out.push_str(&format!("  {line}\n"));
            if let Some(help) = arg.get_help() {
                let help = help.to_string();
                if !help.trim().is_empty() {
                    out.push_str(&format!("          {}\n", help.trim()));
                }
            }
        }
        out.push('\n');
    }

    out
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Source {
    File(String),
    Urls(Vec<String>),
    Missing,
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum SessionAction {
    Keep,
    Store(String),
    Logout,
}

#[derive(Clone, Debug)]
struct RunConfig {
    source: Source,
    resource: Resource,
    search: String,
    page: usize,
    per_page: usize,
    window: usize,
    range: DateRange,
    date_field: String,
    match_field: String,
    match_value: Option<String>,
    category_field: Option<String>,
    categories: Vec<String>,
    columns: Vec<String>,
    calendar: Option<(i32, u32)>,
    output: Option<String>,
    output_format: Option<OutputFormat>,
    no_color: bool,
    session_path: Option<PathBuf>,
    session_action: SessionAction,
    timeout: u64,
    proxy: Option<String>,
}

impl RunConfig {
    fn query(&self) -> Query {
        let mut query = Query {
            search: self.search.clone(),
            page: self.page,
            per_page: self.per_page,
            window: self.window,
            range: self.range,
            date_field: self.date_field.clone(),
            ..Query::default()
        };
        if let Some(value) = self.match_value.as_ref() {
            query = query.with_exact_match(self.match_field.clone(), value.clone());
        }
        if let Some(field) = self.category_field.as_ref() {
            if !self.categories.is_empty() {
                query = query.with_predicate(CategoryMatch::new(field.clone(), &self.categories));
            }
        }
        query
    }
}

fn build_run_config(args: CliArgs, cfg: ConfigFile) -> Result<RunConfig, String> {
    validation::validate(&args)?;

    let no_color = if args.color {
        false
    } else {
        args.no_color || cfg.no_color.unwrap_or(false)
    };

    let resource = match args.resource.or(cfg.resource) {
        Some(raw) => Resource::parse(&raw).ok_or_else(|| format!("unknown resource '{raw}'"))?,
        None => Resource::Generic,
    };

    let search = args.search.or(cfg.search).unwrap_or_default();
    let page = args.page.or(cfg.page).unwrap_or(1);
    if page == 0 {
        return Err("invalid page, expected positive integer".to_string());
    }
    let per_page = args
        .per_page
        .or(cfg.per_page)
        .unwrap_or(query::DEFAULT_PER_PAGE);
    if per_page == 0 {
        return Err("invalid per-page, expected positive integer".to_string());
    }
    let window = args.window.or(cfg.window).unwrap_or(query::DEFAULT_WINDOW);
    if window == 0 {
        return Err("invalid window, expected positive integer".to_string());
    }

    let from = match args.from.or(cfg.from) {
        Some(raw) => Some(
            crate::utils::parse_date(&raw).map_err(|e| format!("invalid from '{raw}': {e}"))?,
        ),
        None => None,
    };
    let to = match args.to.or(cfg.to) {
        Some(raw) => {
            Some(crate::utils::parse_date(&raw).map_err(|e| format!("invalid to '{raw}': {e}"))?)
        }
        None => None,
    };
    let range = DateRange::new(from, to).map_err(|e| e.to_string())?;

    let date_field = args
        .date_field
        .or(cfg.date_field)
        .unwrap_or_else(|| resource.date_field().to_string());
    let match_field = args
        .match_field
        .or(cfg.match_field)
        .unwrap_or_else(|| resource.match_field().to_string());
    let match_value = args
        .match_value
        .or(cfg.match_value)
        .filter(|v| !v.is_empty());

    let category_field = args.category_field.or(cfg.category_field);
    let categories = args
        .category
        .or(cfg.category)
        .map(|raw| crate::utils::parse_category_csv(&raw))
        .unwrap_or_default();
    if !categories.is_empty() && category_field.is_none() {
        return Err("--category requires --category-field".to_string());
    }

    let columns = match args.columns.or(cfg.columns) {
        Some(raw) => crate::utils::parse_columns_csv(&raw)
            .map_err(|e| format!("invalid columns '{raw}': {e}"))?,
        None => resource
            .default_columns()
            .iter()
            .map(|c| c.to_string())
            .collect(),
    };

    let calendar = match args.calendar.as_deref() {
        Some(raw) => Some(
            crate::utils::parse_month(raw).map_err(|e| format!("invalid calendar '{raw}': {e}"))?,
        ),
        None => None,
    };

    let output = args
        .output
        .or(cfg.output)
        .map(|p| config::expand_tilde_string(&p));
    let output_format = match args.output_format.or(cfg.output_format) {
        Some(raw) => Some(
            OutputFormat::parse(&raw).ok_or_else(|| format!("unknown output format '{raw}'"))?,
        ),
        None => None,
    };

    let input = args.input.or(cfg.input);
    let urls = if args.url.is_empty() {
        cfg.urls.unwrap_or_default()
    } else {
        args.url
    };
    let urls: Vec<String> = urls
        .into_iter()
        .map(|u| u.trim().to_string())
        .filter(|u| !u.is_empty())
        .collect();
    let source = match (input, urls.is_empty()) {
        (Some(_), false) => return Err("use either input or urls, not both".to_string()),
        (Some(path), true) if path.trim() == "-" => Source::File("-".to_string()),
        (Some(path), true) => Source::File(config::expand_tilde_string(path.trim())),
        (None, false) => Source::Urls(urls),
        (None, true) => Source::Missing,
    };

    let session_path = args
        .session_file
        .or(cfg.session_file)
        .map(|p| config::expand_tilde(&p))
        .or_else(config::default_session_path);
    let session_action = match (args.token, args.logout) {
        (Some(token), _) => SessionAction::Store(token),
        (None, true) => SessionAction::Logout,
        (None, false) => SessionAction::Keep,
    };

    let timeout = args.timeout.or(cfg.timeout).unwrap_or(15);
    let proxy = args.proxy.or(cfg.proxy).filter(|p| !p.trim().is_empty());

    Ok(RunConfig {
        source,
        resource,
        search,
        page,
        per_page,
        window,
        range,
        date_field,
        match_field,
        match_value,
        category_field,
        categories,
        columns,
        calendar,
        output,
        output_format,
        no_color,
        session_path,
        session_action,
        timeout,
        proxy,
    })
}

fn open_session(run: &RunConfig) -> Result<SessionContext, String> {
    let mut session = match run.session_path.as_ref() {
        Some(path) => SessionContext::load(path).map_err(|e| e.to_string())?,
        None => SessionContext::in_memory(),
    };
    match &run.session_action {
        SessionAction::Keep => {}
        SessionAction::Store(token) => {
            session.set_token(token.clone());
            session.save().map_err(|e| e.to_string())?;
            format_kv_line("Session", "token stored");
        }
        SessionAction::Logout => {
            session.clear();
            session.save().map_err(|e| e.to_string())?;
            format_kv_line("Session", "cleared");
        }
    }
    Ok(session)
}

fn fetch_spinner(count: usize) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_draw_target(ProgressDrawTarget::stderr());
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg} [{elapsed}]") {
        pb.set_style(style);
    }
    pb.set_message(format!("fetching {count} endpoint(s)"));
    pb.enable_steady_tick(Duration::from_millis(120));
    pb
}

fn load_records(run: &RunConfig, session: &mut SessionContext) -> Result<Vec<Record>, String> {
    match &run.source {
        Source::File(path) if path == "-" => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .map_err(|e| format!("failed to read stdin: {e}"))?;
            record::parse_records(&text, run.resource).map_err(|e| e.to_string())
        }
        Source::File(path) => record::load_records_file(std::path::Path::new(path), run.resource)
            .map_err(|e| e.to_string()),
        Source::Urls(urls) => {
            let rt = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .map_err(|e| format!("failed to build runtime: {e}"))?;
            let client = client::build_client(run.timeout, run.proxy.as_deref())
                .map_err(|e| e.to_string())?;

            let pb = fetch_spinner(urls.len());
            let fetched = rt.block_on(client::fetch_all(&client, urls, session, run.resource));
            pb.finish_and_clear();

            match fetched {
                Ok(records) => Ok(records),
                Err(e) if e.is_unauthorized() => {
                    session.clear();
                    session.save().map_err(|e| e.to_string())?;
                    Err(e.to_string())
                }
                Err(e) => Err(e.to_string()),
            }
        }
        Source::Missing => Err("no records source, use --input or --url".to_string()),
    }
}

fn write_or_print(run: &RunConfig, rendered: Vec<u8>) -> Result<(), String> {
    match run.output.as_ref() {
        Some(path) => {
            std::fs::write(path, &rendered)
                .map_err(|e| format!("failed to write output file '{path}': {e}"))?;
            format_kv_line("Output", path);
            Ok(())
        }
        None => {
            print!("{}", String::from_utf8_lossy(&rendered));
            Ok(())
        }
    }
}

fn run(run: RunConfig) -> Result<(), String> {
    if run.no_color {
        colored::control::set_override(false);
    }

    let mut session = open_session(&run)?;
    if run.source == Source::Missing && run.session_action != SessionAction::Keep {
        return Ok(());
    }

    let records = load_records(&run, &mut session)?;
    info!(count = records.len(), resource = run.resource.label(), "records loaded");

    let query = run.query();
    format_kv_line("Resource", run.resource.label());
    format_kv_line("Records", &records.len().to_string());
    let filters = query.describe();
    if !filters.is_empty() {
        format_kv_line("Filters", &filters.join(" "));
    }

    if let Some((year, month)) = run.calendar {
        let matched = query::filter(&records, &query).map_err(|e| e.to_string())?;
        let counts = calendar::bucket_by_day(matched.iter().copied(), &run.date_field, year, month);
        let text = calendar::render_calendar(year, month, &counts).map_err(|e| e.to_string())?;
        return write_or_print(&run, text.into_bytes());
    }

    let page = query::filter_and_paginate(&records, &query).map_err(|e| e.to_string())?;
    if page.page != run.page {
        format_kv_line(
            "Page",
            &format!("{} requested, showing {}", run.page, page.page)
                .yellow()
                .to_string(),
        );
    }
    debug!(page = page.page, pages_count = page.pages_count, "rendering page");

    let columns = output::resolve_columns(&page, &run.columns);
    let format = run
        .output_format
        .or_else(|| run.output.as_deref().and_then(output::infer_format_from_path))
        .unwrap_or(OutputFormat::Text);
    write_or_print(&run, output::render(format, &page, &columns))
}

pub fn run_cli() -> Result<(), String> {
    let args = match CliArgs::try_parse() {
        Ok(args) => args,
        Err(e) => match e.kind() {
            ErrorKind::DisplayHelp => {
                print!("{}", render_custom_help());
                return Ok(());
            }
            ErrorKind::DisplayVersion => {
                let cmd = CliArgs::command();
                print!("{}", cmd.render_version());
                return Ok(());
            }
            _ => return Err(e.to_string()),
        },
    };

    init_tracing(args.verbose);

    if args.init_config {
        let path = args
            .config
            .as_deref()
            .map(config::expand_tilde)
            .or_else(config::default_config_path)
            .ok_or_else(|| "cannot determine config path".to_string())?;
        let created = config::ensure_default_config_file(&path)?;
        let state = if created { "written" } else { "already exists" };
        format_kv_line("Config", &format!("{} ({state})", path.display()));
        return Ok(());
    }

    let cfg = match args.config.as_deref().map(config::expand_tilde) {
        Some(path) => config::load_config(&path, false)?,
        None => match config::default_config_path() {
            Some(path) => config::load_config(&path, true)?,
            None => ConfigFile::default(),
        },
    };

    let run_config = build_run_config(args, cfg)?;
    run(run_config)
}
