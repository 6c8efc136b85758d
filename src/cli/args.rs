use clap::{ArgAction, Parser};

#[derive(Parser, Debug, Clone)]
#[command(
    name = "callgrid",
    version,
    about = "search, filter and page voice-AI dashboard records",
    long_about = "callgrid applies the dashboard's list-view pipeline (exact-match filter, search, date range, pagination) to leads, call logs, assistants and the other list screens.\n\nExamples:\n  callgrid -i leads.json -r leads -q bob\n  callgrid -u https://api.example.com/api/call-logs -r call-logs --from 2024-01-01 --to 2024-01-31 -p 2\n  callgrid -i appointments.json -r appointments --calendar 2024-09\n\nTip: Use --config to persist defaults and --token once to store the backend token."
)]
pub struct CliArgs {
    #[arg(
        short = 'v',
        long = "vb",
        visible_alias = "verbose",
        action = ArgAction::Count,
        help_heading = "Output",
        help = "Increase log verbosity (-v, -vv)."
    )]
    pub verbose: u8,

    #[arg(
        long = "clr",
        visible_alias = "color",
        help_heading = "Output",
        help = "Enable colored output (overrides --no-color)."
    )]
    pub color: bool,

    #[arg(
        long = "nc",
        visible_alias = "no-color",
        help_heading = "Output",
        help = "Disable colored output."
    )]
    pub no_color: bool,

    #[arg(
        short = 'i',
        long = "in",
        visible_alias = "input",
        value_name = "FILE",
        help_heading = "Input",
        help = "Load records from a JSON file (array or {\"data\": [...]} envelope)."
    )]
    pub input: Option<String>,

    #[arg(
        short = 'u',
        long = "u",
        visible_alias = "url",
        value_name = "URL",
        action = ArgAction::Append,
        help_heading = "Input",
        help = "Fetch records from a backend list endpoint (repeatable)."
    )]
    pub url: Vec<String>,

    #[arg(
        short = 'r',
        long = "res",
        visible_alias = "resource",
        value_name = "KIND",
        help_heading = "Input",
        help = "List screen the records belong to (leads, call-logs, assistants, phone-numbers, files, users, scheduled-calls, appointments, generic)."
    )]
    pub resource: Option<String>,

    #[arg(
        short = 'C',
        long = "cfg",
        visible_alias = "config",
        value_name = "FILE",
        help_heading = "Input",
        help = "Path to config file (defaults to ~/.callgrid/config.yml when present)."
    )]
    pub config: Option<String>,

    #[arg(
        long = "init-config",
        help_heading = "Input",
        help = "Write a commented default config file and exit."
    )]
    pub init_config: bool,

    #[arg(
        short = 'q',
        long = "q",
        visible_alias = "search",
        value_name = "TEXT",
        help_heading = "Query",
        help = "Case-insensitive substring search over text and number fields."
    )]
    pub search: Option<String>,

    #[arg(
        short = 'p',
        long = "pg",
        visible_alias = "page",
        value_name = "N",
        help_heading = "Query",
        help = "Page to show (1-based; clamped to the last page)."
    )]
    pub page: Option<usize>,

    #[arg(
        short = 'n',
        long = "pp",
        visible_alias = "per-page",
        value_name = "N",
        help_heading = "Query",
        help = "Records per page."
    )]
    pub per_page: Option<usize>,

    #[arg(
        short = 'w',
        long = "pw",
        visible_alias = "window",
        value_name = "N",
        help_heading = "Query",
        help = "How many page numbers the pager shows."
    )]
    pub window: Option<usize>,

    #[arg(
        long = "from",
        value_name = "YYYY-MM-DD",
        help_heading = "Query",
        help = "Keep records dated on or after this day (UTC)."
    )]
    pub from: Option<String>,

    #[arg(
        long = "to",
        value_name = "YYYY-MM-DD",
        help_heading = "Query",
        help = "Keep records dated on or before this day (UTC)."
    )]
    pub to: Option<String>,

    #[arg(
        long = "df",
        visible_alias = "date-field",
        value_name = "FIELD",
        help_heading = "Query",
        help = "Field holding the record date (defaults per resource)."
    )]
    pub date_field: Option<String>,

    #[arg(
        long = "mf",
        visible_alias = "match-field",
        value_name = "FIELD",
        help_heading = "Query",
        help = "Field compared by --match-value (defaults per resource)."
    )]
    pub match_field: Option<String>,

    #[arg(
        short = 'm',
        long = "mv",
        visible_alias = "match-value",
        value_name = "VALUE",
        help_heading = "Query",
        help = "Keep only records whose match field equals this value exactly."
    )]
    pub match_value: Option<String>,

    #[arg(
        long = "cf",
        visible_alias = "category-field",
        value_name = "FIELD",
        help_heading = "Query",
        help = "Field used by --category."
    )]
    pub category_field: Option<String>,

    #[arg(
        short = 'k',
        long = "cat",
        visible_alias = "category",
        value_name = "LIST",
        help_heading = "Query",
        help = "Keep records whose category field is one of these (comma-separated; 'all' disables)."
    )]
    pub category: Option<String>,

    #[arg(
        long = "cols",
        visible_alias = "columns",
        value_name = "LIST",
        help_heading = "Output",
        help = "Comma-separated columns to show (defaults per resource)."
    )]
    pub columns: Option<String>,

    #[arg(
        long = "cal",
        visible_alias = "calendar",
        value_name = "YYYY-MM",
        help_heading = "Output",
        help = "Render a month calendar with per-day record counts instead of a table."
    )]
    pub calendar: Option<String>,

    #[arg(
        short = 'o',
        long = "out",
        visible_alias = "output",
        value_name = "FILE",
        help_heading = "Output",
        help = "Write the page to a file."
    )]
    pub output: Option<String>,

    #[arg(
        short = 'f',
        long = "of",
        visible_alias = "output-format",
        value_name = "FORMAT",
        help_heading = "Output",
        help = "Output format (text, json, xml, csv)."
    )]
    pub output_format: Option<String>,

    #[arg(
        short = 't',
        long = "tok",
        visible_alias = "token",
        value_name = "TOKEN",
        help_heading = "Session",
        help = "Store a backend bearer token in the session file."
    )]
    pub token: Option<String>,

    #[arg(
        long = "logout",
        help_heading = "Session",
        help = "Clear the stored session."
    )]
    pub logout: bool,

    #[arg(
        long = "sf",
        visible_alias = "session-file",
        value_name = "FILE",
        help_heading = "Session",
        help = "Session file path (defaults to ~/.callgrid/session.json)."
    )]
    pub session_file: Option<String>,

    #[arg(
        short = 'T',
        long = "to-secs",
        visible_alias = "timeout",
        value_name = "SECONDS",
        help_heading = "Session",
        help = "Per-request timeout in seconds."
    )]
    pub timeout: Option<u64>,

    #[arg(
        long = "px",
        visible_alias = "proxy",
        value_name = "URL",
        help_heading = "Session",
        help = "HTTP proxy URL (e.g. http://127.0.0.1:8080)."
    )]
    pub proxy: Option<String>,
}
