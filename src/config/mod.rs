use std::env;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

#[derive(Debug, Default, Deserialize, Serialize, Clone)]
pub struct ConfigFile {
    pub input: Option<String>,
    pub urls: Option<Vec<String>>,
    pub resource: Option<String>,
    pub search: Option<String>,
    pub page: Option<usize>,
    #[serde(alias = "items_per_page")]
    pub per_page: Option<usize>,
    #[serde(alias = "page_window_size")]
    pub window: Option<usize>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub date_field: Option<String>,
    pub match_field: Option<String>,
    pub match_value: Option<String>,
    pub category_field: Option<String>,
    pub category: Option<String>,
    pub columns: Option<String>,
    pub output: Option<String>,
    pub output_format: Option<String>,
    pub no_color: Option<bool>,
    pub session_file: Option<String>,
    pub timeout: Option<u64>,
    pub proxy: Option<String>,
}

fn home_dir() -> Option<PathBuf> {
    env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(|| env::var_os("USERPROFILE").map(PathBuf::from))
        .or_else(|| {
            let drive = env::var_os("HOMEDRIVE")?;
            let path = env::var_os("HOMEPATH")?;
            Some(PathBuf::from(drive).join(path))
        })
}

pub fn config_dir() -> Option<PathBuf> {
    Some(home_dir()?.join(".callgrid"))
}

pub fn default_config_path() -> Option<PathBuf> {
    Some(config_dir()?.join("config.yml"))
}

pub fn default_session_path() -> Option<PathBuf> {
    Some(config_dir()?.join("session.json"))
}

pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/").or_else(|| path.strip_prefix("~\\")) {
        if let Some(home) = home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

pub fn expand_tilde_string(path: &str) -> String {
    expand_tilde(path).to_string_lossy().to_string()
}

pub fn load_config(path: &PathBuf, allow_missing: bool) -> Result<ConfigFile, String> {
    match std::fs::read_to_string(path) {
        Ok(contents) if contents.trim().is_empty() => Ok(ConfigFile::default()),
        Ok(contents) => serde_yaml::from_str::<ConfigFile>(&contents)
            .map_err(|e| format!("failed to parse config '{}': {e}", path.display())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound && allow_missing => {
            Ok(ConfigFile::default())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(format!("config file not found '{}'", path.display()))
        }
        Err(e) => Err(format!("failed to read config '{}': {e}", path.display())),
    }
}

fn default_config_yaml() -> String {
    r#"# callgrid config
#
# Location (default):
#   ~/.callgrid/config.yml

# Source (choose one)
# input: ./leads.json
# urls:
#   - https://api.example.com/api/leads

# Which list screen the records come from. Sets the default date field,
# exact-match field and table columns.
# leads, call-logs, assistants, phone-numbers, files, users,
# scheduled-calls, appointments, generic
resource: generic

# Paging
page: 1
per_page: 10
window: 7

# Filters
# search: ""
# from: 2024-01-01
# to: 2024-01-31
# date_field: add_date
# match_field: external_id
# match_value: ""
# category_field: status
# category: completed,failed

# Output
# columns: name,phone,email,add_date
# output: ./page.json
# output_format: text
no_color: false

# Backend
timeout: 15
# proxy: http://127.0.0.1:8080
# session_file: ~/.callgrid/session.json
"#
    .to_string()
}

pub fn ensure_default_config_file(path: &PathBuf) -> Result<bool, String> {
    if path.exists() {
        return Ok(false);
    }
    let parent = path
        .parent()
        .ok_or_else(|| format!("invalid config path '{}'", path.display()))?;
    std::fs::create_dir_all(parent).map_err(|e| {
        format!(
            "failed to create config directory '{}': {e}",
            parent.display()
        )
    })?;
    let contents = default_config_yaml();
    std::fs::write(path, contents)
        .map_err(|e| format!("failed to write config file '{}': {e}", path.display()))?;
    Ok(true)
}
