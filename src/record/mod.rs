use std::path::Path;

use serde_json::{Map, Value};
use thiserror::Error;

/// A single dashboard row as returned by the backend.
pub type Record = Map<String, Value>;

/// Read access to the fields of a record-like value.
///
/// Implemented for JSON objects and for raw [`Value`]s so callers can filter
/// whatever shape they deserialized the backend response into. The trait is
/// object safe; predicates receive `&dyn Fields`.
pub trait Fields {
    fn field(&self, name: &str) -> Option<&Value>;

    fn values(&self) -> Box<dyn Iterator<Item = &Value> + '_>;
}

impl Fields for Record {
    fn field(&self, name: &str) -> Option<&Value> {
        self.get(name)
    }

    fn values(&self) -> Box<dyn Iterator<Item = &Value> + '_> {
        Box::new(Map::values(self))
    }
}

impl Fields for Value {
    fn field(&self, name: &str) -> Option<&Value> {
        self.as_object().and_then(|m| m.get(name))
    }

    fn values(&self) -> Box<dyn Iterator<Item = &Value> + '_> {
        match self.as_object() {
            Some(m) => Box::new(m.values()),
            None => Box::new(std::iter::empty()),
        }
    }
}

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("failed to read records file: {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON: {source}")]
    Parse {
        #[source]
        source: serde_json::Error,
    },

    #[error("element {index} is not a JSON object")]
    NotAnObject { index: usize },

    #[error("response does not contain a record array")]
    MissingArray,
}

/// The list screens of the dashboard. Each one knows which field carries its
/// date, which field the exact-match filter targets and which columns the
/// table shows by default.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Resource {
    Leads,
    CallLogs,
    Assistants,
    PhoneNumbers,
    Files,
    Users,
    ScheduledCalls,
    Appointments,
    #[default]
    Generic,
}

impl Resource {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().replace('_', "-").as_str() {
            "leads" | "lead" => Some(Self::Leads),
            "call-logs" | "calllogs" | "calls" => Some(Self::CallLogs),
            "assistants" | "assistant" => Some(Self::Assistants),
            "phone-numbers" | "numbers" => Some(Self::PhoneNumbers),
            "files" | "file" => Some(Self::Files),
            "users" | "user" => Some(Self::Users),
            "scheduled-calls" | "scheduled" => Some(Self::ScheduledCalls),
            "appointments" | "appointment" => Some(Self::Appointments),
            "generic" | "records" => Some(Self::Generic),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Leads => "leads",
            Self::CallLogs => "call-logs",
            Self::Assistants => "assistants",
            Self::PhoneNumbers => "phone-numbers",
            Self::Files => "files",
            Self::Users => "users",
            Self::ScheduledCalls => "scheduled-calls",
            Self::Appointments => "appointments",
            Self::Generic => "generic",
        }
    }

    pub fn date_field(self) -> &'static str {
        match self {
            Self::Leads | Self::Generic => "add_date",
            Self::ScheduledCalls => "scheduled_at",
            Self::Appointments => "date",
            _ => "created_at",
        }
    }

    pub fn match_field(self) -> &'static str {
        match self {
            Self::Leads => "external_id",
            Self::CallLogs | Self::PhoneNumbers | Self::Files | Self::ScheduledCalls => {
                "assistant_id"
            }
            Self::Users => "role",
            Self::Appointments => "calendar_id",
            Self::Assistants | Self::Generic => "id",
        }
    }

    pub fn default_columns(self) -> &'static [&'static str] {
        match self {
            Self::Leads => &["name", "phone", "email", "add_date"],
            Self::CallLogs => &[
                "id",
                "assistant_name",
                "phone_number",
                "status",
                "duration",
                "created_at",
            ],
            Self::Assistants => &["name", "voice", "language", "created_at"],
            Self::PhoneNumbers => &["number", "label", "assistant_id"],
            Self::Files => &["name", "size", "created_at"],
            Self::Users => &["name", "email", "role", "created_at"],
            Self::ScheduledCalls => &["name", "phone", "scheduled_at", "status"],
            Self::Appointments => &["title", "date", "time", "lead_name"],
            Self::Generic => &[],
        }
    }

    /// Key under which the backend wraps this resource's array, besides the
    /// generic envelope keys.
    fn envelope_key(self) -> Option<&'static str> {
        match self {
            Self::Leads => Some("leads"),
            Self::CallLogs => Some("call_logs"),
            Self::Assistants => Some("assistants"),
            Self::PhoneNumbers => Some("phone_numbers"),
            Self::Files => Some("files"),
            Self::Users => Some("users"),
            Self::ScheduledCalls => Some("scheduled_calls"),
            Self::Appointments => Some("appointments"),
            Self::Generic => None,
        }
    }
}

const ENVELOPE_KEYS: [&str; 3] = ["data", "items", "results"];

/// Parses a backend response body into records.
///
/// Accepts a bare array or an object wrapping the array under `data`, `items`,
/// `results` or the resource's own key (`{"leads": [...]}`).
pub fn parse_records(text: &str, resource: Resource) -> Result<Vec<Record>, RecordError> {
    let value: Value =
        serde_json::from_str(text).map_err(|source| RecordError::Parse { source })?;
    into_records(value, resource)
}

pub fn load_records_file(path: &Path, resource: Resource) -> Result<Vec<Record>, RecordError> {
    let text = std::fs::read_to_string(path).map_err(|source| RecordError::Read {
        path: path.display().to_string(),
        source,
    })?;
    parse_records(&text, resource)
}

fn into_records(value: Value, resource: Resource) -> Result<Vec<Record>, RecordError> {
    let array = match value {
        Value::Array(items) => items,
        Value::Object(mut envelope) => {
            let key = resource
                .envelope_key()
                .into_iter()
                .chain(ENVELOPE_KEYS)
                .find(|k| matches!(envelope.get(*k), Some(Value::Array(_))))
                .ok_or(RecordError::MissingArray)?;
            match envelope.remove(key) {
                Some(Value::Array(items)) => items,
                _ => return Err(RecordError::MissingArray),
            }
        }
        _ => return Err(RecordError::MissingArray),
    };

    array
        .into_iter()
        .enumerate()
        .map(|(index, item)| match item {
            Value::Object(map) => Ok(map),
            _ => Err(RecordError::NotAnObject { index }),
        })
        .collect()
}

/// Renders a field value the way the dashboard tables display it.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Number(n) => number_text(n),
        Value::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}

/// String form of a JSON number. Whole floats drop their fraction so `12.0`
/// reads as `12`, as it does in the browser.
pub fn number_text(n: &serde_json::Number) -> String {
    if n.is_f64() {
        if let Some(f) = n.as_f64() {
            if f.fract() == 0.0 && f.abs() < 1e15 {
                return format!("{}", f as i64);
            }
        }
    }
    n.to_string()
}
