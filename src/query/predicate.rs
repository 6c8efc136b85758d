use std::fmt;

use serde_json::Value;

use super::date_range::{self, DateRange};
use super::search;
use crate::record::{number_text, Fields};

/// A filter that a record must pass to appear in a page.
pub trait RecordPredicate: fmt::Debug + Send + Sync {
    fn matches(&self, record: &dyn Fields) -> bool;

    /// Short human-readable form for summaries and logs.
    fn describe(&self) -> String;
}

/// Keeps records whose `field` equals `value` exactly. Used for ids coming
/// from external systems, so no trimming or case folding is applied.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExactMatch {
    pub field: String,
    pub value: String,
}

impl ExactMatch {
    pub fn new(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }
}

impl RecordPredicate for ExactMatch {
    fn matches(&self, record: &dyn Fields) -> bool {
        match record.field(&self.field) {
            Some(Value::String(s)) => *s == self.value,
            Some(Value::Number(n)) => number_text(n) == self.value,
            _ => false,
        }
    }

    fn describe(&self) -> String {
        format!("{}={}", self.field, self.value)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchMatch {
    needle: String,
}

impl SearchMatch {
    pub fn new(search: &str) -> Self {
        Self {
            needle: search::normalize(search),
        }
    }
}

impl RecordPredicate for SearchMatch {
    fn matches(&self, record: &dyn Fields) -> bool {
        search::matches(record, &self.needle)
    }

    fn describe(&self) -> String {
        format!("search~{}", self.needle)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DateRangeMatch {
    pub field: String,
    pub range: DateRange,
}

impl DateRangeMatch {
    pub fn new(field: impl Into<String>, range: DateRange) -> Self {
        Self {
            field: field.into(),
            range,
        }
    }
}

impl RecordPredicate for DateRangeMatch {
    fn matches(&self, record: &dyn Fields) -> bool {
        date_range::record_in_range(record, &self.field, &self.range)
    }

    fn describe(&self) -> String {
        let side = |d: Option<chrono::NaiveDate>| d.map(|d| d.to_string()).unwrap_or_default();
        format!(
            "{}:{}..{}",
            self.field,
            side(self.range.from),
            side(self.range.to)
        )
    }
}

/// Keeps records whose `field` is one of the allowed categories, compared
/// case-insensitively. A list field matches when any element does. An empty
/// set or the `all` category lets every record through.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CategoryMatch {
    pub field: String,
    allowed: Vec<String>,
}

impl CategoryMatch {
    pub fn new<I, S>(field: impl Into<String>, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let allowed = categories
            .into_iter()
            .map(|c| c.as_ref().trim().to_lowercase())
            .filter(|c| !c.is_empty())
            .collect();
        Self {
            field: field.into(),
            allowed,
        }
    }

    pub fn is_open(&self) -> bool {
        self.allowed.is_empty() || self.allowed.iter().any(|c| c == "all")
    }

    fn allows(&self, value: &Value) -> bool {
        match value {
            Value::String(s) => {
                let s = s.trim().to_lowercase();
                self.allowed.iter().any(|c| *c == s)
            }
            Value::Number(n) => {
                let s = number_text(n);
                self.allowed.iter().any(|c| *c == s)
            }
            _ => false,
        }
    }
}

impl RecordPredicate for CategoryMatch {
    fn matches(&self, record: &dyn Fields) -> bool {
        if self.is_open() {
            return true;
        }
        match record.field(&self.field) {
            Some(Value::Array(items)) => items.iter().any(|v| self.allows(v)),
            Some(value) => self.allows(value),
            None => false,
        }
    }

    fn describe(&self) -> String {
        format!("{} in [{}]", self.field, self.allowed.join(","))
    }
}
