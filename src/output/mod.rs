use std::collections::BTreeSet;

use serde::Serialize;

use crate::query::Page;
use crate::record::{display_value, Record};

const MAX_CELL_WIDTH: usize = 40;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
    Xml,
    Csv,
}

impl OutputFormat {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "text" | "txt" | "table" => Some(Self::Text),
            "json" => Some(Self::Json),
            "xml" => Some(Self::Xml),
            "csv" => Some(Self::Csv),
            _ => None,
        }
    }
}

pub fn infer_format_from_path(path: &str) -> Option<OutputFormat> {
    let lower = path.trim().to_lowercase();
    if lower.ends_with(".json") {
        return Some(OutputFormat::Json);
    }
    if lower.ends_with(".xml") {
        return Some(OutputFormat::Xml);
    }
    if lower.ends_with(".csv") {
        return Some(OutputFormat::Csv);
    }
    if lower.ends_with(".txt") {
        return Some(OutputFormat::Text);
    }
    None
}

/// Columns to show: the requested ones, else the union of keys on the page.
/// Records are walked in page order; keys within one record come out sorted,
/// as `serde_json::Map` stores them.
pub fn resolve_columns(page: &Page<'_, Record>, requested: &[String]) -> Vec<String> {
    if !requested.is_empty() {
        return requested.to_vec();
    }
    let mut seen = BTreeSet::new();
    let mut out = Vec::new();
    for record in page.items.iter() {
        for key in record.keys() {
            if seen.insert(key.as_str()) {
                out.push(key.clone());
            }
        }
    }
    out
}

fn cell(record: &Record, column: &str) -> String {
    record.get(column).map(display_value).unwrap_or_default()
}

fn truncate(value: &str, max: usize) -> String {
    let single_line = value.replace(['\n', '\r'], " ");
    if single_line.chars().count() <= max {
        return single_line;
    }
    let mut out: String = single_line.chars().take(max.saturating_sub(1)).collect();
    out.push('…');
    out
}

/// Pager line as the dashboard draws it: `‹ 1 2 [3] 4 5 ›`.
pub fn render_pager(page: &Page<'_, Record>) -> String {
    let mut parts: Vec<String> = Vec::new();
    parts.push(if page.has_prev() { "‹" } else { " " }.to_string());
    for n in page.page_numbers.iter() {
        if *n == page.page {
            parts.push(format!("[{n}]"));
        } else {
            parts.push(n.to_string());
        }
    }
    parts.push(if page.has_next() { "›" } else { " " }.to_string());
    parts.join(" ").trim_end().to_string()
}

pub fn render_text(page: &Page<'_, Record>, columns: &[String]) -> Vec<u8> {
    let rows: Vec<Vec<String>> = page
        .items
        .iter()
        .map(|r| {
            columns
                .iter()
                .map(|c| truncate(&cell(r, c), MAX_CELL_WIDTH))
                .collect()
        })
        .collect();

    let widths: Vec<usize> = columns
        .iter()
        .enumerate()
        .map(|(i, c)| {
            rows.iter()
                .map(|row| row[i].chars().count())
                .chain(std::iter::once(c.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let line = |cells: Vec<String>| -> String {
        let padded: Vec<String> = cells
            .iter()
            .zip(widths.iter())
            .map(|(value, width)| {
                let pad = width.saturating_sub(value.chars().count());
                format!("{value}{}", " ".repeat(pad))
            })
            .collect();
        padded.join("  ").trim_end().to_string()
    };

    let mut out = String::new();
    out.push_str(&line(columns.iter().map(|c| c.to_uppercase()).collect()));
    out.push('\n');
    for row in rows {
        out.push_str(&line(row));
        out.push('\n');
    }
    if page.is_empty() {
        out.push_str("(no matching records)\n");
    }
    out.push('\n');
    out.push_str(&format!(
        "page {} of {} :: {} matching\n",
        page.page,
        page.pages_count.max(1),
        page.total
    ));
    let pager = render_pager(page);
    if !pager.trim().is_empty() {
        out.push_str(&pager);
        out.push('\n');
    }
    out.into_bytes()
}

#[derive(Serialize)]
struct JsonPage<'a> {
    page: usize,
    pages_count: usize,
    total: usize,
    page_numbers: &'a [usize],
    items: Vec<Record>,
}

/// JSON envelope of the page. With columns set, items keep only those fields.
pub fn render_json(page: &Page<'_, Record>, columns: &[String]) -> Vec<u8> {
    let items = page
        .items
        .iter()
        .map(|r| {
            if columns.is_empty() {
                (*r).clone()
            } else {
                r.iter()
                    .filter(|(k, _)| columns.iter().any(|c| c == *k))
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect()
            }
        })
        .collect();
    let envelope = JsonPage {
        page: page.page,
        pages_count: page.pages_count,
        total: page.total,
        page_numbers: &page.page_numbers,
        items,
    };
    serde_json::to_vec_pretty(&envelope).unwrap_or_else(|_| b"{}\n".to_vec())
}

fn escape_xml(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

pub fn render_xml(page: &Page<'_, Record>, columns: &[String]) -> Vec<u8> {
    let mut out = String::new();
    out.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
    out.push('\n');
    out.push_str(&format!(
        "<page number=\"{}\" pages_count=\"{}\" total=\"{}\">\n",
        page.page, page.pages_count, page.total
    ));
    for r in page.items.iter() {
        out.push_str("  <record>\n");
        for c in columns {
            out.push_str(&format!(
                "    <field name=\"{}\">{}</field>\n",
                escape_xml(c),
                escape_xml(&cell(r, c))
            ));
        }
        out.push_str("  </record>\n");
    }
    out.push_str("</page>\n");
    out.into_bytes()
}

fn escape_csv(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

pub fn render_csv(page: &Page<'_, Record>, columns: &[String]) -> Vec<u8> {
    let mut out = String::new();
    let header: Vec<String> = columns.iter().map(|c| escape_csv(c)).collect();
    out.push_str(&header.join(","));
    out.push('\n');
    for r in page.items.iter() {
        let row: Vec<String> = columns.iter().map(|c| escape_csv(&cell(r, c))).collect();
        out.push_str(&row.join(","));
        out.push('\n');
    }
    out.into_bytes()
}

pub fn render(format: OutputFormat, page: &Page<'_, Record>, columns: &[String]) -> Vec<u8> {
    match format {
        OutputFormat::Text => render_text(page, columns),
        OutputFormat::Json => render_json(page, columns),
        OutputFormat::Xml => render_xml(page, columns),
        OutputFormat::Csv => render_csv(page, columns),
    }
}
