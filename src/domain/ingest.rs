//! Tabular ingestor: raw bytes to a canonical [`BarSeries`].
//!
//! Input files arrive in several shapes (exported spreadsheets, MT4 dumps,
//! plain whitespace tables), so parsing is a fixed-priority list of
//! candidates: the first one that succeeds structurally and yields all six
//! required columns wins and every later candidate is skipped. The order is
//! load-bearing; downstream callers depend on which candidate accepts a
//! given input, so do not reorder or merge the passes.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::domain::bar::{Bar, BarSeries};
use crate::domain::error::TradebenchError;

pub const REQUIRED_COLUMNS: [&str; 6] = ["Time", "Open", "High", "Low", "Close", "Volume"];

const STRICT_TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Formats tried by the lenient fallback pass, most specific first.
const LENIENT_DATETIME_FORMATS: [&str; 9] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%Y.%m.%d %H:%M:%S",
    "%Y.%m.%d %H:%M",
    "%m/%d/%Y %H:%M",
];

const LENIENT_DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%Y/%m/%d", "%Y.%m.%d", "%m/%d/%Y"];

/// One row as the accepted parse candidate produced it, time still raw.
struct RawRow {
    time: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
}

/// Parse raw bytes into a canonical series.
///
/// Fails with [`TradebenchError::Format`] when no candidate succeeds or when
/// the series is empty after time normalization.
pub fn ingest(raw: &[u8]) -> Result<BarSeries, TradebenchError> {
    let attempts: [(&str, fn(&[u8]) -> Result<Vec<RawRow>, String>); 4] = [
        ("comma-delimited with header", parse_headered_comma),
        ("tab-delimited without header", parse_positional_tab),
        ("comma-delimited without header", parse_positional_comma),
        ("whitespace-delimited without header", parse_whitespace),
    ];

    let mut failures: Vec<String> = Vec::new();
    let mut accepted: Option<Vec<RawRow>> = None;

    for (label, parse) in attempts {
        match parse(raw) {
            Ok(rows) => {
                tracing::debug!(candidate = label, rows = rows.len(), "parse candidate accepted");
                accepted = Some(rows);
                break;
            }
            Err(reason) => {
                tracing::debug!(candidate = label, %reason, "parse candidate rejected");
                failures.push(format!("{label}: {reason}"));
            }
        }
    }

    let rows = accepted.ok_or_else(|| TradebenchError::Format {
        reason: format!("no parse strategy succeeded ({})", failures.join("; ")),
    })?;

    if rows.is_empty() {
        return Err(TradebenchError::Format {
            reason: "no data rows".into(),
        });
    }

    normalize_times(rows)
}

/// Candidate 1: comma-delimited, first row is a header naming the six
/// required columns. Columns are located by name; extras are ignored.
fn parse_headered_comma(raw: &[u8]) -> Result<Vec<RawRow>, String> {
    let mut reader = csv::Reader::from_reader(raw);
    let headers = reader.headers().map_err(|e| e.to_string())?.clone();

    // Exact header names; a padded name like "Time " is a different column
    // and the file falls through to the positional passes.
    let mut indexes = [0usize; 6];
    for (slot, column) in indexes.iter_mut().zip(REQUIRED_COLUMNS) {
        *slot = headers
            .iter()
            .position(|h| h == column)
            .ok_or_else(|| format!("missing column '{column}'"))?;
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| e.to_string())?;
        let fields = indexes.map(|i| record.get(i).unwrap_or(""));
        rows.push(row_from_fields(fields));
    }
    Ok(rows)
}

fn parse_positional_tab(raw: &[u8]) -> Result<Vec<RawRow>, String> {
    parse_positional(raw, b'\t')
}

fn parse_positional_comma(raw: &[u8]) -> Result<Vec<RawRow>, String> {
    parse_positional(raw, b',')
}

/// Candidates 2 and 3: headerless, columns assigned positionally to the six
/// required names in fixed order.
fn parse_positional(raw: &[u8], delimiter: u8) -> Result<Vec<RawRow>, String> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(raw);

    let mut rows = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        let record = record.map_err(|e| e.to_string())?;
        if record.len() < REQUIRED_COLUMNS.len() {
            return Err(format!(
                "row {} has {} fields, expected {}",
                idx + 1,
                record.len(),
                REQUIRED_COLUMNS.len()
            ));
        }
        let mut fields = [""; 6];
        for (slot, i) in fields.iter_mut().zip(0..REQUIRED_COLUMNS.len()) {
            *slot = record.get(i).unwrap_or("");
        }
        rows.push(row_from_fields(fields));
    }
    Ok(rows)
}

/// Candidate 4: one-or-more-whitespace delimited, headerless. The csv crate
/// has no multi-character separators, so this pass splits lines by hand.
fn parse_whitespace(raw: &[u8]) -> Result<Vec<RawRow>, String> {
    let text = std::str::from_utf8(raw).map_err(|e| e.to_string())?;

    let mut rows = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.len() < REQUIRED_COLUMNS.len() {
            return Err(format!(
                "line {} has {} fields, expected {}",
                idx + 1,
                tokens.len(),
                REQUIRED_COLUMNS.len()
            ));
        }
        let mut fields = [""; 6];
        for (slot, token) in fields.iter_mut().zip(&tokens) {
            *slot = token;
        }
        rows.push(row_from_fields(fields));
    }
    Ok(rows)
}

fn row_from_fields(fields: [&str; 6]) -> RawRow {
    RawRow {
        time: fields[0].trim().to_string(),
        open: coerce_numeric(fields[1]),
        high: coerce_numeric(fields[2]),
        low: coerce_numeric(fields[3]),
        close: coerce_numeric(fields[4]),
        volume: coerce_numeric(fields[5]),
    }
}

/// Numeric columns are not independently validated: a cell that does not
/// coerce passes through as NaN rather than rejecting the row.
fn coerce_numeric(field: &str) -> f64 {
    field.trim().parse().unwrap_or(f64::NAN)
}

/// Strict pass against the fixed `YYYY-MM-DD HH:MM` pattern; if that yields
/// zero rows across the whole table, one lenient format-inferring pass over
/// the original strings. Rows whose time fails to parse are dropped in
/// either pass, never kept with a null timestamp.
fn normalize_times(rows: Vec<RawRow>) -> Result<BarSeries, TradebenchError> {
    let strict: Vec<Bar> = rows
        .iter()
        .filter_map(|row| {
            NaiveDateTime::parse_from_str(&row.time, STRICT_TIME_FORMAT)
                .ok()
                .map(|time| bar_from_row(row, time))
        })
        .collect();

    let bars = if strict.is_empty() {
        tracing::debug!("strict time pass yielded no rows, falling back to lenient parsing");
        rows.iter()
            .filter_map(|row| parse_time_lenient(&row.time).map(|time| bar_from_row(row, time)))
            .collect()
    } else {
        strict
    };

    if bars.is_empty() {
        return Err(TradebenchError::Format {
            reason: "no parseable rows".into(),
        });
    }
    Ok(BarSeries::new(bars))
}

fn parse_time_lenient(value: &str) -> Option<NaiveDateTime> {
    for format in LENIENT_DATETIME_FORMATS {
        if let Ok(time) = NaiveDateTime::parse_from_str(value, format) {
            return Some(time);
        }
    }
    for format in LENIENT_DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(value, format) {
            return date.and_hms_opt(0, 0, 0);
        }
    }
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|time| time.naive_utc())
}

fn bar_from_row(row: &RawRow, time: NaiveDateTime) -> Bar {
    Bar {
        time,
        open: row.open,
        high: row.high,
        low: row.low,
        close: row.close,
        volume: row.volume,
    }
}
