use crate::config::DataConfig;
use crate::error::{LoadError, ReportError, ShapeError};
use crate::types::{CanonicalRecord, Month, RawYearTable};
use crate::util::{decode_latin1, format_int, parse_registrations};
use chrono::NaiveDate;
use csv::{ByteRecord, ReaderBuilder};
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// Positional role assigned to a raw column.
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    SequenceId,
    Manufacturer,
    Month(Month),
    /// Anything past the template (e.g. `TOTAL`), kept under its own label
    /// and never reshaped.
    Extra(String),
}

/// Outcome for one configured year.
#[derive(Debug, Clone, PartialEq)]
pub struct YearStatus {
    pub year: i32,
    pub path: PathBuf,
    pub outcome: Result<usize, LoadError>,
}

impl YearStatus {
    /// `2021: 1,234 records`, `2022: file not found` or
    /// `2023: parse error: <cause>`.
    pub fn line(&self) -> String {
        match &self.outcome {
            Ok(n) => format!("{}: {} records", self.year, format_int(*n as u64)),
            Err(LoadError::FileNotFound { .. }) => format!("{}: file not found", self.year),
            Err(LoadError::ParseFailure { reason, .. }) => {
                format!("{}: parse error: {}", self.year, reason)
            }
        }
    }
}

/// The canonical table for all configured years plus per-year status.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadReport {
    pub records: Vec<CanonicalRecord>,
    pub statuses: Vec<YearStatus>,
}

impl LoadReport {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Smallest and largest year that contributed rows.
    pub fn year_range(&self) -> Option<(i32, i32)> {
        let first = self.records.iter().map(|r| r.year).min()?;
        let last = self.records.iter().map(|r| r.year).max()?;
        Some((first, last))
    }

    /// The records, or [`ReportError::EmptyResult`] when no year produced any.
    pub fn require_records(&self) -> Result<&[CanonicalRecord], ReportError> {
        if self.records.is_empty() {
            Err(ReportError::EmptyResult)
        } else {
            Ok(&self.records)
        }
    }
}

/// `dir/pattern` with `{year}` substituted.
pub fn source_path(dir: &Path, pattern: &str, year: i32) -> PathBuf {
    dir.join(pattern.replace("{year}", &year.to_string()))
}

/// Paths for every configured year, in configured order.
pub fn source_paths(data: &DataConfig) -> Vec<PathBuf> {
    data.years
        .iter()
        .map(|y| source_path(&data.dir, &data.file_pattern, *y))
        .collect()
}

/// Assign template names to the first columns, left to right, stopping at
/// whichever runs out first: the raw header or the 14-name template.
pub fn reconcile_columns(headers: &[String]) -> Vec<Column> {
    headers
        .iter()
        .enumerate()
        .map(|(i, h)| match i {
            0 => Column::SequenceId,
            1 => Column::Manufacturer,
            i if i < 2 + Month::ALL.len() => Column::Month(Month::ALL[i - 2]),
            _ => Column::Extra(h.clone()),
        })
        .collect()
}

/// Read a Latin-1 CSV file. The first row is the header; it is used for its
/// width only. Short rows are padded with empty cells, rows wider than the
/// header make the whole file unparseable.
pub fn read_raw_table(year: i32, path: &Path) -> Result<RawYearTable, LoadError> {
    let parse_failure = |reason: String| LoadError::ParseFailure {
        year,
        path: path.to_path_buf(),
        reason,
    };

    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(LoadError::FileNotFound { year, path: path.to_path_buf() });
        }
        Err(e) => return Err(parse_failure(e.to_string())),
    };
    read_raw_from(file).map_err(parse_failure)
}

fn read_raw_from<R: Read>(reader: R) -> Result<RawYearTable, String> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = rdr
        .byte_headers()
        .map_err(|e| e.to_string())?
        .iter()
        .map(decode_latin1)
        .collect();
    if headers.is_empty() || (headers.len() == 1 && headers[0].trim().is_empty()) {
        return Err("no columns to parse from file".to_string());
    }

    let width = headers.len();
    let mut rows = Vec::new();
    let mut record = ByteRecord::new();
    let mut line = 1u64;
    loop {
        match rdr.read_byte_record(&mut record) {
            Ok(true) => {}
            Ok(false) => break,
            Err(e) => return Err(e.to_string()),
        }
        line = record.position().map(|p| p.line()).unwrap_or(line + 1);
        if record.len() > width {
            return Err(format!(
                "expected {} fields in line {}, saw {}",
                width,
                line,
                record.len()
            ));
        }
        let mut row: Vec<String> = record.iter().map(decode_latin1).collect();
        row.resize(width, String::new());
        rows.push(row);
    }

    Ok(RawYearTable { headers, rows })
}

/// Reshape one year's raw table into canonical long rows.
///
/// Rows are emitted month by month (all manufacturers for JAN, then FEB, ...),
/// the order a wide-to-long unpivot produces. Cells that do not coerce to a
/// number are dropped.
pub fn normalize(year: i32, table: &RawYearTable) -> Result<Vec<CanonicalRecord>, ShapeError> {
    let columns = reconcile_columns(&table.headers);
    if columns.len() < 2 {
        return Err(ShapeError::TooFewColumns(columns.len()));
    }

    let month_columns: Vec<(usize, Month)> = columns
        .iter()
        .enumerate()
        .filter_map(|(i, c)| match c {
            Column::Month(m) => Some((i, *m)),
            _ => None,
        })
        .collect();

    let mut out = Vec::with_capacity(table.rows.len() * month_columns.len());
    for (idx, month) in month_columns {
        let Some(date) = NaiveDate::from_ymd_opt(year, month.number(), 1) else {
            continue;
        };
        for row in &table.rows {
            let cell = row.get(idx).map(String::as_str).unwrap_or("");
            let Some(registrations) = parse_registrations(cell) else {
                continue;
            };
            out.push(CanonicalRecord {
                sequence_id: row.first().map(|s| s.trim().to_string()).unwrap_or_default(),
                manufacturer: row.get(1).map(|s| s.trim().to_string()).unwrap_or_default(),
                month,
                registrations,
                year,
                month_number: month.number(),
                date,
            });
        }
    }
    Ok(out)
}

/// Read and normalize a single year's file.
pub fn load_year(year: i32, path: &Path) -> Result<Vec<CanonicalRecord>, LoadError> {
    let table = read_raw_table(year, path)?;
    debug!(
        year,
        columns = table.column_count(),
        rows = table.rows.len(),
        "read raw table"
    );
    normalize(year, &table).map_err(|e| LoadError::ParseFailure {
        year,
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// Load every configured year. A failing year contributes nothing and is
/// reported in `statuses`; the rest proceed.
pub fn load_all(data: &DataConfig) -> LoadReport {
    let mut report = LoadReport::default();
    for &year in &data.years {
        let path = source_path(&data.dir, &data.file_pattern, year);
        let outcome = match load_year(year, &path) {
            Ok(rows) => {
                info!(year, records = rows.len(), path = %path.display(), "year loaded");
                let n = rows.len();
                report.records.extend(rows);
                Ok(n)
            }
            Err(e) => {
                match &e {
                    LoadError::FileNotFound { .. } => {
                        warn!(year, path = %path.display(), "file not found")
                    }
                    LoadError::ParseFailure { reason, .. } => {
                        error!(year, path = %path.display(), %reason, "parse failure")
                    }
                }
                Err(e)
            }
        };
        report.statuses.push(YearStatus { year, path, outcome });
    }
    report
}
