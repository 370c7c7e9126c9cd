use crate::error::Result;
use crate::types::{CanonicalRecord, Month};
use crate::util::{format_int, parse_registrations};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tabled::{settings::Style, Table, Tabled};
use tracing::{debug, info};

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

/// One CSV row per element, header taken from the serde field names.
pub fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    ensure_parent(path)?;
    let mut wtr = csv::Writer::from_path(path)?;
    rows.iter().try_for_each(|r| wtr.serialize(r))?;
    wtr.flush()?;
    debug!(path = %path.display(), rows = rows.len(), "wrote csv");
    Ok(())
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    ensure_parent(path)?;
    let body = serde_json::to_vec_pretty(value)?;
    fs::write(path, &body)?;
    debug!(path = %path.display(), bytes = body.len(), "wrote json");
    Ok(())
}

/// `{prefix}_{first}_{last}.csv`
pub fn export_file_name(prefix: &str, first_year: i32, last_year: i32) -> String {
    format!("{}_{}_{}.csv", prefix, first_year, last_year)
}

/// Write the full canonical table into `dir`, named after the covered year
/// range. Returns the written path.
pub fn export_canonical(
    dir: &Path,
    prefix: &str,
    records: &[CanonicalRecord],
    years: (i32, i32),
) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(export_file_name(prefix, years.0, years.1));
    write_csv(&path, records)?;
    info!(path = %path.display(), rows = records.len(), "canonical table exported");
    Ok(path)
}

#[derive(Debug, Deserialize)]
struct ExportedRow {
    #[serde(rename = "SequenceId")]
    sequence_id: Option<String>,
    #[serde(rename = "Manufacturer")]
    manufacturer: Option<String>,
    #[serde(rename = "Month")]
    month: Option<String>,
    #[serde(rename = "Registrations")]
    registrations: Option<String>,
    #[serde(rename = "Year")]
    year: Option<String>,
}

/// Re-read an exported canonical table. `Registrations` goes through the
/// same coercion as the raw files; rows that fail it, or whose month or
/// year cannot be read, are skipped. Month number and date are derived
/// again rather than trusted.
pub fn read_canonical(path: &Path) -> Result<Vec<CanonicalRecord>> {
    let mut rdr = csv::ReaderBuilder::new().flexible(true).from_path(path)?;
    let mut out = Vec::new();
    let mut skipped = 0usize;
    for result in rdr.deserialize::<ExportedRow>() {
        let row = result?;
        let parsed = (|| {
            let registrations = parse_registrations(row.registrations.as_deref()?)?;
            let month = Month::from_abbrev(row.month.as_deref()?)?;
            let year: i32 = row.year.as_deref()?.trim().parse().ok()?;
            let date = NaiveDate::from_ymd_opt(year, month.number(), 1)?;
            Some(CanonicalRecord {
                sequence_id: row.sequence_id.clone().unwrap_or_default(),
                manufacturer: row.manufacturer.clone().unwrap_or_default(),
                month,
                registrations,
                year,
                month_number: month.number(),
                date,
            })
        })();
        match parsed {
            Some(r) => out.push(r),
            None => skipped += 1,
        }
    }
    debug!(path = %path.display(), rows = out.len(), skipped, "read canonical export");
    Ok(out)
}

/// Markdown table of the first `max_rows` rows; `None` when there are none.
pub fn render_table<T>(rows: &[T], max_rows: usize) -> Option<String>
where
    T: Tabled + Clone,
{
    let slice: Vec<T> = rows.iter().take(max_rows).cloned().collect();
    if slice.is_empty() {
        return None;
    }
    Some(Table::new(slice).with(Style::markdown()).to_string())
}

/// Header names a `Tabled` row type renders with.
pub fn column_names<T: Tabled>() -> Vec<String> {
    T::headers().into_iter().map(|h| h.into_owned()).collect()
}

pub fn preview_table<T>(title: &str, note: Option<&str>, rows: &[T], max_rows: usize)
where
    T: Tabled + Clone,
{
    println!("\n{}", title);
    if let Some(n) = note {
        println!("({})", n);
    }
    println!();
    match render_table(rows, max_rows) {
        Some(table_str) => println!("{}\n", table_str),
        None => println!("(no rows)\n"),
    }
}

/// First rows of the canonical table with its size and column list.
pub fn preview_records(records: &[CanonicalRecord], max_rows: usize) {
    let note = format!("first {} rows", max_rows.min(records.len()));
    preview_table("Processed Data Preview", Some(note.as_str()), records, max_rows);
    println!("Total records: {}", format_int(records.len() as u64));
    println!("Columns: {}\n", column_names::<CanonicalRecord>().join(", "));
}
