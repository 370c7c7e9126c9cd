//! End-to-end harness for the load → normalize → report → export pipeline.
//!
//! # What this covers
//!
//! - Multi-year load from a temp data dir with one year missing and one
//!   year malformed; the good years are unaffected.
//! - Per-year totals in the canonical table equal the sum of the numeric
//!   month cells in each raw file.
//! - Export to CSV and re-import reproduces the registrations.
//! - Memoization: files changed on disk are only seen after invalidation.
//!
//! # Running
//!
//! ```sh
//! cargo test --test pipeline_harness
//! ```

use pretty_assertions::assert_eq;
use std::fs;
use std::path::Path;
use vahan_report::cache::LoadCache;
use vahan_report::config::DataConfig;
use vahan_report::error::{LoadError, ReportError};
use vahan_report::loader::{load_all, load_year, source_path};
use vahan_report::output::{export_canonical, read_canonical};
use vahan_report::reports;
use vahan_report::types::Month;

const PATTERN: &str = "vahan_data_{year}.csv";

const Y2021: &str = "\
S No,Maker,JAN,FEB,MAR,APR,MAY,JUN,JUL,AUG,SEP,OCT,NOV,DEC,TOTAL
1,Tata Motors ,100,N/A,150,,,,,,,,,,250
2,Maruti Suzuki,300,200,250,,,,,,,,,,750
";

// Partial-year extract: only three month columns. A comma-formatted cell is
// text, not a count.
const Y2022: &str = "\
SNo,Manufacturer,JAN,FEB,MAR
1,Tata Motors,400,\"1,000\",-
2,Maruti Suzuki,200,,100
";

// Second data row is wider than the header.
const Y2024: &str = "\
SNo,Manufacturer,JAN
1,A,10
2,B,20,30
";

fn write_year(dir: &Path, year: i32, body: &str) {
    fs::write(source_path(dir, PATTERN, year), body).unwrap();
}

fn data_config(dir: &Path, years: Vec<i32>) -> DataConfig {
    DataConfig {
        dir: dir.to_path_buf(),
        file_pattern: PATTERN.to_string(),
        years,
    }
}

fn fixture_dir() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    write_year(dir.path(), 2021, Y2021);
    write_year(dir.path(), 2022, Y2022);
    write_year(dir.path(), 2024, Y2024);
    dir
}

#[test]
fn failing_years_do_not_affect_the_others() {
    let dir = fixture_dir();
    let report = load_all(&data_config(dir.path(), vec![2021, 2022, 2023, 2024]));

    let outcomes: Vec<(i32, bool)> = report
        .statuses
        .iter()
        .map(|s| (s.year, s.outcome.is_ok()))
        .collect();
    assert_eq!(outcomes, vec![(2021, true), (2022, true), (2023, false), (2024, false)]);

    assert!(matches!(report.statuses[2].outcome, Err(LoadError::FileNotFound { year: 2023, .. })));
    assert!(matches!(report.statuses[3].outcome, Err(LoadError::ParseFailure { year: 2024, .. })));

    // 2021: 100, 150, 300, 200, 250 ; 2022: 400, 200, 100
    assert_eq!(report.statuses[0].outcome, Ok(5));
    assert_eq!(report.statuses[1].outcome, Ok(3));
    assert_eq!(report.records.len(), 8);
    assert_eq!(report.year_range(), Some((2021, 2022)));

    // Loading 2021 alone yields the same rows for that year.
    let alone = load_all(&data_config(dir.path(), vec![2021]));
    let in_full: Vec<_> = report.records.iter().filter(|r| r.year == 2021).cloned().collect();
    assert_eq!(alone.records, in_full);
}

#[test]
fn yearly_totals_match_numeric_cells() {
    let dir = fixture_dir();
    let report = load_all(&data_config(dir.path(), vec![2021, 2022]));
    let yearly = reports::yearly_totals(&report.records);

    assert_eq!(yearly.len(), 2);
    assert_eq!((yearly[0].year, yearly[0].registrations), (2021, 1000.0));
    assert_eq!((yearly[1].year, yearly[1].registrations), (2022, 700.0));
    assert_eq!(yearly[0].yoy_growth, None);
    assert_eq!(yearly[1].yoy_growth, Some(-30.0));
}

#[test]
fn thousands_separated_cells_are_dropped() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("vahan_data_2022.csv");
    fs::write(&path, "SNo,Manufacturer,JAN,FEB\n1,Tata,\"1,000\",5\n").unwrap();

    let rows = load_year(2022, &path).unwrap();
    let values: Vec<(Month, f64)> = rows.iter().map(|r| (r.month, r.registrations)).collect();
    assert_eq!(values, vec![(Month::Feb, 5.0)]);
}

#[test]
fn tata_example_rows() {
    let dir = fixture_dir();
    let report = load_all(&data_config(dir.path(), vec![2021]));
    let tata: Vec<(Month, f64)> = report
        .records
        .iter()
        .filter(|r| r.manufacturer == "Tata Motors")
        .map(|r| (r.month, r.registrations))
        .collect();
    assert_eq!(tata, vec![(Month::Jan, 100.0), (Month::Mar, 150.0)]);
    assert!(report.records.iter().all(|r| r.registrations.is_finite()));
    assert!(report
        .records
        .iter()
        .all(|r| (1..=12).contains(&r.month_number) && r.date.format("%d").to_string() == "01"));
}

#[test]
fn no_year_loaded_is_an_empty_result() {
    let dir = tempfile::tempdir().unwrap();
    let report = load_all(&data_config(dir.path(), vec![2021, 2022]));
    assert!(report.is_empty());
    assert!(matches!(report.require_records(), Err(ReportError::EmptyResult)));
}

#[test]
fn export_round_trip_preserves_registrations() {
    let dir = fixture_dir();
    let out = tempfile::tempdir().unwrap();
    let report = load_all(&data_config(dir.path(), vec![2021, 2022]));

    let path = export_canonical(
        out.path(),
        "vahan_vehicle_analysis",
        &report.records,
        report.year_range().unwrap(),
    )
    .unwrap();
    assert_eq!(
        path.file_name().unwrap().to_string_lossy(),
        "vahan_vehicle_analysis_2021_2022.csv"
    );

    let header = fs::read_to_string(&path).unwrap();
    assert!(header
        .starts_with("SequenceId,Manufacturer,Month,Registrations,Year,MonthNumber,Date"));

    let back = read_canonical(&path).unwrap();
    assert_eq!(back, report.records);
}

#[test]
fn cache_serves_stale_data_until_invalidated() {
    let dir = fixture_dir();
    let data = data_config(dir.path(), vec![2021]);
    let mut cache = LoadCache::new();

    let first = cache.get_or_load(&data);
    assert_eq!(first.records.len(), 5);

    write_year(dir.path(), 2021, "SNo,Manufacturer,JAN\n1,A,1\n");
    let again = cache.get_or_load(&data);
    assert_eq!(again.records.len(), 5);
    assert_eq!(cache.load_count(), 1);

    cache.invalidate();
    let fresh = cache.get_or_load(&data);
    assert_eq!(fresh.records.len(), 1);
    assert_eq!(cache.load_count(), 2);
}
