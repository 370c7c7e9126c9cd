// Entry point and high-level CLI flow.
//
// - Option [1] loads (or reuses) the normalized table and prints per-year status.
// - Option [2] prints the growth, market and quarterly reports and writes
//   them next to a JSON summary.
// - Option [3] exports the canonical table as CSV.
// - Option [4] clears the memoized table so the next request rereads the files.
// `--batch` runs load, reports and export once without the menu.
use anyhow::{Context, Result};
use clap::Parser;
use once_cell::sync::Lazy;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{error, info};
use vahan_report::cache::LoadCache;
use vahan_report::config::Config;
use vahan_report::error::ReportError;
use vahan_report::loader::LoadReport;
use vahan_report::types::{CanonicalRecord, SummaryStats};
use vahan_report::{logging, output, reports, util};

#[derive(Parser)]
#[command(name = "vahan_report", about = "Vahan vehicle registration analytics")]
struct Cli {
    /// TOML config file; built-in defaults are used when omitted.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Directory holding the yearly CSV files.
    #[arg(long)]
    data_dir: Option<PathBuf>,
    /// Years to load, comma-separated (e.g. 2021,2022).
    #[arg(long, value_delimiter = ',')]
    years: Option<Vec<i32>>,
    /// Where exports and report files are written.
    #[arg(long)]
    out_dir: Option<PathBuf>,
    /// Load, report and export once, then exit.
    #[arg(long)]
    batch: bool,
    /// Debug-level logging.
    #[arg(long)]
    debug: bool,
}

// The memoized table lives for the whole session; only option [4] clears it.
static APP_STATE: Lazy<Mutex<AppState>> = Lazy::new(|| {
    Mutex::new(AppState {
        config: Config::defaults(),
        cache: LoadCache::new(),
    })
});

struct AppState {
    config: Config,
    cache: LoadCache,
}

fn state() -> MutexGuard<'static, AppState> {
    APP_STATE.lock().unwrap_or_else(|e| e.into_inner())
}

fn load() -> (Config, Arc<LoadReport>) {
    let mut st = state();
    let config = st.config.clone();
    let report = st.cache.get_or_load(&config.data);
    (config, report)
}

/// Read a line after the "Enter choice:" prompt. `None` on end of input.
fn read_choice() -> Option<String> {
    print!("Enter choice: ");
    let _ = io::stdout().flush();
    let mut buf = String::new();
    match io::stdin().read_line(&mut buf) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(buf.trim().to_string()),
    }
}

fn print_status(report: &LoadReport) {
    println!("Data status:");
    for s in &report.statuses {
        println!("  {}", s.line());
    }
    match report.year_range() {
        Some((first, last)) => println!(
            "Successfully loaded {} records from {}-{}\n",
            util::format_int(report.records.len() as u64),
            first,
            last
        ),
        None => println!("No data loaded. Please check your files.\n"),
    }
}

/// Option [1].
fn handle_load() {
    let (config, report) = load();
    print_status(&report);
    if !report.is_empty() {
        output::preview_records(&report.records, config.reports.preview_rows);
    }
}

fn write_report_files(config: &Config, data: &[CanonicalRecord], summary: &SummaryStats) {
    let dir = &config.export.dir;
    if let Err(e) = std::fs::create_dir_all(dir) {
        eprintln!("Write error: {}", e);
        return;
    }
    let results = [
        output::write_csv(&dir.join("yearly_growth.csv"), &reports::yearly_totals(data)),
        output::write_csv(&dir.join("quarterly_trends.csv"), &reports::quarterly_totals(data)),
        output::write_csv(
            &dir.join("market_share.csv"),
            &reports::top_manufacturers(data, config.reports.top_manufacturers),
        ),
        output::write_json(&dir.join("summary.json"), summary),
    ];
    for r in results {
        if let Err(e) = r {
            error!(error = %e, "failed to write report file");
            eprintln!("Write error: {}", e);
        }
    }
}

/// Option [2].
fn handle_generate_reports() -> std::result::Result<(), ReportError> {
    let (config, report) = load();
    let data = report.require_records()?;
    let rc = &config.reports;

    let summary = reports::generate_summary(data, rc.top_share)?;
    println!("{}\n", summary.headline());

    let yearly = reports::yearly_totals(data);
    output::preview_table("Year-over-Year Growth Analysis", None, &yearly, rc.preview_rows);
    println!(
        "Average YoY Growth: {} | Latest YoY Growth: {} | Total Growth: {}\n",
        util::format_pct(summary.average_yoy_growth),
        util::format_pct(summary.latest_yoy_growth),
        util::format_pct(summary.total_growth)
    );

    let top = reports::top_manufacturers(data, rc.top_manufacturers);
    let note = format!("Top {} by volume", rc.top_manufacturers);
    output::preview_table("Market Share Analysis", Some(note.as_str()), &top, rc.preview_rows);

    let growth = reports::manufacturer_growth(data, rc.top_growth);
    let note = format!("Top {} by average YoY growth", rc.top_growth);
    output::preview_table(
        "Manufacturer Growth Rates",
        Some(note.as_str()),
        &growth,
        rc.preview_rows,
    );

    let quarterly = reports::quarterly_totals(data);
    output::preview_table("Quarterly Analysis (QoQ)", None, &quarterly, quarterly.len());

    let pattern = reports::monthly_pattern(data);
    output::preview_table(
        "Seasonal Patterns",
        Some("Average registrations per month"),
        &pattern,
        12,
    );

    println!("Insights:");
    for line in reports::insights(&summary, rc.top_share) {
        println!("  - {}", line);
    }
    println!();

    write_report_files(&config, data, &summary);
    println!("(Report tables and summary.json saved to {})\n", config.export.dir.display());
    Ok(())
}

/// Option [3].
fn handle_export() -> std::result::Result<PathBuf, ReportError> {
    let (config, report) = load();
    let data = report.require_records()?;
    let years = report.year_range().ok_or(ReportError::EmptyResult)?;
    let path =
        output::export_canonical(&config.export.dir, &config.export.file_prefix, data, years)?;
    println!("Processed data exported to {}\n", path.display());
    Ok(path)
}

/// Option [4].
fn handle_refresh() {
    state().cache.invalidate();
    println!("Cache cleared; data will be reloaded on the next request.\n");
}

fn build_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => Config::defaults(),
    };
    if let Some(dir) = &cli.data_dir {
        config.data.dir = dir.clone();
    }
    if let Some(years) = &cli.years {
        config.data.years = years.clone();
    }
    if let Some(dir) = &cli.out_dir {
        config.export.dir = dir.clone();
    }
    Ok(config)
}

fn run_batch() -> Result<()> {
    handle_load();
    handle_generate_reports().context("generating reports")?;
    handle_export().context("exporting processed data")?;
    Ok(())
}

fn run_menu() {
    loop {
        println!("Vahan Vehicle Registration Analytics:");
        println!("[1] Load the files");
        println!("[2] Generate Reports");
        println!("[3] Export Processed Data (CSV)");
        println!("[4] Refresh Analysis");
        println!("[0] Exit\n");
        let Some(choice) = read_choice() else {
            println!();
            break;
        };
        match choice.as_str() {
            "1" => handle_load(),
            "2" => {
                println!();
                if let Err(e) = handle_generate_reports() {
                    println!("Error: {}\n", e);
                }
            }
            "3" => {
                if let Err(e) = handle_export() {
                    println!("Error: {}\n", e);
                }
            }
            "4" => handle_refresh(),
            "0" => {
                println!("Exiting the program.");
                break;
            }
            _ => println!("Invalid choice. Please enter 0-4.\n"),
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_logging(cli.debug);

    let config = build_config(&cli)?;
    info!(years = ?config.data.years, dir = %config.data.dir.display(), "starting");
    state().config = config;

    if cli.batch {
        run_batch()
    } else {
        run_menu();
        Ok(())
    }
}
