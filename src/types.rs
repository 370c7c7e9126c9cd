use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use tabled::Tabled;

use crate::util::{format_int, format_number, format_pct};

/// Calendar month, spelled the way the Vahan extracts label their columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Month {
    Jan,
    Feb,
    Mar,
    Apr,
    May,
    Jun,
    Jul,
    Aug,
    Sep,
    Oct,
    Nov,
    Dec,
}

impl Month {
    /// All months in calendar order.
    pub const ALL: [Month; 12] = [
        Month::Jan,
        Month::Feb,
        Month::Mar,
        Month::Apr,
        Month::May,
        Month::Jun,
        Month::Jul,
        Month::Aug,
        Month::Sep,
        Month::Oct,
        Month::Nov,
        Month::Dec,
    ];

    pub fn abbrev(self) -> &'static str {
        match self {
            Month::Jan => "JAN",
            Month::Feb => "FEB",
            Month::Mar => "MAR",
            Month::Apr => "APR",
            Month::May => "MAY",
            Month::Jun => "JUN",
            Month::Jul => "JUL",
            Month::Aug => "AUG",
            Month::Sep => "SEP",
            Month::Oct => "OCT",
            Month::Nov => "NOV",
            Month::Dec => "DEC",
        }
    }

    /// 1-based month number.
    pub fn number(self) -> u32 {
        self as u32 + 1
    }

    pub fn from_number(n: u32) -> Option<Month> {
        if (1..=12).contains(&n) {
            Some(Month::ALL[(n - 1) as usize])
        } else {
            None
        }
    }

    pub fn from_abbrev(s: &str) -> Option<Month> {
        let s = s.trim();
        Month::ALL
            .iter()
            .copied()
            .find(|m| m.abbrev().eq_ignore_ascii_case(s))
    }

    /// Calendar quarter (1..=4).
    pub fn quarter(self) -> u32 {
        (self.number() - 1) / 3 + 1
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.abbrev())
    }
}

/// One year's file as read from disk: the header row plus data rows, every
/// cell already decoded to text. Columns are addressed by position only.
#[derive(Debug, Clone, Default)]
pub struct RawYearTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawYearTable {
    pub fn column_count(&self) -> usize {
        self.headers.len()
    }
}

/// A single manufacturer/month/year registration count in the long table.
#[derive(Debug, Clone, PartialEq, Serialize, Tabled)]
pub struct CanonicalRecord {
    #[serde(rename = "SequenceId")]
    #[tabled(rename = "SequenceId")]
    pub sequence_id: String,
    #[serde(rename = "Manufacturer")]
    #[tabled(rename = "Manufacturer")]
    pub manufacturer: String,
    #[serde(rename = "Month")]
    #[tabled(rename = "Month")]
    pub month: Month,
    #[serde(rename = "Registrations")]
    #[tabled(rename = "Registrations", display_with = "display_registrations")]
    pub registrations: f64,
    #[serde(rename = "Year")]
    #[tabled(rename = "Year")]
    pub year: i32,
    #[serde(rename = "MonthNumber")]
    #[tabled(rename = "MonthNumber")]
    pub month_number: u32,
    #[serde(rename = "Date")]
    #[tabled(rename = "Date")]
    pub date: NaiveDate,
}

// Source cells may carry decimals; show them only when present.
fn display_registrations(v: &f64) -> String {
    if v.fract() == 0.0 {
        format_number(*v, 0)
    } else {
        format_number(*v, 2)
    }
}

fn display_count(v: &f64) -> String {
    format_number(*v, 0)
}

fn display_avg(v: &f64) -> String {
    format_number(*v, 1)
}

fn display_pct(v: &Option<f64>) -> String {
    format_pct(*v)
}

fn display_share(v: &f64) -> String {
    format!("{:.2}%", v)
}

#[derive(Debug, Clone, PartialEq, Serialize, Tabled)]
pub struct YearlyRow {
    #[serde(rename = "Year")]
    #[tabled(rename = "Year")]
    pub year: i32,
    #[serde(rename = "Registrations")]
    #[tabled(rename = "Registrations", display_with = "display_count")]
    pub registrations: f64,
    #[serde(rename = "YoYGrowth")]
    #[tabled(rename = "YoY Growth %", display_with = "display_pct")]
    pub yoy_growth: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Tabled)]
pub struct QuarterRow {
    #[serde(rename = "Year")]
    #[tabled(rename = "Year")]
    pub year: i32,
    #[serde(rename = "Quarter")]
    #[tabled(rename = "Quarter")]
    pub quarter: String,
    #[serde(rename = "Registrations")]
    #[tabled(rename = "Registrations", display_with = "display_count")]
    pub registrations: f64,
    #[serde(rename = "QoQGrowth")]
    #[tabled(rename = "QoQ Growth %", display_with = "display_pct")]
    pub qoq_growth: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Tabled)]
pub struct ShareRow {
    #[serde(rename = "Rank")]
    #[tabled(rename = "Rank")]
    pub rank: usize,
    #[serde(rename = "Manufacturer")]
    #[tabled(rename = "Manufacturer")]
    pub manufacturer: String,
    #[serde(rename = "Registrations")]
    #[tabled(rename = "Registrations", display_with = "display_count")]
    pub registrations: f64,
    #[serde(rename = "MarketShare")]
    #[tabled(rename = "Market Share", display_with = "display_share")]
    pub market_share: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Tabled)]
pub struct GrowthRow {
    #[serde(rename = "Rank")]
    #[tabled(rename = "Rank")]
    pub rank: usize,
    #[serde(rename = "Manufacturer")]
    #[tabled(rename = "Manufacturer")]
    pub manufacturer: String,
    #[serde(rename = "AvgYoYGrowth")]
    #[tabled(rename = "Avg YoY Growth %", display_with = "display_avg")]
    pub avg_yoy_growth: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Tabled)]
pub struct MonthPatternRow {
    #[serde(rename = "MonthNumber")]
    #[tabled(rename = "#")]
    pub month_number: u32,
    #[serde(rename = "Month")]
    #[tabled(rename = "Month")]
    pub month: Month,
    #[serde(rename = "AvgRegistrations")]
    #[tabled(rename = "Avg Registrations", display_with = "display_avg")]
    pub avg_registrations: f64,
}

/// Headline numbers shown above the report tables and written to
/// `summary.json`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryStats {
    pub record_count: usize,
    pub total_registrations: f64,
    pub unique_manufacturers: usize,
    pub first_year: i32,
    pub last_year: i32,
    pub avg_monthly: f64,
    pub average_yoy_growth: Option<f64>,
    pub latest_yoy_growth: Option<f64>,
    pub total_growth: Option<f64>,
    pub top_share_pct: f64,
}

impl SummaryStats {
    pub fn years_covered(&self) -> String {
        format!("{}-{}", self.first_year, self.last_year)
    }

    pub fn headline(&self) -> String {
        format!(
            "Total Registrations: {} | Manufacturers: {} | Time Period: {} | Avg Monthly: {}",
            format_number(self.total_registrations, 0),
            format_int(self.unique_manufacturers as u64),
            self.years_covered(),
            format_number(self.avg_monthly, 0)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn month_numbers_and_quarters_line_up() {
        for (i, m) in Month::ALL.iter().enumerate() {
            assert_eq!(m.number(), i as u32 + 1);
            assert_eq!(Month::from_number(m.number()), Some(*m));
            assert_eq!(Month::from_abbrev(m.abbrev()), Some(*m));
        }
        assert_eq!(Month::Mar.quarter(), 1);
        assert_eq!(Month::Apr.quarter(), 2);
        assert_eq!(Month::Dec.quarter(), 4);
        assert_eq!(Month::from_number(0), None);
        assert_eq!(Month::from_number(13), None);
    }

    #[test]
    fn month_abbrev_lookup_ignores_case_and_padding() {
        assert_eq!(Month::from_abbrev(" jan "), Some(Month::Jan));
        assert_eq!(Month::from_abbrev("TOTAL"), None);
    }
}
