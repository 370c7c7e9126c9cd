use crate::error::{ReportError, Result};
use crate::types::{
    CanonicalRecord, GrowthRow, Month, MonthPatternRow, QuarterRow, ShareRow, SummaryStats,
    YearlyRow,
};
use crate::util::{format_pct, mean, pct_change};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Total registrations per year, ascending, with growth against the
/// previous loaded year.
pub fn yearly_totals(data: &[CanonicalRecord]) -> Vec<YearlyRow> {
    let mut by_year: BTreeMap<i32, f64> = BTreeMap::new();
    for r in data {
        *by_year.entry(r.year).or_insert(0.0) += r.registrations;
    }
    let mut prev: Option<f64> = None;
    by_year
        .into_iter()
        .map(|(year, registrations)| {
            let yoy_growth = prev.and_then(|p| pct_change(p, registrations));
            prev = Some(registrations);
            YearlyRow { year, registrations, yoy_growth }
        })
        .collect()
}

/// Mean of the defined year-over-year figures.
pub fn average_yoy(rows: &[YearlyRow]) -> Option<f64> {
    let defined: Vec<f64> = rows.iter().filter_map(|r| r.yoy_growth).collect();
    mean(&defined)
}

pub fn latest_yoy(rows: &[YearlyRow]) -> Option<f64> {
    rows.last()?.yoy_growth
}

/// Growth from the first loaded year to the last one.
pub fn total_growth(rows: &[YearlyRow]) -> Option<f64> {
    if rows.len() < 2 {
        return None;
    }
    let first = rows.first()?;
    let last = rows.last()?;
    pct_change(first.registrations, last.registrations)
}

/// Totals per calendar quarter in chronological order, with growth against
/// the previous quarter present in the data.
pub fn quarterly_totals(data: &[CanonicalRecord]) -> Vec<QuarterRow> {
    let mut by_quarter: BTreeMap<(i32, u32), f64> = BTreeMap::new();
    for r in data {
        *by_quarter.entry((r.year, r.month.quarter())).or_insert(0.0) += r.registrations;
    }
    let mut prev: Option<f64> = None;
    by_quarter
        .into_iter()
        .map(|((year, q), registrations)| {
            let qoq_growth = prev.and_then(|p| pct_change(p, registrations));
            prev = Some(registrations);
            QuarterRow {
                year,
                quarter: format!("{}Q{}", year, q),
                registrations,
                qoq_growth,
            }
        })
        .collect()
}

/// Per-manufacturer totals over the whole period, in first-encounter order.
pub fn totals_by_manufacturer(data: &[CanonicalRecord]) -> Vec<(String, f64)> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut totals: Vec<(String, f64)> = Vec::new();
    for r in data {
        let i = *index.entry(r.manufacturer.as_str()).or_insert_with(|| {
            totals.push((r.manufacturer.clone(), 0.0));
            totals.len() - 1
        });
        totals[i].1 += r.registrations;
    }
    totals
}

fn ranked_totals(data: &[CanonicalRecord]) -> Vec<(String, f64)> {
    let mut totals = totals_by_manufacturer(data);
    // stable: ties keep encounter order
    totals.sort_by(|a, b| b.1.total_cmp(&a.1));
    totals
}

fn grand_total(data: &[CanonicalRecord]) -> f64 {
    data.iter().map(|r| r.registrations).sum()
}

/// Top `n` manufacturers by total registrations with their share of the
/// grand total.
pub fn top_manufacturers(data: &[CanonicalRecord], n: usize) -> Vec<ShareRow> {
    let grand = grand_total(data);
    ranked_totals(data)
        .into_iter()
        .take(n)
        .enumerate()
        .map(|(idx, (manufacturer, registrations))| ShareRow {
            rank: idx + 1,
            manufacturer,
            registrations,
            market_share: if grand == 0.0 { 0.0 } else { registrations * 100.0 / grand },
        })
        .collect()
}

/// Combined share held by the top `n` manufacturers.
pub fn top_share(data: &[CanonicalRecord], n: usize) -> f64 {
    top_manufacturers(data, n).iter().map(|r| r.market_share).sum()
}

/// Manufacturers ranked by their mean year-over-year growth.
///
/// Growth is taken between consecutive years in which the manufacturer has
/// data; manufacturers with no defined growth figure are left out.
pub fn manufacturer_growth(data: &[CanonicalRecord], n: usize) -> Vec<GrowthRow> {
    let mut order: Vec<&str> = Vec::new();
    let mut yearly: HashMap<&str, BTreeMap<i32, f64>> = HashMap::new();
    for r in data {
        let e = yearly.entry(r.manufacturer.as_str()).or_insert_with(|| {
            order.push(r.manufacturer.as_str());
            BTreeMap::new()
        });
        *e.entry(r.year).or_insert(0.0) += r.registrations;
    }

    let mut scored: Vec<(String, f64)> = order
        .into_iter()
        .filter_map(|name| {
            let totals: Vec<f64> = yearly.get(name)?.values().copied().collect();
            let changes: Vec<f64> = totals
                .windows(2)
                .filter_map(|w| pct_change(w[0], w[1]))
                .collect();
            mean(&changes).map(|avg| (name.to_string(), avg))
        })
        .collect();
    scored.sort_by(|a, b| b.1.total_cmp(&a.1));

    scored
        .into_iter()
        .take(n)
        .enumerate()
        .map(|(idx, (manufacturer, avg_yoy_growth))| GrowthRow {
            rank: idx + 1,
            manufacturer,
            avg_yoy_growth,
        })
        .collect()
}

/// Mean registrations per canonical row for each calendar month.
pub fn monthly_pattern(data: &[CanonicalRecord]) -> Vec<MonthPatternRow> {
    let mut by_month: BTreeMap<u32, (f64, usize)> = BTreeMap::new();
    for r in data {
        let e = by_month.entry(r.month_number).or_insert((0.0, 0));
        e.0 += r.registrations;
        e.1 += 1;
    }
    by_month
        .into_iter()
        .filter_map(|(num, (sum, count))| {
            Some(MonthPatternRow {
                month_number: num,
                month: Month::from_number(num)?,
                avg_registrations: sum / count as f64,
            })
        })
        .collect()
}

/// Headline metrics. Fails with [`ReportError::EmptyResult`] on an empty table.
pub fn generate_summary(data: &[CanonicalRecord], top_n: usize) -> Result<SummaryStats> {
    let first_year = data.iter().map(|r| r.year).min().ok_or(ReportError::EmptyResult)?;
    let last_year = data.iter().map(|r| r.year).max().ok_or(ReportError::EmptyResult)?;

    let total_registrations = grand_total(data);
    let manufacturers: HashSet<&str> = data.iter().map(|r| r.manufacturer.as_str()).collect();
    let dates: HashSet<_> = data.iter().map(|r| r.date).collect();
    let yearly = yearly_totals(data);

    Ok(SummaryStats {
        record_count: data.len(),
        total_registrations,
        unique_manufacturers: manufacturers.len(),
        first_year,
        last_year,
        avg_monthly: total_registrations / dates.len() as f64,
        average_yoy_growth: average_yoy(&yearly),
        latest_yoy_growth: latest_yoy(&yearly),
        total_growth: total_growth(&yearly),
        top_share_pct: top_share(data, top_n),
    })
}

/// Short textual takeaways. Lines whose metric is undefined are omitted.
pub fn insights(summary: &SummaryStats, top_n: usize) -> Vec<String> {
    let mut out = Vec::new();
    if let Some(avg) = summary.average_yoy_growth {
        out.push(format!(
            "Market growth: average YoY growth of {} across {}",
            format_pct(Some(avg)),
            summary.years_covered()
        ));
    }
    out.push(format!(
        "Market concentration: top {} manufacturers hold {:.1}% of total registrations",
        top_n, summary.top_share_pct
    ));
    if let Some(latest) = summary.latest_yoy_growth {
        out.push(format!(
            "Latest year: {} growth in {}",
            format_pct(Some(latest)),
            summary.last_year
        ));
    }
    if let Some(total) = summary.total_growth {
        out.push(format!(
            "Whole period: {} growth from {} to {}",
            format_pct(Some(total)),
            summary.first_year,
            summary.last_year
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn rec(name: &str, year: i32, month: Month, registrations: f64) -> CanonicalRecord {
        CanonicalRecord {
            sequence_id: "1".to_string(),
            manufacturer: name.to_string(),
            month,
            registrations,
            year,
            month_number: month.number(),
            date: NaiveDate::from_ymd_opt(year, month.number(), 1).unwrap(),
        }
    }

    #[test]
    fn yoy_growth_undefined_for_first_year() {
        let data = vec![
            rec("A", 2021, Month::Jan, 600.0),
            rec("B", 2021, Month::Feb, 400.0),
            rec("A", 2022, Month::Jan, 1200.0),
        ];
        let rows = yearly_totals(&data);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].registrations, 1000.0);
        assert_eq!(rows[0].yoy_growth, None);
        assert_eq!(rows[1].yoy_growth, Some(20.0));
        assert_eq!(average_yoy(&rows), Some(20.0));
        assert_eq!(latest_yoy(&rows), Some(20.0));
        assert_eq!(total_growth(&rows), Some(20.0));
    }

    #[test]
    fn yoy_undefined_after_zero_year() {
        let data = vec![rec("A", 2021, Month::Jan, 0.0), rec("A", 2022, Month::Jan, 10.0)];
        let rows = yearly_totals(&data);
        assert_eq!(rows[1].yoy_growth, None);
        assert_eq!(average_yoy(&rows), None);
        assert_eq!(total_growth(&rows), None);
    }

    #[test]
    fn market_share_and_ranking() {
        let data = vec![
            rec("C", 2021, Month::Jan, 200.0),
            rec("A", 2021, Month::Jan, 500.0),
            rec("B", 2021, Month::Jan, 300.0),
        ];
        let top = top_manufacturers(&data, 2);
        assert_eq!(top.len(), 2);
        assert_eq!((top[0].manufacturer.as_str(), top[0].market_share), ("A", 50.0));
        assert_eq!((top[1].manufacturer.as_str(), top[1].market_share), ("B", 30.0));
        let all = top_manufacturers(&data, 10);
        assert_eq!(all[2].market_share, 20.0);
        assert_eq!(top_share(&data, 2), 80.0);
    }

    #[test]
    fn ties_keep_encounter_order() {
        let data = vec![
            rec("Z", 2021, Month::Jan, 100.0),
            rec("Y", 2021, Month::Jan, 100.0),
            rec("X", 2021, Month::Jan, 100.0),
        ];
        let names: Vec<String> = top_manufacturers(&data, 3)
            .into_iter()
            .map(|r| r.manufacturer)
            .collect();
        assert_eq!(names, vec!["Z", "Y", "X"]);
    }

    #[test]
    fn quarterly_growth_is_chronological() {
        let data = vec![
            rec("A", 2021, Month::Apr, 150.0),
            rec("A", 2021, Month::Jan, 50.0),
            rec("A", 2021, Month::Feb, 50.0),
            rec("A", 2022, Month::Jan, 75.0),
        ];
        let q = quarterly_totals(&data);
        let labels: Vec<&str> = q.iter().map(|r| r.quarter.as_str()).collect();
        assert_eq!(labels, vec!["2021Q1", "2021Q2", "2022Q1"]);
        assert_eq!(q[0].registrations, 100.0);
        assert_eq!(q[0].qoq_growth, None);
        assert_eq!(q[1].qoq_growth, Some(50.0));
        assert_eq!(q[2].qoq_growth, Some(-50.0));
    }

    #[test]
    fn manufacturer_growth_skips_single_year_makers() {
        let data = vec![
            rec("A", 2021, Month::Jan, 100.0),
            rec("A", 2022, Month::Jan, 200.0),
            rec("A", 2023, Month::Jan, 100.0),
            rec("B", 2021, Month::Jan, 100.0),
            rec("B", 2022, Month::Jan, 300.0),
            rec("C", 2022, Month::Jan, 999.0),
        ];
        let g = manufacturer_growth(&data, 5);
        assert_eq!(g.len(), 2);
        assert_eq!(g[0].manufacturer, "B");
        assert_eq!(g[0].avg_yoy_growth, 200.0);
        assert_eq!(g[1].manufacturer, "A");
        assert_eq!(g[1].avg_yoy_growth, 25.0);
    }

    #[test]
    fn monthly_pattern_averages_rows() {
        let data = vec![
            rec("A", 2021, Month::Jan, 10.0),
            rec("B", 2021, Month::Jan, 30.0),
            rec("A", 2021, Month::Mar, 5.0),
        ];
        let p = monthly_pattern(&data);
        assert_eq!(p.len(), 2);
        assert_eq!((p[0].month, p[0].avg_registrations), (Month::Jan, 20.0));
        assert_eq!((p[1].month_number, p[1].avg_registrations), (3, 5.0));
    }

    #[test]
    fn summary_counts_and_averages() {
        let data = vec![
            rec("A", 2021, Month::Jan, 600.0),
            rec("B", 2021, Month::Jan, 400.0),
            rec("A", 2022, Month::Feb, 1200.0),
        ];
        let s = generate_summary(&data, 5).unwrap();
        assert_eq!(s.record_count, 3);
        assert_eq!(s.total_registrations, 2200.0);
        assert_eq!(s.unique_manufacturers, 2);
        assert_eq!(s.years_covered(), "2021-2022");
        assert_eq!(s.avg_monthly, 1100.0);
        assert_eq!(s.latest_yoy_growth, Some(20.0));
        assert!((s.top_share_pct - 100.0).abs() < 1e-9);
        let lines = insights(&s, 5);
        assert!(lines.iter().any(|l| l.contains("20.0%")));
    }

    #[test]
    fn summary_of_empty_table_is_an_error() {
        assert!(matches!(generate_summary(&[], 5), Err(ReportError::EmptyResult)));
    }
}
