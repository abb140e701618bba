//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - fetching and aggregation stay free of presentation concerns
//! - output changes are localized

use chrono::{DateTime, FixedOffset, Utc};

use crate::app::pipeline::CantonMap;
use crate::domain::{CategoryTotal, Heatmap, QuerySignature, TimeSeriesPoint, TreemapRow};

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Header line describing a feed query.
pub fn format_query_header(query: &QuerySignature) -> String {
    let categories = if query.categories().is_empty() {
        "all".to_string()
    } else {
        query.categories().join(", ")
    };
    format!(
        "=== Public power: {} .. {} ===\nTypes: {categories}\n",
        query.start().format(TIME_FORMAT),
        query.end().format(TIME_FORMAT),
    )
}

/// Rows for the bar/line charts.
pub fn format_series(rows: &[TimeSeriesPoint], offset: FixedOffset) -> String {
    let mut out = String::new();
    out.push_str(&format!("{:<17} {:<24} {:>12}\n", "time", "production type", "power_mw"));
    out.push_str(&format!("{:-<17} {:-<24} {:-<12}\n", "", "", ""));
    for r in rows {
        out.push_str(&format!(
            "{:<17} {:<24} {:>12.1}\n",
            fmt_time(r.timestamp, offset),
            truncate(&r.category, 24),
            r.value
        ));
    }
    out
}

/// Pie chart data with percentage shares.
pub fn format_share(totals: &[CategoryTotal]) -> String {
    let sum: f64 = totals.iter().map(|t| t.total).sum();
    let mut out = String::new();
    out.push_str(&format!("{:<24} {:>14} {:>8}\n", "production type", "total_mw", "share"));
    out.push_str(&format!("{:-<24} {:-<14} {:-<8}\n", "", "", ""));
    for t in totals {
        let share = if sum > 0.0 { t.total / sum * 100.0 } else { 0.0 };
        out.push_str(&format!(
            "{:<24} {:>14.1} {:>7.1}%\n",
            truncate(&t.category, 24),
            t.total,
            share
        ));
    }
    out
}

/// Heatmap, one line per timestamp and one column per category.
///
/// Missing cells print as `-`.
pub fn format_heatmap(heatmap: &Heatmap, offset: FixedOffset) -> String {
    let mut out = String::new();
    out.push_str(&format!("{:<17}", "time"));
    for c in &heatmap.categories {
        out.push_str(&format!(" {:>12}", truncate(c, 12)));
    }
    out.push('\n');

    for (j, t) in heatmap.times.iter().enumerate() {
        out.push_str(&format!("{:<17}", fmt_time(*t, offset)));
        for row in &heatmap.cells {
            match row.get(j).copied().flatten() {
                Some(v) => out.push_str(&format!(" {v:>12.1}")),
                None => out.push_str(&format!(" {:>12}", "-")),
            }
        }
        out.push('\n');
    }
    out
}

pub fn format_canton_map(map: &CantonMap) -> String {
    let mut out = String::new();
    out.push_str(&format!("=== {} by canton (MWh/year) ===\n", map.energy_type.label()));
    out.push_str(&format!("{:<6} {:<24} {:>16}\n", "canton", "name", "mwh"));
    out.push_str(&format!("{:-<6} {:-<24} {:-<16}\n", "", "", ""));
    for c in &map.cells {
        out.push_str(&format!(
            "{:<6} {:<24} {:>16.2}\n",
            c.canton,
            truncate(c.name.unwrap_or("?"), 24),
            c.value
        ));
    }

    out.push_str("\nRanking (producing cantons, ascending):\n");
    for (i, r) in map.ranking.iter().enumerate() {
        out.push_str(&format!("{:>3}. {:<6} {:>16.2}\n", i + 1, r.canton, r.value));
    }
    out
}

pub fn format_treemap(rows: &[TreemapRow], year: i32, per_capita: bool) -> String {
    let unit = if per_capita { "MWh per capita" } else { "MWh" };
    let mut out = String::new();
    out.push_str(&format!(
        "=== {} renewable production by source and canton, {year} ({unit}) ===\n",
        if per_capita { "Per capita" } else { "Total" },
    ));
    out.push_str(&format!("{:<6} {:<8} {:>16}\n", "canton", "source", "value"));
    out.push_str(&format!("{:-<6} {:-<8} {:-<16}\n", "", "", ""));
    for r in rows {
        out.push_str(&format!("{:<6} {:<8} {:>16.2}\n", r.canton, r.source.slug(), r.value));
    }
    out
}

fn fmt_time(ts: DateTime<Utc>, offset: FixedOffset) -> String {
    ts.with_timezone(&offset).format(TIME_FORMAT).to_string()
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    for (i, ch) in s.chars().enumerate() {
        if i + 1 >= max {
            break;
        }
        out.push(ch);
    }
    out.push('.');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn series_renders_in_offset() {
        let rows = vec![TimeSeriesPoint {
            timestamp: Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap(),
            category: "Solar".to_string(),
            value: 10.0,
        }];
        let out = format_series(&rows, FixedOffset::east_opt(3600).unwrap());
        assert!(out.contains("2023-01-01 01:00"));
        assert!(out.contains("10.0"));
    }

    #[test]
    fn heatmap_marks_gaps() {
        let heatmap = Heatmap {
            categories: vec!["Nuclear".to_string(), "Solar".to_string()],
            times: vec![Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap()],
            cells: vec![vec![Some(2900.0)], vec![None]],
        };
        let out = format_heatmap(&heatmap, FixedOffset::east_opt(0).unwrap());
        let line = out.lines().nth(1).unwrap();
        assert!(line.contains("2900.0"));
        assert!(line.trim_end().ends_with('-'));
    }

    #[test]
    fn share_percentages() {
        let totals = vec![
            CategoryTotal {
                category: "Nuclear".to_string(),
                total: 75.0,
            },
            CategoryTotal {
                category: "Solar".to_string(),
                total: 25.0,
            },
        ];
        let out = format_share(&totals);
        assert!(out.contains("75.0%"));
        assert!(out.contains("25.0%"));
    }

    #[test]
    fn truncate_long_names() {
        assert_eq!(truncate("Hydro water reservoir", 8), "Hydro w.");
        assert_eq!(truncate("Solar", 8), "Solar");
    }
}
