// src/services/chart.rs
use chrono::{Datelike, NaiveDate};
use std::collections::BTreeSet;

use crate::models::{Baseline, Boundary, ChartSeries, ChartView};

pub fn y_axis_title(view: ChartView) -> &'static str {
    match view {
        ChartView::Price => "Price (USD)",
        ChartView::Normalized(Baseline::Percent) => "% Change",
        ChartView::Normalized(Baseline::Index100) => "Index (Start = 100)",
    }
}

/// Horizontal reference line drawn at the baseline of the percent view.
pub fn baseline_rule(view: ChartView) -> Option<f64> {
    match view {
        ChartView::Normalized(Baseline::Percent) => Some(0.0),
        _ => None,
    }
}

/// First plotted date of every calendar month, labelled like "Jan 2024".
pub fn month_boundaries(series: &[ChartSeries]) -> Vec<Boundary> {
    let dates: BTreeSet<NaiveDate> = series
        .iter()
        .flat_map(|s| s.points.iter().map(|p| p.date))
        .collect();

    let mut boundaries: Vec<Boundary> = Vec::new();
    for date in dates {
        let new_month = match boundaries.last() {
            Some(prev) => (prev.date.year(), prev.date.month()) != (date.year(), date.month()),
            None => true,
        };
        if new_month {
            boundaries.push(Boundary {
                date,
                label: date.format("%b %Y").to_string(),
            });
        }
    }
    boundaries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SeriesPoint;

    #[test]
    fn one_boundary_per_month() {
        let d = |m, day| NaiveDate::from_ymd_opt(2024, m, day).unwrap();
        let series = vec![
            ChartSeries {
                symbol: "SPY".into(),
                live_patched: false,
                points: vec![
                    SeriesPoint { date: d(1, 30), value: 0.0 },
                    SeriesPoint { date: d(2, 1), value: 1.0 },
                ],
            },
            ChartSeries {
                symbol: "BTC-USD".into(),
                live_patched: true,
                points: vec![
                    SeriesPoint { date: d(1, 31), value: 0.0 },
                    SeriesPoint { date: d(2, 3), value: 2.0 },
                    SeriesPoint { date: d(3, 2), value: 3.0 },
                ],
            },
        ];

        let boundaries = month_boundaries(&series);
        let labels: Vec<_> = boundaries.iter().map(|b| b.label.as_str()).collect();
        assert_eq!(labels, vec!["Jan 2024", "Feb 2024", "Mar 2024"]);
        assert_eq!(boundaries[1].date, d(2, 1));
    }

    #[test]
    fn titles_and_rules() {
        assert_eq!(y_axis_title(ChartView::Price), "Price (USD)");
        assert_eq!(baseline_rule(ChartView::default()), Some(0.0));
        assert_eq!(baseline_rule(ChartView::Normalized(Baseline::Index100)), None);
    }
}
