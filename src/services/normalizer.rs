// src/services/normalizer.rs
use chrono::NaiveDate;
use log::debug;
use std::collections::BTreeSet;

use crate::error::{DashboardError, Result};
use crate::models::{Baseline, NormalizedSeries, SeriesPoint, TickerSeries};

/// One ticker's prices laid over the shared date index.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedColumn {
    pub symbol: String,
    pub values: Vec<Option<f64>>,
    /// Real closes inside the window; forward-filled cells are not counted.
    pub observed: usize,
}

/// Several tickers on a common, ascending date index.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AlignedFrame {
    pub dates: Vec<NaiveDate>,
    pub columns: Vec<AlignedColumn>,
}

impl AlignedFrame {
    pub fn column(&self, symbol: &str) -> Option<&AlignedColumn> {
        self.columns.iter().find(|c| c.symbol == symbol)
    }

    /// Present values of a column as chart points, skipping gaps.
    pub fn points(&self, column: &AlignedColumn) -> Vec<SeriesPoint> {
        self.dates
            .iter()
            .zip(&column.values)
            .filter_map(|(&date, value)| value.map(|value| SeriesPoint { date, value }))
            .collect()
    }
}

/// Builds the union date index, forward-fills each ticker across it and drops
/// rows before `start`. Column order follows `series`.
pub fn align(series: &[TickerSeries], start: NaiveDate) -> AlignedFrame {
    let all_dates: BTreeSet<NaiveDate> = series
        .iter()
        .flat_map(|s| s.points().iter().map(|p| p.date))
        .collect();
    let all_dates: Vec<NaiveDate> = all_dates.into_iter().collect();
    let first_kept = all_dates.partition_point(|d| *d < start);

    let columns = series
        .iter()
        .map(|s| {
            let mut points = s.points().iter().peekable();
            let mut last = None;
            let values: Vec<Option<f64>> = all_dates
                .iter()
                .map(|date| {
                    while let Some(p) = points.next_if(|p| p.date <= *date) {
                        last = Some(p.price);
                    }
                    last
                })
                .collect();

            AlignedColumn {
                symbol: s.symbol().to_string(),
                values: values[first_kept..].to_vec(),
                observed: s.points().iter().filter(|p| p.date >= start).count(),
            }
        })
        .collect();

    AlignedFrame {
        dates: all_dates[first_kept..].to_vec(),
        columns,
    }
}

/// Rescales one aligned column so its value on the first common date is the
/// baseline. Dates the ticker has no value for are left out.
pub fn normalize_column(
    dates: &[NaiveDate],
    column: &AlignedColumn,
    baseline: Baseline,
) -> Result<NormalizedSeries> {
    let symbol = &column.symbol;
    let observations = column.observed;
    if observations < 2 {
        return Err(DashboardError::InsufficientData {
            symbol: symbol.clone(),
            observations,
        });
    }

    let base = match column.values.first().copied().flatten() {
        Some(price) if price != 0.0 && price.is_finite() => price,
        _ => {
            return Err(DashboardError::InvalidBaseline {
                symbol: symbol.clone(),
            })
        }
    };

    let points = dates
        .iter()
        .zip(&column.values)
        .enumerate()
        .filter_map(|(i, (&date, value))| {
            value.map(|price| SeriesPoint {
                date,
                // t0 is pinned so the baseline holds exactly
                value: if i == 0 { baseline.origin() } else { baseline.scale(price, base) },
            })
        })
        .collect();

    debug!("Normalized {} against base price {}", symbol, base);
    Ok(NormalizedSeries {
        symbol: symbol.clone(),
        baseline,
        points,
    })
}

/// Normalizes every column of the frame, keeping per-ticker failures separate.
pub fn normalize_frame(
    frame: &AlignedFrame,
    baseline: Baseline,
) -> Vec<(String, Result<NormalizedSeries>)> {
    frame
        .columns
        .iter()
        .map(|c| (c.symbol.clone(), normalize_column(&frame.dates, c, baseline)))
        .collect()
}

/// Normalizes a single series on its own dates.
pub fn normalize_series(series: &TickerSeries, baseline: Baseline) -> Result<NormalizedSeries> {
    let dates: Vec<NaiveDate> = series.points().iter().map(|p| p.date).collect();
    let column = AlignedColumn {
        symbol: series.symbol().to_string(),
        values: series.points().iter().map(|p| Some(p.price)).collect(),
        observed: series.len(),
    };
    normalize_column(&dates, &column, baseline)
}
