use crate::signal::TimeSeries;
use std::ops::Range;

/// What the `plot` command draws: a thinned time/flux polyline plus axis
/// ranges taken from the full series.
#[derive(Debug, Clone, PartialEq)]
pub struct CurvePlot {
    pub title: String,
    pub points: Vec<(f64, f64)>,
    pub time_range: Range<f64>,
    pub flux_range: Range<f64>,
}

impl CurvePlot {
    /// Keeps every `n`th sample so that at most `max_points` are drawn.
    pub fn new(title: &str, series: &TimeSeries, max_points: usize) -> Self {
        let stride = series.len().div_ceil(max_points.max(1)).max(1);
        Self {
            title: title.to_string(),
            points: series
                .iter()
                .step_by(stride)
                .map(|s| (s.time, s.flux))
                .collect(),
            time_range: span(series.iter().map(|s| s.time)),
            flux_range: span(series.iter().map(|s| s.flux)),
        }
    }
}

/// `min..max`, widened by one when flat so plotters can still scale it.
fn span(values: impl Iterator<Item = f64>) -> Range<f64> {
    let Some((lo, hi)) = values.fold(None, |acc: Option<(f64, f64)>, v| match acc {
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        None => Some((v, v)),
    }) else {
        return 0.0..1.0;
    };
    if hi > lo {
        lo..hi
    } else {
        lo..lo + 1.0
    }
}
