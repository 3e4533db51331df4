use thiserror::Error;

/// Failures raised by [`crate::signal::TimeSeries`] queries and transforms.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SeriesError {
    #[error("series is empty")]
    Empty,
    #[error("start time {start} is beyond the range of the series; it must be <= {last}")]
    StartOutOfRange { start: f64, last: f64 },
    #[error("end time {end} is before the range of the series; it must be >= {first}")]
    EndOutOfRange { end: f64, first: f64 },
    #[error("range bounds must be finite, got [{start}, {end}]")]
    NonFiniteBound { start: f64, end: f64 },
    #[error("range [{start}, {end}] is inverted")]
    InvertedRange { start: f64, end: f64 },
    #[error("total weight of the series is zero")]
    ZeroWeight,
    #[error("{quantity} range is zero-width at {value}; cannot normalize")]
    DegenerateRange { quantity: &'static str, value: f64 },
    #[error("{0} cannot be represented as a fixed-point decimal")]
    Unrepresentable(f64),
    #[error("fixed-point arithmetic overflowed")]
    Overflow,
}

/// Failures raised while building a mean event profile.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StackError {
    #[error("event catalog is empty")]
    EmptyCatalog,
    #[error("cadence must be positive and finite, got {0}")]
    InvalidCadence(f64),
    #[error("every event has zero width around its peak; no bins to stack")]
    ZeroHalfWidth,
    #[error("event weights sum to zero")]
    ZeroWeightSum,
    #[error("event {index} has a non-finite {field}: {value}")]
    NonFinite {
        index: usize,
        field: &'static str,
        value: f64,
    },
    #[error("event {index} window [{start}, {end}] is not covered by the curve [{first}, {last}]")]
    Uncovered {
        index: usize,
        start: f64,
        end: f64,
        first: f64,
        last: f64,
    },
    #[error("a window of {span} needs more than {limit} bins at cadence {cadence}")]
    TooManyBins { span: f64, cadence: f64, limit: usize },
    #[error(transparent)]
    Series(#[from] SeriesError),
}

/// A single whitespace-separated record that could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    #[error("record is empty")]
    Empty,
    #[error("missing `{0}` field")]
    Missing(&'static str),
    #[error("`{field}` is not a number: {value}")]
    NotANumber { field: &'static str, value: String },
    #[error("`{field}` must be finite, got {value}")]
    NonFinite { field: &'static str, value: String },
    #[error("unexpected trailing field: {0}")]
    Trailing(String),
}
