use crate::error::SeriesError;
use crate::precision::Precision;
use crate::sample::Sample;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which coordinate of a sample a transform acts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Quantity {
    Time,
    Flux,
}

impl Quantity {
    pub fn name(&self) -> &'static str {
        match self {
            Quantity::Time => "time",
            Quantity::Flux => "flux",
        }
    }

    fn read(&self, sample: &Sample) -> f64 {
        match self {
            Quantity::Time => sample.time,
            Quantity::Flux => sample.flux,
        }
    }

    fn write(&self, sample: &mut Sample, value: f64) {
        match self {
            Quantity::Time => sample.set_time(value),
            Quantity::Flux => sample.set_flux(value),
        }
    }
}

/// Light curve: samples ordered by ascending time.
///
/// Ordering is the caller's responsibility; nothing here re-sorts. Every
/// derived series (subsection, smoothing, normalization) owns fresh copies of
/// its samples.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeSeries {
    samples: Vec<Sample>,
}

/// Scalar overview of a series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesSummary {
    pub count: usize,
    pub first_time: f64,
    pub last_time: f64,
    pub min_flux: f64,
    pub max_flux: f64,
    pub mean_flux: f64,
    /// `None` when every weight is zero.
    pub weighted_mean_flux: Option<f64>,
}

impl From<Vec<Sample>> for TimeSeries {
    fn from(samples: Vec<Sample>) -> Self {
        Self { samples }
    }
}

impl FromIterator<Sample> for TimeSeries {
    fn from_iter<I: IntoIterator<Item = Sample>>(iter: I) -> Self {
        Self {
            samples: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a TimeSeries {
    type Item = &'a Sample;
    type IntoIter = std::slice::Iter<'a, Sample>;

    fn into_iter(self) -> Self::IntoIter {
        self.samples.iter()
    }
}

/// One record per line, no trailing newline.
impl fmt::Display for TimeSeries {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, sample) in self.samples.iter().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            write!(f, "{}", sample)?;
        }
        Ok(())
    }
}

impl TimeSeries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Sample> {
        self.samples.iter()
    }

    pub fn get(&self, index: usize) -> Option<&Sample> {
        self.samples.get(index)
    }

    /// In-place access for callers that own the series.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut Sample> {
        self.samples.get_mut(index)
    }

    pub fn first(&self) -> Option<&Sample> {
        self.samples.first()
    }

    pub fn last(&self) -> Option<&Sample> {
        self.samples.last()
    }

    pub fn first_time(&self) -> Result<f64, SeriesError> {
        self.first().map(|s| s.time).ok_or(SeriesError::Empty)
    }

    pub fn last_time(&self) -> Result<f64, SeriesError> {
        self.last().map(|s| s.time).ok_or(SeriesError::Empty)
    }

    /// Time spanned from the first to the last sample.
    pub fn duration(&self) -> Result<f64, SeriesError> {
        Ok(self.last_time()? - self.first_time()?)
    }

    /// Push onto the end. No ordering check is made.
    pub fn add(&mut self, sample: Sample) {
        self.samples.push(sample);
    }

    /// New series holding `self` followed by `other`.
    pub fn append(&self, other: &TimeSeries) -> TimeSeries {
        let mut samples = Vec::with_capacity(self.len() + other.len());
        samples.extend_from_slice(&self.samples);
        samples.extend_from_slice(&other.samples);
        Self { samples }
    }

    /// Samples from the first time `>= start` through the first time `>= end`.
    ///
    /// Bounds past either end of the series are clamped to it. The upper index
    /// is the first sample at or after `end`, so an `end` that falls between
    /// two samples pulls in the later one. When `end` is exactly the final
    /// time the final sample closes the range.
    pub fn subsection(&self, start: f64, end: f64) -> Result<TimeSeries, SeriesError> {
        let (lo, hi) = self.index_range(start, end)?;
        Ok(Self {
            samples: self.samples[lo..=hi].to_vec(),
        })
    }

    /// Delete, in place, the samples `subsection(start, end)` would return,
    /// except for the last one.
    pub fn remove(&mut self, start: f64, end: f64) -> Result<(), SeriesError> {
        let (lo, hi) = self.index_range(start, end)?;
        self.samples.drain(lo..hi);
        Ok(())
    }

    /// `remove(start, last_time)`. The final sample is kept, as with every
    /// `remove`.
    pub fn remove_from(&mut self, start: f64) -> Result<(), SeriesError> {
        let last = self.last_time()?;
        self.remove(start, last)
    }

    fn index_range(&self, start: f64, end: f64) -> Result<(usize, usize), SeriesError> {
        if !(start.is_finite() && end.is_finite()) {
            return Err(SeriesError::NonFiniteBound { start, end });
        }
        let (first, last) = match (self.samples.first(), self.samples.last()) {
            (Some(first), Some(last)) => (first.time, last.time),
            _ => return Err(SeriesError::Empty),
        };
        if start > last {
            return Err(SeriesError::StartOutOfRange { start, last });
        }
        if end < first {
            return Err(SeriesError::EndOutOfRange { end, first });
        }
        let start = start.max(first);
        let end = end.min(last);
        if start > end {
            return Err(SeriesError::InvertedRange { start, end });
        }
        let lo = self.samples.partition_point(|s| s.time < start);
        let hi = if end == last {
            self.samples.len() - 1
        } else {
            self.samples.partition_point(|s| s.time < end)
        };
        Ok((lo, hi))
    }

    /// Largest flux; the earliest sample wins a tie.
    pub fn max_flux(&self) -> Result<f64, SeriesError> {
        self.extremum(|candidate, best| candidate > best)
    }

    /// Smallest flux; the earliest sample wins a tie.
    pub fn min_flux(&self) -> Result<f64, SeriesError> {
        self.extremum(|candidate, best| candidate < best)
    }

    pub fn max_flux_between(&self, start: f64, end: f64) -> Result<f64, SeriesError> {
        self.subsection(start, end)?.max_flux()
    }

    pub fn min_flux_between(&self, start: f64, end: f64) -> Result<f64, SeriesError> {
        self.subsection(start, end)?.min_flux()
    }

    fn extremum(&self, better: impl Fn(f64, f64) -> bool) -> Result<f64, SeriesError> {
        let (head, rest) = self.samples.split_first().ok_or(SeriesError::Empty)?;
        Ok(rest.iter().fold(head.flux, |best, s| {
            if better(s.flux, best) {
                s.flux
            } else {
                best
            }
        }))
    }

    pub fn average_flux(&self) -> Result<f64, SeriesError> {
        if self.samples.is_empty() {
            return Err(SeriesError::Empty);
        }
        let sum: f64 = self.samples.iter().map(|s| s.flux).sum();
        Ok(sum / self.samples.len() as f64)
    }

    /// `sum(flux * weight) / sum(weight)`.
    pub fn weighted_average_flux(&self) -> Result<f64, SeriesError> {
        if self.samples.is_empty() {
            return Err(SeriesError::Empty);
        }
        let (weighted, total) = self
            .samples
            .iter()
            .fold((0.0, 0.0), |(acc, w), s| (acc + s.flux * s.weight, w + s.weight));
        if total == 0.0 {
            return Err(SeriesError::ZeroWeight);
        }
        Ok(weighted / total)
    }

    pub fn summary(&self) -> Result<SeriesSummary, SeriesError> {
        let weighted_mean_flux = match self.weighted_average_flux() {
            Ok(mean) => Some(mean),
            Err(SeriesError::ZeroWeight) => None,
            Err(err) => return Err(err),
        };
        Ok(SeriesSummary {
            count: self.len(),
            first_time: self.first_time()?,
            last_time: self.last_time()?,
            min_flux: self.min_flux()?,
            max_flux: self.max_flux()?,
            mean_flux: self.average_flux()?,
            weighted_mean_flux,
        })
    }

    pub fn normalize_time(&self, low: f64, high: f64) -> Result<TimeSeries, SeriesError> {
        self.normalize_with(&Precision::default(), Quantity::Time, low, high)
    }

    /// Time rescaled onto `[0, 1]`.
    pub fn normalize_time_unit(&self) -> Result<TimeSeries, SeriesError> {
        self.normalize_time(0.0, 1.0)
    }

    pub fn normalize_flux(&self, low: f64, high: f64) -> Result<TimeSeries, SeriesError> {
        self.normalize_with(&Precision::default(), Quantity::Flux, low, high)
    }

    /// Flux rescaled onto `[0, 1]`.
    pub fn normalize_flux_unit(&self) -> Result<TimeSeries, SeriesError> {
        self.normalize_flux(0.0, 1.0)
    }

    /// Linearly map `quantity` so its minimum lands on `low` and its maximum on
    /// `high`: `low + (v - min) * (high - low) / (max - min)`.
    ///
    /// Time extremes are taken from the first and last samples; flux extremes
    /// from a full scan.
    pub fn normalize_with(
        &self,
        precision: &Precision,
        quantity: Quantity,
        low: f64,
        high: f64,
    ) -> Result<TimeSeries, SeriesError> {
        let (min, max) = match quantity {
            Quantity::Time => (self.first_time()?, self.last_time()?),
            Quantity::Flux => (self.min_flux()?, self.max_flux()?),
        };
        let min_d = precision.up(min)?;
        let span = precision.sub_up(precision.up(max)?, min_d)?;
        if span.is_zero() {
            return Err(SeriesError::DegenerateRange {
                quantity: quantity.name(),
                value: min,
            });
        }
        let low_d = precision.up(low)?;
        let target = precision.sub_up(precision.up(high)?, low_d)?;

        let mut normal = self.clone();
        for sample in normal.samples.iter_mut() {
            let offset = precision.sub_up(precision.up(quantity.read(sample))?, min_d)?;
            let scaled = offset
                .checked_mul(target)
                .and_then(|v| v.checked_div(span))
                .and_then(|v| low_d.checked_add(v))
                .ok_or(SeriesError::Overflow)?;
            let value = precision.to_f64(precision.round_down(scaled))?;
            quantity.write(sample, value);
        }
        Ok(normal)
    }

    pub fn boxcar_smooth(&self, bin_size: usize) -> Result<TimeSeries, SeriesError> {
        self.boxcar_smooth_with(&Precision::default(), bin_size)
    }

    /// Whether a boxcar of `bin_size` changes at least one point, i.e. the
    /// series is longer than the window's reach on both sides.
    pub fn boxcar_smooths(&self, bin_size: usize) -> bool {
        self.len() > 2 * (bin_size / 2)
    }

    /// Moving average over `bin_size` samples centred on each point.
    ///
    /// Even sizes are bumped to the next odd size. Points closer than half a
    /// window to either end keep their original flux.
    pub fn boxcar_smooth_with(
        &self,
        precision: &Precision,
        bin_size: usize,
    ) -> Result<TimeSeries, SeriesError> {
        let bin = if bin_size % 2 == 0 { bin_size + 1 } else { bin_size };
        let half = bin / 2;
        let mut smooth = self.clone();
        if !self.boxcar_smooths(bin_size) {
            return Ok(smooth);
        }

        let fluxes = self
            .samples
            .iter()
            .map(|s| precision.up(s.flux))
            .collect::<Result<Vec<Decimal>, _>>()?;
        let divisor = Decimal::from(bin as u64);
        let mut sum = fluxes[..bin]
            .iter()
            .try_fold(Decimal::ZERO, |acc, v| acc.checked_add(*v))
            .ok_or(SeriesError::Overflow)?;

        for i in half..self.len() - half {
            if i > half {
                sum = sum
                    .checked_add(fluxes[i + half])
                    .and_then(|s| s.checked_sub(fluxes[i - half - 1]))
                    .ok_or(SeriesError::Overflow)?;
            }
            let mean = precision.div_up(sum, divisor)?;
            smooth.samples[i].set_flux(precision.to_f64(mean)?);
        }
        Ok(smooth)
    }
}
