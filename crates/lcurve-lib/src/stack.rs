use crate::{
    error::{RecordError, StackError},
    io::fields::FieldReader,
    sample::Sample,
    signal::TimeSeries,
};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Kepler long-cadence sampling interval, in seconds.
pub const KEPLER_LONG_CADENCE: f64 = 58.84876;

/// Slack added to each bin's upper bound so samples sitting on the boundary
/// are not lost to rounding.
pub const BIN_EPSILON: f64 = 1e-6;

/// Upper bound on profile length; a catalog in the wrong units should fail
/// rather than allocate.
pub const MAX_BINS: usize = 1_000_000;

/// One catalog row: an event's start, end and peak time plus its weight.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub start: f64,
    pub end: f64,
    pub peak: f64,
    #[serde(default = "unit_weight")]
    pub weight: f64,
}

fn unit_weight() -> f64 {
    1.0
}

impl EventRecord {
    pub fn new(start: f64, end: f64, peak: f64) -> Self {
        Self::weighted(start, end, peak, unit_weight())
    }

    pub fn weighted(start: f64, end: f64, peak: f64, weight: f64) -> Self {
        Self {
            start,
            end,
            peak,
            weight,
        }
    }

    /// Largest distance from the peak to either edge of the event.
    pub fn excursion(&self) -> f64 {
        (self.end - self.peak).max(self.peak - self.start)
    }

    fn check_finite(&self, index: usize) -> Result<(), StackError> {
        [
            ("start", self.start),
            ("end", self.end),
            ("peak", self.peak),
            ("weight", self.weight),
        ]
        .into_iter()
        .find(|(_, value)| !value.is_finite())
        .map_or(Ok(()), |(field, value)| {
            Err(StackError::NonFinite {
                index,
                field,
                value,
            })
        })
    }
}

impl FromStr for EventRecord {
    type Err = RecordError;

    /// Parse `start end peak [weight]`, whitespace separated.
    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut fields = FieldReader::new(line)?;
        let start = fields.required("start")?;
        let end = fields.required("end")?;
        let peak = fields.required("peak")?;
        let weight = fields.optional("weight")?.unwrap_or_else(unit_weight);
        fields.finish()?;
        Ok(Self::weighted(start, end, peak, weight))
    }
}

/// Parameters for averaging many events into one profile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EventStacker {
    /// Bin width; normally the instrument cadence.
    pub cadence: f64,
    pub epsilon: f64,
    /// Scale each event by its catalog weight and divide by the weight sum
    /// instead of the event count.
    pub weighted: bool,
}

impl Default for EventStacker {
    fn default() -> Self {
        Self {
            cadence: KEPLER_LONG_CADENCE,
            epsilon: BIN_EPSILON,
            weighted: false,
        }
    }
}

/// What went into a stacked profile.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StackSummary {
    pub events: usize,
    pub half_width: f64,
    pub bins: usize,
    pub cadence: f64,
    pub weighted: bool,
    /// Divisor applied to every bin: the weight sum, or the event count.
    pub normalizer: f64,
}

/// Averaged event, peak at time zero, plus the bookkeeping behind it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeanEventProfile {
    pub profile: TimeSeries,
    pub summary: StackSummary,
}

impl EventStacker {
    pub fn new(cadence: f64) -> Self {
        Self {
            cadence,
            ..Self::default()
        }
    }

    pub fn with_weights(mut self, weighted: bool) -> Self {
        self.weighted = weighted;
        self
    }

    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    /// Stack every catalog event of `curve` into one mean profile.
    ///
    /// All events are widened to the largest peak excursion in the catalog,
    /// cut into `cadence`-wide bins starting at `peak - half_width`, and each
    /// bin is the mean flux of the curve inside it. Bins are summed across
    /// events (weight-scaled when weighted) and divided by the weight sum or
    /// the event count. Bin `k` lands at `-half_width + k * cadence`.
    ///
    /// Every catalog value must be finite, and every widened window
    /// `[peak - half_width, peak + half_width]` must lie inside the curve.
    pub fn stack(
        &self,
        curve: &TimeSeries,
        events: &[EventRecord],
    ) -> Result<MeanEventProfile, StackError> {
        if !(self.cadence.is_finite() && self.cadence > 0.0) {
            return Err(StackError::InvalidCadence(self.cadence));
        }
        if events.is_empty() {
            return Err(StackError::EmptyCatalog);
        }

        for (index, event) in events.iter().enumerate() {
            event.check_finite(index)?;
        }

        let half_width = events.iter().map(EventRecord::excursion).fold(0.0, f64::max);
        if half_width == 0.0 {
            return Err(StackError::ZeroHalfWidth);
        }

        let (first, last) = (curve.first_time()?, curve.last_time()?);
        for (index, event) in events.iter().enumerate() {
            let (start, end) = (event.peak - half_width, event.peak + half_width);
            if start < first || end > last {
                return Err(StackError::Uncovered {
                    index,
                    start,
                    end,
                    first,
                    last,
                });
            }
        }

        let span = 2.0 * half_width;
        let bins = bin_count(span, self.cadence).ok_or(StackError::TooManyBins {
            span,
            cadence: self.cadence,
            limit: MAX_BINS,
        })?;

        let normalizer = if self.weighted {
            let total: f64 = events.iter().map(|e| e.weight).sum();
            if total == 0.0 {
                return Err(StackError::ZeroWeightSum);
            }
            total
        } else {
            events.len() as f64
        };

        let mut sums = vec![0.0; bins];
        for (index, event) in events.iter().enumerate() {
            let start = event.peak - half_width;
            let scale = if self.weighted { event.weight } else { 1.0 };
            for (k, sum) in sums.iter_mut().enumerate() {
                let t = start + k as f64 * self.cadence;
                let mean = curve
                    .subsection(t, t + self.cadence + self.epsilon)?
                    .average_flux()?;
                *sum += mean * scale;
            }
            debug!(
                "stacked event {} (peak {}, weight {})",
                index, event.peak, scale
            );
        }

        let profile: TimeSeries = sums
            .into_iter()
            .enumerate()
            .map(|(k, sum)| Sample::new(-half_width + k as f64 * self.cadence, sum / normalizer))
            .collect();

        let summary = StackSummary {
            events: events.len(),
            half_width,
            bins,
            cadence: self.cadence,
            weighted: self.weighted,
            normalizer,
        };
        info!(
            "stacked {} events into {} bins (half width {})",
            summary.events, summary.bins, summary.half_width
        );
        Ok(MeanEventProfile { profile, summary })
    }
}

/// Number of steps `k >= 0` with `k * cadence < span`, or `None` past
/// [`MAX_BINS`].
fn bin_count(span: f64, cadence: f64) -> Option<usize> {
    let steps = (span / cadence).floor();
    if !(steps >= 0.0 && steps < MAX_BINS as f64) {
        return None;
    }
    let mut bins = steps as usize;
    while (bins as f64) * cadence < span {
        bins += 1;
    }
    Some(bins)
}

/// Stack with the default cadence and epsilon.
pub fn mean_event_profile(
    curve: &TimeSeries,
    events: &[EventRecord],
    weighted: bool,
) -> Result<MeanEventProfile, StackError> {
    EventStacker::default()
        .with_weights(weighted)
        .stack(curve, events)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SeriesError;

    fn flat_curve(flux: f64) -> TimeSeries {
        (0..=100).map(|i| Sample::new(i as f64, flux)).collect()
    }

    /// Flux 2 before t=50, flux 6 from t=50 on.
    fn step_curve() -> TimeSeries {
        (0..=100)
            .map(|i| Sample::new(i as f64, if i < 50 { 2.0 } else { 6.0 }))
            .collect()
    }

    #[test]
    fn flat_curve_gives_flat_profile() {
        let events = [EventRecord::new(45.0, 55.0, 50.0), EventRecord::new(20.0, 30.0, 25.0)];
        let result = EventStacker::new(1.0).stack(&flat_curve(5.0), &events).unwrap();
        assert_eq!(result.profile.len(), 10);
        for sample in &result.profile {
            assert!((sample.flux - 5.0).abs() < 1e-12);
        }
        assert_eq!(result.summary.events, 2);
        assert_eq!(result.summary.normalizer, 2.0);
    }

    #[test]
    fn profile_is_anchored_at_negative_half_width() {
        let events = [
            EventRecord::new(10.0, 14.0, 12.0),
            EventRecord::new(30.0, 38.0, 31.0),
        ];
        let result = EventStacker::new(1.0).stack(&flat_curve(1.0), &events).unwrap();
        assert_eq!(result.summary.half_width, 7.0);
        assert_eq!(result.summary.bins, 14);
        let times: Vec<f64> = result.profile.iter().map(|s| s.time).collect();
        assert_eq!(times.first(), Some(&-7.0));
        assert_eq!(times.last(), Some(&6.0));
    }

    #[test]
    fn unweighted_divides_by_event_count() {
        let events = [
            EventRecord::weighted(20.0, 24.0, 22.0, 1.0),
            EventRecord::weighted(70.0, 74.0, 72.0, 3.0),
        ];
        let result = EventStacker::new(1.0).stack(&step_curve(), &events).unwrap();
        for sample in &result.profile {
            assert!((sample.flux - 4.0).abs() < 1e-12);
        }
    }

    #[test]
    fn weighted_divides_by_weight_sum() {
        let events = [
            EventRecord::weighted(20.0, 24.0, 22.0, 1.0),
            EventRecord::weighted(70.0, 74.0, 72.0, 3.0),
        ];
        let result = EventStacker::new(1.0)
            .with_weights(true)
            .stack(&step_curve(), &events)
            .unwrap();
        assert_eq!(result.summary.normalizer, 4.0);
        for sample in &result.profile {
            assert!((sample.flux - 5.0).abs() < 1e-12);
        }
    }

    #[test]
    fn catalog_order_does_not_change_the_profile() {
        let a = EventRecord::new(20.0, 23.0, 22.0);
        let b = EventRecord::new(60.0, 66.0, 61.0);
        let curve: TimeSeries = (0..=100)
            .map(|i| Sample::new(i as f64, (i as f64 * 0.7).sin()))
            .collect();
        let stacker = EventStacker::new(1.0);
        let forward = stacker.stack(&curve, &[a, b]).unwrap();
        let backward = stacker.stack(&curve, &[b, a]).unwrap();
        for (x, y) in forward.profile.iter().zip(backward.profile.iter()) {
            assert_eq!(x.time, y.time);
            assert!((x.flux - y.flux).abs() < 1e-12);
        }
    }

    #[test]
    fn empty_catalog_is_rejected() {
        assert_eq!(
            EventStacker::new(1.0).stack(&flat_curve(1.0), &[]),
            Err(StackError::EmptyCatalog)
        );
    }

    #[test]
    fn bad_cadence_is_rejected() {
        let events = [EventRecord::new(1.0, 3.0, 2.0)];
        assert_eq!(
            EventStacker::new(0.0).stack(&flat_curve(1.0), &events),
            Err(StackError::InvalidCadence(0.0))
        );
        assert!(matches!(
            EventStacker::new(f64::NAN).stack(&flat_curve(1.0), &events),
            Err(StackError::InvalidCadence(_))
        ));
    }

    #[test]
    fn zero_width_events_are_rejected() {
        let events = [EventRecord::new(5.0, 5.0, 5.0)];
        assert_eq!(
            EventStacker::new(1.0).stack(&flat_curve(1.0), &events),
            Err(StackError::ZeroHalfWidth)
        );
    }

    #[test]
    fn zero_weight_sum_is_rejected() {
        let events = [EventRecord::weighted(1.0, 3.0, 2.0, 0.0)];
        assert_eq!(
            EventStacker::new(1.0)
                .with_weights(true)
                .stack(&flat_curve(1.0), &events),
            Err(StackError::ZeroWeightSum)
        );
    }

    #[test]
    fn events_beyond_the_curve_fail() {
        let events = [
            EventRecord::new(45.0, 55.0, 50.0),
            EventRecord::new(300.0, 310.0, 305.0),
        ];
        match EventStacker::new(1.0).stack(&flat_curve(1.0), &events) {
            Err(StackError::Uncovered { index, first, last, .. }) => {
                assert_eq!(index, 1);
                assert_eq!((first, last), (0.0, 100.0));
            }
            other => panic!("expected uncovered event, got {:?}", other),
        }
    }

    #[test]
    fn window_straddling_the_curve_start_fails() {
        // Own extent fits, but the shared half width of 5 reaches t = -3.
        let events = [
            EventRecord::new(45.0, 55.0, 50.0),
            EventRecord::new(1.0, 3.0, 2.0),
        ];
        assert_eq!(
            EventStacker::new(1.0).stack(&flat_curve(1.0), &events),
            Err(StackError::Uncovered {
                index: 1,
                start: -3.0,
                end: 7.0,
                first: 0.0,
                last: 100.0
            })
        );
    }

    #[test]
    fn window_straddling_the_curve_end_fails() {
        let events = [
            EventRecord::new(45.0, 55.0, 50.0),
            EventRecord::new(97.0, 99.0, 98.0),
        ];
        assert_eq!(
            EventStacker::new(1.0).stack(&flat_curve(1.0), &events),
            Err(StackError::Uncovered {
                index: 1,
                start: 93.0,
                end: 103.0,
                first: 0.0,
                last: 100.0
            })
        );
    }

    #[test]
    fn window_touching_both_curve_ends_is_accepted() {
        let events = [EventRecord::new(0.0, 100.0, 50.0)];
        let result = EventStacker::new(1.0).stack(&flat_curve(2.0), &events).unwrap();
        assert_eq!(result.summary.bins, 100);
        assert!((result.profile.last().unwrap().flux - 2.0).abs() < 1e-12);
    }

    #[test]
    fn non_finite_catalog_values_are_rejected() {
        let events = [
            EventRecord::new(40.0, 44.0, 42.0),
            EventRecord::new(f64::NAN, f64::NAN, f64::NAN),
        ];
        assert!(matches!(
            EventStacker::new(1.0).stack(&flat_curve(1.0), &events),
            Err(StackError::NonFinite {
                index: 1,
                field: "start",
                ..
            })
        ));

        let events = [EventRecord::new(0.0, f64::INFINITY, 1.0)];
        assert!(matches!(
            EventStacker::new(1.0).stack(&flat_curve(1.0), &events),
            Err(StackError::NonFinite { field: "end", .. })
        ));

        let events = [EventRecord::weighted(1.0, 3.0, 2.0, f64::NAN)];
        assert!(matches!(
            EventStacker::new(1.0).stack(&flat_curve(1.0), &events),
            Err(StackError::NonFinite { field: "weight", .. })
        ));
    }

    #[test]
    fn oversized_events_fail_before_allocating() {
        let events = [EventRecord::new(0.0, 1e18, 1.0)];
        assert!(matches!(
            EventStacker::new(1.0).stack(&flat_curve(1.0), &events),
            Err(StackError::Uncovered { index: 0, .. })
        ));

        let events = [EventRecord::new(10.0, 20.0, 15.0)];
        assert_eq!(
            EventStacker::new(1e-12).stack(&flat_curve(1.0), &events),
            Err(StackError::TooManyBins {
                span: 10.0,
                cadence: 1e-12,
                limit: MAX_BINS
            })
        );
    }

    #[test]
    fn empty_curve_is_rejected() {
        let events = [EventRecord::new(1.0, 3.0, 2.0)];
        assert_eq!(
            EventStacker::new(1.0).stack(&TimeSeries::new(), &events),
            Err(StackError::Series(SeriesError::Empty))
        );
    }

    #[test]
    fn parses_catalog_rows() {
        assert_eq!(
            "1 5 3".parse::<EventRecord>(),
            Ok(EventRecord::new(1.0, 5.0, 3.0))
        );
        assert_eq!(
            "1 5 3 0.25".parse::<EventRecord>(),
            Ok(EventRecord::weighted(1.0, 5.0, 3.0, 0.25))
        );
        assert_eq!(
            "1 5".parse::<EventRecord>(),
            Err(RecordError::Missing("peak"))
        );
    }

    #[test]
    fn counts_bins() {
        assert_eq!(bin_count(0.0, 1.0), Some(0));
        assert_eq!(bin_count(4.0, 1.0), Some(4));
        assert_eq!(bin_count(4.5, 1.0), Some(5));
        assert_eq!(bin_count(2.0 * 300.0, KEPLER_LONG_CADENCE), Some(11));
        assert_eq!(bin_count(f64::INFINITY, 1.0), None);
        assert_eq!(bin_count(1e18, 1.0), None);
    }
}
