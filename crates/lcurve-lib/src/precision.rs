use crate::error::SeriesError;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};

/// Number of decimal places carried by normalization and smoothing.
pub const DEFAULT_SCALE: u32 = 10;

const MAX_SCALE: u32 = 28;

/// Fixed-point decimal context with a configurable scale.
///
/// Inputs and intermediate differences are rounded toward positive infinity
/// (`up`), final results toward negative infinity (`down`). Every operation is
/// checked; anything outside the decimal range surfaces as a [`SeriesError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Precision {
    scale: u32,
}

impl Default for Precision {
    fn default() -> Self {
        Self {
            scale: DEFAULT_SCALE,
        }
    }
}

impl Precision {
    /// Scales above 28 places are clamped to what `Decimal` can hold.
    pub fn new(scale: u32) -> Self {
        Self {
            scale: scale.min(MAX_SCALE),
        }
    }

    pub fn scale(&self) -> u32 {
        self.scale
    }

    /// Convert an `f64` into a decimal rounded up to the configured scale.
    pub fn up(&self, value: f64) -> Result<Decimal, SeriesError> {
        let decimal = Decimal::from_f64(value).ok_or(SeriesError::Unrepresentable(value))?;
        Ok(self.round_up(decimal))
    }

    pub fn round_up(&self, value: Decimal) -> Decimal {
        value.round_dp_with_strategy(self.scale, RoundingStrategy::ToPositiveInfinity)
    }

    pub fn round_down(&self, value: Decimal) -> Decimal {
        value.round_dp_with_strategy(self.scale, RoundingStrategy::ToNegativeInfinity)
    }

    /// `a - b`, rounded up.
    pub fn sub_up(&self, a: Decimal, b: Decimal) -> Result<Decimal, SeriesError> {
        a.checked_sub(b)
            .map(|diff| self.round_up(diff))
            .ok_or(SeriesError::Overflow)
    }

    /// `a / b`, rounded up. Division by zero reports [`SeriesError::Overflow`].
    pub fn div_up(&self, a: Decimal, b: Decimal) -> Result<Decimal, SeriesError> {
        a.checked_div(b)
            .map(|quotient| self.round_up(quotient))
            .ok_or(SeriesError::Overflow)
    }

    pub fn to_f64(&self, value: Decimal) -> Result<f64, SeriesError> {
        value.to_f64().ok_or(SeriesError::Overflow)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_inputs_toward_positive_infinity() {
        let p = Precision::new(2);
        assert_eq!(p.up(1.231).unwrap(), Decimal::new(124, 2));
        assert_eq!(p.up(-1.239).unwrap(), Decimal::new(-123, 2));
    }

    #[test]
    fn rounds_results_toward_negative_infinity() {
        let p = Precision::new(2);
        assert_eq!(p.round_down(Decimal::new(1239, 3)), Decimal::new(123, 2));
        assert_eq!(p.round_down(Decimal::new(-1231, 3)), Decimal::new(-124, 2));
    }

    #[test]
    fn short_decimals_survive_unchanged() {
        let p = Precision::default();
        assert_eq!(p.up(0.1).unwrap(), Decimal::new(1, 1));
        assert_eq!(p.to_f64(p.up(104_800_540.25).unwrap()).unwrap(), 104_800_540.25);
    }

    #[test]
    fn division_by_zero_is_reported() {
        let p = Precision::default();
        assert_eq!(
            p.div_up(Decimal::ONE, Decimal::ZERO),
            Err(SeriesError::Overflow)
        );
    }

    #[test]
    fn non_finite_input_is_rejected() {
        let p = Precision::default();
        assert!(matches!(
            p.up(f64::NAN),
            Err(SeriesError::Unrepresentable(_))
        ));
        assert_eq!(p.up(f64::INFINITY), Err(SeriesError::Unrepresentable(f64::INFINITY)));
    }

    #[test]
    fn scale_is_clamped() {
        assert_eq!(Precision::new(40).scale(), 28);
    }
}
