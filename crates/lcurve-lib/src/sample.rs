use crate::error::RecordError;
use crate::io::fields::FieldReader;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One light curve measurement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub time: f64,
    pub flux: f64,
    /// Relative weight against the other samples; defaults to 1.
    #[serde(default = "default_weight")]
    pub weight: f64,
}

fn default_weight() -> f64 {
    1.0
}

impl Default for Sample {
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}

impl Sample {
    pub fn new(time: f64, flux: f64) -> Self {
        Self::weighted(time, flux, default_weight())
    }

    pub fn weighted(time: f64, flux: f64, weight: f64) -> Self {
        Self { time, flux, weight }
    }

    pub fn set_time(&mut self, time: f64) {
        self.time = time;
    }

    pub fn set_flux(&mut self, flux: f64) {
        self.flux = flux;
    }

    pub fn set_weight(&mut self, weight: f64) {
        self.weight = weight;
    }

    /// Human readable form, e.g. `Time: 1 Flux: 2 Weight: 1`.
    pub fn labeled(&self) -> String {
        format!(
            "Time: {} Flux: {} Weight: {}",
            self.time, self.flux, self.weight
        )
    }
}

/// Tab separated `time flux weight`, the on-disk record format.
impl fmt::Display for Sample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\t{}\t{}", self.time, self.flux, self.weight)
    }
}

impl FromStr for Sample {
    type Err = RecordError;

    /// Parse `time flux [weight]`, whitespace separated.
    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut fields = FieldReader::new(line)?;
        let time = fields.required("time")?;
        let flux = fields.required("flux")?;
        let weight = fields.optional("weight")?.unwrap_or_else(default_weight);
        fields.finish()?;
        Ok(Self::weighted(time, flux, weight))
    }
}
