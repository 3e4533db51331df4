use crate::stack::{EventStacker, BIN_EPSILON, KEPLER_LONG_CADENCE};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Settings for a mean event profile run, usually read from TOML.
///
/// ```toml
/// cadence = 58.84876
/// weighted = true
/// output_path = "out/mean_event.dat"
/// smoothing = [15, 5]
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StackConfig {
    pub cadence: f64,
    pub epsilon: f64,
    pub weighted: bool,
    /// Where the averaged profile is written.
    pub output_path: PathBuf,
    /// Boxcar widths; each one adds a smoothed copy of the profile next to
    /// `output_path`.
    pub smoothing: Vec<usize>,
}

impl Default for StackConfig {
    fn default() -> Self {
        Self {
            cadence: KEPLER_LONG_CADENCE,
            epsilon: BIN_EPSILON,
            weighted: false,
            output_path: PathBuf::from("mean_event.dat"),
            smoothing: vec![15, 5],
        }
    }
}

impl StackConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).context("parsing stack configuration")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_toml_str(&text).with_context(|| format!("in {}", path.display()))
    }

    pub fn stacker(&self) -> EventStacker {
        EventStacker::new(self.cadence)
            .with_epsilon(self.epsilon)
            .with_weights(self.weighted)
    }

    /// `dir/name.ext` becomes `dir/name_smooth<bin>.ext`.
    pub fn smoothed_output_path(&self, bin_size: usize) -> PathBuf {
        let stem = self
            .output_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "mean_event".into());
        let name = match self.output_path.extension() {
            Some(ext) => format!("{}_smooth{}.{}", stem, bin_size, ext.to_string_lossy()),
            None => format!("{}_smooth{}", stem, bin_size),
        };
        self.output_path.with_file_name(name)
    }
}
