use crate::{sample::Sample, signal::TimeSeries, stack::EventRecord};
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Parse `time flux [weight]` lines into a series.
///
/// Every line up to the last record must parse; a blank line in the middle of
/// the data is an error. Trailing blank lines are ignored.
pub fn parse_series(text: &str) -> Result<TimeSeries> {
    let mut series = TimeSeries::new();
    for (idx, line) in text.trim_end().lines().enumerate() {
        let sample: Sample = line
            .parse()
            .with_context(|| format!("line {} is not a sample: {:?}", idx + 1, line))?;
        series.add(sample);
    }
    if series.is_empty() {
        anyhow::bail!("no samples found");
    }
    Ok(series)
}

/// Read a light curve from disk.
pub fn read_series(path: &Path) -> Result<TimeSeries> {
    let text =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    parse_series(&text).with_context(|| format!("in {}", path.display()))
}

/// Parse an event catalog: a header line, then `start end peak [weight]` rows.
pub fn parse_catalog(text: &str) -> Result<Vec<EventRecord>> {
    let mut out = Vec::new();
    for (idx, line) in text.trim_end().lines().enumerate().skip(1) {
        let record: EventRecord = line
            .parse()
            .with_context(|| format!("line {} is not an event: {:?}", idx + 1, line))?;
        out.push(record);
    }
    if out.is_empty() {
        anyhow::bail!("no events found");
    }
    Ok(out)
}

/// Read an event catalog from disk.
pub fn read_catalog(path: &Path) -> Result<Vec<EventRecord>> {
    let text =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    parse_catalog(&text).with_context(|| format!("in {}", path.display()))
}

/// Write `time\tflux\tweight` lines, no trailing newline. Parent directories
/// are created as needed.
pub fn write_series(path: &Path, series: &TimeSeries) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::write(path, series.to_string())
        .with_context(|| format!("failed to write {}", path.display()))
}
