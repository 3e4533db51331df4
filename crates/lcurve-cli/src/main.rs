use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use lcurve_lib::{
    config::StackConfig,
    io::text as text_io,
    plot::CurvePlot,
    signal::{Quantity, TimeSeries},
};
use log::{info, warn};
use plotters::prelude::*;
use std::{
    io::{self, Read},
    path::{Path, PathBuf},
};

#[derive(Parser)]
#[command(
    name = "lcurve",
    version,
    about = "lcurve: light curve tools and mean event profiles"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum AxisArg {
    Time,
    Flux,
}

impl From<AxisArg> for Quantity {
    fn from(axis: AxisArg) -> Self {
        match axis {
            AxisArg::Time => Quantity::Time,
            AxisArg::Flux => Quantity::Flux,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Average every catalog event into one peak-centred profile
    Stack {
        /// Light curve, one `time flux [weight]` per line
        #[arg(long)]
        series: PathBuf,
        /// Event catalog: header line, then `start end peak [weight]` rows
        #[arg(long)]
        catalog: PathBuf,
        /// TOML stack configuration
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long)]
        cadence: Option<f64>,
        #[arg(long)]
        epsilon: Option<f64>,
        /// Combine events using their catalog weights
        #[arg(long, overrides_with = "unweighted")]
        weighted: bool,
        /// Divide by the event count even if the config asks for weights
        #[arg(long, overrides_with = "weighted")]
        unweighted: bool,
        #[arg(long)]
        out: Option<PathBuf>,
        /// Comma separated boxcar widths for extra smoothed outputs
        #[arg(long = "smooth", value_delimiter = ',')]
        smoothing: Option<Vec<usize>>,
    },
    /// Boxcar (moving average) smoothing
    Smooth {
        #[arg(long)]
        input: Option<PathBuf>,
        #[arg(long)]
        bin_size: usize,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Rescale the time or flux axis onto [low, high]
    Normalize {
        #[arg(long)]
        input: Option<PathBuf>,
        #[arg(long, value_enum, default_value = "flux")]
        axis: AxisArg,
        #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
        low: f64,
        #[arg(long, default_value_t = 1.0, allow_hyphen_values = true)]
        high: f64,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Extract the samples between two times
    Subsection {
        #[arg(long)]
        input: Option<PathBuf>,
        #[arg(long, allow_hyphen_values = true)]
        start: f64,
        #[arg(long, allow_hyphen_values = true)]
        end: f64,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Drop the samples between two times (through the end when --end is omitted)
    Remove {
        #[arg(long)]
        input: Option<PathBuf>,
        #[arg(long, allow_hyphen_values = true)]
        start: f64,
        #[arg(long, allow_hyphen_values = true)]
        end: Option<f64>,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Count, extremes and mean flux as JSON
    Stats {
        #[arg(long)]
        input: Option<PathBuf>,
        #[arg(long, requires = "end", allow_hyphen_values = true)]
        start: Option<f64>,
        #[arg(long, requires = "start", allow_hyphen_values = true)]
        end: Option<f64>,
    },
    /// Render a light curve to a PNG via plotters
    Plot {
        #[arg(long)]
        input: Option<PathBuf>,
        #[arg(long)]
        out: PathBuf,
        #[arg(long, default_value = "Light curve")]
        title: String,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    match cli.command {
        Commands::Stack {
            series,
            catalog,
            config,
            cadence,
            epsilon,
            weighted,
            unweighted,
            out,
            smoothing,
        } => {
            let mut cfg = match config.as_deref() {
                Some(path) => StackConfig::load(path)?,
                None => StackConfig::default(),
            };
            if let Some(cadence) = cadence {
                cfg.cadence = cadence;
            }
            if let Some(epsilon) = epsilon {
                cfg.epsilon = epsilon;
            }
            if weighted {
                cfg.weighted = true;
            } else if unweighted {
                cfg.weighted = false;
            }
            if let Some(out) = out {
                cfg.output_path = out;
            }
            if let Some(smoothing) = smoothing {
                cfg.smoothing = smoothing;
            }
            cmd_stack(&series, &catalog, &cfg)?
        }
        Commands::Smooth {
            input,
            bin_size,
            out,
        } => cmd_smooth(input.as_deref(), bin_size, out.as_deref())?,
        Commands::Normalize {
            input,
            axis,
            low,
            high,
            out,
        } => cmd_normalize(input.as_deref(), axis.into(), low, high, out.as_deref())?,
        Commands::Subsection {
            input,
            start,
            end,
            out,
        } => cmd_subsection(input.as_deref(), start, end, out.as_deref())?,
        Commands::Remove {
            input,
            start,
            end,
            out,
        } => cmd_remove(input.as_deref(), start, end, out.as_deref())?,
        Commands::Stats { input, start, end } => {
            cmd_stats(input.as_deref(), start.zip(end))?
        }
        Commands::Plot { input, out, title } => cmd_plot(input.as_deref(), &out, &title)?,
    }
    Ok(())
}

fn read_series(input: Option<&Path>) -> Result<TimeSeries> {
    let series = match input {
        Some(path) => text_io::read_series(path)?,
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            text_io::parse_series(&buf).context("in stdin")?
        }
    };
    info!("loaded {} samples", series.len());
    Ok(series)
}

fn emit(series: &TimeSeries, out: Option<&Path>) -> Result<()> {
    match out {
        Some(path) => {
            text_io::write_series(path, series)?;
            info!("wrote {} samples to {}", series.len(), path.display());
        }
        None => println!("{}", series),
    }
    Ok(())
}

fn cmd_stack(series: &Path, catalog: &Path, cfg: &StackConfig) -> Result<()> {
    let curve = text_io::read_series(series)?;
    let events = text_io::read_catalog(catalog)?;
    info!(
        "loaded {} samples and {} events (cadence {}, weighted {})",
        curve.len(),
        events.len(),
        cfg.cadence,
        cfg.weighted
    );
    let result = cfg
        .stacker()
        .stack(&curve, &events)
        .context("building mean event profile")?;
    text_io::write_series(&cfg.output_path, &result.profile)?;
    info!("wrote mean event profile to {}", cfg.output_path.display());
    for &bin_size in &cfg.smoothing {
        if !result.profile.boxcar_smooths(bin_size) {
            warn!(
                "smoothing width {} covers the whole {}-bin profile; output is unsmoothed",
                bin_size,
                result.profile.len()
            );
        }
        let smooth = result.profile.boxcar_smooth(bin_size)?;
        let path = cfg.smoothed_output_path(bin_size);
        text_io::write_series(&path, &smooth)?;
        info!("wrote boxcar({}) profile to {}", bin_size, path.display());
    }
    println!("{}", serde_json::to_string(&result.summary)?);
    Ok(())
}

fn cmd_smooth(input: Option<&Path>, bin_size: usize, out: Option<&Path>) -> Result<()> {
    let series = read_series(input)?;
    emit(&series.boxcar_smooth(bin_size)?, out)
}

fn cmd_normalize(
    input: Option<&Path>,
    quantity: Quantity,
    low: f64,
    high: f64,
    out: Option<&Path>,
) -> Result<()> {
    let series = read_series(input)?;
    let normal = match quantity {
        Quantity::Time => series.normalize_time(low, high)?,
        Quantity::Flux => series.normalize_flux(low, high)?,
    };
    emit(&normal, out)
}

fn cmd_subsection(input: Option<&Path>, start: f64, end: f64, out: Option<&Path>) -> Result<()> {
    let series = read_series(input)?;
    emit(&series.subsection(start, end)?, out)
}

fn cmd_remove(
    input: Option<&Path>,
    start: f64,
    end: Option<f64>,
    out: Option<&Path>,
) -> Result<()> {
    let mut series = read_series(input)?;
    match end {
        Some(end) => series.remove(start, end)?,
        None => series.remove_from(start)?,
    }
    emit(&series, out)
}

fn cmd_stats(input: Option<&Path>, range: Option<(f64, f64)>) -> Result<()> {
    let series = read_series(input)?;
    let summary = match range {
        Some((start, end)) => series.subsection(start, end)?.summary()?,
        None => series.summary()?,
    };
    println!("{}", serde_json::to_string(&summary)?);
    Ok(())
}

fn cmd_plot(input: Option<&Path>, out: &Path, title: &str) -> Result<()> {
    let series = read_series(input)?;
    draw_plotters_figure(out, &CurvePlot::new(title, &series, 4096))
}

const LINE_COLOR: RGBColor = RGBColor(0x1F, 0x77, 0xB4);

fn draw_plotters_figure(path: &Path, plot: &CurvePlot) -> Result<()> {
    let backend = BitMapBackend::new(path, (800, 480));
    let root = backend.into_drawing_area();
    root.fill(&WHITE)?;
    let mut chart = ChartBuilder::on(&root)
        .margin(10)
        .caption(&plot.title, ("sans-serif", 24))
        .x_label_area_size(30)
        .y_label_area_size(50)
        .build_cartesian_2d(plot.time_range.clone(), plot.flux_range.clone())?;
    chart
        .configure_mesh()
        .x_desc("time")
        .y_desc("flux")
        .draw()?;
    chart.draw_series(LineSeries::new(plot.points.iter().copied(), &LINE_COLOR))?;
    root.present()?;
    info!("wrote {}", path.display());
    Ok(())
}
