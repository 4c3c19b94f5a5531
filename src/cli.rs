use std::path::PathBuf;

use clap::{Parser, Subcommand};

use magnon_spectral::AxisSlices;
use magnon_store::AxisSel;

/// Magnon spectral post-processor for micromagnetic simulation output.
#[derive(Parser)]
#[command(
    name = "magnon",
    version,
    about = "Spectral post-processing for micromagnetic simulation output"
)]
pub struct Cli {
    /// Increase verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands.
#[derive(Subcommand)]
pub enum Command {
    /// Ingest a directory of OVF frames into a container.
    Ingest(IngestArgs),
    /// List datasets and attributes of a container.
    Ls(LsArgs),
    /// Compute the dispersion relation (frequency vs wavevector).
    Disp(TransformArgs),
    /// Compute the cell-averaged power spectrum.
    Fft(TransformArgs),
    /// Extract the spatial mode nearest to a frequency.
    Mode(ModeArgs),
}

/// Arguments for the `ingest` subcommand.
#[derive(clap::Args)]
pub struct IngestArgs {
    /// Container to create or extend.
    pub container: PathBuf,

    /// Directory holding the .ovf frame sequence.
    #[arg(short, long)]
    pub input: PathBuf,

    /// Dataset name for the ingested field.
    #[arg(short, long, default_value = "m")]
    pub dataset: String,

    /// Sampling interval of the frame sequence in seconds.
    #[arg(long)]
    pub dt: f64,

    /// Replace the dataset if it already exists.
    #[arg(long = "override")]
    pub override_existing: bool,
}

/// Arguments for the `ls` subcommand.
#[derive(clap::Args)]
pub struct LsArgs {
    /// Container to inspect.
    pub container: PathBuf,
}

/// Arguments shared by the `disp` and `fft` subcommands.
#[derive(clap::Args)]
pub struct TransformArgs {
    /// Container holding the field dataset.
    pub container: PathBuf,

    /// Source dataset.
    #[arg(short, long, default_value = "m")]
    pub dataset: String,

    /// Cache name (defaults to `<transform>/<dataset>`).
    #[arg(short, long)]
    pub name: Option<String>,

    /// Replace a cached result.
    #[arg(long = "override")]
    pub override_existing: bool,

    /// Time slice, `start:end` or a single index.
    #[arg(long, value_parser = parse_slice)]
    pub t: Option<AxisSel>,

    /// z slice.
    #[arg(long, value_parser = parse_slice)]
    pub z: Option<AxisSel>,

    /// y slice.
    #[arg(long, value_parser = parse_slice)]
    pub y: Option<AxisSel>,

    /// x slice.
    #[arg(long, value_parser = parse_slice)]
    pub x: Option<AxisSel>,

    /// Magnetization component (0 = x, 1 = y, 2 = z).
    #[arg(short, long)]
    pub component: Option<usize>,

    /// TOML configuration file (defaults to `magnon.toml` if present).
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl TransformArgs {
    /// Region the transform operates on; unset axes stay full,
    /// `default_component` fills in for a missing `--component`.
    pub fn slices(&self, default_component: usize) -> AxisSlices {
        let mut slices =
            AxisSlices::default().with_component(self.component.unwrap_or(default_component));
        if let Some(t) = &self.t {
            slices = slices.with_t(t.clone());
        }
        if let Some(z) = &self.z {
            slices = slices.with_z(z.clone());
        }
        if let Some(y) = &self.y {
            slices = slices.with_y(y.clone());
        }
        if let Some(x) = &self.x {
            slices = slices.with_x(x.clone());
        }
        slices
    }
}

/// Arguments for the `mode` subcommand.
#[derive(clap::Args)]
pub struct ModeArgs {
    /// Container holding the field dataset.
    pub container: PathBuf,

    /// Source dataset.
    #[arg(short, long, default_value = "m")]
    pub dataset: String,

    /// Target frequency in Hz.
    #[arg(short, long)]
    pub freq: f64,

    /// Restrict to one magnetization component.
    #[arg(short, long)]
    pub component: Option<usize>,

    /// Store the extracted mode under this dataset name.
    #[arg(short, long)]
    pub output: Option<String>,
}

/// Parses `start:end` slice syntax; either bound may be omitted, and a
/// bare number selects a single index.
pub fn parse_slice(s: &str) -> Result<AxisSel, String> {
    let parse_bound = |b: &str| -> Result<Option<usize>, String> {
        if b.is_empty() {
            Ok(None)
        } else {
            b.parse()
                .map(Some)
                .map_err(|_| format!("invalid slice bound '{b}'"))
        }
    };

    match s.split_once(':') {
        None => match parse_bound(s)? {
            Some(i) => Ok(AxisSel::Index(i)),
            None => Ok(AxisSel::Full),
        },
        Some((lo, hi)) => {
            let start = parse_bound(lo)?.unwrap_or(0);
            let end = parse_bound(hi)?;
            Ok(AxisSel::Range { start, end })
        }
    }
}
