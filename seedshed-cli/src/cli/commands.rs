//! Command implementations and argument parsing for the seedshed CLI.

use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};
use seedshed_core::{
    AffinityField, AffinityPolarity, OrderingStrategy, Segmentation, VolumeShape,
    WatershedBuilder, WatershedError, WatershedErrorCode, WatershedReport,
};
use serde::Serialize;
use thiserror::Error;
use tracing::{Span, field, info, instrument};

use super::volume_io::{read_affinity, read_labels, write_labels};

/// Top-level CLI options parsed by [`clap`].
#[derive(Debug, Parser, Clone)]
#[command(name = "seedshed", about = "Grow seed labels through a 3-D affinity graph.")]
pub struct Cli {
    /// Command to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Supported CLI commands.
#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Segment a raw seed volume using a raw affinity field.
    Run(RunCommand),
}

/// Options accepted by the `run` command.
#[derive(Debug, Args, Clone)]
pub struct RunCommand {
    /// Volume extents as `Z,Y,X`.
    #[arg(long, value_delimiter = ',', required = true)]
    pub shape: Vec<usize>,

    /// Seed volume: `Z·Y·X` little-endian `u32` labels, `0` for unseeded.
    #[arg(long)]
    pub seeds: PathBuf,

    /// Affinity field: `3·Z·Y·X` bytes ordered Z, Y, X planes.
    #[arg(long)]
    pub affinity: PathBuf,

    /// Destination for the labelled volume, in the seed volume's format.
    #[arg(long)]
    pub output: PathBuf,

    /// Weight an edge must meet to connect its voxels.
    #[arg(long, default_value_t = 0)]
    pub threshold: u8,

    /// Whether high or low affinities bind voxels together.
    #[arg(long, value_enum, default_value_t = PolarityArg::Similarity)]
    pub polarity: PolarityArg,

    /// Edge ordering algorithm.
    #[arg(long, value_enum, default_value_t = OrderingArg::Bucket)]
    pub ordering: OrderingArg,

    /// Abort when the union pass runs longer than this many milliseconds.
    #[arg(long = "time-budget-ms")]
    pub time_budget_ms: Option<u64>,

    /// Summary encoding written to stdout.
    #[arg(long, value_enum, default_value_t = SummaryFormat::Text)]
    pub format: SummaryFormat,
}

/// Command-line spelling of [`AffinityPolarity`].
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum PolarityArg {
    /// Higher affinity binds more strongly.
    Similarity,
    /// Lower affinity binds more strongly.
    Dissimilarity,
}

impl From<PolarityArg> for AffinityPolarity {
    fn from(value: PolarityArg) -> Self {
        match value {
            PolarityArg::Similarity => Self::Similarity,
            PolarityArg::Dissimilarity => Self::Dissimilarity,
        }
    }
}

/// Command-line spelling of [`OrderingStrategy`].
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum OrderingArg {
    /// Counting sort over the 256 weight values.
    Bucket,
    /// Comparison sort on `(weight, edge id)`.
    ComparisonSort,
}

impl From<OrderingArg> for OrderingStrategy {
    fn from(value: OrderingArg) -> Self {
        match value {
            OrderingArg::Bucket => Self::Bucket,
            OrderingArg::ComparisonSort => Self::ComparisonSort,
        }
    }
}

/// Encodings accepted by [`render_summary`].
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, ValueEnum)]
pub enum SummaryFormat {
    /// `key: value` lines.
    #[default]
    Text,
    /// A single JSON object.
    Json,
}

/// Errors surfaced while executing CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    /// Reading or writing a volume file failed.
    #[error("failed to access `{path}`: {source}")]
    Io {
        /// Path that triggered the failure.
        path: PathBuf,
        /// Underlying operating system error.
        #[source]
        source: io::Error,
    },
    /// A label volume ended part-way through a `u32`.
    #[error("`{path}` holds {bytes} bytes, which is not a whole number of u32 labels")]
    TruncatedVolume {
        /// Offending file.
        path: PathBuf,
        /// Its length in bytes.
        bytes: usize,
    },
    /// `--shape` did not name exactly three extents.
    #[error("shape must be three comma-separated extents Z,Y,X; got {provided:?}")]
    InvalidShape {
        /// Extents as parsed.
        provided: Vec<usize>,
    },
    /// Validation or segmentation failed in the core.
    #[error(transparent)]
    Core(#[from] WatershedError),
}

impl CliError {
    /// The stable core error code, when the failure came from the core.
    #[must_use]
    pub const fn code(&self) -> Option<WatershedErrorCode> {
        match self {
            Self::Core(error) => Some(error.code()),
            _ => None,
        }
    }
}

/// Outcome of a successful `run`.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionSummary {
    /// Where the labelled volume was written.
    pub output: PathBuf,
    /// Volume extents `[Z, Y, X]`.
    pub shape: [usize; 3],
    /// Threshold the run used.
    pub threshold: u8,
    /// Polarity the run used.
    pub polarity: PolarityArg,
    /// Ordering algorithm the run used.
    pub ordering: OrderingArg,
    /// Counts reported by the core.
    pub report: ReportSummary,
    /// Requested stdout encoding.
    #[serde(skip)]
    pub format: SummaryFormat,
}

/// Serializable copy of a [`WatershedReport`].
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize)]
pub struct ReportSummary {
    /// Voxels in the volume.
    pub voxels: usize,
    /// Voxels seeded on input.
    pub seed_voxels: usize,
    /// Edges in the grid graph.
    pub edges: usize,
    /// Edges that passed the threshold.
    pub admitted_edges: usize,
    /// Merges that spread a label.
    pub claims: usize,
    /// Differently labelled regions that met.
    pub conflicts: usize,
    /// Regions sealed by a conflict.
    pub sealed_regions: usize,
    /// Voxels labelled on output.
    pub labelled_voxels: usize,
    /// Voxels left at `0`.
    pub unassigned_voxels: usize,
    /// Distinct labels on output.
    pub distinct_labels: usize,
}

impl From<&WatershedReport> for ReportSummary {
    fn from(report: &WatershedReport) -> Self {
        Self {
            voxels: report.voxels(),
            seed_voxels: report.seed_voxels(),
            edges: report.edges(),
            admitted_edges: report.admitted_edges(),
            claims: report.claims(),
            conflicts: report.conflicts(),
            sealed_regions: report.sealed_regions(),
            labelled_voxels: report.labelled_voxels(),
            unassigned_voxels: report.unassigned_voxels(),
            distinct_labels: report.distinct_labels(),
        }
    }
}

/// Executes the CLI command represented by `cli`.
///
/// # Errors
/// Returns [`CliError`] when loading, validation, segmentation or writing
/// fails. The output file is only written after a successful run.
///
/// # Examples
/// ```
/// # use std::error::Error;
/// # use seedshed_cli::cli::{
/// #     Cli, Command, OrderingArg, PolarityArg, RunCommand, SummaryFormat, run_cli,
/// # };
/// # use tempfile::TempDir;
/// #
/// # fn main() -> Result<(), Box<dyn Error>> {
/// let dir = TempDir::new()?;
/// let seeds = dir.path().join("seeds.u32");
/// let affinity = dir.path().join("affinity.u8");
/// std::fs::write(&seeds, [1_u32, 0, 0].iter().flat_map(|v| v.to_le_bytes()).collect::<Vec<_>>())?;
/// std::fs::write(&affinity, [255_u8; 9])?;
/// let cli = Cli {
///     command: Command::Run(RunCommand {
///         shape: vec![1, 1, 3],
///         seeds,
///         affinity,
///         output: dir.path().join("labels.u32"),
///         threshold: 1,
///         polarity: PolarityArg::Similarity,
///         ordering: OrderingArg::Bucket,
///         time_budget_ms: None,
///         format: SummaryFormat::Text,
///     }),
/// };
/// let summary = run_cli(cli)?;
/// assert_eq!(summary.report.labelled_voxels, 3);
/// # Ok(())
/// # }
/// ```
#[instrument(name = "cli.run", err, skip(cli), fields(command = field::Empty))]
pub fn run_cli(cli: Cli) -> Result<ExecutionSummary, CliError> {
    match cli.command {
        Command::Run(run) => {
            Span::current().record("command", field::display("run"));
            run_command(run)
        }
    }
}

#[instrument(
    name = "cli.execute",
    err,
    skip(command),
    fields(shape = ?command.shape, threshold = command.threshold, polarity = ?command.polarity),
)]
pub(super) fn run_command(command: RunCommand) -> Result<ExecutionSummary, CliError> {
    let shape = parse_shape(&command.shape)?;
    let mut builder = WatershedBuilder::new()
        .with_threshold(command.threshold)
        .with_polarity(command.polarity.into())
        .with_ordering(command.ordering.into());
    if let Some(millis) = command.time_budget_ms {
        builder = builder.with_time_budget(Duration::from_millis(millis));
    }
    let watershed = builder.build()?;

    let mut labels = read_labels(&command.seeds)?;
    let affinity = read_affinity(&command.affinity)?;
    let [depth, height, width] = shape.dims();
    let field = AffinityField::new(&affinity, [3, depth, height, width])?;
    let mut segmentation = Segmentation::new(&mut labels, shape)?;

    let report = watershed.run(&mut segmentation, &field)?;
    write_labels(&command.output, &labels)?;

    info!(
        output = %command.output.display(),
        labelled = report.labelled_voxels(),
        "command completed"
    );
    Ok(ExecutionSummary {
        output: command.output,
        shape: shape.dims(),
        threshold: command.threshold,
        polarity: command.polarity,
        ordering: command.ordering,
        report: ReportSummary::from(&report),
        format: command.format,
    })
}

pub(super) fn parse_shape(extents: &[usize]) -> Result<VolumeShape, CliError> {
    let [depth, height, width] = extents else {
        return Err(CliError::InvalidShape {
            provided: extents.to_vec(),
        });
    };
    Ok(VolumeShape::new(*depth, *height, *width)?)
}

/// Renders `summary` to `writer` in the format it requests.
///
/// # Errors
/// Returns [`io::Error`] if writing fails or the summary cannot be encoded.
///
/// # Examples
/// ```
/// # use std::error::Error;
/// # use seedshed_cli::cli::{
/// #     ExecutionSummary, OrderingArg, PolarityArg, ReportSummary, SummaryFormat,
/// #     render_summary,
/// # };
/// #
/// # fn main() -> Result<(), Box<dyn Error>> {
/// let summary = ExecutionSummary {
///     output: "labels.u32".into(),
///     shape: [1, 1, 2],
///     threshold: 0,
///     polarity: PolarityArg::Similarity,
///     ordering: OrderingArg::Bucket,
///     report: ReportSummary {
///         voxels: 2,
///         seed_voxels: 1,
///         edges: 1,
///         admitted_edges: 1,
///         claims: 1,
///         conflicts: 0,
///         sealed_regions: 0,
///         labelled_voxels: 2,
///         unassigned_voxels: 0,
///         distinct_labels: 1,
///     },
///     format: SummaryFormat::Json,
/// };
/// let mut buffer = Vec::new();
/// render_summary(&summary, &mut buffer)?;
/// let rendered: serde_json::Value = serde_json::from_slice(&buffer)?;
/// assert_eq!(rendered["report"]["labelled_voxels"], 2);
/// assert_eq!(rendered["polarity"], "similarity");
/// # Ok(())
/// # }
/// ```
pub fn render_summary(summary: &ExecutionSummary, mut writer: impl Write) -> io::Result<()> {
    match summary.format {
        SummaryFormat::Json => {
            serde_json::to_writer(&mut writer, summary)?;
            writeln!(writer)
        }
        SummaryFormat::Text => render_text(summary, writer),
    }
}

fn render_text(summary: &ExecutionSummary, mut writer: impl Write) -> io::Result<()> {
    let [depth, height, width] = summary.shape;
    let report = &summary.report;
    writeln!(writer, "output: {}", summary.output.display())?;
    writeln!(writer, "shape: {depth}x{height}x{width}")?;
    writeln!(writer, "threshold: {}", summary.threshold)?;
    writeln!(writer, "seed voxels: {}", report.seed_voxels)?;
    writeln!(
        writer,
        "admitted edges: {} of {}",
        report.admitted_edges, report.edges
    )?;
    writeln!(writer, "conflicts: {}", report.conflicts)?;
    writeln!(writer, "labelled voxels: {}", report.labelled_voxels)?;
    writeln!(writer, "unassigned voxels: {}", report.unassigned_voxels)?;
    writeln!(writer, "distinct labels: {}", report.distinct_labels)?;
    Ok(())
}
