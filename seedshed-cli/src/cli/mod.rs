//! Command-line interface for seeded watershed segmentation.
//!
//! The `run` command loads a raw seed volume and affinity field, runs the
//! segmentation, writes the labelled volume and reports what happened.

mod commands;
mod volume_io;

pub use commands::{
    Cli, CliError, Command, ExecutionSummary, OrderingArg, PolarityArg, ReportSummary,
    RunCommand, SummaryFormat, render_summary, run_cli,
};
pub use volume_io::{read_affinity, read_labels, write_labels};
