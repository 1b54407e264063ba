//! Support library for the seedshed CLI binary.
//!
//! Exposes the command pipeline and logging setup so tests and doctests can
//! drive a segmentation run without spawning a subprocess.

pub mod cli;
pub mod logging;
