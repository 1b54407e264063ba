//! Raw volume files: little-endian `u32` labels and `u8` affinities, both in
//! C order with no header.

use std::fs;
use std::path::Path;

use tracing::{debug, field, instrument};

use super::CliError;

const LABEL_BYTES: usize = size_of::<u32>();

/// Reads a little-endian `u32` label volume.
///
/// # Errors
/// Returns [`CliError::Io`] when the file cannot be read and
/// [`CliError::TruncatedVolume`] when its length is not a whole number of
/// labels.
#[instrument(name = "cli.read_labels", err, fields(path = %path.display(), voxels = field::Empty))]
pub fn read_labels(path: &Path) -> Result<Vec<u32>, CliError> {
    let bytes = read_bytes(path)?;
    if bytes.len() % LABEL_BYTES != 0 {
        return Err(CliError::TruncatedVolume {
            path: path.to_path_buf(),
            bytes: bytes.len(),
        });
    }
    let labels: Vec<u32> = bytes
        .chunks_exact(LABEL_BYTES)
        .map(|chunk| {
            let mut word = [0_u8; LABEL_BYTES];
            word.copy_from_slice(chunk);
            u32::from_le_bytes(word)
        })
        .collect();
    tracing::Span::current().record("voxels", labels.len());
    Ok(labels)
}

/// Reads a `u8` affinity field.
///
/// # Errors
/// Returns [`CliError::Io`] when the file cannot be read.
#[instrument(name = "cli.read_affinity", err, fields(path = %path.display()))]
pub fn read_affinity(path: &Path) -> Result<Vec<u8>, CliError> {
    let values = read_bytes(path)?;
    debug!(values = values.len(), "affinity field loaded");
    Ok(values)
}

/// Writes `labels` as a little-endian `u32` volume, replacing any existing
/// file.
///
/// # Errors
/// Returns [`CliError::Io`] when the file cannot be written.
#[instrument(name = "cli.write_labels", err, skip(labels), fields(path = %path.display(), voxels = labels.len()))]
pub fn write_labels(path: &Path, labels: &[u32]) -> Result<(), CliError> {
    let bytes: Vec<u8> = labels.iter().flat_map(|label| label.to_le_bytes()).collect();
    fs::write(path, bytes).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn read_bytes(path: &Path) -> Result<Vec<u8>, CliError> {
    fs::read(path).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })
}
