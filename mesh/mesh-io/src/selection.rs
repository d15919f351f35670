//! Face selection files.
//!
//! A selection file is a JSON array of non-negative integers naming
//! triangle indices, e.g. `[4, 7, 12]`.

use std::path::Path;

use tracing::debug;

use crate::error::{IoError, IoResult};

/// Load a face selection from a JSON file.
///
/// The returned indices are not validated against any particular mesh;
/// out-of-range entries are the pipeline's concern. An empty array loads
/// successfully — rejecting it as a usage error is the caller's decision.
///
/// # Errors
///
/// Missing file, invalid JSON, or negative entries.
pub fn load_selection<P: AsRef<Path>>(path: P) -> IoResult<Vec<usize>> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            IoError::FileNotFound {
                path: path.to_path_buf(),
            }
        } else {
            IoError::Io(e)
        }
    })?;

    let raw: Vec<i64> = serde_json::from_str(&text).map_err(|e| IoError::InvalidSelection {
        message: e.to_string(),
    })?;

    let mut selection = Vec::with_capacity(raw.len());
    for value in raw {
        if value < 0 {
            return Err(IoError::InvalidSelection {
                message: format!("negative face index {value}"),
            });
        }
        #[allow(clippy::cast_sign_loss)]
        selection.push(value as usize);
    }

    debug!(faces = selection.len(), "loaded selection");
    Ok(selection)
}
