use std::fs;
use std::path::{Path, PathBuf};

use crate::config::FormatChoice;
use crate::error::{PipelineError, Result};

/// Find the single source file in `dir`.
///
/// Matching is by extension, ignoring case. Candidates are sorted by name
/// so an ambiguous directory always reports them in the same order.
pub fn find_input(dir: &Path, format: FormatChoice) -> Result<PathBuf> {
    let io_error = |source: std::io::Error| PipelineError::Io {
        path: dir.to_path_buf(),
        source,
    };
    let extensions = format.extensions();

    let mut candidates = Vec::new();
    for entry in fs::read_dir(dir).map_err(io_error)? {
        let path = entry.map_err(io_error)?.path();
        if path.is_file() && has_extension(&path, &extensions) {
            candidates.push(path);
        }
    }
    candidates.sort();

    match candidates.len() {
        0 => Err(PipelineError::NoInput {
            dir: dir.to_path_buf(),
            patterns: extensions
                .iter()
                .map(|ext| format!("*.{}", ext))
                .collect::<Vec<_>>()
                .join(", "),
        }),
        1 => Ok(candidates.remove(0)),
        _ => Err(PipelineError::AmbiguousInput {
            dir: dir.to_path_buf(),
            candidates,
        }),
    }
}

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map_or(false, |ext| {
            extensions.iter().any(|candidate| ext.eq_ignore_ascii_case(candidate))
        })
}
