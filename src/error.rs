use notegrid_ingest::IngestError;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, PipelineError>;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("no input file matching {patterns} found in {}", dir.display())]
    NoInput { dir: PathBuf, patterns: String },

    #[error("{} candidate input files in {}: {}", candidates.len(), dir.display(), join_paths(candidates))]
    AmbiguousInput {
        dir: PathBuf,
        candidates: Vec<PathBuf>,
    },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse input: {0}")]
    Parse(#[from] IngestError),

    #[error("failed to write table: {0}")]
    Csv(#[from] csv::Error),
}

fn join_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .filter_map(|p| p.file_name())
        .map(|name| name.to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ambiguous_lists_candidates() {
        let err = PipelineError::AmbiguousInput {
            dir: PathBuf::from("data/raw"),
            candidates: vec![PathBuf::from("data/raw/a.mid"), PathBuf::from("data/raw/b.mid")],
        };
        assert_eq!(err.to_string(), "2 candidate input files in data/raw: a.mid, b.mid");
    }
}
