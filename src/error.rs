use std::path::PathBuf;
use thiserror::Error;

/// A required input file does not exist.
///
/// This is the only failure the binaries report with a curated message;
/// everything else propagates as a plain `anyhow` error.
#[derive(Debug, Error)]
#[error("{} not found.", .path.display())]
pub struct MissingInputError {
    pub path: PathBuf,
}

impl MissingInputError {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// File name only, as shown to the operator.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

/// Find a `MissingInputError` anywhere in an error chain.
pub fn missing_input(err: &anyhow::Error) -> Option<&MissingInputError> {
    err.chain().find_map(|e| e.downcast_ref::<MissingInputError>())
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_message_names_path() {
        let err = MissingInputError::new("/data/spotify_songs.csv");
        assert_eq!(err.to_string(), "/data/spotify_songs.csv not found.");
        assert_eq!(err.file_name(), "spotify_songs.csv");
    }

    #[test]
    fn test_found_through_context() {
        let result: anyhow::Result<()> = Err(MissingInputError::new("a.csv").into());
        let err = result.context("Failed to load primary table").unwrap_err();
        let found = missing_input(&err).expect("missing input in chain");
        assert_eq!(found.path, PathBuf::from("a.csv"));
    }

    #[test]
    fn test_other_errors_are_not_missing_input() {
        let err = anyhow::anyhow!("malformed row");
        assert!(missing_input(&err).is_none());
    }
}
