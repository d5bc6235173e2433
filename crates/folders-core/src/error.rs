//! Error types for tree building.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while building a tree.
///
/// Building is fail-fast: the first error raised anywhere below the root
/// is the error of the whole build.
#[derive(Debug, Error)]
pub enum BuildError {
    /// Permission denied for a path.
    #[error("Permission denied: {path}")]
    PermissionDenied { path: PathBuf },

    /// Path not found.
    #[error("Path not found: {path}")]
    NotFound { path: PathBuf },

    /// Generic I/O error.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Root path is not a directory.
    #[error("Not a directory: {path}")]
    NotADirectory { path: PathBuf },

    /// Path is neither a directory nor a regular file.
    #[error("Unsupported file type: {path}")]
    UnsupportedKind { path: PathBuf },

    /// A child task panicked or was cancelled.
    #[error("Build task failed: {message}")]
    Task { message: String },

    /// Invalid configuration.
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },
}

impl BuildError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied { path },
            std::io::ErrorKind::NotFound => Self::NotFound { path },
            _ => Self::Io { path, source },
        }
    }

    /// Path the error refers to, when there is one.
    pub fn path(&self) -> Option<&std::path::Path> {
        match self {
            Self::PermissionDenied { path }
            | Self::NotFound { path }
            | Self::Io { path, .. }
            | Self::NotADirectory { path }
            | Self::UnsupportedKind { path } => Some(path),
            Self::Task { .. } | Self::InvalidConfig { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_error_io() {
        let err = BuildError::io(
            "/test/path",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(matches!(err, BuildError::PermissionDenied { .. }));

        let err = BuildError::io(
            "/test/path",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert!(matches!(err, BuildError::NotFound { .. }));
    }

    #[test]
    fn test_build_error_path() {
        let err = BuildError::io("/a/b", std::io::Error::other("boom"));
        assert_eq!(err.path(), Some(std::path::Path::new("/a/b")));
        assert!(err.to_string().contains("boom"));

        let err = BuildError::Task {
            message: "cancelled".into(),
        };
        assert!(err.path().is_none());
    }
}
