use std::path::PathBuf;

/// Every error asmlens can produce. Providers turn most of these into empty
/// results; the CLI displays them and exits with [`AsmLensError::exit_code`].
#[derive(Debug, thiserror::Error)]
pub enum AsmLensError {
    #[error("not found: {}", .path.display())]
    NotFound { path: PathBuf },

    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid query \"{query}\": {reason}")]
    InvalidQuery { query: String, reason: String },

    #[error("config error in {}: {reason}", .path.display())]
    Config { path: PathBuf, reason: String },

    #[error("invalid glob \"{pattern}\": {reason}")]
    Glob { pattern: String, reason: String },

    #[error("request cancelled")]
    Cancelled,
}

impl AsmLensError {
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::NotFound { .. } | Self::Io { .. } => 2,
            Self::InvalidQuery { .. } | Self::Glob { .. } => 3,
            Self::Config { .. } => 4,
            Self::Cancelled => 130,
        }
    }

    /// Wrap an io error with the path that produced it, mapping `NotFound`.
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            Self::NotFound { path }
        } else {
            Self::Io { path, source }
        }
    }
}
