use std::fmt;
use std::path::PathBuf;

use crate::shader::ShaderStage;

/// Errors reported by the window layer.
///
/// Every variant is returned synchronously from the call that detected it.
/// Nothing is retried internally.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// The native window, surface or GPU context could not be created.
    ContextCreation(String),

    /// A shader stage failed to compile. `log` holds the compiler output.
    ShaderCompile { stage: ShaderStage, log: String },

    /// Vertex and fragment stages could not be linked into one program.
    ShaderLink(String),

    /// A caller-supplied value is outside its domain (e.g. `grid(0, 2)`).
    InvalidArgument(String),

    /// A cell address outside the configured grid.
    OutOfRange { col: u32, row: u32, cols: u32, rows: u32 },

    /// A resource file could not be opened or read.
    FileNotFound { path: PathBuf, reason: String },

    /// The presentation surface failed in a way that cannot be recovered
    /// by reconfiguring it.
    Surface(String),
}

/// Result alias used across the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
    pub(crate) fn context_creation(msg: impl Into<String>) -> Self {
        Self::ContextCreation(msg.into())
    }

    pub(crate) fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::ContextCreation(msg) => write!(f, "context creation failed: {msg}"),
            Error::ShaderCompile { stage, log } => {
                write!(f, "{stage} shader compilation failed:\n{log}")
            }
            Error::ShaderLink(log) => write!(f, "shader program linking failed:\n{log}"),
            Error::InvalidArgument(msg) => write!(f, "invalid argument: {msg}"),
            Error::OutOfRange { col, row, cols, rows } => write!(
                f,
                "cell (col {col}, row {row}) is outside the {rows}x{cols} grid"
            ),
            Error::FileNotFound { path, reason } => {
                write!(f, "file not found: {}: {reason}", path.display())
            }
            Error::Surface(msg) => write!(f, "surface error: {msg}"),
        }
    }
}

impl std::error::Error for Error {}
