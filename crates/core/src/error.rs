use std::{error::Error as StdError, fmt};

type BoxedError = Box<dyn StdError + Send + Sync + 'static>;

/// Stable exit-code-bearing error taxonomy. Every variant maps to one of the
/// kinds in the error handling design: configuration is fatal and never
/// retried, connectivity/transient are retried before surfacing, validation
/// blocks execution without retry, risk policy is fatal at a phase boundary.
#[derive(Debug)]
pub enum Error {
    Configuration { message: String },
    Connectivity { provider: String, source: BoxedError },
    Transient { operation: String, attempts: u32, source: BoxedError },
    Validation { errors: Vec<String> },
    RiskPolicy { phase: String, reason: String },
    ExternalTool { tool: String, exit_code: Option<i32>, stderr: String },
    Backup { message: String, source: Option<BoxedError> },
    Rollback { phase: String, message: String },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration { message } => write!(f, "configuration error: {message}"),
            Self::Connectivity { provider, source } => {
                write!(f, "connectivity error ({provider}): {source}")
            }
            Self::Transient { operation, attempts, source } => write!(
                f,
                "transient error in `{operation}` after {attempts} attempt(s): {source}"
            ),
            Self::Validation { errors } => write!(f, "validation failed: {}", errors.join("; ")),
            Self::RiskPolicy { phase, reason } => {
                write!(f, "risk policy refused phase `{phase}`: {reason}")
            }
            Self::ExternalTool { tool, exit_code, stderr } => write!(
                f,
                "external tool `{tool}` failed (exit={:?}): {stderr}",
                exit_code
            ),
            Self::Backup { message, .. } => write!(f, "backup error: {message}"),
            Self::Rollback { phase, message } => {
                write!(f, "rollback failed for phase `{phase}`: {message}")
            }
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::Connectivity { source, .. } | Self::Transient { source, .. } => {
                Some(source.as_ref())
            }
            Self::Backup { source: Some(source), .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

impl Error {
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration { message: message.into() }
    }

    #[must_use]
    pub fn connectivity(provider: impl Into<String>, source: impl Into<BoxedError>) -> Self {
        Self::Connectivity { provider: provider.into(), source: source.into() }
    }

    #[must_use]
    pub fn transient(
        operation: impl Into<String>,
        attempts: u32,
        source: impl Into<BoxedError>,
    ) -> Self {
        Self::Transient { operation: operation.into(), attempts, source: source.into() }
    }

    /// Maps this error to one of the §6 failure exit codes (4-11). Risk-level
    /// exit codes (0/1/2) are derived separately from `RiskAssessment` on the
    /// success path; this mapping only covers error paths.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Validation { .. } => 5,
            Self::Connectivity { .. } | Self::Transient { .. } => 6,
            Self::RiskPolicy { .. } => 7,
            Self::ExternalTool { .. } => 8,
            Self::Backup { .. } => 9,
            Self::Rollback { .. } => 10,
            Self::Configuration { .. } => 11,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
