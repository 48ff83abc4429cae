//! Error types for the self-update engine.

use crate::update::UpdatePhase;
use std::path::PathBuf;

/// Top-level error type for one update attempt.
#[derive(Debug, thiserror::Error)]
pub enum UpdateError {
    /// The release provider could not deliver the latest release
    /// (transport error, not found, rate limited, malformed JSON).
    #[error("failed to fetch latest release from {source_name}: {reason}")]
    MetadataFetch {
        /// Where the metadata was requested from (URL or provider name).
        source_name: String,
        /// Underlying failure description.
        reason: String,
    },

    /// No release asset matches `{binary}_{os}_{arch}`.
    #[error("no matching asset for binary `{binary}` on platform {os}/{arch}")]
    NoMatchingAsset {
        /// Binary identifier that was searched for.
        binary: String,
        /// Host operating system in asset vocabulary.
        os: String,
        /// Host architecture in asset vocabulary.
        arch: String,
    },

    /// The asset could not be downloaded or staged.
    #[error("failed to download asset {url}: {reason}")]
    Download {
        /// Asset URL.
        url: String,
        /// Underlying failure description.
        reason: String,
    },

    /// The provider reported a version that is not valid semver.
    #[error("invalid release version `{version}` reported by provider")]
    InvalidVersion {
        /// The offending version string, as reported.
        version: String,
    },

    /// Installing the new binary failed.
    #[error("failed to install update: {0}")]
    Install(#[from] InstallError),

    /// The restart hook failed after the binary was already replaced.
    #[error(
        "binary at {} was already replaced, but the restart hook failed: {source}; \
         a manual restart may be required",
        .binary.display()
    )]
    Hook {
        /// Path of the binary that now holds the new version.
        binary: PathBuf,
        /// Hook failure.
        source: HookError,
    },

    /// Configuration could not be loaded or saved.
    #[error("config error: {0}")]
    Config(String),
}

impl UpdateError {
    /// The orchestrator state in which this error was raised.
    ///
    /// Configuration errors happen before an attempt starts and report `None`.
    pub fn phase(&self) -> Option<UpdatePhase> {
        match self {
            Self::MetadataFetch { .. } | Self::InvalidVersion { .. } => {
                Some(UpdatePhase::Checking)
            }
            Self::NoMatchingAsset { .. } | Self::Download { .. } => {
                Some(UpdatePhase::Downloading)
            }
            Self::Install(_) => Some(UpdatePhase::Replacing),
            Self::Hook { .. } => Some(UpdatePhase::Hooking),
            Self::Config(_) => None,
        }
    }

    /// Returns `true` if the binary on disk was already swapped when this
    /// error was raised.
    pub fn binary_replaced(&self) -> bool {
        matches!(self, Self::Hook { .. })
    }
}

/// Failure while swapping the new binary in place.
#[derive(Debug, thiserror::Error)]
pub enum InstallError {
    /// The path of the running executable could not be determined.
    #[error("cannot determine current executable path: {0}")]
    CurrentExe(#[source] std::io::Error),

    /// The directory that should contain the target binary does not exist.
    #[error("target directory {} does not exist", .0.display())]
    MissingDirectory(PathBuf),

    /// Copying the staged binary next to the target failed.
    #[error("cannot copy {} to {}: {source}", .from.display(), .to.display())]
    Copy {
        /// Staged download.
        from: PathBuf,
        /// Sibling swap file.
        to: PathBuf,
        /// I/O failure.
        source: std::io::Error,
    },

    /// Renaming the sibling swap file over the target failed.
    #[error("cannot rename {} to {}: {source}", .from.display(), .to.display())]
    Rename {
        /// Sibling swap file.
        from: PathBuf,
        /// Target binary.
        to: PathBuf,
        /// I/O failure.
        source: std::io::Error,
    },

    /// The new binary is installed but could not be made executable.
    #[error("cannot set executable permission on {}: {source}", .path.display())]
    Permissions {
        /// Target binary.
        path: PathBuf,
        /// I/O failure.
        source: std::io::Error,
    },
}

/// Failure reported by a restart hook.
#[derive(Debug, thiserror::Error)]
pub enum HookError {
    /// The hook process could not be started.
    #[error("cannot run `{program}`: {source}")]
    Spawn {
        /// Program that was executed.
        program: String,
        /// I/O failure.
        source: std::io::Error,
    },

    /// The hook process exited unsuccessfully.
    #[error("`{program}` exited with {status}")]
    Failed {
        /// Program that was executed.
        program: String,
        /// Exit status.
        status: std::process::ExitStatus,
    },

    /// Custom hook failure.
    #[error("{0}")]
    Other(String),
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, UpdateError>;
