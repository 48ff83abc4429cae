//! Sequencing of one update attempt.
//!
//! `Checking → Downloading → Replacing → Hooking → Done`. Each state runs to
//! completion before the next starts and nothing is retried; a caller that
//! wants to retry after a transient network failure runs the whole attempt
//! again.
//!
//! The engine assumes it is the only writer of the target binary. Two
//! attempts against the same path at once can clobber each other's swap file;
//! serialising them is the caller's job.

use crate::config::UpdaterConfig;
use crate::error::{InstallError, Result, UpdateError};
use crate::update::fetcher::{AssetFetcher, HttpFetcher};
use crate::update::hook::RestartHook;
use crate::update::platform::Platform;
use crate::update::release::{GitHubReleases, Release, ReleaseProvider, find_asset_url};
use crate::update::{replacer, version};
use std::fmt;
use std::path::PathBuf;
use tracing::Dispatch;

/// States of an update attempt that can fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdatePhase {
    /// Fetching release metadata and comparing versions.
    Checking,
    /// Resolving and downloading the platform asset.
    Downloading,
    /// Swapping the binary on disk.
    Replacing,
    /// Running the restart hook.
    Hooking,
}

impl fmt::Display for UpdatePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Checking => write!(f, "checking"),
            Self::Downloading => write!(f, "downloading"),
            Self::Replacing => write!(f, "replacing"),
            Self::Hooking => write!(f, "hooking"),
        }
    }
}

/// Successful result of an update attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// The running version is current; nothing was written.
    AlreadyUpToDate {
        /// Running version.
        current: String,
        /// Latest published tag.
        latest: String,
    },
    /// The binary was replaced (and the hook, if any, succeeded).
    Updated {
        /// Version that was running.
        from: String,
        /// Tag that was installed.
        to: String,
        /// Path of the replaced binary.
        binary: PathBuf,
    },
}

impl UpdateOutcome {
    /// Returns `true` if a new binary was installed.
    pub fn is_updated(&self) -> bool {
        matches!(self, Self::Updated { .. })
    }
}

/// Result of a check-only run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateCheck {
    /// Running version.
    pub current: String,
    /// Latest published tag.
    pub latest: String,
    /// Whether `latest` would be installed by [`Updater::run`].
    pub update_available: bool,
}

/// Which file gets replaced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum InstallTarget {
    /// The running executable, looked up when the replace step starts.
    #[default]
    CurrentExe,
    /// A fixed path.
    Path(PathBuf),
}

impl InstallTarget {
    /// Resolve the path to replace.
    ///
    /// # Errors
    ///
    /// Returns [`InstallError::CurrentExe`] if the running executable's path
    /// cannot be determined.
    pub fn resolve(&self) -> std::result::Result<PathBuf, InstallError> {
        match self {
            Self::Path(path) => Ok(path.clone()),
            Self::CurrentExe => std::env::current_exe()
                .map(strip_deleted_suffix)
                .map_err(InstallError::CurrentExe),
        }
    }
}

/// On Linux, `/proc/self/exe` of a process whose binary was already swapped
/// reads `<path> (deleted)`; the live path is the one without the suffix.
fn strip_deleted_suffix(path: PathBuf) -> PathBuf {
    if cfg!(target_os = "linux")
        && !path.exists()
        && let Some(live) = path.to_str().and_then(|s| s.strip_suffix(" (deleted)"))
    {
        return PathBuf::from(live);
    }
    path
}

/// Self-update engine.
pub struct Updater {
    binary_name: String,
    current_version: String,
    provider: Box<dyn ReleaseProvider>,
    fetcher: Box<dyn AssetFetcher>,
    hook: Option<Box<dyn RestartHook>>,
    target: InstallTarget,
    logger: Dispatch,
}

impl Updater {
    /// Create an updater for `binary_name` currently at `current_version`.
    ///
    /// Defaults: HTTP fetcher, no hook, the running executable as target and
    /// a logger that discards everything.
    pub fn new(
        binary_name: impl Into<String>,
        current_version: impl Into<String>,
        provider: impl ReleaseProvider + 'static,
    ) -> Self {
        let binary_name = binary_name.into();
        let fetcher = HttpFetcher::new(format!("{binary_name}-update-"));
        Self {
            binary_name,
            current_version: current_version.into(),
            provider: Box::new(provider),
            fetcher: Box::new(fetcher),
            hook: None,
            target: InstallTarget::CurrentExe,
            logger: Dispatch::none(),
        }
    }

    /// Build an updater from configuration: GitHub provider, HTTP fetcher
    /// with the configured timeouts, and the configured hook.
    pub fn from_config(config: &UpdaterConfig, current_version: impl Into<String>) -> Self {
        let agent = config.http.agent();
        let provider = GitHubReleases::new(&config.release.owner, &config.release.repo)
            .with_base_url(&config.release.api_base_url)
            .with_token(config.release.resolved_token())
            .with_user_agent(&config.http.user_agent)
            .with_agent(agent.clone());
        let fetcher = HttpFetcher::new(format!("{}-update-", config.binary_name))
            .with_agent(agent)
            .with_user_agent(&config.http.user_agent);

        let mut updater =
            Self::new(&config.binary_name, current_version, provider).with_fetcher(fetcher);
        updater.hook = config.hook.build();
        updater
    }

    /// Replace the asset fetcher.
    pub fn with_fetcher(mut self, fetcher: impl AssetFetcher + 'static) -> Self {
        self.fetcher = Box::new(fetcher);
        self
    }

    /// Run `hook` after a successful replacement.
    pub fn with_hook(mut self, hook: impl RestartHook + 'static) -> Self {
        self.hook = Some(Box::new(hook));
        self
    }

    /// Replace a fixed path instead of the running executable.
    pub fn with_target(mut self, target: InstallTarget) -> Self {
        self.target = target;
        self
    }

    /// Send this updater's log events to `logger`.
    pub fn with_logger(mut self, logger: Dispatch) -> Self {
        self.logger = logger;
        self
    }

    /// Binary identifier used for asset resolution.
    pub fn binary_name(&self) -> &str {
        &self.binary_name
    }

    /// Version the updater compares against.
    pub fn current_version(&self) -> &str {
        &self.current_version
    }

    /// Fetch the latest release and report whether it would be installed.
    ///
    /// # Errors
    ///
    /// Returns [`UpdateError::MetadataFetch`] or [`UpdateError::InvalidVersion`].
    pub fn check(&self) -> Result<UpdateCheck> {
        tracing::dispatcher::with_default(&self.logger, || {
            self.checking()
                .map(|(release, update_available)| UpdateCheck {
                    current: self.current_version.clone(),
                    latest: release.tag,
                    update_available,
                })
                .inspect_err(log_failure)
        })
    }

    /// Run one complete update attempt.
    ///
    /// A hook failure is returned as [`UpdateError::Hook`] even though the
    /// binary has already been replaced.
    ///
    /// # Errors
    ///
    /// Returns the error of the first state that failed.
    pub fn run(&self) -> Result<UpdateOutcome> {
        tracing::dispatcher::with_default(&self.logger, || {
            self.attempt().inspect_err(log_failure)
        })
    }

    fn attempt(&self) -> Result<UpdateOutcome> {
        let (release, newer) = self.checking()?;
        if !newer {
            tracing::info!(current = %self.current_version, latest = %release.tag, "already up-to-date");
            return Ok(UpdateOutcome::AlreadyUpToDate {
                current: self.current_version.clone(),
                latest: release.tag,
            });
        }

        tracing::debug!(phase = %UpdatePhase::Downloading);
        let platform = Platform::current();
        let url = find_asset_url(
            &self.binary_name,
            platform.os(),
            platform.arch(),
            &release.assets,
        )?;
        let staged = self.fetcher.fetch(url)?;

        tracing::debug!(phase = %UpdatePhase::Replacing);
        let binary = self.target.resolve()?;
        replacer::replace(&staged, &binary)?;
        if let Err(e) = staged.close() {
            tracing::debug!(error = %e, "failed to remove staged download");
        }

        if let Some(hook) = &self.hook {
            tracing::debug!(phase = %UpdatePhase::Hooking);
            hook.notify().map_err(|source| UpdateError::Hook {
                binary: binary.clone(),
                source,
            })?;
        }

        tracing::info!(from = %self.current_version, to = %release.tag, path = %binary.display(), "update installed");
        Ok(UpdateOutcome::Updated {
            from: self.current_version.clone(),
            to: release.tag,
            binary,
        })
    }

    fn checking(&self) -> Result<(Release, bool)> {
        tracing::debug!(phase = %UpdatePhase::Checking);
        let release = self.provider.latest_release()?;
        let newer = version::is_newer(&self.current_version, &release.tag)?;
        Ok((release, newer))
    }
}

fn log_failure(err: &UpdateError) {
    match err.phase() {
        Some(phase) => tracing::error!(%phase, error = %err, "update attempt failed"),
        None => tracing::error!(error = %err, "update attempt failed"),
    }
}

impl fmt::Debug for Updater {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Updater")
            .field("binary_name", &self.binary_name)
            .field("current_version", &self.current_version)
            .field("has_hook", &self.hook.is_some())
            .field("target", &self.target)
            .finish_non_exhaustive()
    }
}
