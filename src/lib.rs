//! selfup: in-place self-update for a running executable.
//!
//! The engine replaces the binary that is currently executing with the build
//! published for its platform in the latest GitHub release:
//!
//! Release metadata → version check → asset resolution → download →
//! atomic replace → restart hook
//!
//! # Architecture
//!
//! - **Version comparison**: semver precedence with `v`-marker normalisation
//! - **Release provider**: GitHub REST API (`releases/latest`), pluggable
//! - **Asset resolution**: exact `{binary}_{os}_{arch}` match for the host
//! - **Fetcher**: blocking HTTP download into a process-unique temp file
//! - **Replacer**: sibling copy plus same-directory rename
//! - **Restart hook**: no-op, external command (`systemctl restart`), or custom
//!
//! ```no_run
//! use selfup::update::{CommandHook, GitHubReleases, Updater};
//!
//! let updater = Updater::new(
//!     "myapp",
//!     env!("CARGO_PKG_VERSION"),
//!     GitHubReleases::new("acme", "myapp"),
//! )
//! .with_hook(CommandHook::systemd("myapp"));
//!
//! match updater.run() {
//!     Ok(outcome) if outcome.is_updated() => println!("updated"),
//!     Ok(_) => println!("already up-to-date"),
//!     Err(e) => eprintln!("update failed: {e}"),
//! }
//! ```

pub mod config;
pub mod error;
pub mod update;

pub use config::UpdaterConfig;
pub use error::{HookError, InstallError, Result, UpdateError};
pub use update::{UpdateOutcome, Updater};
