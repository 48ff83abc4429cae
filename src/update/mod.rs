//! Self-update engine.
//!
//! Checks GitHub releases for a newer version, picks the asset built for the
//! running platform, downloads it, and swaps it in for the running executable
//! with a same-directory rename. An optional restart hook tells a supervisor
//! that the binary changed.

pub mod fetcher;
pub mod hook;
pub mod orchestrator;
pub mod platform;
pub mod release;
pub mod replacer;
pub mod version;

pub use fetcher::{AssetFetcher, HttpFetcher};
pub use hook::{CommandHook, FnHook, NoopHook, RestartHook};
pub use orchestrator::{InstallTarget, UpdateCheck, UpdateOutcome, UpdatePhase, Updater};
pub use platform::Platform;
pub use release::{Asset, GitHubReleases, Release, ReleaseProvider, StaticRelease};
