//! Configuration for the updater.

use crate::update::hook::{CommandHook, RestartHook};
use crate::update::release::GITHUB_API_URL;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Top-level updater configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdaterConfig {
    /// Binary identifier; assets are named `{binary_name}_{os}_{arch}`.
    pub binary_name: String,
    /// Where releases are published.
    pub release: ReleaseConfig,
    /// HTTP client settings.
    pub http: HttpConfig,
    /// What to run after a successful replacement.
    pub hook: HookConfig,
}

impl Default for UpdaterConfig {
    fn default() -> Self {
        Self {
            binary_name: env!("CARGO_PKG_NAME").to_owned(),
            release: ReleaseConfig::default(),
            http: HttpConfig::default(),
            hook: HookConfig::default(),
        }
    }
}

/// Release host coordinates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReleaseConfig {
    /// Repository owner (user or organisation).
    pub owner: String,
    /// Repository name.
    pub repo: String,
    /// API base URL (change for GitHub Enterprise).
    pub api_base_url: String,
    /// API token. Falls back to `GITHUB_TOKEN` when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl Default for ReleaseConfig {
    fn default() -> Self {
        Self {
            owner: "containifyci".to_owned(),
            repo: "selfup".to_owned(),
            api_base_url: GITHUB_API_URL.to_owned(),
            token: None,
        }
    }
}

impl ReleaseConfig {
    /// The configured token, or `GITHUB_TOKEN` from the environment.
    pub fn resolved_token(&self) -> Option<String> {
        self.token
            .clone()
            .or_else(|| std::env::var("GITHUB_TOKEN").ok())
            .filter(|t| !t.trim().is_empty())
    }
}

/// HTTP client settings shared by metadata and asset requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Connection timeout in seconds.
    pub connect_timeout_secs: u64,
    /// Read timeout in seconds. Large binaries on slow links need headroom.
    pub read_timeout_secs: u64,
    /// `User-Agent` header (GitHub rejects requests without one).
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 15,
            read_timeout_secs: 300,
            user_agent: format!("selfup/{} (self-update)", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl HttpConfig {
    /// Build a blocking HTTP agent with these timeouts.
    pub fn agent(&self) -> ureq::Agent {
        ureq::AgentBuilder::new()
            .timeout_connect(Duration::from_secs(self.connect_timeout_secs))
            .timeout_read(Duration::from_secs(self.read_timeout_secs))
            .build()
    }
}

/// Post-update hook selection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HookConfig {
    /// No hook.
    #[default]
    None,
    /// `systemctl restart <unit>`.
    Systemd {
        /// Unit to restart.
        unit: String,
    },
    /// Arbitrary command.
    Command {
        /// Program to execute.
        program: String,
        /// Arguments.
        #[serde(default)]
        args: Vec<String>,
    },
}

impl HookConfig {
    /// Instantiate the configured hook.
    pub fn build(&self) -> Option<Box<dyn RestartHook>> {
        match self {
            Self::None => None,
            Self::Systemd { unit } => Some(Box::new(CommandHook::systemd(unit))),
            Self::Command { program, args } => {
                Some(Box::new(CommandHook::new(program, args.iter().cloned())))
            }
        }
    }
}

impl UpdaterConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid TOML.
    pub fn from_file(path: &Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            crate::error::UpdateError::Config(format!("cannot read {}: {e}", path.display()))
        })?;
        toml::from_str(&content).map_err(|e| crate::error::UpdateError::Config(e.to_string()))
    }

    /// Save configuration to a TOML file, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or the config cannot be serialized.
    pub fn save_to_file(&self, path: &Path) -> crate::error::Result<()> {
        let io_err = |e: std::io::Error| {
            crate::error::UpdateError::Config(format!("cannot write {}: {e}", path.display()))
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::UpdateError::Config(e.to_string()))?;
        std::fs::write(path, content).map_err(io_err)?;
        Ok(())
    }

    /// Returns the default config file path: `<config dir>/selfup/config.toml`.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| std::env::temp_dir().join("selfup-config"))
            .join("selfup")
            .join("config.toml")
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = UpdaterConfig::default();
        assert_eq!(config.binary_name, "selfup");
        assert_eq!(config.release.api_base_url, "https://api.github.com");
        assert!(config.http.connect_timeout_secs > 0);
        assert!(config.http.user_agent.starts_with("selfup/"));
        assert_eq!(config.hook, HookConfig::None);
        assert!(config.hook.build().is_none());
    }

    #[test]
    fn empty_toml_uses_defaults() {
        let config: UpdaterConfig = toml::from_str("").unwrap();
        assert_eq!(config, UpdaterConfig::default());
    }

    #[test]
    fn partial_toml_overrides() {
        let toml_str = r#"
binary_name = "myapp"

[release]
owner = "acme"
repo = "myapp"

[http]
read_timeout_secs = 30

[hook]
kind = "systemd"
unit = "myapp.service"
"#;
        let config: UpdaterConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.binary_name, "myapp");
        assert_eq!(config.release.owner, "acme");
        assert_eq!(config.release.api_base_url, GITHUB_API_URL);
        assert_eq!(config.http.read_timeout_secs, 30);
        assert_eq!(config.http.connect_timeout_secs, 15);
        assert_eq!(
            config.hook,
            HookConfig::Systemd {
                unit: "myapp.service".to_owned()
            }
        );
        assert!(config.hook.build().is_some());
    }

    #[test]
    fn command_hook_args_default_to_empty() {
        let config: UpdaterConfig =
            toml::from_str("[hook]\nkind = \"command\"\nprogram = \"/usr/bin/reload\"\n").unwrap();
        assert_eq!(
            config.hook,
            HookConfig::Command {
                program: "/usr/bin/reload".to_owned(),
                args: Vec::new(),
            }
        );
    }

    #[test]
    fn unknown_hook_kind_is_rejected() {
        let result: Result<UpdaterConfig, _> = toml::from_str("[hook]\nkind = \"launchd\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let config = UpdaterConfig {
            binary_name: "myapp".to_owned(),
            hook: HookConfig::Command {
                program: "kill".to_owned(),
                args: vec!["-HUP".to_owned(), "1".to_owned()],
            },
            ..UpdaterConfig::default()
        };

        config.save_to_file(&path).unwrap();
        let loaded = UpdaterConfig::from_file(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn from_file_nonexistent_returns_error() {
        let result = UpdaterConfig::from_file(Path::new("/nonexistent/path/config.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn from_file_invalid_toml_returns_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "this is not valid toml {{{").unwrap();

        let result = UpdaterConfig::from_file(&path);
        assert!(matches!(result, Err(crate::error::UpdateError::Config(_))));
    }

    #[test]
    fn default_config_path_ends_with_config_toml() {
        let path = UpdaterConfig::default_config_path();
        let path_str = path.to_string_lossy();
        assert!(path_str.ends_with("config.toml"));
        assert!(path_str.contains("selfup"));
    }

    #[test]
    fn explicit_token_wins() {
        let release = ReleaseConfig {
            token: Some("from-file".to_owned()),
            ..ReleaseConfig::default()
        };
        assert_eq!(release.resolved_token().as_deref(), Some("from-file"));
    }
}
