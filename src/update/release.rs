//! Release metadata: the provider seam, the GitHub implementation, and
//! platform asset resolution.

use crate::error::{Result, UpdateError};
use serde::{Deserialize, Serialize};

/// A published release.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Release {
    /// Tag name (e.g. `"v1.0.1"`).
    #[serde(rename = "tag_name")]
    pub tag: String,
    /// Release assets, in provider order.
    #[serde(default)]
    pub assets: Vec<Asset>,
}

/// A single downloadable release asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    /// Asset filename (e.g. `"myapp_linux_amd64"`).
    pub name: String,
    /// Direct download URL.
    #[serde(rename = "browser_download_url")]
    pub url: String,
}

impl Asset {
    /// Convenience constructor.
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }
}

/// Source of the latest release.
pub trait ReleaseProvider: Send + Sync {
    /// Fetch the latest published release.
    ///
    /// # Errors
    ///
    /// Every failure (not found, rate limited, transport, decoding) is
    /// reported as [`UpdateError::MetadataFetch`].
    fn latest_release(&self) -> Result<Release>;
}

/// Provider that always returns the same release.
///
/// Useful for pinning a release offline and in tests.
#[derive(Debug, Clone)]
pub struct StaticRelease(pub Release);

impl ReleaseProvider for StaticRelease {
    fn latest_release(&self) -> Result<Release> {
        Ok(self.0.clone())
    }
}

/// Default GitHub REST API endpoint.
pub const GITHUB_API_URL: &str = "https://api.github.com";

/// GitHub Releases provider (`GET /repos/{owner}/{repo}/releases/latest`).
pub struct GitHubReleases {
    owner: String,
    repo: String,
    base_url: String,
    token: Option<String>,
    user_agent: String,
    agent: ureq::Agent,
}

impl GitHubReleases {
    /// Create a provider for `owner/repo` against the public GitHub API.
    pub fn new(owner: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
            base_url: GITHUB_API_URL.to_owned(),
            token: None,
            user_agent: format!("selfup/{}", env!("CARGO_PKG_VERSION")),
            agent: ureq::agent(),
        }
    }

    /// Override the API base URL (GitHub Enterprise, mock servers).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Authenticate requests with a token (raises the API rate limit).
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token.filter(|t| !t.trim().is_empty());
        self
    }

    /// Override the `User-Agent` header.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Use a preconfigured HTTP agent (timeouts, proxies).
    pub fn with_agent(mut self, agent: ureq::Agent) -> Self {
        self.agent = agent;
        self
    }

    /// The `releases/latest` URL for this repository.
    pub fn latest_url(&self) -> String {
        format!(
            "{}/repos/{}/{}/releases/latest",
            self.base_url.trim_end_matches('/'),
            self.owner,
            self.repo
        )
    }
}

impl ReleaseProvider for GitHubReleases {
    fn latest_release(&self) -> Result<Release> {
        let url = self.latest_url();
        let fail = |reason: String| UpdateError::MetadataFetch {
            source_name: url.clone(),
            reason,
        };

        let mut request = self
            .agent
            .get(&url)
            .set("User-Agent", &self.user_agent)
            .set("Accept", "application/vnd.github+json");
        if let Some(token) = &self.token {
            request = request.set("Authorization", &format!("Bearer {token}"));
        }

        let resp = request.call().map_err(|e| fail(describe_api_error(e)))?;
        if !(200..300).contains(&resp.status()) {
            return Err(fail(format!("HTTP {} {}", resp.status(), resp.status_text())));
        }
        let body = resp
            .into_string()
            .map_err(|e| fail(format!("cannot read response body: {e}")))?;
        let release: Release = serde_json::from_str(&body)
            .map_err(|e| fail(format!("cannot parse release JSON: {e}")))?;

        tracing::debug!(tag = %release.tag, assets = release.assets.len(), "latest release");
        Ok(release)
    }
}

/// Turn a `ureq` failure into a message that tells not-found and rate
/// limiting apart from plain transport errors.
fn describe_api_error(err: ureq::Error) -> String {
    match err {
        ureq::Error::Status(404, _) => "release not found (HTTP 404)".to_owned(),
        ureq::Error::Status(code @ (403 | 429), resp)
            if code == 429 || resp.header("x-ratelimit-remaining") == Some("0") =>
        {
            format!("rate limited by the API (HTTP {code})")
        }
        ureq::Error::Status(code, resp) => format!("HTTP {code} {}", resp.status_text()),
        ureq::Error::Transport(t) => t.to_string(),
    }
}

/// Return the URL of the first asset named exactly `{binary}_{os}_{arch}`.
///
/// # Errors
///
/// Returns [`UpdateError::NoMatchingAsset`] naming the binary and platform
/// when no asset matches.
pub fn find_asset_url<'a>(
    binary: &str,
    os: &str,
    arch: &str,
    assets: &'a [Asset],
) -> Result<&'a str> {
    let expected = format!("{binary}_{os}_{arch}");
    for asset in assets {
        tracing::debug!(name = %asset.name, url = %asset.url, "checking asset");
        if asset.name == expected {
            return Ok(&asset.url);
        }
    }
    Err(UpdateError::NoMatchingAsset {
        binary: binary.to_owned(),
        os: os.to_owned(),
        arch: arch.to_owned(),
    })
}
