//! Asset download into transient storage.

use crate::error::{Result, UpdateError};
use std::io::Write;
use tempfile::TempPath;

/// Retrieves release assets.
pub trait AssetFetcher: Send + Sync {
    /// Download `url` into a new, process-unique temporary file.
    ///
    /// The returned [`TempPath`] owns the file: dropping it deletes it.
    ///
    /// # Errors
    ///
    /// Returns [`UpdateError::Download`] if the request fails, the server
    /// answers with a non-success status, or the body cannot be written.
    fn fetch(&self, url: &str) -> Result<TempPath>;
}

/// Blocking HTTP fetcher.
pub struct HttpFetcher {
    agent: ureq::Agent,
    user_agent: String,
    prefix: String,
}

impl HttpFetcher {
    /// Create a fetcher whose temp files are named `{prefix}*`.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            agent: ureq::agent(),
            user_agent: format!("selfup/{} (self-update)", env!("CARGO_PKG_VERSION")),
            prefix: prefix.into(),
        }
    }

    /// Use a preconfigured HTTP agent (timeouts, proxies).
    pub fn with_agent(mut self, agent: ureq::Agent) -> Self {
        self.agent = agent;
        self
    }

    /// Override the `User-Agent` header.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

impl AssetFetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<TempPath> {
        let fail = |reason: String| UpdateError::Download {
            url: url.to_owned(),
            reason,
        };

        tracing::info!(%url, "downloading update");
        let resp = self
            .agent
            .get(url)
            .set("User-Agent", &self.user_agent)
            .set("Accept", "application/octet-stream")
            .call()
            .map_err(|e| match e {
                ureq::Error::Status(code, resp) => {
                    fail(format!("HTTP {code} {}", resp.status_text()))
                }
                ureq::Error::Transport(t) => fail(t.to_string()),
            })?;
        // ureq hands back 1xx/3xx it did not follow as Ok.
        if !(200..300).contains(&resp.status()) {
            return Err(fail(format!("HTTP {} {}", resp.status(), resp.status_text())));
        }

        let mut file = tempfile::Builder::new()
            .prefix(&self.prefix)
            .tempfile()
            .map_err(|e| fail(format!("cannot create temp file: {e}")))?;

        let mut reader = resp.into_reader();
        let bytes = std::io::copy(&mut reader, &mut file)
            .map_err(|e| fail(format!("download write failed: {e}")))?;
        file.flush()
            .map_err(|e| fail(format!("cannot flush temp file: {e}")))?;

        let path = file.into_temp_path();
        tracing::debug!(path = %path.display(), bytes, "asset staged");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unreachable_host_is_download_error() {
        let fetcher = HttpFetcher::new("selfup-test-");
        // Port 9 (discard) on localhost is closed in test environments.
        let err = match fetcher.fetch("http://127.0.0.1:9/asset") {
            Ok(_) => panic!("fetch against a closed port must fail"),
            Err(e) => e,
        };
        match err {
            UpdateError::Download { url, .. } => assert_eq!(url, "http://127.0.0.1:9/asset"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn malformed_url_is_download_error() {
        let fetcher = HttpFetcher::new("selfup-test-");
        assert!(matches!(
            fetcher.fetch("not a url"),
            Err(UpdateError::Download { .. })
        ));
    }
}
