use std::time::Duration;

use reqwest::Client;
use url::Url;

use screener_core::ScreenerError;

use crate::HttpScreener;

const DEFAULT_USER_AGENT: &str = concat!("screener-http/", env!("CARGO_PKG_VERSION"));

/// Configures an [`HttpScreener`].
///
/// Per-request timeouts apply only when the builder constructs the client;
/// a client passed through [`custom_client`](Self::custom_client) is used as is.
#[derive(Debug)]
pub struct HttpScreenerBuilder {
    base_url: String,
    timeout: Option<Duration>,
    connect_timeout: Option<Duration>,
    user_agent: Option<String>,
    client: Option<Client>,
}

impl HttpScreenerBuilder {
    /// Builder for the given service root, e.g. `http://localhost:5000`.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: None,
            connect_timeout: None,
            user_agent: None,
            client: None,
        }
    }

    /// Overall per-request timeout.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// TCP connect timeout.
    #[must_use]
    pub const fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Override the `User-Agent` header.
    #[must_use]
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = Some(ua.into());
        self
    }

    /// Use a preconfigured `reqwest::Client`.
    #[must_use]
    pub fn custom_client(mut self, client: Client) -> Self {
        self.client = Some(client);
        self
    }

    /// Build the backend.
    ///
    /// # Errors
    /// Returns `InvalidArg` for a malformed base URL and `Other` if the HTTP
    /// client cannot be constructed.
    pub fn build(self) -> Result<HttpScreener, ScreenerError> {
        let mut base = Url::parse(self.base_url.trim()).map_err(|e| {
            ScreenerError::InvalidArg(format!("invalid base url '{}': {e}", self.base_url))
        })?;
        if base.cannot_be_a_base() {
            return Err(ScreenerError::InvalidArg(format!(
                "base url '{}' cannot carry paths",
                self.base_url
            )));
        }
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let client = match self.client {
            Some(c) => c,
            None => {
                let mut b = Client::builder()
                    .user_agent(self.user_agent.as_deref().unwrap_or(DEFAULT_USER_AGENT));
                if let Some(t) = self.timeout {
                    b = b.timeout(t);
                }
                if let Some(t) = self.connect_timeout {
                    b = b.connect_timeout(t);
                }
                b.build().map_err(|e| ScreenerError::Other(e.to_string()))?
            }
        };
        Ok(HttpScreener::from_parts(client, base))
    }
}
