//! HTTP(S) transport for pinned downloads.
//!
//! Builds libcurl handles with chain and hostname verification disabled, an
//! optional proxy, and a fixed User-Agent. Trust is decided separately by the
//! caller through the leaf pin (see `crate::pin`); this module only knows how
//! to talk on the wire.

use crate::pin::Fingerprint;
use std::time::Duration;

/// Upstream proxy applied to both HTTP and HTTPS requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyConfig {
    /// Proxy URL, e.g. `http://proxy.corp:3128`. May embed `user:pass@`.
    pub url: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl ProxyConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            username: None,
            password: None,
        }
    }
}

/// Wire settings plus the pin every connection of a session must match.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Expected SHA-256 of the server's leaf certificate.
    pub pin: Fingerprint,
    pub proxy: Option<ProxyConfig>,
    pub user_agent: String,
    /// Timeout for the leaf-certificate probe connection.
    pub probe_timeout: Duration,
    pub connect_timeout: Duration,
    /// Abort a request whose throughput stays below 1 KiB/s for this long.
    pub request_timeout: Duration,
}

impl TransportConfig {
    /// Config with the default timeouts and User-Agent.
    pub fn new(pin: Fingerprint) -> Self {
        Self {
            pin,
            proxy: None,
            user_agent: default_user_agent(),
            probe_timeout: Duration::from_secs(10),
            connect_timeout: Duration::from_secs(30),
            request_timeout: Duration::from_secs(120),
        }
    }

    pub fn with_proxy(mut self, proxy: ProxyConfig) -> Self {
        self.proxy = Some(proxy);
        self
    }
}

/// `pinget/<version>`.
pub fn default_user_agent() -> String {
    format!("pinget/{}", env!("CARGO_PKG_VERSION"))
}

/// Reusable factory for configured curl handles.
#[derive(Debug, Clone)]
pub struct PinnedTransport {
    config: TransportConfig,
}

impl PinnedTransport {
    pub fn new(config: TransportConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    /// A fresh handle for `url` with the transport settings applied.
    pub fn handle(&self, url: &str) -> Result<curl::easy::Easy, curl::Error> {
        let cfg = &self.config;
        let mut easy = curl::easy::Easy::new();
        easy.url(url)?;
        easy.follow_location(true)?;
        easy.max_redirections(10)?;
        easy.useragent(&cfg.user_agent)?;
        // Identity is established by the leaf pin, not the chain.
        easy.ssl_verify_peer(false)?;
        easy.ssl_verify_host(false)?;
        easy.connect_timeout(cfg.connect_timeout)?;
        easy.low_speed_limit(1024)?;
        easy.low_speed_time(cfg.request_timeout)?;
        match &cfg.proxy {
            Some(proxy) => {
                easy.proxy(&proxy.url)?;
                if let Some(user) = &proxy.username {
                    easy.proxy_username(user)?;
                }
                if let Some(pass) = &proxy.password {
                    easy.proxy_password(pass)?;
                }
            }
            // Empty string disables libcurl's *_proxy environment lookup.
            None => easy.proxy("")?,
        }
        Ok(easy)
    }
}
