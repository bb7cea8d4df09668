use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::downloader::{DownloadOptions, SizeMismatchPolicy, DEFAULT_CHUNK_SIZE};
use crate::error::FetchError;
use crate::pin::{Fingerprint, InvalidFingerprint};
use crate::retry::RetryPolicy;
use crate::transport::{default_user_agent, ProxyConfig, TransportConfig};

/// Connection settings (`[transport]` section).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportSection {
    /// Expected SHA-256 of the server's leaf certificate (64 hex characters).
    pub pinned_fingerprint: Option<String>,
    /// Upstream proxy for HTTP and HTTPS, e.g. `http://proxy.corp:3128`.
    pub proxy_url: Option<String>,
    pub proxy_username: Option<String>,
    pub proxy_password: Option<String>,
    pub user_agent: String,
    /// Timeout for the leaf-certificate probe.
    pub probe_timeout_secs: u64,
    pub connect_timeout_secs: u64,
    /// Abort a request that stays below 1 KiB/s for this many seconds.
    pub request_timeout_secs: u64,
}

impl Default for TransportSection {
    fn default() -> Self {
        Self {
            pinned_fingerprint: None,
            proxy_url: None,
            proxy_username: None,
            proxy_password: None,
            user_agent: default_user_agent(),
            probe_timeout_secs: 10,
            connect_timeout_secs: 30,
            request_timeout_secs: 120,
        }
    }
}

/// Retry policy parameters (`[retry]` section).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Maximum number of attempts (including the first).
    pub max_attempts: u32,
    /// Linear backoff unit in seconds: attempt `n` waits `n * backoff_factor_secs`.
    pub backoff_factor_secs: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 6,
            backoff_factor_secs: 1.5,
        }
    }
}

/// Global configuration loaded from `~/.config/pinget/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PingetConfig {
    /// Transfer chunk size in bytes.
    pub chunk_size: usize,
    /// `warn` (default) or `fail` when the final size differs from the advertised size.
    pub size_mismatch: SizeMismatchPolicy,
    pub transport: TransportSection,
    pub retry: RetryConfig,
}

impl Default for PingetConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            size_mismatch: SizeMismatchPolicy::Warn,
            transport: TransportSection::default(),
            retry: RetryConfig::default(),
        }
    }
}

impl PingetConfig {
    /// Range and format checks for every field.
    pub fn validate(&self) -> Result<(), FetchError> {
        if self.retry.max_attempts < 1 {
            return Err(FetchError::InvalidConfig(
                "retry.max_attempts must be at least 1".to_string(),
            ));
        }
        let factor = self.retry.backoff_factor_secs;
        if !factor.is_finite() || factor <= 0.0 {
            return Err(FetchError::InvalidConfig(format!(
                "retry.backoff_factor_secs must be positive, got {}",
                factor
            )));
        }
        if self.chunk_size == 0 {
            return Err(FetchError::InvalidConfig(
                "chunk_size must be positive".to_string(),
            ));
        }
        if let Some(pin) = &self.transport.pinned_fingerprint {
            pin.parse::<Fingerprint>()
                .map_err(|e| FetchError::InvalidConfig(e.to_string()))?;
        }
        Ok(())
    }

    /// The configured pin, if any.
    pub fn pin(&self) -> Result<Option<Fingerprint>, FetchError> {
        match self.transport.pinned_fingerprint.as_deref() {
            Some(s) => s
                .parse()
                .map(Some)
                .map_err(|e: InvalidFingerprint| FetchError::InvalidConfig(e.to_string())),
            None => Ok(None),
        }
    }

    /// Transport settings for `pin`.
    pub fn transport_config(&self, pin: Fingerprint) -> TransportConfig {
        let t = &self.transport;
        TransportConfig {
            pin,
            proxy: t.proxy_url.as_ref().map(|url| ProxyConfig {
                url: url.clone(),
                username: t.proxy_username.clone(),
                password: t.proxy_password.clone(),
            }),
            user_agent: t.user_agent.clone(),
            probe_timeout: Duration::from_secs(t.probe_timeout_secs),
            connect_timeout: Duration::from_secs(t.connect_timeout_secs),
            request_timeout: Duration::from_secs(t.request_timeout_secs),
        }
    }

    /// Validated download options for `pin`.
    pub fn download_options(&self, pin: Fingerprint) -> Result<DownloadOptions, FetchError> {
        self.validate()?;
        Ok(DownloadOptions {
            transport: self.transport_config(pin),
            retry: RetryPolicy::from_secs(self.retry.max_attempts, self.retry.backoff_factor_secs),
            chunk_size: self.chunk_size,
            size_mismatch: self.size_mismatch,
        })
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("pinget")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<PingetConfig> {
    load_or_init_at(&config_path()?)
}

/// `load_or_init` for an explicit path.
pub fn load_or_init_at(path: &Path) -> Result<PingetConfig> {
    if !path.exists() {
        let default_cfg = PingetConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(path)?;
    let cfg: PingetConfig = toml::from_str(&data)?;
    cfg.validate()?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PIN: &str = "0069a2fd8598007c6e41972bf886f9962793102c8039b9709ec448467ae17cd0";

    #[test]
    fn default_config_values() {
        let cfg = PingetConfig::default();
        assert_eq!(cfg.retry.max_attempts, 6);
        assert!((cfg.retry.backoff_factor_secs - 1.5).abs() < 1e-9);
        assert_eq!(cfg.chunk_size, 512 * 1024);
        assert_eq!(cfg.size_mismatch, SizeMismatchPolicy::Warn);
        assert!(cfg.transport.pinned_fingerprint.is_none());
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn config_toml_roundtrip() {
        let cfg = PingetConfig::default();
        let toml = toml::to_string_pretty(&cfg).unwrap();
        let parsed: PingetConfig = toml::from_str(&toml).unwrap();
        assert_eq!(parsed.retry.max_attempts, cfg.retry.max_attempts);
        assert_eq!(parsed.chunk_size, cfg.chunk_size);
        assert_eq!(parsed.transport.user_agent, cfg.transport.user_agent);
    }

    #[test]
    fn config_toml_custom_values() {
        let toml = format!(
            r#"
            chunk_size = 65536
            size_mismatch = "fail"

            [transport]
            pinned_fingerprint = "{}"
            proxy_url = "http://proxy.corp:3128"
            proxy_username = "user"

            [retry]
            max_attempts = 8
            backoff_factor_secs = 0.5
        "#,
            PIN.to_uppercase()
        );
        let cfg: PingetConfig = toml::from_str(&toml).unwrap();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.chunk_size, 65536);
        assert_eq!(cfg.size_mismatch, SizeMismatchPolicy::Fail);
        assert_eq!(cfg.pin().unwrap().unwrap().as_str(), PIN);

        let opts = cfg.download_options(cfg.pin().unwrap().unwrap()).unwrap();
        assert_eq!(opts.retry.max_attempts, 8);
        assert_eq!(opts.retry.backoff_factor, Duration::from_millis(500));
        let proxy = opts.transport.proxy.unwrap();
        assert_eq!(proxy.url, "http://proxy.corp:3128");
        assert_eq!(proxy.username.as_deref(), Some("user"));
        assert!(proxy.password.is_none());
        // Unset sections keep their defaults.
        assert_eq!(opts.transport.connect_timeout, Duration::from_secs(30));
    }

    #[test]
    fn validate_rejects_out_of_range() {
        let mut cfg = PingetConfig::default();
        cfg.retry.max_attempts = 0;
        assert!(cfg.validate().is_err());

        let mut cfg = PingetConfig::default();
        cfg.retry.backoff_factor_secs = 0.0;
        assert!(cfg.validate().is_err());
        cfg.retry.backoff_factor_secs = f64::NAN;
        assert!(cfg.validate().is_err());

        let mut cfg = PingetConfig::default();
        cfg.transport.pinned_fingerprint = Some("deadbeef".to_string());
        assert!(matches!(cfg.validate(), Err(FetchError::InvalidConfig(_))));
    }

    #[test]
    fn load_or_init_writes_default_then_reads_it() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let first = load_or_init_at(&path).unwrap();
        assert!(path.exists());
        let second = load_or_init_at(&path).unwrap();
        assert_eq!(first.retry.max_attempts, second.retry.max_attempts);
        assert_eq!(first.chunk_size, second.chunk_size);
    }
}
