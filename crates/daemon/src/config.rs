use anyhow::{Context, Result};
use engine::{CaptionSettings, CaptionStyle};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use tracing::level_filters::LevelFilter;

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:7777";
const DEFAULT_DB_PATH: &str = ".cache/captions.db";
const DEFAULT_TRANSCRIBE_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Clone)]
pub struct DaemonConfig {
    pub bind_addr: SocketAddr,
    pub db_path: PathBuf,
    /// Base URL of the ML service. `None` means transcription is not configured.
    pub ml_service_url: Option<String>,
    pub transcribe_timeout: Duration,
    pub log_level: LevelFilter,
    pub caption_settings: CaptionSettings,
    pub caption_style: CaptionStyle,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        DaemonConfig {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 7777)),
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            ml_service_url: None,
            transcribe_timeout: Duration::from_secs(DEFAULT_TRANSCRIBE_TIMEOUT_SECS),
            log_level: LevelFilter::INFO,
            caption_settings: CaptionSettings::default(),
            caption_style: CaptionStyle::default(),
        }
    }
}

impl DaemonConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let bind_addr = get("CAPTIONS_BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse::<SocketAddr>()
            .context("CAPTIONS_BIND_ADDR is not a valid socket address")?;

        let db_path = get("CAPTIONS_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_PATH));

        let ml_service_url = get("ML_SERVICE_URL").map(|url| url.trim_end_matches('/').to_string());

        let transcribe_timeout = match get("CAPTIONS_TRANSCRIBE_TIMEOUT_SECS") {
            Some(secs) => Duration::from_secs(
                secs.parse::<u64>()
                    .context("CAPTIONS_TRANSCRIBE_TIMEOUT_SECS must be a whole number of seconds")?,
            ),
            None => Duration::from_secs(DEFAULT_TRANSCRIBE_TIMEOUT_SECS),
        };

        let log_level = match get("CAPTIONS_LOG_LEVEL") {
            Some(level) => level
                .parse::<LevelFilter>()
                .with_context(|| format!("unknown log level {:?}", level))?,
            None => LevelFilter::INFO,
        };

        let caption_settings = match get("CAPTIONS_SETTINGS_JSON") {
            Some(path) => {
                let raw = std::fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read caption settings from {}", path))?;
                let settings: CaptionSettings = serde_json::from_str(&raw)
                    .with_context(|| format!("Failed to parse caption settings in {}", path))?;
                settings.validate()?;
                settings
            }
            None => CaptionSettings::default(),
        };

        Ok(DaemonConfig {
            bind_addr,
            db_path,
            ml_service_url,
            transcribe_timeout,
            log_level,
            caption_settings,
            caption_style: CaptionStyle::default(),
        })
    }
}
