//! Config and state file.
//!
//! A single JSON file holds the connection settings and the watermark of the
//! last successful run. Connection settings can be overridden from the
//! environment (a `.env` file is loaded first by `main`).

use std::env;
use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::error::ConfigError;

pub const WATERMARK_KEY: &str = "last_run_timestamp";

#[derive(Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub tautulli_url: String,
    #[serde(default)]
    pub tautulli_api_key: String,
    #[serde(default)]
    pub discord_webhook_url: String,

    /// Only report items from these libraries. Empty means every library.
    #[serde(default)]
    pub library_names: Vec<String>,

    #[serde(default = "default_page_size")]
    pub page_size: u32,
    /// How far back the first run looks when no watermark is saved.
    #[serde(default = "default_lookback_hours")]
    pub lookback_hours: u32,

    #[serde(default = "default_image_width")]
    pub image_width: u32,
    #[serde(default = "default_image_height")]
    pub image_height: u32,

    #[serde(default, deserialize_with = "deserialize_watermark")]
    pub last_run_timestamp: Option<DateTime<Utc>>,
}

fn default_page_size() -> u32 {
    50
}

fn default_lookback_hours() -> u32 {
    24
}

fn default_image_width() -> u32 {
    crate::services::tautulli::DEFAULT_IMAGE_WIDTH
}

fn default_image_height() -> u32 {
    crate::services::tautulli::DEFAULT_IMAGE_HEIGHT
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("tautulli_url", &self.tautulli_url)
            .field("tautulli_api_key", &"<redacted>")
            .field("discord_webhook_url", &"<redacted>")
            .field("library_names", &self.library_names)
            .field("page_size", &self.page_size)
            .field("lookback_hours", &self.lookback_hours)
            .field("image_width", &self.image_width)
            .field("image_height", &self.image_height)
            .field("last_run_timestamp", &self.last_run_timestamp)
            .finish()
    }
}

impl Config {
    /// Read the file, apply environment overrides and validate.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Err(ConfigError::NotFound {
                    path: path.display().to_string(),
                })
            }
            Err(err) => return Err(err.into()),
        };

        let mut config = Self::from_json(&content)?;
        config.apply_overrides(|key| env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(content).map_err(|err| ConfigError::parse(err.to_string()))
    }

    /// Replace connection settings with non-empty values from `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let overrides: [(&str, &mut String); 3] = [
            ("TAUTULLI_URL", &mut self.tautulli_url),
            ("TAUTULLI_API_KEY", &mut self.tautulli_api_key),
            ("DISCORD_WEBHOOK_URL", &mut self.discord_webhook_url),
        ];

        for (key, field) in overrides {
            if let Some(value) = lookup(key).filter(|v| !v.trim().is_empty()) {
                *field = value;
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tautulli_url.trim().is_empty() {
            return Err(ConfigError::missing_field("tautulli_url"));
        }
        if !(self.tautulli_url.starts_with("http://") || self.tautulli_url.starts_with("https://"))
        {
            return Err(ConfigError::invalid_value(
                "tautulli_url",
                "must start with http:// or https://",
            ));
        }
        if self.tautulli_api_key.trim().is_empty() {
            return Err(ConfigError::missing_field("tautulli_api_key"));
        }
        if self.page_size == 0 {
            return Err(ConfigError::invalid_value("page_size", "must be greater than 0"));
        }
        if self.lookback_hours == 0 {
            return Err(ConfigError::invalid_value(
                "lookback_hours",
                "must be greater than 0",
            ));
        }
        Ok(())
    }

    /// The webhook URL, required only when messages are actually posted.
    pub fn require_webhook(&self) -> Result<&str, ConfigError> {
        let url = self.discord_webhook_url.trim();
        if url.is_empty() {
            return Err(ConfigError::missing_field("discord_webhook_url"));
        }
        Ok(url)
    }

    /// Store `at` as the watermark, keeping every other key in the file.
    ///
    /// The file is written to a sibling temp file first and renamed over the
    /// original.
    pub fn save_watermark(path: &Path, at: DateTime<Utc>) -> Result<(), ConfigError> {
        let mut document = match fs::read_to_string(path) {
            Ok(content) => serde_json::from_str::<Value>(&content)
                .map_err(|err| ConfigError::parse(err.to_string()))?,
            Err(err) if err.kind() == ErrorKind::NotFound => Value::Object(Default::default()),
            Err(err) => return Err(err.into()),
        };

        let Some(object) = document.as_object_mut() else {
            return Err(ConfigError::parse("config file must contain a JSON object"));
        };
        object.insert(WATERMARK_KEY.to_string(), Value::String(at.to_rfc3339()));

        let mut serialized = serde_json::to_string_pretty(&document)
            .map_err(|err| ConfigError::parse(err.to_string()))?;
        serialized.push('\n');

        let mut tmp_name = path.as_os_str().to_owned();
        tmp_name.push(".tmp");
        let tmp_path = Path::new(&tmp_name);

        fs::write(tmp_path, serialized)?;
        fs::rename(tmp_path, path)?;
        Ok(())
    }
}

/// Parse a saved watermark.
///
/// Accepts RFC 3339, a naive ISO 8601 timestamp (taken as UTC) or epoch
/// seconds.
pub fn parse_watermark(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(Utc.from_utc_datetime(&naive));
    }
    value
        .parse::<i64>()
        .ok()
        .and_then(|secs| Utc.timestamp_opt(secs, 0).single())
}

fn deserialize_watermark<'de, D>(d: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    match Option::<Value>::deserialize(d)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => parse_watermark(&s)
            .map(Some)
            .ok_or_else(|| D::Error::custom(format!("invalid {}: {}", WATERMARK_KEY, s))),
        Some(Value::Number(n)) => n
            .as_i64()
            .and_then(|secs| Utc.timestamp_opt(secs, 0).single())
            .map(Some)
            .ok_or_else(|| D::Error::custom(format!("invalid {}: {}", WATERMARK_KEY, n))),
        Some(other) => Err(D::Error::custom(format!(
            "invalid {}: {}",
            WATERMARK_KEY, other
        ))),
    }
}
