//! Error types shared across the notifier.
//!
//! Each layer (config file, Tautulli API, Discord webhook) has its own error
//! enum; [`AppError`] unifies them so `?` carries any failure up to `main`,
//! which logs it and exits non-zero.

use thiserror::Error;

/// Unified application error.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Tautulli error: {0}")]
    Tautulli(#[from] TautulliError),

    #[error("Webhook error: {0}")]
    Webhook(#[from] WebhookError),
}

/// Errors from loading, validating or persisting the config/state file.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file not found: {path}")]
    NotFound { path: String },

    #[error("Invalid config format: {message}")]
    Parse { message: String },

    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors from the Tautulli monitoring API.
#[derive(Error, Debug)]
pub enum TautulliError {
    #[error("Network error: {message}")]
    Network { message: String },

    #[error("Tautulli returned HTTP {status}")]
    Status { status: u16 },

    #[error("Data format error: {message}")]
    Parse { message: String },

    #[error("API error for {cmd}: {message}")]
    Api { cmd: String, message: String },

    #[error("Invalid URL: {message}")]
    InvalidUrl { message: String },
}

/// Errors from the Discord webhook.
#[derive(Error, Debug)]
pub enum WebhookError {
    #[error("Network error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Webhook returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to encode payload: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Invalid webhook URL: {message}")]
    InvalidUrl { message: String },
}

impl ConfigError {
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse { message: message.into() }
    }

    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingField { field: field.into() }
    }

    pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl TautulliError {
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network { message: message.into() }
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse { message: message.into() }
    }

    pub fn api(cmd: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Api {
            cmd: cmd.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_converts_into_app_error() {
        let err: AppError = ConfigError::missing_field("tautulli_url").into();
        assert_eq!(
            err.to_string(),
            "Config error: Missing required field: tautulli_url"
        );
    }

    #[test]
    fn tautulli_api_error_names_the_command() {
        let err = TautulliError::api("get_libraries", "Invalid apikey");
        assert_eq!(err.to_string(), "API error for get_libraries: Invalid apikey");
    }

    #[test]
    fn webhook_status_error_includes_body() {
        let err = WebhookError::Status {
            status: 400,
            body: "{\"embeds\": [\"0\"]}".to_string(),
        };
        assert!(err.to_string().starts_with("Webhook returned HTTP 400"));
    }

    #[test]
    fn io_error_converts_into_config_error() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: ConfigError = io.into();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
