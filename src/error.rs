use thiserror::Error;

/// Failure reported by the forecast provider capability.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The provider understood the request and rejected it (e.g. city not found).
    #[error("Provider rejected request: {status} - {message}")]
    Client { status: String, message: String },

    /// Network failure, timeout, unexpected status or undecodable body.
    #[error("Provider unavailable: {0}")]
    Transport(String),
}

impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ProviderError::Transport(format!("request timed out: {}", e))
        } else {
            ProviderError::Transport(e.to_string())
        }
    }
}

/// Contract violations in advisory generation.
#[derive(Debug, Error, PartialEq)]
pub enum AdvisoryError {
    #[error("Cannot build an advisory from a forecast with no records")]
    EmptyForecast,
}

/// Failure writing the backup file. Reading never fails; corrupt files load as empty.
#[derive(Debug, Error)]
pub enum BackupError {
    #[error("Backup file I/O failed for {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize backup index: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_error_message() {
        let err = ProviderError::Client {
            status: "404".to_string(),
            message: "city not found".to_string(),
        };
        assert_eq!(err.to_string(), "Provider rejected request: 404 - city not found");
    }

    #[test]
    fn test_empty_forecast_message() {
        assert!(AdvisoryError::EmptyForecast.to_string().contains("no records"));
    }
}
