//! Process-level error types for the relay.
//!
//! Defines [`RelayError`] (startup, CLI, and health-command failures) and
//! [`ValidationError`] for settings validation. Request-path failures never
//! use these types; they are modeled as
//! [`RelayOutcome`](crate::relay::outcome::RelayOutcome) variants instead.

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
    pub suggestion: Option<String>,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "  {}: {}", self.field, self.message)?;
        if let Some(ref suggestion) = self.suggestion {
            write!(f, " ({suggestion})")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

fn format_errors(errors: &[ValidationError]) -> String {
    use std::fmt::Write;
    let mut buf = String::new();
    for (i, e) in errors.iter().enumerate() {
        if i > 0 {
            buf.push('\n');
        }
        // write! to String is infallible (only fails on OOM which is unrecoverable)
        let _ = write!(buf, "{e}");
    }
    buf
}

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum RelayError {
    #[error("Invalid relay settings:\n{}", format_errors(.errors))]
    InvalidSettings { errors: Vec<ValidationError> },

    #[error("Invalid address: {0}")]
    AddressParse(#[from] std::net::AddrParseError),

    #[error("Invalid URI: {source}")]
    UriParse {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("HTTP request failed: {source}")]
    HttpRequest {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("Health check failed with status {0}")]
    HealthCheckFailed(hyper::StatusCode),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_includes_suggestion() {
        let err = ValidationError {
            field: "timeout".into(),
            message: "must be greater than zero".into(),
            suggestion: Some("the default is 300".into()),
        };
        assert_eq!(
            err.to_string(),
            "  timeout: must be greater than zero (the default is 300)"
        );
    }

    #[test]
    fn invalid_settings_lists_every_error() {
        let err = RelayError::InvalidSettings {
            errors: vec![
                ValidationError {
                    field: "api_key".into(),
                    message: "cannot be empty".into(),
                    suggestion: None,
                },
                ValidationError {
                    field: "timeout".into(),
                    message: "must be greater than zero".into(),
                    suggestion: None,
                },
            ],
        };
        let msg = err.to_string();
        assert!(msg.contains("api_key: cannot be empty"));
        assert!(msg.contains("\n  timeout: must be greater than zero"));
    }
}
