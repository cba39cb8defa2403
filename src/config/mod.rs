//! Resolved runtime settings for the relay.
//!
//! [`RelaySettings`] is built once from the parsed CLI / environment
//! ([`RunArgs`]) and validated by [`validation`] before the server starts.
//! After that it is immutable; the credential inside it is never logged.

pub mod validation;

use std::time::Duration;

use crate::cli::{RunArgs, DEFAULT_API_KEY, DEFAULT_MAX_BODY};
use crate::error::RelayError;
use crate::relay::auth::Credential;
use crate::relay::forward::{DEFAULT_MAX_RESPONSE_BODY, DEFAULT_TIMEOUT};
use crate::relay::guard::DestinationPolicy;
use crate::relay::request::DEFAULT_MODEL;

#[derive(Debug, Clone)]
pub struct RelaySettings {
    pub credential: Credential,
    pub policy: DestinationPolicy,
    pub timeout: Duration,
    pub max_body: usize,
    pub max_response_body: usize,
    pub default_model: String,
    /// True when the built-in default secret is in use.
    pub default_secret: bool,
}

impl RelaySettings {
    /// Settings with an open policy and default tuning, keyed by `secret`.
    #[must_use]
    pub fn with_secret(secret: &str) -> Self {
        Self {
            credential: Credential::new(secret),
            policy: DestinationPolicy::default(),
            timeout: DEFAULT_TIMEOUT,
            max_body: DEFAULT_MAX_BODY,
            max_response_body: DEFAULT_MAX_RESPONSE_BODY,
            default_model: DEFAULT_MODEL.to_string(),
            default_secret: secret == DEFAULT_API_KEY,
        }
    }

    pub fn from_args(args: &RunArgs) -> Result<Self, RelayError> {
        let mut errors = validation::validate_run_args(args);

        let policy = match DestinationPolicy::new(&args.allow_hosts, &args.deny_cidrs) {
            Ok(policy) => Some(policy),
            Err(policy_errors) => {
                errors.extend(policy_errors);
                None
            }
        };

        match policy {
            Some(policy) if errors.is_empty() => Ok(Self {
                credential: Credential::new(&args.api_key),
                policy,
                timeout: Duration::from_secs(args.timeout),
                max_body: args.max_body,
                max_response_body: args.max_response_body,
                default_model: args.default_model.clone(),
                default_secret: args.api_key == DEFAULT_API_KEY,
            }),
            _ => Err(RelayError::InvalidSettings { errors }),
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;
    use crate::cli::{Cli, Commands};

    fn run_args(extra: &[&str]) -> RunArgs {
        let mut argv = vec!["llm-relay", "run"];
        argv.extend_from_slice(extra);
        match Cli::try_parse_from(argv).unwrap().command {
            Some(Commands::Run(args)) => *args,
            _ => panic!("expected run subcommand"),
        }
    }

    #[test]
    fn builds_from_valid_args() {
        let settings = RelaySettings::from_args(&run_args(&[
            "--api-key",
            "k",
            "--timeout",
            "5",
            "--allow-host",
            "ollama",
        ]))
        .unwrap();
        assert!(settings.credential.matches("k"));
        assert_eq!(settings.timeout, Duration::from_secs(5));
        assert_eq!(settings.policy.allow_hosts(), vec!["ollama"]);
        assert!(!settings.default_secret);
    }

    #[test]
    fn reports_arg_and_policy_errors_together() {
        let err = RelaySettings::from_args(&run_args(&[
            "--api-key",
            "",
            "--deny-cidr",
            "nope",
        ]))
        .unwrap_err();
        let RelayError::InvalidSettings { errors } = err else {
            panic!("expected invalid settings");
        };
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert!(fields.contains(&"api_key"));
        assert!(fields.contains(&"deny_cidr"));
    }

    #[test]
    fn with_secret_uses_shared_defaults() {
        let settings = RelaySettings::with_secret("k");
        assert_eq!(settings.max_body, DEFAULT_MAX_BODY);
        assert_eq!(settings.max_response_body, DEFAULT_MAX_RESPONSE_BODY);
        assert_eq!(settings.timeout, DEFAULT_TIMEOUT);
        assert_eq!(settings.default_model, DEFAULT_MODEL);
    }

    #[test]
    fn max_response_body_flag_is_applied() {
        let settings = RelaySettings::from_args(&run_args(&[
            "--api-key",
            "k",
            "--max-response-body",
            "2048",
        ]))
        .unwrap();
        assert_eq!(settings.max_response_body, 2048);
    }

    #[test]
    fn default_secret_is_flagged() {
        assert!(RelaySettings::with_secret(DEFAULT_API_KEY).default_secret);
        assert!(!RelaySettings::with_secret("other").default_secret);
    }
}
