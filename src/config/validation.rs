//! Startup validation of `run` arguments.
//!
//! [`validate_run_args`] checks scalar settings (secret, timeout, body
//! limit, default model) and returns every problem found so they can be
//! reported at once. Destination policy entries are validated by
//! [`DestinationPolicy::new`](crate::relay::guard::DestinationPolicy::new).

use crate::cli::RunArgs;
use crate::error::ValidationError;

pub fn validate_run_args(args: &RunArgs) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if args.api_key.is_empty() {
        errors.push(ValidationError {
            field: "api_key".into(),
            message: "shared secret cannot be empty".into(),
            suggestion: Some("set RELAY_API_KEY or pass --api-key".into()),
        });
    }

    if args.timeout == 0 {
        errors.push(ValidationError {
            field: "timeout".into(),
            message: "must be greater than zero".into(),
            suggestion: Some("the default is 300 seconds".into()),
        });
    }

    if args.max_body == 0 {
        errors.push(ValidationError {
            field: "max_body".into(),
            message: "must be greater than zero".into(),
            suggestion: None,
        });
    }

    if args.max_response_body == 0 {
        errors.push(ValidationError {
            field: "max_response_body".into(),
            message: "must be greater than zero".into(),
            suggestion: None,
        });
    }

    if args.default_model.trim().is_empty() {
        errors.push(ValidationError {
            field: "default_model".into(),
            message: "cannot be empty".into(),
            suggestion: Some("e.g. --default-model llama3".into()),
        });
    }

    errors
}

/// Human-readable summary of the effective destination policy, logged at startup.
#[must_use]
pub fn describe_policy(allow_hosts: &[String], deny_cidrs: &[String]) -> String {
    let allow = if allow_hosts.is_empty() {
        "any host".to_string()
    } else {
        allow_hosts.join(", ")
    };
    if deny_cidrs.is_empty() {
        format!("allow: {allow}")
    } else {
        format!("allow: {allow}; deny: {}", deny_cidrs.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::LogLevel;

    fn valid_args() -> RunArgs {
        RunArgs {
            port: 8080,
            host: "127.0.0.1".into(),
            api_key: "secret".into(),
            log_level: LogLevel::Info,
            pretty: false,
            json: false,
            allow_hosts: Vec::new(),
            deny_cidrs: Vec::new(),
            timeout: 300,
            max_body: 1024,
            max_response_body: 4096,
            default_model: "llama3".into(),
        }
    }

    #[test]
    fn valid_args_pass() {
        assert!(validate_run_args(&valid_args()).is_empty());
    }

    #[test]
    fn zero_timeout_fails() {
        let mut args = valid_args();
        args.timeout = 0;
        let errors = validate_run_args(&args);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "timeout");
    }

    #[test]
    fn collects_multiple_errors() {
        let mut args = valid_args();
        args.api_key = String::new();
        args.max_body = 0;
        args.max_response_body = 0;
        args.default_model = "  ".into();
        assert_eq!(validate_run_args(&args).len(), 4);
    }

    #[test]
    fn policy_description() {
        assert_eq!(describe_policy(&[], &[]), "allow: any host");
        assert_eq!(
            describe_policy(&["ollama".into()], &["10.0.0.0/8".into()]),
            "allow: ollama; deny: 10.0.0.0/8"
        );
    }
}
