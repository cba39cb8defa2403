//! Command-line interface definitions using clap derive macros.
//!
//! Contains the top-level [`Cli`] parser, the [`Commands`] enum for
//! subcommands (run, health), and their associated argument structs.
//! Every `run` flag has an environment variable equivalent for container
//! deployments.

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::relay::forward::DEFAULT_MAX_RESPONSE_BODY;

pub const DEFAULT_API_KEY: &str = "your_strong_secret_api_key_123";
pub const DEFAULT_MAX_BODY: usize = 1_048_576;

#[derive(Parser)]
#[command(
    name = "llm-relay",
    version,
    about = "Authenticated single-hop HTTP relay for LLM prompts",
    propagate_version = true,
    after_help = "\x1b[1mQuick start:\x1b[0m\n  \
        RELAY_API_KEY=s3cret llm-relay run             Start on 0.0.0.0:8080\n  \
        llm-relay run --allow-host localhost          Only relay to localhost\n  \
        llm-relay health http://localhost:8080        Check a running instance"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the relay server
    Run(Box<RunArgs>),

    /// Check health of a running instance
    Health(HealthArgs),
}

#[derive(Args)]
#[command(after_help = "\x1b[1mExamples:\x1b[0m\n  \
        llm-relay run -p 9000 --pretty                          Local dev mode\n  \
        llm-relay run --allow-host '*.internal,ollama'          Restrict destinations\n  \
        llm-relay run --deny-cidr 169.254.0.0/16,10.0.0.0/8     Block IP ranges")]
pub struct RunArgs {
    /// Listen port
    #[arg(short, long, env = "PORT", default_value_t = 8080)]
    pub port: u16,

    /// Listen address
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Shared secret expected in the `X-API-Key` header
    #[arg(
        long,
        env = "RELAY_API_KEY",
        default_value = DEFAULT_API_KEY,
        hide_env_values = true,
        hide_default_value = true
    )]
    pub api_key: String,

    // -- Logging --
    /// Log level
    #[arg(short, long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: LogLevel,

    /// Force pretty (human-readable) log output
    #[arg(long)]
    pub pretty: bool,

    /// Force JSON log output (overrides TTY detection)
    #[arg(long, conflicts_with = "pretty")]
    pub json: bool,

    // -- Destination Policy --
    /// Hosts the relay may forward to (exact names or `*.suffix`)
    #[arg(
        long = "allow-host",
        env = "RELAY_ALLOW_HOSTS",
        value_delimiter = ',',
        help_heading = "Destination Policy"
    )]
    pub allow_hosts: Vec<String>,

    /// IP networks the relay must never forward to (CIDR notation)
    #[arg(
        long = "deny-cidr",
        env = "RELAY_DENY_CIDRS",
        value_delimiter = ',',
        help_heading = "Destination Policy"
    )]
    pub deny_cidrs: Vec<String>,

    // -- Tuning --
    /// Upstream round-trip timeout in seconds
    #[arg(
        long,
        env = "RELAY_TIMEOUT_SECS",
        default_value_t = 300,
        help_heading = "Tuning"
    )]
    pub timeout: u64,

    /// Max request body size in bytes
    #[arg(
        long,
        env = "MAX_BODY_SIZE",
        default_value_t = DEFAULT_MAX_BODY,
        help_heading = "Tuning"
    )]
    pub max_body: usize,

    /// Max upstream response body size in bytes
    #[arg(
        long,
        env = "RELAY_MAX_RESPONSE_BODY",
        default_value_t = DEFAULT_MAX_RESPONSE_BODY,
        help_heading = "Tuning"
    )]
    pub max_response_body: usize,

    /// Model used when the request has no `llm_model`
    #[arg(
        long,
        env = "RELAY_DEFAULT_MODEL",
        default_value = "llama3",
        help_heading = "Tuning"
    )]
    pub default_model: String,
}

#[derive(Args)]
pub struct HealthArgs {
    /// URL of the running instance
    #[arg(default_value = "http://localhost:8080")]
    pub url: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Clone, Debug, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    #[must_use]
    pub const fn to_tracing_level(&self) -> tracing::Level {
        match self {
            Self::Trace => tracing::Level::TRACE,
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warn => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn run_defaults() {
        let cli = Cli::try_parse_from(["llm-relay", "run"]).unwrap();
        let Some(Commands::Run(args)) = cli.command else {
            panic!("expected run subcommand");
        };
        assert_eq!(args.timeout, 300);
        assert_eq!(args.default_model, "llama3");
        assert!(args.allow_hosts.is_empty());
    }

    #[test]
    fn size_limit_defaults_come_from_constants() {
        let cmd = Cli::command();
        let run = cmd.find_subcommand("run").unwrap();
        let default_of = |id: &str| {
            let arg = run.get_arguments().find(|a| a.get_id() == id).unwrap();
            arg.get_default_values()[0].to_string_lossy().into_owned()
        };
        assert_eq!(default_of("max_body"), DEFAULT_MAX_BODY.to_string());
        assert_eq!(
            default_of("max_response_body"),
            DEFAULT_MAX_RESPONSE_BODY.to_string()
        );
    }

    #[test]
    fn allow_hosts_split_on_comma() {
        let cli = Cli::try_parse_from([
            "llm-relay",
            "run",
            "--allow-host",
            "ollama,*.internal",
            "--api-key",
            "k",
        ])
        .unwrap();
        let Some(Commands::Run(args)) = cli.command else {
            panic!("expected run subcommand");
        };
        assert_eq!(args.allow_hosts, vec!["ollama", "*.internal"]);
        assert_eq!(args.api_key, "k");
    }

    #[test]
    fn pretty_conflicts_with_json() {
        assert!(Cli::try_parse_from(["llm-relay", "run", "--pretty", "--json"]).is_err());
    }
}
