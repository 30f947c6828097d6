//! CLI command definitions and subcommands

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::api::{AnalysisMethod, StructAlgorithm};

/// FileOrg - staged file reorganization client
#[derive(Parser)]
#[command(
    name = "fo",
    about = "Client for staged file reorganization sessions",
    version = env!("CARGO_PKG_VERSION")
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands
#[derive(Subcommand)]
pub enum Command {
    /// Create a new session for a directory
    Create {
        /// Absolute path of the directory to reorganize
        directory: String,

        /// Scan sub-directories too
        #[arg(short, long)]
        recursive: bool,
    },

    /// List known sessions
    Sessions {
        #[arg(long, default_value_t = 0)]
        skip: u32,

        #[arg(long, default_value_t = 50)]
        limit: u32,
    },

    /// Show one session
    Status {
        session_id: String,
    },

    /// List available analysis methods
    Methods,

    /// List available structuring algorithms
    Algorithms,

    /// Run file analysis on a session
    Analyze {
        session_id: String,

        /// Analysis method: META, STRUCT, or SEMANTIC
        #[arg(short, long, default_value = "META")]
        method: AnalysisMethod,

        /// Poll progress until the job finishes
        #[arg(long)]
        watch: bool,
    },

    /// Generate a restructuring plan
    Plan {
        session_id: String,

        /// Structuring algorithm: BY_TYPE, CLUSTER, or CRITERIA
        #[arg(short, long, default_value = "BY_TYPE")]
        algorithm: StructAlgorithm,

        /// Algorithm parameter overrides, validated against its schema
        #[arg(long = "set", value_name = "KEY=VALUE")]
        params: Vec<String>,
    },

    /// Show the before/after preview of the plan
    Preview {
        session_id: String,
    },

    /// Apply the plan
    Apply {
        session_id: String,

        /// Report what would happen without changing anything
        #[arg(long)]
        dry_run: bool,
    },

    /// Show job progress for a session
    Progress {
        session_id: String,

        /// Keep polling until the job finishes
        #[arg(long)]
        watch: bool,
    },

    /// List a server-side directory
    Ls {
        path: String,
    },

    /// Run the full workflow: create, analyze, plan, preview, apply
    Run {
        /// Absolute path of the directory to reorganize
        directory: String,

        #[arg(short, long, default_value = "META")]
        method: AnalysisMethod,

        #[arg(short, long, default_value = "BY_TYPE")]
        algorithm: StructAlgorithm,

        #[arg(short, long)]
        recursive: bool,

        /// Stop after a dry-run apply instead of committing
        #[arg(long)]
        dry_run: bool,
    },
}

/// Parse one `--set KEY=VALUE` override
///
/// The value is taken as JSON when it parses as such, so `--set depth=3`
/// yields a number and `--set mode=fast` a string.
pub fn parse_param(raw: &str) -> Result<(String, serde_json::Value), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("Invalid parameter '{raw}': expected KEY=VALUE"))?;

    if key.is_empty() {
        return Err(format!("Invalid parameter '{raw}': empty key"));
    }

    let value = serde_json::from_str(value).unwrap_or_else(|_| serde_json::Value::String(value.to_string()));
    Ok((key.to_string(), value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use serde_json::json;

    #[test]
    fn test_cli_parses() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_param_json_values() {
        assert_eq!(parse_param("depth=3").unwrap(), ("depth".to_string(), json!(3)));
        assert_eq!(parse_param("strict=true").unwrap(), ("strict".to_string(), json!(true)));
        assert_eq!(parse_param("mode=fast").unwrap(), ("mode".to_string(), json!("fast")));
        // '=' in the value survives
        assert_eq!(parse_param("expr=a=b").unwrap(), ("expr".to_string(), json!("a=b")));
    }

    #[test]
    fn test_parse_param_rejects_malformed() {
        assert!(parse_param("no-equals-sign").is_err());
        assert!(parse_param("=value").is_err());
    }

    #[test]
    fn test_method_flag_parses() {
        let cli = Cli::parse_from(["fo", "analyze", "s-1", "--method", "semantic"]);
        match cli.command {
            Command::Analyze { method, .. } => assert_eq!(method, AnalysisMethod::Semantic),
            _ => panic!("Expected Analyze"),
        }
    }
}
