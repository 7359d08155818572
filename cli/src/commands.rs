//! CLI command definitions

use clap::{Parser, Subcommand};
use serde_json::Value;
use std::path::PathBuf;

/// CLI arguments for toolplan
#[derive(Parser, Debug)]
#[command(name = "toolplan")]
#[command(author, version, about = "Dependency-aware execution plans for tool registries")]
#[command(long_about = r#"
toolplan reads a tool registry, resolves the dependency closure of the
requested tools and prints an execution plan: a valid order, the groups of
tools that may run concurrently, and the parameters still missing.

Configuration files are loaded from (in priority order):
1. --config <path>        Explicit config file
2. TOOLPLAN_* variables   e.g. TOOLPLAN_PLANNER__AFFINITY_POLICY=off
3. ./toolplan.toml        Project-level config
4. ~/.config/toolplan/config.toml   Global config

Example:
  toolplan --registry tools.toml plan send_invoice -p customer_id=42
  toolplan --registry tools.toml order send_invoice fetch_user
  toolplan --registry tools.toml cycles
"#)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Tool registry file (overrides registry.path from config)
    #[arg(short, long, value_name = "PATH", global = true)]
    pub registry: Option<PathBuf>,

    /// Path to configuration file
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long, global = true)]
    pub no_config: bool,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate an execution plan
    Plan {
        /// Requested tool ids
        #[arg(required = true)]
        tools: Vec<String>,

        /// Provided parameter, `name=value` or `tool.name=value` (repeatable)
        #[arg(short, long = "param", value_name = "KEY=VALUE", value_parser = parse_param)]
        params: Vec<(String, Value)>,
    },

    /// Print the dependency closure in execution order
    Order {
        #[arg(required = true)]
        tools: Vec<String>,
    },

    /// Print the dependency closure
    Closure {
        #[arg(required = true)]
        tools: Vec<String>,
    },

    /// Group the given tools into parallel levels
    Groups {
        #[arg(required = true)]
        tools: Vec<String>,
    },

    /// List dependency cycles in the registry
    Cycles {
        /// Include inactive tools
        #[arg(long)]
        all: bool,
    },

    /// Show configuration sources and issues
    Config,
}

/// Parses `KEY=VALUE`. The value is read as JSON when it parses, else as a string.
pub fn parse_param(raw: &str) -> Result<(String, Value), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{raw}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty parameter name in '{raw}'"));
    }
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((key.to_string(), value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use serde_json::json;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_param() {
        assert_eq!(parse_param("limit=10").unwrap(), ("limit".to_string(), json!(10)));
        assert_eq!(
            parse_param("fetch_user.name=Ada Lovelace").unwrap(),
            ("fetch_user.name".to_string(), json!("Ada Lovelace"))
        );
        assert_eq!(parse_param("flags=[1,2]").unwrap().1, json!([1, 2]));
        assert_eq!(parse_param("empty=").unwrap().1, json!(""));
        assert!(parse_param("novalue").is_err());
        assert!(parse_param("=1").is_err());
    }

    #[test]
    fn test_plan_arguments() {
        let cli = Cli::parse_from([
            "toolplan", "-vv", "--registry", "tools.toml", "plan", "b", "a", "-p", "x=1",
        ]);
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Command::Plan { tools, params } => {
                assert_eq!(tools, vec!["b", "a"]);
                assert_eq!(params, vec![("x".to_string(), json!(1))]);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
