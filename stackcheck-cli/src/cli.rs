//! CLI argument parsing using clap derive API
//!
//! Purely declarative: no side effects or I/O happen here.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// stackcheck -- compose-spec compliance runner.
///
/// Use `stackcheck <COMMAND> --help` for subcommand details.
#[derive(Parser, Debug)]
#[command(name = "stackcheck", version, about, long_about = None)]
pub struct Cli {
    /// Path to the stackcheck.toml configuration file.
    #[arg(short, long, default_value = "stackcheck.toml")]
    pub config: PathBuf,

    /// Override log level (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Output format.
    #[arg(long, global = true, default_value = "text")]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Supported output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    Text,
    /// Machine-readable JSON.
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run compliance tests against every command variant.
    Run(RunArgs),

    /// List the command variants found in the commands directory.
    Variants(VariantsArgs),

    /// List the scenario directories and the tests that use them.
    Scenarios(ScenariosArgs),

    /// Manage configuration.
    Config(ConfigArgs),
}

// ---- run ----

/// Run the compliance matrix.
#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Run only this test (repeatable; default: all tests).
    #[arg(long = "test", value_name = "NAME")]
    pub tests: Vec<String>,

    /// Run only this variant (repeatable; default: all variants).
    #[arg(long = "variant", value_name = "NAME")]
    pub variants: Vec<String>,

    /// Override the directory holding variant descriptors.
    #[arg(long)]
    pub commands_dir: Option<PathBuf>,

    /// Override the directory holding scenario fixtures.
    #[arg(long)]
    pub tests_dir: Option<PathBuf>,
}

// ---- variants ----

#[derive(Args, Debug, Default)]
pub struct VariantsArgs {
    /// Override the directory holding variant descriptors.
    #[arg(long)]
    pub commands_dir: Option<PathBuf>,
}

// ---- scenarios ----

#[derive(Args, Debug, Default)]
pub struct ScenariosArgs {
    /// Override the directory holding scenario fixtures.
    #[arg(long)]
    pub tests_dir: Option<PathBuf>,
}

// ---- config ----

/// Manage stackcheck configuration.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Validate the configuration file and report errors.
    Validate,
    /// Show the effective configuration (file + env overrides + defaults).
    Show {
        /// Show only a specific section (general, harness, target).
        #[arg(long)]
        section: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parse_run_defaults() {
        let cli = Cli::try_parse_from(["stackcheck", "run"]).expect("parse succeeded");
        assert_eq!(cli.config, PathBuf::from("stackcheck.toml"));
        assert_eq!(cli.output, OutputFormat::Text);
        match cli.command {
            Commands::Run(args) => {
                assert!(args.tests.is_empty(), "no test filter by default");
                assert!(args.variants.is_empty(), "no variant filter by default");
                assert!(args.commands_dir.is_none());
                assert!(args.tests_dir.is_none());
            }
            _ => panic!("expected Run command"),
        }
    }

    #[test]
    fn test_cli_parse_run_repeated_filters() {
        // Given: Repeated --test and --variant flags
        let cli = Cli::try_parse_from([
            "stackcheck",
            "run",
            "--test",
            "simple_lifecycle",
            "--test",
            "udp_port",
            "--variant",
            "docker-compose",
        ])
        .expect("parse succeeded");

        // Then: Every occurrence is kept in order
        match cli.command {
            Commands::Run(args) => {
                assert_eq!(args.tests, vec!["simple_lifecycle", "udp_port"]);
                assert_eq!(args.variants, vec!["docker-compose"]);
            }
            _ => panic!("expected Run command"),
        }
    }

    #[test]
    fn test_cli_parse_run_directory_overrides() {
        let cli = Cli::try_parse_from([
            "stackcheck",
            "run",
            "--commands-dir",
            "/opt/commands",
            "--tests-dir",
            "/opt/tests",
        ])
        .expect("parse succeeded");
        match cli.command {
            Commands::Run(args) => {
                assert_eq!(args.commands_dir, Some(PathBuf::from("/opt/commands")));
                assert_eq!(args.tests_dir, Some(PathBuf::from("/opt/tests")));
            }
            _ => panic!("expected Run command"),
        }
    }

    #[test]
    fn test_cli_parse_variants_and_scenarios() {
        let cli = Cli::try_parse_from(["stackcheck", "variants", "--commands-dir", "cmds"])
            .expect("parse succeeded");
        assert!(matches!(
            cli.command,
            Commands::Variants(VariantsArgs { commands_dir: Some(_) })
        ));

        let cli = Cli::try_parse_from(["stackcheck", "scenarios"]).expect("parse succeeded");
        assert!(matches!(
            cli.command,
            Commands::Scenarios(ScenariosArgs { tests_dir: None })
        ));
    }

    #[test]
    fn test_cli_parse_config_show_section() {
        let cli = Cli::try_parse_from(["stackcheck", "config", "show", "--section", "harness"])
            .expect("parse succeeded");
        match cli.command {
            Commands::Config(ConfigArgs {
                action: ConfigAction::Show { section },
            }) => assert_eq!(section.as_deref(), Some("harness")),
            _ => panic!("expected Config Show command"),
        }
    }

    #[test]
    fn test_cli_global_flags_after_subcommand() {
        // Given: Global flags placed after the subcommand
        let cli = Cli::try_parse_from([
            "stackcheck",
            "-c",
            "/etc/stackcheck.toml",
            "variants",
            "--output",
            "json",
            "--log-level",
            "debug",
        ])
        .expect("parse succeeded");

        // Then: They are still applied
        assert_eq!(cli.config, PathBuf::from("/etc/stackcheck.toml"));
        assert_eq!(cli.output, OutputFormat::Json);
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
    }

    #[test]
    fn test_cli_rejects_unknown_output_format() {
        let result = Cli::try_parse_from(["stackcheck", "run", "--output", "yaml"]);
        assert!(result.is_err(), "yaml is not a supported output format");
    }

    #[test]
    fn test_cli_requires_subcommand() {
        let result = Cli::try_parse_from(["stackcheck"]);
        assert!(result.is_err(), "a subcommand is required");
    }

    #[test]
    fn test_cli_debug_assert() {
        Cli::command().debug_assert();
    }
}
