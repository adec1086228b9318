use clap::{Parser, Subcommand, ValueEnum};

use std::path::PathBuf;

use super::constants::{
    ENV_CONFIG, ENV_DEBUG, ENV_FILTER_ALLOWED_FIELDS, ENV_FILTER_MAX_BYTES,
    ENV_FILTER_MAX_CONDITIONS, ENV_FILTER_MAX_DEPTH, ENV_PRETTY, ENV_SANITIZE_ALLOW_DATA_IMAGES,
};

#[derive(Parser)]
#[command(name = "sieve")]
#[command(version, about = "Filter records and sanitize markup for admin consoles", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable debug logging
    #[arg(long, global = true, env = ENV_DEBUG)]
    pub debug: bool,

    /// Path to config file
    #[arg(long, short = 'c', global = true, env = ENV_CONFIG)]
    pub config: Option<PathBuf>,

    /// Pretty-print JSON output
    #[arg(long, global = true, env = ENV_PRETTY)]
    pub pretty: bool,

    // Filter limits
    /// Maximum filter JSON size in bytes
    #[arg(long, global = true, env = ENV_FILTER_MAX_BYTES)]
    pub max_filter_bytes: Option<usize>,

    /// Maximum nesting depth of filter groups
    #[arg(long, global = true, env = ENV_FILTER_MAX_DEPTH)]
    pub max_depth: Option<usize>,

    /// Maximum number of conditions in a filter tree
    #[arg(long, global = true, env = ENV_FILTER_MAX_CONDITIONS)]
    pub max_conditions: Option<usize>,

    /// Fields that may be filtered on (comma-separated)
    #[arg(long, global = true, env = ENV_FILTER_ALLOWED_FIELDS, value_delimiter = ',')]
    pub allowed_fields: Option<Vec<String>>,

    /// Keep data:image URLs when sanitizing
    #[arg(long, global = true, env = ENV_SANITIZE_ALLOW_DATA_IMAGES)]
    pub allow_data_images: Option<bool>,
}

#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// Print the records matching a filter as a JSON array
    Apply {
        /// JSON array of records (`-` for stdin)
        #[arg(long, short = 'd')]
        data: PathBuf,

        /// Filter group as JSON
        #[arg(long, short = 'f', conflicts_with = "query", required_unless_present = "query")]
        filter: Option<PathBuf>,

        /// Filter as a URL query string (`filter[0][field]=...`)
        #[arg(long, short = 'q')]
        query: Option<String>,
    },

    /// Flatten a filter group into URL parameters
    Encode {
        /// Filter group as JSON (`-` for stdin)
        #[arg(long, short = 'f')]
        filter: PathBuf,

        /// Output format
        #[arg(long, value_enum, default_value_t = EncodeFormat::Query)]
        format: EncodeFormat,
    },

    /// Rebuild a filter group from a URL query string
    Decode {
        /// Query string, with or without the leading `?`
        #[arg(long, short = 'q')]
        query: String,
    },

    /// Clean HTML markup
    Sanitize {
        /// HTML input (`-` for stdin)
        #[arg(long, short = 'i', default_value = "-")]
        input: PathBuf,

        /// Escape everything instead of cleaning
        #[arg(long, conflicts_with = "strip")]
        escape: bool,

        /// Remove all tags, keeping text
        #[arg(long)]
        strip: bool,
    },
}

/// Output of the `encode` command
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EncodeFormat {
    /// `filter%5B0%5D%5Bfield%5D=age&...`
    #[default]
    Query,
    /// JSON object of parameter name to value
    Json,
}

/// Configuration derived from CLI arguments
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub debug: bool,
    pub config: Option<PathBuf>,
    pub pretty: bool,
    pub max_filter_bytes: Option<usize>,
    pub max_depth: Option<usize>,
    pub max_conditions: Option<usize>,
    pub allowed_fields: Option<Vec<String>>,
    pub allow_data_images: Option<bool>,
}

/// Parse CLI arguments and return config with command
pub fn parse() -> (CliConfig, Commands) {
    let cli = Cli::parse();
    let config = CliConfig {
        debug: cli.debug,
        config: cli.config,
        pretty: cli.pretty,
        max_filter_bytes: cli.max_filter_bytes,
        max_depth: cli.max_depth,
        max_conditions: cli.max_conditions,
        allowed_fields: cli.allowed_fields,
        allow_data_images: cli.allow_data_images,
    };
    (config, cli.command)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn apply_requires_filter_or_query() {
        assert!(Cli::try_parse_from(["sieve", "apply", "--data", "d.json"]).is_err());
        assert!(
            Cli::try_parse_from(["sieve", "apply", "-d", "d.json", "-f", "f.json", "-q", "x"])
                .is_err()
        );

        let cli = Cli::try_parse_from(["sieve", "apply", "-d", "d.json", "-q", "a=b"]).unwrap();
        match cli.command {
            Commands::Apply { query, filter, .. } => {
                assert_eq!(query.as_deref(), Some("a=b"));
                assert!(filter.is_none());
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "sieve",
            "decode",
            "-q",
            "x",
            "--pretty",
            "--allowed-fields",
            "name,age",
        ])
        .unwrap();
        assert!(cli.pretty);
        assert_eq!(
            cli.allowed_fields,
            Some(vec!["name".to_string(), "age".to_string()])
        );
    }

    #[test]
    fn encode_format_defaults_to_query() {
        let cli = Cli::try_parse_from(["sieve", "encode", "-f", "g.json"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Encode {
                format: EncodeFormat::Query,
                ..
            }
        ));
    }

    #[test]
    fn sanitize_escape_conflicts_with_strip() {
        assert!(Cli::try_parse_from(["sieve", "sanitize", "--escape", "--strip"]).is_err());
        let cli = Cli::try_parse_from(["sieve", "sanitize"]).unwrap();
        match cli.command {
            Commands::Sanitize { input, .. } => assert_eq!(input, PathBuf::from("-")),
            other => panic!("unexpected command {:?}", other),
        }
    }
}
