//! Core application

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::Value as JsonValue;

use crate::core::cli::{self, Commands, EncodeFormat};
use crate::core::config::AppConfig;
use crate::core::constants::{APP_NAME, APP_NAME_LOWER, ENV_LOG};
use crate::domain::filters::{
    FilterError, FilterGroup, apply_filter, filter_group_to_url_params, parse_filter_group,
    parse_query_string, parse_url_params, to_query_string, url_params_to_filter_group,
    validate_filter_group,
};
use crate::domain::sanitize::{Sanitizer, escape_html, strip_tags};
use crate::utils::file::read_input;

pub struct CoreApp {
    pub config: AppConfig,
    pub sanitizer: Sanitizer,
}

impl CoreApp {
    /// Run the application with CLI argument parsing
    pub fn run() -> Result<()> {
        dotenvy::dotenv().ok();

        let (cli_config, command) = cli::parse();
        // Config files may turn on debug, so they are read before the subscriber exists
        let config = AppConfig::load(&cli_config)?;
        Self::init_logging(config.debug);

        tracing::debug!(app = APP_NAME, config = ?config, "Application starting");
        tracing::trace!(command = ?command, "Parsed command");

        let app = Self::init(config)?;
        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        app.execute(command, &mut out)?;
        out.flush().context("Failed to flush output")?;
        Ok(())
    }

    pub fn init(config: AppConfig) -> Result<Self> {
        let sanitizer = Sanitizer::new(&config.sanitize)
            .map_err(|e| anyhow::anyhow!("Failed to initialize sanitizer: {}", e))?;
        Ok(Self { config, sanitizer })
    }

    fn init_logging(debug: bool) {
        let level = if debug { "debug" } else { "info" };
        let default_filter = format!("{},{}={}", level, APP_NAME_LOWER, level);

        let filter = std::env::var(ENV_LOG)
            .or_else(|_| std::env::var("RUST_LOG"))
            .unwrap_or(default_filter);

        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_thread_ids(false)
            .with_level(true)
            .with_ansi(true)
            .compact()
            .with_env_filter(filter)
            .init();
    }

    /// Execute a command, writing its result to `out`
    pub fn execute<W: Write>(&self, command: Commands, out: &mut W) -> Result<()> {
        match command {
            Commands::Apply {
                data,
                filter,
                query,
            } => {
                let group = match (filter, query) {
                    (Some(path), _) => self.load_filter(&path)?,
                    (None, Some(query)) => self.filter_from_query(&query)?,
                    (None, None) => anyhow::bail!("Either --filter or --query is required"),
                };
                let records = load_records(&data)?;
                let matched = apply_filter(&records, &group);
                tracing::info!(
                    total = records.len(),
                    matched = matched.len(),
                    "Filter applied"
                );
                self.write_json(out, &matched)
            }
            Commands::Encode { filter, format } => {
                let group = self.load_filter(&filter)?;
                let params = filter_group_to_url_params(&group);
                match format {
                    EncodeFormat::Query => {
                        writeln!(out, "{}", to_query_string(&params))?;
                        Ok(())
                    }
                    EncodeFormat::Json => self.write_json(out, &params),
                }
            }
            Commands::Decode { query } => {
                let params = parse_query_string(&query);
                let group = url_params_to_filter_group(&params)
                    .context("No filter conditions could be decoded from the query")?;
                self.write_json(out, &group)
            }
            Commands::Sanitize {
                input,
                escape,
                strip,
            } => {
                let html = read_input(&input)?;
                let cleaned = if escape {
                    escape_html(&html)
                } else if strip {
                    strip_tags(&html)
                } else {
                    self.sanitizer.sanitize(&html)
                };
                write!(out, "{}", cleaned)?;
                Ok(())
            }
        }
    }

    fn load_filter(&self, path: &Path) -> Result<FilterGroup> {
        let content = read_input(path)?;
        parse_filter_group(&content, &self.config.filters)
            .with_context(|| format!("Invalid filter in {}", path.display()))
    }

    /// A query without conditions selects everything; malformed values are errors.
    fn filter_from_query(&self, query: &str) -> Result<FilterGroup> {
        let params = parse_query_string(query);
        let group = match parse_url_params(&params) {
            Ok(group) => group,
            Err(FilterError::NoConditions) => {
                tracing::warn!("Query has no filter conditions, matching all records");
                FilterGroup::default()
            }
            Err(e) => return Err(e).context("Invalid filter query"),
        };
        validate_filter_group(&group, &self.config.filters).context("Invalid filter query")?;
        Ok(group)
    }

    fn write_json<W: Write, T: Serialize + ?Sized>(&self, out: &mut W, value: &T) -> Result<()> {
        if self.config.output.pretty {
            serde_json::to_writer_pretty(&mut *out, value)?;
        } else {
            serde_json::to_writer(&mut *out, value)?;
        }
        writeln!(out)?;
        Ok(())
    }
}

fn load_records(path: &Path) -> Result<Vec<JsonValue>> {
    let content = read_input(path)?;
    serde_json::from_str(&content)
        .with_context(|| format!("Expected a JSON array of records in {}", path.display()))
}
