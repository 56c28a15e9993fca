//! `odata-filter`: compile OData `$filter` expressions to parameterized SQL
//! from the command line.
//!
//! ```bash
//! odata-filter --config filter.yaml compile --csdl model.xml --entity-set Products "Name eq 'x'"
//! odata-filter --csdl model.xml schema --entity-type Product --mapping
//! odata-filter --config filter.yaml check
//! ```

#![allow(clippy::print_stdout, clippy::print_stderr)]

mod commands;
mod config;
mod logging;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::config::{AppConfig, CliOverrides};
use crate::logging::LogFormat;

#[derive(Parser)]
#[command(name = "odata-filter")]
#[command(version, about = "Compile OData $filter expressions to parameterized SQL")]
struct Cli {
    /// YAML configuration (filter options, function catalog, property map)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// CSDL document describing the entity model
    #[arg(long, global = true)]
    csdl: Option<PathBuf>,

    /// Prefix for bound parameter names (overrides config)
    #[arg(long, global = true)]
    parameter_prefix: Option<char>,

    /// SRID of spatial literals in filters (overrides config)
    #[arg(long, global = true)]
    source_srid: Option<i32>,

    /// Print effective configuration (YAML) and exit
    #[arg(long)]
    print_config: bool,

    /// Log verbosity level (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[arg(long, value_enum, default_value_t = LogFormat::Text, global = true)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a filter and print SQL plus parameters as JSON
    Compile {
        /// Entity set the filter applies to
        #[arg(short, long)]
        entity_set: String,
        /// The filter, with or without a leading `$filter=`
        filter: String,
    },
    /// Validate configuration (and the CSDL document, if any) and exit
    Check,
    /// List the primitive property paths of an entity type
    Schema {
        #[arg(short = 't', long)]
        entity_type: String,
        /// Only list properties of this EDM type
        #[arg(long)]
        kind: Option<String>,
        /// Print a property map skeleton (YAML) instead of a listing
        #[arg(long)]
        mapping: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose, cli.log_format);

    let mut config = AppConfig::load(cli.config.as_deref())?;
    config.apply_cli_overrides(&CliOverrides {
        parameter_prefix: cli.parameter_prefix,
        source_srid: cli.source_srid,
        csdl: cli.csdl,
    });

    if cli.print_config {
        println!("{}", config.to_yaml()?);
        return Ok(());
    }

    match cli.command.unwrap_or(Commands::Check) {
        Commands::Compile { entity_set, filter } => {
            commands::compile(&config, &entity_set, &filter)
        }
        Commands::Check => commands::check(&config),
        Commands::Schema {
            entity_type,
            kind,
            mapping,
        } => commands::schema(&config, &entity_type, kind.as_deref(), mapping),
    }
}
