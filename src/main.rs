//! # FAIR Harness CLI (`fair`)
//!
//! The `fair` binary evaluates the FAIRness of a digital object's metadata
//! against the RDA maturity indicators, using the term map and vocabularies
//! of one plugin configuration.
//!
//! ## Usage
//!
//! ```bash
//! fair --config ./config/fair.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `fair evaluate --metadata <json>` | Run all (or selected) indicators |
//! | `fair harmonize --metadata <json> <term_id>` | Print one harmonized payload |
//! | `fair vocabularies` | List configured vocabulary connectors |
//! | `fair check <vocabulary> <term>` | Look a single term up in one vocabulary |
//! | `fair completions <shell>` | Print shell completions |
//!
//! ## Examples
//!
//! ```bash
//! # Every indicator, as a table
//! fair evaluate --metadata ./record.json
//!
//! # Two indicators, as JSON
//! fair evaluate --metadata ./record.json -i rda_f1_01m -i rda_r1_1_02m --json
//!
//! # Harmonize the controlled-vocabulary terms with validation
//! fair harmonize --metadata ./record.json terms_cv --validate
//! ```

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use fair_harness::commands;
use fair_harness::config::{self, Config};

/// FAIR Harness: metadata harmonization and FAIR indicator evaluation.
///
/// All commands accept a `--config` flag pointing to a TOML plugin
/// configuration. See `config/fair.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "fair",
    about = "FAIR Harness: evaluate metadata against the RDA FAIR maturity indicators",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/fair.toml")]
    config: PathBuf,

    /// Log at debug level (overridden by `RUST_LOG`).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate FAIR indicators over a metadata record.
    ///
    /// The record is a JSON array of `{schema, element, qualifier, value}`
    /// rows. Without `--indicator`, every indicator is run.
    Evaluate {
        /// Metadata record (JSON).
        #[arg(long)]
        metadata: PathBuf,

        /// Indicator id (`rda_f1_01m`, `F1_01M`, ...). Repeatable.
        #[arg(short, long = "indicator")]
        indicators: Vec<String>,

        /// Print the full report as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Resolve one configured term list and print the harmonized payload.
    Harmonize {
        /// Metadata record (JSON).
        #[arg(long)]
        metadata: PathBuf,

        /// Term list name (`identifier_term`, `terms_cv`, ...).
        term_id: String,

        /// Validate values against the configured vocabularies.
        #[arg(long)]
        validate: bool,
    },

    /// List configured vocabularies and their connector kinds.
    Vocabularies,

    /// Check whether a term exists in one configured vocabulary.
    Check {
        /// Vocabulary id as written in `[vocabularies.<id>]`.
        vocabulary: String,

        /// Term, URI or identifier to look up.
        term: String,
    },

    /// Print shell completions to stdout.
    Completions {
        shell: Shell,
    },
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "fair_harness=debug" } else { "fair_harness=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    // Commands that don't require config
    if let Commands::Completions { shell } = cli.command {
        clap_complete::generate(shell, &mut Cli::command(), "fair", &mut std::io::stdout());
        return Ok(());
    }

    let cfg: Config = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Evaluate {
            metadata,
            indicators,
            json,
        } => {
            commands::run_evaluate(&cfg, &metadata, &indicators, json)?;
        }
        Commands::Harmonize {
            metadata,
            term_id,
            validate,
        } => {
            commands::run_harmonize(&cfg, &metadata, &term_id, validate)?;
        }
        Commands::Vocabularies => {
            commands::list_vocabularies(&cfg)?;
        }
        Commands::Check { vocabulary, term } => {
            commands::run_check(&cfg, &vocabulary, &term)?;
        }
        Commands::Completions { .. } => {
            // Handled above (before config loading)
            unreachable!()
        }
    }

    Ok(())
}
