//! Command implementations behind the `fair` binary.
//!
//! Each `run_*` function loads what it needs from the parsed [`Config`],
//! does its work through the library and prints to stdout.

use anyhow::{Context, Result};
use std::path::Path;

use crate::config::Config;
use crate::evaluator::{Evaluator, Indicator};
use crate::gather::gatherer_for_profile;
use crate::harmonize::{Harmonizer, Resolution};
use crate::i18n::Localizer;
use crate::models::MetadataTable;
use crate::validate::Validator;
use crate::vocabulary::VocabularyRegistry;

fn load_metadata(path: &Path) -> Result<MetadataTable> {
    MetadataTable::load_json(path)
        .with_context(|| format!("Failed to load metadata from {}", path.display()))
}

fn load_localizer(config: &Config) -> Result<Localizer> {
    Localizer::from_config(&config.localization).with_context(|| "Failed to load message catalog")
}

/// Evaluate indicators over a metadata file; all indicators when none are named.
pub fn run_evaluate(config: &Config, metadata: &Path, indicators: &[String], json: bool) -> Result<()> {
    let selected: Vec<Indicator> = if indicators.is_empty() {
        Indicator::ALL.to_vec()
    } else {
        indicators
            .iter()
            .map(|id| id.parse::<Indicator>().map_err(anyhow::Error::msg))
            .collect::<Result<_>>()?
    };

    let table = load_metadata(metadata)?;
    let registry = VocabularyRegistry::from_config(config)?;
    let localizer = load_localizer(config)?;
    let gatherer = gatherer_for_profile(&config.plugin.gatherer);
    let validator = Validator::new(config, &registry);
    let evaluator =
        Evaluator::new(config, &table, gatherer.as_ref(), &localizer).with_validator(&validator);

    let report = evaluator.evaluate_all(&selected);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("{:<16} {:>7}  {:<8} MESSAGE", "INDICATOR", "POINTS", "STATUS");
    for (indicator, result) in selected.iter().zip(&report.indicators) {
        println!(
            "{:<16} {:>7.1}  {:<8} {}",
            indicator.report_name(),
            result.points,
            result.test_status.as_str(),
            result.message.to_text()
        );
    }
    println!();
    println!("Mean: {:.1} points over {} indicator(s)", report.points, selected.len());
    Ok(())
}

/// Resolve one term list and print the harmonized payload as JSON.
pub fn run_harmonize(config: &Config, metadata: &Path, term_id: &str, validate: bool) -> Result<()> {
    let table = load_metadata(metadata)?;
    let localizer = load_localizer(config)?;
    let gatherer = gatherer_for_profile(&config.plugin.gatherer);

    let registry = if validate {
        VocabularyRegistry::from_config(config)?
    } else {
        VocabularyRegistry::new()
    };
    let validator = Validator::new(config, &registry);
    let mut harmonizer = Harmonizer::new(config, &table, gatherer.as_ref(), &localizer);
    if validate {
        harmonizer = harmonizer.with_validator(&validator);
    }

    match harmonizer.resolve(term_id, validate)? {
        Resolution::Resolved(payload) => {
            println!("{}", serde_json::to_string_pretty(&payload)?);
        }
        Resolution::Unavailable { message } => {
            println!("{}", message);
        }
    }
    Ok(())
}

/// List configured vocabularies and the connector behind each.
pub fn list_vocabularies(config: &Config) -> Result<()> {
    let registry = VocabularyRegistry::from_config(config)?;

    println!("{:<24} {:<18} {:<8} REMOTE PATH", "VOCABULARY", "KIND", "REMOTE");
    for (id, connector) in registry.iter() {
        // Built-ins registered without a section run with default settings.
        let settings = config.vocabularies.get(id);
        let remote = settings.map_or(true, |s| s.enable_remote_check);
        let path = settings.map_or("(default)", |s| s.remote_path.as_str());
        println!("{:<24} {:<18} {:<8} {}", id, connector.kind(), remote, path);
    }
    if registry.is_empty() {
        println!("(no vocabularies configured)");
    }
    Ok(())
}

/// Ask a single vocabulary about a single term.
pub fn run_check(config: &Config, vocabulary_id: &str, term: &str) -> Result<()> {
    let registry = VocabularyRegistry::from_config(config)?;
    let connector = registry
        .get(vocabulary_id)
        .ok_or_else(|| anyhow::anyhow!("Vocabulary '{}' is not configured", vocabulary_id))?;

    let collected = connector
        .collect(term)
        .with_context(|| format!("Lookup in '{}' failed", vocabulary_id))?;
    println!(
        "{} ({}): '{}' {}",
        vocabulary_id,
        connector.kind(),
        term,
        if collected.is_match() { "found" } else { "not found" }
    );
    Ok(())
}
