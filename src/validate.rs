//! Validation of homogenized values against controlled vocabularies.
//!
//! The vocabularies that apply to a category come from
//! `[controlled_vocabularies."<Category>"]`; the connector for each
//! vocabulary id comes from the [`VocabularyRegistry`]. Every strategy
//! records each checked value in exactly one of `valid` / `non_valid`:
//! a lookup that fails counts the value as `non_valid`.
//!
//! | Category | Strategy |
//! |----------|----------|
//! | Format | media type list membership |
//! | License | SPDX connectors only |
//! | Person Identifier | registry connector, or the ORCID shape check |
//! | Data connection | persistent-identifier shape check (`"Data Connection"`) |
//! | everything else | any registered connector |

use std::collections::BTreeMap;
use tracing::{debug, error, warn};

use crate::category::Category;
use crate::config::Config;
use crate::identifiers::{check_orcid, validate_any_pid};
use crate::models::{HarmonizedValue, ValidationOutcome, ValidationResult};
use crate::vocabulary::{VocabularyConnector, VocabularyRegistry};

/// Result key of the data-connection shape check.
pub const DATA_CONNECTION_KEY: &str = "Data Connection";

pub struct Validator<'a> {
    config: &'a Config,
    registry: &'a VocabularyRegistry,
}

/// Text a connector is asked about for one value.
fn lookup_text(value: &HarmonizedValue) -> String {
    match value.as_text() {
        Some(text) => text.trim().to_string(),
        None => value.to_string(),
    }
}

/// Bare media type, without parameters (`text/csv; charset=utf-8` -> `text/csv`).
fn media_type(value: &str) -> &str {
    value.split(';').next().unwrap_or(value).trim()
}

impl<'a> Validator<'a> {
    pub fn new(config: &'a Config, registry: &'a VocabularyRegistry) -> Self {
        Self { config, registry }
    }

    /// Check `values` against every vocabulary configured for `category`.
    ///
    /// A category with no configured vocabularies yields an empty result.
    pub fn validate(&self, values: &[HarmonizedValue], category: &Category) -> ValidationResult {
        let Some(vocabularies) = self.config.vocabularies_for(category.term()) else {
            warn!("No matching vocabulary found for element <{}>", category);
            return ValidationResult::new();
        };
        debug!(
            "Found matching vocabulary/ies for element <{}>: {:?}",
            category,
            vocabularies.keys().collect::<Vec<_>>()
        );

        match category {
            Category::Format => self.validate_format(values, vocabularies),
            Category::License => self.validate_license(values, vocabularies),
            Category::PersonIdentifier => self.validate_person_identifier(values, vocabularies),
            Category::DataConnection => validate_data_connection(values),
            _ => self.validate_any_vocabulary(values, vocabularies),
        }
    }

    fn connector(&self, vocabulary_id: &str) -> Option<&dyn VocabularyConnector> {
        let connector = self.registry.get(vocabulary_id).map(|c| c.as_ref());
        if connector.is_none() {
            warn!(
                "Vocabulary '{}' has no registered connector; skipping",
                vocabulary_id
            );
        }
        connector
    }

    /// Ask `connector` about every value; lookup errors count as `non_valid`.
    fn check_each(
        vocabulary_id: &str,
        connector: &dyn VocabularyConnector,
        values: &[HarmonizedValue],
    ) -> ValidationOutcome {
        let mut outcome = ValidationOutcome::default();
        for value in values {
            let text = lookup_text(value);
            let valid = match connector.collect(&text) {
                Ok(collected) => collected.is_match(),
                Err(e) => {
                    error!(
                        "Could not check '{}' against vocabulary '{}': {}",
                        text, vocabulary_id, e
                    );
                    false
                }
            };
            outcome.record(value.clone(), valid);
        }
        outcome
    }

    fn validate_format(
        &self,
        values: &[HarmonizedValue],
        vocabularies: &BTreeMap<String, String>,
    ) -> ValidationResult {
        let mut result = ValidationResult::new();
        for vocabulary_id in vocabularies.keys() {
            let Some(connector) = self.connector(vocabulary_id) else {
                continue;
            };
            let outcome = result.entry(vocabulary_id.clone()).or_default();
            match connector.collect("") {
                Ok(collected) => {
                    for value in values {
                        let valid = collected.contains(media_type(&lookup_text(value)));
                        outcome.record(value.clone(), valid);
                    }
                }
                Err(e) => {
                    error!("Could not gather media types from '{}': {}", vocabulary_id, e);
                    for value in values {
                        outcome.record(value.clone(), false);
                    }
                }
            }
        }
        result
    }

    fn validate_license(
        &self,
        values: &[HarmonizedValue],
        vocabularies: &BTreeMap<String, String>,
    ) -> ValidationResult {
        let mut result = ValidationResult::new();
        for vocabulary_id in vocabularies.keys() {
            let Some(connector) = self.connector(vocabulary_id) else {
                continue;
            };
            if connector.kind() != "spdx" {
                warn!(
                    "License validation against '{}' ({}) is not supported",
                    vocabulary_id,
                    connector.kind()
                );
                continue;
            }
            debug!("Validating licenses according to SPDX vocabulary '{}'", vocabulary_id);
            result.insert(
                vocabulary_id.clone(),
                Self::check_each(vocabulary_id, connector, values),
            );
        }
        result
    }

    fn validate_person_identifier(
        &self,
        values: &[HarmonizedValue],
        vocabularies: &BTreeMap<String, String>,
    ) -> ValidationResult {
        let mut result = ValidationResult::new();
        for vocabulary_id in vocabularies.keys() {
            let outcome = match self.registry.get(vocabulary_id) {
                Some(connector) => Self::check_each(vocabulary_id, connector.as_ref(), values),
                None => {
                    debug!(
                        "No connector for '{}'; checking ORCID syntax only",
                        vocabulary_id
                    );
                    let mut outcome = ValidationOutcome::default();
                    for value in values {
                        outcome.record(value.clone(), check_orcid(&lookup_text(value)));
                    }
                    outcome
                }
            };
            result.insert(vocabulary_id.clone(), outcome);
        }
        result
    }

    fn validate_any_vocabulary(
        &self,
        values: &[HarmonizedValue],
        vocabularies: &BTreeMap<String, String>,
    ) -> ValidationResult {
        let mut result = ValidationResult::new();
        for vocabulary_id in vocabularies.keys() {
            if let Some(connector) = self.connector(vocabulary_id) {
                result.insert(
                    vocabulary_id.clone(),
                    Self::check_each(vocabulary_id, connector, values),
                );
            }
        }
        result
    }
}

fn validate_data_connection(values: &[HarmonizedValue]) -> ValidationResult {
    let mut outcome = ValidationOutcome::default();
    for value in values {
        outcome.record(value.clone(), validate_any_pid(&lookup_text(value)));
    }
    ValidationResult::from([(DATA_CONNECTION_KEY.to_string(), outcome)])
}
