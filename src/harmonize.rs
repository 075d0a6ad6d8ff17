//! Term resolution, homogenization and scoring.
//!
//! The [`Harmonizer`] turns a configured term list (`identifier_term`,
//! `terms_cv`, ...) into a [`HarmonizedPayload`]:
//!
//! ```text
//! term list ──► TermMap fields ──► metadata rows ──► gather ──► (validate)
//!                                                         │
//!                          payload {term: values/validation, points} ◄──┘
//! ```
//!
//! Missing configuration and missing metadata are not errors: they resolve
//! to [`Resolution::Unavailable`], which indicators report as zero points.
//! The only error is [`Error::Homogenization`], raised when the gatherer
//! turns non-empty input into nothing.

use tracing::{debug, info, warn};

use crate::category::Category;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::gather::{gather, ValueGatherer};
use crate::i18n::Localizer;
use crate::models::{HarmonizedPayload, IndicatorResult, MetadataTable, ValidationResult};
use crate::validate::Validator;

/// Outcome of resolving one term list.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Resolved(HarmonizedPayload),
    /// Nothing to evaluate; `message` explains why.
    Unavailable { message: String },
}

impl Resolution {
    /// The payload, or the zero-point result an indicator returns instead.
    pub fn into_payload(self) -> std::result::Result<HarmonizedPayload, IndicatorResult> {
        match self {
            Resolution::Resolved(payload) => Ok(payload),
            Resolution::Unavailable { message } => Err(IndicatorResult::single(0.0, message)),
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Resolution::Resolved(_))
    }
}

/// Fold a validation pass into the results of earlier passes for the same term.
///
/// Entries are keyed by vocabulary id; on collision the later pass replaces
/// the earlier entry as a whole.
pub fn merge_validation(existing: &mut ValidationResult, incoming: ValidationResult) {
    for (vocabulary_id, outcome) in incoming {
        if existing.insert(vocabulary_id.clone(), outcome).is_some() {
            debug!(
                "Validation results for vocabulary '{}' replaced by a later field",
                vocabulary_id
            );
        }
    }
}

/// Per-evaluation orchestrator over one metadata table.
pub struct Harmonizer<'a> {
    config: &'a Config,
    metadata: &'a MetadataTable,
    gatherer: &'a dyn ValueGatherer,
    validator: Option<&'a Validator<'a>>,
    localizer: &'a Localizer,
}

impl<'a> Harmonizer<'a> {
    pub fn new(
        config: &'a Config,
        metadata: &'a MetadataTable,
        gatherer: &'a dyn ValueGatherer,
        localizer: &'a Localizer,
    ) -> Self {
        Self {
            config,
            metadata,
            gatherer,
            validator: None,
            localizer,
        }
    }

    pub fn with_validator(mut self, validator: &'a Validator<'a>) -> Self {
        self.validator = Some(validator);
        self
    }

    fn not_defined(&self, term_id: &str) -> Resolution {
        let message = self.localizer.tr(
            "Metadata values are not defined in configuration for the term '{}'",
            &[&term_id],
        );
        warn!("{}", message);
        Resolution::Unavailable { message }
    }

    /// Resolve the canonical terms listed under `term_id`.
    ///
    /// Terms are visited in term-map order and, within a term, fields in
    /// declaration order. With `validate`, each pass is also checked against
    /// the configured vocabularies.
    pub fn resolve(&self, term_id: &str, validate: bool) -> Result<Resolution> {
        let Some(term_list) = self.config.plugin.term_list(term_id) else {
            return Ok(self.not_defined(term_id));
        };
        let mut requested: Vec<&str> = Vec::new();
        for term in term_list {
            if !requested.contains(&term.as_str()) {
                requested.push(term);
            }
        }

        let entries: Vec<_> = self
            .config
            .plugin
            .terms_map
            .entries()
            .iter()
            .filter(|entry| requested.contains(&entry.term.as_str()))
            .collect();
        if entries.is_empty() {
            return Ok(self.not_defined(term_id));
        }
        for term in &requested {
            if !entries.iter().any(|entry| entry.term == *term) {
                warn!("Term '{}' (from '{}') has no term map entry", term, term_id);
            }
        }

        let validator = match (validate, self.validator) {
            (true, None) => {
                warn!("Validation requested for '{}' but no validator is configured", term_id);
                None
            }
            (true, validator) => validator,
            (false, _) => None,
        };

        let mut payload = HarmonizedPayload::default();
        for entry in entries {
            let category = Category::from_term(&entry.term);
            for field in &entry.fields {
                let raw = self.metadata.values_for(field);
                if raw.is_empty() {
                    debug!("No rows for field '{}' of term '{}'", field, entry.term);
                    continue;
                }

                let values = gather(self.gatherer, &raw, &category);
                if values.is_empty() {
                    return Err(Error::Homogenization {
                        element: entry.term.clone(),
                    });
                }
                debug!(
                    "Field '{}' contributed {} value(s) to term '{}'",
                    field,
                    values.len(),
                    entry.term
                );

                let validation = validator.map(|v| v.validate(&values, &category));
                let slot = payload.entry_mut(&entry.term);
                slot.values.extend(values);
                if let Some(validation) = validation {
                    merge_validation(slot.validation.get_or_insert_with(Default::default), validation);
                }
            }
        }

        if payload.is_empty() {
            let message = self.localizer.tr(
                "No metadata can be found for: {}. Please double-check the value/s provided for '{}' configuration parameter",
                &[&requested.join(", "), &term_id],
            );
            warn!("{}", message);
            return Ok(Resolution::Unavailable { message });
        }

        let resolved = payload.terms().filter(|(_, p)| !p.is_empty()).count();
        payload.points = if resolved == requested.len() {
            100.0
        } else {
            100.0 * resolved as f64 / requested.len() as f64
        };
        info!(
            "Resolved {}/{} term(s) for '{}' ({} points)",
            resolved,
            requested.len(),
            term_id,
            payload.points
        );

        Ok(Resolution::Resolved(payload))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TermMap;
    use crate::gather::DefaultGatherer;
    use crate::models::{FieldRef, HarmonizedValue, MetadataRow, ValidationOutcome};

    fn config(term_list: &[&str], map: TermMap) -> Config {
        let mut config = Config::minimal();
        config.plugin.term_lists.insert(
            "terms".to_string(),
            term_list.iter().map(|t| t.to_string()).collect(),
        );
        config.plugin.terms_map = map;
        config
    }

    fn outcome(valid: &[&str], non_valid: &[&str]) -> ValidationOutcome {
        ValidationOutcome {
            valid: valid.iter().map(|v| (*v).into()).collect(),
            non_valid: non_valid.iter().map(|v| (*v).into()).collect(),
        }
    }

    #[test]
    fn merge_validation_later_pass_wins() {
        let mut existing = ValidationResult::from([
            ("orcid".to_string(), outcome(&["a"], &[])),
            ("ror".to_string(), outcome(&[], &["b"])),
        ]);
        merge_validation(
            &mut existing,
            ValidationResult::from([("orcid".to_string(), outcome(&[], &["c"]))]),
        );
        assert_eq!(existing["orcid"], outcome(&[], &["c"]));
        assert_eq!(existing["ror"], outcome(&[], &["b"]));
    }

    #[test]
    fn unknown_term_id_is_not_defined() {
        let config = config(&[], TermMap::new());
        let table = MetadataTable::default();
        let localizer = Localizer::default();
        let harmonizer = Harmonizer::new(&config, &table, &DefaultGatherer, &localizer);
        match harmonizer.resolve("identifier_term", false).unwrap() {
            Resolution::Unavailable { message } => {
                assert!(message.contains("not defined in configuration"))
            }
            other => panic!("unexpected resolution: {:?}", other),
        }
    }

    #[test]
    fn partial_resolution_scores_ratio() {
        let map = TermMap::new()
            .with("Keywords", vec![FieldRef::element("subject")])
            .with("Format", vec![FieldRef::element("format")]);
        let config = config(&["Keywords", "Format"], map);
        let table: MetadataTable = vec![MetadataRow::new("dc", "subject", None, "soil")]
            .into_iter()
            .collect();
        let localizer = Localizer::default();
        let harmonizer = Harmonizer::new(&config, &table, &DefaultGatherer, &localizer);

        let payload = harmonizer.resolve("terms", false).unwrap().into_payload().unwrap();
        assert_eq!(payload.points, 50.0);
        assert_eq!(payload.values("Keywords"), &[HarmonizedValue::from("soil")]);
        assert!(payload.get("Format").is_none());
    }

    #[test]
    fn values_follow_term_map_order() {
        let map = TermMap::new()
            .with("Format", vec![FieldRef::element("format")])
            .with("Keywords", vec![FieldRef::element("subject")]);
        let config = config(&["Keywords", "Format"], map);
        let table: MetadataTable = vec![
            MetadataRow::new("dc", "subject", None, "soil"),
            MetadataRow::new("dc", "format", None, "text/csv"),
        ]
        .into_iter()
        .collect();
        let localizer = Localizer::default();
        let harmonizer = Harmonizer::new(&config, &table, &DefaultGatherer, &localizer);

        let payload = harmonizer.resolve("terms", false).unwrap().into_payload().unwrap();
        let order: Vec<&str> = payload.terms().map(|(t, _)| t).collect();
        assert_eq!(order, vec!["Format", "Keywords"]);
        assert_eq!(payload.points, 100.0);
    }

    #[test]
    fn spatial_coverage_without_geonames_is_a_fault() {
        let map = TermMap::new().with("Spatial Coverage", vec![FieldRef::element("coverage")]);
        let config = config(&["Spatial Coverage"], map);
        let table: MetadataTable = vec![MetadataRow::new("dc", "coverage", None, "Spain")]
            .into_iter()
            .collect();
        let localizer = Localizer::default();
        let harmonizer = Harmonizer::new(&config, &table, &DefaultGatherer, &localizer);

        match harmonizer.resolve("terms", false) {
            Err(Error::Homogenization { element }) => assert_eq!(element, "Spatial Coverage"),
            other => panic!("expected homogenization fault, got {:?}", other),
        }
    }
}
