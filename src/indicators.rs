//! RDA FAIR maturity indicators.
//!
//! Every indicator is a pure function of a harmonized payload (plus, for a
//! few, the metadata table and term map it came from). None of them does
//! I/O: validation has already happened in the harmonizer.
//!
//! | Indicator | Principle | Scorer |
//! |-----------|-----------|--------|
//! | `rda_f1_01m` / `rda_f1_01d` | F1 persistent identifier | [`eval_persistency`] |
//! | `rda_f1_02m` / `rda_f1_02d` | F1 globally unique identifier | [`eval_uniqueness`] |
//! | `rda_f2_01m` | F2 rich metadata | field presence ratio |
//! | `rda_f3_01m` | F3 data identifier in metadata | presence |
//! | `rda_f4_01m` | F4 metadata can be indexed | table non-empty |
//! | `rda_a1_01m` / `rda_a1_02d` | A1 access information | presence |
//! | `rda_i1_01m` | I1 knowledge representation | [`eval_validated_basic`] |
//! | `rda_i3_01m` / `rda_i3_02m` / `rda_i3_02d` / `rda_i3_03m` | I3 qualified references | [`eval_qualified_references`] |
//! | `rda_r1_01m` | R1 plurality of attributes | coverage score |
//! | `rda_r1_1_01m` / `rda_r1_1_02m` / `rda_r1_1_03m` | R1.1 usage license | presence / SPDX validation / machine readability |
//! | `rda_r1_3_01d` | R1.3 community standards | [`eval_validated_basic`] |

use tracing::{debug, info};

use crate::category::Category;
use crate::config::Config;
use crate::i18n::Localizer;
use crate::identifiers::{is_persistent_id, is_unique_id};
use crate::models::{HarmonizedPayload, HarmonizedValue, IndicatorResult, MessageItem, MetadataTable};

/// What an indicator may read besides its payload.
pub struct IndicatorContext<'a> {
    pub config: &'a Config,
    pub metadata: &'a MetadataTable,
    pub localizer: &'a Localizer,
}

fn join_values(values: &[HarmonizedValue]) -> String {
    values
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

fn points_per_id(count: usize) -> f64 {
    (100.0 / count as f64).round()
}

// ─── Shared scorers ────────────────────────────────────────────────────

/// 100 points as soon as one identifier is persistent; each identifier's
/// item carries `round(100 / n)` when it passes.
pub fn eval_persistency(ids: &[HarmonizedValue], subject: &str, loc: &Localizer) -> IndicatorResult {
    if ids.is_empty() {
        return IndicatorResult::single(
            0.0,
            loc.tr("No identifiers found for the {}", &[&subject]),
        );
    }
    let share = points_per_id(ids.len());
    let mut points = 0.0;
    let items = ids
        .iter()
        .map(|id| {
            if is_persistent_id(&id.to_string()) {
                points = 100.0;
                MessageItem {
                    message: loc.tr("Found persistent identifier for the {}: {}", &[&subject, id]),
                    points: share,
                }
            } else {
                MessageItem {
                    message: loc.tr("Identifier is not persistent for the {}: {}", &[&subject, id]),
                    points: 0.0,
                }
            }
        })
        .collect();
    IndicatorResult::items(points, items)
}

/// Same policy as [`eval_persistency`], over global uniqueness.
pub fn eval_uniqueness(ids: &[HarmonizedValue], subject: &str, loc: &Localizer) -> IndicatorResult {
    if ids.is_empty() {
        return IndicatorResult::single(
            0.0,
            loc.tr("No identifiers found for the {}", &[&subject]),
        );
    }
    let share = points_per_id(ids.len());
    let mut points = 0.0;
    let items = ids
        .iter()
        .map(|id| {
            if is_unique_id(&id.to_string()) {
                points = 100.0;
                MessageItem {
                    message: loc.tr("Found a globally unique identifier for the {}: {}", &[&subject, id]),
                    points: share,
                }
            } else {
                MessageItem {
                    message: loc.tr(
                        "Identifier found for the {} is not globally unique: {}",
                        &[&subject, id],
                    ),
                    points: 0.0,
                }
            }
        })
        .collect();
    IndicatorResult::items(points, items)
}

/// Share of harmonized terms with at least one value valid in some vocabulary.
pub fn eval_validated_basic(payload: &HarmonizedPayload, loc: &Localizer) -> IndicatorResult {
    let mut using = Vec::new();
    for (term, data) in payload.terms() {
        let vocabularies = data.vocabularies_in_use();
        if vocabularies.is_empty() {
            debug!(
                "Could not find standard vocabulary/ies in the values of metadata element '{}'",
                term
            );
        } else {
            info!(
                "Found standard vocabulary/ies in the values of metadata element '{}': {:?}",
                term, vocabularies
            );
            using.push(term);
        }
    }

    let total = payload.len();
    let points = if total == 0 {
        0.0
    } else {
        using.len() as f64 / total as f64 * 100.0
    };
    let all: Vec<&str> = payload.terms().map(|(t, _)| t).collect();
    let message = loc.tr(
        "Found {} ({}) out of {} ({}) metadata elements using standard vocabularies",
        &[&using.len(), &using.join(", "), &total, &all.join(", ")],
    );
    IndicatorResult::single(points, message)
}

/// 100 points when any term has a value valid in some vocabulary.
///
/// `target` names what the references point to (`"metadata"` or `"data"`).
pub fn eval_qualified_references(
    payload: &HarmonizedPayload,
    target: &str,
    loc: &Localizer,
) -> IndicatorResult {
    let mut references = Vec::new();
    for (term, data) in payload.terms() {
        for (vocabulary, outcome) in data.validation.iter().flatten() {
            if outcome.has_valid() {
                references.push(loc.tr(
                    "'{}' element uses vocabulary {} in '{}'",
                    &[&term, vocabulary, &join_values(&outcome.valid)],
                ));
            }
        }
    }

    if references.is_empty() {
        IndicatorResult::single(
            0.0,
            loc.tr("Metadata does not have qualified references to other {}", &[&target]),
        )
    } else {
        IndicatorResult::single(
            100.0,
            loc.tr(
                "Metadata has qualified references to other {}: {}",
                &[&target, &references.join(", ")],
            ),
        )
    }
}

// ─── Findable ──────────────────────────────────────────────────────────

pub fn rda_f1_01m(payload: &HarmonizedPayload, ctx: &IndicatorContext) -> IndicatorResult {
    eval_persistency(
        payload.values(Category::MetadataIdentifier.term()),
        "metadata",
        ctx.localizer,
    )
}

pub fn rda_f1_01d(payload: &HarmonizedPayload, ctx: &IndicatorContext) -> IndicatorResult {
    eval_persistency(
        payload.values(Category::DataIdentifier.term()),
        "data",
        ctx.localizer,
    )
}

pub fn rda_f1_02m(payload: &HarmonizedPayload, ctx: &IndicatorContext) -> IndicatorResult {
    eval_uniqueness(
        payload.values(Category::MetadataIdentifier.term()),
        "metadata",
        ctx.localizer,
    )
}

pub fn rda_f1_02d(payload: &HarmonizedPayload, ctx: &IndicatorContext) -> IndicatorResult {
    eval_uniqueness(
        payload.values(Category::DataIdentifier.term()),
        "data",
        ctx.localizer,
    )
}

/// Ratio of configured discovery fields (not terms) present in the table.
pub fn rda_f2_01m(_payload: &HarmonizedPayload, ctx: &IndicatorContext) -> IndicatorResult {
    let terms = ctx.config.plugin.term_list("terms_quali_generic").unwrap_or(&[]);
    let fields: Vec<_> = terms
        .iter()
        .filter_map(|term| ctx.config.plugin.terms_map.get(term))
        .flatten()
        .collect();

    if fields.is_empty() {
        return IndicatorResult::single(
            0.0,
            ctx.localizer.tr(
                "Terms/elements for '{}' are not defined in configuration",
                &[&Category::ResourceDiscovery.term()],
            ),
        );
    }

    let found = fields
        .iter()
        .filter(|field| ctx.metadata.has_field(field))
        .count();
    debug!("Found {}/{} metadata terms", found, fields.len());
    let points = (found as f64 * 100.0 / fields.len() as f64).round();
    IndicatorResult::single(
        points,
        ctx.localizer.tr(
            "Found {} (out of {}) metadata elements matching '{}' elements",
            &[&found, &fields.len(), &Category::ResourceDiscovery.term()],
        ),
    )
}

pub fn rda_f3_01m(payload: &HarmonizedPayload, ctx: &IndicatorContext) -> IndicatorResult {
    let ids = payload.values(Category::DataIdentifier.term());
    if ids.is_empty() {
        return IndicatorResult::single(
            0.0,
            ctx.localizer.tr("Metadata does not include identifiers for the data", &[]),
        );
    }
    IndicatorResult::single(
        100.0,
        ctx.localizer.tr(
            "Metadata includes identifier/s for the data: {}",
            &[&join_values(ids)],
        ),
    )
}

/// Needs no term list: the metadata could be gathered or it could not.
pub fn rda_f4_01m(metadata: &MetadataTable, loc: &Localizer) -> IndicatorResult {
    if metadata.is_empty() {
        IndicatorResult::single(
            0.0,
            loc.tr(
                "No metadata could be gathered for the digital object. Please, contact the repository admins",
                &[],
            ),
        )
    } else {
        IndicatorResult::single(
            100.0,
            loc.tr(
                "Metadata for the digital object is available for harvesting ({} elements)",
                &[&metadata.len()],
            ),
        )
    }
}

// ─── Accessible ────────────────────────────────────────────────────────

fn no_access_information(ctx: &IndicatorContext) -> IndicatorResult {
    IndicatorResult::single(
        0.0,
        ctx.localizer.tr(
            "No access information can be found in the metadata. Please, add information to the following term(s): {}",
            &[&Category::MetadataAccessibility.term()],
        ),
    )
}

pub fn rda_a1_01m(payload: &HarmonizedPayload, ctx: &IndicatorContext) -> IndicatorResult {
    let values = payload.values(Category::MetadataAccessibility.term());
    if values.is_empty() {
        return no_access_information(ctx);
    }
    let items = values
        .iter()
        .map(|value| MessageItem {
            message: ctx.localizer.tr("Metadata found for access: {}", &[value]),
            points: 100.0,
        })
        .collect();
    IndicatorResult::items(100.0, items)
}

pub fn rda_a1_02d(payload: &HarmonizedPayload, ctx: &IndicatorContext) -> IndicatorResult {
    let values = payload.values(Category::MetadataAccessibility.term());
    if values.is_empty() {
        return no_access_information(ctx);
    }
    IndicatorResult::single(
        100.0,
        ctx.localizer.tr(
            "Metadata includes data access information: {}",
            &[&join_values(values)],
        ),
    )
}

// ─── Interoperable ─────────────────────────────────────────────────────

pub fn rda_i1_01m(payload: &HarmonizedPayload, ctx: &IndicatorContext) -> IndicatorResult {
    eval_validated_basic(payload, ctx.localizer)
}

pub fn rda_i3_01m(payload: &HarmonizedPayload, ctx: &IndicatorContext) -> IndicatorResult {
    eval_qualified_references(payload, "metadata", ctx.localizer)
}

pub fn rda_i3_02m(payload: &HarmonizedPayload, ctx: &IndicatorContext) -> IndicatorResult {
    eval_qualified_references(payload, "data", ctx.localizer)
}

pub fn rda_i3_02d(payload: &HarmonizedPayload, ctx: &IndicatorContext) -> IndicatorResult {
    eval_qualified_references(payload, "data", ctx.localizer)
}

pub fn rda_i3_03m(payload: &HarmonizedPayload, ctx: &IndicatorContext) -> IndicatorResult {
    eval_qualified_references(payload, "metadata", ctx.localizer)
}

// ─── Reusable ──────────────────────────────────────────────────────────

pub fn rda_r1_01m(payload: &HarmonizedPayload, ctx: &IndicatorContext) -> IndicatorResult {
    let present: Vec<&str> = payload
        .terms()
        .filter(|(_, data)| !data.is_empty())
        .map(|(term, _)| term)
        .collect();
    let message = if present.is_empty() {
        ctx.localizer
            .tr("Could not find any metadata element that enhances reusability", &[])
    } else {
        ctx.localizer.tr(
            "Found {} metadata elements that enhance reusability: {}",
            &[&present.len(), &present.join(", ")],
        )
    };
    IndicatorResult::single(payload.points, message)
}

pub fn rda_r1_1_01m(payload: &HarmonizedPayload, ctx: &IndicatorContext) -> IndicatorResult {
    let licenses = payload.values(Category::License.term());
    match licenses {
        [] => IndicatorResult::single(
            0.0,
            ctx.localizer.tr("No license information found in the metadata", &[]),
        ),
        [license] => IndicatorResult::single(
            100.0,
            ctx.localizer.tr("The license is: {}", &[license]),
        ),
        _ => IndicatorResult::single(
            100.0,
            ctx.localizer.tr("The licenses are: {}", &[&join_values(licenses)]),
        ),
    }
}

/// Distinct license values valid in any vocabulary, and the number of
/// license values found.
fn standard_licenses(payload: &HarmonizedPayload) -> (Vec<HarmonizedValue>, usize) {
    let term = Category::License.term();
    let mut standard: Vec<HarmonizedValue> = Vec::new();
    if let Some(validation) = payload.get(term).and_then(|p| p.validation.as_ref()) {
        for outcome in validation.values() {
            for value in &outcome.valid {
                if !standard.contains(value) {
                    standard.push(value.clone());
                }
            }
        }
    }
    (standard, payload.values(term).len())
}

/// Licenses valid in at least one configured license vocabulary.
pub fn rda_r1_1_02m(payload: &HarmonizedPayload, ctx: &IndicatorContext) -> IndicatorResult {
    let (standard, total) = standard_licenses(payload);

    let (points, message) = if standard.is_empty() {
        (
            0.0,
            ctx.localizer.tr(
                "None of the license/s defined are standard according to SPDX license list",
                &[],
            ),
        )
    } else if standard.len() < total {
        (
            100.0,
            ctx.localizer.tr(
                "A subset of the license/s in use ({} out of {}) are standard according to SPDX license list: {}",
                &[&standard.len(), &total, &join_values(&standard)],
            ),
        )
    } else {
        (
            100.0,
            ctx.localizer.tr(
                "License/s in use are considered as standard according to SPDX license list: {}",
                &[&join_values(&standard)],
            ),
        )
    };
    let message = format!("{} {}", message, ctx.localizer.tr("(points: {})", &[&points]));
    info!("{}", message);
    IndicatorResult::single(points, message)
}

/// Same points as [`rda_r1_1_02m`], worded as machine readability.
pub fn rda_r1_1_03m(payload: &HarmonizedPayload, ctx: &IndicatorContext) -> IndicatorResult {
    let (standard, total) = standard_licenses(payload);
    let points = rda_r1_1_02m(payload, ctx).points;
    let message = if standard.is_empty() {
        ctx.localizer
            .tr("License/s are not machine readable according to SPDX", &[])
    } else if standard.len() < total {
        ctx.localizer
            .tr("A subset of the license/s are machine readable according to SPDX", &[])
    } else {
        ctx.localizer
            .tr("License/s are machine readable according to SPDX", &[])
    };
    info!("{}", message);
    IndicatorResult::single(points, message)
}

pub fn rda_r1_3_01d(payload: &HarmonizedPayload, ctx: &IndicatorContext) -> IndicatorResult {
    eval_validated_basic(payload, ctx.localizer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TermMap;
    use crate::models::{FieldRef, Message, MetadataRow, ValidationOutcome, ValidationResult};

    fn ids(raw: &[&str]) -> Vec<HarmonizedValue> {
        raw.iter().map(|v| HarmonizedValue::from(*v)).collect()
    }

    fn item_points(result: &IndicatorResult) -> Vec<f64> {
        match &result.message {
            Message::Items(items) => items.iter().map(|i| i.points).collect(),
            Message::Text(_) => Vec::new(),
        }
    }

    #[test]
    fn persistency_any_pass_scores_full() {
        let loc = Localizer::default();
        let result = eval_persistency(
            &ids(&["10.1234/abc", "local-1", "https://example.org/x"]),
            "metadata",
            &loc,
        );
        assert_eq!(result.points, 100.0);
        assert_eq!(item_points(&result), vec![33.0, 0.0, 0.0]);
    }

    #[test]
    fn persistency_none_pass() {
        let loc = Localizer::default();
        let result = eval_persistency(&ids(&["local-1"]), "data", &loc);
        assert_eq!(result.points, 0.0);
        assert!(result.message.to_text().contains("not persistent for the data"));
    }

    #[test]
    fn uniqueness_accepts_urls() {
        let loc = Localizer::default();
        let result = eval_uniqueness(&ids(&["https://example.org/x", "local-1"]), "metadata", &loc);
        assert_eq!(result.points, 100.0);
        assert_eq!(item_points(&result), vec![50.0, 0.0]);
    }

    fn validated_payload() -> HarmonizedPayload {
        let mut payload = HarmonizedPayload::default();
        let keywords = payload.entry_mut("Keywords");
        keywords.values = ids(&["soil"]);
        keywords.validation = Some(ValidationResult::from([(
            "agrovoc".to_string(),
            ValidationOutcome {
                valid: ids(&["soil"]),
                non_valid: vec![],
            },
        )]));
        let format = payload.entry_mut("Format");
        format.values = ids(&["CSV"]);
        format.validation = Some(ValidationResult::from([(
            "iana_media_types".to_string(),
            ValidationOutcome {
                valid: vec![],
                non_valid: ids(&["CSV"]),
            },
        )]));
        payload.points = 100.0;
        payload
    }

    #[test]
    fn validated_basic_ratio() {
        let result = eval_validated_basic(&validated_payload(), &Localizer::default());
        assert_eq!(result.points, 50.0);
        assert!(result
            .message
            .to_text()
            .starts_with("Found 1 (Keywords) out of 2 (Keywords, Format)"));
    }

    #[test]
    fn qualified_references() {
        let loc = Localizer::default();
        let result = eval_qualified_references(&validated_payload(), "data", &loc);
        assert_eq!(result.points, 100.0);
        assert!(result.message.to_text().contains("'Keywords' element uses vocabulary agrovoc"));

        let empty = eval_qualified_references(&HarmonizedPayload::default(), "data", &loc);
        assert_eq!(empty.points, 0.0);
    }

    #[test]
    fn f2_counts_fields() {
        let mut config = Config::minimal();
        config.plugin.term_lists.insert(
            "terms_quali_generic".into(),
            vec!["Keywords".into(), "Title".into()],
        );
        config.plugin.terms_map = TermMap::new()
            .with(
                "Keywords",
                vec![FieldRef::qualified("subject", "keyword"), FieldRef::element("subject")],
            )
            .with("Title", vec![FieldRef::element("title")]);
        let metadata: MetadataTable = vec![
            MetadataRow::new("dc", "subject", None, "soil"),
            MetadataRow::new("dc", "title", None, "Soil moisture"),
        ]
        .into_iter()
        .collect();
        let localizer = Localizer::default();
        let ctx = IndicatorContext {
            config: &config,
            metadata: &metadata,
            localizer: &localizer,
        };
        let result = rda_f2_01m(&HarmonizedPayload::default(), &ctx);
        assert_eq!(result.points, 67.0);
        assert!(result.message.to_text().starts_with("Found 2 (out of 3)"));
    }

    #[test]
    fn f4_depends_on_table() {
        let loc = Localizer::default();
        assert_eq!(rda_f4_01m(&MetadataTable::default(), &loc).points, 0.0);
        let table: MetadataTable = vec![MetadataRow::new("dc", "title", None, "x")].into_iter().collect();
        assert_eq!(rda_f4_01m(&table, &loc).points, 100.0);
    }

    #[test]
    fn license_standard_subset() {
        let config = Config::minimal();
        let metadata = MetadataTable::default();
        let localizer = Localizer::default();
        let ctx = IndicatorContext {
            config: &config,
            metadata: &metadata,
            localizer: &localizer,
        };

        let mut payload = HarmonizedPayload::default();
        let license = payload.entry_mut("License");
        license.values = ids(&["MIT", "All rights reserved"]);
        license.validation = Some(ValidationResult::from([(
            "spdx".to_string(),
            ValidationOutcome {
                valid: ids(&["MIT"]),
                non_valid: ids(&["All rights reserved"]),
            },
        )]));

        let result = rda_r1_1_02m(&payload, &ctx);
        assert_eq!(result.points, 100.0);
        let text = result.message.to_text();
        assert!(text.contains("1 out of 2"));
        assert!(text.ends_with("(points: 100)"));

        let present = rda_r1_1_01m(&payload, &ctx);
        assert_eq!(present.points, 100.0);
        assert!(present.message.to_text().starts_with("The licenses are: MIT"));

        let readable = rda_r1_1_03m(&payload, &ctx);
        assert_eq!(readable.points, 100.0);
        assert_eq!(item_points(&readable), vec![100.0]);
        assert!(readable
            .message
            .to_text()
            .contains("A subset of the license/s are machine readable"));
    }

    #[test]
    fn license_machine_readability() {
        let config = Config::minimal();
        let metadata = MetadataTable::default();
        let localizer = Localizer::default();
        let ctx = IndicatorContext {
            config: &config,
            metadata: &metadata,
            localizer: &localizer,
        };

        let mut payload = HarmonizedPayload::default();
        let license = payload.entry_mut("License");
        license.values = ids(&["CC-BY-4.0"]);
        license.validation = Some(ValidationResult::from([(
            "spdx".to_string(),
            ValidationOutcome {
                valid: ids(&["CC-BY-4.0"]),
                non_valid: vec![],
            },
        )]));
        let readable = rda_r1_1_03m(&payload, &ctx);
        assert_eq!(readable.points, 100.0);
        assert!(readable
            .message
            .to_text()
            .contains("License/s are machine readable according to SPDX"));

        let license = payload.entry_mut("License");
        license.validation = Some(ValidationResult::from([(
            "spdx".to_string(),
            ValidationOutcome {
                valid: vec![],
                non_valid: ids(&["CC-BY-4.0"]),
            },
        )]));
        let unreadable = rda_r1_1_03m(&payload, &ctx);
        assert_eq!(unreadable.points, 0.0);
        assert!(unreadable.message.to_text().contains("not machine readable"));
    }

    #[test]
    fn references_to_other_data() {
        let config = Config::minimal();
        let metadata = MetadataTable::default();
        let localizer = Localizer::default();
        let ctx = IndicatorContext {
            config: &config,
            metadata: &metadata,
            localizer: &localizer,
        };

        let result = rda_i3_02m(&validated_payload(), &ctx);
        assert_eq!(result.points, 100.0);
        assert!(result
            .message
            .to_text()
            .starts_with("Metadata has qualified references to other data"));

        let mut plain = HarmonizedPayload::default();
        plain.entry_mut("Relation").values = ids(&["https://example.org/other"]);
        assert_eq!(rda_i3_02m(&plain, &ctx).points, 0.0);
    }

    #[test]
    fn community_standards_share() {
        let config = Config::minimal();
        let metadata = MetadataTable::default();
        let localizer = Localizer::default();
        let ctx = IndicatorContext {
            config: &config,
            metadata: &metadata,
            localizer: &localizer,
        };

        let result = rda_r1_3_01d(&validated_payload(), &ctx);
        assert_eq!(result.points, 50.0);
        assert!(result.message.to_text().contains("using standard vocabularies"));
    }
}
