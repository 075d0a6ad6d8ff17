//! Homogenization of raw metadata values.
//!
//! The gatherer turns the raw strings selected for a canonical term into
//! [`HarmonizedValue`]s whose shape depends on the term's [`Category`].
//! Repositories differ in how they write values, so each category routine is
//! a default method on [`ValueGatherer`] that plugins may override.
//!
//! Dispatch never fails: a routine that errors, and the
//! [`Category::Other`] variant, both hand back the raw values unchanged
//! (with a warning).

use anyhow::Result;
use tracing::{debug, warn};

use crate::category::Category;
use crate::identifiers::between_brackets;
use crate::models::{HarmonizedValue, TemporalCoverage};

/// Category-specific extraction routines.
///
/// Each routine receives one raw value and returns the homogenized value,
/// `None` to drop it, or an error to abandon homogenization for the call.
pub trait ValueGatherer: Send + Sync {
    /// Profile name, used in logs and `--verbose` output.
    fn name(&self) -> &str {
        "custom"
    }

    fn metadata_identifier(&self, raw: &str) -> Result<Option<HarmonizedValue>> {
        Ok(Some(raw.into()))
    }

    fn data_identifier(&self, raw: &str) -> Result<Option<HarmonizedValue>> {
        Ok(Some(raw.into()))
    }

    /// Expects `start=<date>;end=<date>`; values lacking either marker are dropped.
    /// Bounds that are not dates are kept as written, with a warning.
    fn temporal_coverage(&self, raw: &str) -> Result<Option<HarmonizedValue>> {
        let Some(coverage) = parse_temporal_coverage(raw) else {
            return Ok(None);
        };
        if coverage.bounds().is_none() {
            warn!(
                "Temporal coverage '{}' does not describe a date range (start '{}', end '{}')",
                raw, coverage.start_date, coverage.end_date
            );
        }
        Ok(Some(HarmonizedValue::Temporal(coverage)))
    }

    /// Only GeoNames references are kept.
    fn spatial_coverage(&self, raw: &str) -> Result<Option<HarmonizedValue>> {
        Ok(raw.contains("geonames").then(|| raw.into()))
    }

    fn person_identifier(&self, raw: &str) -> Result<Option<HarmonizedValue>> {
        Ok(Some(raw.into()))
    }

    fn keywords(&self, raw: &str) -> Result<Option<HarmonizedValue>> {
        Ok(Some(raw.into()))
    }

    fn format(&self, raw: &str) -> Result<Option<HarmonizedValue>> {
        Ok(Some(raw.into()))
    }

    fn license(&self, raw: &str) -> Result<Option<HarmonizedValue>> {
        Ok(Some(raw.trim().into()))
    }

    fn resource_discovery(&self, raw: &str) -> Result<Option<HarmonizedValue>> {
        Ok(Some(raw.into()))
    }

    fn metadata_accessibility(&self, raw: &str) -> Result<Option<HarmonizedValue>> {
        Ok(Some(raw.into()))
    }

    fn metadata_connection(&self, raw: &str) -> Result<Option<HarmonizedValue>> {
        Ok(Some(raw.into()))
    }

    fn data_connection(&self, raw: &str) -> Result<Option<HarmonizedValue>> {
        self.data_identifier(raw)
    }
}

/// Generic profile: identifiers pass through, coverage values are parsed.
pub struct DefaultGatherer;

impl ValueGatherer for DefaultGatherer {
    fn name(&self) -> &str {
        "default"
    }
}

/// Profile for repositories that export values as `Label [identifier]`.
pub struct BracketedGatherer;

impl ValueGatherer for BracketedGatherer {
    fn name(&self) -> &str {
        "bracketed"
    }

    fn person_identifier(&self, raw: &str) -> Result<Option<HarmonizedValue>> {
        Ok(Some(between_brackets(raw).into()))
    }

    fn resource_discovery(&self, raw: &str) -> Result<Option<HarmonizedValue>> {
        Ok(Some(between_brackets(raw).into()))
    }

    fn metadata_connection(&self, raw: &str) -> Result<Option<HarmonizedValue>> {
        Ok(Some(between_brackets(raw).into()))
    }
}

/// Built-in gatherer for a `plugin.gatherer` profile name.
pub fn gatherer_for_profile(profile: &str) -> Box<dyn ValueGatherer> {
    match profile {
        "bracketed" => Box::new(BracketedGatherer),
        _ => Box::new(DefaultGatherer),
    }
}

/// Parse `start=<a>; end=<b>` into a [`TemporalCoverage`].
///
/// The value is a `;`-separated list of `key=value` pairs; other keys are
/// ignored.
pub fn parse_temporal_coverage(raw: &str) -> Option<TemporalCoverage> {
    let field = |key: &str| {
        raw.split(';').find_map(|pair| {
            let (k, v) = pair.split_once('=')?;
            (k.trim() == key).then(|| v.trim())
        })
    };

    let start_date = field("start")?;
    let end_date = field("end")?;
    Some(TemporalCoverage {
        start_date: start_date.to_string(),
        end_date: end_date.to_string(),
    })
}

fn gather_one(
    gatherer: &dyn ValueGatherer,
    raw: &str,
    category: &Category,
) -> Result<Option<HarmonizedValue>> {
    match category {
        Category::MetadataIdentifier => gatherer.metadata_identifier(raw),
        Category::DataIdentifier => gatherer.data_identifier(raw),
        Category::TemporalCoverage => gatherer.temporal_coverage(raw),
        Category::SpatialCoverage => gatherer.spatial_coverage(raw),
        Category::PersonIdentifier => gatherer.person_identifier(raw),
        Category::Keywords => gatherer.keywords(raw),
        Category::Format => gatherer.format(raw),
        Category::License => gatherer.license(raw),
        Category::ResourceDiscovery => gatherer.resource_discovery(raw),
        Category::MetadataAccessibility => gatherer.metadata_accessibility(raw),
        Category::MetadataConnection => gatherer.metadata_connection(raw),
        Category::DataConnection => gatherer.data_connection(raw),
        Category::Other(_) => Ok(Some(raw.into())),
    }
}

fn passthrough(raw_values: &[String]) -> Vec<HarmonizedValue> {
    raw_values.iter().map(|v| v.as_str().into()).collect()
}

/// Homogenize `raw_values` for `category`.
///
/// Values the routine drops are omitted, so the result may be shorter than
/// the input (or empty). If any routine call fails, the raw values are
/// returned unchanged.
pub fn gather(
    gatherer: &dyn ValueGatherer,
    raw_values: &[String],
    category: &Category,
) -> Vec<HarmonizedValue> {
    if let Category::Other(term) = category {
        warn!(
            "No specific gather method defined for metadata element '{}'. Returning input values as a list: {:?}",
            term, raw_values
        );
        return passthrough(raw_values);
    }

    let mut values = Vec::with_capacity(raw_values.len());
    for raw in raw_values {
        match gather_one(gatherer, raw, category) {
            Ok(Some(value)) => values.push(value),
            Ok(None) => debug!("Dropping value '{}' for metadata element '{}'", raw, category),
            Err(e) => {
                warn!(
                    "Gather method '{}' failed for metadata element '{}' on value '{}': {}. Returning input values unchanged",
                    gatherer.name(),
                    category,
                    raw,
                    e
                );
                return passthrough(raw_values);
            }
        }
    }

    debug!(
        "Homogenized values for metadata element '{}' ({} gatherer): {:?}",
        category,
        gatherer.name(),
        values
    );
    values
}
