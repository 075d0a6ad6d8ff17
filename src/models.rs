//! Core data models used throughout the harmonization engine.
//!
//! These types represent the raw metadata rows handed over by a collector,
//! the homogenized values produced by the gatherer, the validation results
//! produced by the validator, and the payload and score an indicator consumes.

use chrono::{DateTime, NaiveDate};
use serde::ser::{SerializeMap, SerializeStruct};
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::io::Read;
use std::path::Path;

use crate::error::Result;

/// Collapse `Some("")` into `None`: an empty qualifier and a missing one are
/// the same thing in every metadata source we read.
fn normalize_qualifier(qualifier: Option<String>) -> Option<String> {
    qualifier.filter(|q| !q.trim().is_empty())
}

/// One raw metadata field produced by a collector.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct MetadataRow {
    #[serde(default)]
    pub schema: String,
    pub element: String,
    #[serde(default)]
    pub qualifier: Option<String>,
    /// Collectors built on tabular exports call this column `text_value`.
    #[serde(alias = "text_value")]
    pub value: String,
}

impl MetadataRow {
    pub fn new(schema: &str, element: &str, qualifier: Option<&str>, value: &str) -> Self {
        Self {
            schema: schema.to_string(),
            element: element.to_string(),
            qualifier: normalize_qualifier(qualifier.map(str::to_string)),
            value: value.to_string(),
        }
    }

    /// Qualifier with empty strings treated as absent.
    pub fn qualifier(&self) -> Option<&str> {
        self.qualifier.as_deref().filter(|q| !q.trim().is_empty())
    }

    /// Whether this row is selected by the given term-map field.
    ///
    /// The element must match; the qualifier must match exactly, or both the
    /// field's and the row's qualifier must be empty.
    pub fn matches(&self, field: &FieldRef) -> bool {
        self.element == field.element && self.qualifier() == field.qualifier()
    }
}

/// A concrete `(element, qualifier)` pair a canonical term maps onto.
///
/// Deserializes from either a bare element name (`"identifier"`) or a pair
/// (`["subject", "keyword"]`).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "FieldSpec")]
pub struct FieldRef {
    pub element: String,
    pub qualifier: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FieldSpec {
    Element(String),
    Pair(Vec<String>),
}

impl TryFrom<FieldSpec> for FieldRef {
    type Error = String;

    fn try_from(spec: FieldSpec) -> std::result::Result<Self, Self::Error> {
        match spec {
            FieldSpec::Element(element) => Ok(FieldRef::element(&element)),
            FieldSpec::Pair(parts) => match parts.as_slice() {
                [element] => Ok(FieldRef::element(element)),
                [element, qualifier] => Ok(FieldRef::qualified(element, qualifier)),
                _ => Err(format!(
                    "term map field must be \"element\" or [\"element\", \"qualifier\"], got {:?}",
                    parts
                )),
            },
        }
    }
}

impl FieldRef {
    /// A field matched on element alone (rows must carry no qualifier).
    pub fn element(element: &str) -> Self {
        Self {
            element: element.to_string(),
            qualifier: None,
        }
    }

    pub fn qualified(element: &str, qualifier: &str) -> Self {
        Self {
            element: element.to_string(),
            qualifier: normalize_qualifier(Some(qualifier.to_string())),
        }
    }

    pub fn qualifier(&self) -> Option<&str> {
        self.qualifier.as_deref()
    }
}

impl fmt::Display for FieldRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.qualifier {
            Some(q) => write!(f, "{}.{}", self.element, q),
            None => write!(f, "{}", self.element),
        }
    }
}

/// The full set of metadata rows for one evaluated item.
///
/// Built once per item and read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct MetadataTable {
    rows: Vec<MetadataRow>,
}

impl MetadataTable {
    pub fn new(rows: Vec<MetadataRow>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[MetadataRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Raw values of every row selected by `field`, in table order.
    pub fn values_for(&self, field: &FieldRef) -> Vec<String> {
        self.rows
            .iter()
            .filter(|row| row.matches(field))
            .map(|row| row.value.clone())
            .collect()
    }

    /// Whether at least one row is selected by `field`.
    pub fn has_field(&self, field: &FieldRef) -> bool {
        self.rows.iter().any(|row| row.matches(field))
    }

    /// Parse a JSON array of `{schema, element, qualifier, value}` objects.
    pub fn from_json_reader<R: Read>(reader: R) -> Result<Self> {
        let rows: Vec<MetadataRow> = serde_json::from_reader(reader)?;
        Ok(Self::new(
            rows.into_iter()
                .map(|mut row| {
                    row.qualifier = normalize_qualifier(row.qualifier.take());
                    row
                })
                .collect(),
        ))
    }

    pub fn load_json(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        Self::from_json_reader(std::io::BufReader::new(file))
    }
}

impl FromIterator<MetadataRow> for MetadataTable {
    fn from_iter<I: IntoIterator<Item = MetadataRow>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Start and end of the period a dataset covers, as written in the metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TemporalCoverage {
    pub start_date: String,
    pub end_date: String,
}

impl TemporalCoverage {
    pub fn start(&self) -> Option<NaiveDate> {
        parse_date(&self.start_date)
    }

    pub fn end(&self) -> Option<NaiveDate> {
        parse_date(&self.end_date)
    }

    /// Both bounds as dates, when they parse and are in order.
    pub fn bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
        let (start, end) = (self.start()?, self.end()?);
        (start <= end).then_some((start, end))
    }
}

/// Accepts RFC 3339 timestamps, plain `YYYY-MM-DD` dates and bare years.
fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.date_naive());
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }
    raw.parse::<i32>()
        .ok()
        .and_then(|year| NaiveDate::from_ymd_opt(year, 1, 1))
}

/// A homogenized metadata value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum HarmonizedValue {
    Text(String),
    Temporal(TemporalCoverage),
}

impl HarmonizedValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            HarmonizedValue::Text(s) => Some(s),
            HarmonizedValue::Temporal(_) => None,
        }
    }
}

impl fmt::Display for HarmonizedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HarmonizedValue::Text(s) => write!(f, "{}", s),
            HarmonizedValue::Temporal(t) => write!(f, "start={};end={}", t.start_date, t.end_date),
        }
    }
}

impl From<&str> for HarmonizedValue {
    fn from(value: &str) -> Self {
        HarmonizedValue::Text(value.to_string())
    }
}

impl From<String> for HarmonizedValue {
    fn from(value: String) -> Self {
        HarmonizedValue::Text(value)
    }
}

impl PartialEq<&str> for HarmonizedValue {
    fn eq(&self, other: &&str) -> bool {
        self.as_text() == Some(*other)
    }
}

/// Outcome of checking a list of values against one vocabulary.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidationOutcome {
    pub valid: Vec<HarmonizedValue>,
    pub non_valid: Vec<HarmonizedValue>,
}

impl ValidationOutcome {
    pub fn record(&mut self, value: HarmonizedValue, is_valid: bool) {
        if is_valid {
            self.valid.push(value);
        } else {
            self.non_valid.push(value);
        }
    }

    pub fn has_valid(&self) -> bool {
        !self.valid.is_empty()
    }

    pub fn checked(&self) -> usize {
        self.valid.len() + self.non_valid.len()
    }
}

/// Validation outcomes keyed by vocabulary id.
pub type ValidationResult = BTreeMap<String, ValidationOutcome>;

/// Everything the harmonizer collected for one canonical term.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TermPayload {
    pub values: Vec<HarmonizedValue>,
    /// Present only when the harmonizer ran with validation enabled.
    pub validation: Option<ValidationResult>,
}

impl TermPayload {
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Vocabulary ids with at least one valid value.
    pub fn vocabularies_in_use(&self) -> Vec<&str> {
        self.validation
            .iter()
            .flat_map(|v| v.iter())
            .filter(|(_, outcome)| outcome.has_valid())
            .map(|(id, _)| id.as_str())
            .collect()
    }
}

impl Serialize for TermPayload {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match &self.validation {
            None => self.values.serialize(serializer),
            Some(validation) => {
                let mut st = serializer.serialize_struct("TermPayload", 2)?;
                st.serialize_field("values", &self.values)?;
                st.serialize_field("validation", validation)?;
                st.end()
            }
        }
    }
}

/// Harmonized terms in term-map order plus the coverage score.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HarmonizedPayload {
    terms: Vec<(String, TermPayload)>,
    pub points: f64,
}

impl HarmonizedPayload {
    pub fn get(&self, term: &str) -> Option<&TermPayload> {
        self.terms.iter().find(|(t, _)| t == term).map(|(_, p)| p)
    }

    /// Values of `term`, or an empty slice when the term was not harmonized.
    pub fn values(&self, term: &str) -> &[HarmonizedValue] {
        self.get(term).map(|p| p.values.as_slice()).unwrap_or(&[])
    }

    pub fn terms(&self) -> impl Iterator<Item = (&str, &TermPayload)> {
        self.terms.iter().map(|(t, p)| (t.as_str(), p))
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Payload slot for `term`, inserted at the end when missing.
    pub(crate) fn entry_mut(&mut self, term: &str) -> &mut TermPayload {
        let idx = match self.terms.iter().position(|(t, _)| t == term) {
            Some(idx) => idx,
            None => {
                self.terms.push((term.to_string(), TermPayload::default()));
                self.terms.len() - 1
            }
        };
        &mut self.terms[idx].1
    }
}

impl Serialize for HarmonizedPayload {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.terms.len() + 1))?;
        for (term, payload) in &self.terms {
            map.serialize_entry(term, payload)?;
        }
        map.serialize_entry("points", &self.points)?;
        map.end()
    }
}

/// One line of an indicator's itemized message.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MessageItem {
    pub message: String,
    pub points: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Message {
    Text(String),
    Items(Vec<MessageItem>),
}

impl Message {
    /// Flatten to a single line, joining itemized messages with `" | "`.
    pub fn to_text(&self) -> String {
        match self {
            Message::Text(s) => s.clone(),
            Message::Items(items) => items
                .iter()
                .map(|i| i.message.as_str())
                .collect::<Vec<_>>()
                .join(" | "),
        }
    }
}

/// Score and explanation returned by every indicator.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorResult {
    pub points: f64,
    pub message: Message,
}

impl IndicatorResult {
    pub fn text(points: f64, message: impl Into<String>) -> Self {
        Self {
            points,
            message: Message::Text(message.into()),
        }
    }

    /// A one-item list carrying the same points as the result.
    pub fn single(points: f64, message: impl Into<String>) -> Self {
        Self::items(
            points,
            vec![MessageItem {
                message: message.into(),
                points,
            }],
        )
    }

    pub fn items(points: f64, items: Vec<MessageItem>) -> Self {
        Self {
            points,
            message: Message::Items(items),
        }
    }
}
