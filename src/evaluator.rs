//! Indicator dispatch and reporting.
//!
//! The [`Evaluator`] owns nothing: it borrows the configuration, the
//! metadata table and the collaborators built from them, and runs each
//! [`Indicator`] as *resolve term list → score*. A homogenization fault
//! never escapes; it becomes an `ERROR` report with zero points.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use tracing::{error, info};

use crate::config::Config;
use crate::error::Result;
use crate::gather::ValueGatherer;
use crate::harmonize::Harmonizer;
use crate::i18n::Localizer;
use crate::indicators::{self, IndicatorContext};
use crate::models::{HarmonizedPayload, IndicatorResult, Message, MetadataTable};
use crate::validate::Validator;

type Scorer = fn(&HarmonizedPayload, &IndicatorContext) -> IndicatorResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Indicator {
    F1_01M,
    F1_01D,
    F1_02M,
    F1_02D,
    F2_01M,
    F3_01M,
    F4_01M,
    A1_01M,
    A1_02D,
    I1_01M,
    I3_01M,
    I3_02M,
    I3_02D,
    I3_03M,
    R1_01M,
    R1_1_01M,
    R1_1_02M,
    R1_1_03M,
    R1_3_01D,
}

impl Indicator {
    pub const ALL: [Indicator; 19] = [
        Indicator::F1_01M,
        Indicator::F1_01D,
        Indicator::F1_02M,
        Indicator::F1_02D,
        Indicator::F2_01M,
        Indicator::F3_01M,
        Indicator::F4_01M,
        Indicator::A1_01M,
        Indicator::A1_02D,
        Indicator::I1_01M,
        Indicator::I3_01M,
        Indicator::I3_02M,
        Indicator::I3_02D,
        Indicator::I3_03M,
        Indicator::R1_01M,
        Indicator::R1_1_01M,
        Indicator::R1_1_02M,
        Indicator::R1_1_03M,
        Indicator::R1_3_01D,
    ];

    /// Lowercase id, e.g. `rda_f1_01m`.
    pub fn id(&self) -> &'static str {
        match self {
            Indicator::F1_01M => "rda_f1_01m",
            Indicator::F1_01D => "rda_f1_01d",
            Indicator::F1_02M => "rda_f1_02m",
            Indicator::F1_02D => "rda_f1_02d",
            Indicator::F2_01M => "rda_f2_01m",
            Indicator::F3_01M => "rda_f3_01m",
            Indicator::F4_01M => "rda_f4_01m",
            Indicator::A1_01M => "rda_a1_01m",
            Indicator::A1_02D => "rda_a1_02d",
            Indicator::I1_01M => "rda_i1_01m",
            Indicator::I3_01M => "rda_i3_01m",
            Indicator::I3_02M => "rda_i3_02m",
            Indicator::I3_02D => "rda_i3_02d",
            Indicator::I3_03M => "rda_i3_03m",
            Indicator::R1_01M => "rda_r1_01m",
            Indicator::R1_1_01M => "rda_r1_1_01m",
            Indicator::R1_1_02M => "rda_r1_1_02m",
            Indicator::R1_1_03M => "rda_r1_1_03m",
            Indicator::R1_3_01D => "rda_r1_3_01d",
        }
    }

    /// Configured term list the indicator resolves, if any.
    pub fn term_id(&self) -> Option<&'static str> {
        match self {
            Indicator::F1_01M | Indicator::F1_02M => Some("identifier_term"),
            Indicator::F1_01D | Indicator::F1_02D | Indicator::F3_01M => {
                Some("identifier_term_data")
            }
            Indicator::F2_01M => Some("terms_quali_generic"),
            Indicator::F4_01M => None,
            Indicator::A1_01M | Indicator::A1_02D => Some("terms_access"),
            Indicator::I1_01M => Some("terms_cv"),
            Indicator::I3_01M => Some("terms_qualified_references"),
            Indicator::I3_02M | Indicator::I3_02D | Indicator::I3_03M => Some("terms_relations"),
            Indicator::R1_01M | Indicator::R1_3_01D => Some("terms_reusability_richness"),
            Indicator::R1_1_01M | Indicator::R1_1_02M | Indicator::R1_1_03M => {
                Some("terms_license")
            }
        }
    }

    /// Whether the resolved values are checked against vocabularies.
    ///
    /// Every indicator scored from validation results needs it.
    pub fn validates(&self) -> bool {
        matches!(
            self,
            Indicator::I1_01M
                | Indicator::I3_01M
                | Indicator::I3_02M
                | Indicator::I3_02D
                | Indicator::I3_03M
                | Indicator::R1_1_02M
                | Indicator::R1_1_03M
                | Indicator::R1_3_01D
        )
    }

    fn scorer(&self) -> Scorer {
        match self {
            Indicator::F1_01M => indicators::rda_f1_01m,
            Indicator::F1_01D => indicators::rda_f1_01d,
            Indicator::F1_02M => indicators::rda_f1_02m,
            Indicator::F1_02D => indicators::rda_f1_02d,
            Indicator::F2_01M => indicators::rda_f2_01m,
            Indicator::F3_01M => indicators::rda_f3_01m,
            Indicator::F4_01M => score_f4,
            Indicator::A1_01M => indicators::rda_a1_01m,
            Indicator::A1_02D => indicators::rda_a1_02d,
            Indicator::I1_01M => indicators::rda_i1_01m,
            Indicator::I3_01M => indicators::rda_i3_01m,
            Indicator::I3_02M => indicators::rda_i3_02m,
            Indicator::I3_02D => indicators::rda_i3_02d,
            Indicator::I3_03M => indicators::rda_i3_03m,
            Indicator::R1_01M => indicators::rda_r1_01m,
            Indicator::R1_1_01M => indicators::rda_r1_1_01m,
            Indicator::R1_1_02M => indicators::rda_r1_1_02m,
            Indicator::R1_1_03M => indicators::rda_r1_1_03m,
            Indicator::R1_3_01D => indicators::rda_r1_3_01d,
        }
    }

    /// Report name, e.g. `RDA_F1_01M`.
    pub fn report_name(&self) -> String {
        self.id().to_ascii_uppercase()
    }
}

fn score_f4(_payload: &HarmonizedPayload, ctx: &IndicatorContext) -> IndicatorResult {
    indicators::rda_f4_01m(ctx.metadata, ctx.localizer)
}

impl fmt::Display for Indicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Indicator {
    type Err = String;

    /// Accepts `rda_f1_01m`, `RDA_F1_01M` or the bare `f1_01m`.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        let wanted = if lower.starts_with("rda_") {
            lower
        } else {
            format!("rda_{}", lower)
        };
        Indicator::ALL
            .into_iter()
            .find(|i| i.id() == wanted)
            .ok_or_else(|| format!("Unknown indicator '{}'", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TestStatus {
    Pass,
    Partial,
    Fail,
    Error,
}

impl TestStatus {
    pub fn from_points(points: f64) -> Self {
        if points >= 100.0 {
            TestStatus::Pass
        } else if points > 0.0 {
            TestStatus::Partial
        } else {
            TestStatus::Fail
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TestStatus::Pass => "pass",
            TestStatus::Partial => "partial",
            TestStatus::Fail => "fail",
            TestStatus::Error => "error",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Score {
    pub earned: f64,
    pub total: f64,
}

/// One indicator's outcome as presented to callers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorReport {
    pub name: String,
    #[serde(rename = "msg")]
    pub message: Message,
    pub points: f64,
    pub test_status: TestStatus,
    pub score: Score,
}

impl IndicatorReport {
    fn from_result(indicator: Indicator, result: IndicatorResult) -> Self {
        Self {
            name: indicator.report_name(),
            message: result.message,
            points: result.points,
            test_status: TestStatus::from_points(result.points),
            score: Score {
                earned: result.points,
                total: 100.0,
            },
        }
    }

    fn error(message: String) -> Self {
        Self {
            name: "ERROR".to_string(),
            message: Message::Text(message),
            points: 0.0,
            test_status: TestStatus::Error,
            score: Score {
                earned: 0.0,
                total: 100.0,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EvaluationReport {
    pub plugin: String,
    pub lang: String,
    pub indicators: Vec<IndicatorReport>,
    /// Mean of the indicator points.
    pub points: f64,
}

pub struct Evaluator<'a> {
    config: &'a Config,
    metadata: &'a MetadataTable,
    gatherer: &'a dyn ValueGatherer,
    validator: Option<&'a Validator<'a>>,
    localizer: &'a Localizer,
}

impl<'a> Evaluator<'a> {
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

    pub fn harmonizer(&self) -> Harmonizer<'a> {
        let harmonizer = Harmonizer::new(self.config, self.metadata, self.gatherer, self.localizer);
        match self.validator {
            Some(validator) => harmonizer.with_validator(validator),
            None => harmonizer,
        }
    }

    fn run(&self, indicator: Indicator) -> Result<IndicatorResult> {
        let ctx = IndicatorContext {
            config: self.config,
            metadata: self.metadata,
            localizer: self.localizer,
        };
        let payload = match indicator.term_id() {
            Some(term_id) => {
                match self
                    .harmonizer()
                    .resolve(term_id, indicator.validates())?
                    .into_payload()
                {
                    Ok(payload) => payload,
                    Err(unavailable) => return Ok(unavailable),
                }
            }
            None => HarmonizedPayload::default(),
        };
        Ok((indicator.scorer())(&payload, &ctx))
    }

    /// Run one indicator. Faults are reported, not returned.
    pub fn evaluate(&self, indicator: Indicator) -> IndicatorReport {
        match self.run(indicator) {
            Ok(result) => {
                info!("{}: {} points", indicator.report_name(), result.points);
                IndicatorReport::from_result(indicator, result)
            }
            Err(e) => {
                error!("{} failed: {}", indicator.report_name(), e);
                IndicatorReport::error(format!("Exception: {}", e))
            }
        }
    }

    pub fn evaluate_all(&self, indicators: &[Indicator]) -> EvaluationReport {
        let reports: Vec<_> = indicators.iter().map(|i| self.evaluate(*i)).collect();
        let points = if reports.is_empty() {
            0.0
        } else {
            reports.iter().map(|r| r.points).sum::<f64>() / reports.len() as f64
        };
        EvaluationReport {
            plugin: self.config.plugin.name.clone(),
            lang: self.localizer.lang().to_string(),
            indicators: reports,
            points,
        }
    }
}
