//! # FAIR Harness
//!
//! A metadata harmonization and FAIR evaluation engine.
//!
//! FAIR Harness takes the metadata of a digital object as a flat table of
//! `(schema, element, qualifier, value)` rows, maps repository-specific
//! fields onto canonical terms through a configured term map, normalizes
//! their values, validates them against external controlled vocabularies
//! and scores the result with the RDA FAIR maturity indicators.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌─────────────┐   ┌──────────────┐   ┌────────────┐
//! │ MetadataTable│──▶│  Harmonizer │──▶│  Validator   │──▶│ Indicators │
//! │ rows (JSON)  │   │ map+gather  │   │ vocabularies │   │  RDA F/A/I/R│
//! └──────────────┘   └─────────────┘   └──────┬───────┘   └─────┬──────┘
//!                                             │                 │
//!                                    ┌────────▼───────┐   ┌─────▼─────┐
//!                                    │ SPARQL / REST /│   │ Evaluator │
//!                                    │ redirect / list│   │  reports  │
//!                                    └────────────────┘   └───────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! fair vocabularies                               # list connectors
//! fair evaluate --metadata record.json            # every indicator
//! fair harmonize --metadata record.json terms_cv --validate
//! fair check orcid https://orcid.org/0000-0002-1825-0097
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Metadata rows, harmonized values and indicator results |
//! | [`category`] | Canonical term categories |
//! | [`identifiers`] | Persistent identifier shape checks |
//! | [`gather`] | Per-category value normalization |
//! | [`vocabulary`] | Controlled vocabulary connectors and registry |
//! | [`validate`] | Category-aware validation against vocabularies |
//! | [`harmonize`] | Term resolution and coverage scoring |
//! | [`indicators`] | RDA FAIR indicator scorers |
//! | [`evaluator`] | Indicator dispatch and reports |
//! | [`i18n`] | Message localization |
//! | [`http`] | HTTP client and bounded redirect following |
//! | [`commands`] | CLI command implementations |

pub mod category;
pub mod commands;
pub mod config;
pub mod error;
pub mod evaluator;
pub mod gather;
pub mod harmonize;
pub mod http;
pub mod i18n;
pub mod identifiers;
pub mod indicators;
pub mod models;
pub mod validate;
pub mod vocabulary;
