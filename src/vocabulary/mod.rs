//! Controlled-vocabulary connectors.
//!
//! Each connector confirms whether a value is recognized by one external
//! vocabulary (identifier registries, license lists, thesauri). Connectors
//! are resolved by vocabulary id through an explicit [`VocabularyRegistry`],
//! built once at startup from the `[vocabularies.<id>]` config sections.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                  VocabularyRegistry                      │
//! │  ┌──────────┐ ┌──────────┐ ┌───────────┐ ┌────────────┐  │
//! │  │ cached   │ │ licenses │ │ redirect  │ │  sparql    │  │
//! │  │IANA/FAIR-│ │  SPDX    │ │ROR/COAR/  │ │Agrovoc/    │  │
//! │  │sharing/  │ │          │ │LoC/PIC    │ │Getty/UNESCO│  │
//! │  │GeoNames  │ │  orcid   │ │           │ │/Wikidata   │  │
//! │  └──────────┘ └──────────┘ └───────────┘ └────────────┘  │
//! └─────────────────────────┬────────────────────────────────┘
//!                           ▼
//!                 Validator (per category)
//! ```
//!
//! # Connector kinds
//!
//! | Kind | Module | Answer |
//! |------|--------|--------|
//! | `iana_media_types` | [`cached`] | content (media type list) |
//! | `fairsharing` | [`cached`] | content (matching records) |
//! | `geonames` | [`cached`] | content (`asciiName`) |
//! | `spdx` | [`licenses`] | existence |
//! | `orcid` | [`orcid`] | existence |
//! | `ror`, `coar`, `loc`, `pic` | [`redirect`] | existence |
//! | `agrovoc`, `getty`, `unesco`, `wikidata` | [`sparql`] | existence |

pub mod cached;
pub mod licenses;
pub mod orcid;
pub mod redirect;
pub mod sparql;

use reqwest::blocking::Client;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::category::Category;
use crate::config::{CacheConfig, Config, HttpConfig, VocabularySettings};
use crate::error::{Error, Result};
use crate::http::build_client;

// ═══════════════════════════════════════════════════════════════════════
// Connector Trait
// ═══════════════════════════════════════════════════════════════════════

/// What a connector returns for one term.
#[derive(Debug, Clone, PartialEq)]
pub enum Collected {
    /// Existence check answer.
    Exists(bool),
    /// Registry content; strings for list registries, records for search APIs.
    Content(Vec<Value>),
}

impl Collected {
    /// `true` for a positive existence answer or any non-empty content.
    pub fn is_match(&self) -> bool {
        match self {
            Collected::Exists(found) => *found,
            Collected::Content(items) => !items.is_empty(),
        }
    }

    /// Whether `value` appears among the string items of the content.
    ///
    /// Existence answers are returned as-is.
    pub fn contains(&self, value: &str) -> bool {
        match self {
            Collected::Exists(found) => *found,
            Collected::Content(items) => items
                .iter()
                .filter_map(Value::as_str)
                .any(|item| item.eq_ignore_ascii_case(value.trim())),
        }
    }
}

/// A client for one external controlled vocabulary.
///
/// Implementations own their settings and the shared HTTP client. They are
/// stored behind `Arc` in the registry and may be shared across evaluations,
/// so any cache they keep must be thread-safe.
pub trait VocabularyConnector: Send + Sync {
    /// Human-readable vocabulary name (`"IANA Media Types"`).
    fn name(&self) -> &str;

    /// Connector kind, as written in `[vocabularies.<id>].kind`.
    fn kind(&self) -> &str;

    /// Look up `term` (a value, URI or search topic).
    ///
    /// Network failures are reported as errors; callers decide whether they
    /// mean "not valid".
    fn collect(&self, term: &str) -> Result<Collected>;
}

/// Everything a connector factory receives besides its own settings.
#[derive(Clone)]
pub struct ConnectorContext {
    pub client: Client,
    pub http: HttpConfig,
    pub cache: CacheConfig,
}

impl ConnectorContext {
    pub fn new(http: &HttpConfig, cache: &CacheConfig) -> Result<Self> {
        Ok(Self {
            client: build_client(http)?,
            http: http.clone(),
            cache: cache.clone(),
        })
    }

    /// Absolute path of a vocabulary's local cache, if one is configured.
    pub fn local_path(&self, settings: &VocabularySettings) -> Option<PathBuf> {
        settings
            .local_path
            .as_deref()
            .map(|p| self.cache.resolve(p))
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Remote-then-local retrieval
// ═══════════════════════════════════════════════════════════════════════

/// Shared retrieval pattern for content registries.
///
/// Tries `remote` first when remote checking is enabled. An error or an
/// empty answer falls back to `local`, which reads the configured cache
/// file. Without a cache file the remote outcome stands.
pub(crate) fn collect_with_fallback<R, L>(
    vocabulary: &str,
    settings: &VocabularySettings,
    local_path: Option<&Path>,
    remote: R,
    local: L,
) -> Result<Vec<Value>>
where
    R: FnOnce() -> Result<Vec<Value>>,
    L: FnOnce(&Path) -> Result<Vec<Value>>,
{
    let remote_outcome = if settings.enable_remote_check {
        debug!(
            "Accessing vocabulary '{}' remotely through {}",
            vocabulary, settings.remote_path
        );
        match remote() {
            Ok(items) if !items.is_empty() => return Ok(items),
            Ok(items) => {
                warn!("Vocabulary '{}' returned no content remotely", vocabulary);
                Ok(items)
            }
            Err(e) => {
                warn!("Remote access to vocabulary '{}' failed: {}", vocabulary, e);
                Err(e)
            }
        }
    } else {
        Ok(Vec::new())
    };

    match local_path {
        Some(path) => {
            debug!(
                "Accessing vocabulary '{}' from local cache: {}",
                vocabulary,
                path.display()
            );
            local(path)
        }
        None if settings.enable_remote_check => remote_outcome,
        None => Err(Error::vocabulary(
            vocabulary,
            "remote check disabled and no local_path configured",
        )),
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Registry
// ═══════════════════════════════════════════════════════════════════════

/// Builds a connector for one `[vocabularies.<id>]` section.
pub type ConnectorFactory =
    fn(&str, &VocabularySettings, &ConnectorContext) -> Arc<dyn VocabularyConnector>;

/// Built-in connector kinds.
pub const BUILTIN_KINDS: &[(&str, ConnectorFactory)] = &[
    ("iana_media_types", cached::IanaMediaTypes::factory),
    ("fairsharing", cached::FairSharing::factory),
    ("geonames", cached::GeoNames::factory),
    ("spdx", licenses::SpdxLicenses::factory),
    ("orcid", orcid::Orcid::factory),
    ("ror", redirect::RedirectVocabulary::ror),
    ("coar", redirect::RedirectVocabulary::coar),
    ("loc", redirect::RedirectVocabulary::loc),
    ("pic", redirect::Pic::factory),
    ("agrovoc", sparql::SparqlVocabulary::agrovoc),
    ("getty", sparql::SparqlVocabulary::getty),
    ("unesco", sparql::SparqlVocabulary::unesco),
    ("wikidata", sparql::SparqlVocabulary::wikidata),
];

fn builtin_factory(kind: &str) -> Option<ConnectorFactory> {
    let kind = kind.to_ascii_lowercase();
    BUILTIN_KINDS
        .iter()
        .find(|(name, _)| *name == kind)
        .map(|(_, factory)| *factory)
}

/// Vocabulary id -> connector.
///
/// Built-in kinds are registered from config with [`VocabularyRegistry::from_config`];
/// embedding applications add their own with [`VocabularyRegistry::register`].
#[derive(Default, Clone)]
pub struct VocabularyRegistry {
    connectors: BTreeMap<String, Arc<dyn VocabularyConnector>>,
}

impl VocabularyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register one connector per `[vocabularies.<id>]` section.
    ///
    /// The connector kind is `kind` when set, otherwise the id itself. Ids
    /// named in `controlled_vocabularies` without a section get the built-in
    /// kind of the same name with default settings; any other id is a
    /// configuration error.
    pub fn from_config(config: &Config) -> Result<Self> {
        let ctx = ConnectorContext::new(&config.http, &config.cache)?;
        let mut registry = Self::new();

        for (id, settings) in &config.vocabularies {
            let kind = settings.kind_or(id);
            let factory = builtin_factory(kind).ok_or_else(|| {
                Error::Config(format!(
                    "Unknown vocabulary kind '{}' for vocabulary '{}'",
                    kind, id
                ))
            })?;
            registry.register(id, factory(id, settings, &ctx));
        }

        for (category, vocabularies) in &config.controlled_vocabularies {
            if Category::from_term(category) == Category::DataConnection {
                continue;
            }
            for id in vocabularies.keys() {
                if registry.get(id).is_some() {
                    continue;
                }
                let factory = builtin_factory(id).ok_or_else(|| {
                    Error::Config(format!(
                        "Vocabulary '{}' used for '{}' has no [vocabularies.{}] section and is not a built-in kind",
                        id, category, id
                    ))
                })?;
                debug!(
                    "Registering built-in vocabulary '{}' with default settings for '{}'",
                    id, category
                );
                registry.register(id, factory(id, &VocabularySettings::default(), &ctx));
            }
        }

        debug!("Registered {} vocabulary connector(s)", registry.len());
        Ok(registry)
    }

    /// Register (or replace) the connector for `id`.
    pub fn register(&mut self, id: &str, connector: Arc<dyn VocabularyConnector>) {
        self.connectors.insert(id.to_string(), connector);
    }

    pub fn get(&self, id: &str) -> Option<&Arc<dyn VocabularyConnector>> {
        self.connectors.get(id)
    }

    /// Registered vocabulary ids, sorted.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.connectors.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Arc<dyn VocabularyConnector>)> {
        self.connectors.iter().map(|(id, c)| (id.as_str(), c))
    }

    pub fn len(&self) -> usize {
        self.connectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connectors.is_empty()
    }
}

/// Warn about term-based connectors configured without a `remote_path`.
pub(crate) fn require_remote_path(name: &str, settings: &VocabularySettings) -> bool {
    if settings.remote_path.trim().is_empty() {
        warn!(
            "Could not get {} endpoint from configuration (check 'remote_path' property)",
            name
        );
        false
    } else {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(bool);

    impl VocabularyConnector for Fixed {
        fn name(&self) -> &str {
            "Fixed"
        }
        fn kind(&self) -> &str {
            "custom"
        }
        fn collect(&self, _term: &str) -> Result<Collected> {
            Ok(Collected::Exists(self.0))
        }
    }

    #[test]
    fn collected_matching() {
        assert!(Collected::Exists(true).is_match());
        assert!(!Collected::Content(vec![]).is_match());
        let list = Collected::Content(vec![Value::from("text/csv"), Value::from("application/json")]);
        assert!(list.contains("Text/CSV"));
        assert!(!list.contains("text/plain"));
    }

    #[test]
    fn registry_register_and_get() {
        let mut registry = VocabularyRegistry::new();
        registry.register("yes", Arc::new(Fixed(true)));
        registry.register("no", Arc::new(Fixed(false)));
        assert_eq!(registry.ids().collect::<Vec<_>>(), vec!["no", "yes"]);
        assert!(registry.get("yes").unwrap().collect("x").unwrap().is_match());
        assert!(registry.get("missing").is_none());
    }

    #[test]
    fn registry_from_config_uses_kind_or_id() {
        let mut config = Config::minimal();
        config
            .vocabularies
            .insert("ORCID".into(), VocabularySettings::default());
        config.vocabularies.insert(
            "licenses".into(),
            VocabularySettings {
                kind: Some("spdx".into()),
                ..VocabularySettings::default()
            },
        );
        let registry = VocabularyRegistry::from_config(&config).unwrap();
        assert_eq!(registry.get("ORCID").unwrap().kind(), "orcid");
        assert_eq!(registry.get("licenses").unwrap().kind(), "spdx");
    }

    #[test]
    fn registry_rejects_unknown_kind() {
        let mut config = Config::minimal();
        config.vocabularies.insert(
            "mystery".into(),
            VocabularySettings {
                kind: Some("telepathy".into()),
                ..VocabularySettings::default()
            },
        );
        let err = VocabularyRegistry::from_config(&config).err().unwrap();
        assert!(err.to_string().contains("Unknown vocabulary kind"));
    }

    fn controlled(config: &mut Config, category: &str, id: &str) {
        config
            .controlled_vocabularies
            .entry(category.to_string())
            .or_default()
            .insert(id.to_string(), format!("https://{}.example.org", id));
    }

    #[test]
    fn registry_adds_builtin_for_controlled_vocabulary_without_section() {
        let mut config = Config::minimal();
        controlled(&mut config, "License", "spdx");
        controlled(&mut config, "Data connection", "any");
        let registry = VocabularyRegistry::from_config(&config).unwrap();
        assert_eq!(registry.get("spdx").unwrap().kind(), "spdx");
        assert!(registry.get("any").is_none());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn registry_rejects_controlled_vocabulary_without_connector() {
        let mut config = Config::minimal();
        controlled(&mut config, "Keywords", "mesh");
        let err = VocabularyRegistry::from_config(&config).err().unwrap();
        assert!(err.to_string().contains("has no [vocabularies.mesh] section"));
    }

    #[test]
    fn fallback_reads_local_when_remote_disabled() {
        let settings = VocabularySettings {
            enable_remote_check: false,
            ..VocabularySettings::default()
        };
        let path = PathBuf::from("cache.json");
        let items = collect_with_fallback(
            "test",
            &settings,
            Some(&path),
            || -> Result<Vec<Value>> { panic!("remote must not be called") },
            |p| Ok(vec![Value::from(p.display().to_string())]),
        )
        .unwrap();
        assert_eq!(items, vec![Value::from("cache.json")]);
    }

    #[test]
    fn fallback_after_remote_error() {
        let settings = VocabularySettings::default();
        let path = PathBuf::from("cache.json");
        let items = collect_with_fallback(
            "test",
            &settings,
            Some(&path),
            || Err(Error::vocabulary("test", "offline")),
            |_| Ok(vec![Value::from("local")]),
        )
        .unwrap();
        assert_eq!(items, vec![Value::from("local")]);
    }

    #[test]
    fn remote_error_without_cache_propagates() {
        let settings = VocabularySettings::default();
        let result = collect_with_fallback(
            "test",
            &settings,
            None,
            || Err(Error::vocabulary("test", "offline")),
            |_| Ok(vec![]),
        );
        assert!(result.is_err());
    }
}
