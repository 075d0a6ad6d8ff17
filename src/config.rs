use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use crate::models::FieldRef;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub plugin: PluginConfig,
    /// Canonical category -> `{vocabulary_id: endpoint}`.
    #[serde(default)]
    pub controlled_vocabularies: BTreeMap<String, BTreeMap<String, String>>,
    /// Connection settings per vocabulary id.
    #[serde(default)]
    pub vocabularies: BTreeMap<String, VocabularySettings>,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub localization: LocalizationConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PluginConfig {
    pub name: String,
    /// Built-in homogenization profile: `"default"` or `"bracketed"`.
    #[serde(default = "default_gatherer")]
    pub gatherer: String,
    /// Named lists of canonical terms (`identifier_term`, `terms_cv`, ...).
    #[serde(default)]
    pub term_lists: HashMap<String, Vec<String>>,
    #[serde(default)]
    pub terms_map: TermMap,
}

fn default_gatherer() -> String {
    "default".to_string()
}

impl PluginConfig {
    /// The canonical terms listed under `term_id`, if configured.
    pub fn term_list(&self, term_id: &str) -> Option<&[String]> {
        self.term_lists.get(term_id).map(Vec::as_slice)
    }
}

/// Canonical term -> concrete fields, in declaration order.
///
/// Declared in TOML as an array of tables so insertion order survives parsing:
///
/// ```toml
/// [[plugin.terms_map]]
/// term = "Keywords"
/// fields = [["subject", "keyword"], "subject"]
/// ```
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(transparent)]
pub struct TermMap {
    entries: Vec<TermMapEntry>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TermMapEntry {
    pub term: String,
    pub fields: Vec<FieldRef>,
}

impl TermMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry, or extend the fields of an existing one.
    pub fn insert(&mut self, term: &str, fields: Vec<FieldRef>) {
        match self.entries.iter_mut().find(|e| e.term == term) {
            Some(entry) => entry.fields.extend(fields),
            None => self.entries.push(TermMapEntry {
                term: term.to_string(),
                fields,
            }),
        }
    }

    pub fn with(mut self, term: &str, fields: Vec<FieldRef>) -> Self {
        self.insert(term, fields);
        self
    }

    pub fn get(&self, term: &str) -> Option<&[FieldRef]> {
        self.entries
            .iter()
            .find(|e| e.term == term)
            .map(|e| e.fields.as_slice())
    }

    pub fn entries(&self) -> &[TermMapEntry] {
        &self.entries
    }
}

/// Connection settings for one controlled vocabulary.
#[derive(Debug, Deserialize, Clone)]
pub struct VocabularySettings {
    /// Connector kind; defaults to the vocabulary id itself.
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub remote_path: String,
    #[serde(default = "default_enable_remote_check")]
    pub enable_remote_check: bool,
    #[serde(default)]
    pub remote_username: Option<String>,
    #[serde(default)]
    pub remote_password: Option<String>,
    /// Local cache, relative to `[cache].root` unless absolute.
    #[serde(default)]
    pub local_path: Option<PathBuf>,
    /// SPARQL endpoint for graph-query vocabularies.
    #[serde(default)]
    pub sparql_endpoint: Option<String>,
    /// REST API base for registries queried by identifier (ORCID).
    #[serde(default)]
    pub api_url: Option<String>,
    /// XML element holding one entry in XML registries (IANA media types).
    #[serde(default)]
    pub xml_item_element: Option<String>,
}

fn default_enable_remote_check() -> bool {
    true
}

impl Default for VocabularySettings {
    fn default() -> Self {
        Self {
            kind: None,
            remote_path: String::new(),
            enable_remote_check: true,
            remote_username: None,
            remote_password: None,
            local_path: None,
            sparql_endpoint: None,
            api_url: None,
            xml_item_element: None,
        }
    }
}

impl VocabularySettings {
    pub fn kind_or<'a>(&'a self, id: &'a str) -> &'a str {
        self.kind.as_deref().unwrap_or(id)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            max_redirects: default_max_redirects(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    15
}
fn default_max_redirects() -> usize {
    10
}
fn default_user_agent() -> String {
    format!("fair-harness/{}", env!("CARGO_PKG_VERSION"))
}

#[derive(Debug, Deserialize, Clone)]
pub struct CacheConfig {
    #[serde(default = "default_cache_root")]
    pub root: PathBuf,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            root: default_cache_root(),
        }
    }
}

fn default_cache_root() -> PathBuf {
    PathBuf::from(".")
}

impl CacheConfig {
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct LocalizationConfig {
    #[serde(default = "default_lang")]
    pub lang: String,
    #[serde(default)]
    pub catalog: Option<PathBuf>,
}

impl Default for LocalizationConfig {
    fn default() -> Self {
        Self {
            lang: default_lang(),
            catalog: None,
        }
    }
}

fn default_lang() -> String {
    "en".to_string()
}

impl Config {
    /// A config with no term lists, vocabularies or term map.
    pub fn minimal() -> Self {
        Self {
            plugin: PluginConfig {
                name: "generic".to_string(),
                gatherer: default_gatherer(),
                term_lists: HashMap::new(),
                terms_map: TermMap::new(),
            },
            controlled_vocabularies: BTreeMap::new(),
            vocabularies: BTreeMap::new(),
            http: HttpConfig::default(),
            cache: CacheConfig::default(),
            localization: LocalizationConfig::default(),
        }
    }

    /// Vocabularies configured for a canonical category; empty when none.
    pub fn vocabularies_for(&self, category: &str) -> Option<&BTreeMap<String, String>> {
        self.controlled_vocabularies.get(category)
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let mut config = parse_config(&content)?;

    // Relative cache and catalog paths are relative to the config file.
    if let Some(parent) = path.parent() {
        if config.cache.root.is_relative() {
            config.cache.root = parent.join(&config.cache.root);
        }
        if let Some(catalog) = config.localization.catalog.as_mut() {
            if catalog.is_relative() {
                *catalog = parent.join(&*catalog);
            }
        }
    }

    Ok(config)
}

pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).with_context(|| "Failed to parse config file")?;

    if config.plugin.name.trim().is_empty() {
        anyhow::bail!("plugin.name must not be empty");
    }

    match config.plugin.gatherer.as_str() {
        "default" | "bracketed" => {}
        other => anyhow::bail!(
            "Unknown gatherer profile: '{}'. Must be default or bracketed.",
            other
        ),
    }

    for entry in config.plugin.terms_map.entries() {
        if entry.fields.is_empty() {
            anyhow::bail!(
                "plugin.terms_map entry '{}' must map to at least one field",
                entry.term
            );
        }
    }

    if config.http.timeout_secs == 0 {
        anyhow::bail!("http.timeout_secs must be > 0");
    }

    Ok(config)
}
