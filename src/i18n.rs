//! Message localization.
//!
//! Indicator and harmonizer messages go through an explicit [`Localizer`]
//! instead of a global translation function. Message ids are the English
//! texts themselves, with `{}` placeholders filled positionally.
//!
//! Catalogs are TOML files with one table per language:
//!
//! ```toml
//! [es]
//! "License present: {}" = "Licencia presente: {}"
//! ```

use serde::Deserialize;
use std::collections::HashMap;
use std::fmt::Display;
use std::path::Path;
use tracing::debug;

use crate::config::LocalizationConfig;
use crate::error::Result;

#[derive(Deserialize)]
#[serde(transparent)]
struct Catalog(HashMap<String, HashMap<String, String>>);

#[derive(Debug, Clone)]
pub struct Localizer {
    lang: String,
    messages: HashMap<String, String>,
}

impl Default for Localizer {
    fn default() -> Self {
        Self::new("en")
    }
}

impl Localizer {
    /// A localizer without a catalog: every message stays in English.
    pub fn new(lang: &str) -> Self {
        Self {
            lang: lang.to_string(),
            messages: HashMap::new(),
        }
    }

    pub fn with_messages(lang: &str, messages: HashMap<String, String>) -> Self {
        Self {
            lang: lang.to_string(),
            messages,
        }
    }

    /// Load the `lang` table of a TOML catalog. A catalog without that
    /// language yields an English localizer.
    pub fn load(path: &Path, lang: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let Catalog(mut languages) = toml::from_str(&content)?;
        let messages = languages.remove(lang).unwrap_or_default();
        debug!(
            "Loaded {} message(s) for language '{}' from {}",
            messages.len(),
            lang,
            path.display()
        );
        Ok(Self::with_messages(lang, messages))
    }

    pub fn from_config(config: &LocalizationConfig) -> Result<Self> {
        match &config.catalog {
            Some(path) => Self::load(path, &config.lang),
            None => Ok(Self::new(&config.lang)),
        }
    }

    pub fn lang(&self) -> &str {
        &self.lang
    }

    /// Translate `msgid` and fill its `{}` placeholders with `args` in order.
    pub fn tr(&self, msgid: &str, args: &[&dyn Display]) -> String {
        let template = self.messages.get(msgid).map(String::as_str).unwrap_or(msgid);
        let mut out = String::with_capacity(template.len());
        let mut args = args.iter();
        let mut rest = template;
        while let Some(idx) = rest.find("{}") {
            out.push_str(&rest[..idx]);
            match args.next() {
                Some(arg) => out.push_str(&arg.to_string()),
                None => out.push_str("{}"),
            }
            rest = &rest[idx + 2..];
        }
        out.push_str(rest);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn english_fallback_fills_placeholders() {
        let loc = Localizer::default();
        assert_eq!(
            loc.tr("Found {} out of {} terms", &[&2, &"three"]),
            "Found 2 out of three terms"
        );
        assert_eq!(loc.tr("Missing {} and {}", &[&"one"]), "Missing one and {}");
    }

    #[test]
    fn load_catalog_language() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("messages.toml");
        std::fs::write(
            &path,
            "[es]\n\"The license is: {}\" = \"La licencia es: {}\"\n",
        )
        .unwrap();

        let es = Localizer::load(&path, "es").unwrap();
        assert_eq!(es.lang(), "es");
        assert_eq!(es.tr("The license is: {}", &[&"MIT"]), "La licencia es: MIT");
        assert_eq!(es.tr("Untranslated", &[]), "Untranslated");

        let fr = Localizer::load(&path, "fr").unwrap();
        assert_eq!(fr.tr("The license is: {}", &[&"MIT"]), "The license is: MIT");
    }
}
