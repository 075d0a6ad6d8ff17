//! Thesauri queried through SPARQL endpoints.
//!
//! The candidate term is embedded as a resource URI. Agrovoc and Getty are
//! asked an `ASK` query; UNESCO and Wikidata a `SELECT ?p ?o ... LIMIT 1`
//! query, where any binding means the term exists.

use quick_xml::events::Event;
use quick_xml::Reader;
use reqwest::blocking::Client;
use reqwest::header::ACCEPT;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

use super::{require_remote_path, Collected, ConnectorContext, VocabularyConnector};
use crate::config::VocabularySettings;
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryForm {
    /// `ASK WHERE { <term> ?p ?o }`, answered as SPARQL-results JSON.
    AskJson,
    /// `ASK WHERE { <term> ?p ?o }`, answered as SPARQL-results XML.
    AskXml,
    /// `SELECT ?p ?o WHERE { <term> ?p ?o .} LIMIT 1`.
    SelectOne,
}

impl QueryForm {
    pub fn query(&self, term: &str) -> String {
        match self {
            QueryForm::AskJson | QueryForm::AskXml => format!("ASK WHERE {{ <{}> ?p ?o }}", term),
            QueryForm::SelectOne => format!("SELECT ?p ?o WHERE {{ <{}> ?p ?o .}} LIMIT 1", term),
        }
    }

    fn accept(&self) -> &'static str {
        match self {
            QueryForm::AskXml => "application/sparql-results+xml",
            QueryForm::AskJson | QueryForm::SelectOne => "application/json",
        }
    }
}

pub struct SparqlVocabulary {
    name: &'static str,
    kind: &'static str,
    form: QueryForm,
    default_endpoint: &'static str,
    rewrite: fn(&str) -> String,
    settings: VocabularySettings,
    client: Client,
}

impl SparqlVocabulary {
    fn build(
        name: &'static str,
        kind: &'static str,
        form: QueryForm,
        default_endpoint: &'static str,
        rewrite: fn(&str) -> String,
        settings: &VocabularySettings,
        ctx: &ConnectorContext,
    ) -> Arc<dyn VocabularyConnector> {
        Arc::new(Self {
            name,
            kind,
            form,
            default_endpoint,
            rewrite,
            settings: settings.clone(),
            client: ctx.client.clone(),
        })
    }

    pub fn agrovoc(
        _id: &str,
        settings: &VocabularySettings,
        ctx: &ConnectorContext,
    ) -> Arc<dyn VocabularyConnector> {
        Self::build(
            "Agrovoc",
            "agrovoc",
            QueryForm::AskJson,
            "https://agrovoc.fao.org/sparql",
            keep_term,
            settings,
            ctx,
        )
    }

    pub fn getty(
        _id: &str,
        settings: &VocabularySettings,
        ctx: &ConnectorContext,
    ) -> Arc<dyn VocabularyConnector> {
        Self::build(
            "Getty",
            "getty",
            QueryForm::AskXml,
            "http://vocab.getty.edu/sparql",
            getty_term,
            settings,
            ctx,
        )
    }

    pub fn unesco(
        _id: &str,
        settings: &VocabularySettings,
        ctx: &ConnectorContext,
    ) -> Arc<dyn VocabularyConnector> {
        Self::build(
            "Unesco",
            "unesco",
            QueryForm::SelectOne,
            "https://vocabularies.unesco.org/sparql",
            unesco_term,
            settings,
            ctx,
        )
    }

    pub fn wikidata(
        _id: &str,
        settings: &VocabularySettings,
        ctx: &ConnectorContext,
    ) -> Arc<dyn VocabularyConnector> {
        Self::build(
            "Wikidata",
            "wikidata",
            QueryForm::SelectOne,
            "https://query.wikidata.org/sparql",
            wikidata_term,
            settings,
            ctx,
        )
    }

    fn endpoint(&self) -> &str {
        self.settings
            .sparql_endpoint
            .as_deref()
            .unwrap_or(self.default_endpoint)
    }

    fn query(&self, term: &str) -> Result<bool> {
        let query = self.form.query(term);
        debug!("SPARQL query to {} ({}): {}", self.name, self.endpoint(), query);

        let response = self
            .client
            .get(self.endpoint())
            .header(ACCEPT, self.form.accept())
            .query(&[("query", query.as_str()), ("format", "json")])
            .send()?;

        if response.status().as_u16() != 200 {
            debug!("{} SPARQL endpoint answered {}", self.name, response.status());
            return Ok(false);
        }

        match self.form {
            QueryForm::AskJson => {
                let body: Value = response.json()?;
                Ok(body.get("boolean").and_then(Value::as_bool).unwrap_or(false))
            }
            QueryForm::AskXml => parse_ask_xml(&response.text()?),
            QueryForm::SelectOne => {
                let body: Value = response.json()?;
                Ok(has_bindings(&body))
            }
        }
    }
}

fn keep_term(term: &str) -> String {
    term.to_string()
}

/// Getty resources are queried without the `/page` HTML suffix.
fn getty_term(term: &str) -> String {
    term.replace("/page", "")
}

fn unesco_term(term: &str) -> String {
    term.replace(&[' ', '\u{a0}'][..], "")
}

/// Wikidata stores entities under `http://www.wikidata.org/entity/`.
fn wikidata_term(term: &str) -> String {
    term.replace("https", "http").replace("/wiki/", "/entity/")
}

/// Whether a SPARQL-results JSON document has at least one binding.
pub fn has_bindings(body: &Value) -> bool {
    body.pointer("/results/bindings")
        .and_then(Value::as_array)
        .is_some_and(|bindings| !bindings.is_empty())
}

/// The `<boolean>` answer of a SPARQL-results XML document.
pub fn parse_ask_xml(xml: &str) -> Result<bool> {
    let mut reader = Reader::from_reader(xml.as_bytes());
    reader.config_mut().trim_text(true);

    let mut buf = Vec::new();
    let mut inside = false;
    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) if e.local_name().as_ref() == b"boolean" => inside = true,
            Event::Text(t) if inside => {
                let text = t.unescape().map_err(quick_xml::Error::from)?;
                return Ok(text.trim().eq_ignore_ascii_case("true"));
            }
            Event::End(e) if e.local_name().as_ref() == b"boolean" => return Ok(false),
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Err(Error::vocabulary("Getty", "SPARQL answer has no <boolean> element"))
}

impl VocabularyConnector for SparqlVocabulary {
    fn name(&self) -> &str {
        self.name
    }

    fn kind(&self) -> &str {
        self.kind
    }

    fn collect(&self, term: &str) -> Result<Collected> {
        if !require_remote_path(self.name, &self.settings) {
            return Ok(Collected::Exists(false));
        }
        if !term.contains(self.settings.remote_path.as_str()) {
            debug!("'{}' is not a {} URI", term, self.name);
            return Ok(Collected::Exists(false));
        }
        let term = (self.rewrite)(term.trim());
        match self.query(&term) {
            Ok(found) => Ok(Collected::Exists(found)),
            Err(e) => {
                warn!("{} lookup of '{}' failed: {}", self.name, term, e);
                Ok(Collected::Exists(false))
            }
        }
    }
}
