//! Content registries with a local cache fallback.
//!
//! These connectors download (part of) a registry and return its content.
//! All three follow the remote-then-local pattern of
//! [`collect_with_fallback`](super::collect_with_fallback).

use quick_xml::events::Event;
use quick_xml::Reader;
use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

use super::{collect_with_fallback, Collected, ConnectorContext, VocabularyConnector};
use crate::config::VocabularySettings;
use crate::error::{Error, Result};
use crate::http::parse_url;

fn read_json(path: &Path) -> Result<Value> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

// ─── IANA media types ──────────────────────────────────────────────────

const IANA_DEFAULT_ITEM: &str = "file";

/// The IANA media type registry (`media-types.xml`).
///
/// `collect` ignores its argument and returns the whole list; the format
/// validator checks membership itself.
pub struct IanaMediaTypes {
    settings: VocabularySettings,
    client: Client,
    local_path: Option<PathBuf>,
}

impl IanaMediaTypes {
    pub fn factory(
        _id: &str,
        settings: &VocabularySettings,
        ctx: &ConnectorContext,
    ) -> Arc<dyn VocabularyConnector> {
        Arc::new(Self {
            settings: settings.clone(),
            client: ctx.client.clone(),
            local_path: ctx.local_path(settings),
        })
    }

    fn item_element(&self) -> &str {
        self.settings
            .xml_item_element
            .as_deref()
            .unwrap_or(IANA_DEFAULT_ITEM)
    }

    fn remote(&self) -> Result<Vec<Value>> {
        let response = self
            .client
            .get(&self.settings.remote_path)
            .header(CONTENT_TYPE, "application/xml")
            .send()?
            .error_for_status()?;
        let body = response.text()?;
        parse_media_types(body.as_bytes(), self.item_element())
    }
}

/// Text of every `<item>` element (matched on local name) in an XML document.
pub fn parse_media_types(xml: &[u8], item: &str) -> Result<Vec<Value>> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(true);

    let mut buf = Vec::new();
    let mut items = Vec::new();
    let mut inside = false;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) if e.local_name().as_ref() == item.as_bytes() => inside = true,
            Event::End(e) if e.local_name().as_ref() == item.as_bytes() => inside = false,
            Event::Text(t) if inside => {
                let text = t.unescape().map_err(quick_xml::Error::from)?;
                items.push(Value::from(text.into_owned()));
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    debug!("Found {} items for IANA media types", items.len());
    Ok(items)
}

impl VocabularyConnector for IanaMediaTypes {
    fn name(&self) -> &str {
        "IANA Media Types"
    }

    fn kind(&self) -> &str {
        "iana_media_types"
    }

    fn collect(&self, _term: &str) -> Result<Collected> {
        let item = self.item_element().to_string();
        let items = collect_with_fallback(
            self.name(),
            &self.settings,
            self.local_path.as_deref(),
            || self.remote(),
            |path| parse_media_types(&std::fs::read(path)?, &item),
        )?;
        Ok(Collected::Content(items))
    }
}

// ─── FAIRsharing ───────────────────────────────────────────────────────

const FAIRSHARING_API: &str = "https://api.fairsharing.org";
const FAIRSHARING_PAGE_SIZE: &str = "2500";

/// FAIRsharing registry search (standards, databases, policies).
///
/// Remote search needs `remote_username` and `remote_password`; the JWT from
/// the sign-in call authorizes the search request.
pub struct FairSharing {
    settings: VocabularySettings,
    client: Client,
    local_path: Option<PathBuf>,
}

impl FairSharing {
    pub fn factory(
        _id: &str,
        settings: &VocabularySettings,
        ctx: &ConnectorContext,
    ) -> Arc<dyn VocabularyConnector> {
        Arc::new(Self {
            settings: settings.clone(),
            client: ctx.client.clone(),
            local_path: ctx.local_path(settings),
        })
    }

    fn api_base(&self) -> &str {
        self.settings
            .api_url
            .as_deref()
            .unwrap_or(FAIRSHARING_API)
            .trim_end_matches('/')
    }

    fn login(&self, username: &str, password: &str) -> Result<String> {
        let url = format!("{}/users/sign_in", self.api_base());
        let response = self
            .client
            .post(&url)
            .header(ACCEPT, "application/json")
            .json(&json!({ "user": { "login": username, "password": password } }))
            .send()?
            .error_for_status()?;
        let body: Value = response.json()?;
        body.get("jwt")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| Error::vocabulary(self.name(), "sign-in response carries no 'jwt'"))
    }

    fn remote(&self, topic: &str) -> Result<Vec<Value>> {
        let (Some(username), Some(password)) = (
            self.settings.remote_username.as_deref(),
            self.settings.remote_password.as_deref(),
        ) else {
            return Err(Error::vocabulary(
                self.name(),
                "'remote_username' and 'remote_password' are required for the FAIRsharing API",
            ));
        };

        let token = self.login(username, password)?;

        let mut url = parse_url(&self.settings.remote_path)?;
        url.query_pairs_mut()
            .append_pair("page[size]", FAIRSHARING_PAGE_SIZE)
            .append_pair("q", topic);
        debug!("Request URL to FAIRsharing API with search topic '{}': {}", topic, url);

        let response = self
            .client
            .post(url)
            .header(ACCEPT, "application/json")
            .bearer_auth(token)
            .send()?
            .error_for_status()?;
        let body: Value = response.json()?;
        Ok(data_array(body))
    }
}

fn data_array(body: Value) -> Vec<Value> {
    match body {
        Value::Object(mut map) => match map.remove("data") {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    }
}

/// Records of a cached FAIRsharing export whose text mentions `topic`.
fn search_local_records(path: &Path, topic: &str) -> Result<Vec<Value>> {
    let records = data_array(read_json(path)?);
    let needle = topic.trim().to_lowercase();
    if needle.is_empty() {
        return Ok(records);
    }
    Ok(records
        .into_iter()
        .filter(|record| record.to_string().to_lowercase().contains(&needle))
        .collect())
}

impl VocabularyConnector for FairSharing {
    fn name(&self) -> &str {
        "FAIRsharing registry"
    }

    fn kind(&self) -> &str {
        "fairsharing"
    }

    fn collect(&self, topic: &str) -> Result<Collected> {
        let items = collect_with_fallback(
            self.name(),
            &self.settings,
            self.local_path.as_deref(),
            || self.remote(topic),
            |path| search_local_records(path, topic),
        )?;
        Ok(Collected::Content(items))
    }
}

// ─── GeoNames ──────────────────────────────────────────────────────────

const GEONAMES_DEFAULT_USER: &str = "demo";

/// GeoNames lookup by `geonameId`.
///
/// Accepts bare ids and `https://sws.geonames.org/<id>/` style URIs and
/// returns the place's `asciiName`. The local cache is a JSON object mapping
/// ids to names.
pub struct GeoNames {
    settings: VocabularySettings,
    client: Client,
    local_path: Option<PathBuf>,
}

impl GeoNames {
    pub fn factory(
        _id: &str,
        settings: &VocabularySettings,
        ctx: &ConnectorContext,
    ) -> Arc<dyn VocabularyConnector> {
        Arc::new(Self {
            settings: settings.clone(),
            client: ctx.client.clone(),
            local_path: ctx.local_path(settings),
        })
    }

    fn remote(&self, geoname_id: &str) -> Result<Vec<Value>> {
        let username = self
            .settings
            .remote_username
            .as_deref()
            .unwrap_or(GEONAMES_DEFAULT_USER);
        let response = self
            .client
            .get(&self.settings.remote_path)
            .header(ACCEPT, "application/json")
            .query(&[("geonameId", geoname_id), ("username", username)])
            .send()?
            .error_for_status()?;
        let body: Value = response.json()?;
        Ok(ascii_name(body.get("asciiName")))
    }
}

fn ascii_name(value: Option<&Value>) -> Vec<Value> {
    value
        .and_then(Value::as_str)
        .filter(|name| !name.is_empty())
        .map(|name| vec![Value::from(name)])
        .unwrap_or_default()
}

/// Numeric GeoNames id from a bare id or a GeoNames URI.
pub fn geoname_id(term: &str) -> Option<&str> {
    term.trim()
        .trim_end_matches('/')
        .rsplit('/')
        .find(|segment| !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit()))
}

impl VocabularyConnector for GeoNames {
    fn name(&self) -> &str {
        "GeoNames"
    }

    fn kind(&self) -> &str {
        "geonames"
    }

    fn collect(&self, term: &str) -> Result<Collected> {
        let Some(id) = geoname_id(term) else {
            debug!("No GeoNames id found in '{}'", term);
            return Ok(Collected::Content(Vec::new()));
        };
        let items = collect_with_fallback(
            self.name(),
            &self.settings,
            self.local_path.as_deref(),
            || self.remote(id),
            |path| Ok(ascii_name(read_json(path)?.get(id))),
        )?;
        Ok(Collected::Content(items))
    }
}
