//! Vocabularies checked by resolving the term URI.
//!
//! ROR, COAR and the Library of Congress answer every known term URI with a
//! chain of redirects ending in 200. The chain is bounded by
//! `http.max_redirects`; a longer chain counts as unknown.

use reqwest::blocking::Client;
use reqwest::header::LOCATION;
use std::sync::Arc;
use tracing::{debug, warn};

use super::{require_remote_path, Collected, ConnectorContext, VocabularyConnector};
use crate::config::VocabularySettings;
use crate::error::Result;
use crate::http::resolves_ok;

pub struct RedirectVocabulary {
    name: &'static str,
    kind: &'static str,
    settings: VocabularySettings,
    client: Client,
    max_redirects: usize,
}

impl RedirectVocabulary {
    fn build(
        name: &'static str,
        kind: &'static str,
        settings: &VocabularySettings,
        ctx: &ConnectorContext,
    ) -> Arc<dyn VocabularyConnector> {
        Arc::new(Self {
            name,
            kind,
            settings: settings.clone(),
            client: ctx.client.clone(),
            max_redirects: ctx.http.max_redirects,
        })
    }

    pub fn ror(
        _id: &str,
        settings: &VocabularySettings,
        ctx: &ConnectorContext,
    ) -> Arc<dyn VocabularyConnector> {
        Self::build("RoR", "ror", settings, ctx)
    }

    pub fn coar(
        _id: &str,
        settings: &VocabularySettings,
        ctx: &ConnectorContext,
    ) -> Arc<dyn VocabularyConnector> {
        Self::build("COAR", "coar", settings, ctx)
    }

    pub fn loc(
        _id: &str,
        settings: &VocabularySettings,
        ctx: &ConnectorContext,
    ) -> Arc<dyn VocabularyConnector> {
        Self::build("Library of Congress", "loc", settings, ctx)
    }
}

impl VocabularyConnector for RedirectVocabulary {
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
        let term = term.trim();
        if !term.contains(self.settings.remote_path.as_str()) {
            debug!("'{}' is not a {} URI", term, self.name);
            return Ok(Collected::Exists(false));
        }
        Ok(Collected::Exists(resolves_ok(
            &self.client,
            term,
            self.max_redirects,
        )))
    }
}

// ─── PIC ───────────────────────────────────────────────────────────────

/// EU Participant Identification Code (nine digits).
///
/// The Funding & Tenders portal redirects unknown PICs to its search page.
/// `remote_path` may contain a `{pic}` placeholder; otherwise the PIC is
/// appended as the last path segment.
pub struct Pic {
    settings: VocabularySettings,
    client: Client,
}

impl Pic {
    pub fn factory(
        _id: &str,
        settings: &VocabularySettings,
        ctx: &ConnectorContext,
    ) -> Arc<dyn VocabularyConnector> {
        Arc::new(Self {
            settings: settings.clone(),
            client: ctx.client.clone(),
        })
    }

    fn lookup_url(&self, pic: &str) -> String {
        let base = self.settings.remote_path.trim();
        if base.contains("{pic}") {
            base.replace("{pic}", pic)
        } else {
            format!("{}/{}", base.trim_end_matches('/'), pic)
        }
    }
}

/// The nine-digit PIC in a bare value or the last segment of a URL.
pub fn pic_number(term: &str) -> Option<&str> {
    let candidate = term.trim().trim_end_matches('/').rsplit('/').next()?;
    (candidate.len() == 9 && candidate.bytes().all(|b| b.is_ascii_digit())).then_some(candidate)
}

impl VocabularyConnector for Pic {
    fn name(&self) -> &str {
        "PIC"
    }

    fn kind(&self) -> &str {
        "pic"
    }

    fn collect(&self, term: &str) -> Result<Collected> {
        if !require_remote_path(self.name(), &self.settings) {
            return Ok(Collected::Exists(false));
        }
        let Some(pic) = pic_number(term) else {
            return Ok(Collected::Exists(false));
        };

        let url = self.lookup_url(pic);
        let response = match self.client.head(&url).send() {
            Ok(response) => response,
            Err(e) => {
                warn!("Failed to validate PIC {}: {}", pic, e);
                return Ok(Collected::Exists(false));
            }
        };

        let status = response.status();
        let known = if status.is_success() {
            true
        } else if status.is_redirection() {
            let location = response
                .headers()
                .get(LOCATION)
                .and_then(|v| v.to_str().ok())
                .unwrap_or("");
            !location.contains("search")
        } else {
            false
        };
        debug!("PIC {} -> {} (known: {})", pic, status.as_u16(), known);
        Ok(Collected::Exists(known))
    }
}
