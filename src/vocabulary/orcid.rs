//! ORCID registry.

use reqwest::blocking::Client;
use reqwest::header::ACCEPT;
use std::sync::Arc;
use tracing::{debug, warn};

use super::{Collected, ConnectorContext, VocabularyConnector};
use crate::config::VocabularySettings;
use crate::error::Result;
use crate::identifiers::extract_orcid;

const ORCID_PUBLIC_API: &str = "https://pub.orcid.org/v3.0";

/// Checks that a value carries a checksum-valid ORCID iD, then that the
/// public API knows it (`HEAD <api_url>/<orcid>` answers 200).
///
/// With `enable_remote_check = false` only the local shape check runs.
pub struct Orcid {
    settings: VocabularySettings,
    client: Client,
}

impl Orcid {
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

    fn api_base(&self) -> &str {
        self.settings
            .api_url
            .as_deref()
            .unwrap_or(ORCID_PUBLIC_API)
            .trim_end_matches('/')
    }
}

impl VocabularyConnector for Orcid {
    fn name(&self) -> &str {
        "ORCID"
    }

    fn kind(&self) -> &str {
        "orcid"
    }

    fn collect(&self, term: &str) -> Result<Collected> {
        let Some(orcid) = extract_orcid(term) else {
            debug!("'{}' does not carry a valid ORCID iD", term);
            return Ok(Collected::Exists(false));
        };

        if !self.settings.enable_remote_check {
            return Ok(Collected::Exists(true));
        }

        let url = format!("{}/{}", self.api_base(), orcid);
        match self.client.head(&url).header(ACCEPT, "application/json").send() {
            Ok(response) => Ok(Collected::Exists(response.status().as_u16() == 200)),
            Err(e) => {
                warn!("Failed to validate ORCID {}: {}", orcid, e);
                Ok(Collected::Exists(false))
            }
        }
    }
}
