//! SPDX license list.
//!
//! The list is downloaded (or read from the local cache) once per connector
//! and memoized for the life of the registry. Lookups normalize the value
//! first, so `MIT`, `SPDX:MIT`, `https://spdx.org/licenses/MIT.html` and the
//! list's `detailsUrl` all match the same entry.

use reqwest::blocking::Client;
use reqwest::header::ACCEPT;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use tracing::{debug, warn};

use super::{Collected, ConnectorContext, VocabularyConnector};
use crate::config::VocabularySettings;
use crate::error::{Error, Result};

const SPDX_LICENSES_URL: &str = "https://spdx.org/licenses/licenses.json";

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpdxLicense {
    pub license_id: String,
    #[serde(default)]
    pub reference: String,
    #[serde(default)]
    pub details_url: String,
    #[serde(default)]
    pub is_deprecated_license_id: bool,
}

#[derive(Deserialize)]
struct LicenseList {
    licenses: Vec<SpdxLicense>,
}

/// Reduce a license value to a bare SPDX-style id.
///
/// Only spdx.org URLs are reduced to their last path segment; any other
/// value with a path yields an empty id. Then strips `.html`/`.json`
/// extensions and `SPDX:`/`LicenseRef-` prefixes.
pub fn normalize_license(value: &str) -> String {
    let value = value.trim().trim_end_matches('/');
    let last = if value.contains('/') {
        match spdx_url_segment(value) {
            Some(segment) => segment,
            None => return String::new(),
        }
    } else {
        value
    };
    let last = last
        .strip_suffix(".html")
        .or_else(|| last.strip_suffix(".json"))
        .unwrap_or(last);
    let last = last.strip_prefix("SPDX:").unwrap_or(last);
    let last = last.strip_prefix("LicenseRef-").unwrap_or(last);
    last.trim().to_string()
}

/// Last path segment of an `spdx.org` URL (scheme optional).
fn spdx_url_segment(value: &str) -> Option<&str> {
    let rest = value
        .strip_prefix("https://")
        .or_else(|| value.strip_prefix("http://"))
        .unwrap_or(value);
    let (host, path) = rest.split_once('/')?;
    let host = host.strip_prefix("www.").unwrap_or(host);
    if !host.eq_ignore_ascii_case("spdx.org") {
        return None;
    }
    path.rsplit('/').next().filter(|segment| !segment.is_empty())
}

fn same_url(a: &str, b: &str) -> bool {
    fn strip(u: &str) -> &str {
        u.trim()
            .trim_start_matches("https://")
            .trim_start_matches("http://")
            .trim_end_matches('/')
    }
    !a.trim().is_empty() && strip(a).eq_ignore_ascii_case(strip(b))
}

impl SpdxLicense {
    pub fn matches(&self, value: &str) -> bool {
        let id = normalize_license(value);
        (!id.is_empty() && self.license_id.eq_ignore_ascii_case(&id))
            || same_url(value, &self.reference)
            || same_url(value, &self.details_url)
    }
}

/// Find the SPDX entry a license value refers to.
pub fn find_license<'a>(licenses: &'a [SpdxLicense], value: &str) -> Option<&'a SpdxLicense> {
    licenses.iter().find(|license| license.matches(value))
}

pub struct SpdxLicenses {
    settings: VocabularySettings,
    client: Client,
    local_path: Option<PathBuf>,
    index: OnceLock<Vec<SpdxLicense>>,
}

impl SpdxLicenses {
    pub fn factory(
        _id: &str,
        settings: &VocabularySettings,
        ctx: &ConnectorContext,
    ) -> Arc<dyn VocabularyConnector> {
        Arc::new(Self::new(settings, ctx))
    }

    pub fn new(settings: &VocabularySettings, ctx: &ConnectorContext) -> Self {
        Self {
            settings: settings.clone(),
            client: ctx.client.clone(),
            local_path: ctx.local_path(settings),
            index: OnceLock::new(),
        }
    }

    fn remote_url(&self) -> &str {
        if self.settings.remote_path.trim().is_empty() {
            SPDX_LICENSES_URL
        } else {
            &self.settings.remote_path
        }
    }

    fn fetch_remote(&self) -> Result<Vec<SpdxLicense>> {
        let response = self
            .client
            .get(self.remote_url())
            .header(ACCEPT, "application/json")
            .send()?
            .error_for_status()?;
        let list: LicenseList = response.json()?;
        Ok(list.licenses)
    }

    fn read_local(path: &Path) -> Result<Vec<SpdxLicense>> {
        let content = std::fs::read_to_string(path)?;
        let list: LicenseList = serde_json::from_str(&content)?;
        Ok(list.licenses)
    }

    fn load(&self) -> Result<Vec<SpdxLicense>> {
        if self.settings.enable_remote_check {
            match self.fetch_remote() {
                Ok(licenses) if !licenses.is_empty() => return Ok(licenses),
                Ok(_) => warn!("SPDX license list at {} is empty", self.remote_url()),
                Err(e) => warn!("Could not download SPDX license list: {}", e),
            }
        }
        match &self.local_path {
            Some(path) => {
                debug!("Reading SPDX license list from {}", path.display());
                Self::read_local(path)
            }
            None => Err(Error::vocabulary(
                self.name(),
                "license list unavailable and no local_path configured",
            )),
        }
    }

    /// The memoized license list, loading it on first use.
    ///
    /// Failed loads are not memoized.
    pub fn licenses(&self) -> Result<&[SpdxLicense]> {
        if let Some(licenses) = self.index.get() {
            return Ok(licenses.as_slice());
        }
        let loaded = self.load()?;
        debug!("Loaded {} SPDX licenses", loaded.len());
        Ok(self.index.get_or_init(|| loaded).as_slice())
    }
}

impl VocabularyConnector for SpdxLicenses {
    fn name(&self) -> &str {
        "SPDX License List"
    }

    fn kind(&self) -> &str {
        "spdx"
    }

    fn collect(&self, term: &str) -> Result<Collected> {
        let found = find_license(self.licenses()?, term);
        if let Some(license) = found {
            debug!("'{}' matches SPDX license {}", term, license.license_id);
        }
        Ok(Collected::Exists(found.is_some()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CacheConfig, HttpConfig};

    const LIST: &str = r#"{"licenseListVersion": "3.24", "licenses": [
        {"reference": "https://spdx.org/licenses/CC-BY-4.0.html", "isDeprecatedLicenseId": false,
         "detailsUrl": "https://spdx.org/licenses/CC-BY-4.0.json", "licenseId": "CC-BY-4.0"},
        {"reference": "https://spdx.org/licenses/MIT.html", "isDeprecatedLicenseId": false,
         "detailsUrl": "https://spdx.org/licenses/MIT.json", "licenseId": "MIT"}
    ]}"#;

    #[test]
    fn normalization() {
        assert_eq!(normalize_license("https://spdx.org/licenses/CC-BY-4.0.html"), "CC-BY-4.0");
        assert_eq!(normalize_license("SPDX:MIT"), "MIT");
        assert_eq!(normalize_license("LicenseRef-MIT"), "MIT");
        assert_eq!(normalize_license(" MIT "), "MIT");
        assert_eq!(normalize_license("https://www.spdx.org/licenses/MIT/"), "MIT");
    }

    #[test]
    fn foreign_url_is_not_a_license_id() {
        assert_eq!(normalize_license("https://example.org/MIT"), "");
        assert_eq!(normalize_license("https://example.org/licenses/MIT.html"), "");

        let list: LicenseList = serde_json::from_str(LIST).unwrap();
        assert!(find_license(&list.licenses, "https://example.org/MIT").is_none());
        assert!(find_license(&list.licenses, "https://spdx.org/licenses/MIT").is_some());
    }

    #[test]
    fn matching_forms() {
        let list: LicenseList = serde_json::from_str(LIST).unwrap();
        assert!(find_license(&list.licenses, "cc-by-4.0").is_some());
        assert!(find_license(&list.licenses, "http://spdx.org/licenses/MIT.json").is_some());
        assert!(find_license(&list.licenses, "Creative Commons Attribution").is_none());
        assert!(find_license(&list.licenses, "").is_none());
    }

    #[test]
    fn local_list_is_memoized() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("licenses.json");
        std::fs::write(&path, LIST).unwrap();

        let ctx = ConnectorContext::new(
            &HttpConfig::default(),
            &CacheConfig {
                root: dir.path().to_path_buf(),
            },
        )
        .unwrap();
        let settings = VocabularySettings {
            enable_remote_check: false,
            local_path: Some(PathBuf::from("licenses.json")),
            ..VocabularySettings::default()
        };
        let spdx = SpdxLicenses::new(&settings, &ctx);

        assert!(spdx.collect("MIT").unwrap().is_match());
        std::fs::remove_file(&path).unwrap();
        assert!(spdx.collect("https://spdx.org/licenses/CC-BY-4.0.html").unwrap().is_match());
        assert!(!spdx.collect("GPL-3.0-only").unwrap().is_match());
    }

    #[test]
    fn missing_list_is_an_error() {
        let ctx = ConnectorContext::new(&HttpConfig::default(), &CacheConfig::default()).unwrap();
        let settings = VocabularySettings {
            enable_remote_check: false,
            ..VocabularySettings::default()
        };
        assert!(SpdxLicenses::new(&settings, &ctx).collect("MIT").is_err());
    }
}
