//! Identifier scheme detection.
//!
//! Pure string checks used by the validator (persistent-identifier shape
//! checks, ORCID pre-checks) and by the identifier indicators (persistence
//! and uniqueness). No network access happens here.

use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdScheme {
    Doi,
    Handle,
    Ark,
    Purl,
    W3id,
    Urn,
    Orcid,
    Uuid,
    Url,
}

impl IdScheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            IdScheme::Doi => "doi",
            IdScheme::Handle => "handle",
            IdScheme::Ark => "ark",
            IdScheme::Purl => "purl",
            IdScheme::W3id => "w3id",
            IdScheme::Urn => "urn",
            IdScheme::Orcid => "orcid",
            IdScheme::Uuid => "uuid",
            IdScheme::Url => "url",
        }
    }

    /// Schemes backed by a resolver that commits to long-term resolution.
    pub fn is_persistent(&self) -> bool {
        !matches!(self, IdScheme::Uuid | IdScheme::Url)
    }
}

const DOI_PREFIXES: &[&str] = &[
    "doi:",
    "https://doi.org/",
    "http://doi.org/",
    "https://dx.doi.org/",
    "http://dx.doi.org/",
];

const HANDLE_PREFIXES: &[&str] = &["hdl:", "https://hdl.handle.net/", "http://hdl.handle.net/"];

fn strip_any_prefix<'a>(value: &'a str, prefixes: &[&str]) -> &'a str {
    let lower = value.to_ascii_lowercase();
    for prefix in prefixes {
        if lower.starts_with(prefix) {
            return &value[prefix.len()..];
        }
    }
    value
}

/// `<digits>(.<digits>)*/<non-empty suffix>`
fn is_handle_syntax(value: &str) -> bool {
    let Some((prefix, suffix)) = value.split_once('/') else {
        return false;
    };
    !suffix.trim().is_empty()
        && !prefix.is_empty()
        && prefix
            .split('.')
            .all(|part| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit()))
}

/// Bare DOI (`10.1234/abc`) from a DOI written in any common form.
pub fn doi_str(value: &str) -> Option<&str> {
    let bare = strip_any_prefix(value.trim(), DOI_PREFIXES);
    (bare.starts_with("10.") && is_handle_syntax(bare)).then_some(bare)
}

/// Bare handle (`20.500.12345/678`) from a handle written in any common form.
pub fn handle_str(value: &str) -> Option<&str> {
    let bare = strip_any_prefix(value.trim(), HANDLE_PREFIXES);
    is_handle_syntax(bare).then_some(bare)
}

fn url_host(value: &str) -> Option<&str> {
    let rest = value
        .strip_prefix("https://")
        .or_else(|| value.strip_prefix("http://"))?;
    let host = rest.split(['/', '?', '#']).next().unwrap_or("");
    let host = host.rsplit('@').next().unwrap_or(host);
    let host = host.split(':').next().unwrap_or(host);
    (!host.is_empty() && (host.contains('.') || host == "localhost")).then_some(host)
}

/// ISO 7064 MOD 11-2 check character over the first 15 digits.
fn orcid_check_char(digits: &[u8]) -> char {
    let total = digits
        .iter()
        .fold(0u32, |acc, d| (acc + u32::from(d - b'0')) * 2);
    match (12 - total % 11) % 11 {
        10 => 'X',
        n => char::from(b'0' + n as u8),
    }
}

fn orcid_at(bytes: &[u8]) -> bool {
    if bytes.len() < 19 {
        return false;
    }
    let mut digits = Vec::with_capacity(16);
    for (i, &b) in bytes[..19].iter().enumerate() {
        if i % 5 == 4 {
            if b != b'-' {
                return false;
            }
        } else if i == 18 {
            if !(b.is_ascii_digit() || b == b'X' || b == b'x') {
                return false;
            }
        } else if b.is_ascii_digit() {
            digits.push(b);
        } else {
            return false;
        }
    }
    let check = bytes[18].to_ascii_uppercase() as char;
    orcid_check_char(&digits) == check
}

/// Find a checksum-valid ORCID iD (`0000-0002-1825-0097`) inside `value`.
///
/// Accepts bare iDs, `orcid.org` URLs and repository values that append
/// extra path segments (`https://orcid.org/0000-.../Contact`).
pub fn extract_orcid(value: &str) -> Option<String> {
    let bytes = value.as_bytes();
    (0..bytes.len().saturating_sub(18))
        .find(|&start| {
            let boundary_before = start == 0 || !bytes[start - 1].is_ascii_digit();
            let boundary_after = bytes
                .get(start + 19)
                .map_or(true, |b| !b.is_ascii_alphanumeric());
            boundary_before && boundary_after && orcid_at(&bytes[start..])
        })
        .map(|start| value[start..start + 19].to_ascii_uppercase())
}

pub fn check_orcid(value: &str) -> bool {
    extract_orcid(value).is_some()
}

fn is_orcid(value: &str) -> bool {
    match extract_orcid(value) {
        Some(id) => {
            value.eq_ignore_ascii_case(&id)
                || url_host(value).is_some_and(|h| h.ends_with("orcid.org"))
        }
        None => false,
    }
}

fn is_uuid(value: &str) -> bool {
    let bare = strip_any_prefix(value, &["urn:uuid:"]);
    Uuid::parse_str(bare).is_ok()
}

fn is_ark(value: &str) -> bool {
    let lower = value.to_ascii_lowercase();
    let tail = match lower.find("ark:") {
        Some(idx) if idx == 0 || url_host(value).is_some() => &lower[idx + 4..],
        _ => return false,
    };
    let tail = tail.trim_start_matches('/');
    tail.split('/').next().is_some_and(|naan| {
        !naan.is_empty() && naan.bytes().all(|b| b.is_ascii_alphanumeric())
    }) && tail.contains('/')
}

fn is_urn(value: &str) -> bool {
    let lower = value.to_ascii_lowercase();
    let Some(rest) = lower.strip_prefix("urn:") else {
        return false;
    };
    match rest.split_once(':') {
        Some((nid, nss)) => {
            !nid.is_empty()
                && nid.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-')
                && !nss.is_empty()
        }
        None => false,
    }
}

/// Every scheme `value` conforms to, most specific first.
pub fn detect_schemes(value: &str) -> Vec<IdScheme> {
    let value = value.trim();
    let mut schemes = Vec::new();
    if value.is_empty() {
        return schemes;
    }

    if doi_str(value).is_some() {
        schemes.push(IdScheme::Doi);
    }
    if handle_str(value).is_some() {
        schemes.push(IdScheme::Handle);
    }
    if is_ark(value) {
        schemes.push(IdScheme::Ark);
    }
    if is_orcid(value) {
        schemes.push(IdScheme::Orcid);
    }
    if is_urn(value) {
        schemes.push(IdScheme::Urn);
    }
    if is_uuid(value) {
        schemes.push(IdScheme::Uuid);
    }
    if let Some(host) = url_host(value) {
        let host = host.to_ascii_lowercase();
        if host == "purl.org" || host.starts_with("purl.") {
            schemes.push(IdScheme::Purl);
        }
        if host == "w3id.org" {
            schemes.push(IdScheme::W3id);
        }
        schemes.push(IdScheme::Url);
    }
    schemes
}

/// Whether `value` is resolvable through a persistent-identifier system.
pub fn is_persistent_id(value: &str) -> bool {
    detect_schemes(value).iter().any(IdScheme::is_persistent)
}

/// Whether `value` is globally unique: any persistent identifier, a UUID or
/// a resolvable URL.
pub fn is_unique_id(value: &str) -> bool {
    !detect_schemes(value).is_empty()
}

/// Generic persistent-identifier shape check used for connection terms.
pub fn validate_any_pid(value: &str) -> bool {
    is_persistent_id(value)
}

/// Contents of the first `[...]` group, or the whole value when there is none.
pub fn between_brackets(value: &str) -> &str {
    match (value.find('['), value.find(']')) {
        (Some(start), Some(end)) if start < end => &value[start + 1..end],
        _ => value,
    }
}
