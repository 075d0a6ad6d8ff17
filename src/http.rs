//! Shared blocking HTTP client and bounded redirect following.
//!
//! Connectors never let reqwest follow redirects on its own: the
//! redirect-checking vocabularies need to see every hop so that the chain can
//! be bounded by `http.max_redirects`.

use reqwest::blocking::Client;
use reqwest::header::LOCATION;
use reqwest::redirect::Policy;
use reqwest::Url;
use std::time::Duration;
use tracing::debug;

use crate::config::HttpConfig;
use crate::error::{Error, Result};

/// Build the client every connector in a registry shares.
pub fn build_client(http: &HttpConfig) -> Result<Client> {
    let client = Client::builder()
        .timeout(Duration::from_secs(http.timeout_secs))
        .user_agent(http.user_agent.clone())
        .redirect(Policy::none())
        .build()?;
    Ok(client)
}

pub(crate) fn parse_url(url: &str) -> Result<Url> {
    Url::parse(url).map_err(|e| Error::InvalidUrl {
        url: url.to_string(),
        reason: e.to_string(),
    })
}

/// HEAD `url` and follow 3xx responses until a terminal status.
///
/// Returns the final status code. A 3xx without a `Location` header is
/// terminal. More than `max_redirects` hops is an error.
pub fn follow_redirects(client: &Client, url: &str, max_redirects: usize) -> Result<u16> {
    let mut current = parse_url(url)?;
    let mut hops = 0;

    loop {
        let response = client.head(current.clone()).send()?;
        let status = response.status();
        debug!("HEAD {} -> {}", current, status.as_u16());

        if !status.is_redirection() {
            return Ok(status.as_u16());
        }

        let Some(location) = response
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
        else {
            return Ok(status.as_u16());
        };

        if hops == max_redirects {
            return Err(Error::TooManyRedirects {
                url: url.to_string(),
                limit: max_redirects,
            });
        }
        hops += 1;

        current = current.join(location).map_err(|e| Error::InvalidUrl {
            url: location.to_string(),
            reason: e.to_string(),
        })?;
    }
}

/// Whether a redirect chain starting at `url` ends in exactly HTTP 200.
///
/// Network failures and an exceeded bound both count as "no".
pub fn resolves_ok(client: &Client, url: &str, max_redirects: usize) -> bool {
    match follow_redirects(client, url, max_redirects) {
        Ok(status) => status == 200,
        Err(e) => {
            debug!("Redirect check for {} failed: {}", url, e);
            false
        }
    }
}
