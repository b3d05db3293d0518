use std::time::Duration;
use reqwest::blocking::Client;
use crate::error::{CatalogError, CatalogResult};
use crate::util::local_path;

/// Retrieves the document behind `url`.
///
/// `http://` and `https://` URLs are downloaded, going through `proxy` when
/// one is configured. `file://` URLs and bare paths are read from disk.
///
/// # Errors
///
/// Returns [`CatalogError::Fetch`] if the document cannot be retrieved or the
/// server answers with a non-success status.
///
/// # Example
///
/// ```no_run
/// use layman::fetch::retrieve;
///
/// let body = retrieve("https://example.org/repositories.json", None).unwrap();
/// assert!(!body.is_empty());
/// ```
pub fn retrieve(url: &str, proxy: Option<&str>) -> CatalogResult<Vec<u8>> {
    if let Some(path) = local_path(url) {
        log::debug!("Reading {} from disk", path.display());
        return std::fs::read(&path).map_err(|e| fetch_error(url, e));
    }

    let client = build_client(proxy).map_err(|e| fetch_error(url, e))?;
    log::debug!("Downloading {}", url);
    let response = client.get(url).send().map_err(|e| fetch_error(url, e))?;
    if !response.status().is_success() {
        return Err(CatalogError::Fetch {
            url: url.to_string(),
            message: format!("server returned {}", response.status()),
        });
    }
    let body = response.bytes().map_err(|e| fetch_error(url, e))?;
    Ok(body.to_vec())
}

fn build_client(proxy: Option<&str>) -> reqwest::Result<Client> {
    let mut builder = Client::builder()
        .user_agent(concat!("layman/", env!("CARGO_PKG_VERSION")))
        .connect_timeout(Duration::from_secs(30));
    if let Some(proxy) = proxy.filter(|proxy| !proxy.is_empty()) {
        builder = builder.proxy(reqwest::Proxy::all(proxy)?);
    }
    builder.build()
}

fn fetch_error(url: &str, error: impl std::fmt::Display) -> CatalogError {
    CatalogError::Fetch {
        url: url.to_string(),
        message: error.to_string(),
    }
}
