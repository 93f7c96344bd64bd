// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::path::Path;

use url::Url;

use crate::error::CatalogError;
use crate::http::HttpClient;

use super::model::Podcast;

/// Parse catalog JSON bytes into the show list.
///
/// Accepts either an array of shows or a single show object.
pub fn parse_catalog(bytes: &[u8]) -> Result<Vec<Podcast>, CatalogError> {
    match serde_json::from_slice::<Vec<Podcast>>(bytes) {
        Ok(podcasts) => Ok(podcasts),
        Err(_) => {
            let single: Podcast = serde_json::from_slice(bytes)?;
            Ok(vec![single])
        }
    }
}

/// Fetch and parse the catalog from a URL
pub async fn fetch_catalog<C: HttpClient>(
    client: &C,
    url: &str,
) -> Result<Vec<Podcast>, CatalogError> {
    Url::parse(url)?;
    let bytes = client
        .get_bytes(url)
        .await
        .map_err(|e| CatalogError::FetchFailed {
            url: url.to_string(),
            source: e,
        })?;
    parse_catalog(&bytes)
}

/// Parse the catalog from a local JSON file
pub fn read_catalog_file(path: &Path) -> Result<Vec<Podcast>, CatalogError> {
    let bytes = std::fs::read(path).map_err(|e| CatalogError::FileReadFailed {
        path: path.to_path_buf(),
        source: e,
    })?;
    parse_catalog(&bytes)
}

/// Determine if a string is a URL or a file path
pub fn is_url(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}
