// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use bytes::Bytes;
use log::debug;
use url::Url;

use crate::error::FeedError;
use crate::http::HttpClient;
use crate::model::Podcast;

use super::parse::parse_feed;

/// Fetch raw feed bytes from a URL (without parsing)
pub async fn fetch_feed_bytes<C: HttpClient + ?Sized>(
    client: &C,
    url: &str,
) -> Result<Bytes, FeedError> {
    debug!("fetching feed {}", url);
    let bytes = client
        .get_bytes(url)
        .await
        .map_err(|e| FeedError::FetchFailed {
            url: url.to_string(),
            source: e,
        })?;
    debug!("fetched {} bytes from {}", bytes.len(), url);
    Ok(bytes)
}

/// Fetch and parse a podcast feed from a URL
///
/// The returned podcast has no id: it is not in the store yet.
pub async fn fetch_feed<C: HttpClient + ?Sized>(
    client: &C,
    url: &str,
) -> Result<Podcast, FeedError> {
    // Validate before touching the network
    Url::parse(url)?;
    let bytes = fetch_feed_bytes(client, url).await?;
    parse_feed(&bytes, url)
}
