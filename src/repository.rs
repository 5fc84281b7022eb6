// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, info};
use tokio::sync::watch;

use crate::error::RepositoryError;
use crate::feed::fetch_feed;
use crate::http::HttpClient;
use crate::model::Podcast;
use crate::store::PodcastStore;

/// Source of podcasts for the view layer
///
/// Lookups are asynchronous; the list of all podcasts is a live channel that
/// is updated whenever the underlying store changes.
#[async_trait]
pub trait PodcastRepository: Send + Sync {
    /// Find a podcast by feed URL, returning `None` when it cannot be found
    async fn get_podcast(&self, feed_url: &str) -> Result<Option<Podcast>, RepositoryError>;

    /// Live list of all saved podcasts
    fn get_all(&self) -> watch::Receiver<Vec<Podcast>>;

    /// Save (subscribe to) a podcast
    async fn save(&self, podcast: &Podcast) -> Result<(), RepositoryError>;

    /// Delete (unsubscribe from) a podcast
    async fn delete(&self, podcast: &Podcast) -> Result<(), RepositoryError>;
}

/// A shared reference to a repository
pub type SharedRepository = Arc<dyn PodcastRepository>;

/// Repository backed by the local store, falling back to the podcast's feed
pub struct FeedRepository<C> {
    client: C,
    store: Arc<PodcastStore>,
}

impl<C: HttpClient> FeedRepository<C> {
    pub fn new(client: C, store: Arc<PodcastStore>) -> Self {
        Self { client, store }
    }
}

#[async_trait]
impl<C: HttpClient> PodcastRepository for FeedRepository<C> {
    async fn get_podcast(&self, feed_url: &str) -> Result<Option<Podcast>, RepositoryError> {
        if let Some(podcast) = self.store.find_by_url(feed_url).await {
            debug!("found '{}' in store", podcast.feed_title);
            return Ok(Some(podcast));
        }

        info!("{} is not stored, fetching feed", feed_url);
        let podcast = fetch_feed(&self.client, feed_url).await?;
        Ok(Some(podcast))
    }

    fn get_all(&self) -> watch::Receiver<Vec<Podcast>> {
        self.store.subscribe()
    }

    async fn save(&self, podcast: &Podcast) -> Result<(), RepositoryError> {
        let saved = self.store.save(podcast).await?;
        info!("subscribed to '{}' ({})", saved.feed_title, saved.feed_url);
        Ok(())
    }

    async fn delete(&self, podcast: &Podcast) -> Result<(), RepositoryError> {
        if self.store.delete(&podcast.feed_url).await? {
            info!("unsubscribed from '{}'", podcast.feed_title);
        }
        Ok(())
    }
}
