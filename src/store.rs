// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::path::{Path, PathBuf};

use log::{debug, info};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, watch};

use crate::error::StoreError;
use crate::model::Podcast;

/// On-disk layout of the store file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct StoreFile {
    next_id: i64,
    podcasts: Vec<Podcast>,
}

impl StoreFile {
    fn allocate_id(&mut self) -> i64 {
        self.next_id = self.next_id.max(1);
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn sort(&mut self) {
        self.podcasts
            .sort_by_key(|podcast| podcast.feed_title.to_lowercase());
    }
}

/// Persistent set of subscribed podcasts
///
/// Every mutation rewrites the JSON file and publishes the full list,
/// ordered by title, to everyone holding a receiver from [`PodcastStore::subscribe`].
pub struct PodcastStore {
    path: Option<PathBuf>,
    state: Mutex<StoreFile>,
    live: watch::Sender<Vec<Podcast>>,
}

impl PodcastStore {
    /// Open the store at `path`, starting empty if the file does not exist yet
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let mut file = read_store_file(&path).await?;
        file.sort();
        info!(
            "opened podcast store {} ({} podcasts)",
            path.display(),
            file.podcasts.len()
        );
        Ok(Self::from_file(Some(path), file))
    }

    /// A store that never touches the disk
    pub fn in_memory() -> Self {
        Self::from_file(None, StoreFile::default())
    }

    fn from_file(path: Option<PathBuf>, file: StoreFile) -> Self {
        let (live, _) = watch::channel(file.podcasts.clone());
        Self {
            path,
            state: Mutex::new(file),
            live,
        }
    }

    /// Live view of all stored podcasts
    pub fn subscribe(&self) -> watch::Receiver<Vec<Podcast>> {
        self.live.subscribe()
    }

    /// Look up a stored podcast by its feed URL
    pub async fn find_by_url(&self, feed_url: &str) -> Option<Podcast> {
        self.state
            .lock()
            .await
            .podcasts
            .iter()
            .find(|podcast| podcast.feed_url == feed_url)
            .cloned()
    }

    /// Insert a podcast, or replace the one with the same feed URL
    ///
    /// A podcast without an id gets the next free one, unless it replaces an
    /// existing entry, in which case that entry's id is kept.
    pub async fn save(&self, podcast: &Podcast) -> Result<Podcast, StoreError> {
        let mut state = self.state.lock().await;
        let mut next = state.clone();

        let existing = next
            .podcasts
            .iter()
            .position(|p| p.feed_url == podcast.feed_url);

        let mut saved = podcast.clone();
        if saved.id.is_none() {
            saved.id = match existing {
                Some(index) => next.podcasts[index].id,
                None => None,
            };
        }
        if saved.id.is_none() {
            saved.id = Some(next.allocate_id());
        }

        match existing {
            Some(index) => next.podcasts[index] = saved.clone(),
            None => next.podcasts.push(saved.clone()),
        }
        next.sort();

        self.commit(&mut state, next).await?;
        debug!("saved podcast '{}' as id {:?}", saved.feed_title, saved.id);
        Ok(saved)
    }

    /// Remove the podcast with the given feed URL, returning whether one was removed
    pub async fn delete(&self, feed_url: &str) -> Result<bool, StoreError> {
        let mut state = self.state.lock().await;
        let mut next = state.clone();

        let before = next.podcasts.len();
        next.podcasts.retain(|p| p.feed_url != feed_url);
        if next.podcasts.len() == before {
            return Ok(false);
        }

        self.commit(&mut state, next).await?;
        debug!("deleted podcast {}", feed_url);
        Ok(true)
    }

    /// Write `next` to disk, then make it the current state and publish it
    async fn commit(&self, state: &mut StoreFile, next: StoreFile) -> Result<(), StoreError> {
        if let Some(path) = &self.path {
            write_store_file(path, &next).await?;
        }
        *state = next;
        self.live.send_replace(state.podcasts.clone());
        Ok(())
    }
}

async fn read_store_file(path: &Path) -> Result<StoreFile, StoreError> {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(StoreFile::default()),
        Err(e) => {
            return Err(StoreError::ReadFailed {
                path: path.to_path_buf(),
                source: e,
            });
        }
    };

    serde_json::from_str(&content).map_err(|e| StoreError::JsonParseFailed {
        path: path.to_path_buf(),
        source: e,
    })
}

async fn write_store_file(path: &Path, file: &StoreFile) -> Result<(), StoreError> {
    let json = serde_json::to_string_pretty(file)?;
    tokio::fs::write(path, json)
        .await
        .map_err(|e| StoreError::WriteFailed {
            path: path.to_path_buf(),
            source: e,
        })
}
