// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A podcast as known to the repository
///
/// `id` is assigned by the store when the podcast is saved; a podcast fresh
/// from its feed has no id, which is how "not subscribed" is represented.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Podcast {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub feed_url: String,
    pub feed_title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feed_desc: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub last_updated: DateTime<Utc>,
    #[serde(default)]
    pub episodes: Vec<Episode>,
}

/// A single episode, owned by its podcast
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Episode {
    pub guid: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub media_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
}

impl Podcast {
    /// Whether the podcast has been saved to the store
    pub fn is_subscribed(&self) -> bool {
        self.id.is_some()
    }
}
