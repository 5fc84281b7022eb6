// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use chrono::{DateTime, Utc};

use crate::dates::DateFormatter;
use crate::model::{Episode, Podcast};

/// List row for a podcast, as shown in search results and the subscription list
///
/// Every field is optional because search results may omit any of them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PodcastSummaryViewData {
    pub name: Option<String>,
    pub last_updated: Option<String>,
    pub image_url: Option<String>,
    pub feed_url: Option<String>,
}

/// Everything the detail screen shows for one podcast
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PodcastViewData {
    pub subscribed: bool,
    pub feed_title: String,
    pub feed_url: String,
    pub feed_desc: String,
    pub image_url: String,
    pub episodes: Vec<EpisodeViewData>,
}

/// One row of the detail screen's episode list
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EpisodeViewData {
    pub guid: String,
    pub title: String,
    pub description: String,
    pub media_url: String,
    pub release_date: Option<DateTime<Utc>>,
    pub duration: String,
}

pub fn podcast_to_view(podcast: &Podcast) -> PodcastViewData {
    PodcastViewData {
        subscribed: podcast.id.is_some(),
        feed_title: podcast.feed_title.clone(),
        feed_url: podcast.feed_url.clone(),
        feed_desc: podcast.feed_desc.clone().unwrap_or_default(),
        image_url: podcast.image_url.clone().unwrap_or_default(),
        episodes: episodes_to_view(&podcast.episodes),
    }
}

pub fn podcast_to_summary(
    podcast: &Podcast,
    formatter: &dyn DateFormatter,
) -> PodcastSummaryViewData {
    PodcastSummaryViewData {
        name: Some(podcast.feed_title.clone()),
        last_updated: Some(formatter.short_date(podcast.last_updated)),
        image_url: podcast.image_url.clone(),
        feed_url: Some(podcast.feed_url.clone()),
    }
}

/// Map episodes one-to-one, keeping their order
pub fn episodes_to_view(episodes: &[Episode]) -> Vec<EpisodeViewData> {
    episodes
        .iter()
        .map(|episode| EpisodeViewData {
            guid: episode.guid.clone(),
            title: episode.title.clone(),
            description: episode.description.clone().unwrap_or_default(),
            media_url: episode.media_url.clone(),
            release_date: episode.release_date,
            duration: episode.duration.clone().unwrap_or_default(),
        })
        .collect()
}
