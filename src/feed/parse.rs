// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use chrono::{DateTime, Utc};
use log::trace;

use crate::dates::parse_feed_date;
use crate::error::FeedError;
use crate::model::{Episode, Podcast};

/// Parse RSS feed XML bytes into an unsaved Podcast
pub fn parse_feed(xml_bytes: &[u8], feed_url: &str) -> Result<Podcast, FeedError> {
    let channel = rss::Channel::read_from(xml_bytes)?;

    let episodes: Vec<Episode> = channel
        .items()
        .iter()
        .filter_map(|item| match parse_episode(item) {
            Ok(episode) => Some(episode),
            Err(e) => {
                trace!("skipping item in {}: {}", feed_url, e);
                None
            }
        })
        .collect();

    let image_url = channel
        .image()
        .map(|img| img.url().to_string())
        .or_else(|| {
            channel
                .itunes_ext()
                .and_then(|ext| ext.image())
                .map(String::from)
        })
        .filter(|s| !s.is_empty());

    let last_updated = channel_last_updated(&channel, &episodes);

    Ok(Podcast {
        id: None,
        feed_url: feed_url.to_string(),
        feed_title: channel.title().to_string(),
        feed_desc: Some(channel.description().to_string()).filter(|s| !s.is_empty()),
        image_url,
        last_updated,
        episodes,
    })
}

fn parse_episode(item: &rss::Item) -> Result<Episode, FeedError> {
    let title = item
        .title()
        .map(String::from)
        .unwrap_or_else(|| "Untitled Episode".to_string());

    let enclosure = item
        .enclosure()
        .ok_or_else(|| FeedError::MissingEnclosure {
            title: title.clone(),
        })?;

    let guid = item
        .guid()
        .map(|g| g.value().to_string())
        .filter(|g| !g.is_empty())
        .unwrap_or_else(|| enclosure.url().to_string());

    Ok(Episode {
        guid,
        title,
        description: item.description().map(String::from),
        media_url: enclosure.url().to_string(),
        release_date: item.pub_date().and_then(parse_feed_date),
        duration: item
            .itunes_ext()
            .and_then(|ext| ext.duration().map(String::from)),
    })
}

/// Most recent of the channel's own dates, else the newest episode, else now
fn channel_last_updated(channel: &rss::Channel, episodes: &[Episode]) -> DateTime<Utc> {
    channel
        .last_build_date()
        .and_then(parse_feed_date)
        .or_else(|| channel.pub_date().and_then(parse_feed_date))
        .or_else(|| episodes.iter().filter_map(|e| e.release_date).max())
        .unwrap_or_else(Utc::now)
}
