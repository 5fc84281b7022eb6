// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::sync::Arc;

use futures::Stream;
use log::{debug, trace};
use tokio::sync::watch;

use crate::dates::DateFormatter;
use crate::model::Podcast;
use crate::scope::Scope;

use super::view_data::{PodcastSummaryViewData, podcast_to_summary};

/// Handle to the continuously updated list of podcast summaries
///
/// Clones share one pipeline: the list is re-mapped once per upstream update
/// and fanned out to every receiver.
#[derive(Clone, Debug)]
pub struct LiveSummaries {
    tx: Arc<watch::Sender<Vec<PodcastSummaryViewData>>>,
}

impl LiveSummaries {
    /// Start mapping `upstream` into summaries on a task owned by `scope`
    ///
    /// # Panics
    ///
    /// Panics when called outside a Tokio runtime.
    pub(super) fn start(
        mut upstream: watch::Receiver<Vec<Podcast>>,
        formatter: Arc<dyn DateFormatter>,
        scope: &Scope,
    ) -> Self {
        let initial = map_all(&upstream.borrow_and_update(), formatter.as_ref());
        let (tx, _) = watch::channel(initial);
        let tx = Arc::new(tx);

        let pipeline_tx = tx.clone();
        scope.spawn(async move {
            while upstream.changed().await.is_ok() {
                let summaries = map_all(&upstream.borrow_and_update(), formatter.as_ref());
                trace!("republishing {} podcast summaries", summaries.len());
                pipeline_tx.send_replace(summaries);
            }
            debug!("podcast list closed, summary pipeline finished");
        });

        Self { tx }
    }

    /// A receiver that observes every future update
    pub fn subscribe(&self) -> watch::Receiver<Vec<PodcastSummaryViewData>> {
        self.tx.subscribe()
    }

    /// Snapshot of the latest list
    pub fn current(&self) -> Vec<PodcastSummaryViewData> {
        self.tx.borrow().clone()
    }

    /// Whether both handles refer to the same pipeline
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.tx, &other.tx)
    }

    /// The current list followed by every later update
    pub fn into_stream(self) -> impl Stream<Item = Vec<PodcastSummaryViewData>> + Send + 'static {
        let rx = self.tx.subscribe();
        futures::stream::unfold((rx, true), |(mut rx, first)| async move {
            if !first && rx.changed().await.is_err() {
                return None;
            }
            let summaries = rx.borrow_and_update().clone();
            Some((summaries, (rx, false)))
        })
    }
}

fn map_all(podcasts: &[Podcast], formatter: &dyn DateFormatter) -> Vec<PodcastSummaryViewData> {
    podcasts
        .iter()
        .map(|podcast| podcast_to_summary(podcast, formatter))
        .collect()
}
