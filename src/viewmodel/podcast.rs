// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::sync::Arc;

use log::{debug, warn};
use tokio::sync::watch;

use crate::dates::DateFormatter;
use crate::model::Podcast;
use crate::repository::SharedRepository;
use crate::scope::Scope;

use super::live::LiveSummaries;
use super::view_data::{
    PodcastSummaryViewData, PodcastViewData, podcast_to_summary, podcast_to_view,
};

/// View state behind the podcast detail and subscription list screens
///
/// Holds the podcast currently shown in detail (the "active" podcast), the
/// published detail view for it, and the memoized live summary list. The
/// repository may be attached after construction; until then every
/// operation that needs it behaves as a miss.
///
/// One owner drives an instance: operations that touch state take `&mut self`.
pub struct PodcastViewModel {
    repository: Option<SharedRepository>,
    formatter: Arc<dyn DateFormatter>,
    scope: Scope,
    podcast_view: watch::Sender<Option<PodcastViewData>>,
    live_summaries: Option<LiveSummaries>,
    active_podcast: Option<Podcast>,
}

impl PodcastViewModel {
    pub fn new(scope: Scope, formatter: Arc<dyn DateFormatter>) -> Self {
        let (podcast_view, _) = watch::channel(None);
        Self {
            repository: None,
            formatter,
            scope,
            podcast_view,
            live_summaries: None,
            active_podcast: None,
        }
    }

    pub fn with_repository(mut self, repository: SharedRepository) -> Self {
        self.attach_repository(repository);
        self
    }

    pub fn attach_repository(&mut self, repository: SharedRepository) {
        self.repository = Some(repository);
    }

    /// Observable detail view; `None` means nothing (valid) is selected
    pub fn podcast_view(&self) -> watch::Receiver<Option<PodcastViewData>> {
        self.podcast_view.subscribe()
    }

    /// The podcast that save and delete act on
    pub fn active_podcast(&self) -> Option<&Podcast> {
        self.active_podcast.as_ref()
    }

    /// Show the podcast behind a summary row
    ///
    /// The summary's name and image replace the stored ones, so a title
    /// picked from search results is shown while the feed is confirmed.
    /// Any failure publishes `None`.
    ///
    /// A failed load leaves the previous active podcast in place, so a
    /// following `persist_active` or `delete_active` still targets it.
    pub async fn load_active_from_summary(&mut self, summary: &PodcastSummaryViewData) {
        let Some(feed_url) = summary.feed_url.as_deref().filter(|url| !url.is_empty()) else {
            debug!("summary has no feed URL, clearing podcast view");
            self.podcast_view.send_replace(None);
            return;
        };

        let Some(lookup) = self.scope.run(self.lookup(feed_url)).await else {
            debug!("scope cancelled while loading {}", feed_url);
            return;
        };

        match lookup {
            Some(mut podcast) => {
                podcast.feed_title = summary.name.clone().unwrap_or_default();
                podcast.image_url = summary.image_url.clone();
                self.publish_active(podcast);
            }
            None => {
                self.podcast_view.send_replace(None);
            }
        }
    }

    /// Make the podcast at `feed_url` active, returning its summary
    ///
    /// On a miss nothing is published and the current view stays as it is.
    pub async fn set_active_by_url(&mut self, feed_url: &str) -> Option<PodcastSummaryViewData> {
        self.repository.as_ref()?;

        let podcast = self.scope.run(self.lookup(feed_url)).await??;
        let summary = podcast_to_summary(&podcast, self.formatter.as_ref());
        self.publish_active(podcast);
        Some(summary)
    }

    /// The live list of saved podcasts as summaries
    ///
    /// The first call starts the mapping pipeline; later calls hand out the
    /// same handle. Returns `None` while no repository is attached.
    ///
    /// # Panics
    ///
    /// Starting the pipeline spawns a task, so the first call with a
    /// repository attached must happen inside a Tokio runtime.
    pub fn observe_all_summaries(&mut self) -> Option<LiveSummaries> {
        let repository = self.repository.as_ref()?;

        let live = self.live_summaries.get_or_insert_with(|| {
            debug!("starting podcast summary pipeline");
            LiveSummaries::start(repository.get_all(), self.formatter.clone(), &self.scope)
        });
        Some(live.clone())
    }

    /// Save the active podcast. Failures are logged, not returned.
    pub async fn persist_active(&self) {
        let (Some(repository), Some(podcast)) = (&self.repository, &self.active_podcast) else {
            return;
        };

        match self.scope.run(repository.save(podcast)).await {
            Some(Err(e)) => warn!("failed to save '{}': {}", podcast.feed_title, e),
            Some(Ok(())) => debug!("saved '{}'", podcast.feed_title),
            None => {}
        }
    }

    /// Delete the active podcast. Failures are logged, not returned.
    pub async fn delete_active(&self) {
        let (Some(repository), Some(podcast)) = (&self.repository, &self.active_podcast) else {
            return;
        };

        match self.scope.run(repository.delete(podcast)).await {
            Some(Err(e)) => warn!("failed to delete '{}': {}", podcast.feed_title, e),
            Some(Ok(())) => debug!("deleted '{}'", podcast.feed_title),
            None => {}
        }
    }

    /// Repository lookup with errors folded into absence
    async fn lookup(&self, feed_url: &str) -> Option<Podcast> {
        let repository = self.repository.as_ref()?;
        match repository.get_podcast(feed_url).await {
            Ok(podcast) => podcast,
            Err(e) => {
                warn!("failed to load podcast {}: {}", feed_url, e);
                None
            }
        }
    }

    fn publish_active(&mut self, podcast: Podcast) {
        self.podcast_view
            .send_replace(Some(podcast_to_view(&podcast)));
        self.active_podcast = Some(podcast);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};

    use crate::dates::ShortDateFormatter;
    use crate::error::{RepositoryError, StoreError};
    use crate::model::Episode;
    use crate::repository::PodcastRepository;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Get(String),
        Save(String),
        Delete(String),
    }

    struct MockRepository {
        podcasts: Mutex<Vec<Podcast>>,
        all: watch::Sender<Vec<Podcast>>,
        calls: Mutex<Vec<Call>>,
        fail_writes: bool,
    }

    impl MockRepository {
        fn new(podcasts: Vec<Podcast>) -> Arc<Self> {
            let (all, _) = watch::channel(podcasts.clone());
            Arc::new(Self {
                podcasts: Mutex::new(podcasts),
                all,
                calls: Mutex::new(vec![]),
                fail_writes: false,
            })
        }

        fn failing_writes(podcasts: Vec<Podcast>) -> Arc<Self> {
            let (all, _) = watch::channel(podcasts.clone());
            Arc::new(Self {
                podcasts: Mutex::new(podcasts),
                all,
                calls: Mutex::new(vec![]),
                fail_writes: true,
            })
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }

        fn remove(&self, feed_url: &str) {
            self.podcasts
                .lock()
                .unwrap()
                .retain(|p| p.feed_url != feed_url);
        }

        fn write_error() -> RepositoryError {
            RepositoryError::Store(StoreError::WriteFailed {
                path: "/dev/full".into(),
                source: std::io::Error::other("disk full"),
            })
        }
    }

    #[async_trait]
    impl PodcastRepository for MockRepository {
        async fn get_podcast(&self, feed_url: &str) -> Result<Option<Podcast>, RepositoryError> {
            self.calls
                .lock()
                .unwrap()
                .push(Call::Get(feed_url.to_string()));
            Ok(self
                .podcasts
                .lock()
                .unwrap()
                .iter()
                .find(|p| p.feed_url == feed_url)
                .cloned())
        }

        fn get_all(&self) -> watch::Receiver<Vec<Podcast>> {
            self.all.subscribe()
        }

        async fn save(&self, podcast: &Podcast) -> Result<(), RepositoryError> {
            self.calls
                .lock()
                .unwrap()
                .push(Call::Save(podcast.feed_url.clone()));
            if self.fail_writes {
                return Err(Self::write_error());
            }
            Ok(())
        }

        async fn delete(&self, podcast: &Podcast) -> Result<(), RepositoryError> {
            self.calls
                .lock()
                .unwrap()
                .push(Call::Delete(podcast.feed_url.clone()));
            if self.fail_writes {
                return Err(Self::write_error());
            }
            Ok(())
        }
    }

    /// Repository whose lookups never finish
    struct StalledRepository;

    #[async_trait]
    impl PodcastRepository for StalledRepository {
        async fn get_podcast(&self, _feed_url: &str) -> Result<Option<Podcast>, RepositoryError> {
            futures::future::pending().await
        }

        fn get_all(&self) -> watch::Receiver<Vec<Podcast>> {
            watch::channel(vec![]).1
        }

        async fn save(&self, _podcast: &Podcast) -> Result<(), RepositoryError> {
            Ok(())
        }

        async fn delete(&self, _podcast: &Podcast) -> Result<(), RepositoryError> {
            Ok(())
        }
    }

    const FEED_A: &str = "https://a.example/feed.xml";
    const FEED_B: &str = "https://b.example/feed.xml";

    fn make_episode(guid: &str) -> Episode {
        Episode {
            guid: guid.to_string(),
            title: format!("Episode {}", guid),
            description: Some(format!("About {}", guid)),
            media_url: format!("https://cdn.example/{}.mp3", guid),
            release_date: None,
            duration: Some("10:00".to_string()),
        }
    }

    fn make_podcast(feed_url: &str, title: &str, id: Option<i64>) -> Podcast {
        Podcast {
            id,
            feed_url: feed_url.to_string(),
            feed_title: title.to_string(),
            feed_desc: Some(format!("{} description", title)),
            image_url: Some(format!("{}/stored.png", feed_url)),
            last_updated: Utc.with_ymd_and_hms(2024, 2, 3, 4, 5, 6).unwrap(),
            episodes: vec![make_episode("e1"), make_episode("e2"), make_episode("e3")],
        }
    }

    fn summary_for(feed_url: Option<&str>) -> PodcastSummaryViewData {
        PodcastSummaryViewData {
            name: Some("Search Title".to_string()),
            last_updated: Some("1/1/24".to_string()),
            image_url: Some("https://search.example/art.jpg".to_string()),
            feed_url: feed_url.map(String::from),
        }
    }

    fn view_model(repo: Arc<MockRepository>) -> PodcastViewModel {
        PodcastViewModel::new(Scope::new(), Arc::new(ShortDateFormatter)).with_repository(repo)
    }

    #[tokio::test]
    async fn load_from_summary_overlays_title_and_image() {
        let repo = MockRepository::new(vec![make_podcast(FEED_A, "Stored Title", Some(3))]);
        let mut vm = view_model(repo);
        let view = vm.podcast_view();

        vm.load_active_from_summary(&summary_for(Some(FEED_A))).await;

        let published = view.borrow().clone().unwrap();
        assert_eq!(published.feed_title, "Search Title");
        assert_eq!(published.image_url, "https://search.example/art.jpg");
        assert_eq!(published.feed_url, FEED_A);
        assert_eq!(published.feed_desc, "Stored Title description");
        assert!(published.subscribed);
        assert_eq!(published.episodes.len(), 3);

        let active = vm.active_podcast().unwrap();
        assert_eq!(active.feed_url, published.feed_url);
        assert_eq!(active.feed_title, "Search Title");
    }

    #[tokio::test]
    async fn load_from_summary_with_missing_name_uses_empty_title() {
        let repo = MockRepository::new(vec![make_podcast(FEED_A, "Stored", None)]);
        let mut vm = view_model(repo);
        let mut summary = summary_for(Some(FEED_A));
        summary.name = None;
        summary.image_url = None;

        vm.load_active_from_summary(&summary).await;

        let published = vm.podcast_view().borrow().clone().unwrap();
        assert_eq!(published.feed_title, "");
        assert_eq!(published.image_url, "");
        assert!(!published.subscribed);
    }

    #[tokio::test]
    async fn load_from_summary_without_url_publishes_none_and_skips_repository() {
        let repo = MockRepository::new(vec![make_podcast(FEED_A, "Stored", Some(1))]);
        let mut vm = view_model(repo.clone());
        vm.load_active_from_summary(&summary_for(Some(FEED_A))).await;
        let mut view = vm.podcast_view();

        vm.load_active_from_summary(&summary_for(None)).await;
        assert!(view.borrow_and_update().is_none());

        vm.load_active_from_summary(&summary_for(Some(""))).await;
        assert!(view.borrow().is_none());

        assert_eq!(repo.calls(), vec![Call::Get(FEED_A.to_string())]);
    }

    #[tokio::test]
    async fn failed_load_clears_view_but_keeps_active_podcast() {
        let repo = MockRepository::new(vec![make_podcast(FEED_A, "Stored", Some(1))]);
        let mut vm = view_model(repo.clone());
        vm.load_active_from_summary(&summary_for(Some(FEED_A))).await;

        vm.load_active_from_summary(&summary_for(Some(FEED_B))).await;

        assert!(vm.podcast_view().borrow().is_none());
        // The stale podcast is still the save/delete target
        assert_eq!(vm.active_podcast().unwrap().feed_url, FEED_A);
        vm.persist_active().await;
        assert_eq!(repo.calls().last(), Some(&Call::Save(FEED_A.to_string())));
    }

    #[tokio::test]
    async fn load_without_repository_publishes_none() {
        let mut vm = PodcastViewModel::new(Scope::new(), Arc::new(ShortDateFormatter));

        vm.load_active_from_summary(&summary_for(Some(FEED_A))).await;

        assert!(vm.podcast_view().borrow().is_none());
        assert!(vm.active_podcast().is_none());
    }

    #[tokio::test]
    async fn set_active_by_url_publishes_and_returns_summary() {
        let repo = MockRepository::new(vec![make_podcast(FEED_B, "Bee Cast", Some(9))]);
        let mut vm = view_model(repo);

        let summary = vm.set_active_by_url(FEED_B).await.unwrap();

        assert_eq!(summary.name.as_deref(), Some("Bee Cast"));
        assert_eq!(summary.last_updated.as_deref(), Some("2/3/24"));
        assert_eq!(summary.feed_url.as_deref(), Some(FEED_B));

        let published = vm.podcast_view().borrow().clone().unwrap();
        assert_eq!(published.feed_title, "Bee Cast");
        assert_eq!(vm.active_podcast().unwrap().feed_url, FEED_B);
    }

    #[tokio::test]
    async fn set_active_by_url_miss_leaves_view_untouched() {
        let repo = MockRepository::new(vec![make_podcast(FEED_A, "Stored", Some(1))]);
        let mut vm = view_model(repo);
        vm.set_active_by_url(FEED_A).await.unwrap();
        let view = vm.podcast_view();

        assert!(vm.set_active_by_url(FEED_B).await.is_none());

        assert!(!view.has_changed().unwrap());
        assert_eq!(view.borrow().as_ref().unwrap().feed_url, FEED_A);
        assert_eq!(vm.active_podcast().unwrap().feed_url, FEED_A);
    }

    #[tokio::test]
    async fn set_active_by_url_replaces_active_podcast() {
        let repo = MockRepository::new(vec![
            make_podcast(FEED_A, "A", Some(1)),
            make_podcast(FEED_B, "B", Some(2)),
        ]);
        let mut vm = view_model(repo);

        vm.set_active_by_url(FEED_A).await.unwrap();
        vm.set_active_by_url(FEED_B).await.unwrap();

        assert_eq!(vm.active_podcast().unwrap().feed_url, FEED_B);
        assert_eq!(
            vm.podcast_view().borrow().as_ref().unwrap().feed_url,
            FEED_B
        );
    }

    #[tokio::test]
    async fn observe_all_summaries_is_memoized() {
        let repo = MockRepository::new(vec![make_podcast(FEED_A, "A", Some(1))]);
        let mut vm = view_model(repo);

        let first = vm.observe_all_summaries().unwrap();
        let second = vm.observe_all_summaries().unwrap();

        assert!(first.ptr_eq(&second));
        assert_eq!(first.current().len(), 1);
    }

    #[tokio::test]
    async fn observe_all_summaries_follows_repository_updates() {
        let repo = MockRepository::new(vec![]);
        let mut vm = view_model(repo.clone());
        let mut rx = vm.observe_all_summaries().unwrap().subscribe();

        repo.all.send_replace(vec![
            make_podcast(FEED_A, "A", Some(1)),
            make_podcast(FEED_B, "B", Some(2)),
        ]);

        tokio::time::timeout(Duration::from_secs(1), rx.changed())
            .await
            .unwrap()
            .unwrap();
        let names: Vec<Option<String>> =
            rx.borrow_and_update().iter().map(|s| s.name.clone()).collect();
        assert_eq!(names, vec![Some("A".to_string()), Some("B".to_string())]);
    }

    #[tokio::test]
    async fn observe_all_summaries_without_repository_is_none() {
        let mut vm = PodcastViewModel::new(Scope::new(), Arc::new(ShortDateFormatter));
        assert!(vm.observe_all_summaries().is_none());
    }

    #[test]
    #[should_panic]
    fn observe_all_summaries_outside_runtime_panics() {
        let mut vm = view_model(MockRepository::new(vec![]));
        vm.observe_all_summaries();
    }

    #[tokio::test]
    async fn persist_and_delete_without_active_podcast_are_noops() {
        let repo = MockRepository::new(vec![make_podcast(FEED_A, "A", None)]);
        let vm = view_model(repo.clone());

        vm.persist_active().await;
        vm.delete_active().await;

        assert!(repo.calls().is_empty());
    }

    #[tokio::test]
    async fn persist_and_delete_target_active_podcast() {
        let repo = MockRepository::new(vec![make_podcast(FEED_A, "A", None)]);
        let mut vm = view_model(repo.clone());
        vm.set_active_by_url(FEED_A).await.unwrap();

        vm.persist_active().await;
        vm.delete_active().await;

        assert_eq!(
            repo.calls(),
            vec![
                Call::Get(FEED_A.to_string()),
                Call::Save(FEED_A.to_string()),
                Call::Delete(FEED_A.to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn write_failures_are_swallowed() {
        let repo = MockRepository::failing_writes(vec![make_podcast(FEED_A, "A", None)]);
        let mut vm = view_model(repo.clone());
        vm.set_active_by_url(FEED_A).await.unwrap();

        vm.persist_active().await;
        vm.delete_active().await;

        assert_eq!(repo.calls().len(), 3);
        assert_eq!(vm.active_podcast().unwrap().feed_url, FEED_A);
    }

    #[tokio::test]
    async fn repository_miss_after_removal_clears_view() {
        let repo = MockRepository::new(vec![make_podcast(FEED_A, "A", Some(1))]);
        let mut vm = view_model(repo.clone());
        vm.load_active_from_summary(&summary_for(Some(FEED_A))).await;

        repo.remove(FEED_A);
        vm.load_active_from_summary(&summary_for(Some(FEED_A))).await;

        assert!(vm.podcast_view().borrow().is_none());
    }

    #[tokio::test]
    async fn cancelled_scope_drops_in_flight_load() {
        let scope = Scope::new();
        let mut vm = PodcastViewModel::new(scope.clone(), Arc::new(ShortDateFormatter))
            .with_repository(Arc::new(StalledRepository));
        let view = vm.podcast_view();

        let canceller = scope.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            canceller.cancel();
        });

        tokio::time::timeout(
            Duration::from_secs(1),
            vm.load_active_from_summary(&summary_for(Some(FEED_A))),
        )
        .await
        .unwrap();

        assert!(!view.has_changed().unwrap());
        assert!(vm.active_podcast().is_none());
        assert!(vm.set_active_by_url(FEED_A).await.is_none());
    }
}
