pub mod dates;
pub mod error;
pub mod feed;
pub mod http;
pub mod model;
pub mod repository;
pub mod scope;
pub mod store;
pub mod viewmodel;

// Re-export main types for convenience
pub use dates::{DateFormatter, ShortDateFormatter, parse_feed_date};
pub use error::{FeedError, RepositoryError, StoreError};
pub use feed::{fetch_feed, parse_feed};
pub use http::{HttpClient, ReqwestClient};
pub use model::{Episode, Podcast};
pub use repository::{FeedRepository, PodcastRepository, SharedRepository};
pub use scope::Scope;
pub use store::PodcastStore;
pub use viewmodel::{
    EpisodeViewData, LiveSummaries, PodcastSummaryViewData, PodcastViewData, PodcastViewModel,
};
