mod live;
mod podcast;
mod view_data;

pub use live::LiveSummaries;
pub use podcast::PodcastViewModel;
pub use view_data::{
    EpisodeViewData, PodcastSummaryViewData, PodcastViewData, episodes_to_view, podcast_to_summary,
    podcast_to_view,
};
