use crate::VideoSummary;

/// Order videos by view count, most viewed first.
///
/// The sort is stable: videos with equal counts keep their upload-list order.
pub fn rank_by_views(mut videos: Vec<VideoSummary>) -> Vec<VideoSummary> {
    videos.sort_by(|a, b| b.view_count.cmp(&a.view_count));
    videos
}
