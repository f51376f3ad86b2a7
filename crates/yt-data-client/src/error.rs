use thiserror::Error;

/// Errors raised by YouTube Data API calls
#[derive(Debug, Error)]
pub enum YouTubeError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status
    #[error("YouTube API returned status {status} for {resource}: {body}")]
    Status {
        resource: &'static str,
        status: u16,
        body: String,
    },

    /// The credentials are valid but no channel belongs to them
    #[error("No channel is associated with these credentials")]
    NoChannel,

    #[error("Channel '{0}' not found or has no uploads playlist")]
    NoUploadsPlaylist(String),

    /// A per-video statistics lookup failed while ranking uploads
    #[error("Failed to fetch statistics for video '{video_id}': {source}")]
    Statistics {
        video_id: String,
        #[source]
        source: Box<YouTubeError>,
    },

    #[error("Video '{0}' not found")]
    VideoNotFound(String),

    #[error("Missing {0} in API response")]
    MissingField(&'static str),
}
