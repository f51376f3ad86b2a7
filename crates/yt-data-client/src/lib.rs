//! Read-only YouTube Data API v3 client.
//!
//! Covers what the draft studio needs from the platform: the signed-in user's
//! channel, the channel's uploads ranked by views, and the description of an
//! arbitrary video used as a style exemplar.

mod error;
mod models;
mod ranking;
mod video_id;

pub use error::YouTubeError;
pub use models::{ChannelRef, PlaylistVideo, VideoSummary};
pub use ranking::rank_by_views;
pub use video_id::extract_video_id;

use models::{Channel, ListResponse, PlaylistItem, Video};
use serde::de::DeserializeOwned;
use tracing::{debug, info};

/// Default REST endpoint, overridable with `REST_API_ADDRESS`
pub const DEFAULT_REST_API_ADDRESS: &str = "https://www.googleapis.com";

/// Returned by [`YouTubeClient::fetch_description`] when the video does not exist
pub const DESCRIPTION_NOT_FOUND: &str = "Description not found";

/// Number of uploads ranked when the caller has no preference
pub const DEFAULT_TOP_LIMIT: usize = 10;

/// Largest page the playlistItems endpoint will return
const MAX_PAGE_SIZE: usize = 50;

enum Auth<'a> {
    /// Public data, authorised with the project's API key
    ApiKey,
    /// The signed-in user's own data
    Bearer(&'a str),
}

#[derive(Debug, Clone)]
pub struct YouTubeClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl YouTubeClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self::with_http_client(reqwest::Client::new(), base_url, api_key)
    }

    pub fn with_http_client(
        http: reqwest::Client,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    async fn get<T: DeserializeOwned>(
        &self,
        resource: &'static str,
        query: &[(&str, &str)],
        auth: Auth<'_>,
    ) -> Result<T, YouTubeError> {
        let url = format!("{}/youtube/v3/{}", self.base_url, resource);
        debug!(resource, "Calling YouTube Data API");

        let mut request = self.http.get(&url).query(query);
        request = match auth {
            Auth::ApiKey => request.query(&[("key", self.api_key.as_str())]),
            Auth::Bearer(token) => request.bearer_auth(token),
        };

        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await?;
            return Err(YouTubeError::Status {
                resource,
                status,
                body,
            });
        }

        Ok(response.json().await?)
    }

    /// Resolve the channel owned by the holder of `access_token`
    pub async fn resolve_own_channel(
        &self,
        access_token: &str,
    ) -> Result<ChannelRef, YouTubeError> {
        let response: ListResponse<Channel> = self
            .get(
                "channels",
                &[("part", "snippet,contentDetails"), ("mine", "true")],
                Auth::Bearer(access_token),
            )
            .await?;

        let channel = response
            .items
            .into_iter()
            .next()
            .ok_or(YouTubeError::NoChannel)?;

        let title = channel
            .snippet
            .map(|s| s.title)
            .ok_or(YouTubeError::MissingField("snippet.title"))?;

        info!(channel_id = %channel.id, "Resolved signed-in channel");
        Ok(ChannelRef {
            id: channel.id,
            title,
        })
    }

    /// Id of the playlist holding every upload of `channel_id`
    pub async fn uploads_playlist_id(&self, channel_id: &str) -> Result<String, YouTubeError> {
        let response: ListResponse<Channel> = self
            .get(
                "channels",
                &[("part", "contentDetails"), ("id", channel_id)],
                Auth::ApiKey,
            )
            .await?;

        response
            .items
            .into_iter()
            .next()
            .and_then(|c| c.content_details)
            .and_then(|cd| cd.related_playlists.uploads)
            .ok_or_else(|| YouTubeError::NoUploadsPlaylist(channel_id.to_string()))
    }

    /// Page through a playlist until `limit` videos are collected or the playlist ends
    pub async fn playlist_videos(
        &self,
        playlist_id: &str,
        limit: usize,
    ) -> Result<Vec<PlaylistVideo>, YouTubeError> {
        let mut videos = Vec::new();
        let mut page_token: Option<String> = None;

        while videos.len() < limit {
            let page_size = (limit - videos.len()).min(MAX_PAGE_SIZE).to_string();
            let mut query = vec![
                ("part", "snippet,contentDetails"),
                ("playlistId", playlist_id),
                ("maxResults", page_size.as_str()),
            ];
            if let Some(ref token) = page_token {
                query.push(("pageToken", token.as_str()));
            }

            let response: ListResponse<PlaylistItem> =
                self.get("playlistItems", &query, Auth::ApiKey).await?;

            for item in response.items {
                let (Some(snippet), Some(details)) = (item.snippet, item.content_details) else {
                    continue;
                };
                videos.push(PlaylistVideo {
                    id: details.video_id,
                    title: snippet.title,
                });
                if videos.len() == limit {
                    break;
                }
            }

            match response.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        Ok(videos)
    }

    /// Current view count of one video
    pub async fn view_count(&self, video_id: &str) -> Result<u64, YouTubeError> {
        let response: ListResponse<Video> = self
            .get(
                "videos",
                &[("part", "statistics"), ("id", video_id)],
                Auth::ApiKey,
            )
            .await?;

        let video = response
            .items
            .into_iter()
            .next()
            .ok_or_else(|| YouTubeError::VideoNotFound(video_id.to_string()))?;

        video
            .statistics
            .and_then(|s| s.view_count)
            .ok_or(YouTubeError::MissingField("statistics.viewCount"))?
            .parse()
            .map_err(|_| YouTubeError::MissingField("numeric statistics.viewCount"))
    }

    /// The channel's most viewed uploads among its latest `limit`, most viewed first.
    ///
    /// Statistics are fetched one video at a time. If any of them fails the whole
    /// ranking fails with [`YouTubeError::Statistics`].
    pub async fn list_top_items(
        &self,
        channel_id: &str,
        limit: usize,
    ) -> Result<Vec<VideoSummary>, YouTubeError> {
        let playlist_id = self.uploads_playlist_id(channel_id).await?;
        let uploads = self.playlist_videos(&playlist_id, limit).await?;

        let mut summaries = Vec::with_capacity(uploads.len());
        for upload in uploads {
            let view_count = self.view_count(&upload.id).await.map_err(|e| {
                YouTubeError::Statistics {
                    video_id: upload.id.clone(),
                    source: Box::new(e),
                }
            })?;
            summaries.push(VideoSummary {
                id: upload.id,
                title: upload.title,
                view_count,
            });
        }

        info!(channel_id, count = summaries.len(), "Ranked channel uploads");
        Ok(rank_by_views(summaries))
    }

    /// Description of a video, or [`DESCRIPTION_NOT_FOUND`] when no video has this id
    pub async fn fetch_description(&self, video_id: &str) -> Result<String, YouTubeError> {
        let response: ListResponse<Video> = self
            .get(
                "videos",
                &[("part", "snippet"), ("id", video_id)],
                Auth::ApiKey,
            )
            .await?;

        Ok(response
            .items
            .into_iter()
            .next()
            .and_then(|v| v.snippet)
            .map(|s| s.description)
            .unwrap_or_else(|| DESCRIPTION_NOT_FOUND.to_string()))
    }
}
