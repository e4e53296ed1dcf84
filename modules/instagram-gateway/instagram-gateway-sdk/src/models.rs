//! Typed values returned by the gateway operations.
//!
//! Field names follow the remote JSON so the types deserialize directly from
//! the success payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::GatewayError;

/// Maximum caption length accepted by the remote publish endpoint.
pub const MAX_CAPTION_CHARS: usize = 2200;

/// Upper bound the remote API applies to list page sizes.
pub const MAX_PAGE_LIMIT: u32 = 100;

/// Business profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub biography: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub profile_picture_url: Option<String>,
    #[serde(default)]
    pub followers_count: Option<u64>,
    #[serde(default)]
    pub follows_count: Option<u64>,
    #[serde(default)]
    pub media_count: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MediaType {
    Image,
    Video,
    CarouselAlbum,
}

/// A published post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Media {
    pub id: String,
    pub media_type: MediaType,
    #[serde(default)]
    pub media_url: Option<String>,
    #[serde(default)]
    pub permalink: Option<String>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub caption: Option<String>,
    #[serde(default, with = "graph_time")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub like_count: Option<u64>,
    #[serde(default)]
    pub comments_count: Option<u64>,
}

/// One page of media with the cursor for the next page, if any.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MediaPage {
    pub items: Vec<Media>,
    pub after: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightMetric {
    Impressions,
    Reach,
    Likes,
    Comments,
    Shares,
    Saved,
    VideoViews,
    ProfileVisits,
    WebsiteClicks,
}

impl InsightMetric {
    /// Metrics requested for a post when the caller names none.
    pub const MEDIA_DEFAULTS: [Self; 5] = [
        Self::Reach,
        Self::Likes,
        Self::Comments,
        Self::Shares,
        Self::Saved,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Impressions => "impressions",
            Self::Reach => "reach",
            Self::Likes => "likes",
            Self::Comments => "comments",
            Self::Shares => "shares",
            Self::Saved => "saved",
            Self::VideoViews => "video_views",
            Self::ProfileVisits => "profile_visits",
            Self::WebsiteClicks => "website_clicks",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightPeriod {
    #[default]
    Day,
    Week,
    Days28,
    Lifetime,
}

impl InsightPeriod {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Week => "week",
            Self::Days28 => "days_28",
            Self::Lifetime => "lifetime",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaInsight {
    pub name: String,
    pub period: String,
    #[serde(default)]
    pub values: Vec<serde_json::Value>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Account-level insight; the remote returns either a time series in
/// `values` or an aggregate in `total_value` depending on the metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountInsight {
    pub name: String,
    pub period: String,
    #[serde(default)]
    pub values: Option<Vec<serde_json::Value>>,
    #[serde(default)]
    pub total_value: Option<serde_json::Value>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountRef {
    pub id: String,
}

/// Facebook page connected to the account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacebookPage {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub instagram_business_account: Option<AccountRef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: String,
    #[serde(default, with = "graph_time")]
    pub updated_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub message_count: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub id: String,
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Participants {
    #[serde(default)]
    pub data: Vec<Participant>,
}

/// Direct message inside a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    #[serde(default)]
    pub from: Option<Participant>,
    #[serde(default)]
    pub to: Option<Participants>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default, with = "graph_time")]
    pub created_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub attachments: Option<serde_json::Value>,
}

/// The single media reference a publish request carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaSource {
    Image(String),
    Video(String),
}

impl MediaSource {
    #[must_use]
    pub fn url(&self) -> &str {
        match self {
            Self::Image(url) | Self::Video(url) => url,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PublishMediaRequest {
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub video_url: Option<String>,
    #[serde(default)]
    pub caption: Option<String>,
    #[serde(default)]
    pub location_id: Option<String>,
}

impl PublishMediaRequest {
    /// Resolve the media reference and check the caption length.
    ///
    /// # Errors
    /// Returns [`GatewayError::Validation`] when both or neither media URLs are
    /// set, a URL is not absolute http(s), or the caption is too long.
    pub fn validate(&self) -> Result<MediaSource, GatewayError> {
        let source = match (&self.image_url, &self.video_url) {
            (Some(image), None) => MediaSource::Image(image.clone()),
            (None, Some(video)) => MediaSource::Video(video.clone()),
            (None, None) => {
                return Err(GatewayError::validation(
                    "either image_url or video_url is required",
                ));
            }
            (Some(_), Some(_)) => {
                return Err(GatewayError::validation(
                    "only one of image_url or video_url may be set",
                ));
            }
        };

        let url = source.url();
        if !(url.starts_with("https://") || url.starts_with("http://")) {
            return Err(GatewayError::validation(format!(
                "media URL must be an absolute http(s) URL: {url}"
            )));
        }

        if let Some(caption) = &self.caption {
            let chars = caption.chars().count();
            if chars > MAX_CAPTION_CHARS {
                return Err(GatewayError::validation(format!(
                    "caption is {chars} characters; the limit is {MAX_CAPTION_CHARS}"
                )));
            }
        }

        Ok(source)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishMediaResponse {
    /// Id of the published media object.
    pub id: String,
    /// Id of the container that was committed.
    pub container_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendMessageRequest {
    pub recipient_id: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendMessageResponse {
    pub message_id: String,
    pub recipient_id: String,
}

/// Snapshot of the client-side call budget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RateLimitInfo {
    pub app_id: Option<String>,
    pub capacity: u32,
    pub period_secs: u64,
    /// Calls admitted within the trailing window at the time of the snapshot.
    pub calls_in_window: usize,
    /// Reported as configured; the gateway itself never backs off or retries.
    pub backoff_enabled: bool,
}

/// Remote timestamps come as `2024-01-01T12:00:00+0000`, which is not RFC 3339.
mod graph_time {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    // serde's `with` contract fixes this signature.
    #[allow(clippy::ref_option)]
    pub fn serialize<S>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(ts) => serializer.serialize_str(&ts.to_rfc3339()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let Some(raw) = Option::<String>::deserialize(deserializer)? else {
            return Ok(None);
        };
        DateTime::parse_from_rfc3339(&raw)
            .or_else(|_| DateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%z"))
            .map(|ts| Some(ts.with_timezone(&Utc)))
            .map_err(|e| serde::de::Error::custom(format!("invalid timestamp '{raw}': {e}")))
    }
}
