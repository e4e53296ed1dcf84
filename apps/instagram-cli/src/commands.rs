use clap::{Subcommand, ValueEnum};
use instagram_gateway_sdk::{
    InsightMetric, InsightPeriod, InstagramGatewayApi, PublishMediaRequest, SendMessageRequest,
};
use serde::Serialize;
use serde_json::Value;

#[derive(Clone, Copy, ValueEnum)]
pub enum Metric {
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

impl From<Metric> for InsightMetric {
    fn from(metric: Metric) -> Self {
        match metric {
            Metric::Impressions => Self::Impressions,
            Metric::Reach => Self::Reach,
            Metric::Likes => Self::Likes,
            Metric::Comments => Self::Comments,
            Metric::Shares => Self::Shares,
            Metric::Saved => Self::Saved,
            Metric::VideoViews => Self::VideoViews,
            Metric::ProfileVisits => Self::ProfileVisits,
            Metric::WebsiteClicks => Self::WebsiteClicks,
        }
    }
}

#[derive(Clone, Copy, Default, ValueEnum)]
pub enum Period {
    #[default]
    Day,
    Week,
    Days28,
    Lifetime,
}

impl From<Period> for InsightPeriod {
    fn from(period: Period) -> Self {
        match period {
            Period::Day => Self::Day,
            Period::Week => Self::Week,
            Period::Days28 => Self::Days28,
            Period::Lifetime => Self::Lifetime,
        }
    }
}

#[derive(Subcommand)]
pub enum Command {
    /// Show the business account profile
    Profile {
        #[arg(long)]
        account_id: Option<String>,
    },
    /// List recent media, newest first
    Media {
        #[arg(long)]
        account_id: Option<String>,
        #[arg(long, default_value_t = 25)]
        limit: u32,
        /// Cursor returned as `after` by a previous page
        #[arg(long)]
        after: Option<String>,
    },
    /// Insights for one post
    MediaInsights {
        media_id: String,
        #[arg(long = "metric", value_enum)]
        metrics: Vec<Metric>,
    },
    /// Account-level insights
    AccountInsights {
        #[arg(long)]
        account_id: Option<String>,
        #[arg(long = "metric")]
        metrics: Vec<String>,
        #[arg(long, value_enum, default_value_t = Period::Day)]
        period: Period,
    },
    /// Publish an image or a video
    Publish {
        #[arg(long, conflicts_with = "video_url")]
        image_url: Option<String>,
        #[arg(long)]
        video_url: Option<String>,
        #[arg(long)]
        caption: Option<String>,
        #[arg(long)]
        location_id: Option<String>,
    },
    /// Facebook pages connected to the token
    Pages,
    /// Direct-message conversations of a page
    Conversations {
        #[arg(long)]
        page_id: Option<String>,
        #[arg(long, default_value_t = 25)]
        limit: u32,
    },
    /// Messages in one conversation
    Messages {
        conversation_id: String,
        #[arg(long, default_value_t = 25)]
        limit: u32,
    },
    /// Send a text message
    Send {
        recipient_id: String,
        text: String,
    },
    /// Check that the access token is accepted
    ValidateToken,
    /// Show the local call budget
    RateLimit,
}

fn to_json<T: Serialize>(value: &T) -> anyhow::Result<Value> {
    Ok(serde_json::to_value(value)?)
}

impl Command {
    pub async fn run(self, api: &dyn InstagramGatewayApi) -> anyhow::Result<Value> {
        match self {
            Self::Profile { account_id } => to_json(&api.get_profile(account_id).await?),
            Self::Media {
                account_id,
                limit,
                after,
            } => to_json(&api.list_media(account_id, limit, after).await?),
            Self::MediaInsights { media_id, metrics } => {
                let metrics = metrics.into_iter().map(InsightMetric::from).collect();
                to_json(&api.get_media_insights(media_id, metrics).await?)
            }
            Self::AccountInsights {
                account_id,
                metrics,
                period,
            } => to_json(
                &api.get_account_insights(account_id, metrics, period.into())
                    .await?,
            ),
            Self::Publish {
                image_url,
                video_url,
                caption,
                location_id,
            } => {
                let request = PublishMediaRequest {
                    image_url,
                    video_url,
                    caption,
                    location_id,
                };
                to_json(&api.publish_media(request).await?)
            }
            Self::Pages => to_json(&api.list_pages().await?),
            Self::Conversations { page_id, limit } => {
                to_json(&api.list_conversations(page_id, limit).await?)
            }
            Self::Messages {
                conversation_id,
                limit,
            } => to_json(&api.list_messages(conversation_id, limit).await?),
            Self::Send { recipient_id, text } => to_json(
                &api.send_message(SendMessageRequest { recipient_id, text })
                    .await?,
            ),
            Self::ValidateToken => {
                Ok(serde_json::json!({ "valid": api.validate_token().await? }))
            }
            Self::RateLimit => to_json(&api.rate_limit_info()),
        }
    }
}
