//! Domain service for the Instagram gateway.
//!
//! Each operation resolves its identifiers, builds the logical requests with
//! the remote field projections, and decodes the payload into SDK models.

use std::sync::Arc;

use instagram_gateway_sdk::{
    AccountInsight, Conversation, FacebookPage, GatewayError, InsightMetric, InsightPeriod,
    MAX_PAGE_LIMIT, MediaInsight, MediaPage, Message, Profile, PublishFailure,
    PublishMediaRequest, PublishMediaResponse, PublishPhase, RateLimitInfo, SendMessageRequest,
    SendMessageResponse,
};
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::instrument;

use super::dispatcher::Dispatcher;
use super::image::ImageValidator;
use super::ports::HttpTransport;
use super::publish::PublishWorkflow;
use super::request::{ApiRequest, Host, PermissionMatch};
use crate::config::GatewayConfig;

pub const PROFILE_FIELDS: &str = "id,username,name,biography,website,profile_picture_url,followers_count,follows_count,media_count";
pub const MEDIA_FIELDS: &str =
    "id,media_type,media_url,permalink,thumbnail_url,caption,timestamp,like_count,comments_count";
pub const PAGE_FIELDS: &str = "id,name,category,instagram_business_account";
pub const CONVERSATION_FIELDS: &str = "id,updated_time,message_count";
pub const MESSAGE_FIELDS: &str = "messages{id,from,to,message,created_time,attachments}";
pub const ACCOUNT_INSIGHT_DEFAULTS: [&str; 3] = ["reach", "profile_views", "website_clicks"];

/// Identifiers and flags the service needs beyond the dispatcher.
#[derive(Debug, Clone, Default)]
pub struct ServiceConfig {
    pub business_account_id: Option<String>,
    pub app_id: Option<String>,
    pub backoff_enabled: bool,
}

impl From<&GatewayConfig> for ServiceConfig {
    fn from(cfg: &GatewayConfig) -> Self {
        Self {
            business_account_id: cfg.business_account_id.clone(),
            app_id: cfg.app_id.clone(),
            backoff_enabled: cfg.rate_limit_enable_backoff,
        }
    }
}

pub struct Service {
    dispatcher: Dispatcher,
    images: ImageValidator,
    config: ServiceConfig,
}

impl Service {
    #[must_use]
    pub fn new(config: &GatewayConfig, transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            dispatcher: Dispatcher::new(config, Arc::clone(&transport)),
            images: ImageValidator::new(transport, config.max_image_bytes),
            config: ServiceConfig::from(config),
        }
    }

    #[must_use]
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    fn account_id(&self, explicit: Option<&str>) -> Result<String, GatewayError> {
        explicit
            .filter(|id| !id.is_empty())
            .or(self.config.business_account_id.as_deref())
            .filter(|id| !id.is_empty())
            .map(str::to_owned)
            .ok_or_else(|| {
                GatewayError::configuration("Instagram business account ID not configured")
            })
    }

    /// # Errors
    /// [`GatewayError::Configuration`] without an account id; otherwise any
    /// classified remote failure.
    #[instrument(skip(self))]
    pub async fn get_profile(&self, account_id: Option<&str>) -> Result<Profile, GatewayError> {
        let account_id = self.account_id(account_id)?;
        let request = ApiRequest::read(Host::Resource, [account_id]).param("fields", PROFILE_FIELDS);
        decode(self.dispatcher.dispatch(&request).await?, "profile")
    }

    /// # Errors
    /// Same as [`Service::get_profile`].
    #[instrument(skip(self))]
    pub async fn list_media(
        &self,
        account_id: Option<&str>,
        limit: u32,
        after: Option<&str>,
    ) -> Result<MediaPage, GatewayError> {
        let account_id = self.account_id(account_id)?;
        let mut request = ApiRequest::read(Host::Resource, [account_id.as_str(), "media"])
            .param("fields", MEDIA_FIELDS)
            .param("limit", clamp_limit(limit).to_string());
        if let Some(after) = after.filter(|cursor| !cursor.is_empty()) {
            request = request.param("after", after);
        }

        let payload = self.dispatcher.dispatch(&request).await?;
        let after = payload
            .pointer("/paging/cursors/after")
            .and_then(serde_json::Value::as_str)
            .map(str::to_owned);
        let items = data_items(payload, "media")?;
        tracing::debug!(count = items.len(), has_more = after.is_some(), "Media listed");
        Ok(MediaPage { items, after })
    }

    /// # Errors
    /// [`GatewayError::Validation`] for an empty media id; otherwise any
    /// classified remote failure.
    #[instrument(skip(self, metrics))]
    pub async fn get_media_insights(
        &self,
        media_id: &str,
        metrics: &[InsightMetric],
    ) -> Result<Vec<MediaInsight>, GatewayError> {
        require("media_id", media_id)?;
        let metrics = if metrics.is_empty() {
            &InsightMetric::MEDIA_DEFAULTS[..]
        } else {
            metrics
        };
        let metric = metrics
            .iter()
            .copied()
            .map(InsightMetric::as_str)
            .collect::<Vec<_>>()
            .join(",");
        let request =
            ApiRequest::read(Host::Resource, [media_id, "insights"]).param("metric", metric);
        data_items(self.dispatcher.dispatch(&request).await?, "media insights")
    }

    /// # Errors
    /// Same as [`Service::get_profile`].
    #[instrument(skip(self, metrics))]
    pub async fn get_account_insights(
        &self,
        account_id: Option<&str>,
        metrics: &[String],
        period: InsightPeriod,
    ) -> Result<Vec<AccountInsight>, GatewayError> {
        let account_id = self.account_id(account_id)?;
        let metric = if metrics.is_empty() {
            ACCOUNT_INSIGHT_DEFAULTS.join(",")
        } else {
            metrics.join(",")
        };
        // Action metrics such as website_clicks are only served as totals.
        let request = ApiRequest::read(Host::Resource, [account_id.as_str(), "insights"])
            .param("metric", metric)
            .param("period", period.as_str())
            .param("metric_type", "total_value");
        data_items(self.dispatcher.dispatch(&request).await?, "account insights")
    }

    /// # Errors
    /// A [`PublishFailure`] naming the phase that failed.
    #[instrument(skip_all)]
    pub async fn publish_media(
        &self,
        request: &PublishMediaRequest,
    ) -> Result<PublishMediaResponse, PublishFailure> {
        let account_id = self
            .account_id(None)
            .map_err(|e| PublishFailure::new(PublishPhase::Precondition, None, e))?;
        let mut workflow = PublishWorkflow::new(&self.dispatcher, &self.images, &account_id);
        workflow.run(request).await
    }

    /// # Errors
    /// Any classified remote failure.
    #[instrument(skip(self))]
    pub async fn list_pages(&self) -> Result<Vec<FacebookPage>, GatewayError> {
        let request = ApiRequest::read(Host::Resource, ["me", "accounts"]).param("fields", PAGE_FIELDS);
        data_items(self.dispatcher.dispatch(&request).await?, "pages")
    }

    /// Without a page id the first connected page is used.
    ///
    /// # Errors
    /// [`GatewayError::Configuration`] when no page is connected; otherwise
    /// any classified remote failure.
    #[instrument(skip(self))]
    pub async fn list_conversations(
        &self,
        page_id: Option<&str>,
        limit: u32,
    ) -> Result<Vec<Conversation>, GatewayError> {
        let page_id = match page_id.filter(|id| !id.is_empty()) {
            Some(id) => id.to_owned(),
            None => self
                .list_pages()
                .await?
                .into_iter()
                .next()
                .map(|page| page.id)
                .ok_or_else(|| {
                    GatewayError::configuration(
                        "No Facebook page is connected to this account; pass a page id",
                    )
                })?,
        };

        let request = ApiRequest::read(Host::Messaging, [page_id.as_str(), "conversations"])
            .param("platform", "instagram")
            .param("fields", CONVERSATION_FIELDS)
            .param("limit", clamp_limit(limit).to_string())
            .uncached();
        let conversations: Vec<Conversation> =
            data_items(self.dispatcher.dispatch(&request).await?, "conversations")?;
        tracing::info!(page_id = %page_id, count = conversations.len(), "Conversations listed");
        Ok(conversations)
    }

    /// # Errors
    /// [`GatewayError::Validation`] for an empty conversation id; otherwise
    /// any classified remote failure.
    #[instrument(skip(self))]
    pub async fn list_messages(
        &self,
        conversation_id: &str,
        limit: u32,
    ) -> Result<Vec<Message>, GatewayError> {
        require("conversation_id", conversation_id)?;
        let request = ApiRequest::read(Host::Messaging, [conversation_id])
            .param("fields", MESSAGE_FIELDS)
            .param("limit", clamp_limit(limit).to_string())
            .uncached();
        let mut payload = self.dispatcher.dispatch(&request).await?;
        let messages = payload
            .get_mut("messages")
            .map(serde_json::Value::take)
            .unwrap_or_else(|| json!({ "data": [] }));
        data_items(messages, "messages")
    }

    /// # Errors
    /// [`GatewayError::Validation`] for an empty recipient or text;
    /// otherwise any classified remote failure. Permission-related messages
    /// are escalated to the advanced-access category.
    #[instrument(skip_all, fields(recipient_id = %request.recipient_id))]
    pub async fn send_message(
        &self,
        request: &SendMessageRequest,
    ) -> Result<SendMessageResponse, GatewayError> {
        require("recipient_id", &request.recipient_id)?;
        require("text", &request.text)?;
        let body = json!({
            "recipient": { "id": request.recipient_id },
            "message": { "text": request.text },
        });
        let send = ApiRequest::write(Host::Messaging, ["me", "messages"], Some(body))
            .with_permission_match(PermissionMatch::Broad);
        let payload = self.dispatcher.dispatch(&send).await?;

        let message_id = payload
            .get("message_id")
            .and_then(serde_json::Value::as_str)
            .unwrap_or_default()
            .to_owned();
        let recipient_id = payload
            .get("recipient_id")
            .and_then(serde_json::Value::as_str)
            .unwrap_or(request.recipient_id.as_str())
            .to_owned();
        tracing::info!(message_id = %message_id, "Message sent");
        Ok(SendMessageResponse {
            message_id,
            recipient_id,
        })
    }

    /// `false` for any failure; never served from cache.
    #[instrument(skip(self))]
    pub async fn validate_token(&self) -> bool {
        let request = ApiRequest::read(Host::Resource, ["me"])
            .param("fields", "id")
            .uncached();
        match self.dispatcher.dispatch(&request).await {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!(category = %e.category(), error = %e, "Access token validation failed");
                false
            }
        }
    }

    #[must_use]
    pub fn rate_limit_info(&self) -> RateLimitInfo {
        let limiter = self.dispatcher.limiter();
        RateLimitInfo {
            app_id: self.config.app_id.clone(),
            capacity: u32::try_from(limiter.capacity()).unwrap_or(u32::MAX),
            period_secs: limiter.period().as_secs(),
            calls_in_window: limiter.calls_in_window(),
            backoff_enabled: self.config.backoff_enabled,
        }
    }
}

fn clamp_limit(limit: u32) -> u32 {
    limit.clamp(1, MAX_PAGE_LIMIT)
}

fn require(field: &str, value: &str) -> Result<(), GatewayError> {
    if value.trim().is_empty() {
        return Err(GatewayError::validation(format!("{field} must not be empty")));
    }
    Ok(())
}

fn decode<T: DeserializeOwned>(payload: serde_json::Value, what: &str) -> Result<T, GatewayError> {
    serde_json::from_value(payload)
        .map_err(|e| GatewayError::invalid_response(format!("unexpected {what} payload: {e}")))
}

/// Items of a `{"data": [...]}` list envelope; a missing `data` is empty.
fn data_items<T: DeserializeOwned>(
    mut payload: serde_json::Value,
    what: &str,
) -> Result<Vec<T>, GatewayError> {
    match payload.get_mut("data").map(serde_json::Value::take) {
        Some(items) => decode(items, what),
        None => Ok(Vec::new()),
    }
}
