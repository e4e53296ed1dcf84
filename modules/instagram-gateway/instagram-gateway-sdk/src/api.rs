//! Public API trait for the Instagram gateway.
//!
//! One method per use case. Front ends hold an `Arc<dyn InstagramGatewayApi>`
//! and turn the typed results into whatever envelope their protocol needs.

use async_trait::async_trait;

use crate::error::{GatewayError, PublishFailure};
use crate::models::{
    AccountInsight, Conversation, FacebookPage, InsightMetric, InsightPeriod, MediaInsight,
    MediaPage, Message, Profile, PublishMediaRequest, PublishMediaResponse, RateLimitInfo,
    SendMessageRequest, SendMessageResponse,
};

#[async_trait]
pub trait InstagramGatewayApi: Send + Sync {
    /// Business profile of `account_id`, or of the configured account when `None`.
    async fn get_profile(&self, account_id: Option<String>) -> Result<Profile, GatewayError>;

    /// Recent media of an account. `limit` is clamped to the remote maximum.
    async fn list_media(
        &self,
        account_id: Option<String>,
        limit: u32,
        after: Option<String>,
    ) -> Result<MediaPage, GatewayError>;

    /// Insights of one post. An empty `metrics` slice requests the defaults.
    async fn get_media_insights(
        &self,
        media_id: String,
        metrics: Vec<InsightMetric>,
    ) -> Result<Vec<MediaInsight>, GatewayError>;

    /// Account-level insights. An empty `metrics` list requests the defaults.
    async fn get_account_insights(
        &self,
        account_id: Option<String>,
        metrics: Vec<String>,
        period: InsightPeriod,
    ) -> Result<Vec<AccountInsight>, GatewayError>;

    /// Two-phase publish. The failure names the phase it stopped in.
    async fn publish_media(
        &self,
        request: PublishMediaRequest,
    ) -> Result<PublishMediaResponse, PublishFailure>;

    /// Facebook pages connected to the token's user.
    async fn list_pages(&self) -> Result<Vec<FacebookPage>, GatewayError>;

    /// Direct-message conversations of a page; the first connected page when `None`.
    async fn list_conversations(
        &self,
        page_id: Option<String>,
        limit: u32,
    ) -> Result<Vec<Conversation>, GatewayError>;

    async fn list_messages(
        &self,
        conversation_id: String,
        limit: u32,
    ) -> Result<Vec<Message>, GatewayError>;

    async fn send_message(
        &self,
        request: SendMessageRequest,
    ) -> Result<SendMessageResponse, GatewayError>;

    /// `Ok(false)` when the remote rejects the token or cannot be reached.
    async fn validate_token(&self) -> Result<bool, GatewayError>;

    fn rate_limit_info(&self) -> RateLimitInfo;
}
