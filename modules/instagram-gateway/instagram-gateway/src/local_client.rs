//! Local client adapter implementing the SDK API trait.
//!
//! Bridges the domain service to [`InstagramGatewayApi`] so front ends can
//! hold the gateway as a trait object.

use std::sync::Arc;

use async_trait::async_trait;
use instagram_gateway_sdk::{
    AccountInsight, Conversation, FacebookPage, GatewayError, InsightMetric, InsightPeriod,
    InstagramGatewayApi, MediaInsight, MediaPage, Message, Profile, PublishFailure,
    PublishMediaRequest, PublishMediaResponse, RateLimitInfo, SendMessageRequest,
    SendMessageResponse,
};

use crate::domain::service::Service;

pub struct InstagramGatewayLocalClient {
    service: Arc<Service>,
}

impl InstagramGatewayLocalClient {
    #[must_use]
    pub fn new(service: Arc<Service>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl InstagramGatewayApi for InstagramGatewayLocalClient {
    async fn get_profile(&self, account_id: Option<String>) -> Result<Profile, GatewayError> {
        self.service.get_profile(account_id.as_deref()).await
    }

    async fn list_media(
        &self,
        account_id: Option<String>,
        limit: u32,
        after: Option<String>,
    ) -> Result<MediaPage, GatewayError> {
        self.service
            .list_media(account_id.as_deref(), limit, after.as_deref())
            .await
    }

    async fn get_media_insights(
        &self,
        media_id: String,
        metrics: Vec<InsightMetric>,
    ) -> Result<Vec<MediaInsight>, GatewayError> {
        self.service.get_media_insights(&media_id, &metrics).await
    }

    async fn get_account_insights(
        &self,
        account_id: Option<String>,
        metrics: Vec<String>,
        period: InsightPeriod,
    ) -> Result<Vec<AccountInsight>, GatewayError> {
        self.service
            .get_account_insights(account_id.as_deref(), &metrics, period)
            .await
    }

    async fn publish_media(
        &self,
        request: PublishMediaRequest,
    ) -> Result<PublishMediaResponse, PublishFailure> {
        self.service.publish_media(&request).await
    }

    async fn list_pages(&self) -> Result<Vec<FacebookPage>, GatewayError> {
        self.service.list_pages().await
    }

    async fn list_conversations(
        &self,
        page_id: Option<String>,
        limit: u32,
    ) -> Result<Vec<Conversation>, GatewayError> {
        self.service
            .list_conversations(page_id.as_deref(), limit)
            .await
    }

    async fn list_messages(
        &self,
        conversation_id: String,
        limit: u32,
    ) -> Result<Vec<Message>, GatewayError> {
        self.service.list_messages(&conversation_id, limit).await
    }

    async fn send_message(
        &self,
        request: SendMessageRequest,
    ) -> Result<SendMessageResponse, GatewayError> {
        self.service.send_message(&request).await
    }

    async fn validate_token(&self) -> Result<bool, GatewayError> {
        Ok(self.service.validate_token().await)
    }

    fn rate_limit_info(&self) -> RateLimitInfo {
        self.service.rate_limit_info()
    }
}
