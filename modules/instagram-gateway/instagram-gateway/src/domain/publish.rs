//! Two-phase publishing: create a media container, then commit it.
//!
//! ```text
//! NotStarted --create ok--> ContainerCreated --commit ok--> Published
//!      |                           |
//!      +--precondition/create--> Failed(phase) <--commit--+
//! ```
//!
//! A failed commit leaves the container behind on the remote; there is no
//! compensating delete. The failure carries the container id so a caller can
//! retry the commit alone instead of creating another container.

use instagram_gateway_sdk::{
    GatewayError, MediaSource, PublishFailure, PublishMediaRequest, PublishMediaResponse,
    PublishPhase,
};
use serde_json::json;

use super::dispatcher::Dispatcher;
use super::image::ImageValidator;
use super::request::{ApiRequest, Host};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishState {
    NotStarted,
    ContainerCreated {
        container_id: String,
    },
    Published {
        media_id: String,
        container_id: String,
    },
    Failed {
        phase: PublishPhase,
        container_id: Option<String>,
    },
}

pub struct PublishWorkflow<'a> {
    dispatcher: &'a Dispatcher,
    images: &'a ImageValidator,
    account_id: &'a str,
    state: PublishState,
}

impl<'a> PublishWorkflow<'a> {
    #[must_use]
    pub fn new(dispatcher: &'a Dispatcher, images: &'a ImageValidator, account_id: &'a str) -> Self {
        Self {
            dispatcher,
            images,
            account_id,
            state: PublishState::NotStarted,
        }
    }

    #[must_use]
    pub fn state(&self) -> &PublishState {
        &self.state
    }

    /// Run the workflow to a terminal state.
    ///
    /// # Errors
    /// A [`PublishFailure`] naming the phase that failed.
    #[tracing::instrument(name = "instagram.publish", skip_all, fields(account_id = self.account_id))]
    pub async fn run(
        &mut self,
        request: &PublishMediaRequest,
    ) -> Result<PublishMediaResponse, PublishFailure> {
        let source = match self.check_preconditions(request).await {
            Ok(source) => source,
            Err(e) => return Err(self.fail(PublishPhase::Precondition, e)),
        };

        let container_id = match self.create_container(&source, request).await {
            Ok(id) => id,
            Err(e) => return Err(self.fail(PublishPhase::Create, e)),
        };
        tracing::info!(container_id = %container_id, "Media container created");
        self.state = PublishState::ContainerCreated {
            container_id: container_id.clone(),
        };

        let media_id = match self.commit(&container_id).await {
            Ok(id) => id,
            Err(e) => return Err(self.fail(PublishPhase::Publish, e)),
        };
        tracing::info!(media_id = %media_id, container_id = %container_id, "Media published");
        self.state = PublishState::Published {
            media_id: media_id.clone(),
            container_id: container_id.clone(),
        };

        Ok(PublishMediaResponse {
            id: media_id,
            container_id,
        })
    }

    async fn check_preconditions(
        &self,
        request: &PublishMediaRequest,
    ) -> Result<MediaSource, GatewayError> {
        let source = request.validate()?;
        match &source {
            MediaSource::Image(url) => self.images.validate(url).await?,
            MediaSource::Video(_) => {
                tracing::debug!("Video aspect ratio is not checked before upload");
            }
        }
        Ok(source)
    }

    async fn create_container(
        &self,
        source: &MediaSource,
        request: &PublishMediaRequest,
    ) -> Result<String, GatewayError> {
        let mut body = json!({ "caption": request.caption.as_deref().unwrap_or_default() });
        match source {
            MediaSource::Image(url) => body["image_url"] = json!(url),
            MediaSource::Video(url) => body["video_url"] = json!(url),
        }
        if let Some(location_id) = &request.location_id {
            body["location_id"] = json!(location_id);
        }

        let create = ApiRequest::write(Host::Resource, [self.account_id, "media"], Some(body));
        let response = self.dispatcher.dispatch(&create).await?;
        object_id(&response, "container creation")
    }

    async fn commit(&self, container_id: &str) -> Result<String, GatewayError> {
        let commit = ApiRequest::write(
            Host::Resource,
            [self.account_id, "media_publish"],
            Some(json!({ "creation_id": container_id })),
        );
        let response = self.dispatcher.dispatch(&commit).await?;
        object_id(&response, "publish")
    }

    fn fail(&mut self, phase: PublishPhase, error: GatewayError) -> PublishFailure {
        let container_id = match &self.state {
            PublishState::ContainerCreated { container_id } => Some(container_id.clone()),
            _ => None,
        };
        tracing::error!(phase = %phase, container_id = container_id.as_deref(), error = %error, "Publish failed");
        self.state = PublishState::Failed {
            phase,
            container_id: container_id.clone(),
        };
        PublishFailure::new(phase, container_id, error)
    }
}

fn object_id(response: &serde_json::Value, step: &str) -> Result<String, GatewayError> {
    response
        .get("id")
        .and_then(|id| match id {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
        .ok_or_else(|| GatewayError::invalid_response(format!("{step} response has no id")))
}
