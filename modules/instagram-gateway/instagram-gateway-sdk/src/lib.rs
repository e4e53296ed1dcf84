#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Instagram gateway SDK
//!
//! Public contract of the Instagram gateway: the [`InstagramGatewayApi`]
//! trait, the typed models it returns, and the error taxonomy every failure
//! is classified into.
//!
//! ## Usage
//!
//! ```ignore
//! use instagram_gateway_sdk::{ErrorCategory, InstagramGatewayApi};
//!
//! match gateway.get_profile(None).await {
//!     Ok(profile) => println!("{}", profile.username),
//!     Err(e) if e.category() == ErrorCategory::PermissionAdvancedAccessRequired => {
//!         println!("feature unavailable: {}", e.remediation().unwrap_or_default());
//!     }
//!     Err(e) => return Err(e.into()),
//! }
//! ```

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]

pub mod api;
pub mod error;
pub mod models;

pub use api::InstagramGatewayApi;

pub use error::{ErrorCategory, GatewayError, PublishFailure, PublishPhase, RemoteError};

pub use models::{
    AccountInsight, AccountRef, Conversation, FacebookPage, InsightMetric, InsightPeriod,
    MAX_CAPTION_CHARS, MAX_PAGE_LIMIT, Media, MediaInsight, MediaPage, MediaSource, MediaType,
    Message, Participant, Participants, Profile, PublishMediaRequest, PublishMediaResponse,
    RateLimitInfo, SendMessageRequest, SendMessageResponse,
};
