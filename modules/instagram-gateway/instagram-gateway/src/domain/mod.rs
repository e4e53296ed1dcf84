//! Domain layer: the gateway's call pipeline and the operations built on it.

pub mod cache;
pub mod classifier;
pub mod dispatcher;
pub mod image;
pub mod ports;
pub mod publish;
pub mod rate_limiter;
pub mod request;
pub mod service;
