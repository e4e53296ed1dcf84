#![allow(dead_code)]

use std::sync::Arc;

use httpmock::MockServer;
use instagram_gateway::{GatewayConfig, InstagramGateway, InstagramGatewayApi};

pub const TOKEN: &str = "EAAtesttoken";
pub const ACCOUNT: &str = "17841400000";

/// Resource host on `resource`, messaging host on `messaging`.
pub fn config(resource: &MockServer, messaging: &MockServer) -> GatewayConfig {
    let mut config = GatewayConfig::with_token(TOKEN);
    config.api_base_url = resource.base_url();
    config.messaging_base_url = format!("{}/v22.0", messaging.base_url());
    config.business_account_id = Some(ACCOUNT.to_owned());
    config.app_id = Some("1234567890".to_owned());
    config.request_timeout_ms = 2_000;
    config
}

pub fn gateway(config: &GatewayConfig) -> Arc<dyn InstagramGatewayApi> {
    InstagramGateway::from_config(config).unwrap().client()
}

/// Minimal PNG: signature plus an IHDR chunk.
pub fn png(width: u32, height: u32) -> Vec<u8> {
    let mut bytes = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
    bytes.extend_from_slice(&13u32.to_be_bytes());
    bytes.extend_from_slice(b"IHDR");
    bytes.extend_from_slice(&width.to_be_bytes());
    bytes.extend_from_slice(&height.to_be_bytes());
    bytes.extend_from_slice(&[8, 6, 0, 0, 0, 0, 0, 0, 0]);
    bytes
}
