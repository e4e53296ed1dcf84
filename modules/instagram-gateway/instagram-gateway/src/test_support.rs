//! In-memory transport for unit tests.

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::domain::ports::{
    HttpMethod, HttpTransport, TransportError, TransportRequest, TransportResponse,
};

struct Route {
    method: HttpMethod,
    path: String,
    reply: Result<TransportResponse, TransportError>,
}

/// Answers by exact URL path and records every request it receives.
#[derive(Default)]
pub struct ScriptedTransport {
    routes: Mutex<Vec<Route>>,
    requests: Mutex<Vec<TransportRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(&self, method: HttpMethod, path: &str, status: u16, body: serde_json::Value) {
        self.on_raw(method, path, status, body.to_string().into_bytes());
    }

    pub fn on_raw(&self, method: HttpMethod, path: &str, status: u16, body: Vec<u8>) {
        self.routes.lock().push(Route {
            method,
            path: path.to_owned(),
            reply: Ok(TransportResponse { status, body }),
        });
    }

    pub fn fail(&self, method: HttpMethod, path: &str, error: TransportError) {
        self.routes.lock().push(Route {
            method,
            path: path.to_owned(),
            reply: Err(error),
        });
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().len()
    }

    pub fn calls_to(&self, path: &str) -> usize {
        self.requests
            .lock()
            .iter()
            .filter(|request| request.url.path() == path)
            .count()
    }

    pub fn requests(&self) -> Vec<TransportRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
        let reply = self
            .routes
            .lock()
            .iter()
            .find(|route| route.method == request.method && route.path == request.url.path())
            .map(|route| route.reply.clone());
        self.requests.lock().push(request);
        reply.unwrap_or_else(|| Err(TransportError::Connect("no scripted route".to_owned())))
    }
}

/// Minimal PNG: signature plus an IHDR chunk, enough for header probing.
pub fn png_header(width: u32, height: u32) -> Vec<u8> {
    let mut bytes = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
    bytes.extend_from_slice(&13u32.to_be_bytes());
    bytes.extend_from_slice(b"IHDR");
    bytes.extend_from_slice(&width.to_be_bytes());
    bytes.extend_from_slice(&height.to_be_bytes());
    // bit depth, colour type, compression, filter, interlace, CRC
    bytes.extend_from_slice(&[8, 6, 0, 0, 0, 0, 0, 0, 0]);
    bytes
}
