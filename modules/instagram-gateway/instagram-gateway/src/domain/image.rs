//! Aspect-ratio precondition for image publishing.
//!
//! Videos are not inspected: the remote validates them after upload and the
//! gateway has no cheap way to read their dimensions.

use std::fmt;
use std::sync::Arc;

use instagram_gateway_sdk::GatewayError;
use url::Url;

use super::ports::{HttpTransport, TransportError, TransportRequest};

/// Accepted width/height ratio with its tolerance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AspectBand {
    pub name: &'static str,
    pub target: f64,
    pub min: f64,
    pub max: f64,
}

impl AspectBand {
    #[must_use]
    pub fn contains(&self, ratio: f64) -> bool {
        self.min <= ratio && ratio <= self.max
    }
}

impl fmt::Display for AspectBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:.2}-{:.2})", self.name, self.min, self.max)
    }
}

pub const ACCEPTED_BANDS: [AspectBand; 3] = [
    AspectBand {
        name: "4:5 portrait",
        target: 0.8,
        min: 0.78,
        max: 0.82,
    },
    AspectBand {
        name: "1:1 square",
        target: 1.0,
        min: 0.98,
        max: 1.02,
    },
    AspectBand {
        name: "1.91:1 landscape",
        target: 1.91,
        min: 1.89,
        max: 1.93,
    },
];

/// Check measured dimensions against [`ACCEPTED_BANDS`].
///
/// # Errors
/// Returns [`GatewayError::Validation`] naming the measured ratio and the
/// accepted bands, or when either dimension is zero.
pub fn check_dimensions(width: u32, height: u32) -> Result<&'static AspectBand, GatewayError> {
    if width == 0 || height == 0 {
        return Err(GatewayError::validation(format!(
            "image has an empty dimension ({width}x{height})"
        )));
    }
    let ratio = f64::from(width) / f64::from(height);
    if let Some(band) = ACCEPTED_BANDS.iter().find(|band| band.contains(ratio)) {
        tracing::debug!(width, height, ratio, accepted_as = band.name, "Image aspect ratio accepted");
        return Ok(band);
    }
    let accepted = ACCEPTED_BANDS
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    Err(GatewayError::validation(format!(
        "image aspect ratio {width}x{height} (ratio {ratio:.3}) is not supported; \
         accepted ratios: {accepted}. Crop or resize the image to one of them"
    )))
}

/// Downloads an image and applies [`check_dimensions`].
pub struct ImageValidator {
    transport: Arc<dyn HttpTransport>,
    max_bytes: usize,
}

impl ImageValidator {
    #[must_use]
    pub fn new(transport: Arc<dyn HttpTransport>, max_bytes: usize) -> Self {
        Self {
            transport,
            max_bytes,
        }
    }

    /// # Errors
    /// [`GatewayError::Network`] when the image cannot be downloaded;
    /// [`GatewayError::Validation`] when it is too large, unreadable, or its
    /// aspect ratio is outside every accepted band.
    #[tracing::instrument(skip(self), fields(max_bytes = self.max_bytes))]
    pub async fn validate(&self, image_url: &str) -> Result<(), GatewayError> {
        let url = Url::parse(image_url)
            .map_err(|e| GatewayError::validation(format!("invalid image URL '{image_url}': {e}")))?;

        let request = TransportRequest::get(url).with_body_limit(self.max_bytes);
        let response = self.transport.send(request).await.map_err(|e| match e {
            TransportError::BodyTooLarge { limit } => GatewayError::validation(format!(
                "image at {image_url} is larger than {limit} bytes"
            )),
            other => {
                tracing::warn!(error = %other, "Failed to download image for validation");
                GatewayError::network(format!(
                    "failed to download image for validation: {other}"
                ))
            }
        })?;
        if !response.is_success() {
            return Err(GatewayError::network(format!(
                "failed to download image for validation: HTTP {}",
                response.status
            )));
        }

        let size = imagesize::blob_size(&response.body).map_err(|e| {
            GatewayError::validation(format!("cannot read image dimensions from {image_url}: {e}"))
        })?;
        let (width, height) = match (u32::try_from(size.width), u32::try_from(size.height)) {
            (Ok(width), Ok(height)) => (width, height),
            _ => {
                return Err(GatewayError::validation(format!(
                    "image at {image_url} has out-of-range dimensions"
                )));
            }
        };

        check_dimensions(width, height).map(|_| ()).inspect_err(|e| {
            tracing::warn!(width, height, error = %e, "Invalid image aspect ratio");
        })
    }
}
