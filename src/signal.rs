//! WHIP HTTP signaling.
//!
//! One POST exchanges the SDP offer for the answer and an optional resource
//! URL in the `Location` header; one DELETE on that resource tears the
//! session down so the server can free it before its own timeout fires.

use crate::error::{Result, WhipError};
use reqwest::blocking::Client;
use reqwest::header::{AUTHORIZATION, CACHE_CONTROL, CONTENT_TYPE, LOCATION};
use reqwest::StatusCode;
use std::time::Duration;
use url::Url;

/// Content type for WHIP offer/answer bodies.
pub const SDP_CONTENT_TYPE: &str = "application/sdp";

/// The parsed result of the WHIP POST exchange.
#[derive(Debug, Clone)]
pub struct SignalAnswer {
    /// The SDP answer body.
    pub sdp: String,
    /// The session resource URL from the `Location` header, already resolved
    /// against the endpoint for relative values.
    pub resource_url: Option<String>,
}

/// HTTP client for the WHIP endpoint.
#[derive(Debug)]
pub struct WhipSignaler {
    client: Client,
    endpoint: Url,
    authorization: Option<String>,
}

impl WhipSignaler {
    /// Create a signaler for `endpoint` with an optional Bearer token.
    pub fn new(endpoint: &str, authorization: Option<String>) -> Result<Self> {
        let endpoint = Url::parse(endpoint)
            .map_err(|e| WhipError::Signaling(format!("invalid endpoint {endpoint}: {e}")))?;
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| WhipError::Signaling(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            endpoint,
            authorization,
        })
    }

    /// POST the offer, returning the answer and the resource URL.
    pub fn exchange_sdp(&self, offer: &str) -> Result<SignalAnswer> {
        if offer.is_empty() {
            return Err(WhipError::Signaling("no offer to exchange".into()));
        }

        let mut request = self
            .client
            .post(self.endpoint.clone())
            .header(CACHE_CONTROL, "no-cache")
            .header(CONTENT_TYPE, SDP_CONTENT_TYPE)
            .body(offer.to_string());
        if let Some(token) = &self.authorization {
            request = request.header(AUTHORIZATION, format!("Bearer {token}"));
        }

        let response = request
            .send()
            .map_err(|e| WhipError::Signaling(format!("failed to request {}: {e}", self.endpoint)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(WhipError::Signaling(format!(
                "POST {} returned {status}",
                self.endpoint
            )));
        }

        let resource_url = match response.headers().get(LOCATION) {
            Some(value) => {
                let location = value
                    .to_str()
                    .map_err(|_| WhipError::Signaling("non-text Location header".into()))?;
                Some(self.resolve_location(location)?)
            }
            None => None,
        };

        let sdp = response
            .text()
            .map_err(|e| WhipError::Signaling(format!("failed to read answer body: {e}")))?;
        if !sdp.starts_with("v=") {
            return Err(WhipError::Signaling(format!("invalid answer: {sdp}")));
        }

        tracing::debug!(
            answer_len = sdp.len(),
            resource = resource_url.as_deref().unwrap_or(""),
            "got WHIP answer"
        );
        Ok(SignalAnswer { sdp, resource_url })
    }

    /// DELETE the session resource. The server expires the session
    /// immediately so the stream can be republished without waiting.
    pub fn dispose(&self, resource_url: &str) -> Result<()> {
        let mut request = self
            .client
            .delete(resource_url)
            .header(CACHE_CONTROL, "no-cache");
        if let Some(token) = &self.authorization {
            request = request.header(AUTHORIZATION, format!("Bearer {token}"));
        }

        let response = request
            .send()
            .map_err(|e| WhipError::Signaling(format!("failed to DELETE {resource_url}: {e}")))?;
        let status = response.status();
        if !status.is_success() && status != StatusCode::NOT_FOUND {
            return Err(WhipError::Signaling(format!(
                "DELETE {resource_url} returned {status}"
            )));
        }
        Ok(())
    }

    fn resolve_location(&self, location: &str) -> Result<String> {
        match Url::parse(location) {
            Ok(url) => Ok(url.to_string()),
            // Relative resource path, resolve against the endpoint.
            Err(_) => self
                .endpoint
                .join(location)
                .map(|u| u.to_string())
                .map_err(|e| {
                    WhipError::Signaling(format!("unusable Location {location}: {e}"))
                }),
        }
    }
}
