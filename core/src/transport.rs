//! Executing `HttpRequest` values against a real server.
//!
//! The store and client never do I/O themselves; a `Transport` is the one
//! place a round-trip happens. `UreqTransport` is the blocking implementation
//! used by `InventorySession` and the integration tests.

use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};

/// Performs one HTTP round-trip.
///
/// Non-2xx statuses are returned as data, not as `Err`; status interpretation
/// belongs to `InventoryClient`. `Err` means no usable response arrived.
pub trait Transport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
        (**self).execute(request)
    }
}

#[cfg(feature = "blocking")]
pub use blocking::UreqTransport;

#[cfg(feature = "blocking")]
mod blocking {
    use std::time::Duration;

    use tracing::debug;

    use super::Transport;
    use crate::error::ApiError;
    use crate::http::{HttpMethod, HttpRequest, HttpResponse};

    /// Blocking transport backed by a ureq agent.
    #[derive(Clone)]
    pub struct UreqTransport {
        agent: ureq::Agent,
    }

    impl UreqTransport {
        pub fn new(timeout: Duration) -> Self {
            let agent = ureq::Agent::config_builder()
                .http_status_as_error(false)
                .timeout_global(Some(timeout))
                .build()
                .new_agent();
            Self { agent }
        }
    }

    fn with_headers<B>(mut builder: ureq::RequestBuilder<B>, headers: &[(String, String)]) -> ureq::RequestBuilder<B> {
        for (key, value) in headers {
            builder = builder.header(key.as_str(), value.as_str());
        }
        builder
    }

    impl Transport for UreqTransport {
        fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
            let url = request.path.as_str();
            let headers = request.headers.as_slice();

            let result = match (request.method, request.body.as_deref()) {
                (HttpMethod::Get, _) => with_headers(self.agent.get(url), headers).call(),
                (HttpMethod::Delete, _) => with_headers(self.agent.delete(url), headers).call(),
                (HttpMethod::Post, Some(body)) => with_headers(self.agent.post(url), headers).send(body.as_bytes()),
                (HttpMethod::Post, None) => with_headers(self.agent.post(url), headers).send_empty(),
                (HttpMethod::Put, Some(body)) => with_headers(self.agent.put(url), headers).send(body.as_bytes()),
                (HttpMethod::Put, None) => with_headers(self.agent.put(url), headers).send_empty(),
            };
            let mut response = result.map_err(|e| ApiError::Transport(e.to_string()))?;

            let status = response.status().as_u16();
            let headers = response
                .headers()
                .iter()
                .filter_map(|(name, value)| {
                    value
                        .to_str()
                        .ok()
                        .map(|value| (name.as_str().to_string(), value.to_string()))
                })
                .collect();
            let body = response
                .body_mut()
                .read_to_string()
                .map_err(|e| ApiError::Transport(e.to_string()))?;

            debug!(method = %request.method, url, status, "round-trip finished");
            Ok(HttpResponse { status, headers, body })
        }
    }
}
