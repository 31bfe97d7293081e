use std::time::Duration;

use tracing::debug;

/// Network-level failure: DNS, connect, TLS, timeout, or an unreadable body.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct TransportError(pub String);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Blocking HTTP seam shared by the provider clients and the model client.
///
/// Non-2xx responses come back as `Ok(HttpResponse)`; only failures to get
/// a response at all are `Err`.
pub trait HttpTransport: Send + Sync {
    fn get(&self, url: &str, headers: &[(&str, &str)])
    -> Result<HttpResponse, TransportError>;

    fn post_json(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        body: &serde_json::Value,
    ) -> Result<HttpResponse, TransportError>;
}

/// `ureq` agent with a fixed overall timeout per request.
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    pub fn new(timeout: Duration) -> Self {
        Self {
            agent: ureq::AgentBuilder::new().timeout(timeout).build(),
        }
    }
}

fn into_response(
    result: std::result::Result<ureq::Response, ureq::Error>,
) -> Result<HttpResponse, TransportError> {
    let response = match result {
        Ok(response) => response,
        Err(ureq::Error::Status(_, response)) => response,
        Err(ureq::Error::Transport(t)) => return Err(TransportError(t.to_string())),
    };
    let status = response.status();
    let body = response
        .into_string()
        .map_err(|e| TransportError(format!("failed to read response body: {e}")))?;
    Ok(HttpResponse { status, body })
}

impl HttpTransport for UreqTransport {
    fn get(
        &self,
        url: &str,
        headers: &[(&str, &str)],
    ) -> Result<HttpResponse, TransportError> {
        debug!(url, "GET");
        let mut request = self.agent.get(url);
        for (name, value) in headers {
            request = request.set(name, value);
        }
        into_response(request.call())
    }

    fn post_json(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        body: &serde_json::Value,
    ) -> Result<HttpResponse, TransportError> {
        debug!(url, "POST");
        let mut request = self.agent.post(url);
        for (name, value) in headers {
            request = request.set(name, value);
        }
        into_response(request.send_json(body))
    }
}
