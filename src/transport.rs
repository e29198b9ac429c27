//! HTTP transport seam.
//!
//! Services never talk to `reqwest` directly; they go through
//! [`HttpTransport`] so tests can swap in [`MockTransport`] and assert on
//! exactly which requests were (or were not) issued.

use std::collections::VecDeque;
use std::sync::Mutex;

use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw HTTP outcome: status plus unparsed body. Error mapping happens in
/// the API client, not here.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// The body parsed as JSON, or `None` for empty/non-JSON bodies.
    pub fn json(&self) -> Option<Value> {
        serde_json::from_str(&self.body).ok()
    }
}

/// Errors below the HTTP layer.
#[derive(Debug, Clone, thiserror::Error)]
pub enum TransportError {
    #[error("could not reach the server at {0}")]
    Connection(String),
    #[error("request timed out after {0}s")]
    Timeout(u64),
    #[error("HTTP transport error: {0}")]
    Other(String),
}

pub trait HttpTransport: Send + Sync {
    fn execute(
        &self,
        method: Method,
        url: &str,
        query: &[(&str, &str)],
        bearer: Option<&str>,
        body: Option<&Value>,
    ) -> Result<RawResponse, TransportError>;
}

// ─── Reqwest transport ────────────────────────────────────────────────────────

/// Blocking `reqwest` transport with a fixed per-request timeout.
pub struct ReqwestTransport {
    client: reqwest::blocking::Client,
    timeout_secs: u64,
}

impl ReqwestTransport {
    pub fn new(timeout_secs: u64) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            timeout_secs,
        }
    }
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new(crate::config::REQUEST_TIMEOUT_SECS)
    }
}

impl HttpTransport for ReqwestTransport {
    fn execute(
        &self,
        method: Method,
        url: &str,
        query: &[(&str, &str)],
        bearer: Option<&str>,
        body: Option<&Value>,
    ) -> Result<RawResponse, TransportError> {
        let mut request = match method {
            Method::Get => self.client.get(url),
            Method::Post => self.client.post(url),
            Method::Put => self.client.put(url),
            Method::Delete => self.client.delete(url),
        };
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(token) = bearer {
            request = request.bearer_auth(token);
        }
        if let Some(json) = body {
            request = request.json(json);
        }

        let response = request.send().map_err(|e| {
            if e.is_connect() {
                TransportError::Connection(url.to_string())
            } else if e.is_timeout() {
                TransportError::Timeout(self.timeout_secs)
            } else {
                TransportError::Other(e.to_string())
            }
        })?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .map_err(|e| TransportError::Other(e.to_string()))?;

        Ok(RawResponse { status, body })
    }
}

// ─── Mock transport ───────────────────────────────────────────────────────────

/// One request as seen by the mock.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub method: Method,
    pub url: String,
    pub query: Vec<(String, String)>,
    pub bearer: Option<String>,
    pub body: Option<Value>,
}

/// Scripted transport for tests: responses are served FIFO and every
/// request is recorded. Running past the script is an error so tests
/// notice unexpected traffic.
pub struct MockTransport {
    responses: Mutex<VecDeque<Result<RawResponse, TransportError>>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Queue a response with the given status and raw body.
    pub fn respond(self, status: u16, body: &str) -> Self {
        self.push(Ok(RawResponse {
            status,
            body: body.to_string(),
        }));
        self
    }

    /// Queue a JSON response.
    pub fn respond_json(self, status: u16, body: Value) -> Self {
        let body = body.to_string();
        self.respond(status, &body)
    }

    /// Queue a transport-level failure.
    pub fn fail(self, error: TransportError) -> Self {
        self.push(Err(error));
        self
    }

    /// Everything sent through this transport, in order.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().expect("mock lock").clone()
    }

    fn push(&self, response: Result<RawResponse, TransportError>) {
        self.responses.lock().expect("mock lock").push_back(response);
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpTransport for MockTransport {
    fn execute(
        &self,
        method: Method,
        url: &str,
        query: &[(&str, &str)],
        bearer: Option<&str>,
        body: Option<&Value>,
    ) -> Result<RawResponse, TransportError> {
        self.requests.lock().expect("mock lock").push(RecordedRequest {
            method,
            url: url.to_string(),
            query: query
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            bearer: bearer.map(str::to_string),
            body: body.cloned(),
        });

        self.responses
            .lock()
            .expect("mock lock")
            .pop_front()
            .unwrap_or_else(|| {
                Err(TransportError::Other(
                    "mock transport: no scripted response left".to_string(),
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_serves_responses_in_order() {
        let mock = MockTransport::new()
            .respond(200, "first")
            .respond(404, "second");

        let first = mock.execute(Method::Get, "http://t/a", &[], None, None).unwrap();
        assert_eq!(first.status, 200);
        assert_eq!(first.body, "first");

        let second = mock.execute(Method::Get, "http://t/b", &[], None, None).unwrap();
        assert_eq!(second.status, 404);
        assert!(!second.is_success());
    }

    #[test]
    fn mock_records_requests() {
        let mock = MockTransport::new().respond(200, "{}");
        let body = serde_json::json!({"status": "confirmada"});
        mock.execute(
            Method::Put,
            "http://t/api/appointments/a1",
            &[],
            Some("tok"),
            Some(&body),
        )
        .unwrap();

        let requests = mock.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, Method::Put);
        assert_eq!(requests[0].url, "http://t/api/appointments/a1");
        assert_eq!(requests[0].bearer.as_deref(), Some("tok"));
        assert_eq!(requests[0].body, Some(body));
    }

    #[test]
    fn mock_errors_when_script_is_exhausted() {
        let mock = MockTransport::new();
        let result = mock.execute(Method::Get, "http://t/a", &[], None, None);
        assert!(result.is_err());
    }

    #[test]
    fn mock_replays_scripted_failures() {
        let mock = MockTransport::new().fail(TransportError::Connection("http://t".into()));
        let result = mock.execute(Method::Get, "http://t/a", &[], None, None);
        assert!(matches!(result, Err(TransportError::Connection(_))));
    }

    #[test]
    fn raw_response_parses_json_bodies() {
        let response = RawResponse {
            status: 200,
            body: r#"{"data": []}"#.to_string(),
        };
        assert!(response.json().is_some());

        let empty = RawResponse {
            status: 200,
            body: String::new(),
        };
        assert!(empty.json().is_none());
    }
}
