//! Responses produced at the edge.

use http::StatusCode;

/// An HTTP response produced by a pipeline stage.
///
/// Headers are kept as an ordered list so repeated names (`Set-Cookie`)
/// survive and output order is stable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeResponse {
    /// The HTTP status code.
    pub status: StatusCode,
    /// The response headers, in emission order.
    pub headers: Vec<(String, String)>,
    /// The response body.
    pub body: String,
}

impl EdgeResponse {
    /// Start building a response.
    pub fn builder() -> ResponseBuilder {
        ResponseBuilder::default()
    }

    /// Get the first value of a header (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Get every value of a header (case-insensitive).
    pub fn header_all(&self, name: &str) -> Vec<&str> {
        self.headers
            .iter()
            .filter(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
            .collect()
    }

    /// Check whether a header is present.
    pub fn has_header(&self, name: &str) -> bool {
        self.header(name).is_some()
    }

    /// Get the Content-Type header.
    pub fn content_type(&self) -> Option<&str> {
        self.header(http::header::CONTENT_TYPE.as_str())
    }
}

/// Builder for [`EdgeResponse`].
#[derive(Debug, Default)]
pub struct ResponseBuilder {
    status: Option<StatusCode>,
    headers: Vec<(String, String)>,
    body: String,
}

impl ResponseBuilder {
    /// Set the status code (default: 200).
    pub fn status(mut self, status: StatusCode) -> Self {
        self.status = Some(status);
        self
    }

    /// Append a header.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Append several headers.
    pub fn headers(mut self, headers: impl IntoIterator<Item = (String, String)>) -> Self {
        self.headers.extend(headers);
        self
    }

    /// Set the body.
    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    /// Build the response.
    pub fn build(self) -> EdgeResponse {
        EdgeResponse {
            status: self.status.unwrap_or(StatusCode::OK),
            headers: self.headers,
            body: self.body,
        }
    }
}
