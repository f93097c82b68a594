/// Per-request context handed to error pipeline stages
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// HTTP request parts (method, URI, headers, extensions)
    pub parts: http::request::Parts,
    /// Caller-supplied correlation id from `x-request-id`
    pub request_id: Option<String>,
}

impl RequestContext {
    /// Build a context from the parts of an incoming request
    pub fn from_parts(parts: &http::request::Parts) -> Self {
        let request_id = parts
            .headers
            .get("x-request-id")
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);

        Self {
            parts: parts.clone(),
            request_id,
        }
    }

    /// Create a minimal context for use outside of a request
    ///
    /// Contains an empty `GET /` request with no headers
    pub fn empty() -> Self {
        let (parts, _) = http::Request::builder()
            .method(http::Method::GET)
            .uri("/")
            .body(())
            .expect("valid minimal request")
            .into_parts();

        Self {
            parts,
            request_id: None,
        }
    }

    pub const fn method(&self) -> &http::Method {
        &self.parts.method
    }

    pub fn path(&self) -> &str {
        self.parts.uri.path()
    }

    /// Access request headers
    pub const fn headers(&self) -> &http::HeaderMap {
        &self.parts.headers
    }
}
