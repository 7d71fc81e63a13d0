//! HTTP transport helper
//!
//! Sends one request per call with the fixed Signavio header set and
//! transparently inflates gzip-encoded response bodies. There are no
//! retries here.

use std::io::Read;
use std::time::Duration;

use flate2::read::GzDecoder;
use reqwest::blocking::multipart::Form;
use reqwest::blocking::Client;
use reqwest::header::{
    HeaderMap, HeaderName, HeaderValue, ACCEPT, ACCEPT_ENCODING, CACHE_CONTROL, CONTENT_ENCODING,
};
use reqwest::Method;

use crate::domain::result::{Error, Result};

/// Header carrying the session token on authenticated requests
pub const SESSION_HEADER: &str = "x-signavio-id";

const CHARSET: &str = "charset";

/// Build the header set sent with every request.
///
/// Each call returns a fresh map; callers add operation-specific headers
/// (content type, session) to their own copy.
pub fn default_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("gzip"));
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert(HeaderName::from_static(CHARSET), HeaderValue::from_static("utf-8"));
    headers
}

/// Add the session header to a header set
pub fn with_session(mut headers: HeaderMap, token: &str) -> Result<HeaderMap> {
    let value = HeaderValue::from_str(token)
        .map_err(|_| Error::auth("session token contains invalid header characters"))?;
    headers.insert(HeaderName::from_static(SESSION_HEADER), value);
    Ok(headers)
}

/// Payload of an outgoing request
pub enum RequestBody {
    Bytes(Vec<u8>),
    /// Sent as `multipart/form-data`; reqwest sets the content type
    Multipart(Form),
}

impl From<Vec<u8>> for RequestBody {
    fn from(bytes: Vec<u8>) -> Self {
        RequestBody::Bytes(bytes)
    }
}

impl From<Form> for RequestBody {
    fn from(form: Form) -> Self {
        RequestBody::Multipart(form)
    }
}

/// Status, cookies and (inflated) body of a response
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
    /// Cookies set by this response, as (name, value)
    pub cookies: Vec<(String, String)>,
}

impl HttpResponse {
    /// Body as text, for diagnostics
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Blocking HTTP transport with a persistent cookie store
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    timeout: Duration,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .cookie_store(true)
            .build()
            .map_err(|e| Error::Transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, timeout })
    }

    /// Send a request and read the whole response body
    pub fn send(
        &self,
        method: Method,
        url: &str,
        headers: HeaderMap,
        body: Option<RequestBody>,
    ) -> Result<HttpResponse> {
        let mut request = self.client.request(method, url).headers(headers);
        request = match body {
            Some(RequestBody::Bytes(bytes)) => request.body(bytes),
            Some(RequestBody::Multipart(form)) => request.multipart(form),
            None => request,
        };

        let response = request.send().map_err(|e| self.map_request_error(e))?;

        let status = response.status().as_u16();
        let cookies = response
            .cookies()
            .map(|c| (c.name().to_string(), c.value().to_string()))
            .collect();
        let gzipped = response
            .headers()
            .get(CONTENT_ENCODING)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.trim().eq_ignore_ascii_case("gzip"))
            .unwrap_or(false);

        let raw = response
            .bytes()
            .map_err(|e| Error::Transport(format!("Failed to read response body: {}", e)))?;

        let body = if gzipped { gunzip(&raw)? } else { raw.to_vec() };

        Ok(HttpResponse {
            status,
            body,
            cookies,
        })
    }

    /// Map request errors to user-friendly messages
    fn map_request_error(&self, error: reqwest::Error) -> Error {
        if error.is_timeout() {
            Error::Transport(format!("Connection timed out after {:?}", self.timeout))
        } else if error.is_connect() {
            Error::Transport(format!("Unable to connect to Signavio: {}", error))
        } else if error.is_builder() {
            Error::Transport(format!("Invalid request: {}", error))
        } else {
            Error::Transport(format!("Signavio request failed: {}", error))
        }
    }
}

/// Inflate a gzip payload
pub fn gunzip(data: &[u8]) -> Result<Vec<u8>> {
    let mut decoder = GzDecoder::new(data);
    let mut out = Vec::new();
    decoder
        .read_to_end(&mut out)
        .map_err(|e| Error::Transport(format!("Failed to decompress gzip body: {}", e)))?;
    Ok(out)
}
