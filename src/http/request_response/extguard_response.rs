use http::StatusCode;
use http::header::{CONTENT_TYPE, HeaderValue};
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{HeaderMap, Response};

use crate::logging::syslog::error;

const CONTENT_TYPE_JSON: HeaderValue = HeaderValue::from_static("application/json");
const CONTENT_TYPE_TEXT_PLAIN: HeaderValue = HeaderValue::from_static("text/plain; charset=utf-8");

// Buffered response that is turned into a hyper response at the very end
#[derive(Debug)]
pub struct ExtguardResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl ExtguardResponse {
    // Created new empty response with given status code
    pub fn new_empty_with_status(status_code: u16) -> Self {
        let status = match StatusCode::from_u16(status_code) {
            Ok(s) => s,
            Err(_) => {
                error(format!("Failed to create empty response with status code: {}", status_code));
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        Self {
            status,
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    pub fn new_with_bytes<T: Into<Bytes>>(status_code: u16, body_bytes: T) -> Self {
        let mut response = ExtguardResponse::new_empty_with_status(status_code);
        response.body = body_bytes.into();
        response
    }

    pub fn new_json(status_code: u16, value: &serde_json::Value) -> Self {
        let mut response = ExtguardResponse::new_with_bytes(status_code, value.to_string());
        response.headers.insert(CONTENT_TYPE, CONTENT_TYPE_JSON.clone());
        response
    }

    pub fn new_text(status_code: u16, text: &'static str) -> Self {
        let mut response = ExtguardResponse::new_with_bytes(status_code, text);
        response.headers.insert(CONTENT_TYPE, CONTENT_TYPE_TEXT_PLAIN.clone());
        response
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn get_status(&self) -> u16 {
        self.status.as_u16()
    }

    pub fn get_body_bytes(&self) -> &Bytes {
        &self.body
    }

    // Convert back into a hyper Response
    pub fn into_hyper(self) -> Response<Full<Bytes>> {
        let mut response = Response::new(Full::new(self.body));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}
