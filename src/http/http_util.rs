use http::HeaderValue;

use crate::error::extguard_error::ExtguardError;
use crate::error::extguard_error_enums::{ApiError, ExtguardErrorKind};
use crate::http::request_response::extguard_response::ExtguardResponse;

const SERVER_HEADER_VALUE: HeaderValue = HeaderValue::from_static("extguard");
const CORS_ALLOW_ORIGIN_VALUE: HeaderValue = HeaderValue::from_static("*");
const CORS_ALLOW_METHODS_VALUE: HeaderValue = HeaderValue::from_static("GET, POST, PUT, DELETE, OPTIONS");
const CORS_ALLOW_HEADERS_VALUE: HeaderValue = HeaderValue::from_static("Content-Type");
const CONTENT_TYPE_OCTET_STREAM: HeaderValue = HeaderValue::from_static("application/octet-stream");

pub fn add_standard_headers_to_response(resp: &mut ExtguardResponse) {
    // Always set server header
    resp.headers_mut().insert("Server", SERVER_HEADER_VALUE.clone());

    // The API is meant to be called from any origin
    resp.headers_mut().insert("Access-Control-Allow-Origin", CORS_ALLOW_ORIGIN_VALUE.clone());

    // Make sure non-empty bodies always carry a content type
    if !resp.get_body_bytes().is_empty() && !resp.headers().contains_key("Content-Type") {
        resp.headers_mut().insert("Content-Type", CONTENT_TYPE_OCTET_STREAM.clone());
    }
}

pub fn cors_preflight_response() -> ExtguardResponse {
    let mut resp = ExtguardResponse::new_empty_with_status(hyper::StatusCode::NO_CONTENT.as_u16());
    resp.headers_mut().insert("Access-Control-Allow-Methods", CORS_ALLOW_METHODS_VALUE.clone());
    resp.headers_mut().insert("Access-Control-Allow-Headers", CORS_ALLOW_HEADERS_VALUE.clone());
    resp
}

pub fn success_response() -> ExtguardResponse {
    ExtguardResponse::new_json(hyper::StatusCode::OK.as_u16(), &serde_json::json!({ "success": true }))
}

pub fn error_json_response(status_code: u16, message: &str) -> ExtguardResponse {
    ExtguardResponse::new_json(status_code, &serde_json::json!({ "error": message }))
}

/// Turns an error into its JSON response. Storage failures get the endpoint
/// specific message, everything else carries its own client message.
pub fn error_to_response(error: &ExtguardError, storage_failure_message: &str) -> ExtguardResponse {
    let message = match error.kind {
        ExtguardErrorKind::StorageFailure => storage_failure_message,
        _ => error.get_client_message(),
    };
    error_json_response(error.get_http_status_code(), message)
}

// Split a url path into percent-decoded segments, ignoring empty ones
pub fn split_path_segments(path: &str) -> Result<Vec<String>, ExtguardError> {
    path.split('/')
        .filter(|segment| !segment.is_empty())
        .map(|segment| {
            urlencoding::decode(segment)
                .map(|decoded| decoded.into_owned())
                .map_err(|e| ExtguardError::new(ExtguardErrorKind::Api(ApiError::BadPath), format!("Failed to decode path segment '{}': {}", segment, e)))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_path_segments() {
        assert_eq!(split_path_segments("/api/extensions/").unwrap(), vec!["api", "extensions"]);
        assert_eq!(split_path_segments("/api//extensions/custom/sh%20").unwrap(), vec!["api", "extensions", "custom", "sh "]);
        assert!(split_path_segments("/").unwrap().is_empty());
        assert!(split_path_segments("/api/%FF").is_err());
    }

    #[test]
    fn test_standard_headers() {
        let mut resp = ExtguardResponse::new_with_bytes(200, "data");
        add_standard_headers_to_response(&mut resp);
        assert_eq!(resp.headers().get("Server").unwrap(), "extguard");
        assert_eq!(resp.headers().get("Access-Control-Allow-Origin").unwrap(), "*");
        assert_eq!(resp.headers().get("Content-Type").unwrap(), "application/octet-stream");
    }
}
