use http::request::Parts;
use http_body_util::{BodyExt, LengthLimitError, Limited};
use hyper::body::Bytes;
use hyper::{Method, Request};
use serde::de::DeserializeOwned;

use crate::error::extguard_error::ExtguardError;
use crate::error::extguard_error_enums::{ApiError, ExtguardErrorKind, InvalidInputError};

// Upper bound for buffered request bodies, the API only takes small JSON documents
pub const MAX_REQUEST_BODY_SIZE: usize = 64 * 1024;

// Wrapper around a hyper request with its body already buffered
#[derive(Debug)]
pub struct ExtguardRequest {
    parts: Parts,
    body: Bytes,
}

impl ExtguardRequest {
    // Created new buffered request from hyper Request<Bytes>
    pub fn new(hyper_request: Request<Bytes>) -> Self {
        let (parts, body) = hyper_request.into_parts();
        Self { parts, body }
    }

    // Reads the whole incoming body, refusing anything larger than max_body_size
    pub async fn from_hyper(hyper_request: Request<hyper::body::Incoming>, max_body_size: usize) -> Result<Self, ExtguardError> {
        let (parts, body) = hyper_request.into_parts();

        let collected = Limited::new(body, max_body_size).collect().await;
        let body = match collected {
            Ok(c) => c.to_bytes(),
            Err(e) => {
                if e.downcast_ref::<LengthLimitError>().is_some() {
                    return Err(ExtguardError::new(ExtguardErrorKind::Api(ApiError::PayloadTooLarge), format!("Request body exceeds {} bytes", max_body_size)));
                }
                return Err(ExtguardError::new(ExtguardErrorKind::InvalidInput(InvalidInputError::RequestBody), format!("Failed to read request body: {}", e)));
            }
        };

        Ok(Self { parts, body })
    }

    pub fn get_http_method(&self) -> &Method {
        &self.parts.method
    }

    pub fn get_path(&self) -> &str {
        self.parts.uri.path()
    }

    pub fn get_body_bytes(&self) -> &Bytes {
        &self.body
    }

    pub fn parse_json_body<T: DeserializeOwned>(&self) -> Result<T, ExtguardError> {
        serde_json::from_slice(&self.body)
            .map_err(|e| ExtguardError::new(ExtguardErrorKind::InvalidInput(InvalidInputError::RequestBody), format!("Invalid JSON body: {}", e)))
    }
}
