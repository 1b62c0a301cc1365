use http::HeaderValue;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Method, Request, Response};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::error::extguard_error::ExtguardError;
use crate::error::extguard_error_enums::{ApiError, ExtguardErrorKind};
use crate::http::extension_api::handle_api_routes;
use crate::http::http_util::{add_standard_headers_to_response, cors_preflight_response, error_to_response};
use crate::http::request_response::extguard_request::{ExtguardRequest, MAX_REQUEST_BODY_SIZE};
use crate::http::request_response::extguard_response::ExtguardResponse;
use crate::http::static_files::serve_static_file;
use crate::logging::syslog::{debug, trace};
use crate::policy::policy_store::PolicyStore;

const API_PATH_PREFIX: &str = "/api";

/// Shared by every connection the server accepts
pub struct ExtguardState {
    pub policy_store: Arc<PolicyStore>,
    // Static UI is only served when a public directory is configured
    pub public_dir: Option<PathBuf>,
}

impl ExtguardState {
    pub fn new(policy_store: Arc<PolicyStore>, public_dir: Option<PathBuf>) -> Self {
        ExtguardState { policy_store, public_dir }
    }
}

fn is_api_path(path: &str) -> bool {
    path == API_PATH_PREFIX || path.starts_with("/api/")
}

// Entry point from hyper, buffers the body and does the post-processing
pub async fn handle_request_entry(
    req: Request<hyper::body::Incoming>,
    state: Arc<ExtguardState>,
    remote_ip: String,
    shutdown_token: CancellationToken,
) -> Result<Response<Full<Bytes>>, hyper::Error> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let mut response = match ExtguardRequest::from_hyper(req, MAX_REQUEST_BODY_SIZE).await {
        Ok(request) => handle_request(request, &state).await,
        Err(e) => {
            debug(format!("Failed to read request body from {}: {}", remote_ip, e));
            let mut response = error_to_response(&e, "Failed to read data");
            add_standard_headers_to_response(&mut response);
            response
        }
    };

    // Ask the client to go away when we are shutting down
    if shutdown_token.is_cancelled() {
        response.headers_mut().insert("Connection", HeaderValue::from_static("close"));
    }

    trace(format!("{} {} {} -> {}", remote_ip, method, path, response.get_status()));

    Ok(response.into_hyper())
}

/// Routes a buffered request and always produces a response
pub async fn handle_request(request: ExtguardRequest, state: &ExtguardState) -> ExtguardResponse {
    let mut response = route_request(&request, state).await;
    add_standard_headers_to_response(&mut response);
    response
}

async fn route_request(request: &ExtguardRequest, state: &ExtguardState) -> ExtguardResponse {
    let method = request.get_http_method();

    if method == Method::OPTIONS {
        return cors_preflight_response();
    }

    if is_api_path(request.get_path()) {
        return match handle_api_routes(request, &state.policy_store).await {
            Ok(response) => response,
            Err(e) => error_to_response(&e, "Internal server error"),
        };
    }

    if method != Method::GET && method != Method::HEAD {
        let e = ExtguardError::new_with_kind_only(ExtguardErrorKind::Api(ApiError::MethodNotAllowed));
        return error_to_response(&e, "Internal server error");
    }

    let public_dir = match &state.public_dir {
        Some(dir) => dir,
        None => return error_to_response(&ExtguardError::new_with_kind_only(ExtguardErrorKind::Api(ApiError::NoRouteMatched)), "Internal server error"),
    };

    match serve_static_file(public_dir, request.get_path()).await {
        Ok(response) => response,
        Err(e) => {
            if e.kind == ExtguardErrorKind::StorageFailure {
                debug(format!("Static file error: {}", e));
            }
            error_to_response(&e, "Failed to read data")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_path_detection() {
        assert!(is_api_path("/api"));
        assert!(is_api_path("/api/extensions"));
        assert!(!is_api_path("/apidocs.html"));
        assert!(!is_api_path("/"));
    }
}
