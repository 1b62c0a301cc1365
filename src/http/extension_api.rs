use hyper::Method;
use serde::Deserialize;

use crate::error::extguard_error::ExtguardError;
use crate::error::extguard_error_enums::{ApiError, ExtguardErrorKind, InvalidInputError};
use crate::http::http_util::{error_json_response, error_to_response, split_path_segments, success_response};
use crate::http::request_response::extguard_request::ExtguardRequest;
use crate::http::request_response::extguard_response::ExtguardResponse;
use crate::logging::syslog::{debug, error, trace};
use crate::policy::extension_policy::MAX_FILE_SIZE_LIMIT_MB;
use crate::policy::policy_evaluator::evaluate;
use crate::policy::policy_store::PolicyStore;

#[derive(Deserialize)]
struct FixedExtensionUpdate {
    blocked: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct EvaluateFile {
    file_name: String,
    file_size: u64,
}

#[derive(Deserialize)]
struct EvaluateRequest {
    files: Vec<EvaluateFile>,
}

/// Routes everything below /api. Endpoint failures are already turned into
/// responses here, an Err means the route itself did not match.
pub async fn handle_api_routes(request: &ExtguardRequest, policy_store: &PolicyStore) -> Result<ExtguardResponse, ExtguardError> {
    let segments = split_path_segments(request.get_path())?;
    let segments: Vec<&str> = segments.iter().map(|s| s.as_str()).collect();
    let method = request.get_http_method();

    trace(format!("Handling api request {} {}", method, request.get_path()));

    match (method, segments.as_slice()) {
        (&Method::GET, ["api", "extensions"]) => Ok(get_extensions_endpoint(policy_store)),
        (&Method::PUT, ["api", "extensions", "fixed", name]) => Ok(put_fixed_extension_endpoint(request, policy_store, name)),
        (&Method::POST, ["api", "extensions", "custom"]) => Ok(post_custom_extension_endpoint(request, policy_store)),
        (&Method::DELETE, ["api", "extensions", "custom", extension]) => Ok(delete_custom_extension_endpoint(policy_store, extension)),
        (&Method::GET, ["api", "settings", "file-size-limit"]) => Ok(get_file_size_limit_endpoint(policy_store)),
        (&Method::PUT, ["api", "settings", "file-size-limit"]) => Ok(put_file_size_limit_endpoint(request, policy_store)),
        (&Method::POST, ["api", "evaluate"]) => Ok(post_evaluate_endpoint(request, policy_store)),
        (&Method::GET, ["api", "healthcheck"]) => Ok(ExtguardResponse::new_text(hyper::StatusCode::OK.as_u16(), "The server is healthy")),
        (_, ["api", "extensions"])
        | (_, ["api", "extensions", "fixed", _])
        | (_, ["api", "extensions", "custom"])
        | (_, ["api", "extensions", "custom", _])
        | (_, ["api", "settings", "file-size-limit"])
        | (_, ["api", "evaluate"])
        | (_, ["api", "healthcheck"]) => Err(ExtguardError::new(ExtguardErrorKind::Api(ApiError::MethodNotAllowed), format!("{} not allowed on {}", method, request.get_path()))),
        _ => {
            trace(format!("No matching api route found for path: {}", request.get_path()));
            Err(ExtguardError::new_with_kind_only(ExtguardErrorKind::Api(ApiError::NoRouteMatched)))
        }
    }
}

fn get_extensions_endpoint(policy_store: &PolicyStore) -> ExtguardResponse {
    let snapshot = match policy_store.snapshot() {
        Ok(s) => s,
        Err(e) => {
            error(format!("Error fetching extensions: {}", e));
            return error_to_response(&e, "Failed to read data");
        }
    };

    match serde_json::to_value(&snapshot) {
        Ok(json) => ExtguardResponse::new_json(hyper::StatusCode::OK.as_u16(), &json),
        Err(e) => {
            error(format!("Failed to serialize extensions: {}", e));
            error_json_response(hyper::StatusCode::INTERNAL_SERVER_ERROR.as_u16(), "Failed to read data")
        }
    }
}

fn put_fixed_extension_endpoint(request: &ExtguardRequest, policy_store: &PolicyStore, name: &str) -> ExtguardResponse {
    let update: FixedExtensionUpdate = match request.parse_json_body() {
        Ok(u) => u,
        Err(e) => {
            debug(format!("Rejected fixed extension update for '{}': {}", name, e));
            return error_to_response(&e, "Failed to update extension");
        }
    };

    match policy_store.set_fixed_blocked(name, update.blocked) {
        Ok(true) => success_response(),
        Ok(false) => error_to_response(&ExtguardError::new_with_kind_only(ExtguardErrorKind::NotFound), "Failed to update extension"),
        Err(e) => {
            error(format!("Error updating fixed extension: {}", e));
            error_to_response(&e, "Failed to update extension")
        }
    }
}

fn post_custom_extension_endpoint(request: &ExtguardRequest, policy_store: &PolicyStore) -> ExtguardResponse {
    let body: serde_json::Value = match request.parse_json_body() {
        Ok(b) => b,
        Err(e) => {
            debug(format!("Rejected custom extension request: {}", e));
            return error_to_response(&e, "Failed to add custom extension");
        }
    };

    // A missing or non-string extension is reported like an empty one
    let extension = body.get("extension").and_then(|v| v.as_str()).unwrap_or("");

    match policy_store.add_custom(extension) {
        Ok(_) => success_response(),
        Err(e) => {
            if e.kind == ExtguardErrorKind::StorageFailure {
                error(format!("Error adding custom extension: {}", e));
            } else {
                debug(format!("Custom extension '{}' rejected: {}", extension, e));
            }
            error_to_response(&e, "Failed to add custom extension")
        }
    }
}

fn delete_custom_extension_endpoint(policy_store: &PolicyStore, extension: &str) -> ExtguardResponse {
    match policy_store.remove_custom(extension) {
        Ok(true) => success_response(),
        Ok(false) => error_to_response(&ExtguardError::new_with_kind_only(ExtguardErrorKind::NotFound), "Failed to delete custom extension"),
        Err(e) => {
            error(format!("Error deleting custom extension: {}", e));
            error_to_response(&e, "Failed to delete custom extension")
        }
    }
}

fn get_file_size_limit_endpoint(policy_store: &PolicyStore) -> ExtguardResponse {
    match policy_store.get_size_limit_mb() {
        Ok(limit) => ExtguardResponse::new_json(hyper::StatusCode::OK.as_u16(), &serde_json::json!({ "fileSizeLimit": limit })),
        Err(e) => {
            error(format!("Error fetching file size limit: {}", e));
            error_to_response(&e, "Failed to fetch file size limit")
        }
    }
}

fn put_file_size_limit_endpoint(request: &ExtguardRequest, policy_store: &PolicyStore) -> ExtguardResponse {
    let range_error = ExtguardError::invalid_input(InvalidInputError::SizeLimitRange);

    let body: serde_json::Value = match request.parse_json_body() {
        Ok(b) => b,
        Err(e) => {
            debug(format!("Rejected file size limit request: {}", e));
            return error_to_response(&range_error, "Failed to set file size limit");
        }
    };

    // Any JSON number is accepted, fractions are floored once the range is known to be valid
    let limit = match body.get("limit").and_then(|v| v.as_f64()) {
        Some(l) if (0.0..=MAX_FILE_SIZE_LIMIT_MB as f64).contains(&l) => l.floor() as i64,
        _ => return error_to_response(&range_error, "Failed to set file size limit"),
    };

    match policy_store.set_size_limit_mb(limit) {
        Ok(_) => success_response(),
        Err(e) => {
            error(format!("Error setting file size limit: {}", e));
            error_to_response(&e, "Failed to set file size limit")
        }
    }
}

fn post_evaluate_endpoint(request: &ExtguardRequest, policy_store: &PolicyStore) -> ExtguardResponse {
    let evaluate_request: EvaluateRequest = match request.parse_json_body() {
        Ok(r) => r,
        Err(e) => {
            debug(format!("Rejected evaluate request: {}", e));
            return error_to_response(&e, "Failed to read data");
        }
    };

    let snapshot = match policy_store.snapshot() {
        Ok(s) => s,
        Err(e) => {
            error(format!("Error fetching extensions for evaluation: {}", e));
            return error_to_response(&e, "Failed to read data");
        }
    };

    let results: Vec<_> = evaluate_request.files.iter().map(|file| evaluate(&file.file_name, file.file_size, &snapshot)).collect();

    match serde_json::to_value(&results) {
        Ok(json) => ExtguardResponse::new_json(hyper::StatusCode::OK.as_u16(), &serde_json::json!({ "results": json })),
        Err(e) => {
            error(format!("Failed to serialize evaluation results: {}", e));
            error_json_response(hyper::StatusCode::INTERNAL_SERVER_ERROR.as_u16(), "Failed to read data")
        }
    }
}
