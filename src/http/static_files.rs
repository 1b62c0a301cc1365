use http::HeaderValue;
use std::path::{Path, PathBuf};

use crate::error::extguard_error::ExtguardError;
use crate::error::extguard_error_enums::{ApiError, ExtguardErrorKind};
use crate::http::http_util::split_path_segments;
use crate::http::request_response::extguard_response::ExtguardResponse;
use crate::logging::syslog::{debug, trace};

pub const INDEX_FILE_NAME: &str = "index.html";

/// Maps a request path onto a file below the public directory.
/// Traversal attempts and backslashes are refused outright rather than cleaned.
pub fn resolve_static_file_path(public_dir: &Path, request_path: &str) -> Result<PathBuf, ExtguardError> {
    let segments = split_path_segments(request_path)?;

    let mut full_path = public_dir.to_path_buf();
    for segment in &segments {
        if segment == ".." || segment == "." || segment.contains('\\') || segment.contains('/') || segment.contains(':') || segment.contains('\0') {
            return Err(ExtguardError::new(ExtguardErrorKind::Api(ApiError::BadPath), format!("Refusing static path segment '{}'", segment)));
        }
        full_path.push(segment);
    }

    if segments.is_empty() {
        full_path.push(INDEX_FILE_NAME);
    }

    Ok(full_path)
}

pub async fn serve_static_file(public_dir: &Path, request_path: &str) -> Result<ExtguardResponse, ExtguardError> {
    let mut file_path = resolve_static_file_path(public_dir, request_path)?;

    // Directories are served through their index file
    if tokio::fs::metadata(&file_path).await.map(|m| m.is_dir()).unwrap_or(false) {
        file_path.push(INDEX_FILE_NAME);
    }

    trace(format!("Serving static file {}", file_path.display()));

    let content = match tokio::fs::read(&file_path).await {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug(format!("Static file not found: {}", file_path.display()));
            return Err(ExtguardError::new_with_kind_only(ExtguardErrorKind::Api(ApiError::NoRouteMatched)));
        }
        Err(e) => {
            return Err(ExtguardError::storage(format!("Failed to read static file {}: {}", file_path.display(), e)));
        }
    };

    let mime_type = mime_guess::from_path(&file_path).first_or_octet_stream();
    let mut response = ExtguardResponse::new_with_bytes(hyper::StatusCode::OK.as_u16(), content);
    if let Ok(content_type) = HeaderValue::from_str(mime_type.as_ref()) {
        response.headers_mut().insert("Content-Type", content_type);
    }

    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_maps_to_index() {
        let path = resolve_static_file_path(Path::new("/srv/public"), "/").unwrap();
        assert_eq!(path, PathBuf::from("/srv/public/index.html"));
    }

    #[test]
    fn test_nested_path() {
        let path = resolve_static_file_path(Path::new("/srv/public"), "/js/script.js").unwrap();
        assert_eq!(path, PathBuf::from("/srv/public/js/script.js"));
    }

    #[test]
    fn test_traversal_is_refused() {
        for request_path in ["/../secret", "/a/%2e%2e/b", "/a%5c..%5cb", "/c:%2fwindows", "/a%2f..%2f..%2fetc"] {
            let err = resolve_static_file_path(Path::new("/srv/public"), request_path).unwrap_err();
            assert_eq!(err.kind, ExtguardErrorKind::Api(ApiError::BadPath), "path: {}", request_path);
        }
    }

    #[tokio::test]
    async fn test_serves_file_with_mime_type() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.html"), "<h1>hi</h1>").unwrap();
        std::fs::create_dir(dir.path().join("css")).unwrap();
        std::fs::write(dir.path().join("css/style.css"), "body {}").unwrap();

        let index = serve_static_file(dir.path(), "/").await.unwrap();
        assert_eq!(index.get_status(), 200);
        assert_eq!(index.headers().get("Content-Type").unwrap(), "text/html");
        assert_eq!(index.get_body_bytes().as_ref(), b"<h1>hi</h1>");

        let style = serve_static_file(dir.path(), "/css/style.css").await.unwrap();
        assert_eq!(style.headers().get("Content-Type").unwrap(), "text/css");

        // Directories fall back to their index file
        std::fs::write(dir.path().join("css/index.html"), "css index").unwrap();
        let directory = serve_static_file(dir.path(), "/css").await.unwrap();
        assert_eq!(directory.get_body_bytes().as_ref(), b"css index");

        let missing = serve_static_file(dir.path(), "/nope.css").await.unwrap_err();
        assert_eq!(missing.kind, ExtguardErrorKind::Api(ApiError::NoRouteMatched));
    }
}
