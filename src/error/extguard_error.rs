use crate::error::extguard_error_enums::*;
use std::fmt;

#[derive(Debug)]
pub struct ExtguardError {
    pub kind: ExtguardErrorKind,
    pub message: String,
}

impl ExtguardError {
    pub fn new<S: Into<String>>(kind: ExtguardErrorKind, message: S) -> Self {
        Self { kind, message: message.into() }
    }

    pub fn new_with_kind_only(kind: ExtguardErrorKind) -> Self {
        Self { kind, message: String::new() }
    }

    pub fn storage<S: Into<String>>(message: S) -> Self {
        Self::new(ExtguardErrorKind::StorageFailure, message)
    }

    pub fn invalid_input(reason: InvalidInputError) -> Self {
        Self::new_with_kind_only(ExtguardErrorKind::InvalidInput(reason))
    }

    pub fn get_http_status_code(&self) -> u16 {
        match self.kind {
            ExtguardErrorKind::NotFound => 404,
            ExtguardErrorKind::LimitExceeded => 400,
            ExtguardErrorKind::AlreadyExists => 400,
            ExtguardErrorKind::InvalidInput(_) => 400,
            ExtguardErrorKind::Api(ApiError::NoRouteMatched) => 404,
            ExtguardErrorKind::Api(ApiError::MethodNotAllowed) => 405,
            ExtguardErrorKind::Api(ApiError::PayloadTooLarge) => 413,
            ExtguardErrorKind::Api(ApiError::BadPath) => 400,
            ExtguardErrorKind::StorageFailure => 500,
        }
    }

    /// Message that is safe to hand to API clients. Endpoints usually replace
    /// the generic storage failure message with their own.
    pub fn get_client_message(&self) -> &'static str {
        match self.kind {
            ExtguardErrorKind::NotFound => "Extension not found",
            ExtguardErrorKind::LimitExceeded => "Maximum custom extensions limit reached",
            ExtguardErrorKind::AlreadyExists => "Extension already exists",
            ExtguardErrorKind::InvalidInput(InvalidInputError::ExtensionLength) => "Invalid extension length",
            ExtguardErrorKind::InvalidInput(InvalidInputError::ExtensionFormat) => "Invalid extension format",
            ExtguardErrorKind::InvalidInput(InvalidInputError::SizeLimitRange) => "Invalid file size limit. Must be between 0-1024 MB.",
            ExtguardErrorKind::InvalidInput(InvalidInputError::RequestBody) => "Invalid request body",
            ExtguardErrorKind::Api(ApiError::NoRouteMatched) => "Not found",
            ExtguardErrorKind::Api(ApiError::MethodNotAllowed) => "Method not allowed",
            ExtguardErrorKind::Api(ApiError::PayloadTooLarge) => "Request body too large",
            ExtguardErrorKind::Api(ApiError::BadPath) => "Invalid path",
            ExtguardErrorKind::StorageFailure => "Internal server error",
        }
    }
}

impl fmt::Display for ExtguardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.message.is_empty() {
            write!(f, "{:?}", self.kind)
        } else {
            write!(f, "{:?}: {}", self.kind, self.message)
        }
    }
}

impl std::error::Error for ExtguardError {}
