#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ExtguardErrorKind {
    NotFound,
    LimitExceeded,
    AlreadyExists,
    InvalidInput(InvalidInputError),
    StorageFailure,
    Api(ApiError),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InvalidInputError {
    ExtensionLength,
    ExtensionFormat,
    SizeLimitRange,
    RequestBody,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ApiError {
    NoRouteMatched,
    MethodNotAllowed,
    PayloadTooLarge,
    BadPath,
}
