#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Failure raised while touching host-platform internals.
///
/// Bridges report these when the platform's shape differs from what they
/// were written against; the engine logs them and degrades instead of
/// propagating to the host.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error("Unsupported capability: {capability} ({detail})")]
    Unsupported {
        capability: &'static str,
        detail: String,
    },
    #[error("Platform call failed: {0}")]
    Call(String),
}

pub type BridgeResult<T> = std::result::Result<T, BridgeError>;
