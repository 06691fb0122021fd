use bundlehost_api::{ApiError, BridgeError, ComponentName, LaunchMode};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BundleHostError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON serialization/deserialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Unable to find explicit component {{ {name} }}")]
    ComponentNotFound { name: String },
    #[error("Bundle not found: {0}")]
    BundleNotFound(String),
    #[error("Runtime not set up: {0}")]
    NotSetUp(&'static str),
    #[error("No async runtime available")]
    NoAsyncRuntime,
    #[error("Runtime builder is missing {0}")]
    MissingCollaborator(&'static str),
    #[error(transparent)]
    Merge(#[from] MergeError),
    #[error("Platform bridge error: {0}")]
    Bridge(#[from] BridgeError),
    #[error("Collaborator error: {0}")]
    Api(#[from] ApiError),
    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StubPoolError {
    #[error("Launch mode {mode} is full ({capacity} stubs bound)")]
    Exhausted { mode: LaunchMode, capacity: usize },
}

#[derive(Error, Debug)]
pub enum MergeError {
    #[error("Namespaces already merged for this session")]
    AlreadyMerged,
    #[error("Platform refused {stage}: {source}")]
    Bridge {
        stage: &'static str,
        #[source]
        source: BridgeError,
    },
}

impl BundleHostError {
    pub fn component_not_found(name: &ComponentName) -> Self {
        BundleHostError::ComponentNotFound {
            name: name.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, BundleHostError>;
