use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Metadata format error: {0}")]
    MetadataFormat(String),

    #[error("Entity not found: {0}")]
    EntityNotFound(String),

    #[error("Server not found: {0}")]
    ServerNotFound(String),

    #[error("Ambiguous server selection: {0}")]
    AmbiguousSelection(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP {status} fetching {url}")]
    Http { status: u16, url: String },

    #[error("Transport error fetching {url}: {message}")]
    Transport { url: String, message: String },

    #[error("Response format error: {0}")]
    ResponseFormat(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Post-processing error: {0}")]
    PostProcess(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Coarse classification of the error, stable across message changes.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::MetadataFormat(_) => ErrorKind::MetadataFormat,
            Error::EntityNotFound(_) => ErrorKind::EntityNotFound,
            Error::ServerNotFound(_) => ErrorKind::ServerNotFound,
            Error::AmbiguousSelection(_) => ErrorKind::AmbiguousSelection,
            Error::Io(_) => ErrorKind::Io,
            Error::Http { .. } | Error::Transport { .. } => ErrorKind::Http,
            Error::ResponseFormat(_) => ErrorKind::ResponseFormat,
            Error::Config(_) | Error::Json(_) => ErrorKind::Config,
            Error::PostProcess(_) => ErrorKind::PostProcess,
        }
    }
}

#[cfg(feature = "fetch")]
impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Transport {
            url: err
                .url()
                .map(|u| u.to_string())
                .unwrap_or_else(|| "<unknown>".to_string()),
            message: err.to_string(),
        }
    }
}

/// Error codes for structured failure reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ErrorKind {
    #[serde(rename = "METADATA_FORMAT")]
    MetadataFormat,
    #[serde(rename = "ENTITY_NOT_FOUND")]
    EntityNotFound,
    #[serde(rename = "SERVER_NOT_FOUND")]
    ServerNotFound,
    #[serde(rename = "AMBIGUOUS_SELECTION")]
    AmbiguousSelection,
    #[serde(rename = "IO")]
    Io,
    #[serde(rename = "HTTP")]
    Http,
    #[serde(rename = "RESPONSE_FORMAT")]
    ResponseFormat,
    #[serde(rename = "CONFIG")]
    Config,
    #[serde(rename = "POST_PROCESS")]
    PostProcess,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ErrorKind::MetadataFormat => "METADATA_FORMAT",
            ErrorKind::EntityNotFound => "ENTITY_NOT_FOUND",
            ErrorKind::ServerNotFound => "SERVER_NOT_FOUND",
            ErrorKind::AmbiguousSelection => "AMBIGUOUS_SELECTION",
            ErrorKind::Io => "IO",
            ErrorKind::Http => "HTTP",
            ErrorKind::ResponseFormat => "RESPONSE_FORMAT",
            ErrorKind::Config => "CONFIG",
            ErrorKind::PostProcess => "POST_PROCESS",
        };
        write!(f, "{}", s)
    }
}
