use thiserror::Error;

/// Failure to turn input text into a deck. Nothing is stored when this is returned.
#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("no API key configured for the completion provider")]
    MissingCredential,

    #[error("completion request failed: {0}")]
    Transport(String),

    #[error("completion provider returned an empty response")]
    EmptyResponse,

    #[error("completion response is not a slide document: {0}")]
    Decode(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("presentation package error: {0}")]
    Package(String),

    #[error("rendering failed ({original}) and the diagnostic deck failed too ({fallback})")]
    FallbackFailed { original: String, fallback: String },
}

impl From<zip::result::ZipError> for RenderError {
    fn from(e: zip::result::ZipError) -> Self {
        RenderError::Package(e.to_string())
    }
}

impl From<std::fmt::Error> for RenderError {
    fn from(e: std::fmt::Error) -> Self {
        RenderError::Package(e.to_string())
    }
}

impl From<quick_xml::Error> for RenderError {
    fn from(e: quick_xml::Error) -> Self {
        RenderError::Package(e.to_string())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("deck not found: {id}")]
pub struct NotFoundError {
    pub id: String,
}

/// Errors surfaced by [`crate::SlideService`] to the transport layer.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    NotFound(#[from] NotFoundError),

    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error(transparent)]
    Render(#[from] RenderError),
}

pub type Result<T, E = ServiceError> = std::result::Result<T, E>;
