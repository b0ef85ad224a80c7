/// Core error types for the Mapreel frame pipeline.
use std::path::PathBuf;

/// A specialized Result type for Mapreel operations.
pub type MapreelResult<T> = Result<T, MapreelError>;

/// Top-level error type encompassing all Mapreel subsystems.
#[derive(Debug, thiserror::Error)]
pub enum MapreelError {
    /// A container, stream or codec could not be opened.
    #[error("open error: {message} ({path:?})")]
    Open { message: String, path: PathBuf },

    #[error("allocation error: {0}")]
    Allocation(String),

    #[error("decode error: {0}")]
    Decode(String),

    /// A GPU shader, pipeline or render target could not be created.
    #[error("GPU resource error: {0}")]
    Resource(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("encode error: {0}")]
    Encode(String),

    #[error("asset error: {message} ({path:?})")]
    Asset { message: String, path: PathBuf },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl MapreelError {
    /// Create an open error for a media source.
    pub fn open(message: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        MapreelError::Open {
            message: message.into(),
            path: path.into(),
        }
    }

    /// Create an asset error.
    pub fn asset(message: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        MapreelError::Asset {
            message: message.into(),
            path: path.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_error_display() {
        let err = MapreelError::open("no video stream", "/media/run.mp4");
        assert_eq!(
            err.to_string(),
            "open error: no video stream (\"/media/run.mp4\")"
        );
    }

    #[test]
    fn test_resource_error_display() {
        let err = MapreelError::Resource("shader link failed".into());
        assert!(err.to_string().contains("shader link failed"));
    }

    #[test]
    fn test_io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: MapreelError = io.into();
        assert!(matches!(err, MapreelError::Io(_)));
    }
}
