use thiserror::Error;

/// Errors produced while parsing a `DXBC` container or one of its chunks.
///
/// Every variant carries a human-readable context string describing which
/// offset or field was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DxbcError {
    /// The fixed container header is missing or malformed.
    #[error("malformed DXBC header: {0}")]
    MalformedHeader(String),
    /// The chunk offset table points somewhere it must not.
    #[error("malformed DXBC offsets: {0}")]
    MalformedOffsets(String),
    /// A declared size or offset runs past the end of the buffer.
    #[error("DXBC data out of bounds: {0}")]
    OutOfBounds(String),
    /// A chunk payload could not be decoded.
    #[error("invalid DXBC chunk: {0}")]
    InvalidChunk(String),
    /// The shader program token stream is malformed.
    #[error("invalid shader program: {0}")]
    InvalidProgram(String),
    /// The container has no chunk this parser requires.
    #[error("missing {0} chunk")]
    MissingChunk(&'static str),
}

impl DxbcError {
    pub(crate) fn malformed_header(msg: impl Into<String>) -> Self {
        Self::MalformedHeader(msg.into())
    }

    pub(crate) fn malformed_offsets(msg: impl Into<String>) -> Self {
        Self::MalformedOffsets(msg.into())
    }

    pub(crate) fn out_of_bounds(msg: impl Into<String>) -> Self {
        Self::OutOfBounds(msg.into())
    }

    pub(crate) fn invalid_chunk(msg: impl Into<String>) -> Self {
        Self::InvalidChunk(msg.into())
    }

    pub(crate) fn invalid_program(msg: impl Into<String>) -> Self {
        Self::InvalidProgram(msg.into())
    }

    /// Returns the context string without the category prefix.
    pub fn context(&self) -> &str {
        match self {
            Self::MalformedHeader(msg)
            | Self::MalformedOffsets(msg)
            | Self::OutOfBounds(msg)
            | Self::InvalidChunk(msg)
            | Self::InvalidProgram(msg) => msg,
            Self::MissingChunk(name) => name,
        }
    }
}
