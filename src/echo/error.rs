use thiserror::Error;

#[derive(Debug, Error)]
pub enum EchoError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("echo service returned {status}: {body}")]
    Service { status: u16, body: String },
    #[error("invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("response shape is empty")]
    EmptyShape,
    #[error("payload holds {actual} bytes, shape needs {expected}")]
    ShapeMismatch { expected: usize, actual: usize },
}
