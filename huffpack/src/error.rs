use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("empty input: nothing to encode")]
    EmptyInput,

    #[error("malformed frame: {0}")]
    MalformedFrame(String),

    #[error("corrupt payload: {0}")]
    CorruptPayload(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::MalformedFrame(format!("invalid header: {err}"))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
