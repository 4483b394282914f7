/// Errors surfaced by handlers and subscriber setup.
///
/// Rendering itself never fails; these come from encoding and from the
/// sink underneath.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("failed to write log entry: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode log entry: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to install global subscriber: {0}")]
    SetGlobalDefault(#[from] tracing::subscriber::SetGlobalDefaultError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
