use crate::auth::AuthError;

/// Core error type for the bot.
///
/// Adapter crates map their specific errors into this type so the core can
/// tell caller-facing auth failures apart from collaborator failures.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("config error: {0}")]
    Config(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported message envelope: {0}")]
    Envelope(String),

    #[error("external error: {0}")]
    External(String),
}

impl Error {
    /// HTTP-style status for errors an administrative caller should see.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Error::Auth(e) => Some(e.status_code()),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
