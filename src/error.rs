use thiserror::Error;

#[derive(Error, Debug)]
pub enum PacklockError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Key must be exactly {expected} characters, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },

    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    #[error("Incorrect key: no manifest could be decrypted")]
    KeyMismatch,

    #[error("No contents.json manifest found in archive")]
    ManifestNotFound,

    #[error("Invalid pack format: {0}")]
    InvalidFormat(String),
}

pub type Result<T> = std::result::Result<T, PacklockError>;
