use thiserror::Error;

#[derive(Error, Debug)]
pub enum AddrError {
    #[error("Invalid address: {0}")]
    AddressFormat(String),
    #[error("Invalid prefix length {len}, must be <= {max}")]
    InvalidPrefixLength { len: usize, max: usize },
    #[error("Type mismatch: {0}")]
    TypeMismatch(String),
    #[error("Byte index {index} out of range, must be < {len}")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("Json: {0}")]
    Json(#[from] serde_json::Error),
}

pub type AddrResult<T> = std::result::Result<T, AddrError>;
