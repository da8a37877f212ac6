use thiserror::Error;

#[derive(Error, Debug)]
pub enum PyjuterError {
    /// The input is not a usable notebook or source document.
    #[error("Format error: {0}")]
    Format(String),

    /// Caller misuse, e.g. an empty or duplicate inline module name.
    #[error("Config error: {0}")]
    Config(String),

    /// A shim or the registry bootstrap did not match its recorded form.
    #[error("Integrity error: {0}")]
    Integrity(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Api Error: {0}")]
    Api(String),
}

pub type Result<T> = std::result::Result<T, PyjuterError>;
