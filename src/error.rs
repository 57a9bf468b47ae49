use std::error::Error;
use std::fmt;

#[derive(Debug)]
pub enum LatentScopeError {
    /// Malformed or length-mismatched input. Fatal to the operation that
    /// raised it; no partial result is returned.
    InvalidInput(String),
    /// A layer/latent combination absent from the loaded data. Lookups
    /// resolve to empty collections instead; this variant exists for
    /// user-facing messaging.
    NotFound(String),
    Io(std::io::Error),
    Serde(serde_json::Error),
}

impl Error for LatentScopeError {}

impl fmt::Display for LatentScopeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            LatentScopeError::InvalidInput(s) => write!(f, "invalid input: {s}"),
            LatentScopeError::NotFound(s) => write!(f, "not found: {s}"),
            LatentScopeError::Io(e) => write!(f, "{e}"),
            LatentScopeError::Serde(e) => write!(f, "{e}"),
        }
    }
}

impl From<String> for LatentScopeError {
    fn from(err: String) -> Self {
        LatentScopeError::InvalidInput(err)
    }
}

impl From<std::io::Error> for LatentScopeError {
    fn from(err: std::io::Error) -> Self {
        LatentScopeError::Io(err)
    }
}

impl From<serde_json::Error> for LatentScopeError {
    fn from(err: serde_json::Error) -> Self {
        LatentScopeError::Serde(err)
    }
}
