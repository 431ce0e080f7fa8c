use crate::form::ValidationError;
use peakview_protocol::RemoteError;
use std::error::Error;
use std::fmt;

#[derive(Debug)]
pub enum PeakViewError {
    String(String),
    Serde(serde_json::Error),
    Regex(regex::Error),
    Validation(ValidationError),
    Remote(RemoteError),
}

impl Error for PeakViewError {}

impl fmt::Display for PeakViewError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::String(s) => write!(f, "{s}"),
            Self::Serde(e) => write!(f, "JSON error: {e}"),
            Self::Regex(e) => write!(f, "Invalid pattern: {e}"),
            Self::Validation(e) => write!(f, "Invalid search: {e}"),
            Self::Remote(e) => write!(f, "Remote call failed: {e}"),
        }
    }
}

impl From<String> for PeakViewError {
    fn from(err: String) -> Self {
        PeakViewError::String(err)
    }
}

impl From<serde_json::Error> for PeakViewError {
    fn from(err: serde_json::Error) -> Self {
        PeakViewError::Serde(err)
    }
}

impl From<regex::Error> for PeakViewError {
    fn from(err: regex::Error) -> Self {
        PeakViewError::Regex(err)
    }
}

impl From<ValidationError> for PeakViewError {
    fn from(err: ValidationError) -> Self {
        PeakViewError::Validation(err)
    }
}

impl From<RemoteError> for PeakViewError {
    fn from(err: RemoteError) -> Self {
        PeakViewError::Remote(err)
    }
}
