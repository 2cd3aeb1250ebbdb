use std::error::Error;
use std::fmt;

use simple_error::SimpleError;

pub type FrateResult<T> = Result<T, FrateError>;

#[derive(Debug, PartialEq)]
pub enum FrateError {
    /// Invalid rate parameters or an out-of-range group directive.
    Configuration(SimpleError),
    /// A well-formed event that cannot belong to the trial, e.g. an unknown neuron index.
    Data {
        trial_id: String,
        line: Option<usize>,
        message: String,
    },
    /// A malformed event record.
    NumericParse {
        trial_id: String,
        line: usize,
        content: String,
    },
    Io {
        path: String,
        message: String,
    },
}

impl FrateError {
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        FrateError::Configuration(SimpleError::new(message.into()))
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, FrateError::Configuration(_))
    }
}

impl fmt::Display for FrateError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FrateError::Configuration(e) => write!(f, "configuration error: {}", e),
            FrateError::Data {
                trial_id,
                line: Some(line),
                message,
            } => write!(f, "data error in {} (line {}): {}", trial_id, line, message),
            FrateError::Data {
                trial_id,
                line: None,
                message,
            } => write!(f, "data error in {}: {}", trial_id, message),
            FrateError::NumericParse {
                trial_id,
                line,
                content,
            } => write!(
                f,
                "malformed event record in {} (line {}): {:?}",
                trial_id, line, content
            ),
            FrateError::Io { path, message } => write!(f, "i/o error on {}: {}", path, message),
        }
    }
}

impl Error for FrateError {}

impl From<SimpleError> for FrateError {
    fn from(e: SimpleError) -> Self {
        FrateError::Configuration(e)
    }
}
