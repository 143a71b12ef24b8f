use std::fmt;
use std::fmt::Formatter;

#[derive(Debug)]
pub enum PseError {
    Api(String),
    Document(String),
    Other(String),
}

impl fmt::Display for PseError {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            PseError::Api(e)      => write!(f, "PseError::Api: {}", e),
            PseError::Document(e) => write!(f, "PseError::Document: {}", e),
            PseError::Other(e)    => write!(f, "PseError::Other: {}", e),
        }
    }
}
impl From<String> for PseError {
    fn from(e: String) -> Self {
        PseError::Other(e)
    }
}
impl From<&str> for PseError {
    fn from(e: &str) -> Self {
        PseError::Other(e.to_string())
    }
}
impl From<reqwest::Error> for PseError {
    fn from(e: reqwest::Error) -> PseError {
        PseError::Api(e.to_string())
    }
}
impl From<serde_json::Error> for PseError {
    fn from(e: serde_json::Error) -> PseError {
        PseError::Document(e.to_string())
    }
}
impl From<chrono::ParseError> for PseError {
    fn from(e: chrono::ParseError) -> PseError { PseError::Document(e.to_string()) }
}
