use std::fmt;
use std::fmt::Formatter;

#[derive(Debug)]
pub struct MeteoError(pub String);
impl fmt::Display for MeteoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "MeteoError: {}", self.0)
    }
}
impl From<&str> for MeteoError {
    fn from(e: &str) -> Self { MeteoError(e.to_string()) }
}
impl From<reqwest::Error> for MeteoError {
    fn from(e: reqwest::Error) -> Self { MeteoError(e.to_string()) }
}
impl From<serde_json::Error> for MeteoError {
    fn from(e: serde_json::Error) -> Self { MeteoError(e.to_string()) }
}
impl From<chrono::ParseError> for MeteoError {
    fn from(e: chrono::ParseError) -> Self { MeteoError(e.to_string()) }
}
