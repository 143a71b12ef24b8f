use std::fmt;
use std::fmt::Formatter;

#[derive(Debug)]
pub struct ForecastError(pub String);
impl fmt::Display for ForecastError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "ForecastError: {}", self.0)
    }
}
impl From<&str> for ForecastError {
    fn from(e: &str) -> Self { ForecastError(e.to_string()) }
}
impl From<std::io::Error> for ForecastError {
    fn from(e: std::io::Error) -> Self { ForecastError(e.to_string()) }
}
impl From<Box<bincode::ErrorKind>> for ForecastError {
    fn from(e: Box<bincode::ErrorKind>) -> Self { ForecastError(e.to_string()) }
}
impl From<smartcore::error::Failed> for ForecastError {
    fn from(e: smartcore::error::Failed) -> Self { ForecastError(format!("{:?}", e)) }
}
