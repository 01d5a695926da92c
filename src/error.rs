//! Cachew proxy errors

use http::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SetupError {
    #[error("bind error ({0})")]
    Bind(std::io::Error),
}

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("missing version token in line {0:?}")]
    MissingVersionToken(String),
    #[error("invalid version {0:?}")]
    InvalidVersion(String),
    #[error("unsupported method {0}")]
    UnsupportedMethod(String),
    #[error("malformed header line {0:?}")]
    MalformedHeaderLine(String),
    #[error("missing host header")]
    MissingHost,
    #[error("{0}")]
    InvalidMethod(#[from] http::method::InvalidMethod),
    #[error("{0}")]
    InvalidStatus(#[from] http::status::InvalidStatusCode),
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("io error ({0})")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("io error ({0})")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("io error ({0})")]
    Io(#[from] std::io::Error),
    #[error("parse error ({0})")]
    Parse(#[from] ParseError),
    #[error("fetch error ({0})")]
    Fetch(#[from] FetchError),
    #[error("cache error ({0})")]
    Cache(#[from] CacheError),
    #[error("cached entry has no validator header")]
    MissingValidator,
    #[error("unexpected revalidation status {0}")]
    UnexpectedRevalidationStatus(StatusCode),
    #[error("error page unavailable ({0})")]
    ErrorPage(std::io::Error),
}
