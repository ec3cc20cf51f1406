// course-portal/crates/course-portal/src/error.rs
//! Error taxonomy for the portal

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PortalError {
    /// Upload rejected because the filename extension is not allowed.
    #[error("Invalid file: {0}")]
    InvalidFile(String),

    /// A requested file or resource does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Answer/question text could not be decoded with any known encoding.
    /// Unlike discussion reads this is surfaced: silent loss here would hide
    /// graded content.
    #[error("Undecodable text: {0}")]
    DecodeFailure(String),

    /// The inference backend could not be reached.
    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),

    /// Filesystem error while rebuilding the resource tree (strict mode).
    #[error("Scan failed: {0}")]
    ScanFailure(std::io::Error),

    /// IO error outside of a scan.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl IntoResponse for PortalError {
    fn into_response(self) -> Response {
        let status = match self {
            PortalError::InvalidFile(_) => StatusCode::BAD_REQUEST,
            PortalError::NotFound(_) => StatusCode::NOT_FOUND,
            PortalError::DecodeFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
            PortalError::BackendUnavailable(_) => StatusCode::BAD_GATEWAY,
            PortalError::ScanFailure(_) | PortalError::Io(_) | PortalError::Other(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (status, self.to_string()).into_response()
    }
}

pub type PortalResult<T> = Result<T, PortalError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let resp = PortalError::NotFound("answer7.jpg".into()).into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let resp = PortalError::InvalidFile("virus.exe".into()).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = PortalError::BackendUnavailable("connection refused".into()).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    }
}
