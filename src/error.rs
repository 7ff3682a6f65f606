use thiserror::Error;

/// Errors raised while constructing a [`Site`](crate::proxy::Site)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SiteError {
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
    #[error("invalid timeout: {0}")]
    InvalidTimeout(String),
}
