use thiserror::Error;

/// Errors a [`CatalogClient`](crate::CatalogClient) call may return.
///
/// `Transport` and `Status` are both transport-level failures from the
/// caller's point of view; they are kept apart for logging.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Network failure; the catalog was not reached or the exchange broke off.
    #[error("transport error: {0}")]
    Transport(String),
    /// The catalog answered with a non-2xx status.
    #[error("catalog http error status={status}: {body}")]
    Status { status: u16, body: String },
    /// A response payload could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),
    /// The request was rejected locally and never sent.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}
