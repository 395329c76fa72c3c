//! catrec-catalog
//!
//! Catalog client boundary: paginated list, per-record detail, and full-replace
//! option writes against the remote catalog's HTTP interface.
//!
//! This crate owns pagination parameters and HTTP plumbing only. It does not
//! pace writes, apply rules, or decide what a failure means for a run; the
//! reconciler does.

mod error;
pub mod http;

pub use error::CatalogError;
pub use http::HttpCatalogClient;

use catrec_schemas::{ProductOption, Record, RecordPage, RecordSummary};

/// Largest `limit` the remote list endpoint accepts.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Which subset of the catalog a run targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordFilter {
    pub category_id: String,
}

impl RecordFilter {
    pub fn category(category_id: impl Into<String>) -> Self {
        Self {
            category_id: category_id.into(),
        }
    }
}

/// Reject a page size the remote would refuse, before any request is sent.
pub fn check_limit(limit: u32) -> Result<(), CatalogError> {
    if limit == 0 || limit > MAX_PAGE_SIZE {
        return Err(CatalogError::InvalidRequest(format!(
            "limit must be within 1..={MAX_PAGE_SIZE}, got {limit}"
        )));
    }
    Ok(())
}

/// Remote catalog contract.
///
/// Implementations must be `Send + Sync` so callers can hold a
/// `Box<dyn CatalogClient>` across await points.
#[async_trait::async_trait]
pub trait CatalogClient: Send + Sync {
    /// One page of records matching `filter`, starting at `offset`.
    ///
    /// Callers advance `offset` by `limit` until an empty page (or
    /// `has_more == false`) comes back. `limit` must not exceed [`MAX_PAGE_SIZE`].
    async fn list_records(
        &self,
        filter: &RecordFilter,
        offset: u32,
        limit: u32,
    ) -> Result<RecordPage, CatalogError>;

    /// Current state of one record, including its full option list.
    async fn get_record_detail(&self, id: &str) -> Result<Record, CatalogError>;

    /// Replace the record's whole option list with `options`.
    ///
    /// `Ok(false)` means the catalog answered with a non-2xx status.
    /// `Err` means it could not be reached or the call failed in transit.
    async fn patch_options(&self, id: &str, options: &[ProductOption])
        -> Result<bool, CatalogError>;

    /// Fully populated record for a list entry: the embedded option list when
    /// the list call carried one, otherwise a detail call.
    async fn fetch_full_record(&self, summary: RecordSummary) -> Result<Record, CatalogError> {
        if summary.options.is_some() {
            return Ok(summary.into());
        }
        let mut record = self.get_record_detail(&summary.id).await?;
        if record.label.is_empty() {
            record.label = summary.label;
        }
        Ok(record)
    }
}
