use catrec_catalog::{check_limit, CatalogClient, CatalogError, RecordFilter};
use catrec_schemas::{ProductOption, Record, RecordPage, RecordSummary};
use std::collections::BTreeSet;
use std::sync::Mutex;

/// One record as the fake catalog holds it.
#[derive(Clone, Debug, PartialEq)]
pub struct StoredRecord {
    pub id: String,
    pub label: String,
    pub options: Option<Vec<ProductOption>>,
}

impl StoredRecord {
    pub fn new(id: impl Into<String>, label: impl Into<String>, options: Vec<ProductOption>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            options: Some(options),
        }
    }

    /// A record whose option list the catalog never returns.
    pub fn without_options(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            options: None,
        }
    }
}

#[derive(Default)]
struct State {
    records: Vec<StoredRecord>,
    list_calls: Vec<(u32, u32)>,
    detail_calls: Vec<String>,
    patches: Vec<(String, Vec<ProductOption>)>,
}

/// Deterministic in-memory catalog.
///
/// Every record belongs to whatever category the filter names.
pub struct FakeCatalog {
    state: Mutex<State>,
    embed_options: bool,
    fail_list_at: Option<u32>,
    fail_detail: BTreeSet<String>,
    reject_patch: BTreeSet<String>,
    error_patch: BTreeSet<String>,
}

impl FakeCatalog {
    /// Options are embedded in list responses.
    pub fn new(records: Vec<StoredRecord>) -> Self {
        Self {
            state: Mutex::new(State {
                records,
                ..State::default()
            }),
            embed_options: true,
            fail_list_at: None,
            fail_detail: BTreeSet::new(),
            reject_patch: BTreeSet::new(),
            error_patch: BTreeSet::new(),
        }
    }

    /// List responses carry summaries only; options need a detail call.
    pub fn summaries_only(mut self) -> Self {
        self.embed_options = false;
        self
    }

    /// The list call at `offset` fails with a transport error.
    pub fn failing_list_at(mut self, offset: u32) -> Self {
        self.fail_list_at = Some(offset);
        self
    }

    /// Detail calls for `id` answer 404.
    pub fn failing_detail(mut self, id: &str) -> Self {
        self.fail_detail.insert(id.to_string());
        self
    }

    /// Writes to `id` answer non-2xx (`Ok(false)`); nothing is stored.
    pub fn rejecting_patch(mut self, id: &str) -> Self {
        self.reject_patch.insert(id.to_string());
        self
    }

    /// Writes to `id` fail in transit; nothing is stored.
    pub fn erroring_patch(mut self, id: &str) -> Self {
        self.error_patch.insert(id.to_string());
        self
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        // A panicking test thread poisons the lock; the data is still usable.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// `(offset, limit)` of every list call, in order.
    pub fn list_calls(&self) -> Vec<(u32, u32)> {
        self.lock().list_calls.clone()
    }

    pub fn detail_calls(&self) -> Vec<String> {
        self.lock().detail_calls.clone()
    }

    /// Every accepted write, in order.
    pub fn patches(&self) -> Vec<(String, Vec<ProductOption>)> {
        self.lock().patches.clone()
    }

    pub fn record(&self, id: &str) -> Option<StoredRecord> {
        self.lock().records.iter().find(|r| r.id == id).cloned()
    }
}

#[async_trait::async_trait]
impl CatalogClient for FakeCatalog {
    async fn list_records(
        &self,
        _filter: &RecordFilter,
        offset: u32,
        limit: u32,
    ) -> Result<RecordPage, CatalogError> {
        check_limit(limit)?;
        let mut st = self.lock();
        st.list_calls.push((offset, limit));

        if self.fail_list_at == Some(offset) {
            return Err(CatalogError::Transport(format!(
                "connection reset at offset {offset}"
            )));
        }

        let total = st.records.len() as u64;
        let items: Vec<RecordSummary> = st
            .records
            .iter()
            .skip(offset as usize)
            .take(limit as usize)
            .map(|r| RecordSummary {
                id: r.id.clone(),
                label: r.label.clone(),
                options: if self.embed_options {
                    r.options.clone()
                } else {
                    None
                },
            })
            .collect();
        let has_more = u64::from(offset) + (items.len() as u64) < total;

        Ok(RecordPage {
            items,
            total: Some(total),
            has_more,
        })
    }

    async fn get_record_detail(&self, id: &str) -> Result<Record, CatalogError> {
        let mut st = self.lock();
        st.detail_calls.push(id.to_string());

        let found = st.records.iter().find(|r| r.id == id).cloned();
        match found {
            Some(r) if !self.fail_detail.contains(id) => Ok(Record {
                id: r.id,
                label: r.label,
                options: r.options,
            }),
            _ => Err(CatalogError::Status {
                status: 404,
                body: format!("product {id} not found"),
            }),
        }
    }

    async fn patch_options(
        &self,
        id: &str,
        options: &[ProductOption],
    ) -> Result<bool, CatalogError> {
        if self.error_patch.contains(id) {
            return Err(CatalogError::Transport("connection reset".to_string()));
        }
        if self.reject_patch.contains(id) {
            return Ok(false);
        }

        let mut st = self.lock();
        let Some(rec) = st.records.iter_mut().find(|r| r.id == id) else {
            return Ok(false);
        };
        rec.options = Some(options.to_vec());
        st.patches.push((id.to_string(), options.to_vec()));
        Ok(true)
    }
}
