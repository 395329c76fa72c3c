//! HTTP-backed catalog client.
//!
//! Endpoints, relative to `base_url`:
//! - list:   `GET  /products?categories={id}&offset={o}&limit={l}`
//! - detail: `GET  /products/{id}?responseFields=id,name,options`
//! - update: `PUT  /products/{id}` with `{"options": [...]}` (full replace)
//!
//! Every call carries `Authorization: Bearer <token>`. The token is passed in
//! by the caller; do not log it.

use crate::{check_limit, CatalogClient, CatalogError, RecordFilter};
use catrec_schemas::{ProductOption, Record, RecordPage, RecordSummary};
use reqwest::header::ACCEPT;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Error bodies are logged and carried in errors; keep them short.
const MAX_ERROR_BODY_CHARS: usize = 512;

#[derive(Clone)]
pub struct HttpCatalogClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl std::fmt::Debug for HttpCatalogClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpCatalogClient")
            .field("base_url", &self.base_url)
            .field("token", &"<REDACTED>")
            .finish()
    }
}

impl HttpCatalogClient {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self::with_http(reqwest::Client::new(), base_url, token)
    }

    pub fn with_http(
        http: reqwest::Client,
        base_url: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn products_url(&self) -> String {
        format!("{}/products", self.base_url)
    }

    /// The id is pushed as one path segment, so `/`, `?` and `#` are escaped.
    fn product_url(&self, id: &str) -> Result<reqwest::Url, CatalogError> {
        let mut url = reqwest::Url::parse(&self.products_url())
            .map_err(|e| CatalogError::InvalidRequest(format!("base url: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| CatalogError::InvalidRequest("base url cannot carry a path".to_string()))?
            .push(id);
        Ok(url)
    }

    fn get<U: reqwest::IntoUrl>(&self, url: U) -> reqwest::RequestBuilder {
        self.http
            .get(url)
            .bearer_auth(&self.token)
            .header(ACCEPT, "application/json")
    }
}

#[derive(Debug, Deserialize)]
struct ListResponse {
    #[serde(default)]
    total: Option<u64>,
    #[serde(default)]
    items: Vec<RecordSummary>,
}

#[derive(Serialize)]
struct OptionsUpdate<'a> {
    options: &'a [ProductOption],
}

/// `offset + count < total` when the catalog reports a total, otherwise a
/// full page is taken to mean more may follow.
pub(crate) fn compute_has_more(offset: u32, limit: u32, count: usize, total: Option<u64>) -> bool {
    match total {
        Some(t) => (offset as u64) + (count as u64) < t,
        None => count > 0 && count as u64 >= limit as u64,
    }
}

fn truncate_body(body: &str) -> String {
    if body.chars().count() <= MAX_ERROR_BODY_CHARS {
        return body.to_string();
    }
    let mut out: String = body.chars().take(MAX_ERROR_BODY_CHARS).collect();
    out.push_str("...");
    out
}

async fn status_error(resp: reqwest::Response) -> CatalogError {
    let status = resp.status().as_u16();
    let body = resp.text().await.unwrap_or_default();
    CatalogError::Status {
        status,
        body: truncate_body(&body),
    }
}

#[async_trait::async_trait]
impl CatalogClient for HttpCatalogClient {
    async fn list_records(
        &self,
        filter: &RecordFilter,
        offset: u32,
        limit: u32,
    ) -> Result<RecordPage, CatalogError> {
        check_limit(limit)?;

        let resp = self
            .get(self.products_url())
            .query(&[
                ("categories", filter.category_id.clone()),
                ("offset", offset.to_string()),
                ("limit", limit.to_string()),
            ])
            .send()
            .await
            .map_err(|e| CatalogError::Transport(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(status_error(resp).await);
        }

        let body: ListResponse = resp
            .json()
            .await
            .map_err(|e| CatalogError::Decode(format!("list response: {e}")))?;

        let has_more = compute_has_more(offset, limit, body.items.len(), body.total);
        debug!(
            category = %filter.category_id,
            offset,
            count = body.items.len(),
            total = ?body.total,
            has_more,
            "catalog page fetched"
        );

        Ok(RecordPage {
            items: body.items,
            total: body.total,
            has_more,
        })
    }

    async fn get_record_detail(&self, id: &str) -> Result<Record, CatalogError> {
        let resp = self
            .get(self.product_url(id)?)
            .query(&[("responseFields", "id,name,options")])
            .send()
            .await
            .map_err(|e| CatalogError::Transport(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(status_error(resp).await);
        }

        resp.json::<Record>()
            .await
            .map_err(|e| CatalogError::Decode(format!("record {id}: {e}")))
    }

    async fn patch_options(
        &self,
        id: &str,
        options: &[ProductOption],
    ) -> Result<bool, CatalogError> {
        let resp = self
            .http
            .put(self.product_url(id)?)
            .bearer_auth(&self.token)
            .header(ACCEPT, "application/json")
            .json(&OptionsUpdate { options })
            .send()
            .await
            .map_err(|e| CatalogError::Transport(e.to_string()))?;

        let status = resp.status();
        if status.is_success() {
            return Ok(true);
        }

        let body = resp.text().await.unwrap_or_default();
        warn!(
            record_id = %id,
            status = status.as_u16(),
            body = %truncate_body(&body),
            "catalog rejected option update"
        );
        Ok(false)
    }
}
