use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde_json::Value;
use tracing::debug;
use url::Url;

use super::StoreBackend;
use super::query::{Filter, Query, Table};
use crate::config::StoreConfig;
use crate::error::StoreError;
use crate::utils::logging::body_preview;

const USER_AGENT: &str = concat!("nylah/", env!("CARGO_PKG_VERSION"));
const PREFER: HeaderName = HeaderName::from_static("prefer");
const APIKEY: HeaderName = HeaderName::from_static("apikey");
const RETURN_MINIMAL: &str = "return=minimal";
const MERGE_DUPLICATES: &str = "resolution=merge-duplicates,return=minimal";
const BODY_PREVIEW_CHARS: usize = 512;

/// PostgREST dialect over HTTPS (`{url}/rest/v1/{table}`).
///
/// Requests are sent once; there is no retry and no transaction.
#[derive(Debug, Clone)]
pub struct PostgrestStore {
    client: reqwest::Client,
    rest_base: Url,
}

impl PostgrestStore {
    pub fn new(cfg: &StoreConfig) -> Result<Self, StoreError> {
        let url = cfg.url.as_ref().ok_or(StoreError::NotConfigured("store.url"))?;
        let rest_base = rest_base(url)?;

        let mut headers = HeaderMap::new();
        if !cfg.api_key.is_empty() {
            let key = HeaderValue::from_str(&cfg.api_key)
                .map_err(|_| StoreError::NotConfigured("store.api_key (not a valid header value)"))?;
            let bearer = HeaderValue::from_str(&format!("Bearer {}", cfg.api_key))
                .map_err(|_| StoreError::NotConfigured("store.api_key (not a valid header value)"))?;
            headers.insert(APIKEY, key);
            headers.insert(reqwest::header::AUTHORIZATION, bearer);
        }

        let mut builder = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::none())
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(cfg.timeout_secs.max(1)))
            .default_headers(headers);

        if let Some(proxy_url) = cfg.proxy.as_ref() {
            builder = builder.proxy(reqwest::Proxy::all(proxy_url.as_str())?);
        }

        Ok(Self {
            client: builder.build()?,
            rest_base,
        })
    }

    fn table_url(&self, table: Table) -> Result<Url, StoreError> {
        Ok(self.rest_base.join(table.name())?)
    }

    async fn check(
        table: Table,
        resp: reqwest::Response,
    ) -> Result<reqwest::Response, StoreError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        Err(StoreError::Status {
            table: table.name(),
            status,
            body: body_preview(&body, BODY_PREVIEW_CHARS),
        })
    }
}

/// `https://x.supabase.co` -> `https://x.supabase.co/rest/v1/`
fn rest_base(url: &Url) -> Result<Url, StoreError> {
    let mut base = url.clone();
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    Ok(base.join("rest/v1/")?)
}

#[async_trait]
impl StoreBackend for PostgrestStore {
    async fn select(&self, table: Table, query: &Query) -> Result<Vec<Value>, StoreError> {
        debug!(store.table = table.name(), "[Store] select");
        let resp = self
            .client
            .get(self.table_url(table)?)
            .query(&query.query_pairs())
            .send()
            .await?;
        let rows = Self::check(table, resp).await?.json::<Vec<Value>>().await?;
        Ok(rows)
    }

    async fn insert(&self, table: Table, rows: Vec<Value>) -> Result<(), StoreError> {
        debug!(store.table = table.name(), rows = rows.len(), "[Store] insert");
        let resp = self
            .client
            .post(self.table_url(table)?)
            .header(PREFER, RETURN_MINIMAL)
            .json(&rows)
            .send()
            .await?;
        Self::check(table, resp).await?;
        Ok(())
    }

    async fn upsert(&self, table: Table, rows: Vec<Value>) -> Result<(), StoreError> {
        debug!(store.table = table.name(), rows = rows.len(), "[Store] upsert");
        let resp = self
            .client
            .post(self.table_url(table)?)
            .query(&[("on_conflict", "id")])
            .header(PREFER, MERGE_DUPLICATES)
            .json(&rows)
            .send()
            .await?;
        Self::check(table, resp).await?;
        Ok(())
    }

    async fn delete(&self, table: Table, filters: &[Filter]) -> Result<(), StoreError> {
        if filters.is_empty() {
            return Err(StoreError::UnfilteredDelete(table.name()));
        }
        debug!(store.table = table.name(), "[Store] delete");
        let pairs: Vec<(String, String)> = filters.iter().map(Filter::query_pair).collect();
        let resp = self
            .client
            .delete(self.table_url(table)?)
            .query(&pairs)
            .header(PREFER, RETURN_MINIMAL)
            .send()
            .await?;
        Self::check(table, resp).await?;
        Ok(())
    }
}
