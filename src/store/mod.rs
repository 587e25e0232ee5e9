//! Client for the hosted store: generic row access plus typed operations.

mod postgrest;
mod query;

pub use postgrest::PostgrestStore;
pub use query::{Filter, FilterOp, Order, Query, Table};

use std::sync::Arc;

use async_trait::async_trait;
use nylah_schema::{AdminSettingsRow, BookingRow, QuoteRow, SETTINGS_ROW_ID, ServiceRow};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::StoreError;

/// Generic row access over the four tables.
#[async_trait]
pub trait StoreBackend: Send + Sync + 'static {
    async fn select(&self, table: Table, query: &Query) -> Result<Vec<Value>, StoreError>;

    async fn insert(&self, table: Table, rows: Vec<Value>) -> Result<(), StoreError>;

    /// Insert-or-merge on the `id` column.
    async fn upsert(&self, table: Table, rows: Vec<Value>) -> Result<(), StoreError>;

    /// Deletes matching rows. An empty filter list is refused.
    async fn delete(&self, table: Table, filters: &[Filter]) -> Result<(), StoreError>;
}

/// Typed operations used by the site.
#[derive(Clone)]
pub struct Store {
    backend: Arc<dyn StoreBackend>,
}

impl Store {
    pub fn new(backend: Arc<dyn StoreBackend>) -> Self {
        Self { backend }
    }

    pub async fn load_settings(&self) -> Result<Option<AdminSettingsRow>, StoreError> {
        let query = Query::new().filter(Filter::eq("id", SETTINGS_ROW_ID));
        let rows = self.select::<AdminSettingsRow>(Table::AdminSettings, &query).await?;
        Ok(rows.into_iter().next())
    }

    pub async fn upsert_settings(&self, row: &AdminSettingsRow) -> Result<(), StoreError> {
        let row = AdminSettingsRow {
            id: SETTINGS_ROW_ID,
            ..row.clone()
        };
        self.backend
            .upsert(Table::AdminSettings, to_rows(std::slice::from_ref(&row))?)
            .await
    }

    pub async fn list_services(&self) -> Result<Vec<ServiceRow>, StoreError> {
        self.select(Table::Services, &Query::new()).await
    }

    /// PostgREST refuses unfiltered deletes, so "all" is `id <> '0'`.
    pub async fn delete_all_services(&self) -> Result<(), StoreError> {
        self.backend
            .delete(Table::Services, &[Filter::neq("id", "0")])
            .await
    }

    pub async fn insert_services(&self, services: &[ServiceRow]) -> Result<(), StoreError> {
        if services.is_empty() {
            return Ok(());
        }
        self.backend
            .insert(Table::Services, to_rows(services)?)
            .await
    }

    pub async fn insert_quote(&self, quote: &QuoteRow) -> Result<(), StoreError> {
        self.backend
            .insert(Table::Quotes, to_rows(std::slice::from_ref(quote))?)
            .await
    }

    pub async fn insert_booking(&self, booking: &BookingRow) -> Result<(), StoreError> {
        self.backend
            .insert(Table::Bookings, to_rows(std::slice::from_ref(booking))?)
            .await
    }

    /// Newest first.
    pub async fn list_bookings(&self) -> Result<Vec<BookingRow>, StoreError> {
        self.select(Table::Bookings, &Query::new().order_desc("created_at"))
            .await
    }

    /// Newest first.
    pub async fn list_quotes(&self) -> Result<Vec<QuoteRow>, StoreError> {
        self.select(Table::Quotes, &Query::new().order_desc("created_at"))
            .await
    }

    async fn select<T: DeserializeOwned>(
        &self,
        table: Table,
        query: &Query,
    ) -> Result<Vec<T>, StoreError> {
        self.backend
            .select(table, query)
            .await?
            .into_iter()
            .map(|row| serde_json::from_value(row).map_err(StoreError::from))
            .collect()
    }
}

fn to_rows<T: Serialize>(items: &[T]) -> Result<Vec<Value>, StoreError> {
    items
        .iter()
        .map(|item| serde_json::to_value(item).map_err(StoreError::from))
        .collect()
}
