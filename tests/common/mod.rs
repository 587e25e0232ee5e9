#![allow(dead_code)]

use async_trait::async_trait;
use nylah::error::{LiveError, StoreError};
use nylah::live::{LiveConnector, LiveLink};
use nylah::store::{Filter, Query, StoreBackend, Table};
use nylah_schema::Setup;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Select,
    Insert,
    Upsert,
    Delete,
}

/// In-process stand-in for the hosted store with per-operation failure injection.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<HashMap<Table, Vec<Value>>>,
    failures: Mutex<HashSet<(Table, Op)>>,
    calls: Mutex<Vec<(Table, Op)>>,
}

impl MemoryStore {
    pub fn fail(&self, table: Table, op: Op) {
        self.failures.lock().unwrap().insert((table, op));
    }

    pub fn rows(&self, table: Table) -> Vec<Value> {
        self.tables
            .lock()
            .unwrap()
            .get(&table)
            .cloned()
            .unwrap_or_default()
    }

    pub fn seed(&self, table: Table, rows: Vec<Value>) {
        self.tables
            .lock()
            .unwrap()
            .entry(table)
            .or_default()
            .extend(rows);
    }

    pub fn calls(&self) -> Vec<(Table, Op)> {
        self.calls.lock().unwrap().clone()
    }

    fn enter(&self, table: Table, op: Op) -> Result<(), StoreError> {
        self.calls.lock().unwrap().push((table, op));
        if self.failures.lock().unwrap().contains(&(table, op)) {
            return Err(StoreError::Status {
                table: table.name(),
                status: reqwest::StatusCode::SERVICE_UNAVAILABLE,
                body: "injected failure".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl StoreBackend for MemoryStore {
    async fn select(&self, table: Table, query: &Query) -> Result<Vec<Value>, StoreError> {
        self.enter(table, Op::Select)?;
        let mut rows: Vec<Value> = self
            .rows(table)
            .into_iter()
            .filter(|row| query.filters.iter().all(|f| f.matches(row)))
            .collect();
        if let Some(order) = &query.order {
            let key = |row: &Value| row.get(&order.column).map(Value::to_string);
            rows.sort_by(|a, b| key(a).cmp(&key(b)));
            if order.descending {
                rows.reverse();
            }
        }
        Ok(rows)
    }

    async fn insert(&self, table: Table, rows: Vec<Value>) -> Result<(), StoreError> {
        self.enter(table, Op::Insert)?;
        self.seed(table, rows);
        Ok(())
    }

    async fn upsert(&self, table: Table, rows: Vec<Value>) -> Result<(), StoreError> {
        self.enter(table, Op::Upsert)?;
        let mut tables = self.tables.lock().unwrap();
        let existing = tables.entry(table).or_default();
        for row in rows {
            let id = row.get("id").cloned();
            match existing.iter_mut().find(|r| r.get("id").cloned() == id) {
                Some(slot) => *slot = row,
                None => existing.push(row),
            }
        }
        Ok(())
    }

    async fn delete(&self, table: Table, filters: &[Filter]) -> Result<(), StoreError> {
        self.enter(table, Op::Delete)?;
        if filters.is_empty() {
            return Err(StoreError::UnfilteredDelete(table.name()));
        }
        let mut tables = self.tables.lock().unwrap();
        if let Some(rows) = tables.get_mut(&table) {
            rows.retain(|row| !filters.iter().all(|f| f.matches(row)));
        }
        Ok(())
    }
}

/// Connector for routes that never reach the speech service.
pub struct OfflineConnector;

#[async_trait]
impl LiveConnector for OfflineConnector {
    async fn connect(&self, _setup: Setup) -> Result<LiveLink, LiveError> {
        Err(LiveError::NoCredential)
    }
}
