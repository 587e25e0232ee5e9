use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use moka::sync::Cache;
use nylah_schema::{AdminSettingsRow, BookingRow, QuoteRow, SETTINGS_ROW_ID, ServiceRow};
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::catalog::default_services;
use crate::store::Store;

/// Editable site settings, as shown in the admin panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteSettings {
    #[serde(default)]
    pub logo_url: String,
    #[serde(default)]
    pub whatsapp_number: String,
    #[serde(default)]
    pub flow_link: String,
    #[serde(default)]
    pub nylah_avatar_url: String,
    #[serde(default)]
    pub nylah_instructions: String,
}

impl SiteSettings {
    /// Built-in values used until the store has a settings row.
    pub fn defaults(instructions: &str) -> Self {
        Self {
            logo_url: String::new(),
            whatsapp_number: "56986017554".to_string(),
            flow_link: "https://www.flow.cl".to_string(),
            nylah_avatar_url: "https://images.unsplash.com/photo-1573497019940-1c28c88b4f3e?auto=format&fit=crop&q=80&w=800&h=1200".to_string(),
            nylah_instructions: instructions.to_string(),
        }
    }

    /// Non-empty stored columns win over the current values.
    pub fn overlay(&mut self, row: &AdminSettingsRow) {
        fn pick(slot: &mut String, stored: &Option<String>) {
            if let Some(v) = stored.as_deref().filter(|v| !v.trim().is_empty()) {
                *slot = v.to_string();
            }
        }
        pick(&mut self.logo_url, &row.logo_url);
        pick(&mut self.whatsapp_number, &row.whatsapp_number);
        pick(&mut self.flow_link, &row.flow_link);
        pick(&mut self.nylah_avatar_url, &row.nylah_avatar_url);
        pick(&mut self.nylah_instructions, &row.nylah_instructions);
    }

    pub fn to_row(&self) -> AdminSettingsRow {
        AdminSettingsRow {
            id: SETTINGS_ROW_ID,
            logo_url: Some(self.logo_url.clone()),
            whatsapp_number: Some(self.whatsapp_number.clone()),
            flow_link: Some(self.flow_link.clone()),
            nylah_avatar_url: Some(self.nylah_avatar_url.clone()),
            nylah_instructions: Some(self.nylah_instructions.clone()),
        }
    }
}

/// Everything the site shows, read from the store on load.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteSnapshot {
    pub settings: SiteSettings,
    pub services: Vec<ServiceRow>,
    pub bookings: Vec<BookingRow>,
    pub quotes: Vec<QuoteRow>,
}

impl SiteSnapshot {
    pub fn with_defaults(defaults: &SiteSettings) -> Self {
        Self {
            settings: defaults.clone(),
            services: default_services(),
            bookings: Vec::new(),
            quotes: Vec::new(),
        }
    }

    /// Reads all four tables. A failed read keeps the corresponding default and is logged.
    pub async fn load(store: &Store, defaults: &SiteSettings) -> Self {
        let mut snapshot = Self::with_defaults(defaults);

        match store.load_settings().await {
            Ok(Some(row)) => snapshot.settings.overlay(&row),
            Ok(None) => {}
            Err(e) => warn!(store.table = "admin_settings", error = %e, "[Store] initial sync failed"),
        }

        match store.list_services().await {
            Ok(services) if !services.is_empty() => snapshot.services = services,
            Ok(_) => {}
            Err(e) => warn!(store.table = "services", error = %e, "[Store] initial sync failed"),
        }

        match store.list_bookings().await {
            Ok(bookings) => snapshot.bookings = bookings,
            Err(e) => warn!(store.table = "bookings", error = %e, "[Store] initial sync failed"),
        }

        match store.list_quotes().await {
            Ok(quotes) => snapshot.quotes = quotes,
            Err(e) => warn!(store.table = "quotes", error = %e, "[Store] initial sync failed"),
        }

        snapshot
    }

    /// What anonymous visitors may see: no instructions, no customer details.
    pub fn public_view(&self) -> PublicSite {
        PublicSite {
            settings: PublicSettings {
                logo_url: self.settings.logo_url.clone(),
                whatsapp_number: self.settings.whatsapp_number.clone(),
                flow_link: self.settings.flow_link.clone(),
                nylah_avatar_url: self.settings.nylah_avatar_url.clone(),
            },
            services: self.services.clone(),
            booked_slots: self
                .bookings
                .iter()
                .map(|b| BookedSlot {
                    date: b.date.clone(),
                    time: b.time.clone(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicSettings {
    pub logo_url: String,
    pub whatsapp_number: String,
    pub flow_link: String,
    pub nylah_avatar_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookedSlot {
    pub date: String,
    pub time: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicSite {
    pub settings: PublicSettings,
    pub services: Vec<ServiceRow>,
    pub booked_slots: Vec<BookedSlot>,
}

/// Short-lived in-memory copy of the snapshot; writes invalidate it.
///
/// A load that overlaps an invalidation is served once but never cached.
#[derive(Clone)]
pub struct SnapshotCache {
    store: Store,
    defaults: Arc<SiteSettings>,
    cache: Cache<(), Arc<SiteSnapshot>>,
    generation: Arc<AtomicU64>,
}

impl SnapshotCache {
    pub fn new(store: Store, defaults: SiteSettings, ttl: Duration) -> Self {
        Self {
            store,
            defaults: Arc::new(defaults),
            cache: Cache::builder().max_capacity(1).time_to_live(ttl).build(),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    pub async fn get(&self) -> Arc<SiteSnapshot> {
        if let Some(snapshot) = self.cache.get(&()) {
            return snapshot;
        }
        let started = self.generation.load(Ordering::Acquire);
        let snapshot = Arc::new(SiteSnapshot::load(&self.store, &self.defaults).await);
        if self.generation.load(Ordering::Acquire) == started {
            self.cache.insert((), snapshot.clone());
            // An invalidation may have landed between the check and the insert.
            if self.generation.load(Ordering::Acquire) != started {
                self.cache.invalidate(&());
            }
        }
        snapshot
    }

    pub fn invalidate(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
        self.cache.invalidate(&());
    }

    pub fn store(&self) -> &Store {
        &self.store
    }
}
