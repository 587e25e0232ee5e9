//! Application rules of the marketing site: sections, catalog, forms,
//! the hidden admin gate and the settings snapshot.

pub mod admin;
pub mod catalog;
mod forms;
mod gate;
mod section;
mod snapshot;

pub use admin::{SettingsUpdate, save_settings};
pub use catalog::default_services;
pub use forms::{BookingForm, QuoteFields, QuoteForm, ServiceType, parse_date, parse_time};
pub use gate::{AdminCredentials, AdminGate, AdminSessions, is_unlock_combo};
pub use section::AppSection;
pub use snapshot::{
    BookedSlot, PublicSettings, PublicSite, SiteSettings, SiteSnapshot, SnapshotCache,
};
