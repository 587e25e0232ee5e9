//! Row shapes of the hosted store's four tables.
//!
//! Column names are fixed by the existing store schema, so some rows keep the
//! site's original field spelling (`serviceType`, `nylah_*`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

pub const SETTINGS_ROW_ID: i64 = 1;

/// `services` table row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServiceRow {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Free-form price label ("$200.000 CLP", "Custom quote", ...).
    #[serde(default)]
    pub price: String,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub icon: String,
}

/// `quotes` table row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QuoteRow {
    /// Store-assigned; absent on insert.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub email: String,
    #[serde(rename = "serviceType")]
    pub service_type: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// `bookings` table row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BookingRow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    /// `YYYY-MM-DD`
    pub date: String,
    /// `HH:MM`
    pub time: String,
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// `admin_settings` singleton row (id 1). Any column may be null in the store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct AdminSettingsRow {
    pub id: i64,
    #[serde(default)]
    pub logo_url: Option<String>,
    #[serde(default)]
    pub whatsapp_number: Option<String>,
    #[serde(default)]
    pub flow_link: Option<String>,
    #[serde(default)]
    pub nylah_avatar_url: Option<String>,
    #[serde(default)]
    pub nylah_instructions: Option<String>,
}

/// Nullable text columns read back as empty strings.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn quote_row_uses_store_column_names() {
        let row = QuoteRow {
            id: None,
            name: "Ana".to_string(),
            email: "ana@example.cl".to_string(),
            service_type: "mobile".to_string(),
            description: "an app".to_string(),
            created_at: None,
        };
        assert_eq!(
            serde_json::to_value(&row).unwrap(),
            json!({
                "name": "Ana",
                "email": "ana@example.cl",
                "serviceType": "mobile",
                "description": "an app"
            })
        );
    }

    #[test]
    fn booking_row_reads_store_metadata() {
        let row: BookingRow = serde_json::from_value(json!({
            "id": 42,
            "date": "2025-03-01",
            "time": "10:30",
            "name": "Jack",
            "phone": null,
            "created_at": "2025-02-20T14:03:11.52+00:00"
        }))
        .unwrap();
        assert_eq!(row.id, Some(json!(42)));
        assert_eq!(row.phone, "");
        assert!(row.created_at.is_some());
    }

    #[test]
    fn settings_row_tolerates_null_columns() {
        let row: AdminSettingsRow = serde_json::from_value(json!({
            "id": 1,
            "logo_url": null,
            "whatsapp_number": "56900000000"
        }))
        .unwrap();
        assert_eq!(row.id, SETTINGS_ROW_ID);
        assert!(row.logo_url.is_none());
        assert_eq!(row.whatsapp_number.as_deref(), Some("56900000000"));
    }
}
