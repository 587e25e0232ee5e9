use std::collections::HashSet;

use nylah_schema::ServiceRow;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::snapshot::SiteSettings;
use crate::error::NylahError;
use crate::store::Store;

/// Body of a settings save: the singleton settings plus the full service list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsUpdate {
    #[serde(flatten)]
    pub settings: SiteSettings,
    #[serde(default)]
    pub services: Vec<ServiceRow>,
}

impl SettingsUpdate {
    pub fn validate(&self) -> Result<(), NylahError> {
        let mut seen = HashSet::new();
        for service in &self.services {
            let id = service.id.trim();
            if id.is_empty() {
                return Err(NylahError::InvalidRequest("service id is required".to_string()));
            }
            // "0" is the sentinel of the delete-all filter.
            if id == "0" {
                return Err(NylahError::InvalidRequest(
                    "service id \"0\" is reserved".to_string(),
                ));
            }
            if service.title.trim().is_empty() {
                return Err(NylahError::InvalidRequest(format!(
                    "service {id:?} needs a title"
                )));
            }
            if !seen.insert(id) {
                return Err(NylahError::InvalidRequest(format!(
                    "duplicate service id {id:?}"
                )));
            }
        }
        Ok(())
    }
}

/// Upserts settings, then replaces the service list wholesale.
///
/// There is no transaction: once services are deleted, any later failure
/// leaves the store partially saved and is reported as such.
pub async fn save_settings(store: &Store, update: &SettingsUpdate) -> Result<(), NylahError> {
    update.validate()?;

    store.upsert_settings(&update.settings.to_row()).await?;

    store
        .delete_all_services()
        .await
        .map_err(|source| NylahError::PartialSave {
            stage: "delete_services",
            source,
        })?;

    store
        .insert_services(&update.services)
        .await
        .map_err(|source| NylahError::PartialSave {
            stage: "insert_services",
            source,
        })?;

    info!(
        services = update.services.len(),
        "[Admin] settings and catalog saved"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn update(services: Vec<ServiceRow>) -> SettingsUpdate {
        SettingsUpdate {
            settings: SiteSettings::defaults("x"),
            services,
        }
    }

    fn service(id: &str) -> ServiceRow {
        ServiceRow {
            id: id.to_string(),
            title: format!("Service {id}"),
            description: String::new(),
            price: String::new(),
            features: Vec::new(),
            icon: "web".to_string(),
        }
    }

    #[test]
    fn body_flattens_settings() {
        let parsed: SettingsUpdate = serde_json::from_value(json!({
            "logoUrl": "l",
            "whatsappNumber": "w",
            "flowLink": "f",
            "nylahAvatarUrl": "a",
            "nylahInstructions": "i",
            "services": [{"id": "web", "title": "Web"}]
        }))
        .unwrap();
        assert_eq!(parsed.settings.whatsapp_number, "w");
        assert_eq!(parsed.services[0].title, "Web");
        assert!(parsed.validate().is_ok());
    }

    #[test]
    fn rejects_duplicate_reserved_or_blank_ids() {
        assert!(update(vec![service("web"), service("web")]).validate().is_err());
        assert!(update(vec![service("0")]).validate().is_err());
        assert!(update(vec![service(" ")]).validate().is_err());
        assert!(update(vec![]).validate().is_ok());
    }
}
