use chrono::{NaiveDate, NaiveTime};
use nylah_schema::{BookingRow, QuoteRow};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::FormError;

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const TIME_FORMAT: &str = "%H:%M";

/// Service a quote refers to; also the icon tag of a catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum ServiceType {
    #[default]
    Web,
    Mobile,
    Software,
}

impl ServiceType {
    pub fn as_str(self) -> &'static str {
        match self {
            ServiceType::Web => "web",
            ServiceType::Mobile => "mobile",
            ServiceType::Software => "software",
        }
    }
}

impl FromStr for ServiceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "web" => Ok(ServiceType::Web),
            "mobile" => Ok(ServiceType::Mobile),
            "software" => Ok(ServiceType::Software),
            other => Err(format!("unknown service type {other:?}")),
        }
    }
}

impl TryFrom<String> for ServiceType {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Partial quote data, as dictated to the assistant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_type: Option<ServiceType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Quote request form. `serviceType` defaults to `web`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub service_type: ServiceType,
    #[serde(default)]
    pub description: String,
}

impl QuoteForm {
    /// Overlays the provided fields, keeping the rest.
    pub fn merge(&mut self, fields: QuoteFields) {
        if let Some(name) = fields.name {
            self.name = name;
        }
        if let Some(email) = fields.email {
            self.email = email;
        }
        if let Some(service_type) = fields.service_type {
            self.service_type = service_type;
        }
        if let Some(description) = fields.description {
            self.description = description;
        }
    }

    pub fn validate(&self) -> Result<(), FormError> {
        require("name", &self.name)?;
        let email = require("email", &self.email)?;
        if !email.contains('@') {
            return Err(FormError::InvalidField {
                field: "email",
                reason: "expected an address like name@domain".to_string(),
            });
        }
        Ok(())
    }

    pub fn into_row(self) -> Result<QuoteRow, FormError> {
        self.validate()?;
        Ok(QuoteRow {
            id: None,
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            service_type: self.service_type.as_str().to_string(),
            description: self.description.trim().to_string(),
            created_at: None,
        })
    }
}

/// Booking form: date, time and name are required; phone is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingForm {
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub time: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub phone: String,
}

impl BookingForm {
    pub fn validate(&self) -> Result<(), FormError> {
        parse_date(require("date", &self.date)?)?;
        parse_time(require("time", &self.time)?)?;
        require("name", &self.name)?;
        Ok(())
    }

    /// Validates and normalizes date/time to `YYYY-MM-DD` / `HH:MM`.
    pub fn into_row(self) -> Result<BookingRow, FormError> {
        let date = parse_date(require("date", &self.date)?)?;
        let time = parse_time(require("time", &self.time)?)?;
        let name = require("name", &self.name)?.to_string();
        Ok(BookingRow {
            id: None,
            date: date.format(DATE_FORMAT).to_string(),
            time: time.format(TIME_FORMAT).to_string(),
            name,
            phone: self.phone.trim().to_string(),
            created_at: None,
        })
    }
}

fn require<'a>(field: &'static str, value: &'a str) -> Result<&'a str, FormError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(FormError::MissingField(field))
    } else {
        Ok(trimmed)
    }
}

pub fn parse_date(value: &str) -> Result<NaiveDate, FormError> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|e| FormError::InvalidField {
        field: "date",
        reason: format!("expected YYYY-MM-DD ({e})"),
    })
}

pub fn parse_time(value: &str) -> Result<NaiveTime, FormError> {
    NaiveTime::parse_from_str(value.trim(), TIME_FORMAT).map_err(|e| FormError::InvalidField {
        field: "time",
        reason: format!("expected HH:MM ({e})"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn quote_form_defaults_service_type_to_web() {
        let form: QuoteForm =
            serde_json::from_value(json!({"name": "Ana", "email": "ana@example.cl"})).unwrap();
        assert_eq!(form.service_type, ServiceType::Web);

        let row = form.into_row().unwrap();
        assert_eq!(row.service_type, "web");
        assert_eq!(row.description, "");
    }

    #[test]
    fn quote_form_accepts_capitalized_service_type() {
        let form: QuoteForm = serde_json::from_value(json!({
            "name": "Ana",
            "email": "ana@example.cl",
            "serviceType": "Mobile"
        }))
        .unwrap();
        assert_eq!(form.service_type, ServiceType::Mobile);

        let bad = serde_json::from_value::<QuoteForm>(json!({"serviceType": "hardware"}));
        assert!(bad.is_err());
    }

    #[test]
    fn quote_form_requires_name_and_email() {
        let mut form = QuoteForm::default();
        assert_eq!(form.validate(), Err(FormError::MissingField("name")));

        form.name = "Ana".to_string();
        assert_eq!(form.validate(), Err(FormError::MissingField("email")));

        form.email = "not-an-address".to_string();
        assert!(matches!(
            form.validate(),
            Err(FormError::InvalidField { field: "email", .. })
        ));
    }

    #[test]
    fn merge_only_overwrites_provided_fields() {
        let mut form = QuoteForm {
            name: "Ana".to_string(),
            email: "ana@example.cl".to_string(),
            service_type: ServiceType::Web,
            description: "landing page".to_string(),
        };
        form.merge(QuoteFields {
            service_type: Some(ServiceType::Software),
            description: Some("inventory system".to_string()),
            ..QuoteFields::default()
        });
        assert_eq!(form.name, "Ana");
        assert_eq!(form.service_type, ServiceType::Software);
        assert_eq!(form.description, "inventory system");
    }

    #[test]
    fn booking_requires_date_time_and_name() {
        let form = BookingForm {
            date: "2026-03-01".to_string(),
            time: "".to_string(),
            name: "Luis".to_string(),
            phone: "".to_string(),
        };
        assert_eq!(form.validate(), Err(FormError::MissingField("time")));

        let form = BookingForm {
            time: "25:00".to_string(),
            ..form
        };
        assert!(matches!(
            form.validate(),
            Err(FormError::InvalidField { field: "time", .. })
        ));
    }

    #[test]
    fn booking_row_is_normalized() {
        let row = BookingForm {
            date: " 2026-03-01 ".to_string(),
            time: "9:05".to_string(),
            name: " Luis ".to_string(),
            phone: "+56 9 1234 5678".to_string(),
        }
        .into_row()
        .unwrap();
        assert_eq!(row.date, "2026-03-01");
        assert_eq!(row.time, "09:05");
        assert_eq!(row.name, "Luis");
    }
}
