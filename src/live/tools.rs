//! Functions the model may call, and their validation before dispatch.

use nylah_schema::{BookingRow, FunctionCall, FunctionDeclaration, FunctionResponse, Tool};
use serde_json::{Map, Value, json};

use crate::error::ToolCallError;
use crate::site::{AppSection, BookingForm, QuoteFields, ServiceType};

pub const NAVIGATE_TO: &str = "navigateTo";
pub const FILL_QUOTE_FORM: &str = "fillQuoteForm";
pub const BOOK_SESSION: &str = "bookSession";

/// The declaration set sent in session setup.
pub fn tool() -> Tool {
    Tool {
        function_declarations: vec![
            FunctionDeclaration {
                name: NAVIGATE_TO.to_string(),
                description: "Navigate to a specific section of the website.".to_string(),
                parameters: Some(json!({
                    "type": "OBJECT",
                    "properties": {
                        "section": {
                            "type": "STRING",
                            "description": "Target section: \"home\", \"catalog\", \"booking\", \"quote\" or \"contact\".",
                            "enum": AppSection::ALL.map(AppSection::as_str),
                        }
                    },
                    "required": ["section"],
                })),
            },
            FunctionDeclaration {
                name: FILL_QUOTE_FORM.to_string(),
                description: "Fill in the quote request form with the customer's details."
                    .to_string(),
                parameters: Some(json!({
                    "type": "OBJECT",
                    "properties": {
                        "name": { "type": "STRING", "description": "Customer full name." },
                        "email": { "type": "STRING", "description": "Email address." },
                        "serviceType": {
                            "type": "STRING",
                            "description": "Service type (web, mobile, software).",
                            "enum": [
                                ServiceType::Web.as_str(),
                                ServiceType::Mobile.as_str(),
                                ServiceType::Software.as_str(),
                            ],
                        },
                        "description": { "type": "STRING", "description": "What the customer needs." },
                    },
                    "required": ["name", "serviceType"],
                })),
            },
            FunctionDeclaration {
                name: BOOK_SESSION.to_string(),
                description: "Book a meeting in the calendar.".to_string(),
                parameters: Some(json!({
                    "type": "OBJECT",
                    "properties": {
                        "date": { "type": "STRING", "description": "Meeting date (YYYY-MM-DD)." },
                        "time": { "type": "STRING", "description": "Meeting time (HH:MM)." },
                        "name": { "type": "STRING", "description": "Customer name." },
                        "phone": { "type": "STRING", "description": "Contact phone." },
                    },
                    "required": ["date", "time", "name"],
                })),
            },
        ],
    }
}

/// A validated tool call, ready for the host.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolAction {
    Navigate(AppSection),
    FillQuoteForm(QuoteFields),
    BookSession(BookingRow),
}

impl ToolAction {
    pub fn from_call(call: &FunctionCall) -> Result<Self, ToolCallError> {
        let args = &call.args;
        match call.name.as_str() {
            NAVIGATE_TO => {
                let raw = required_str(args, "section")?;
                let section = raw
                    .parse::<AppSection>()
                    .map_err(|reason| ToolCallError::InvalidArgument {
                        name: "section",
                        reason,
                    })?;
                Ok(ToolAction::Navigate(section))
            }
            FILL_QUOTE_FORM => {
                let name = required_str(args, "name")?.to_string();
                let service_type = required_str(args, "serviceType")?
                    .parse::<ServiceType>()
                    .map_err(|reason| ToolCallError::InvalidArgument {
                        name: "serviceType",
                        reason,
                    })?;
                Ok(ToolAction::FillQuoteForm(QuoteFields {
                    name: Some(name),
                    email: optional_str(args, "email")?.map(str::to_string),
                    service_type: Some(service_type),
                    description: optional_str(args, "description")?.map(str::to_string),
                }))
            }
            BOOK_SESSION => {
                let form = BookingForm {
                    date: required_str(args, "date")?.to_string(),
                    time: required_str(args, "time")?.to_string(),
                    name: required_str(args, "name")?.to_string(),
                    phone: optional_str(args, "phone")?.unwrap_or_default().to_string(),
                };
                Ok(ToolAction::BookSession(form.into_row()?))
            }
            other => Err(ToolCallError::UnknownTool(other.to_string())),
        }
    }
}

fn optional_str<'a>(
    args: &'a Map<String, Value>,
    name: &'static str,
) -> Result<Option<&'a str>, ToolCallError> {
    match args.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.as_str())),
        Some(other) => Err(ToolCallError::InvalidArgument {
            name,
            reason: format!("expected a string, got {other}"),
        }),
    }
}

fn required_str<'a>(
    args: &'a Map<String, Value>,
    name: &'static str,
) -> Result<&'a str, ToolCallError> {
    match optional_str(args, name)? {
        Some(s) if !s.trim().is_empty() => Ok(s),
        _ => Err(ToolCallError::MissingArgument(name)),
    }
}

pub fn executed(call: &FunctionCall) -> FunctionResponse {
    FunctionResponse {
        id: call.id.clone(),
        name: call.name.clone(),
        response: json!({ "result": "executed" }),
    }
}

pub fn rejected(call: &FunctionCall, reason: &str) -> FunctionResponse {
    FunctionResponse {
        id: call.id.clone(),
        name: call.name.clone(),
        response: json!({ "error": reason }),
    }
}
