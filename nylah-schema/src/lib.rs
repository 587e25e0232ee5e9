pub mod live;
pub mod store;

pub use live::{
    ClientMessage, Content, FunctionCall, FunctionDeclaration, FunctionResponse,
    GenerationConfig, ServerContent, ServerMessage, Setup, SpeechConfig, Tool,
};
pub use store::{AdminSettingsRow, BookingRow, QuoteRow, SETTINGS_ROW_ID, ServiceRow};
