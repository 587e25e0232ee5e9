pub mod audio;
pub mod config;
pub mod error;
pub mod live;
pub mod server;
pub mod site;
pub mod store;
pub mod utils;

pub use error::NylahError;
