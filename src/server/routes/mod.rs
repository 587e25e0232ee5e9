pub mod admin;
pub mod live;
pub mod site;
