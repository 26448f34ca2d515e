pub mod config;
pub mod dates;
pub mod models;
pub mod server;
pub mod toggl;
pub mod units;
pub mod widget;
