pub mod api_client;
pub mod app_paths;
pub mod config;
pub mod display;
pub mod history;
pub mod logging;
pub mod models;
pub mod query_client;
pub mod repl;
