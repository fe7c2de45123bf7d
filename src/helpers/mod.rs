pub mod api_client;
pub mod config;
pub mod customer_resolver;
pub mod data_fetcher;
pub mod diagnostics;
pub mod errors;
pub mod report_writer;
pub mod types;
