// Chain API Bench - Library root

pub mod bench;
pub mod config;
pub mod error;
pub mod http_client;
pub mod providers;
pub mod suite;
