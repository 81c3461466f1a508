pub mod blockchain_service;
pub mod catalog_service;
pub mod chain;
pub mod exchange_service;
pub mod journal;
pub mod network_config;
pub mod price_service;
