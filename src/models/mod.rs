pub mod api_response;
pub mod catalog;
pub mod exchange;
pub mod network_config;
pub mod settlement;
pub mod token;
pub mod transaction;
