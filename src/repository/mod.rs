pub mod store;
pub mod table_service;
