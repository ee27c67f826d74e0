pub mod api_types;
pub mod browse;
pub mod catalog;
pub mod favorites;
pub mod models;
pub mod storage;
